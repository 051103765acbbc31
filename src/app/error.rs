use std::time::Duration;

use thiserror::Error;

#[derive(Error, Debug)]
pub enum TrawlerError {
    #[error("Database error: {0}")]
    Database(#[from] rusqlite::Error),

    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("Browser error: {0}")]
    Browser(String),

    #[error("Navigation to {url} failed after {attempts} attempt(s): {reason}")]
    Navigation {
        url: String,
        attempts: u32,
        reason: String,
    },

    #[error("{operation} timed out after {elapsed:?}")]
    Timeout {
        operation: &'static str,
        elapsed: Duration,
    },

    #[error("Script execution failed: {0}")]
    Script(String),

    #[error("Screenshot failed: {0}")]
    Capture(String),

    #[error("Invalid URL: {0}")]
    InvalidUrl(#[from] url::ParseError),

    #[error("Invalid query: {0}")]
    InvalidQuery(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("{collaborator} failed: {reason}")]
    Collaborator {
        collaborator: &'static str,
        reason: String,
    },

    #[error("{0}")]
    Other(String),
}

pub type Result<T> = std::result::Result<T, TrawlerError>;
