pub mod sqlite;

use std::path::PathBuf;

use serde::{Deserialize, Serialize};

use crate::app::{Result, TrawlerError};
use crate::domain::{PostRecord, RunRecord, ScreenshotArtifact};

pub use sqlite::SqliteStore;

pub trait Store {
    // Run operations
    fn add_run(&self, run: &RunRecord) -> Result<i64>;
    fn get_run(&self, id: i64) -> Result<Option<RunRecord>>;
    fn get_all_runs(&self) -> Result<Vec<RunRecord>>;
    fn delete_run(&self, id: i64) -> Result<()>;

    // Post operations
    fn add_posts(
        &self,
        run_id: i64,
        posts: &[PostRecord],
        artifacts: &[ScreenshotArtifact],
    ) -> Result<usize>;
    fn get_posts_by_run(&self, run_id: i64) -> Result<Vec<PostRecord>>;
    fn screenshot_for(&self, run_id: i64, capture_index: usize) -> Result<Option<PathBuf>>;
    /// Whether any earlier run already collected this post
    fn post_seen(&self, identity_key: &str) -> Result<bool>;
}

/// Local archive of past runs
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ArchiveConfig {
    /// Record every run in SQLite (default: true)
    pub enabled: bool,

    /// Database file (default: `<data dir>/trawler/trawler.db`)
    pub path: Option<PathBuf>,
}

impl Default for ArchiveConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            path: None,
        }
    }
}

impl ArchiveConfig {
    pub fn database_path(&self) -> Result<PathBuf> {
        if let Some(path) = &self.path {
            return Ok(path.clone());
        }
        let data_dir = dirs::data_dir()
            .ok_or_else(|| TrawlerError::Config("Could not find data directory".into()))?;
        let trawler_dir = data_dir.join("trawler");
        std::fs::create_dir_all(&trawler_dir)?;
        Ok(trawler_dir.join("trawler.db"))
    }
}
