use chrono::{DateTime, Utc};

use crate::domain::CaptureMode;

/// Archived summary of one collection run
#[derive(Debug, Clone, PartialEq)]
pub struct RunRecord {
    pub id: i64,
    /// Query, `@handle` or `replies_<id>`
    pub label: String,
    /// `search`, `timeline` or `thread`
    pub kind: String,
    pub capture_mode: CaptureMode,
    pub requested: usize,
    pub accepted: usize,
    pub status: String,
    pub stop_reason: String,
    pub started_at: DateTime<Utc>,
    pub finished_at: DateTime<Utc>,
}

impl RunRecord {
    pub fn new(label: &str, kind: &str, capture_mode: CaptureMode, requested: usize) -> Self {
        let now = Utc::now();
        Self {
            id: 0,
            label: label.to_string(),
            kind: kind.to_string(),
            capture_mode,
            requested,
            accepted: 0,
            status: String::new(),
            stop_reason: String::new(),
            started_at: now,
            finished_at: now,
        }
    }

    pub fn duration_secs(&self) -> i64 {
        (self.finished_at - self.started_at).num_seconds()
    }
}
