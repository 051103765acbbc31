use std::path::Path;
use std::sync::Arc;

use chrono::{DateTime, Utc};
use tracing::{info, warn};

use crate::app::error::Result;
use crate::browser::{ChromeSession, PageHandle};
use crate::config::Config;
use crate::domain::{CaptureMode, RunRecord, Target};
use crate::scraper::{
    CancelFlag, CaptureCoordinator, CollectionOutcome, Collector, ProgressSink, RecordExtractor,
    ReplyCollector,
};
use crate::store::sqlite::SqliteStore;
use crate::store::Store;

pub struct AppContext {
    pub config: Config,
    /// Run archive, absent when `archive.enabled` is off
    pub store: Option<Arc<SqliteStore>>,
    pub progress: ProgressSink,
    pub cancel: CancelFlag,
}

impl AppContext {
    pub fn new(config: Config) -> Result<Self> {
        let store = if config.archive.enabled {
            let db_path = config.archive.database_path()?;
            Some(Arc::new(SqliteStore::new(&db_path)?))
        } else {
            None
        };

        Ok(Self {
            config,
            store,
            progress: ProgressSink::none(),
            cancel: CancelFlag::new(),
        })
    }

    pub fn in_memory(config: Config) -> Result<Self> {
        let store = Arc::new(SqliteStore::in_memory()?);
        Ok(Self {
            config,
            store: Some(store),
            progress: ProgressSink::none(),
            cancel: CancelFlag::new(),
        })
    }

    pub fn with_progress(mut self, progress: ProgressSink) -> Self {
        self.progress = progress;
        self
    }

    pub async fn open_browser(&self) -> Result<ChromeSession> {
        ChromeSession::open(&self.config.browser).await
    }

    pub fn extractor(&self) -> Result<RecordExtractor> {
        Ok(RecordExtractor::new(
            self.config.selectors.clone(),
            self.config.scraper.base_url()?,
        ))
    }

    /// Run one collection against `page`, routing threads to the reply
    /// collector and everything else to the capture coordinator.
    pub async fn collect<P: PageHandle>(
        &self,
        page: &P,
        target: &Target,
        count: usize,
        mode: CaptureMode,
        screenshot_dir: &Path,
    ) -> Result<CollectionOutcome> {
        let scraper = &self.config.scraper;
        let collector = Collector::new(page, self.extractor()?, self.config.pacing.clone())
            .exclude_promoted(scraper.exclude_promoted)
            .with_progress(self.progress.clone())
            .with_cancel(self.cancel.clone());

        match target {
            Target::Collection(origin) => {
                CaptureCoordinator::new(&collector, screenshot_dir)
                    .max_viewport_shots(scraper.max_viewport_shots)
                    .collect_with_capture(origin, count, mode)
                    .await
            }
            Target::Thread { parent_url } => {
                ReplyCollector::new(&collector, screenshot_dir)
                    .max_viewport_shots(scraper.max_thread_viewport_shots)
                    .collect_replies(parent_url, count, mode)
                    .await
            }
        }
    }

    /// Archive a finished run. Returns the run id, or `None` without a store.
    pub fn archive(
        &self,
        target: &Target,
        mode: CaptureMode,
        outcome: &CollectionOutcome,
        started_at: DateTime<Utc>,
    ) -> Result<Option<i64>> {
        let Some(store) = &self.store else {
            return Ok(None);
        };

        let report = &outcome.report;
        let mut run = RunRecord::new(&target.label(), target.kind(), mode, report.requested);
        run.accepted = report.accepted;
        run.status = report.status.label();
        run.stop_reason = report.stop_reason.to_string();
        run.started_at = started_at;
        run.finished_at = Utc::now();

        let seen_before = outcome
            .records
            .iter()
            .filter(|r| !r.identity_key.is_empty())
            .filter(|r| store.post_seen(&r.identity_key).unwrap_or(false))
            .count();
        if seen_before > 0 {
            info!(
                "{} of {} posts were archived by earlier runs",
                seen_before,
                outcome.records.len()
            );
        }

        let run_id = store.add_run(&run)?;
        let inserted = store.add_posts(run_id, &outcome.records, &outcome.artifacts)?;
        if inserted < outcome.records.len() {
            warn!(
                "Archived {} of {} posts for run {}",
                inserted,
                outcome.records.len(),
                run_id
            );
        }
        Ok(Some(run_id))
    }
}
