use std::path::{Path, PathBuf};
use std::time::Duration;

use async_trait::async_trait;
use tokio::time::sleep;
use tracing::{info, warn};

use crate::app::Result;
use crate::browser::{ElementHandle, PageHandle};
use crate::domain::{CaptureMode, Origin, PostRecord, ScreenshotArtifact};
use crate::output::sanitize_filename;
use crate::scraper::collector::{Collector, IterationHook, LoopOutcome, ScrollStrategy};
use crate::scraper::progress::{ProgressEvent, ProgressSink};
use crate::scraper::report::{CaptureShortfall, CollectionOutcome};

/// Screenshot strategy plugged into the scroll loop
pub(crate) enum CaptureHook {
    Off,
    /// Element shot of each record right after it is accepted
    PerItem {
        dir: PathBuf,
        prefix: &'static str,
        settle: Duration,
        progress: ProgressSink,
        artifacts: Vec<ScreenshotArtifact>,
        missing: Vec<usize>,
    },
    /// Viewport slice once per iteration
    Viewport {
        dir: PathBuf,
        prefix: &'static str,
        max_shots: usize,
        progress: ProgressSink,
        artifacts: Vec<ScreenshotArtifact>,
    },
}

impl CaptureHook {
    pub(crate) fn for_mode(
        mode: CaptureMode,
        dir: &Path,
        prefix: &'static str,
        settle: Duration,
        max_shots: usize,
        progress: ProgressSink,
    ) -> Self {
        match mode {
            CaptureMode::None => CaptureHook::Off,
            mode if mode.captures_per_item() => CaptureHook::PerItem {
                dir: dir.to_path_buf(),
                prefix,
                settle,
                progress,
                artifacts: Vec::new(),
                missing: Vec::new(),
            },
            _ => CaptureHook::Viewport {
                dir: dir.to_path_buf(),
                prefix,
                max_shots,
                progress,
                artifacts: Vec::new(),
            },
        }
    }

    pub(crate) fn strategy(&self) -> ScrollStrategy {
        match self {
            CaptureHook::Viewport { .. } => ScrollStrategy::Viewport,
            _ => ScrollStrategy::ToBottom,
        }
    }

    /// Attach the captured artifacts to a finished loop
    pub(crate) fn finish(self, outcome: LoopOutcome) -> CollectionOutcome {
        let LoopOutcome {
            records,
            mut report,
        } = outcome;

        let artifacts = match self {
            CaptureHook::Off => Vec::new(),
            CaptureHook::PerItem {
                artifacts, missing, ..
            } => {
                report.missing_artifacts = missing;
                if artifacts.len() < report.requested {
                    warn!(
                        "Captured {} of {} requested screenshots",
                        artifacts.len(),
                        report.requested
                    );
                    report.capture_shortfall = Some(CaptureShortfall {
                        expected: report.requested,
                        captured: artifacts.len(),
                    });
                }
                artifacts
            }
            CaptureHook::Viewport { artifacts, .. } => artifacts,
        };

        CollectionOutcome {
            records,
            artifacts,
            report,
        }
    }
}

pub(crate) fn item_file_name(prefix: &str, record: &PostRecord) -> String {
    let author = sanitize_filename(record.display_author());
    format!("{}_{:03}_{}.png", prefix, record.capture_index, author)
}

#[async_trait]
impl<P: PageHandle> IterationHook<P> for CaptureHook {
    async fn on_accept(&mut self, _page: &P, element: &P::Element, record: &PostRecord) {
        let CaptureHook::PerItem {
            dir,
            prefix,
            settle,
            progress,
            artifacts,
            missing,
        } = self
        else {
            return;
        };

        if let Err(e) = element.scroll_into_view().await {
            warn!("Could not scroll record {} into view: {}", record.capture_index, e);
        }
        sleep(*settle).await;

        let path = dir.join(item_file_name(*prefix, record));
        match element.screenshot(&path).await {
            Ok(()) => {
                info!("Captured record {}: {}", record.capture_index, path.display());
                progress.emit(ProgressEvent::Captured {
                    capture_index: Some(record.capture_index),
                    path: path.clone(),
                });
                artifacts.push(ScreenshotArtifact::per_item(path, record.capture_index));
            }
            Err(e) => {
                warn!("Screenshot of record {} failed: {}", record.capture_index, e);
                progress.emit(ProgressEvent::CaptureFailed {
                    capture_index: record.capture_index,
                    reason: e.to_string(),
                });
                missing.push(record.capture_index);
            }
        }
    }

    async fn before_scroll(&mut self, page: &P, _iteration: usize) {
        let CaptureHook::Viewport {
            dir,
            prefix,
            max_shots,
            progress,
            artifacts,
        } = self
        else {
            return;
        };
        if artifacts.len() >= *max_shots {
            return;
        }

        let path = dir.join(format!("{}_page_{:02}.png", prefix, artifacts.len() + 1));
        match page.screenshot(&path).await {
            Ok(()) => {
                progress.emit(ProgressEvent::Captured {
                    capture_index: None,
                    path: path.clone(),
                });
                artifacts.push(ScreenshotArtifact::full_page(path));
            }
            Err(e) => warn!("Viewport screenshot failed: {}", e),
        }
    }
}

/// Runs a collection with screenshots taken as records are discovered.
///
/// Per-item capture happens inside the extraction step, on the same element
/// handle that produced the record, before the page scrolls it away.
pub struct CaptureCoordinator<'c, 'p, P: PageHandle> {
    collector: &'c Collector<'p, P>,
    screenshot_dir: PathBuf,
    max_viewport_shots: usize,
}

impl<'c, 'p, P: PageHandle> CaptureCoordinator<'c, 'p, P> {
    pub fn new(collector: &'c Collector<'p, P>, screenshot_dir: impl Into<PathBuf>) -> Self {
        Self {
            collector,
            screenshot_dir: screenshot_dir.into(),
            max_viewport_shots: 10,
        }
    }

    pub fn max_viewport_shots(mut self, max: usize) -> Self {
        self.max_viewport_shots = max;
        self
    }

    pub async fn collect_with_capture(
        &self,
        origin: &Origin,
        target: usize,
        mode: CaptureMode,
    ) -> Result<CollectionOutcome> {
        if mode != CaptureMode::None {
            tokio::fs::create_dir_all(&self.screenshot_dir).await?;
        }

        let prefix = match origin {
            Origin::Timeline { .. } => "post",
            Origin::Search { .. } => "search",
        };
        let mut hook = CaptureHook::for_mode(
            mode,
            &self.screenshot_dir,
            prefix,
            self.collector.pacing().capture_settle(),
            self.max_viewport_shots,
            self.collector.progress().clone(),
        );

        let outcome = self
            .collector
            .collect_with(origin, target, hook.strategy(), &mut hook)
            .await?;
        Ok(hook.finish(outcome))
    }
}
