use async_trait::async_trait;
use tokio::time::{sleep, timeout};
use tracing::{debug, info, warn};

use crate::app::{Result, TrawlerError};
use crate::browser::{ElementHandle, PageHandle};
use crate::domain::{digest, post_id, Origin, PostRecord};
use crate::scraper::extractor::RecordExtractor;
use crate::scraper::pacing::PacingPolicy;
use crate::scraper::progress::{CancelFlag, ProgressEvent, ProgressSink};
use crate::scraper::report::{RunReport, StopReason};
use crate::scraper::session::CaptureSession;

/// Per-iteration extension point of the scroll loop.
///
/// `on_accept` runs while the element that produced the record is still
/// live, before the loop scrolls again.
#[async_trait]
pub trait IterationHook<P: PageHandle>: Send {
    async fn on_accept(&mut self, _page: &P, _element: &P::Element, _record: &PostRecord) {}

    /// After extraction, before the scroll that ends the iteration
    async fn before_scroll(&mut self, _page: &P, _iteration: usize) {}
}

/// Hook that does nothing
pub struct NoHook;

impl<P: PageHandle> IterationHook<P> for NoHook {}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ScrollStrategy {
    /// Jump to the bottom of the document
    ToBottom,
    /// Advance by a fraction of the viewport height
    Viewport,
}

/// Which elements on the page count as collectible
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) enum Scope {
    Listing,
    /// Skip the parent post of a thread, identified by its numeric id
    Thread { parent_id: Option<String> },
}

/// Parameters of one scroll loop
pub(crate) struct LoopPlan {
    pub target: usize,
    pub iteration_cap: usize,
    pub scope: Scope,
    pub strategy: ScrollStrategy,
}

/// Records plus the counters of the run that produced them
#[derive(Debug, Clone)]
pub struct LoopOutcome {
    pub records: Vec<PostRecord>,
    pub report: RunReport,
}

/// Scrolls an infinite feed until a target number of distinct records has
/// been read, the page stops yielding, or an iteration cap is hit.
pub struct Collector<'p, P: PageHandle> {
    page: &'p P,
    extractor: RecordExtractor,
    pacing: PacingPolicy,
    exclude_promoted: bool,
    progress: ProgressSink,
    cancel: CancelFlag,
}

impl<'p, P: PageHandle> Collector<'p, P> {
    pub fn new(page: &'p P, extractor: RecordExtractor, pacing: PacingPolicy) -> Self {
        Self {
            page,
            extractor,
            pacing,
            exclude_promoted: true,
            progress: ProgressSink::none(),
            cancel: CancelFlag::new(),
        }
    }

    pub fn exclude_promoted(mut self, exclude: bool) -> Self {
        self.exclude_promoted = exclude;
        self
    }

    pub fn with_progress(mut self, progress: ProgressSink) -> Self {
        self.progress = progress;
        self
    }

    pub fn with_cancel(mut self, cancel: CancelFlag) -> Self {
        self.cancel = cancel;
        self
    }

    pub fn page(&self) -> &'p P {
        self.page
    }

    pub fn extractor(&self) -> &RecordExtractor {
        &self.extractor
    }

    pub fn pacing(&self) -> &PacingPolicy {
        &self.pacing
    }

    pub fn progress(&self) -> &ProgressSink {
        &self.progress
    }

    /// Collect up to `target` records from a timeline or search, data only
    pub async fn collect(&self, origin: &Origin, target: usize) -> Result<LoopOutcome> {
        self.collect_with(origin, target, ScrollStrategy::ToBottom, &mut NoHook)
            .await
    }

    pub async fn collect_with<H: IterationHook<P>>(
        &self,
        origin: &Origin,
        target: usize,
        strategy: ScrollStrategy,
        hook: &mut H,
    ) -> Result<LoopOutcome> {
        let plan = LoopPlan {
            target,
            iteration_cap: self.pacing.scroll_cap(target),
            scope: Scope::Listing,
            strategy,
        };
        if target == 0 {
            return Ok(self.empty_outcome(&plan));
        }

        let url = origin.entry_url(self.extractor.base())?;
        self.navigate(&url).await?;
        sleep(self.pacing.navigation_settle()).await;

        info!("Collecting {} records from {}", target, origin.label());
        Ok(self.run(plan, hook).await)
    }

    pub(crate) fn empty_outcome(&self, plan: &LoopPlan) -> LoopOutcome {
        let session = CaptureSession::new(0, plan.iteration_cap, self.pacing.stagnation_threshold);
        let (records, report) = session.finish(StopReason::TargetReached);
        LoopOutcome { records, report }
    }

    /// Navigate with per-attempt timeout and bounded retries
    pub async fn navigate(&self, url: &str) -> Result<()> {
        let attempts = self.pacing.max_retries + 1;
        let mut reason = String::new();

        for attempt in 1..=attempts {
            match timeout(self.pacing.navigation_timeout(), self.page.navigate(url)).await {
                Ok(Ok(())) => {
                    debug!("Navigated to {} (attempt {})", url, attempt);
                    self.progress.emit(ProgressEvent::Navigated {
                        url: url.to_string(),
                    });
                    return Ok(());
                }
                Ok(Err(e)) => reason = e.to_string(),
                Err(_) => {
                    reason = TrawlerError::Timeout {
                        operation: "navigation",
                        elapsed: self.pacing.navigation_timeout(),
                    }
                    .to_string()
                }
            }
            warn!(
                "Navigation to {} failed (attempt {}/{}): {}",
                url, attempt, attempts, reason
            );
            if attempt < attempts {
                sleep(self.pacing.retry_delay()).await;
            }
        }

        Err(TrawlerError::Navigation {
            url: url.to_string(),
            attempts,
            reason,
        })
    }

    /// The scroll loop itself, on an already-loaded page
    pub(crate) async fn run<H: IterationHook<P>>(&self, plan: LoopPlan, hook: &mut H) -> LoopOutcome {
        let selector = &self.extractor.selectors().post_container;
        let mut session = CaptureSession::new(
            plan.target,
            plan.iteration_cap,
            self.pacing.stagnation_threshold,
        );

        let stop = loop {
            let iteration = session.begin_iteration();

            let elements = match timeout(
                self.pacing.query_timeout(),
                self.page.find_elements(selector),
            )
            .await
            {
                Ok(Ok(elements)) => elements,
                Ok(Err(e)) => {
                    warn!("Post query failed on iteration {}: {}", iteration, e);
                    Vec::new()
                }
                Err(_) => {
                    warn!("Post query timed out on iteration {}", iteration);
                    Vec::new()
                }
            };
            let visible = elements.len();

            for (position, element) in elements.iter().enumerate() {
                if session.target_reached() {
                    break;
                }

                let key = self.extractor.identity_key(element).await;
                let (key, linkless) = if key.is_empty() {
                    match self.extractor.extract(element, session.next_index()).await {
                        Some(record) => (record.content_key(), Some(record)),
                        None => {
                            let text = element.text().await.unwrap_or_default();
                            if session.mark_seen(&format!("unreadable:{}", digest(&[&text]))) {
                                session.note_unkeyed();
                            }
                            continue;
                        }
                    }
                } else {
                    (key, None)
                };
                if session.is_seen(&key) {
                    continue;
                }

                if let Scope::Thread { parent_id } = &plan.scope {
                    let is_root = match parent_id {
                        Some(id) => post_id(&key).as_ref() == Some(id),
                        None => iteration == 1 && position == 0,
                    };
                    // Anything else under the parent counts as a reply
                    if is_root {
                        session.mark_seen(&key);
                        continue;
                    }
                }

                session.mark_seen(&key);
                session.note_evaluated();
                let record = match linkless {
                    Some(record) => Some(record),
                    None => self.extractor.extract(element, session.next_index()).await,
                };
                let Some(record) = record else {
                    continue;
                };

                if self.exclude_promoted && record.is_promoted {
                    debug!("Skipping promoted post {}", key);
                    session.note_promoted();
                    continue;
                }

                let record = session.accept(record);
                self.progress.emit(ProgressEvent::Accepted {
                    capture_index: record.capture_index,
                    identity_key: record.identity_key.clone(),
                });
                hook.on_accept(self.page, element, record).await;
            }

            self.progress.emit(ProgressEvent::Iteration {
                iteration,
                visible,
                accepted: session.accepted(),
                target: session.target(),
            });
            debug!(
                "Iteration {}: {} visible, {}/{} accepted",
                iteration,
                visible,
                session.accepted(),
                session.target()
            );

            hook.before_scroll(self.page, iteration).await;

            if let Some(stop) = session.end_iteration() {
                break stop;
            }

            let delay = match plan.strategy {
                ScrollStrategy::ToBottom => {
                    if let Err(e) = self.page.scroll_to_bottom().await {
                        warn!("Scroll failed: {}", e);
                    }
                    self.pacing.scroll_delay()
                }
                ScrollStrategy::Viewport => {
                    self.scroll_viewport().await;
                    self.pacing.viewport_scroll_delay()
                }
            };
            sleep(delay).await;

            if self.cancel.is_cancelled() {
                info!("Collection cancelled after iteration {}", iteration);
                break StopReason::Cancelled;
            }
        };

        let (records, report) = session.finish(stop);
        let summary = report.summary();
        info!("Collection finished: {}", summary);
        self.progress.emit(ProgressEvent::Finished { summary });
        LoopOutcome { records, report }
    }

    async fn scroll_viewport(&self) {
        let height = self.page.viewport_height().await.unwrap_or(800.0);
        let step = (height * self.pacing.viewport_scroll_fraction).round() as i64;
        if let Err(e) = self.page.scroll_by(step.max(1)).await {
            warn!("Viewport scroll failed: {}", e);
        }
    }
}
