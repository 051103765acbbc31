use std::path::PathBuf;

use tokio::time::sleep;
use tracing::{info, warn};

use crate::app::Result;
use crate::browser::{ElementHandle, PageHandle};
use crate::domain::{post_id, CaptureMode};
use crate::scraper::capture::CaptureHook;
use crate::scraper::collector::{Collector, LoopPlan, Scope};
use crate::scraper::report::CollectionOutcome;

/// Collects the replies under one parent post.
///
/// Same loop as a listing collection, but the parent is never emitted and
/// the page is first scrolled past it into the reply section.
pub struct ReplyCollector<'c, 'p, P: PageHandle> {
    collector: &'c Collector<'p, P>,
    screenshot_dir: PathBuf,
    max_viewport_shots: usize,
}

impl<'c, 'p, P: PageHandle> ReplyCollector<'c, 'p, P> {
    pub fn new(collector: &'c Collector<'p, P>, screenshot_dir: impl Into<PathBuf>) -> Self {
        Self {
            collector,
            screenshot_dir: screenshot_dir.into(),
            max_viewport_shots: 15,
        }
    }

    pub fn max_viewport_shots(mut self, max: usize) -> Self {
        self.max_viewport_shots = max;
        self
    }

    pub async fn collect_replies(
        &self,
        parent_url: &str,
        target: usize,
        mode: CaptureMode,
    ) -> Result<CollectionOutcome> {
        let pacing = self.collector.pacing();
        let mut hook = CaptureHook::for_mode(
            mode,
            &self.screenshot_dir,
            "reply",
            pacing.capture_settle(),
            self.max_viewport_shots,
            self.collector.progress().clone(),
        );
        let plan = LoopPlan {
            target,
            iteration_cap: pacing.reply_scroll_cap,
            scope: Scope::Thread {
                parent_id: post_id(parent_url),
            },
            strategy: hook.strategy(),
        };

        if target == 0 {
            return Ok(hook.finish(self.collector.empty_outcome(&plan)));
        }
        if mode != CaptureMode::None {
            tokio::fs::create_dir_all(&self.screenshot_dir).await?;
        }

        self.collector.navigate(parent_url).await?;
        sleep(pacing.thread_settle()).await;
        self.scroll_past_parent().await;

        info!("Collecting {} replies to {}", target, parent_url);
        let outcome = self.collector.run(plan, &mut hook).await;
        Ok(hook.finish(outcome))
    }

    /// Bring the parent into view, then step down into the replies
    async fn scroll_past_parent(&self) {
        let page = self.collector.page();
        let pacing = self.collector.pacing();
        let selector = &self.collector.extractor().selectors().post_container;

        match page.find_elements(selector).await {
            Ok(elements) => {
                if let Some(parent) = elements.first() {
                    if let Err(e) = parent.scroll_into_view().await {
                        warn!("Could not scroll to parent post: {}", e);
                    }
                }
            }
            Err(e) => warn!("Parent post lookup failed: {}", e),
        }
        sleep(pacing.reply_prescroll_delay()).await;

        for _ in 0..pacing.reply_prescroll_steps {
            if let Err(e) = page.scroll_by(pacing.reply_prescroll_px).await {
                warn!("Scroll into reply section failed: {}", e);
                break;
            }
            sleep(pacing.reply_prescroll_delay()).await;
        }
    }
}

#[cfg(test)]
mod tests {
    use url::Url;

    use super::*;
    use crate::browser::testing::{posts, SimElement, SimEvent, SimPage};
    use crate::scraper::extractor::RecordExtractor;
    use crate::scraper::pacing::PacingPolicy;
    use crate::scraper::report::StopReason;
    use crate::scraper::selectors::SelectorConfig;

    const PARENT: &str = "https://x.com/user100/status/100";

    fn collector(page: &SimPage, prescroll_steps: u32) -> Collector<'_, SimPage> {
        let extractor = RecordExtractor::new(
            SelectorConfig::default(),
            Url::parse("https://x.com/").unwrap(),
        );
        let pacing = PacingPolicy {
            reply_prescroll_steps: prescroll_steps,
            ..PacingPolicy::immediate()
        };
        Collector::new(page, extractor, pacing)
    }

    fn ids(outcome: &CollectionOutcome) -> Vec<String> {
        outcome
            .records
            .iter()
            .filter_map(|r| post_id(&r.identity_key))
            .collect()
    }

    #[tokio::test]
    async fn test_parent_never_collected() {
        let dir = tempfile::tempdir().unwrap();
        let page = SimPage::new(vec![
            posts(&["100", "1", "2"]),
            posts(&["100", "2", "3"]),
        ]);
        let collector = collector(&page, 0);
        let outcome = ReplyCollector::new(&collector, dir.path())
            .collect_replies(PARENT, 3, CaptureMode::None)
            .await
            .unwrap();

        assert_eq!(ids(&outcome), vec!["1", "2", "3"]);
        assert_eq!(page.navigations(), vec![PARENT.to_string()]);
    }

    #[tokio::test]
    async fn test_parent_skipped_wherever_it_renders() {
        let dir = tempfile::tempdir().unwrap();
        let page = SimPage::new(vec![posts(&["1", "100", "2"])]);
        let collector = collector(&page, 0);
        let outcome = ReplyCollector::new(&collector, dir.path())
            .collect_replies(PARENT, 5, CaptureMode::None)
            .await
            .unwrap();

        assert_eq!(ids(&outcome), vec!["1", "2"]);
        assert_eq!(outcome.report.stop_reason, StopReason::Stagnation);
    }

    #[tokio::test]
    async fn test_first_element_is_root_when_parent_unknown() {
        let dir = tempfile::tempdir().unwrap();
        let page = SimPage::new(vec![posts(&["50", "1", "2"])]);
        let collector = collector(&page, 0);
        let outcome = ReplyCollector::new(&collector, dir.path())
            .collect_replies("https://x.com/somewhere", 2, CaptureMode::None)
            .await
            .unwrap();

        assert_eq!(ids(&outcome), vec!["1", "2"]);
    }

    #[tokio::test]
    async fn test_prescroll_before_collection() {
        let dir = tempfile::tempdir().unwrap();
        let page = SimPage::new(vec![
            posts(&["100"]),
            posts(&["100", "1"]),
            posts(&["1", "2"]),
            posts(&["2", "3"]),
        ]);
        let collector = collector(&page, 3);
        let outcome = ReplyCollector::new(&collector, dir.path())
            .collect_replies(PARENT, 1, CaptureMode::None)
            .await
            .unwrap();

        // Collection starts at the position reached by the three pre-scroll steps
        assert_eq!(ids(&outcome), vec!["2"]);
        let events = page.events();
        assert!(events.contains(&SimEvent::ScrollIntoView("100".into())));
        let scrolls_before_loop = events
            .iter()
            .take_while(|e| !matches!(e, SimEvent::Query { position: 3 }))
            .filter(|e| matches!(e, SimEvent::Scroll))
            .count();
        assert_eq!(scrolls_before_loop, 3);
    }

    #[tokio::test]
    async fn test_reply_screenshots_named_by_index() {
        let dir = tempfile::tempdir().unwrap();
        let page = SimPage::new(vec![posts(&["100", "7", "8"])]);
        let collector = collector(&page, 0);
        let outcome = ReplyCollector::new(&collector, dir.path())
            .collect_replies(PARENT, 2, CaptureMode::SmartBatch)
            .await
            .unwrap();

        let names: Vec<_> = outcome.artifacts.iter().map(|a| a.file_name()).collect();
        assert_eq!(names, vec!["reply_001_User_7.png", "reply_002_User_8.png"]);
    }

    #[tokio::test]
    async fn test_reply_iteration_cap() {
        let dir = tempfile::tempdir().unwrap();
        // A new reply on every scroll, forever
        let snapshots: Vec<Vec<SimElement>> = (0..40)
            .map(|i| vec![SimElement::post(&(i + 1).to_string())])
            .collect();
        let page = SimPage::new(snapshots);
        let collector = collector(&page, 0);
        let outcome = ReplyCollector::new(&collector, dir.path())
            .collect_replies(PARENT, 100, CaptureMode::None)
            .await
            .unwrap();

        assert_eq!(outcome.report.iterations, 15);
        assert_eq!(outcome.report.stop_reason, StopReason::IterationCap);
        assert_eq!(outcome.records.len(), 15);
    }
}
