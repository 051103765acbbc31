//! Incremental collection of posts from infinite-scroll pages.
//!
//! # Architecture
//!
//! ```text
//! Origin → Collector (scroll loop) → RecordExtractor → PostRecord
//!                 │
//!                 └── CaptureHook → ScreenshotArtifact
//! ```
//!
//! # Usage
//!
//! ```rust,ignore
//! use trawler::scraper::{CaptureCoordinator, Collector, PacingPolicy, RecordExtractor};
//!
//! let collector = Collector::new(&page, extractor, PacingPolicy::default());
//!
//! // Data only
//! let outcome = collector.collect(&origin, 20).await?;
//!
//! // With a screenshot of every record
//! let outcome = CaptureCoordinator::new(&collector, "shots")
//!     .collect_with_capture(&origin, 20, CaptureMode::SmartBatch)
//!     .await?;
//! ```

mod capture;
mod collector;
mod config;
mod count;
mod extractor;
mod pacing;
mod progress;
mod replies;
mod report;
mod selectors;
mod session;

pub use capture::CaptureCoordinator;
pub use collector::{Collector, IterationHook, LoopOutcome, NoHook, ScrollStrategy};
pub use config::ScraperConfig;
pub use count::{is_count_like, parse_count};
pub use extractor::{clean_text, label_count, normalize_timestamp, RecordExtractor};
pub use pacing::{Pace, PacingPolicy};
pub use progress::{CancelFlag, ProgressEvent, ProgressSink};
pub use replies::ReplyCollector;
pub use report::{
    CaptureShortfall, CollectionOutcome, RunReport, RunStatus, ShortfallReason, StopReason,
};
pub use selectors::{CounterSelectors, SelectorConfig};
pub use session::CaptureSession;
