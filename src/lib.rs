//! # Trawler
//!
//! Incremental collection of posts, timelines and reply threads from an
//! infinite-scroll social site driven through a real browser.
//!
//! ## Architecture
//!
//! ```text
//! Target → Collector (scroll loop) → RecordExtractor → CaptureSession
//!                │                                        │
//!                └── CaptureCoordinator / ReplyCollector ─┴→ Formatter → Store
//! ```
//!
//! ## Quick Start
//!
//! ```bash
//! # Start Chrome with remote debugging, then:
//! trawler collect "rust async" -n 30
//! trawler collect @rustlang --capture full_batch --format json
//! trawler collect https://x.com/rustlang/status/1790000000000000000
//! trawler history
//! ```

/// Application context and error handling.
///
/// [`AppContext`](app::AppContext) wires the configuration, the run
/// archive and the collectors together.
pub mod app;

/// Page and element handles over a remote browser.
///
/// - [`PageHandle`](browser::PageHandle) / [`ElementHandle`](browser::ElementHandle):
///   the seam every collector is written against
/// - [`ChromeSession`](browser::ChromeSession): chromiumoxide implementation
pub mod browser;

/// Command-line interface using clap.
///
/// - `collect <input>` - Collect posts for a query, `@handle` or post URL
/// - `history [run]` - List archived runs or the posts of one run
/// - `config-path` - Print the config file location
pub mod cli;

/// Configuration loaded from `~/.config/trawler/config.toml`.
pub mod config;

/// Core domain models.
///
/// - [`PostRecord`](domain::PostRecord): one scraped post with engagement counters
/// - [`ScreenshotArtifact`](domain::ScreenshotArtifact): a saved capture
/// - [`Target`](domain::Target): a routed user request
pub mod domain;

/// Result files, screenshot directories and summaries.
pub mod output;

/// Hand-off to chat and transcription collaborators.
pub mod pipeline;

/// Scroll loop, record extraction, capture and pacing.
pub mod scraper;

/// SQLite archive of past runs.
///
/// - [`Store`](store::Store): Trait defining storage operations
/// - [`SqliteStore`](store::SqliteStore): SQLite implementation
pub mod store;
