use serde::{Deserialize, Serialize};
use std::str::FromStr;
use std::time::Duration;

/// Named pacing presets selectable from the command line
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Pace {
    Fast,
    Thorough,
}

impl FromStr for Pace {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "fast" => Ok(Pace::Fast),
            "thorough" | "slow" => Ok(Pace::Thorough),
            other => Err(format!("Unknown pace: {}. Use fast or thorough", other)),
        }
    }
}

/// Waits, retry counts and iteration caps shared by every collector.
///
/// Infinite-scroll pages load lazily, so these values trade run time for
/// completeness. Zero delays are valid.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PacingPolicy {
    /// Wait after each scroll for new items to render, in milliseconds (default: 800)
    pub scroll_delay_ms: u64,

    /// Wait after navigation before the first query, in milliseconds (default: 2500)
    pub navigation_settle_ms: u64,

    /// Wait after opening a thread, in milliseconds (default: 5000)
    pub thread_settle_ms: u64,

    /// Wait between scrolling an element into view and capturing it (default: 500)
    pub capture_settle_ms: u64,

    /// Wait between navigation retries, in milliseconds (default: 500)
    pub retry_delay_ms: u64,

    /// Navigation retries after the first attempt (default: 2)
    pub max_retries: u32,

    /// Page load timeout in seconds (default: 15)
    pub navigation_timeout_secs: u64,

    /// Timeout for one container query in milliseconds (default: 5000)
    pub query_timeout_ms: u64,

    /// Consecutive iterations without a new record before giving up (default: 3)
    pub stagnation_threshold: u32,

    /// Iteration cap is `ceil(target * scroll_multiplier)` clamped to
    /// `[scroll_floor, scroll_ceiling]`
    pub scroll_multiplier: f64,
    pub scroll_floor: usize,
    pub scroll_ceiling: usize,

    /// Fixed iteration cap for thread replies (default: 15)
    pub reply_scroll_cap: usize,

    /// Scroll steps taken past the parent post before reading replies (default: 3)
    pub reply_prescroll_steps: u32,
    pub reply_prescroll_px: i64,
    pub reply_prescroll_delay_ms: u64,

    /// Viewport capture scrolls by this fraction of the viewport (default: 0.8)
    pub viewport_scroll_fraction: f64,

    /// Wait after each viewport capture scroll, in milliseconds (default: 2000)
    pub viewport_scroll_delay_ms: u64,
}

impl Default for PacingPolicy {
    fn default() -> Self {
        Self {
            scroll_delay_ms: 800,
            navigation_settle_ms: 2500,
            thread_settle_ms: 5000,
            capture_settle_ms: 500,
            retry_delay_ms: 500,
            max_retries: 2,
            navigation_timeout_secs: 15,
            query_timeout_ms: 5000,
            stagnation_threshold: 3,
            scroll_multiplier: 2.0,
            scroll_floor: 10,
            scroll_ceiling: 30,
            reply_scroll_cap: 15,
            reply_prescroll_steps: 3,
            reply_prescroll_px: 500,
            reply_prescroll_delay_ms: 1000,
            viewport_scroll_fraction: 0.8,
            viewport_scroll_delay_ms: 2000,
        }
    }
}

impl PacingPolicy {
    /// Maximum scroll iterations for a run that wants `target` records
    pub fn scroll_cap(&self, target: usize) -> usize {
        let wanted = (target as f64 * self.scroll_multiplier).ceil().max(0.0) as usize;
        wanted.max(self.scroll_floor).min(self.scroll_ceiling).max(1)
    }

    pub fn scroll_delay(&self) -> Duration {
        Duration::from_millis(self.scroll_delay_ms)
    }

    pub fn navigation_settle(&self) -> Duration {
        Duration::from_millis(self.navigation_settle_ms)
    }

    pub fn thread_settle(&self) -> Duration {
        Duration::from_millis(self.thread_settle_ms)
    }

    pub fn capture_settle(&self) -> Duration {
        Duration::from_millis(self.capture_settle_ms)
    }

    pub fn retry_delay(&self) -> Duration {
        Duration::from_millis(self.retry_delay_ms)
    }

    pub fn navigation_timeout(&self) -> Duration {
        Duration::from_secs(self.navigation_timeout_secs)
    }

    pub fn query_timeout(&self) -> Duration {
        Duration::from_millis(self.query_timeout_ms)
    }

    pub fn reply_prescroll_delay(&self) -> Duration {
        Duration::from_millis(self.reply_prescroll_delay_ms)
    }

    pub fn viewport_scroll_delay(&self) -> Duration {
        Duration::from_millis(self.viewport_scroll_delay_ms)
    }

    pub fn preset(pace: Pace) -> Self {
        match pace {
            Pace::Fast => Self::fast(),
            Pace::Thorough => Self::thorough(),
        }
    }

    /// Shorter waits, for fast connections and small targets
    pub fn fast() -> Self {
        Self {
            scroll_delay_ms: 400,
            navigation_settle_ms: 1000,
            thread_settle_ms: 2000,
            capture_settle_ms: 200,
            navigation_timeout_secs: 8,
            viewport_scroll_delay_ms: 1000,
            ..Default::default()
        }
    }

    /// Longer waits and more patience before declaring stagnation
    pub fn thorough() -> Self {
        Self {
            scroll_delay_ms: 1500,
            navigation_settle_ms: 4000,
            thread_settle_ms: 8000,
            capture_settle_ms: 1000,
            max_retries: 3,
            navigation_timeout_secs: 30,
            stagnation_threshold: 5,
            scroll_ceiling: 60,
            ..Default::default()
        }
    }

    /// No waiting at all
    #[cfg(test)]
    pub fn immediate() -> Self {
        Self {
            scroll_delay_ms: 0,
            navigation_settle_ms: 0,
            thread_settle_ms: 0,
            capture_settle_ms: 0,
            retry_delay_ms: 0,
            reply_prescroll_delay_ms: 0,
            viewport_scroll_delay_ms: 0,
            ..Default::default()
        }
    }
}
