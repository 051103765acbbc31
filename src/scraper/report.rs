use std::fmt;

use serde::{Deserialize, Serialize};

use crate::domain::{PostRecord, ScreenshotArtifact};

/// Why the scroll loop ended
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StopReason {
    TargetReached,
    Stagnation,
    IterationCap,
    Cancelled,
}

impl StopReason {
    pub fn as_str(self) -> &'static str {
        match self {
            StopReason::TargetReached => "target_reached",
            StopReason::Stagnation => "stagnation",
            StopReason::IterationCap => "iteration_cap",
            StopReason::Cancelled => "cancelled",
        }
    }
}

impl fmt::Display for StopReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Why fewer records than requested came back
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ShortfallReason {
    /// Sponsored posts filled the slots the target needed
    PromotionFiltering,
    /// The page stopped yielding new posts
    Stagnation,
    IterationCap,
    Cancelled,
}

impl fmt::Display for ShortfallReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            ShortfallReason::PromotionFiltering => "promotion_filtering",
            ShortfallReason::Stagnation => "stagnation",
            ShortfallReason::IterationCap => "iteration_cap",
            ShortfallReason::Cancelled => "cancelled",
        })
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum RunStatus {
    Complete,
    Short { reason: ShortfallReason },
}

impl RunStatus {
    pub fn label(&self) -> String {
        match self {
            RunStatus::Complete => "complete".to_string(),
            RunStatus::Short { reason } => format!("short ({})", reason),
        }
    }
}

/// Fewer per-item captures than the target asked for
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct CaptureShortfall {
    pub expected: usize,
    pub captured: usize,
}

/// Counters describing how a run went
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RunReport {
    pub requested: usize,
    pub accepted: usize,
    /// Elements handed to the record extractor
    pub evaluated: usize,
    pub promoted_skipped: usize,
    /// Distinct elements with no readable permalink, text or author
    pub unkeyed_skipped: usize,
    pub iterations: usize,
    pub iteration_cap: usize,
    pub stop_reason: StopReason,
    pub status: RunStatus,
    /// Capture indices whose screenshot failed
    pub missing_artifacts: Vec<usize>,
    pub capture_shortfall: Option<CaptureShortfall>,
}

impl RunReport {
    pub fn is_complete(&self) -> bool {
        self.status == RunStatus::Complete
    }

    /// One-line summary for logs and the CLI
    pub fn summary(&self) -> String {
        let mut line = format!(
            "{}/{} records, {} evaluated, {} promoted skipped, {} iterations (cap {}), {}",
            self.accepted,
            self.requested,
            self.evaluated,
            self.promoted_skipped,
            self.iterations,
            self.iteration_cap,
            self.status.label()
        );
        if let Some(shortfall) = self.capture_shortfall {
            line.push_str(&format!(
                ", {}/{} screenshots",
                shortfall.captured, shortfall.expected
            ));
        }
        line
    }
}

/// Everything a collection run produced
#[derive(Debug, Clone)]
pub struct CollectionOutcome {
    pub records: Vec<PostRecord>,
    pub artifacts: Vec<ScreenshotArtifact>,
    pub report: RunReport,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn report() -> RunReport {
        RunReport {
            requested: 10,
            accepted: 7,
            evaluated: 9,
            promoted_skipped: 2,
            unkeyed_skipped: 0,
            iterations: 4,
            iteration_cap: 20,
            stop_reason: StopReason::Stagnation,
            status: RunStatus::Short {
                reason: ShortfallReason::Stagnation,
            },
            missing_artifacts: vec![],
            capture_shortfall: None,
        }
    }

    #[test]
    fn test_summary_line() {
        assert_eq!(
            report().summary(),
            "7/10 records, 9 evaluated, 2 promoted skipped, 4 iterations (cap 20), short (stagnation)"
        );
    }

    #[test]
    fn test_summary_mentions_capture_shortfall() {
        let mut report = report();
        report.capture_shortfall = Some(CaptureShortfall {
            expected: 10,
            captured: 6,
        });
        assert!(report.summary().ends_with(", 6/10 screenshots"));
        assert!(!report.is_complete());
    }

    #[test]
    fn test_status_serializes_with_reason() {
        let json = serde_json::to_string(&RunStatus::Short {
            reason: ShortfallReason::PromotionFiltering,
        })
        .unwrap();
        assert_eq!(json, r#"{"status":"short","reason":"promotion_filtering"}"#);
    }
}
