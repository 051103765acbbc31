use std::collections::HashSet;

use crate::domain::PostRecord;
use crate::scraper::report::{RunReport, RunStatus, ShortfallReason, StopReason};

/// Mutable state of one collection run.
///
/// Owned by a single run and discarded when it ends. Keeps the seen set,
/// the accepted records and the counters the stop conditions read.
#[derive(Debug)]
pub struct CaptureSession {
    target: usize,
    iteration_cap: usize,
    stagnation_threshold: u32,
    seen: HashSet<String>,
    records: Vec<PostRecord>,
    iteration: usize,
    stagnation: u32,
    accepted_this_iteration: usize,
    evaluated: usize,
    promoted_skipped: usize,
    unkeyed_skipped: usize,
}

impl CaptureSession {
    pub fn new(target: usize, iteration_cap: usize, stagnation_threshold: u32) -> Self {
        Self {
            target,
            iteration_cap,
            stagnation_threshold: stagnation_threshold.max(1),
            seen: HashSet::new(),
            records: Vec::new(),
            iteration: 0,
            stagnation: 0,
            accepted_this_iteration: 0,
            evaluated: 0,
            promoted_skipped: 0,
            unkeyed_skipped: 0,
        }
    }

    pub fn target(&self) -> usize {
        self.target
    }

    pub fn iteration(&self) -> usize {
        self.iteration
    }

    pub fn accepted(&self) -> usize {
        self.records.len()
    }

    pub fn is_seen(&self, key: &str) -> bool {
        self.seen.contains(key)
    }

    /// Returns false if the key was already present
    pub fn mark_seen(&mut self, key: &str) -> bool {
        self.seen.insert(key.to_string())
    }

    /// Index the next accepted record will get
    pub fn next_index(&self) -> usize {
        self.records.len() + 1
    }

    pub fn target_reached(&self) -> bool {
        self.records.len() >= self.target
    }

    pub fn begin_iteration(&mut self) -> usize {
        self.iteration += 1;
        self.accepted_this_iteration = 0;
        self.iteration
    }

    pub fn note_evaluated(&mut self) {
        self.evaluated += 1;
    }

    pub fn note_promoted(&mut self) {
        self.promoted_skipped += 1;
    }

    pub fn note_unkeyed(&mut self) {
        self.unkeyed_skipped += 1;
    }

    pub fn accept(&mut self, record: PostRecord) -> &PostRecord {
        self.accepted_this_iteration += 1;
        self.records.push(record);
        &self.records[self.records.len() - 1]
    }

    /// Close the current iteration and decide whether to keep scrolling
    pub fn end_iteration(&mut self) -> Option<StopReason> {
        if self.accepted_this_iteration == 0 {
            self.stagnation += 1;
        } else {
            self.stagnation = 0;
        }

        if self.target_reached() {
            Some(StopReason::TargetReached)
        } else if self.stagnation >= self.stagnation_threshold {
            Some(StopReason::Stagnation)
        } else if self.iteration >= self.iteration_cap {
            Some(StopReason::IterationCap)
        } else {
            None
        }
    }

    /// Consume the session into its records and run report
    pub fn finish(self, stop_reason: StopReason) -> (Vec<PostRecord>, RunReport) {
        let accepted = self.records.len();
        let status = if accepted >= self.target {
            RunStatus::Complete
        } else {
            let reason = if self.promoted_skipped > 0
                && accepted + self.promoted_skipped >= self.target
            {
                ShortfallReason::PromotionFiltering
            } else {
                match stop_reason {
                    StopReason::Cancelled => ShortfallReason::Cancelled,
                    StopReason::IterationCap => ShortfallReason::IterationCap,
                    StopReason::Stagnation | StopReason::TargetReached => {
                        ShortfallReason::Stagnation
                    }
                }
            };
            RunStatus::Short { reason }
        };

        let report = RunReport {
            requested: self.target,
            accepted,
            evaluated: self.evaluated,
            promoted_skipped: self.promoted_skipped,
            unkeyed_skipped: self.unkeyed_skipped,
            iterations: self.iteration,
            iteration_cap: self.iteration_cap,
            stop_reason,
            status,
            missing_artifacts: Vec::new(),
            capture_shortfall: None,
        };
        (self.records, report)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn record(session: &CaptureSession, key: &str) -> PostRecord {
        let mut record = PostRecord::new(session.next_index());
        record.identity_key = key.to_string();
        record
    }

    #[test]
    fn test_stagnation_stops_after_threshold() {
        let mut session = CaptureSession::new(10, 30, 3);
        session.begin_iteration();
        let r = record(&session, "a");
        session.accept(r);
        assert_eq!(session.end_iteration(), None);

        for _ in 0..2 {
            session.begin_iteration();
            assert_eq!(session.end_iteration(), None);
        }
        session.begin_iteration();
        assert_eq!(session.end_iteration(), Some(StopReason::Stagnation));
        assert_eq!(session.iteration(), 4);
    }

    #[test]
    fn test_new_record_resets_stagnation() {
        let mut session = CaptureSession::new(10, 30, 2);
        session.begin_iteration();
        assert_eq!(session.end_iteration(), None);
        session.begin_iteration();
        let r = record(&session, "a");
        session.accept(r);
        assert_eq!(session.end_iteration(), None);
        session.begin_iteration();
        assert_eq!(session.end_iteration(), None);
        session.begin_iteration();
        assert_eq!(session.end_iteration(), Some(StopReason::Stagnation));
    }

    #[test]
    fn test_iteration_cap() {
        let mut session = CaptureSession::new(100, 3, 10);
        for i in 0..3 {
            session.begin_iteration();
            let r = record(&session, &i.to_string());
            session.accept(r);
            let stop = session.end_iteration();
            if i < 2 {
                assert_eq!(stop, None);
            } else {
                assert_eq!(stop, Some(StopReason::IterationCap));
            }
        }
    }

    #[test]
    fn test_target_reached_wins() {
        let mut session = CaptureSession::new(1, 1, 1);
        session.begin_iteration();
        let r = record(&session, "a");
        session.accept(r);
        assert_eq!(session.end_iteration(), Some(StopReason::TargetReached));

        let (records, report) = session.finish(StopReason::TargetReached);
        assert_eq!(records.len(), 1);
        assert_eq!(report.status, RunStatus::Complete);
    }

    #[test]
    fn test_indices_are_dense() {
        let mut session = CaptureSession::new(3, 10, 3);
        session.begin_iteration();
        for key in ["a", "b", "c"] {
            assert!(session.mark_seen(key));
            let r = record(&session, key);
            session.accept(r);
        }
        assert!(!session.mark_seen("a"));
        let (records, _) = session.finish(StopReason::TargetReached);
        let indices: Vec<usize> = records.iter().map(|r| r.capture_index).collect();
        assert_eq!(indices, vec![1, 2, 3]);
    }

    #[test]
    fn test_shortfall_attributed_to_promotions() {
        let mut session = CaptureSession::new(5, 10, 3);
        session.begin_iteration();
        for key in ["a", "b", "c", "d"] {
            let r = record(&session, key);
            session.accept(r);
        }
        session.note_promoted();
        let (_, report) = session.finish(StopReason::Stagnation);
        assert_eq!(
            report.status,
            RunStatus::Short {
                reason: ShortfallReason::PromotionFiltering
            }
        );
    }

    #[test]
    fn test_shortfall_follows_stop_reason() {
        let session = CaptureSession::new(5, 10, 3);
        let (_, report) = session.finish(StopReason::Cancelled);
        assert_eq!(
            report.status,
            RunStatus::Short {
                reason: ShortfallReason::Cancelled
            }
        );
    }
}
