use std::path::PathBuf;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use tokio::sync::mpsc;

/// Observable milestones of a collection run
#[derive(Debug, Clone, PartialEq)]
pub enum ProgressEvent {
    Navigated { url: String },
    Iteration {
        iteration: usize,
        visible: usize,
        accepted: usize,
        target: usize,
    },
    Accepted { capture_index: usize, identity_key: String },
    Captured { capture_index: Option<usize>, path: PathBuf },
    CaptureFailed { capture_index: usize, reason: String },
    Finished { summary: String },
}

/// Optional progress channel. Events are dropped rather than blocking the
/// run when the receiver falls behind or has gone away.
#[derive(Debug, Clone, Default)]
pub struct ProgressSink(Option<mpsc::Sender<ProgressEvent>>);

impl ProgressSink {
    pub fn new(tx: mpsc::Sender<ProgressEvent>) -> Self {
        Self(Some(tx))
    }

    pub fn none() -> Self {
        Self(None)
    }

    pub fn emit(&self, event: ProgressEvent) {
        if let Some(tx) = &self.0 {
            let _ = tx.try_send(event);
        }
    }
}

/// Cooperative cancellation checked between scroll iterations
#[derive(Debug, Clone, Default)]
pub struct CancelFlag(Arc<AtomicBool>);

impl CancelFlag {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn cancel(&self) {
        self.0.store(true, Ordering::SeqCst);
    }

    pub fn is_cancelled(&self) -> bool {
        self.0.load(Ordering::SeqCst)
    }
}
