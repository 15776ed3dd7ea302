// Progress events and cooperative cancellation.
//
// Both ends are owned outside the engine: the caller keeps the receiver
// and the flag, the engine only sends and polls.

use super::error::Phase;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use tokio::sync::mpsc;

#[derive(Debug, Clone)]
pub struct ProgressEvent {
    pub phase: Phase,
    pub bytes_done: usize,
    pub bytes_total: usize,
    pub message: String,
}

impl ProgressEvent {
    pub fn percent(&self) -> f32 {
        if self.bytes_total == 0 {
            return 100.0;
        }
        (self.bytes_done as f32 / self.bytes_total as f32) * 100.0
    }
}

pub type ProgressSender = mpsc::UnboundedSender<ProgressEvent>;
pub type ProgressReceiver = mpsc::UnboundedReceiver<ProgressEvent>;

pub fn progress_channel() -> (ProgressSender, ProgressReceiver) {
    mpsc::unbounded_channel()
}

/// Cancellation flag polled at block boundaries only, so an in-flight
/// frame always completes or times out before the engine gives up.
#[derive(Debug, Clone, Default)]
pub struct CancelFlag(Arc<AtomicBool>);

impl CancelFlag {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn cancel(&self) {
        self.0.store(true, Ordering::Relaxed);
    }

    pub fn is_cancelled(&self) -> bool {
        self.0.load(Ordering::Relaxed)
    }
}
