//! Cooperative cancellation shared between a running operation and its caller.

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

/// Marker returned when an operation noticed a cancellation request
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
#[error("operation cancelled")]
pub struct Cancelled;

/// Clonable flag checked at every checkpoint of a long-running operation
///
/// All clones observe the same flag, so the controller can keep one handle
/// while the worker polls another.
#[derive(Debug, Clone, Default)]
pub struct CancellationToken {
    flag: Arc<AtomicBool>,
}

impl CancellationToken {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn cancel(&self) {
        self.flag.store(true, Ordering::SeqCst);
    }

    pub fn is_cancelled(&self) -> bool {
        self.flag.load(Ordering::SeqCst)
    }

    /// Checkpoint: `Err(Cancelled)` once `cancel` has been called on any clone
    pub fn check(&self) -> Result<(), Cancelled> {
        if self.is_cancelled() {
            Err(Cancelled)
        } else {
            Ok(())
        }
    }
}
