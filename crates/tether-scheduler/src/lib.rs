//! Background task scheduling for the tether backend.
//!
//! Suggestion computations are fire-and-forget: the triggering event handler
//! returns as soon as the work is handed to the pool, and results surface
//! later through a client callback. Cancellation is cooperative via
//! [`CancellationToken`], threaded through every long-running call.

mod scheduler;
mod task;

pub use scheduler::BackgroundScheduler;
pub use task::BackgroundTask;
pub use tokio_util::sync::CancellationToken;

/// Marker for cooperative cancellation. Long-running operations return
/// `Err(Cancelled)` instead of unwinding across layers.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Cancelled;

#[derive(Debug, PartialEq, Eq, thiserror::Error)]
pub enum TaskError {
    #[error("task was cancelled")]
    Cancelled,
    #[error("task panicked")]
    Panicked,
}

impl From<Cancelled> for TaskError {
    fn from(_: Cancelled) -> Self {
        TaskError::Cancelled
    }
}

/// Checks a token at a loop boundary, translating into an early return.
pub fn check_cancelled(token: &CancellationToken) -> Result<(), Cancelled> {
    if token.is_cancelled() {
        Err(Cancelled)
    } else {
        Ok(())
    }
}
