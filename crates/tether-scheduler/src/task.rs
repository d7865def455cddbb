use tokio::sync::oneshot;

use crate::{CancellationToken, TaskError};

/// Handle to a job running on the background pool.
///
/// The handle is detachable: dropping it leaves the job running. Cancellation
/// through [`BackgroundTask::cancel`] is cooperative; the job observes it
/// through the token it was spawned with.
pub struct BackgroundTask<T> {
    token: CancellationToken,
    rx: oneshot::Receiver<Result<T, TaskError>>,
}

impl<T> BackgroundTask<T> {
    pub(crate) fn new(
        token: CancellationToken,
        rx: oneshot::Receiver<Result<T, TaskError>>,
    ) -> Self {
        Self { token, rx }
    }

    pub fn cancel(&self) {
        self.token.cancel();
    }

    pub fn token(&self) -> CancellationToken {
        self.token.clone()
    }

    /// Blocks the calling thread until the job finishes.
    ///
    /// Must not be called from async context; use [`BackgroundTask::join`]
    /// there.
    pub fn wait(self) -> Result<T, TaskError> {
        match self.rx.blocking_recv() {
            Ok(result) => result,
            Err(_) => Err(TaskError::Panicked),
        }
    }

    pub async fn join(self) -> Result<T, TaskError> {
        tokio::select! {
            biased;
            _ = self.token.cancelled() => Err(TaskError::Cancelled),
            result = self.rx => match result {
                Ok(result) => result,
                Err(_) => Err(TaskError::Panicked),
            }
        }
    }
}
