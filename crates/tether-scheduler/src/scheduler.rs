use std::sync::Arc;

use rayon::ThreadPool;
use tokio::sync::oneshot;

use crate::{task::BackgroundTask, CancellationToken, Cancelled, TaskError};

enum BlockingPool {
    Rayon(ThreadPool),
    Inline,
}

impl BlockingPool {
    fn spawn<F>(&self, job: F)
    where
        F: FnOnce() + Send + 'static,
    {
        match self {
            BlockingPool::Rayon(pool) => pool.spawn(job),
            BlockingPool::Inline => job(),
        }
    }
}

fn build_pool(threads: usize) -> BlockingPool {
    // Thread creation can fail in constrained CI/sandbox environments (low
    // RLIMIT_NPROC, EAGAIN). Degrade instead of crashing during startup.
    let mut threads = threads.max(1);
    loop {
        match rayon::ThreadPoolBuilder::new()
            .num_threads(threads)
            .thread_name(|idx| format!("tether-background-{idx}"))
            .build()
        {
            Ok(pool) => return BlockingPool::Rayon(pool),
            Err(_) if threads > 1 => {
                threads = (threads / 2).max(1);
            }
            Err(_) => {
                // No worker threads at all: run jobs inline. Correct, just not
                // asynchronous.
                return BlockingPool::Inline;
            }
        }
    }
}

/// A small bounded pool for fire-and-forget background work.
///
/// Jobs receive a [`CancellationToken`] and report completion through the
/// returned [`BackgroundTask`]; dropping the handle detaches the job.
#[derive(Clone)]
pub struct BackgroundScheduler {
    pool: Arc<BlockingPool>,
}

impl BackgroundScheduler {
    pub fn new(threads: usize) -> Self {
        Self {
            pool: Arc::new(build_pool(threads)),
        }
    }

    pub fn spawn<T, F>(&self, token: CancellationToken, f: F) -> BackgroundTask<T>
    where
        T: Send + 'static,
        F: FnOnce(CancellationToken) -> Result<T, Cancelled> + Send + 'static,
    {
        let (tx, rx) = oneshot::channel();
        if token.is_cancelled() {
            let _ = tx.send(Err(TaskError::Cancelled));
            return BackgroundTask::new(token, rx);
        }

        let token_for_job = token.clone();
        self.pool.spawn(move || {
            let result =
                match std::panic::catch_unwind(std::panic::AssertUnwindSafe(|| f(token_for_job))) {
                    Ok(Ok(value)) => Ok(value),
                    Ok(Err(err)) => Err(TaskError::from(err)),
                    Err(panic) => {
                        tracing::error!(
                            target = "tether.scheduler",
                            panic = %panic_message(&*panic),
                            "background task panicked"
                        );
                        Err(TaskError::Panicked)
                    }
                };
            let _ = tx.send(result);
        });

        BackgroundTask::new(token, rx)
    }
}

impl Default for BackgroundScheduler {
    fn default() -> Self {
        // One worker: per-trigger computations are serialized, matching the
        // single-thread executor the suggestion pipeline expects.
        Self::new(1)
    }
}

fn panic_message(panic: &(dyn std::any::Any + Send)) -> &str {
    if let Some(message) = panic.downcast_ref::<&str>() {
        message
    } else if let Some(message) = panic.downcast_ref::<String>() {
        message
    } else {
        "unknown panic payload"
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn runs_job_and_reports_result() {
        let scheduler = BackgroundScheduler::new(1);
        let task = scheduler.spawn(CancellationToken::new(), |_token| Ok(41 + 1));
        assert_eq!(task.wait(), Ok(42));
    }

    #[test]
    fn pre_cancelled_token_short_circuits() {
        let scheduler = BackgroundScheduler::new(1);
        let token = CancellationToken::new();
        token.cancel();
        let task = scheduler.spawn(token, |_token| Ok(()));
        assert_eq!(task.wait(), Err(TaskError::Cancelled));
    }

    #[test]
    fn panic_is_contained() {
        let scheduler = BackgroundScheduler::new(1);
        let task: BackgroundTask<()> =
            scheduler.spawn(CancellationToken::new(), |_token| panic!("boom"));
        assert_eq!(task.wait(), Err(TaskError::Panicked));
    }

    #[tokio::test]
    async fn join_observes_cancellation() {
        let scheduler = BackgroundScheduler::new(1);
        let (started_tx, started_rx) = std::sync::mpsc::channel();
        let task = scheduler.spawn(CancellationToken::new(), move |token| {
            started_tx.send(()).ok();
            while !token.is_cancelled() {
                std::thread::sleep(std::time::Duration::from_millis(5));
            }
            Err(Cancelled)
        });
        started_rx
            .recv_timeout(std::time::Duration::from_secs(5))
            .expect("job should start");
        task.cancel();
        assert_eq!(task.join().await, Err::<(), _>(TaskError::Cancelled));
    }
}
