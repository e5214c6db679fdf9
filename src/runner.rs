//! Background job execution.
//!
//! Processing jobs normally run on detached tasks behind a semaphore that
//! caps concurrency at the configured worker count. With background jobs
//! disabled, `submit` runs the job inline and returns its result, which keeps
//! request handling deterministic in tests.

use crate::config::JobSettings;
use crate::error::Result;
use std::future::Future;
use std::sync::Arc;
use tokio::sync::Semaphore;
use tokio::task::JoinHandle;
use tracing::{debug, error};

/// Outcome of submitting a job.
pub enum TaskHandle {
    /// The job ran inline; its result is available immediately.
    Finished(Result<i64>),
    /// The job was spawned in the background.
    Spawned(JoinHandle<()>),
}

/// Bounded executor for meeting-processing jobs.
#[derive(Clone)]
pub struct TaskRunner {
    enabled: bool,
    permits: Arc<Semaphore>,
}

impl TaskRunner {
    pub fn new(settings: &JobSettings) -> Self {
        Self {
            enabled: settings.enabled,
            permits: Arc::new(Semaphore::new(settings.workers.max(1))),
        }
    }

    /// Submit a job. Spawned jobs wait for a worker permit before running,
    /// so at most `workers` jobs execute concurrently.
    pub async fn submit<F>(&self, job: F) -> TaskHandle
    where
        F: Future<Output = Result<i64>> + Send + 'static,
    {
        if !self.enabled {
            return TaskHandle::Finished(job.await);
        }

        let permits = Arc::clone(&self.permits);
        let handle = tokio::spawn(async move {
            let _permit = match permits.acquire_owned().await {
                Ok(permit) => permit,
                // The semaphore is never closed while the runner is alive.
                Err(_) => return,
            };
            match job.await {
                Ok(id) => debug!("Background job finished for meeting {}", id),
                Err(e) => error!("Background job failed: {}", e),
            }
        });
        TaskHandle::Spawned(handle)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::time::Duration;

    #[tokio::test]
    async fn test_disabled_runner_executes_inline() {
        let runner = TaskRunner::new(&JobSettings {
            enabled: false,
            workers: 2,
        });
        let handle = runner.submit(async { Ok(7) }).await;
        match handle {
            TaskHandle::Finished(result) => assert_eq!(result.unwrap(), 7),
            TaskHandle::Spawned(_) => panic!("expected inline execution"),
        }
    }

    #[tokio::test]
    async fn test_spawned_job_completes() {
        let counter = Arc::new(AtomicUsize::new(0));
        let runner = TaskRunner::new(&JobSettings {
            enabled: true,
            workers: 2,
        });

        let c = Arc::clone(&counter);
        let handle = runner
            .submit(async move {
                c.fetch_add(1, Ordering::SeqCst);
                Ok(1)
            })
            .await;

        match handle {
            TaskHandle::Spawned(join) => join.await.unwrap(),
            TaskHandle::Finished(_) => panic!("expected background execution"),
        }
        assert_eq!(counter.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_worker_limit_bounds_concurrency() {
        let runner = TaskRunner::new(&JobSettings {
            enabled: true,
            workers: 1,
        });
        let active = Arc::new(AtomicUsize::new(0));
        let peak = Arc::new(AtomicUsize::new(0));

        let mut handles = Vec::new();
        for _ in 0..4 {
            let active = Arc::clone(&active);
            let peak = Arc::clone(&peak);
            let handle = runner
                .submit(async move {
                    let now = active.fetch_add(1, Ordering::SeqCst) + 1;
                    peak.fetch_max(now, Ordering::SeqCst);
                    tokio::time::sleep(Duration::from_millis(10)).await;
                    active.fetch_sub(1, Ordering::SeqCst);
                    Ok(0)
                })
                .await;
            handles.push(handle);
        }

        for handle in handles {
            if let TaskHandle::Spawned(join) = handle {
                join.await.unwrap();
            }
        }
        assert_eq!(peak.load(Ordering::SeqCst), 1);
    }
}
