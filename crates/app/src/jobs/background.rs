use std::future::Future;
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

use tokio::sync::Notify;
use tracing::{debug, warn};

#[derive(Debug, Default)]
struct Inner {
    in_flight: AtomicUsize,
    idle: Notify,
}

/// Detached fire-and-forget tasks, each bounded by its own timeout.
///
/// Callers never observe the outcome of a task. The runner only tracks how
/// many are still running so shutdown (and tests) can wait for them.
#[derive(Debug, Clone, Default)]
pub struct BackgroundTasks {
    inner: Arc<Inner>,
}

struct InFlightGuard {
    inner: Arc<Inner>,
}

impl Drop for InFlightGuard {
    fn drop(&mut self) {
        if self.inner.in_flight.fetch_sub(1, Ordering::AcqRel) == 1 {
            self.inner.idle.notify_waiters();
        }
    }
}

impl BackgroundTasks {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn spawn<F>(&self, name: &'static str, limit: Duration, task: F)
    where
        F: Future<Output = ()> + Send + 'static,
    {
        self.inner.in_flight.fetch_add(1, Ordering::AcqRel);
        let guard = InFlightGuard {
            inner: self.inner.clone(),
        };
        tokio::spawn(async move {
            let _guard = guard;
            match tokio::time::timeout(limit, task).await {
                Ok(()) => debug!(task = name, "background task complete"),
                Err(_) => warn!(
                    task = name,
                    timeout_ms = limit.as_millis() as u64,
                    "background task timed out"
                ),
            }
        });
    }

    pub fn in_flight(&self) -> usize {
        self.inner.in_flight.load(Ordering::Acquire)
    }

    /// Resolves once no task is running.
    pub async fn wait_idle(&self) {
        loop {
            let notified = self.inner.idle.notified();
            tokio::pin!(notified);
            notified.as_mut().enable();
            if self.in_flight() == 0 {
                return;
            }
            notified.await;
        }
    }
}
