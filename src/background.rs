//! Detached background work.
//!
//! The cache never awaits revalidation on the response path. It hands the work
//! to a [`Detach`] implementation supplied by the host, which decides where the
//! task runs and how its completion is awaited before shutdown.

use futures::FutureExt;
use futures::future::BoxFuture;
use std::panic::AssertUnwindSafe;
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use tokio::sync::Notify;

/// Capability to run a unit of work detached from the current request.
pub trait Detach: Send + Sync {
    /// Start `task` without waiting for it.
    fn detach(&self, task: BoxFuture<'static, ()>);

    /// Resolve once every task detached so far has finished.
    ///
    /// Executors that do not track their tasks resolve immediately.
    fn wait_idle(&self) -> BoxFuture<'_, ()> {
        Box::pin(async {})
    }
}

/// Plain fire-and-forget on a tokio runtime.
impl Detach for tokio::runtime::Handle {
    fn detach(&self, task: BoxFuture<'static, ()>) {
        self.spawn(task);
    }
}

#[derive(Default)]
struct Pending {
    count: AtomicUsize,
    idle: Notify,
}

/// Marks one task finished when dropped, also when the task panics or the
/// runtime drops it.
struct PendingGuard(Arc<Pending>);

impl Drop for PendingGuard {
    fn drop(&mut self) {
        if self.0.count.fetch_sub(1, Ordering::AcqRel) == 1 {
            self.0.idle.notify_waiters();
        }
    }
}

/// Spawns detached tasks onto the current tokio runtime and keeps count of
/// them so the host can wait for all of them before tearing down.
///
/// Clones share the same count. Must be used from within a tokio runtime.
/// Tasks run to completion on their own: neither dropping the tracker nor
/// cancelling a [`wait`](Self::wait) stops them.
///
/// # Example
/// ```ignore
/// let tracker = TaskTracker::new();
/// let cache = SwrCacheBuilder::new(origin)
///     .detach(Arc::new(tracker.clone()))
///     .build();
///
/// let response = cache.serve(request, 60).await?;
/// // ... respond, then before shutting down:
/// tracker.wait().await;
/// ```
#[derive(Clone, Default)]
pub struct TaskTracker {
    pending: Arc<Pending>,
}

impl TaskTracker {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of tasks still running.
    pub fn len(&self) -> usize {
        self.pending.count.load(Ordering::Acquire)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Wait until every detached task has finished, including tasks detached
    /// while waiting.
    ///
    /// Cancel safe: dropping the returned future leaves the tasks running
    /// and tracked.
    pub async fn wait(&self) {
        loop {
            let idle = self.pending.idle.notified();
            tokio::pin!(idle);
            // Register before reading the count so a wakeup in between is kept
            idle.as_mut().enable();

            if self.is_empty() {
                return;
            }
            idle.await;
        }
    }
}

impl Detach for TaskTracker {
    fn detach(&self, task: BoxFuture<'static, ()>) {
        self.pending.count.fetch_add(1, Ordering::AcqRel);
        let guard = PendingGuard(self.pending.clone());

        tokio::spawn(async move {
            let _guard = guard;
            if AssertUnwindSafe(task).catch_unwind().await.is_err() {
                tracing::warn!("detached task panicked");
            }
        });
    }

    fn wait_idle(&self) -> BoxFuture<'_, ()> {
        Box::pin(self.wait())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::time::Duration;

    #[tokio::test]
    async fn test_wait_joins_detached_tasks() {
        let tracker = TaskTracker::new();
        let done = Arc::new(AtomicUsize::new(0));

        for i in 0..3 {
            let done = done.clone();
            tracker.detach(Box::pin(async move {
                tokio::time::sleep(Duration::from_millis(10 * (i + 1))).await;
                done.fetch_add(1, Ordering::SeqCst);
            }));
        }

        // Detaching returns immediately
        assert_eq!(done.load(Ordering::SeqCst), 0);

        tracker.wait().await;
        assert_eq!(done.load(Ordering::SeqCst), 3);
        assert!(tracker.is_empty());
    }

    #[tokio::test]
    async fn test_wait_covers_tasks_detached_while_waiting() {
        let tracker = TaskTracker::new();
        let done = Arc::new(AtomicUsize::new(0));

        let inner_tracker = tracker.clone();
        let inner_done = done.clone();
        tracker.detach(Box::pin(async move {
            inner_tracker.detach(Box::pin(async move {
                tokio::time::sleep(Duration::from_millis(20)).await;
                inner_done.fetch_add(1, Ordering::SeqCst);
            }));
        }));

        tracker.wait().await;
        assert_eq!(done.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_cancelled_wait_leaves_tasks_running() {
        let tracker = TaskTracker::new();
        let done = Arc::new(AtomicUsize::new(0));

        let task_done = done.clone();
        tracker.detach(Box::pin(async move {
            tokio::time::sleep(Duration::from_millis(100)).await;
            task_done.fetch_add(1, Ordering::SeqCst);
        }));

        let waited = tokio::time::timeout(Duration::from_millis(10), tracker.wait()).await;
        assert!(waited.is_err());
        assert_eq!(tracker.len(), 1);

        tokio::time::sleep(Duration::from_millis(300)).await;
        assert_eq!(done.load(Ordering::SeqCst), 1);
        assert!(tracker.is_empty());

        // A later wait still returns
        tracker.wait().await;
    }

    #[tokio::test]
    async fn test_wait_on_empty_tracker_returns() {
        let tracker = TaskTracker::new();
        tracker.wait().await;
        tracker.wait_idle().await;
        assert!(tracker.is_empty());
    }

    #[tokio::test]
    async fn test_panicking_task_does_not_poison_wait() {
        let tracker = TaskTracker::new();
        tracker.detach(Box::pin(async { panic!("boom") }));
        tracker.wait().await;
        assert!(tracker.is_empty());
    }
}
