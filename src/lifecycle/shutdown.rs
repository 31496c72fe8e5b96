//! Shutdown coordination and background task tracking.

use std::future::Future;
use std::sync::Mutex;
use std::time::Duration;

use tokio::sync::broadcast;
use tokio::task::JoinHandle;

/// Coordinator for graceful shutdown.
///
/// Provides a broadcast channel that all long-running tasks can subscribe to.
pub struct Shutdown {
    /// Broadcast channel sender.
    tx: broadcast::Sender<()>,
}

impl Shutdown {
    /// Create a new shutdown coordinator.
    pub fn new() -> Self {
        let (tx, _) = broadcast::channel(1);
        Self { tx }
    }

    /// Subscribe to the shutdown signal.
    pub fn subscribe(&self) -> broadcast::Receiver<()> {
        self.tx.subscribe()
    }

    /// Trigger the shutdown signal.
    pub fn trigger(&self) {
        let _ = self.tx.send(());
    }

    /// Get the number of active subscribers (tasks still running).
    pub fn receiver_count(&self) -> usize {
        self.tx.receiver_count()
    }
}

impl Default for Shutdown {
    fn default() -> Self {
        Self::new()
    }
}

/// Work registered by handlers that must outlive the response.
///
/// Finished handles are pruned on every spawn; whatever is still running at
/// shutdown is awaited by [`BackgroundTasks::drain`].
#[derive(Debug, Default)]
pub struct BackgroundTasks {
    handles: Mutex<Vec<JoinHandle<()>>>,
}

impl BackgroundTasks {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn spawn<F>(&self, task: F)
    where
        F: Future<Output = ()> + Send + 'static,
    {
        let handle = tokio::spawn(task);
        let mut handles = self.handles.lock().expect("background task mutex poisoned");
        handles.retain(|h| !h.is_finished());
        handles.push(handle);
    }

    /// Number of tasks not yet observed as finished.
    pub fn pending(&self) -> usize {
        let handles = self.handles.lock().expect("background task mutex poisoned");
        handles.iter().filter(|h| !h.is_finished()).count()
    }

    /// Wait for every tracked task, up to `grace`. Returns the number of
    /// tasks that were still running when the deadline passed.
    pub async fn drain(&self, grace: Duration) -> usize {
        let handles = {
            let mut guard = self.handles.lock().expect("background task mutex poisoned");
            std::mem::take(&mut *guard)
        };
        let total = handles.len();
        if total == 0 {
            return 0;
        }

        tracing::info!(tasks = total, "Draining background tasks");
        let joined = futures_util::future::join_all(handles);
        match tokio::time::timeout(grace, joined).await {
            Ok(results) => {
                for result in results {
                    if let Err(e) = result {
                        tracing::warn!(error = %e, "Background task failed");
                    }
                }
                0
            }
            Err(_) => {
                tracing::warn!(
                    tasks = total,
                    grace_secs = grace.as_secs(),
                    "Background tasks still running after grace period"
                );
                total
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;

    #[tokio::test]
    async fn test_drain_waits_for_tasks() {
        let tasks = BackgroundTasks::new();
        let done = Arc::new(AtomicUsize::new(0));
        for _ in 0..3 {
            let done = done.clone();
            tasks.spawn(async move {
                tokio::time::sleep(Duration::from_millis(20)).await;
                done.fetch_add(1, Ordering::SeqCst);
            });
        }

        assert_eq!(tasks.drain(Duration::from_secs(2)).await, 0);
        assert_eq!(done.load(Ordering::SeqCst), 3);
        assert_eq!(tasks.pending(), 0);
    }

    #[tokio::test]
    async fn test_drain_gives_up_after_grace() {
        let tasks = BackgroundTasks::new();
        tasks.spawn(async {
            tokio::time::sleep(Duration::from_secs(30)).await;
        });
        assert_eq!(tasks.drain(Duration::from_millis(20)).await, 1);
    }

    #[test]
    fn test_shutdown_broadcast() {
        let shutdown = Shutdown::new();
        let mut rx = shutdown.subscribe();
        assert_eq!(shutdown.receiver_count(), 1);
        shutdown.trigger();
        assert!(rx.try_recv().is_ok());
    }
}
