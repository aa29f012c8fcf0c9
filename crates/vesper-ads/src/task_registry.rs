//! Shared task registry for policy background work.
//!
//! Lifecycle drivers, fire-and-forget interactions, reward flows and the
//! banner suppression watcher are all spawned here so `shutdown` can stop
//! every one of them.

use std::future::Future;

use parking_lot::Mutex;
use tokio::sync::watch;
use tokio::task::JoinHandle;

/// Owner of the policy's background tasks.
#[derive(Debug)]
pub struct TaskRegistry {
    shutdown_tx: watch::Sender<bool>,
    handles: Mutex<Vec<JoinHandle<()>>>,
}

impl TaskRegistry {
    /// Empty registry.
    pub fn new() -> Self {
        let (shutdown_tx, _shutdown_rx) = watch::channel(false);
        Self {
            shutdown_tx,
            handles: Mutex::new(Vec::new()),
        }
    }

    /// Spawn a task that is aborted on shutdown. No-op after shutdown.
    pub fn spawn<F>(&self, fut: F)
    where
        F: Future<Output = ()> + Send + 'static,
    {
        if self.is_shut_down() {
            return;
        }
        let mut shutdown_rx = self.shutdown_tx.subscribe();
        let handle = tokio::spawn(async move {
            tokio::select! {
                _ = shutdown_rx.changed() => {}
                _ = fut => {}
            }
        });
        let mut handles = self.handles.lock();
        handles.retain(|h| !h.is_finished());
        handles.push(handle);
    }

    /// Whether `shutdown` has been called.
    pub fn is_shut_down(&self) -> bool {
        *self.shutdown_tx.borrow()
    }

    /// Number of tasks that have not finished yet.
    pub fn active_tasks(&self) -> usize {
        self.handles.lock().iter().filter(|h| !h.is_finished()).count()
    }

    /// Abort every task and refuse new ones.
    pub fn shutdown(&self) {
        self.shutdown_tx.send_replace(true);
        for handle in self.handles.lock().drain(..) {
            handle.abort();
        }
    }
}

impl Default for TaskRegistry {
    fn default() -> Self {
        Self::new()
    }
}

impl Drop for TaskRegistry {
    fn drop(&mut self) {
        self.shutdown();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicBool, Ordering};
    use std::sync::Arc;

    #[tokio::test]
    async fn shutdown_aborts_pending_tasks() {
        let registry = TaskRegistry::new();
        let finished = Arc::new(AtomicBool::new(false));
        let flag = finished.clone();
        registry.spawn(async move {
            futures::future::pending::<()>().await;
            flag.store(true, Ordering::SeqCst);
        });
        assert_eq!(registry.active_tasks(), 1);

        registry.shutdown();
        tokio::task::yield_now().await;
        assert!(!finished.load(Ordering::SeqCst));
        assert_eq!(registry.active_tasks(), 0);
    }

    #[tokio::test]
    async fn spawn_after_shutdown_is_ignored() {
        let registry = TaskRegistry::new();
        registry.shutdown();
        registry.spawn(async {});
        assert_eq!(registry.active_tasks(), 0);
    }
}
