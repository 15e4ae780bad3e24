//! Cooperative shutdown signal for the event router task.
//!
//! Clones share the same underlying state: cancelling any clone wakes
//! every waiter. Cancellation is one-way and idempotent.

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use tokio::sync::Notify;

#[derive(Debug, Default, Clone)]
pub struct ShutdownSignal {
    shared: Arc<Shared>,
}

#[derive(Debug, Default)]
struct Shared {
    stopping: AtomicBool,
    notify: Notify,
}

impl ShutdownSignal {
    pub fn new() -> Self {
        Self::default()
    }

    /// Signal shutdown to all waiters. Safe to call more than once.
    pub fn cancel(&self) {
        self.shared.stopping.store(true, Ordering::Release);
        self.shared.notify.notify_waiters();
    }

    pub fn cancelled(&self) -> bool {
        self.shared.stopping.load(Ordering::Acquire)
    }

    /// Wait until shutdown is signaled. Returns immediately if it
    /// already was.
    pub async fn wait(&self) {
        while !self.cancelled() {
            self.shared.notify.notified().await;
        }
    }
}
