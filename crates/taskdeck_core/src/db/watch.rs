//! Publish/subscribe channel for live task queries.
//!
//! # Responsibility
//! - Carry full filtered snapshots from the store to subscribers.
//! - Define the filter vocabulary shared by list and watch queries.
//!
//! # Invariants
//! - Every emission is a complete snapshot, never an incremental delta.
//! - A subscriber receives one initial snapshot on subscribe, then one
//!   snapshot per committed write that matches its registration.

use crate::model::task::{Priority, Task};
use std::sync::mpsc::{channel, Receiver, RecvTimeoutError, Sender, TryRecvError};
use std::time::Duration;

/// Row selection for list and watch queries.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum TaskFilter {
    /// Every stored task.
    #[default]
    All,
    /// Tasks whose `is_completed` equals the given flag.
    Status(bool),
    /// Tasks with the given priority.
    Priority(Priority),
}

/// Subscriber handle for one live query.
///
/// Dropping the watch unsubscribes; the store prunes the registration on
/// its next notification pass.
pub struct TaskWatch {
    rx: Receiver<Vec<Task>>,
}

impl TaskWatch {
    pub(crate) fn channel() -> (Sender<Vec<Task>>, Self) {
        let (tx, rx) = channel();
        (tx, Self { rx })
    }

    /// Blocks until the next snapshot. Returns `None` when the store side
    /// of the channel is gone.
    pub fn recv(&self) -> Option<Vec<Task>> {
        self.rx.recv().ok()
    }

    /// Blocks up to `timeout` for the next snapshot.
    pub fn recv_timeout(&self, timeout: Duration) -> Result<Vec<Task>, RecvTimeoutError> {
        self.rx.recv_timeout(timeout)
    }

    /// Returns a pending snapshot without blocking.
    pub fn try_recv(&self) -> Result<Vec<Task>, TryRecvError> {
        self.rx.try_recv()
    }

    /// Drains the queue and returns the most recent pending snapshot.
    ///
    /// Useful for observers that only care about the latest state, not
    /// every intermediate emission.
    pub fn latest(&self) -> Option<Vec<Task>> {
        let mut latest = None;
        while let Ok(snapshot) = self.rx.try_recv() {
            latest = Some(snapshot);
        }
        latest
    }
}
