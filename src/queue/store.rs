use std::sync::{RwLock, RwLockReadGuard, RwLockWriteGuard};

use crate::queue::item::QueueItem;

/// Queue contents plus the item the host is currently playing.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct QueueState {
    /// Head (index 0) is the next item to play.
    pub items: Vec<QueueItem>,
    pub currently_playing: Option<QueueItem>,
}

/// Owned, lock-guarded queue state. One instance per server (or per test),
/// shared through `Arc`.
///
/// Every mutation runs under the write lock for its whole read-modify-write;
/// readers clone under the read lock, so they never see a half-applied change.
/// Guards never escape this type, so no lock is ever held across an `.await`.
#[derive(Debug, Default)]
pub struct QueueStore {
    state: RwLock<QueueState>,
}

impl QueueStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Run `f` with exclusive access to the state.
    pub fn write<R>(&self, f: impl FnOnce(&mut QueueState) -> R) -> R {
        f(&mut self.write_guard())
    }

    /// Run `f` with shared access to the state.
    pub fn read<R>(&self, f: impl FnOnce(&QueueState) -> R) -> R {
        f(&self.read_guard())
    }

    /// Consistent copy of the current state.
    pub fn snapshot(&self) -> QueueState {
        self.read(QueueState::clone)
    }

    pub fn len(&self) -> usize {
        self.read(|s| s.items.len())
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    // Each mutation is a single Vec/Option operation, so a panic elsewhere while
    // the lock was held cannot leave the state torn; recover instead of panicking.
    fn write_guard(&self) -> RwLockWriteGuard<'_, QueueState> {
        self.state.write().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    fn read_guard(&self) -> RwLockReadGuard<'_, QueueState> {
        self.state.read().unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}
