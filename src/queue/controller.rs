use std::fmt;
use std::net::IpAddr;
use std::sync::Arc;

use crate::identity::{is_host, HostAddress};
use crate::queue::item::QueueItem;
use crate::queue::store::{QueueState, QueueStore};

/// Operations reserved for the host.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum HostAction {
    Advance,
    Delete,
}

impl fmt::Display for HostAction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            HostAction::Advance => f.write_str("advance playback"),
            HostAction::Delete => f.write_str("delete items"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum QueueError {
    #[error("only the host may {0}")]
    NotHost(HostAction),
    #[error("index 0 is the next item to play and only leaves the queue by advancing")]
    ReservedIndex,
    #[error("index {index} is out of range for a queue of {len} items")]
    IndexOutOfRange { index: i64, len: usize },
}

/// The only way to change the queue. Checks authority for privileged operations
/// and enforces the ordering rules; all locking is delegated to [`QueueStore`].
#[derive(Debug, Clone)]
pub struct QueueController {
    store: Arc<QueueStore>,
    host: HostAddress,
}

impl QueueController {
    pub fn new(store: Arc<QueueStore>, host: HostAddress) -> Self {
        Self { store, host }
    }

    pub fn store(&self) -> &Arc<QueueStore> {
        &self.store
    }

    pub fn is_host(&self, caller: IpAddr) -> bool {
        is_host(caller, &self.host)
    }

    /// Append to the tail. Open to everyone; never touches `currently_playing`.
    pub fn enqueue(&self, item: QueueItem) -> QueueItem {
        let position = self.store.write(|state| {
            state.items.push(item.clone());
            state.items.len() - 1
        });
        tracing::info!("Queued \"{}\" at position {}", item.title, position);
        item
    }

    /// Move the head of the queue into the playing slot.
    ///
    /// `Ok(None)` means the queue was empty; the playing slot is cleared in that case.
    pub fn advance(&self, caller: IpAddr) -> Result<Option<QueueItem>, QueueError> {
        self.require_host(caller, HostAction::Advance)?;

        let next = self.store.write(|state| {
            let next = if state.items.is_empty() {
                None
            } else {
                Some(state.items.remove(0))
            };
            state.currently_playing = next.clone();
            next
        });

        match &next {
            Some(item) => tracing::info!("Playing \"{}\"", item.title),
            None => tracing::info!("Queue is empty"),
        }
        Ok(next)
    }

    /// Remove the item at `index`. Index 0 is reserved for [`advance`](Self::advance).
    ///
    /// Bounds are checked against the queue as it is when the lock is taken, not as
    /// the caller last saw it.
    pub fn delete(&self, caller: IpAddr, index: i64) -> Result<QueueItem, QueueError> {
        self.require_host(caller, HostAction::Delete)?;

        let removed = self.store.write(|state| {
            let len = state.items.len();
            match usize::try_from(index) {
                Ok(0) => Err(QueueError::ReservedIndex),
                Ok(i) if i < len => Ok(state.items.remove(i)),
                _ => Err(QueueError::IndexOutOfRange { index, len }),
            }
        })?;

        tracing::info!("Host removed \"{}\" from position {}", removed.title, index);
        Ok(removed)
    }

    pub fn snapshot(&self) -> QueueState {
        self.store.snapshot()
    }

    fn require_host(&self, caller: IpAddr, action: HostAction) -> Result<(), QueueError> {
        if self.is_host(caller) {
            Ok(())
        } else {
            tracing::warn!("Rejected {} from guest {}", action, caller);
            Err(QueueError::NotHost(action))
        }
    }
}
