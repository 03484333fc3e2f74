pub mod controller;
pub mod item;
pub mod store;

pub use controller::{HostAction, QueueController, QueueError};
pub use item::{ItemKind, QueueItem, PLACEHOLDER_TITLE};
pub use store::{QueueState, QueueStore};
