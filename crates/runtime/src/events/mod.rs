//! Topic-based event bus for save manager notifications.
//!
//! Events are published to specific topics, and consumers subscribe only to
//! the topics they need (UI slot lists, loading screens, gameplay resets).

mod bus;
mod types;

pub use bus::{Event, EventBus, Topic};
pub use types::{LoadReport, SaveKind, SaveReport};
