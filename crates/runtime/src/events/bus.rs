//! Topic-based event bus implementation.

use std::collections::HashMap;

use tokio::sync::broadcast;

use super::types::{LoadReport, SaveReport};

/// Topics for event routing
#[derive(Debug, Clone, Copy, Hash, Eq, PartialEq)]
pub enum Topic {
    /// The set of slots or their headers changed
    Slots,
    /// Save operations finished
    Save,
    /// Load operations finished
    Load,
    /// Live session data must be reset
    Session,
}

/// Notifications published by the save manager.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Event {
    /// Raised after a full save or a delete.
    SlotListChanged,

    /// Raised once per save operation.
    SaveComplete(SaveReport),

    /// Raised once per load operation (and for the new-game path).
    LoadComplete(LoadReport),

    /// Raised when a new game starts, before its first save.
    ///
    /// Delivery is asynchronous: the first save gathers in the same worker
    /// step that publishes this, so a subscriber cannot reset in time for it.
    /// State that must be cleared before that save belongs in
    /// [`SaveableSystem::clear_save_data`](crate::SaveableSystem::clear_save_data),
    /// which the manager calls synchronously first.
    ClearActiveSaveData,
}

impl Event {
    pub fn topic(&self) -> Topic {
        match self {
            Event::SlotListChanged => Topic::Slots,
            Event::SaveComplete(_) => Topic::Save,
            Event::LoadComplete(_) => Topic::Load,
            Event::ClearActiveSaveData => Topic::Session,
        }
    }
}

/// Topic-based event bus
///
/// Allows consumers to subscribe to specific topics and only receive
/// events they care about. Cloning the bus shares the underlying channels.
#[derive(Clone)]
pub struct EventBus {
    slots: broadcast::Sender<Event>,
    save: broadcast::Sender<Event>,
    load: broadcast::Sender<Event>,
    session: broadcast::Sender<Event>,
}

impl EventBus {
    /// Creates a new event bus with default capacity for each topic
    pub fn new() -> Self {
        Self::with_capacity(64)
    }

    /// Creates a new event bus with specified capacity per topic
    pub fn with_capacity(capacity: usize) -> Self {
        let capacity = capacity.max(1);
        Self {
            slots: broadcast::channel(capacity).0,
            save: broadcast::channel(capacity).0,
            load: broadcast::channel(capacity).0,
            session: broadcast::channel(capacity).0,
        }
    }

    fn sender(&self, topic: Topic) -> &broadcast::Sender<Event> {
        match topic {
            Topic::Slots => &self.slots,
            Topic::Save => &self.save,
            Topic::Load => &self.load,
            Topic::Session => &self.session,
        }
    }

    /// Publish an event to its corresponding topic
    pub fn publish(&self, event: Event) {
        let topic = event.topic();

        if self.sender(topic).send(event).is_err() {
            // No subscribers for this topic - this is normal, not an error
            tracing::trace!("No subscribers for topic {:?}", topic);
        }
    }

    /// Subscribe to a specific topic
    ///
    /// Returns a receiver that will only receive events for that topic.
    pub fn subscribe(&self, topic: Topic) -> broadcast::Receiver<Event> {
        self.sender(topic).subscribe()
    }

    /// Subscribe to multiple topics
    ///
    /// Returns receivers for each requested topic.
    pub fn subscribe_multiple(
        &self,
        topics: &[Topic],
    ) -> HashMap<Topic, broadcast::Receiver<Event>> {
        topics
            .iter()
            .map(|&topic| (topic, self.subscribe(topic)))
            .collect()
    }
}

impl Default for EventBus {
    fn default() -> Self {
        Self::new()
    }
}
