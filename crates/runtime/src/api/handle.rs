//! Cloneable façade for issuing commands to the save manager.
//!
//! [`SaveManagerHandle`] hides channel plumbing and offers async helpers for
//! every save system request plus topic subscriptions.
use std::collections::HashMap;
use std::sync::{Arc, Weak};
use std::time::Duration;

use tokio::sync::{broadcast, mpsc, oneshot};

use super::errors::{Result, SaveError};
use super::participant::SaveableSystem;
use crate::events::{Event, EventBus, Topic};
use crate::storage::{FragmentPayload, SaveHeader, UserSettings};
use crate::types::SlotIndex;
use crate::workers::Command;

/// Client-facing handle to interact with the save manager
///
/// Save, load, and new-game requests return as soon as the worker has
/// accepted them; completion is reported on the [`Topic::Save`] and
/// [`Topic::Load`] topics.
#[derive(Clone)]
pub struct SaveManagerHandle {
    command_tx: mpsc::Sender<Command>,
    event_bus: EventBus,
}

impl SaveManagerHandle {
    pub(crate) fn new(command_tx: mpsc::Sender<Command>, event_bus: EventBus) -> Self {
        Self {
            command_tx,
            event_bus,
        }
    }

    async fn request<T>(&self, command: impl FnOnce(oneshot::Sender<T>) -> Command) -> Result<T> {
        let (reply_tx, reply_rx) = oneshot::channel();

        self.command_tx
            .send(command(reply_tx))
            .await
            .map_err(|_| SaveError::CommandChannelClosed)?;

        reply_rx.await.map_err(SaveError::ReplyChannelClosed)
    }

    /// Include a system in future saves and loads.
    ///
    /// Only a weak reference is kept. Returns `false` if the system was
    /// already registered.
    pub async fn register<S>(&self, system: &Arc<S>) -> Result<bool>
    where
        S: SaveableSystem + 'static,
    {
        let weak: Weak<dyn SaveableSystem> = Arc::downgrade(system) as Weak<dyn SaveableSystem>;
        self.request(|reply| Command::Register {
            system: weak,
            reply,
        })
        .await
    }

    /// Remove a system. Returns `false` if it was not registered.
    pub async fn unregister<S>(&self, system: &Arc<S>) -> Result<bool>
    where
        S: SaveableSystem + 'static,
    {
        let weak: Weak<dyn SaveableSystem> = Arc::downgrade(system) as Weak<dyn SaveableSystem>;
        self.request(|reply| Command::Unregister {
            system: weak,
            reply,
        })
        .await
    }

    /// Start a brand new game in `slot` named `name` and save it.
    ///
    /// Subscribers of [`Topic::Session`] are told to reset, registered systems
    /// are cleared, the playtime clock restarts at zero, and a full save
    /// creates the slot.
    pub async fn request_new_game_save(&self, slot: SlotIndex, name: impl Into<String>) -> Result<()> {
        let name = name.into();
        self.request(|reply| Command::NewGameSave { slot, name, reply })
            .await?
    }

    /// Full save of every registered system into the active slot.
    pub async fn request_save_progress(&self) -> Result<()> {
        self.request(|reply| Command::SaveProgress { reply }).await?
    }

    /// Save just one system's fragment into the active slot.
    ///
    /// The system is gathered before this returns, so a gather error comes
    /// back here. The slot header is left untouched.
    pub async fn request_save_specific_fragment<S>(&self, system: &Arc<S>) -> Result<()>
    where
        S: SaveableSystem + 'static,
    {
        let weak: Weak<dyn SaveableSystem> = Arc::downgrade(system) as Weak<dyn SaveableSystem>;
        self.request(|reply| Command::SaveFragment {
            system: weak,
            reply,
        })
        .await?
    }

    /// Load `slot` and make it the active slot.
    ///
    /// A failed load only shows up as an unsuccessful
    /// [`Event::LoadComplete`]; the previous active slot is kept.
    pub async fn request_load_from_slot(&self, slot: SlotIndex) -> Result<()> {
        self.request(|reply| Command::LoadFromSlot { slot, reply })
            .await?
    }

    /// Delete a slot's header and fragments.
    ///
    /// Resolves once storage is done. Returns `true` if the slot existed.
    pub async fn request_delete_slot(&self, slot: SlotIndex) -> Result<bool> {
        self.request(|reply| Command::DeleteSlot { slot, reply })
            .await?
    }

    /// Headers of every readable slot, sorted by slot index.
    pub async fn all_save_slot_headers(&self) -> Result<Vec<SaveHeader>> {
        self.request(|reply| Command::ListSlotHeaders { reply })
            .await
    }

    /// User-facing name stored in a slot's header, `None` if the slot has no
    /// readable header.
    pub async fn slot_name_by_index(&self, slot: SlotIndex) -> Result<Option<String>> {
        self.request(|reply| Command::SlotName { slot, reply }).await
    }

    pub async fn active_save_header(&self) -> Result<Option<SaveHeader>> {
        self.request(|reply| Command::ActiveHeader { reply }).await
    }

    pub async fn active_save_slot(&self) -> Result<Option<SlotIndex>> {
        self.request(|reply| Command::ActiveSlot { reply }).await
    }

    /// Switch (or clear, with `None`) the active slot without loading it.
    pub async fn set_active_save_slot(&self, slot: Option<SlotIndex>) -> Result<()> {
        self.request(|reply| Command::SetActiveSlot { slot, reply })
            .await?
    }

    /// Restart the playtime clock at zero.
    pub async fn start_new_play_time_session(&self) -> Result<()> {
        self.request(|reply| Command::StartNewSession { reply })
            .await
    }

    /// Continue the playtime clock from `prior`.
    pub async fn load_play_time_from_header(&self, prior: Duration) -> Result<()> {
        self.request(|reply| Command::ResumeSession { prior, reply })
            .await
    }

    pub async fn current_total_play_time(&self) -> Result<Duration> {
        self.request(|reply| Command::TotalPlayTime { reply })
            .await
    }

    /// Whether the last load put a fragment named `name` into the cache.
    pub async fn has_loaded_fragment(&self, name: impl Into<String>) -> Result<bool> {
        let name = name.into();
        self.request(|reply| Command::HasLoadedFragment { name, reply })
            .await
    }

    /// Copy of a cached fragment, for systems that register after a load.
    pub async fn loaded_fragment(&self, name: impl Into<String>) -> Result<Option<FragmentPayload>> {
        let name = name.into();
        self.request(|reply| Command::LoadedFragment { name, reply })
            .await
    }

    pub async fn user_settings(&self) -> Result<UserSettings> {
        self.request(|reply| Command::UserSettings { reply }).await
    }

    pub async fn last_selected_save_slot(&self) -> Result<SlotIndex> {
        Ok(self.user_settings().await?.last_selected_slot)
    }

    /// Remember (and persist) the slot the player last highlighted.
    pub async fn set_last_selected_save_slot(&self, slot: SlotIndex) -> Result<()> {
        self.request(|reply| Command::SetLastSelectedSlot { slot, reply })
            .await?
    }

    pub async fn should_auto_load_last_save(&self) -> Result<bool> {
        Ok(self.user_settings().await?.auto_load_last_save)
    }

    pub async fn set_should_auto_load_last_save(&self, enabled: bool) -> Result<()> {
        self.request(|reply| Command::SetAutoLoadLastSave { enabled, reply })
            .await?
    }

    /// Whether a save, load, or delete is in flight.
    pub async fn is_busy(&self) -> Result<bool> {
        self.request(|reply| Command::IsBusy { reply }).await
    }

    /// Subscribe to events from a specific topic
    ///
    /// # Topics
    ///
    /// - `Topic::Slots` - Slot list changed (full save, delete)
    /// - `Topic::Save` - Save completion reports
    /// - `Topic::Load` - Load completion reports
    /// - `Topic::Session` - Live data must be reset for a new game
    ///
    /// # Example
    ///
    /// ```rust,ignore
    /// use save_runtime::{Event, Topic};
    ///
    /// let mut load_rx = handle.subscribe(Topic::Load);
    /// handle.request_load_from_slot(0).await?;
    /// if let Ok(Event::LoadComplete(report)) = load_rx.recv().await {
    ///     println!("loaded {} fragments", report.loaded.len());
    /// }
    /// ```
    pub fn subscribe(&self, topic: Topic) -> broadcast::Receiver<Event> {
        self.event_bus.subscribe(topic)
    }

    /// Subscribe to multiple topics at once
    ///
    /// Returns a map of topic to receiver for each requested topic.
    pub fn subscribe_multiple(&self, topics: &[Topic]) -> HashMap<Topic, broadcast::Receiver<Event>> {
        self.event_bus.subscribe_multiple(topics)
    }

    /// Get a reference to the event bus for advanced usage
    pub fn event_bus(&self) -> &EventBus {
        &self.event_bus
    }

    /// Ask the worker to stop once the in-flight operation is done.
    pub(crate) async fn shutdown(&self) -> Result<()> {
        self.command_tx
            .send(Command::Shutdown)
            .await
            .map_err(|_| SaveError::CommandChannelClosed)
    }
}
