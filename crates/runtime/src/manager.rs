//! High-level save system orchestrator.
//!
//! The save system owns the manager worker, wires up command/event channels,
//! and exposes a builder-based API for clients.

use std::sync::Arc;

use tokio::sync::{broadcast, mpsc};
use tokio::task::JoinHandle;
use tracing::{info, warn};

use crate::api::{Result, SaveError, SaveManagerHandle};
use crate::config::SaveSystemConfig;
use crate::events::{Event, EventBus, Topic};
use crate::storage::{BlobPath, FileStorage, SaveStorage, UserSettings};
use crate::types::SlotIndex;
use crate::workers::{Command, SaveManagerWorker};

/// Running save system
///
/// [`SaveManagerHandle`] provides a cloneable façade for clients; the system
/// itself only keeps the worker alive and shuts it down.
pub struct SaveSystem {
    handle: SaveManagerHandle,
    worker_handle: JoinHandle<()>,
}

impl SaveSystem {
    /// Create a new save system builder
    pub fn builder() -> SaveSystemBuilder {
        SaveSystemBuilder::new()
    }

    /// Get a cloneable handle to the save manager
    pub fn handle(&self) -> SaveManagerHandle {
        self.handle.clone()
    }

    /// Subscribe to events from a specific topic
    pub fn subscribe(&self, topic: Topic) -> broadcast::Receiver<Event> {
        self.handle.subscribe(topic)
    }

    /// Shutdown the save system gracefully
    ///
    /// An operation that is still running is allowed to finish (and publish
    /// its completion event) before the worker stops.
    pub async fn shutdown(self) -> Result<()> {
        if let Err(e) = self.handle.shutdown().await {
            warn!(
                target: "save_runtime::manager",
                error = %e,
                "Worker already stopped"
            );
        }
        drop(self.handle);

        self.worker_handle.await.map_err(SaveError::WorkerJoin)?;

        info!(target: "save_runtime::manager", "Save system shut down");
        Ok(())
    }
}

/// Builder for [`SaveSystem`] with flexible configuration.
pub struct SaveSystemBuilder {
    config: SaveSystemConfig,
    storage: Option<Arc<dyn SaveStorage>>,
}

impl SaveSystemBuilder {
    fn new() -> Self {
        Self {
            config: SaveSystemConfig::default(),
            storage: None,
        }
    }

    /// Override save system configuration
    pub fn config(mut self, config: SaveSystemConfig) -> Self {
        self.config = config;
        self
    }

    /// Use a custom storage provider instead of [`FileStorage`] in
    /// `config.save_dir`.
    pub fn storage(mut self, storage: Arc<dyn SaveStorage>) -> Self {
        self.storage = Some(storage);
        self
    }

    pub fn max_slots(mut self, max_slots: SlotIndex) -> Self {
        self.config.max_slots = max_slots.max(1);
        self
    }

    pub fn auto_load_on_start(mut self, enable: bool) -> Self {
        self.config.auto_load_on_start = enable;
        self
    }

    /// Build the save system
    ///
    /// Reads user settings from storage and, when both the config and the
    /// settings allow it, starts loading the last selected slot before
    /// returning.
    pub async fn build(self) -> Result<SaveSystem> {
        let storage: Arc<dyn SaveStorage> = match self.storage {
            Some(storage) => storage,
            None => Arc::new(FileStorage::new(&self.config.save_dir)?),
        };

        let settings = load_user_settings(storage.as_ref()).await;

        let (command_tx, command_rx) = mpsc::channel::<Command>(self.config.command_buffer_size);
        let event_bus = EventBus::with_capacity(self.config.event_buffer_size);

        let handle = SaveManagerHandle::new(command_tx, event_bus.clone());

        let auto_load = self.config.auto_load_on_start && settings.auto_load_last_save;
        let last_slot = settings.last_selected_slot;
        let valid_last_slot = self.config.is_valid_slot(last_slot);

        let worker = SaveManagerWorker::new(
            self.config,
            Arc::clone(&storage),
            settings,
            command_rx,
            event_bus,
        );

        let worker_handle = tokio::spawn(async move {
            worker.run().await;
        });

        if auto_load && valid_last_slot {
            match storage.has_header(last_slot).await {
                Ok(true) => {
                    info!(
                        target: "save_runtime::manager",
                        slot = last_slot,
                        "Auto-loading last selected slot"
                    );
                    handle.request_load_from_slot(last_slot).await?;
                }
                Ok(false) => {}
                Err(e) => warn!(
                    target: "save_runtime::manager",
                    slot = last_slot,
                    error = %e,
                    "Could not check last selected slot, skipping auto-load"
                ),
            }
        }

        Ok(SaveSystem {
            handle,
            worker_handle,
        })
    }
}

/// Stored user settings, or defaults when missing or unreadable.
async fn load_user_settings(storage: &dyn SaveStorage) -> UserSettings {
    match storage.read_blob(&BlobPath::UserSettings).await {
        Ok(Some(bytes)) => UserSettings::from_json(&bytes).unwrap_or_else(|e| {
            warn!(
                target: "save_runtime::manager",
                error = %e,
                "Corrupted user settings, using defaults"
            );
            UserSettings::default()
        }),
        Ok(None) => UserSettings::default(),
        Err(e) => {
            warn!(
                target: "save_runtime::manager",
                error = %e,
                "Failed to read user settings, using defaults"
            );
            UserSettings::default()
        }
    }
}
