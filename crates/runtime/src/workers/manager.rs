//! Save manager worker that owns every piece of save system state.
//!
//! Receives commands from [`SaveManagerHandle`](crate::api::SaveManagerHandle),
//! drives at most one save/load/delete operation one storage step at a time,
//! and publishes [`Event`] notifications when operations finish.

use std::future::Future;
use std::sync::{Arc, Weak};
use std::time::Duration;

use tokio::sync::{mpsc, oneshot};
use tracing::{debug, error, info, warn};

use crate::api::{Result, SaveError, SaveableSystem};
use crate::cache::LoadedFragmentCache;
use crate::config::SaveSystemConfig;
use crate::events::{Event, EventBus, LoadReport};
use crate::pipeline::{
    LoadPipeline, LoadStep, SavePipeline, SaveStep, StepFuture, read_all_headers, read_header,
};
use crate::registry::FragmentRegistry;
use crate::session::SessionTracker;
use crate::storage::{
    self, BlobPath, FragmentPayload, QueuedFragment, SaveHeader, SaveStorage, StorageError,
    UserSettings,
};
use crate::types::{FragmentName, SlotIndex};

/// Commands that can be sent to the save manager worker.
pub enum Command {
    Register {
        system: Weak<dyn SaveableSystem>,
        reply: oneshot::Sender<bool>,
    },
    Unregister {
        system: Weak<dyn SaveableSystem>,
        reply: oneshot::Sender<bool>,
    },
    /// Start a brand new game in `slot` and save it right away.
    NewGameSave {
        slot: SlotIndex,
        name: String,
        reply: oneshot::Sender<Result<()>>,
    },
    /// Full save of the active slot.
    SaveProgress { reply: oneshot::Sender<Result<()>> },
    /// Save a single system's fragment into the active slot.
    SaveFragment {
        system: Weak<dyn SaveableSystem>,
        reply: oneshot::Sender<Result<()>>,
    },
    LoadFromSlot {
        slot: SlotIndex,
        reply: oneshot::Sender<Result<()>>,
    },
    /// Replies once the slot is gone (`true` if it existed).
    DeleteSlot {
        slot: SlotIndex,
        reply: oneshot::Sender<Result<bool>>,
    },
    ListSlotHeaders {
        reply: oneshot::Sender<Vec<SaveHeader>>,
    },
    SlotName {
        slot: SlotIndex,
        reply: oneshot::Sender<Option<String>>,
    },
    ActiveHeader {
        reply: oneshot::Sender<Option<SaveHeader>>,
    },
    ActiveSlot {
        reply: oneshot::Sender<Option<SlotIndex>>,
    },
    SetActiveSlot {
        slot: Option<SlotIndex>,
        reply: oneshot::Sender<Result<()>>,
    },
    StartNewSession { reply: oneshot::Sender<()> },
    ResumeSession {
        prior: Duration,
        reply: oneshot::Sender<()>,
    },
    TotalPlayTime { reply: oneshot::Sender<Duration> },
    HasLoadedFragment {
        name: FragmentName,
        reply: oneshot::Sender<bool>,
    },
    LoadedFragment {
        name: FragmentName,
        reply: oneshot::Sender<Option<FragmentPayload>>,
    },
    UserSettings {
        reply: oneshot::Sender<UserSettings>,
    },
    SetLastSelectedSlot {
        slot: SlotIndex,
        reply: oneshot::Sender<Result<()>>,
    },
    SetAutoLoadLastSave {
        enabled: bool,
        reply: oneshot::Sender<Result<()>>,
    },
    IsBusy { reply: oneshot::Sender<bool> },
    /// Finish the in-flight operation, then stop.
    Shutdown,
}

/// Operation currently holding the busy guard.
enum Operation {
    Save(SavePipeline),
    Load {
        pipeline: LoadPipeline,
        previous: ActiveState,
    },
    Delete(DeleteRequest),
}

/// What a failed load puts back.
struct ActiveState {
    slot: Option<SlotIndex>,
    header: Option<SaveHeader>,
    cache: LoadedFragmentCache,
}

struct DeleteRequest {
    slot: SlotIndex,
    reply: oneshot::Sender<Result<bool>>,
    result: Option<storage::Result<bool>>,
}

enum StepOutcome {
    Save(SaveStep),
    Load(LoadStep),
    Delete(storage::Result<bool>),
}

/// Background task that serializes every save system request.
pub struct SaveManagerWorker {
    config: SaveSystemConfig,
    storage: Arc<dyn SaveStorage>,
    registry: FragmentRegistry,
    cache: LoadedFragmentCache,
    session: SessionTracker,
    settings: UserSettings,
    operation: Option<Operation>,
    pending_step: Option<StepFuture<StepOutcome>>,
    command_rx: mpsc::Receiver<Command>,
    event_bus: EventBus,
}

impl SaveManagerWorker {
    pub fn new(
        config: SaveSystemConfig,
        storage: Arc<dyn SaveStorage>,
        settings: UserSettings,
        command_rx: mpsc::Receiver<Command>,
        event_bus: EventBus,
    ) -> Self {
        Self {
            config,
            storage,
            registry: FragmentRegistry::new(),
            cache: LoadedFragmentCache::new(),
            session: SessionTracker::new(),
            settings,
            operation: None,
            pending_step: None,
            command_rx,
            event_bus,
        }
    }

    /// Main worker loop.
    pub async fn run(mut self) {
        info!(
            target: "save_runtime::worker",
            max_slots = self.config.max_slots,
            "SaveManagerWorker started"
        );

        loop {
            tokio::select! {
                cmd = self.command_rx.recv() => match cmd {
                    Some(Command::Shutdown) => {
                        info!(target: "save_runtime::worker", "Shutdown command received");
                        break;
                    }
                    Some(cmd) => self.handle_command(cmd).await,
                    None => {
                        debug!(target: "save_runtime::worker", "All handles dropped");
                        break;
                    }
                },
                outcome = next_outcome(&mut self.pending_step) => {
                    self.pending_step = None;
                    self.complete_step(outcome);
                    self.advance();
                }
            }
        }

        // In-flight operations are never cancelled.
        while let Some(step) = self.pending_step.take() {
            let outcome = step.await;
            self.complete_step(outcome);
            self.advance();
        }

        info!(target: "save_runtime::worker", "SaveManagerWorker stopped");
    }

    async fn handle_command(&mut self, cmd: Command) {
        match cmd {
            Command::Register { system, reply } => {
                let _ = reply.send(self.registry.register(system));
            }
            Command::Unregister { system, reply } => {
                let _ = reply.send(self.registry.unregister(&system));
            }
            Command::NewGameSave { slot, name, reply } => {
                let _ = reply.send(self.new_game_save(slot, name));
            }
            Command::SaveProgress { reply } => {
                let _ = reply.send(self.save_progress());
            }
            Command::SaveFragment { system, reply } => {
                let _ = reply.send(self.save_fragment(system));
            }
            Command::LoadFromSlot { slot, reply } => {
                let _ = reply.send(self.load_from_slot(slot));
            }
            Command::DeleteSlot { slot, reply } => self.delete_slot(slot, reply),
            Command::ListSlotHeaders { reply } => {
                let storage = Arc::clone(&self.storage);
                tokio::spawn(async move {
                    let _ = reply.send(read_all_headers(storage.as_ref()).await);
                });
            }
            Command::SlotName { slot, reply } => {
                let storage = Arc::clone(&self.storage);
                tokio::spawn(async move {
                    let name = read_header(storage.as_ref(), slot)
                        .await
                        .map(|header| header.slot_name);
                    let _ = reply.send(name);
                });
            }
            Command::ActiveHeader { reply } => {
                let _ = reply.send(self.session.active_header().cloned());
            }
            Command::ActiveSlot { reply } => {
                let _ = reply.send(self.session.active_slot());
            }
            Command::SetActiveSlot { slot, reply } => {
                let _ = reply.send(self.set_active_slot(slot));
            }
            Command::StartNewSession { reply } => {
                self.session.start_new_session();
                let _ = reply.send(());
            }
            Command::ResumeSession { prior, reply } => {
                self.session.resume_session(prior);
                let _ = reply.send(());
            }
            Command::TotalPlayTime { reply } => {
                let _ = reply.send(self.session.current_total_play_time());
            }
            Command::HasLoadedFragment { name, reply } => {
                let _ = reply.send(self.cache.contains(&name));
            }
            Command::LoadedFragment { name, reply } => {
                let _ = reply.send(self.cache.get(&name).cloned());
            }
            Command::UserSettings { reply } => {
                let _ = reply.send(self.settings.clone());
            }
            Command::SetLastSelectedSlot { slot, reply } => {
                let result = if self.config.is_valid_slot(slot) {
                    self.settings.last_selected_slot = slot;
                    write_settings(Arc::clone(&self.storage), &self.settings).await
                } else {
                    Err(self.invalid_slot(slot))
                };
                let _ = reply.send(result);
            }
            Command::SetAutoLoadLastSave { enabled, reply } => {
                self.settings.auto_load_last_save = enabled;
                let result = write_settings(Arc::clone(&self.storage), &self.settings).await;
                let _ = reply.send(result);
            }
            Command::IsBusy { reply } => {
                let _ = reply.send(self.operation.is_some());
            }
            // Intercepted by the run loop.
            Command::Shutdown => {}
        }
    }

    fn new_game_save(&mut self, slot: SlotIndex, name: String) -> Result<()> {
        self.check_slot(slot)?;
        self.check_idle()?;

        info!(
            target: "save_runtime::worker",
            slot,
            name = %name,
            "Starting new game"
        );

        self.event_bus.publish(Event::ClearActiveSaveData);
        let systems = self.registry.live();
        for system in &systems {
            system.clear_save_data();
        }

        self.cache.clear();
        self.session.set_active_slot(Some(slot));
        self.session.set_active_header(None);
        self.session.start_new_session();

        let mut report = LoadReport::new(slot);
        report.success = true;
        self.event_bus.publish(Event::LoadComplete(report));

        self.begin(Operation::Save(
            SavePipeline::full(slot, name, &systems).replacing_slot(),
        ));
        Ok(())
    }

    fn save_progress(&mut self) -> Result<()> {
        let slot = self.session.active_slot().ok_or(SaveError::NoActiveSlot)?;
        self.check_idle()?;

        let name = self
            .session
            .active_slot_name()
            .unwrap_or_else(|| SaveHeader::default_slot_name(slot));
        let systems = self.registry.live();

        debug!(
            target: "save_runtime::worker",
            slot,
            systems = systems.len(),
            "Saving progress"
        );
        self.begin(Operation::Save(SavePipeline::full(slot, name, &systems)));
        Ok(())
    }

    fn save_fragment(&mut self, system: Weak<dyn SaveableSystem>) -> Result<()> {
        let slot = self.session.active_slot().ok_or(SaveError::NoActiveSlot)?;
        if !self.session.has_active_session() {
            return Err(SaveError::NoActiveSession);
        }
        self.check_idle()?;

        let system = system.upgrade().ok_or(SaveError::ParticipantDropped)?;
        let name = system.fragment_name();
        let payload = match system.gather_save_data() {
            Ok(Some(payload)) => payload,
            Ok(None) => {
                debug!(
                    target: "save_runtime::worker",
                    fragment = %name,
                    "Nothing to persist, skipping fragment save"
                );
                return Ok(());
            }
            Err(source) => {
                return Err(SaveError::Gather {
                    fragment: name,
                    source,
                });
            }
        };

        self.begin(Operation::Save(SavePipeline::single(
            slot,
            QueuedFragment::new(name, payload),
        )));
        Ok(())
    }

    fn load_from_slot(&mut self, slot: SlotIndex) -> Result<()> {
        self.check_slot(slot)?;
        self.check_idle()?;

        info!(target: "save_runtime::worker", slot, "Loading slot");

        // Lookups during the load must not serve another slot's fragments.
        let previous = ActiveState {
            slot: self.session.active_slot(),
            header: self.session.active_header().cloned(),
            cache: std::mem::take(&mut self.cache),
        };
        self.session.set_active_slot(Some(slot));

        self.begin(Operation::Load {
            pipeline: LoadPipeline::new(slot),
            previous,
        });
        Ok(())
    }

    fn delete_slot(&mut self, slot: SlotIndex, reply: oneshot::Sender<Result<bool>>) {
        if let Err(e) = self.check_slot(slot).and_then(|_| self.check_idle()) {
            let _ = reply.send(Err(e));
            return;
        }

        info!(target: "save_runtime::worker", slot, "Deleting slot");
        self.begin(Operation::Delete(DeleteRequest {
            slot,
            reply,
            result: None,
        }));
    }

    fn set_active_slot(&mut self, slot: Option<SlotIndex>) -> Result<()> {
        if let Some(slot) = slot {
            self.check_slot(slot)?;
        }
        self.check_idle()?;
        self.session.set_active_slot(slot);
        Ok(())
    }

    fn check_slot(&self, slot: SlotIndex) -> Result<()> {
        if self.config.is_valid_slot(slot) {
            Ok(())
        } else {
            Err(self.invalid_slot(slot))
        }
    }

    fn invalid_slot(&self, slot: SlotIndex) -> SaveError {
        SaveError::InvalidSlot {
            slot,
            max_slots: self.config.max_slots,
        }
    }

    fn check_idle(&self) -> Result<()> {
        if self.operation.is_some() {
            debug!(target: "save_runtime::worker", "Request rejected, operation pending");
            return Err(SaveError::Busy);
        }
        Ok(())
    }

    fn begin(&mut self, operation: Operation) {
        self.operation = Some(operation);
        self.advance();
    }

    /// Issue the next storage step of the current operation, or finish it.
    fn advance(&mut self) {
        let storage = &self.storage;
        let next: Option<StepFuture<StepOutcome>> = match self.operation.as_mut() {
            None => return,
            Some(Operation::Save(pipeline)) => pipeline
                .next_step(storage, &self.session)
                .map(|step| -> StepFuture<StepOutcome> {
                    Box::pin(async move { StepOutcome::Save(step.await) })
                }),
            Some(Operation::Load { pipeline, .. }) => {
                pipeline
                    .next_step(storage)
                    .map(|step| -> StepFuture<StepOutcome> {
                        Box::pin(async move { StepOutcome::Load(step.await) })
                    })
            }
            Some(Operation::Delete(request)) => match request.result {
                Some(_) => None,
                None => {
                    let storage = Arc::clone(storage);
                    let slot = request.slot;
                    Some(Box::pin(async move {
                        StepOutcome::Delete(storage.delete_slot(slot).await)
                    }))
                }
            },
        };

        match next {
            Some(step) => self.pending_step = Some(step),
            None => self.finish_operation(),
        }
    }

    fn complete_step(&mut self, outcome: StepOutcome) {
        match (self.operation.as_mut(), outcome) {
            (Some(Operation::Save(pipeline)), StepOutcome::Save(step)) => {
                pipeline.complete_step(step)
            }
            (Some(Operation::Load { pipeline, .. }), StepOutcome::Load(step)) => {
                pipeline.complete_step(step)
            }
            (Some(Operation::Delete(request)), StepOutcome::Delete(result)) => {
                request.result = Some(result)
            }
            _ => error!(
                target: "save_runtime::worker",
                "Storage step completed for an operation that is no longer running"
            ),
        }
    }

    fn finish_operation(&mut self) {
        match self.operation.take() {
            None => {}
            Some(Operation::Save(pipeline)) => self.finish_save(pipeline),
            Some(Operation::Load { pipeline, previous }) => self.finish_load(pipeline, previous),
            Some(Operation::Delete(request)) => self.finish_delete(request),
        }
    }

    fn finish_save(&mut self, pipeline: SavePipeline) {
        let (report, header) = pipeline.finish();

        if let Some(header) = header
            && self.session.active_slot() == Some(header.slot_index)
        {
            self.session.set_active_header(Some(header));
        }

        if report.success() {
            info!(
                target: "save_runtime::worker",
                slot = report.slot,
                kind = ?report.kind,
                fragments = report.written.len(),
                "Save complete"
            );
        } else {
            warn!(
                target: "save_runtime::worker",
                slot = report.slot,
                kind = ?report.kind,
                failed = ?report.failed_fragments(),
                header_written = report.header_written,
                "Save finished with failures"
            );
        }

        if report.header_written {
            self.event_bus.publish(Event::SlotListChanged);
        }
        self.event_bus.publish(Event::SaveComplete(report));
    }

    fn finish_load(&mut self, pipeline: LoadPipeline, previous: ActiveState) {
        let outcome = pipeline.finish(&self.registry.live());
        let report = outcome.report;

        match outcome.header {
            Some(header) if report.success => {
                info!(
                    target: "save_runtime::worker",
                    slot = report.slot,
                    loaded = report.loaded.len(),
                    delivered = report.delivered.len(),
                    skipped = report.skipped().len(),
                    "Load complete"
                );
                self.cache = outcome.cache;
                self.session.resume_session(header.play_time);
                self.session.set_active_header(Some(header));
            }
            _ => {
                warn!(
                    target: "save_runtime::worker",
                    slot = report.slot,
                    restored_slot = ?previous.slot,
                    "Load failed"
                );
                self.session.set_active_slot(previous.slot);
                self.session.set_active_header(previous.header);
                self.cache = previous.cache;
            }
        }

        self.event_bus.publish(Event::LoadComplete(report));
    }

    fn finish_delete(&mut self, request: DeleteRequest) {
        let DeleteRequest {
            slot,
            reply,
            result,
        } = request;

        let result = match result {
            Some(Ok(existed)) => {
                if self.session.active_slot() == Some(slot) {
                    self.session.clear_active_slot();
                    self.cache.clear();
                }
                info!(target: "save_runtime::worker", slot, existed, "Slot deleted");
                self.event_bus.publish(Event::SlotListChanged);
                Ok(existed)
            }
            Some(Err(e)) => {
                error!(
                    target: "save_runtime::worker",
                    slot,
                    error = %e,
                    "Failed to delete slot"
                );
                Err(SaveError::Storage(e))
            }
            None => Ok(false),
        };

        let _ = reply.send(result);
    }
}

/// Persist user settings. The returned future owns everything it touches.
fn write_settings(
    storage: Arc<dyn SaveStorage>,
    settings: &UserSettings,
) -> impl Future<Output = Result<()>> + Send + 'static {
    let bytes = settings.to_json().map_err(|e| StorageError::Io(e.into()));
    async move {
        storage.write_blob(&BlobPath::UserSettings, &bytes?).await?;
        Ok(())
    }
}

/// Resolves with the in-flight step's outcome; pends forever when idle.
async fn next_outcome(step: &mut Option<StepFuture<StepOutcome>>) -> StepOutcome {
    match step {
        Some(step) => step.await,
        None => std::future::pending().await,
    }
}
