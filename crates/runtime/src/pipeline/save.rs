//! Sequential fragment save pipeline.

use std::collections::VecDeque;
use std::sync::Arc;

use tracing::{debug, error, warn};

use super::StepFuture;
use crate::api::{PipelineIssue, SaveableSystem};
use crate::events::{SaveKind, SaveReport};
use crate::session::SessionTracker;
use crate::storage::{self, BlobPath, QueuedFragment, SaveHeader, SaveStorage, StorageError};
use crate::types::{FragmentName, SlotIndex};

/// Where a save pipeline currently is.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SaveStage {
    /// Removing whatever an earlier game left in the slot
    ClearingSlot,
    /// Writing the i-th queued fragment
    SavingFragment(usize),
    /// All fragments processed, writing the slot header
    WritingHeader,
    Done,
}

/// Outcome of one storage call issued by a [`SavePipeline`].
pub enum SaveStep {
    Cleared(storage::Result<bool>),
    Fragment {
        name: FragmentName,
        result: storage::Result<()>,
    },
    Header {
        header: SaveHeader,
        result: storage::Result<()>,
    },
}

/// Writes a queue of gathered fragments, then (for full saves) the header.
///
/// A failed write is recorded and the pipeline moves on to the next fragment;
/// fragments that were written stay on disk either way.
pub struct SavePipeline {
    slot: SlotIndex,
    queue: VecDeque<QueuedFragment>,
    /// Header name to write once the queue is drained; `None` for
    /// single-fragment saves.
    header_name: Option<String>,
    clear_first: bool,
    stage: SaveStage,
    issued: usize,
    report: SaveReport,
    written_header: Option<SaveHeader>,
}

impl SavePipeline {
    /// Build the queue for a full save by gathering from every live system.
    pub fn full(slot: SlotIndex, slot_name: String, systems: &[Arc<dyn SaveableSystem>]) -> Self {
        let mut report = SaveReport::new(slot, SaveKind::Full);
        let mut queue = VecDeque::with_capacity(systems.len());

        for system in systems {
            let name = system.fragment_name();
            match system.gather_save_data() {
                Ok(Some(payload)) => queue.push_back(QueuedFragment::new(name, payload)),
                Ok(None) => {
                    debug!(
                        target: "save_runtime::save",
                        fragment = %name,
                        "Nothing to persist this pass"
                    );
                }
                Err(e) => {
                    warn!(
                        target: "save_runtime::save",
                        fragment = %name,
                        error = %e,
                        "Gather failed, fragment skipped"
                    );
                    report.issues.push(PipelineIssue::GatherFailed {
                        fragment: name,
                        reason: e.to_string(),
                    });
                }
            }
        }

        Self {
            slot,
            queue,
            header_name: Some(slot_name),
            clear_first: false,
            stage: SaveStage::SavingFragment(0),
            issued: 0,
            report,
            written_header: None,
        }
    }

    /// Fast path: write one already-gathered fragment and leave the header alone.
    pub fn single(slot: SlotIndex, fragment: QueuedFragment) -> Self {
        Self {
            slot,
            queue: VecDeque::from([fragment]),
            header_name: None,
            clear_first: false,
            stage: SaveStage::SavingFragment(0),
            issued: 0,
            report: SaveReport::new(slot, SaveKind::Fragment),
            written_header: None,
        }
    }

    /// Delete the slot's existing header and fragments before writing, so
    /// fragments from a previous game cannot outlive it.
    pub fn replacing_slot(mut self) -> Self {
        self.clear_first = true;
        self.stage = SaveStage::ClearingSlot;
        self
    }

    pub fn slot(&self) -> SlotIndex {
        self.slot
    }

    pub fn stage(&self) -> SaveStage {
        self.stage
    }

    /// Fragments still waiting to be written.
    pub fn remaining(&self) -> usize {
        self.queue.len()
    }

    /// Issue the next storage call, or `None` once everything has been written.
    ///
    /// The header is built here, after the last fragment, so it carries the
    /// playtime at the moment it is written.
    pub fn next_step(
        &mut self,
        storage: &Arc<dyn SaveStorage>,
        session: &SessionTracker,
    ) -> Option<StepFuture<SaveStep>> {
        if self.clear_first {
            self.clear_first = false;
            self.stage = SaveStage::ClearingSlot;

            let storage = Arc::clone(storage);
            let slot = self.slot;
            return Some(Box::pin(async move {
                SaveStep::Cleared(storage.delete_slot(slot).await)
            }));
        }

        if let Some(fragment) = self.queue.pop_front() {
            self.stage = SaveStage::SavingFragment(self.issued);
            self.issued += 1;

            let storage = Arc::clone(storage);
            let path = BlobPath::fragment(self.slot, fragment.name.clone());
            return Some(Box::pin(async move {
                let result = storage.write_blob(&path, fragment.payload.as_bytes()).await;
                SaveStep::Fragment {
                    name: fragment.name,
                    result,
                }
            }));
        }

        if let Some(slot_name) = self.header_name.take() {
            self.stage = SaveStage::WritingHeader;

            let header = session.build_header(self.slot, &slot_name);
            let storage = Arc::clone(storage);
            let path = BlobPath::header(self.slot);
            return Some(Box::pin(async move {
                let result = match header.to_json() {
                    Ok(bytes) => storage.write_blob(&path, &bytes).await,
                    Err(e) => Err(StorageError::Io(e.into())),
                };
                SaveStep::Header { header, result }
            }));
        }

        self.stage = SaveStage::Done;
        None
    }

    /// Record the outcome of the step returned by the last `next_step` call.
    pub fn complete_step(&mut self, step: SaveStep) {
        match step {
            SaveStep::Cleared(Ok(existed)) => {
                debug!(
                    target: "save_runtime::save",
                    slot = self.slot,
                    existed,
                    "Slot cleared"
                );
            }
            SaveStep::Cleared(Err(e)) => {
                warn!(
                    target: "save_runtime::save",
                    slot = self.slot,
                    error = %e,
                    "Could not clear slot, writing over it"
                );
                self.report.issues.push(PipelineIssue::SlotClearFailed {
                    reason: e.to_string(),
                });
            }
            SaveStep::Fragment {
                name,
                result: Ok(()),
            } => {
                debug!(
                    target: "save_runtime::save",
                    slot = self.slot,
                    fragment = %name,
                    "Fragment written"
                );
                self.report.written.push(name);
            }
            SaveStep::Fragment {
                name,
                result: Err(e),
            } => {
                warn!(
                    target: "save_runtime::save",
                    slot = self.slot,
                    fragment = %name,
                    error = %e,
                    "Fragment write failed, continuing with next fragment"
                );
                self.report.issues.push(PipelineIssue::FragmentWriteFailed {
                    fragment: name,
                    reason: e.to_string(),
                });
            }
            SaveStep::Header {
                header,
                result: Ok(()),
            } => {
                debug!(
                    target: "save_runtime::save",
                    slot = self.slot,
                    play_time_secs = header.play_time.as_secs(),
                    "Header written"
                );
                self.report.header_written = true;
                self.written_header = Some(header);
            }
            SaveStep::Header { result: Err(e), .. } => {
                error!(
                    target: "save_runtime::save",
                    slot = self.slot,
                    error = %e,
                    "Header write failed"
                );
                self.report.issues.push(PipelineIssue::HeaderWriteFailed {
                    reason: e.to_string(),
                });
            }
        }
    }

    /// Consume the pipeline, returning its report and the header it wrote.
    pub fn finish(self) -> (SaveReport, Option<SaveHeader>) {
        (self.report, self.written_header)
    }
}
