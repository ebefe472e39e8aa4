//! Sequential fragment load pipeline with a staging cache.

use std::collections::VecDeque;
use std::sync::Arc;

use tracing::{debug, warn};

use super::StepFuture;
use crate::api::{PipelineIssue, SaveableSystem};
use crate::cache::LoadedFragmentCache;
use crate::events::LoadReport;
use crate::storage::{self, BlobPath, FragmentPayload, SaveHeader, SaveStorage};
use crate::types::{FragmentName, SlotIndex};

/// Where a load pipeline currently is.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LoadStage {
    ReadingHeader,
    Enumerating,
    /// Reading the i-th listed fragment
    LoadingFragment(usize),
    /// Storage work finished; ready to hand payloads to systems
    Delivering,
}

/// Outcome of one storage call issued by a [`LoadPipeline`].
pub enum LoadStep {
    Header(storage::Result<Option<Vec<u8>>>),
    Listing(storage::Result<Vec<FragmentName>>),
    Fragment {
        name: FragmentName,
        result: storage::Result<Option<Vec<u8>>>,
    },
}

/// Everything a finished load hands back to the manager.
pub struct LoadOutcome {
    pub report: LoadReport,
    /// Replaces the manager's loaded-fragment cache
    pub cache: LoadedFragmentCache,
    /// Header of the loaded slot, `None` if the load failed
    pub header: Option<SaveHeader>,
}

/// Reads a slot's header and fragments one at a time into a fresh cache.
///
/// A missing header or a failed listing ends the storage phase early and the
/// load reports failure. A fragment that cannot be read is recorded and left
/// out of the cache; the load still succeeds.
pub struct LoadPipeline {
    slot: SlotIndex,
    stage: LoadStage,
    pending: VecDeque<FragmentName>,
    issued: usize,
    header: Option<SaveHeader>,
    cache: LoadedFragmentCache,
    report: LoadReport,
}

impl LoadPipeline {
    pub fn new(slot: SlotIndex) -> Self {
        Self {
            slot,
            stage: LoadStage::ReadingHeader,
            pending: VecDeque::new(),
            issued: 0,
            header: None,
            cache: LoadedFragmentCache::new(),
            report: LoadReport::new(slot),
        }
    }

    pub fn slot(&self) -> SlotIndex {
        self.slot
    }

    pub fn stage(&self) -> LoadStage {
        self.stage
    }

    /// Issue the next storage call, or `None` once the pipeline is ready to
    /// deliver.
    pub fn next_step(&mut self, storage: &Arc<dyn SaveStorage>) -> Option<StepFuture<LoadStep>> {
        let storage = Arc::clone(storage);
        let slot = self.slot;

        match self.stage {
            LoadStage::ReadingHeader => Some(Box::pin(async move {
                LoadStep::Header(storage.read_blob(&BlobPath::header(slot)).await)
            })),
            LoadStage::Enumerating => Some(Box::pin(async move {
                LoadStep::Listing(storage.list_fragments(slot).await)
            })),
            LoadStage::LoadingFragment(_) => {
                let Some(name) = self.pending.pop_front() else {
                    self.stage = LoadStage::Delivering;
                    return None;
                };
                self.stage = LoadStage::LoadingFragment(self.issued);
                self.issued += 1;

                Some(Box::pin(async move {
                    let result = storage
                        .read_blob(&BlobPath::fragment(slot, name.clone()))
                        .await;
                    LoadStep::Fragment { name, result }
                }))
            }
            LoadStage::Delivering => None,
        }
    }

    /// Record the outcome of the step returned by the last `next_step` call.
    pub fn complete_step(&mut self, step: LoadStep) {
        match step {
            LoadStep::Header(Ok(Some(bytes))) => match SaveHeader::from_json(&bytes) {
                Ok(header) => {
                    self.header = Some(header);
                    self.stage = LoadStage::Enumerating;
                }
                Err(e) => self.abort(PipelineIssue::HeaderMissing {
                    reason: format!("corrupted header: {}", e),
                }),
            },
            LoadStep::Header(Ok(None)) => self.abort(PipelineIssue::HeaderMissing {
                reason: format!("slot {} has no header", self.slot),
            }),
            LoadStep::Header(Err(e)) => self.abort(PipelineIssue::HeaderMissing {
                reason: e.to_string(),
            }),
            LoadStep::Listing(Ok(names)) => {
                debug!(
                    target: "save_runtime::load",
                    slot = self.slot,
                    fragments = names.len(),
                    "Enumerated fragments"
                );
                self.pending = names.into();
                self.stage = LoadStage::LoadingFragment(0);
            }
            LoadStep::Listing(Err(e)) => self.abort(PipelineIssue::EnumerationFailed {
                reason: e.to_string(),
            }),
            LoadStep::Fragment {
                name,
                result: Ok(Some(bytes)),
            } => {
                self.cache.insert(name.clone(), FragmentPayload::from_bytes(bytes));
                self.report.loaded.push(name);
            }
            LoadStep::Fragment {
                name,
                result: Ok(None),
            } => self.skip(name, "fragment vanished before it could be read".into()),
            LoadStep::Fragment {
                name,
                result: Err(e),
            } => self.skip(name, e.to_string()),
        }
    }

    fn abort(&mut self, issue: PipelineIssue) {
        warn!(
            target: "save_runtime::load",
            slot = self.slot,
            issue = %issue,
            "Load aborted"
        );
        self.header = None;
        self.pending.clear();
        self.report.issues.push(issue);
        self.stage = LoadStage::Delivering;
    }

    fn skip(&mut self, fragment: FragmentName, reason: String) {
        warn!(
            target: "save_runtime::load",
            slot = self.slot,
            fragment = %fragment,
            reason = %reason,
            "Fragment skipped"
        );
        self.report
            .issues
            .push(PipelineIssue::FragmentReadFailed { fragment, reason });
    }

    /// Deliver cached payloads to matching systems and hand the results back.
    ///
    /// Systems without a cached fragment are left untouched. Cached fragments
    /// without a system stay in the cache for late lookups.
    pub fn finish(mut self, systems: &[Arc<dyn SaveableSystem>]) -> LoadOutcome {
        self.stage = LoadStage::Delivering;
        self.report.success = self.header.is_some();

        if self.report.success {
            for system in systems {
                let name = system.fragment_name();
                let Some(payload) = self.cache.get(&name) else {
                    continue;
                };

                match system.restore_from_save_data(payload) {
                    Ok(()) => {
                        if !self.report.delivered.contains(&name) {
                            self.report.delivered.push(name);
                        }
                    }
                    Err(e) => {
                        warn!(
                            target: "save_runtime::load",
                            slot = self.slot,
                            fragment = %name,
                            error = %e,
                            "Restore failed"
                        );
                        self.report.issues.push(PipelineIssue::RestoreFailed {
                            fragment: name,
                            reason: e.to_string(),
                        });
                    }
                }
            }

            for name in self.cache.names() {
                let consumed = systems.iter().any(|s| s.fragment_name() == name);
                if !consumed {
                    debug!(
                        target: "save_runtime::load",
                        fragment = %name,
                        "No registered consumer, keeping fragment cached"
                    );
                    self.report
                        .issues
                        .push(PipelineIssue::UnmatchedFragment { fragment: name });
                }
            }
        }

        LoadOutcome {
            report: self.report,
            cache: self.cache,
            header: self.header,
        }
    }
}
