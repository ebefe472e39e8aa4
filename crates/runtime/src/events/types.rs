//! Completion reports carried by save and load events.

use crate::api::PipelineIssue;
use crate::types::{FragmentName, SlotIndex};

/// Which save path produced a [`SaveReport`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SaveKind {
    /// Every registered system plus the slot header
    Full,
    /// A single system's fragment, header untouched
    Fragment,
}

/// Outcome of one save operation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SaveReport {
    pub slot: SlotIndex,
    pub kind: SaveKind,
    /// Fragments written successfully, in write order
    pub written: Vec<FragmentName>,
    /// Whether the slot header was rewritten
    pub header_written: bool,
    pub issues: Vec<PipelineIssue>,
}

impl SaveReport {
    pub(crate) fn new(slot: SlotIndex, kind: SaveKind) -> Self {
        Self {
            slot,
            kind,
            written: Vec::new(),
            header_written: false,
            issues: Vec::new(),
        }
    }

    /// True when every fragment (and the header, for full saves) was written.
    pub fn success(&self) -> bool {
        let header_ok = match self.kind {
            SaveKind::Full => self.header_written,
            SaveKind::Fragment => true,
        };
        header_ok && !self.issues.iter().any(PipelineIssue::is_failure)
    }

    /// Names of fragments whose gather or write failed.
    pub fn failed_fragments(&self) -> Vec<&str> {
        self.issues
            .iter()
            .filter_map(|issue| match issue {
                PipelineIssue::FragmentWriteFailed { fragment, .. }
                | PipelineIssue::GatherFailed { fragment, .. } => Some(fragment.as_str()),
                _ => None,
            })
            .collect()
    }
}

/// Outcome of one load operation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LoadReport {
    pub slot: SlotIndex,
    /// False only when the slot header is missing or fragments could not be
    /// enumerated. Individual fragment read failures do not flip it.
    pub success: bool,
    /// Fragments placed in the loaded-fragment cache
    pub loaded: Vec<FragmentName>,
    /// Fragments handed to a registered system
    pub delivered: Vec<FragmentName>,
    pub issues: Vec<PipelineIssue>,
}

impl LoadReport {
    pub(crate) fn new(slot: SlotIndex) -> Self {
        Self {
            slot,
            success: false,
            loaded: Vec::new(),
            delivered: Vec::new(),
            issues: Vec::new(),
        }
    }

    /// Fragments that were found in storage but could not be read.
    pub fn skipped(&self) -> Vec<&str> {
        self.issues
            .iter()
            .filter_map(|issue| match issue {
                PipelineIssue::FragmentReadFailed { fragment, .. } => Some(fragment.as_str()),
                _ => None,
            })
            .collect()
    }
}
