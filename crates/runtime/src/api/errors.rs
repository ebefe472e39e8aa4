//! Unified error types surfaced by the save runtime API.
//!
//! [`SaveError`] is returned synchronously by requests. Problems that happen
//! while a pipeline runs never abort it; they are collected as
//! [`PipelineIssue`]s and delivered with the completion event.
use thiserror::Error;
use tokio::sync::oneshot;

pub use crate::storage::{FragmentError, StorageError};
use crate::types::{FragmentName, SlotIndex};

pub type Result<T> = std::result::Result<T, SaveError>;

#[derive(Debug, Error)]
pub enum SaveError {
    #[error("another save or load operation is still pending")]
    Busy,

    #[error("slot {slot} is outside the configured range 0..{max_slots}")]
    InvalidSlot { slot: SlotIndex, max_slots: SlotIndex },

    #[error("no save slot is active")]
    NoActiveSlot,

    #[error("no playtime session is active")]
    NoActiveSession,

    #[error("saveable system was dropped before it could be saved")]
    ParticipantDropped,

    #[error("failed to gather save data for fragment '{fragment}'")]
    Gather {
        fragment: FragmentName,
        #[source]
        source: FragmentError,
    },

    #[error(transparent)]
    Storage(#[from] StorageError),

    #[error("save manager command channel closed")]
    CommandChannelClosed,

    #[error("save manager reply channel closed")]
    ReplyChannelClosed(#[source] oneshot::error::RecvError),

    #[error("save manager worker join failed")]
    WorkerJoin(#[source] tokio::task::JoinError),
}

/// Something that went wrong (or was skipped) for one unit of a pipeline.
///
/// Issues are absorbed locally: the pipeline carries on with the next unit and
/// the issue is reported with the terminal event.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum PipelineIssue {
    #[error("failed to write fragment '{fragment}': {reason}")]
    FragmentWriteFailed {
        fragment: FragmentName,
        reason: String,
    },

    #[error("failed to read fragment '{fragment}': {reason}")]
    FragmentReadFailed {
        fragment: FragmentName,
        reason: String,
    },

    #[error("failed to gather fragment '{fragment}': {reason}")]
    GatherFailed {
        fragment: FragmentName,
        reason: String,
    },

    #[error("failed to clear previous slot contents: {reason}")]
    SlotClearFailed { reason: String },

    #[error("failed to write slot header: {reason}")]
    HeaderWriteFailed { reason: String },

    #[error("slot header missing or unreadable: {reason}")]
    HeaderMissing { reason: String },

    #[error("failed to enumerate fragments: {reason}")]
    EnumerationFailed { reason: String },

    #[error("fragment '{fragment}' has no registered consumer; kept in cache")]
    UnmatchedFragment { fragment: FragmentName },

    #[error("failed to restore fragment '{fragment}': {reason}")]
    RestoreFailed {
        fragment: FragmentName,
        reason: String,
    },
}

impl PipelineIssue {
    /// Whether this issue makes the operation count as failed.
    pub fn is_failure(&self) -> bool {
        !matches!(self, Self::UnmatchedFragment { .. })
    }
}
