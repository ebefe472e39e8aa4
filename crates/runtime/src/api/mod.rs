//! Public save system API surface.
//!
//! This module gathers the types exposed to consumers of the runtime crate so
//! other layers can stay focused on pipelines, workers, or storage.

pub mod errors;
pub mod handle;
pub mod participant;

pub use errors::{FragmentError, PipelineIssue, Result, SaveError, StorageError};
pub use handle::SaveManagerHandle;
pub use participant::SaveableSystem;
