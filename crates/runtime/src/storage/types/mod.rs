//! Shared types for the storage layer.

mod fragment;
mod header;
mod settings;

pub use fragment::{FragmentError, FragmentPayload, QueuedFragment};
pub use header::SaveHeader;
pub use settings::UserSettings;
