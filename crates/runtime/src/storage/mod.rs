//! Storage layer for slot headers, fragments and user settings.
//!
//! The save pipelines only talk to [`SaveStorage`]. Two providers ship with the
//! crate:
//! - [`FileStorage`] persists each blob as its own file under a base directory
//! - [`InMemoryStorage`] keeps blobs in memory for tests and tooling

mod error;
mod file;
mod memory;
mod path;
mod traits;
mod types;

pub use error::{Result, StorageError};
pub use file::FileStorage;
pub use memory::InMemoryStorage;
pub use path::BlobPath;
pub use traits::SaveStorage;
pub use types::{FragmentError, FragmentPayload, QueuedFragment, SaveHeader, UserSettings};
