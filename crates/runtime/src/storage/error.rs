//! Error types raised by storage providers.

use thiserror::Error;

/// Errors surfaced by [`SaveStorage`](super::SaveStorage) implementations.
#[derive(Debug, Error)]
pub enum StorageError {
    #[error("storage lock was poisoned")]
    LockPoisoned,

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("fragment name {0:?} is not safe to use as a file name")]
    InvalidFragmentName(String),

    #[error("injected failure for {0}")]
    Injected(String),
}

pub type Result<T> = std::result::Result<T, StorageError>;
