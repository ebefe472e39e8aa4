//! Worker tasks that back the save manager.
//!
//! The manager worker exclusively owns the registry, loaded-fragment cache,
//! session clock and the in-flight operation. Everything else talks to it
//! through [`Command`]s.

mod manager;

pub use manager::{Command, SaveManagerWorker};
