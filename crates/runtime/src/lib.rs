//! Fragment-based asynchronous save/load orchestration.
//!
//! Game systems implement [`SaveableSystem`] and register with the save
//! manager. Each system owns one named fragment of every save slot; a slot is
//! a header plus one blob per fragment. Consumers build a [`SaveSystem`],
//! subscribe to events, and issue requests through [`SaveManagerHandle`].
//!
//! Modules are organized by responsibility:
//! - [`manager`] hosts the orchestrator and builder
//! - [`api`] exposes the types downstream clients interact with
//! - [`events`] provides the topic-based event bus and completion reports
//! - [`pipeline`] holds the sequential save and load state machines
//! - [`storage`] provides the storage contract plus file and memory providers
//! - `workers` keeps the manager task internal to the crate
pub mod api;
pub mod cache;
pub mod config;
pub mod events;
pub mod manager;
pub mod pipeline;
pub mod registry;
pub mod session;
pub mod storage;
pub mod types;

mod workers;

pub use api::{
    FragmentError, PipelineIssue, Result, SaveError, SaveManagerHandle, SaveableSystem,
    StorageError,
};
pub use cache::LoadedFragmentCache;
pub use config::SaveSystemConfig;
pub use events::{Event, EventBus, LoadReport, SaveKind, SaveReport, Topic};
pub use manager::{SaveSystem, SaveSystemBuilder};
pub use registry::FragmentRegistry;
pub use session::SessionTracker;
pub use storage::{
    BlobPath, FileStorage, FragmentPayload, InMemoryStorage, QueuedFragment, SaveHeader,
    SaveStorage, UserSettings,
};
pub use types::{FragmentName, SlotIndex};
