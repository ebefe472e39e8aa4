//! Storage provider contract consumed by the save pipelines.

use async_trait::async_trait;

use super::{BlobPath, Result};
use crate::types::{FragmentName, SlotIndex};

/// Asynchronous blob store addressed by slot-scoped [`BlobPath`]s.
///
/// Providers only move bytes around. They never interpret headers or
/// fragments, and every call is independent: the save pipelines issue at most
/// one call at a time per manager.
#[async_trait]
pub trait SaveStorage: Send + Sync {
    /// Write a blob, replacing any previous content and creating the slot
    /// namespace if needed.
    async fn write_blob(&self, path: &BlobPath, bytes: &[u8]) -> Result<()>;

    /// Read a blob.
    ///
    /// Returns `Ok(None)` when nothing is stored at `path`.
    async fn read_blob(&self, path: &BlobPath) -> Result<Option<Vec<u8>>>;

    /// List the fragment names stored in a slot (header excluded).
    ///
    /// Order is provider-defined. A slot that does not exist has no fragments.
    async fn list_fragments(&self, slot: SlotIndex) -> Result<Vec<FragmentName>>;

    /// List every slot that currently has a namespace in storage.
    async fn list_slots(&self) -> Result<Vec<SlotIndex>>;

    /// Remove a slot's header and all of its fragments.
    ///
    /// Returns `true` if the slot existed.
    async fn delete_slot(&self, slot: SlotIndex) -> Result<bool>;

    /// Check whether a slot has a header.
    async fn has_header(&self, slot: SlotIndex) -> Result<bool> {
        Ok(self.read_blob(&BlobPath::header(slot)).await?.is_some())
    }
}
