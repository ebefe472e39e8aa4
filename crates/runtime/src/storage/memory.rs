//! In-memory SaveStorage implementation for tests and local runs.

use std::collections::{BTreeMap, HashSet};
use std::sync::RwLock;
use std::time::Duration;

use async_trait::async_trait;

use super::{BlobPath, Result, SaveStorage, StorageError};
use crate::types::{FragmentName, SlotIndex};

#[derive(Default, Clone)]
struct MemorySlot {
    header: Option<Vec<u8>>,
    fragments: BTreeMap<FragmentName, Vec<u8>>,
}

/// In-memory implementation of [`SaveStorage`].
///
/// Thread-safe but not persistent across process restarts. Besides plain
/// storage it can simulate slow devices ([`InMemoryStorage::with_latency`])
/// and failing blobs ([`InMemoryStorage::fail_writes_to`],
/// [`InMemoryStorage::fail_reads_from`], [`InMemoryStorage::fail_listing_of`]).
#[derive(Default)]
pub struct InMemoryStorage {
    slots: RwLock<BTreeMap<SlotIndex, MemorySlot>>,
    settings: RwLock<Option<Vec<u8>>>,
    failing_writes: RwLock<HashSet<BlobPath>>,
    failing_reads: RwLock<HashSet<BlobPath>>,
    failing_listings: RwLock<HashSet<SlotIndex>>,
    latency: Option<Duration>,
}

impl InMemoryStorage {
    /// Create a new empty in-memory storage.
    pub fn new() -> Self {
        Self::default()
    }

    /// Delay every call by `latency` (uses the tokio clock).
    pub fn with_latency(mut self, latency: Duration) -> Self {
        self.latency = Some(latency);
        self
    }

    /// Make every write to `path` fail until [`InMemoryStorage::clear_failures`].
    pub fn fail_writes_to(&self, path: BlobPath) {
        if let Ok(mut failing) = self.failing_writes.write() {
            failing.insert(path);
        }
    }

    /// Make every read of `path` fail until [`InMemoryStorage::clear_failures`].
    pub fn fail_reads_from(&self, path: BlobPath) {
        if let Ok(mut failing) = self.failing_reads.write() {
            failing.insert(path);
        }
    }

    /// Make fragment listing of `slot` fail until [`InMemoryStorage::clear_failures`].
    pub fn fail_listing_of(&self, slot: SlotIndex) {
        if let Ok(mut failing) = self.failing_listings.write() {
            failing.insert(slot);
        }
    }

    pub fn clear_failures(&self) {
        if let Ok(mut failing) = self.failing_writes.write() {
            failing.clear();
        }
        if let Ok(mut failing) = self.failing_reads.write() {
            failing.clear();
        }
        if let Ok(mut failing) = self.failing_listings.write() {
            failing.clear();
        }
    }

    /// Synchronous peek at a stored blob.
    pub fn blob(&self, path: &BlobPath) -> Option<Vec<u8>> {
        match path {
            BlobPath::UserSettings => self.settings.read().ok()?.clone(),
            BlobPath::Header(slot) => self.slots.read().ok()?.get(slot)?.header.clone(),
            BlobPath::Fragment { slot, name } => self
                .slots
                .read()
                .ok()?
                .get(slot)?
                .fragments
                .get(name)
                .cloned(),
        }
    }

    async fn simulate_latency(&self) {
        if let Some(latency) = self.latency {
            tokio::time::sleep(latency).await;
        }
    }

    fn check_injected(set: &RwLock<HashSet<BlobPath>>, path: &BlobPath) -> Result<()> {
        let failing = set.read().map_err(|_| StorageError::LockPoisoned)?;
        if failing.contains(path) {
            return Err(StorageError::Injected(path.to_string()));
        }
        Ok(())
    }
}

#[async_trait]
impl SaveStorage for InMemoryStorage {
    async fn write_blob(&self, path: &BlobPath, bytes: &[u8]) -> Result<()> {
        self.simulate_latency().await;
        path.validate()?;
        Self::check_injected(&self.failing_writes, path)?;

        match path {
            BlobPath::UserSettings => {
                let mut settings = self
                    .settings
                    .write()
                    .map_err(|_| StorageError::LockPoisoned)?;
                *settings = Some(bytes.to_vec());
            }
            BlobPath::Header(slot) => {
                let mut slots = self.slots.write().map_err(|_| StorageError::LockPoisoned)?;
                slots.entry(*slot).or_default().header = Some(bytes.to_vec());
            }
            BlobPath::Fragment { slot, name } => {
                let mut slots = self.slots.write().map_err(|_| StorageError::LockPoisoned)?;
                slots
                    .entry(*slot)
                    .or_default()
                    .fragments
                    .insert(name.clone(), bytes.to_vec());
            }
        }
        Ok(())
    }

    async fn read_blob(&self, path: &BlobPath) -> Result<Option<Vec<u8>>> {
        self.simulate_latency().await;
        path.validate()?;
        Self::check_injected(&self.failing_reads, path)?;

        if let BlobPath::UserSettings = path {
            let settings = self
                .settings
                .read()
                .map_err(|_| StorageError::LockPoisoned)?;
            return Ok(settings.clone());
        }

        let slots = self.slots.read().map_err(|_| StorageError::LockPoisoned)?;
        let bytes = match path {
            BlobPath::Header(slot) => slots.get(slot).and_then(|s| s.header.clone()),
            BlobPath::Fragment { slot, name } => {
                slots.get(slot).and_then(|s| s.fragments.get(name).cloned())
            }
            BlobPath::UserSettings => None,
        };
        Ok(bytes)
    }

    async fn list_fragments(&self, slot: SlotIndex) -> Result<Vec<FragmentName>> {
        self.simulate_latency().await;
        {
            let failing = self
                .failing_listings
                .read()
                .map_err(|_| StorageError::LockPoisoned)?;
            if failing.contains(&slot) {
                return Err(StorageError::Injected(format!("listing of slot-{}", slot)));
            }
        }
        let slots = self.slots.read().map_err(|_| StorageError::LockPoisoned)?;
        Ok(slots
            .get(&slot)
            .map(|s| s.fragments.keys().cloned().collect())
            .unwrap_or_default())
    }

    async fn list_slots(&self) -> Result<Vec<SlotIndex>> {
        self.simulate_latency().await;
        let slots = self.slots.read().map_err(|_| StorageError::LockPoisoned)?;
        Ok(slots.keys().copied().collect())
    }

    async fn delete_slot(&self, slot: SlotIndex) -> Result<bool> {
        self.simulate_latency().await;
        let mut slots = self.slots.write().map_err(|_| StorageError::LockPoisoned)?;
        Ok(slots.remove(&slot).is_some())
    }
}
