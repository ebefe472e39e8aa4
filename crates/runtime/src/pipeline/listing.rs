//! Read-only slot header listing.
//!
//! Listing never touches manager state, so the worker runs it on a spawned
//! task against the shared storage handle.

use tracing::warn;

use crate::storage::{BlobPath, SaveHeader, SaveStorage};
use crate::types::SlotIndex;

/// Read and decode a single slot header.
///
/// Missing, unreadable, and corrupt headers all come back as `None`; only the
/// latter two are logged.
pub async fn read_header(storage: &dyn SaveStorage, slot: SlotIndex) -> Option<SaveHeader> {
    let bytes = match storage.read_blob(&BlobPath::header(slot)).await {
        Ok(Some(bytes)) => bytes,
        Ok(None) => return None,
        Err(e) => {
            warn!(
                target: "save_runtime::listing",
                slot,
                error = %e,
                "Failed to read slot header"
            );
            return None;
        }
    };

    match SaveHeader::from_json(&bytes) {
        Ok(header) => Some(header),
        Err(e) => {
            warn!(
                target: "save_runtime::listing",
                slot,
                error = %e,
                "Corrupted slot header, skipping"
            );
            None
        }
    }
}

/// Headers of every slot in storage, sorted by slot index.
///
/// Each slot is read independently; one bad slot never hides the others.
pub async fn read_all_headers(storage: &dyn SaveStorage) -> Vec<SaveHeader> {
    let mut slots = match storage.list_slots().await {
        Ok(slots) => slots,
        Err(e) => {
            warn!(
                target: "save_runtime::listing",
                error = %e,
                "Failed to enumerate slots"
            );
            return Vec::new();
        }
    };
    slots.sort_unstable();
    slots.dedup();

    let mut headers = Vec::with_capacity(slots.len());
    for slot in slots {
        if let Some(header) = read_header(storage, slot).await {
            headers.push(header);
        }
    }
    headers
}
