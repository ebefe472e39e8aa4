//! Slot header metadata.
//!
//! The header is a small JSON document stored next to a slot's fragments. It is
//! readable on its own, so slot listings never have to touch fragment data.
//!
//! # Data Layout
//!
//! ```text
//! slot-{index}/header        ← SaveHeader (this structure)
//! slot-{index}/{fragment}    ← one blob per registered participant
//! ```

use std::time::Duration;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::types::SlotIndex;

/// Metadata describing one save slot.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SaveHeader {
    /// Slot this header belongs to
    pub slot_index: SlotIndex,

    /// User-facing slot name (usually the character name)
    pub slot_name: String,

    /// Wall-clock time of the last full save
    pub saved_at: DateTime<Utc>,

    /// Accumulated playtime at the last full save
    pub play_time: Duration,
}

impl SaveHeader {
    /// Create a header stamped with the current time.
    pub fn new(slot_index: SlotIndex, slot_name: impl Into<String>, play_time: Duration) -> Self {
        Self {
            slot_index,
            slot_name: slot_name.into(),
            saved_at: Utc::now(),
            play_time,
        }
    }

    /// Name used when a slot is saved without a known header.
    pub fn default_slot_name(slot_index: SlotIndex) -> String {
        format!("Slot {}", slot_index)
    }

    pub fn to_json(&self) -> serde_json::Result<Vec<u8>> {
        serde_json::to_vec_pretty(self)
    }

    pub fn from_json(bytes: &[u8]) -> serde_json::Result<Self> {
        serde_json::from_slice(bytes)
    }
}
