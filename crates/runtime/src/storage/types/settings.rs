//! Per-user preferences for the save system.

use serde::{Deserialize, Serialize};

use crate::types::SlotIndex;

/// User preferences persisted at the storage root, outside any slot.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct UserSettings {
    /// The last slot the player highlighted in the save/load menu
    pub last_selected_slot: SlotIndex,

    /// Load `last_selected_slot` automatically on startup
    pub auto_load_last_save: bool,
}

impl Default for UserSettings {
    fn default() -> Self {
        Self {
            last_selected_slot: 0,
            auto_load_last_save: true,
        }
    }
}

impl UserSettings {
    pub fn to_json(&self) -> serde_json::Result<Vec<u8>> {
        serde_json::to_vec_pretty(self)
    }

    pub fn from_json(bytes: &[u8]) -> serde_json::Result<Self> {
        serde_json::from_slice(bytes)
    }
}
