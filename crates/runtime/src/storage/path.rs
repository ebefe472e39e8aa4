//! Slot-scoped blob addressing.

use std::fmt;

use super::{Result, StorageError};
use crate::types::SlotIndex;

/// Logical address of a blob inside a storage provider.
///
/// ```text
/// settings                  ← user settings (root, outside any slot)
/// slot-{index}/header       ← slot header
/// slot-{index}/{fragment}   ← fragment payload
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum BlobPath {
    Header(SlotIndex),
    Fragment { slot: SlotIndex, name: String },
    UserSettings,
}

impl BlobPath {
    pub fn header(slot: SlotIndex) -> Self {
        Self::Header(slot)
    }

    pub fn fragment(slot: SlotIndex, name: impl Into<String>) -> Self {
        Self::Fragment {
            slot,
            name: name.into(),
        }
    }

    /// Directory-like namespace of a slot (`slot-{index}`).
    pub fn slot_directory(slot: SlotIndex) -> String {
        format!("slot-{}", slot)
    }

    /// Parses a `slot-{index}` namespace back into its index.
    pub fn parse_slot_directory(name: &str) -> Option<SlotIndex> {
        name.strip_prefix("slot-")?.parse().ok()
    }

    pub fn slot(&self) -> Option<SlotIndex> {
        match self {
            Self::Header(slot) | Self::Fragment { slot, .. } => Some(*slot),
            Self::UserSettings => None,
        }
    }

    /// Rejects fragment names that would escape the slot namespace.
    pub fn validate(&self) -> Result<()> {
        if let Self::Fragment { name, .. } = self
            && !is_safe_fragment_name(name)
        {
            return Err(StorageError::InvalidFragmentName(name.clone()));
        }
        Ok(())
    }
}

impl fmt::Display for BlobPath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Header(slot) => write!(f, "{}/header", Self::slot_directory(*slot)),
            Self::Fragment { slot, name } => {
                write!(f, "{}/{}", Self::slot_directory(*slot), name)
            }
            Self::UserSettings => f.write_str("settings"),
        }
    }
}

fn is_safe_fragment_name(name: &str) -> bool {
    !name.is_empty()
        && name != "."
        && name != ".."
        && !name.contains(['/', '\\', '\0'])
}
