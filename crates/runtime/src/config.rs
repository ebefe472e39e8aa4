//! Save system configuration.

use std::env;
use std::path::PathBuf;

use directories::ProjectDirs;

use crate::types::SlotIndex;

/// Configuration shared by the save manager and its storage.
#[derive(Debug, Clone)]
pub struct SaveSystemConfig {
    /// Valid slot indices are `0..max_slots`
    pub max_slots: SlotIndex,
    pub command_buffer_size: usize,
    /// Capacity of each event topic
    pub event_buffer_size: usize,
    /// Load the last selected slot while building, if user settings ask for it
    pub auto_load_on_start: bool,
    /// Root directory for [`FileStorage`](crate::storage::FileStorage)
    pub save_dir: PathBuf,
}

impl Default for SaveSystemConfig {
    fn default() -> Self {
        Self {
            max_slots: 10,
            command_buffer_size: 32,
            event_buffer_size: 64,
            auto_load_on_start: true,
            save_dir: default_save_dir(),
        }
    }
}

impl SaveSystemConfig {
    /// Defaults overridden by `SAVE_*` environment variables.
    ///
    /// Unparseable values are ignored.
    pub fn from_env() -> Self {
        let mut config = Self::default();

        if let Some(max_slots) = read_env::<SlotIndex>("SAVE_MAX_SLOTS") {
            config.max_slots = max_slots.max(1);
        }

        // Channel configuration
        if let Some(capacity) = read_env::<usize>("SAVE_COMMAND_BUFFER") {
            config.command_buffer_size = capacity.max(1);
        }
        if let Some(capacity) = read_env::<usize>("SAVE_EVENT_BUFFER") {
            config.event_buffer_size = capacity.max(1);
        }

        if let Some(enable) = read_env::<bool>("SAVE_AUTO_LOAD") {
            config.auto_load_on_start = enable;
        }

        if let Ok(dir) = env::var("SAVE_DATA_DIR") {
            config.save_dir = PathBuf::from(dir);
        }

        config
    }

    pub fn is_valid_slot(&self, slot: SlotIndex) -> bool {
        slot < self.max_slots
    }
}

/// Platform data directory for save slots, `./save_data` if none is known.
pub fn default_save_dir() -> PathBuf {
    ProjectDirs::from("", "", "save-system")
        .map(|dirs| dirs.data_dir().join("saves"))
        .unwrap_or_else(|| PathBuf::from("./save_data"))
}

fn read_env<T>(key: &str) -> Option<T>
where
    T: std::str::FromStr,
{
    env::var(key).ok()?.parse().ok()
}
