//! Active slot identity and playtime accounting.

use std::time::Duration;

use tokio::time::Instant;

use crate::storage::SaveHeader;
use crate::types::SlotIndex;

/// Tracks which slot is being played, for how long, and its last known header.
///
/// Total playtime is `prior + (now - session_start)`. Nothing here is persisted
/// by itself; a full save copies the current total into the slot header.
#[derive(Debug, Default)]
pub struct SessionTracker {
    active_slot: Option<SlotIndex>,
    active_header: Option<SaveHeader>,
    prior_play_time: Duration,
    session_start: Option<Instant>,
}

impl SessionTracker {
    pub fn new() -> Self {
        Self::default()
    }

    /// Reset the clock for a brand new game.
    pub fn start_new_session(&mut self) {
        self.prior_play_time = Duration::ZERO;
        self.session_start = Some(Instant::now());
    }

    /// Continue the clock from playtime read out of a header.
    pub fn resume_session(&mut self, prior_play_time: Duration) {
        self.prior_play_time = prior_play_time;
        self.session_start = Some(Instant::now());
    }

    pub fn has_active_session(&self) -> bool {
        self.session_start.is_some()
    }

    /// Playtime up to this moment, including the running session.
    ///
    /// Saturates at [`Duration::MAX`]; the prior value can come from any header.
    pub fn current_total_play_time(&self) -> Duration {
        let running = self
            .session_start
            .map(|start| start.elapsed())
            .unwrap_or_default();
        self.prior_play_time.saturating_add(running)
    }

    pub fn active_slot(&self) -> Option<SlotIndex> {
        self.active_slot
    }

    /// Switch the active slot. The cached header is dropped unless it belongs
    /// to the new slot.
    pub fn set_active_slot(&mut self, slot: Option<SlotIndex>) {
        self.active_slot = slot;
        if self.active_header.as_ref().map(|h| h.slot_index) != slot {
            self.active_header = None;
        }
    }

    pub fn active_header(&self) -> Option<&SaveHeader> {
        self.active_header.as_ref()
    }

    pub fn set_active_header(&mut self, header: Option<SaveHeader>) {
        self.active_header = header;
    }

    /// Slot name to write into the next header of the active slot.
    pub fn active_slot_name(&self) -> Option<String> {
        let slot = self.active_slot?;
        Some(
            self.active_header
                .as_ref()
                .map(|h| h.slot_name.clone())
                .unwrap_or_else(|| SaveHeader::default_slot_name(slot)),
        )
    }

    /// Build a fresh header for `slot` stamped with the current playtime.
    pub fn build_header(&self, slot: SlotIndex, slot_name: &str) -> SaveHeader {
        SaveHeader::new(slot, slot_name, self.current_total_play_time())
    }

    /// Forget the active slot and its header (e.g. after it was deleted).
    pub fn clear_active_slot(&mut self) {
        self.active_slot = None;
        self.active_header = None;
    }
}
