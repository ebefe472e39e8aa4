//! Common type aliases used throughout the save runtime.
//!
//! These type aliases provide semantic clarity for primitive types
//! that are used with specific meanings across the runtime.

/// Index of a save slot (`slot-{index}` namespace in storage)
pub type SlotIndex = u32;

/// Stable name of a save fragment, unique within a slot
pub type FragmentName = String;
