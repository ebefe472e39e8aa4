//! Capability trait for anything that wants its state saved.
//!
//! Runtime users implement [`SaveableSystem`] on live game objects (inventory,
//! quest log, world flags, ...) and register them with the save manager. Each
//! system owns exactly one fragment of every save slot.
use crate::storage::{FragmentError, FragmentPayload};
use crate::types::FragmentName;

/// A live object that can produce and consume one save fragment.
///
/// The manager only holds weak references to registered systems, so a system
/// that is dropped simply stops taking part in saves and loads. All methods are
/// called from the save manager's worker task and must not block for long.
///
/// # Example
///
/// ```ignore
/// struct Inventory {
///     items: Mutex<Vec<String>>,
/// }
///
/// impl SaveableSystem for Inventory {
///     fn fragment_name(&self) -> FragmentName {
///         "Inventory".into()
///     }
///
///     fn gather_save_data(&self) -> Result<Option<FragmentPayload>, FragmentError> {
///         let items = self.items.lock().unwrap();
///         FragmentPayload::encode(&*items).map(Some)
///     }
///
///     fn restore_from_save_data(&self, fragment: &FragmentPayload) -> Result<(), FragmentError> {
///         *self.items.lock().unwrap() = fragment.decode()?;
///         Ok(())
///     }
/// }
/// ```
pub trait SaveableSystem: Send + Sync {
    /// Stable, filesystem-safe name of this system's fragment.
    fn fragment_name(&self) -> FragmentName;

    /// Produce this system's save data.
    ///
    /// `Ok(None)` means there is nothing to persist this pass; the fragment is
    /// skipped without counting as a failure.
    fn gather_save_data(&self) -> Result<Option<FragmentPayload>, FragmentError>;

    /// Push loaded data back into this system.
    fn restore_from_save_data(&self, fragment: &FragmentPayload) -> Result<(), FragmentError>;

    /// Reset to defaults before a brand new game is saved.
    fn clear_save_data(&self) {}
}
