//! Registry of live saveable systems.

use std::sync::{Arc, Weak};

use crate::api::SaveableSystem;

/// Registry that tracks every system taking part in saves and loads.
///
/// Systems are held as [`Weak`] references in registration order: the registry
/// never keeps a system alive, and a dropped system silently leaves the set.
/// Identity is the allocation address, so two distinct systems may (by
/// mistake) report the same fragment name; on save the later write wins and on
/// load every match is restored.
#[derive(Default)]
pub struct FragmentRegistry {
    systems: Vec<Weak<dyn SaveableSystem>>,
}

impl FragmentRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers a system. Returns `false` if it was already registered or has
    /// already been dropped.
    pub fn register(&mut self, system: Weak<dyn SaveableSystem>) -> bool {
        if system.strong_count() == 0 {
            return false;
        }
        self.prune();
        if self.position(&system).is_some() {
            return false;
        }
        self.systems.push(system);
        true
    }

    /// Unregisters a system. Returns `false` if it was not registered.
    pub fn unregister(&mut self, system: &Weak<dyn SaveableSystem>) -> bool {
        let removed = match self.position(system) {
            Some(index) => {
                self.systems.remove(index);
                true
            }
            None => false,
        };
        self.prune();
        removed
    }

    pub fn contains(&self, system: &Weak<dyn SaveableSystem>) -> bool {
        self.position(system).is_some()
    }

    /// Snapshot of the live systems, in registration order.
    pub fn live(&self) -> Vec<Arc<dyn SaveableSystem>> {
        self.systems.iter().filter_map(Weak::upgrade).collect()
    }

    /// Number of systems that are still alive.
    pub fn len(&self) -> usize {
        self.systems.iter().filter(|s| s.strong_count() > 0).count()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Drops entries whose system no longer exists.
    pub fn prune(&mut self) {
        self.systems.retain(|s| s.strong_count() > 0);
    }

    fn position(&self, system: &Weak<dyn SaveableSystem>) -> Option<usize> {
        self.systems
            .iter()
            .position(|known| std::ptr::addr_eq(known.as_ptr(), system.as_ptr()))
    }
}
