//! Staging cache for loaded fragments.

use std::collections::HashMap;

use crate::storage::FragmentPayload;
use crate::types::FragmentName;

/// Fragments read from the active slot, keyed by fragment name.
///
/// Built by a load, then kept for systems that register after the load
/// finished (lazily spawned objects query it instead of waiting for a restore
/// call). Replaced wholesale whenever another slot is loaded or a new game
/// starts.
#[derive(Debug, Default, Clone)]
pub struct LoadedFragmentCache {
    fragments: HashMap<FragmentName, FragmentPayload>,
}

impl LoadedFragmentCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// Stores a payload, replacing any earlier one under the same name.
    pub fn insert(&mut self, name: impl Into<FragmentName>, payload: FragmentPayload) {
        self.fragments.insert(name.into(), payload);
    }

    pub fn get(&self, name: &str) -> Option<&FragmentPayload> {
        self.fragments.get(name)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.fragments.contains_key(name)
    }

    pub fn clear(&mut self) {
        self.fragments.clear();
    }

    pub fn len(&self) -> usize {
        self.fragments.len()
    }

    pub fn is_empty(&self) -> bool {
        self.fragments.is_empty()
    }

    /// Cached fragment names, sorted.
    pub fn names(&self) -> Vec<FragmentName> {
        let mut names: Vec<_> = self.fragments.keys().cloned().collect();
        names.sort();
        names
    }
}
