//! Tag Index
//!
//! Maps each tag to the keys currently carrying it, so invalidation only
//! touches matching keys.

use std::collections::{BTreeSet, HashMap, HashSet};

// == Tag Index ==
/// Derived view from tag to key set, kept in step with the entry store.
#[derive(Debug, Default)]
pub struct TagIndex {
    keys_by_tag: HashMap<String, HashSet<String>>,
}

impl TagIndex {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers `key` under each of `tags`.
    pub fn insert(&mut self, key: &str, tags: &BTreeSet<String>) {
        for tag in tags {
            self.keys_by_tag
                .entry(tag.clone())
                .or_default()
                .insert(key.to_string());
        }
    }

    /// Unregisters `key` from each of `tags`, dropping tags left empty.
    pub fn remove(&mut self, key: &str, tags: &BTreeSet<String>) {
        for tag in tags {
            if let Some(keys) = self.keys_by_tag.get_mut(tag) {
                keys.remove(key);
                if keys.is_empty() {
                    self.keys_by_tag.remove(tag);
                }
            }
        }
    }

    /// Returns every key carrying at least one of `tags`, without duplicates.
    pub fn keys_for<S: AsRef<str>>(&self, tags: &[S]) -> HashSet<String> {
        tags.iter()
            .filter_map(|tag| self.keys_by_tag.get(tag.as_ref()))
            .flat_map(|keys| keys.iter().cloned())
            .collect()
    }

    pub fn clear(&mut self) {
        self.keys_by_tag.clear();
    }
}
