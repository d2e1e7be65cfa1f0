//! Mirrored character registry owned by the combat worker
//!
//! The coordinator is the source of truth for every character. The worker
//! only keeps a copy, rebuilt from the messages it receives:
//! - Full snapshots replace the whole map
//! - Single-character upserts replace one entry
//! - Hits remove the victim locally
//!
//! There are no version numbers, so the mirror is only as fresh as the last
//! message applied.

use log::{debug, info};
use shared::Character;
use std::collections::HashMap;

/// Character mirror keyed by character id
#[derive(Debug, Default, Clone)]
pub struct Registry {
    characters: HashMap<String, Character>,
}

impl Registry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Replaces every entry with the given snapshot
    ///
    /// Characters missing from the snapshot are gone afterwards; nothing is
    /// merged with the previous contents.
    pub fn replace_all(&mut self, snapshot: HashMap<String, Character>) {
        debug!(
            "Registry snapshot: {} -> {} characters",
            self.characters.len(),
            snapshot.len()
        );
        self.characters = snapshot;
    }

    /// Inserts or wholesale replaces the entry for `character.id`
    pub fn upsert(&mut self, character: Character) {
        self.characters.insert(character.id.clone(), character);
    }

    /// Removes a character, returning it if it was present
    pub fn remove(&mut self, id: &str) -> Option<Character> {
        let removed = self.characters.remove(id);
        if removed.is_some() {
            info!("Removed character {} from registry", id);
        }
        removed
    }

    pub fn get(&self, id: &str) -> Option<&Character> {
        self.characters.get(id)
    }

    pub fn contains(&self, id: &str) -> bool {
        self.characters.contains_key(id)
    }

    /// Snapshot of the current ids, in map order
    ///
    /// Resolution iterates over this copy so it can remove entries while
    /// walking the registry.
    pub fn ids(&self) -> Vec<String> {
        self.characters.keys().cloned().collect()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Character> {
        self.characters.values()
    }

    pub fn len(&self) -> usize {
        self.characters.len()
    }

    pub fn is_empty(&self) -> bool {
        self.characters.is_empty()
    }
}
