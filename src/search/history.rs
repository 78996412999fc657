use crate::search::filter::normalize;
use crate::storage::{self, KeyValueStore, StorageError, SEARCH_HISTORY_KEY};
use serde::{Deserialize, Serialize};

pub const MAX_HISTORY: usize = 10;
/// Shorter terms are typing noise, not searches worth remembering
pub const MIN_TERM_CHARS: usize = 3;

/// Recent search terms, most recent first, without duplicates
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SearchHistory {
    entries: Vec<String>,
}

impl SearchHistory {
    pub fn new() -> Self {
        Self::default()
    }

    /// Restore the persisted list; anything unreadable starts a fresh history.
    pub fn load(store: &dyn KeyValueStore) -> Self {
        let entries: Vec<String> = storage::load(store, SEARCH_HISTORY_KEY).unwrap_or_default();
        let mut history = Self::new();
        // Oldest first so the stored order is reproduced
        for term in entries.iter().take(MAX_HISTORY).rev() {
            history.record(term);
        }
        history
    }

    pub fn save(&self, store: &dyn KeyValueStore) -> Result<(), StorageError> {
        storage::save(store, SEARCH_HISTORY_KEY, &self.entries)
    }

    /// Put `term` at the front. Returns false when the term is too short to keep.
    pub fn record(&mut self, term: &str) -> bool {
        let term = term.trim();
        if term.chars().count() < MIN_TERM_CHARS {
            return false;
        }
        self.entries.retain(|existing| existing != term);
        self.entries.insert(0, term.to_string());
        self.entries.truncate(MAX_HISTORY);
        true
    }

    pub fn clear(&mut self) {
        self.entries.clear();
    }

    /// Forget the history in memory and in storage
    pub fn clear_persisted(&mut self, store: &dyn KeyValueStore) -> Result<(), StorageError> {
        self.clear();
        store.remove(SEARCH_HISTORY_KEY)
    }

    pub fn entries(&self) -> &[String] {
        &self.entries
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Entries containing `term`, ignoring case and accents
    pub fn matching<'a>(&'a self, term: &str) -> impl Iterator<Item = &'a str> + 'a {
        let needle = normalize(term);
        self.entries
            .iter()
            .filter(move |entry| normalize(entry).contains(&needle))
            .map(String::as_str)
    }
}
