use std::collections::VecDeque;

use chrono::Utc;
use parking_lot::Mutex;
use tracing::{debug, warn};

use crate::models::HistoryEntry;
use crate::profile_store::ProfileStore;

/// Most searches we remember
pub const HISTORY_CAPACITY: usize = 50;

/// Newest-first log of past searches, capped at `HISTORY_CAPACITY`.
///
/// Every mutation writes the whole list back to the profile store. A failed
/// write is logged and the in-memory list stays authoritative until the
/// next successful one.
pub struct HistoryLedger {
    store: ProfileStore,
    entries: Mutex<VecDeque<HistoryEntry>>,
}

impl HistoryLedger {
    /// Rebuild from the profile store. Nothing stored means an empty ledger.
    pub fn load(store: ProfileStore) -> Self {
        let mut entries: VecDeque<HistoryEntry> = match store.history() {
            Ok(entries) => entries.into(),
            Err(e) => {
                warn!("Could not read search history: {}", e);
                VecDeque::new()
            }
        };
        entries.truncate(HISTORY_CAPACITY);
        debug!("Loaded {} history entries", entries.len());

        Self {
            store,
            entries: Mutex::new(entries),
        }
    }

    /// Record a completed search and return the new head entry
    pub fn record(&self, query_text: &str, result_count: usize) -> HistoryEntry {
        let created_at = Utc::now();
        let mut entries = self.entries.lock();

        // Ids are creation millis, nudged forward so two searches in the same
        // millisecond still get distinct ids. Never wraps past i64::MAX.
        let mut id = created_at.timestamp_millis();
        if let Some(head) = entries.front() {
            id = id.max(head.id.saturating_add(1));
        }

        let entry = HistoryEntry {
            id,
            query_text: query_text.to_string(),
            created_at,
            result_count,
        };
        Self::push_front(&mut entries, entry.clone());
        self.persist(&entries);
        entry
    }

    /// Prepend an already-built entry
    pub fn append(&self, entry: HistoryEntry) {
        let mut entries = self.entries.lock();
        Self::push_front(&mut entries, entry);
        self.persist(&entries);
    }

    pub fn clear(&self) {
        let mut entries = self.entries.lock();
        entries.clear();
        if let Err(e) = self.store.set_history(entries.iter()) {
            warn!("Failed to persist cleared history: {}", e);
        }
    }

    /// Snapshot, newest first
    pub fn entries(&self) -> Vec<HistoryEntry> {
        self.entries.lock().iter().cloned().collect()
    }

    pub fn get(&self, id: i64) -> Option<HistoryEntry> {
        self.entries.lock().iter().find(|e| e.id == id).cloned()
    }

    pub fn len(&self) -> usize {
        self.entries.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.lock().is_empty()
    }

    fn push_front(entries: &mut VecDeque<HistoryEntry>, entry: HistoryEntry) {
        entries.push_front(entry);
        entries.truncate(HISTORY_CAPACITY);
    }

    fn persist(&self, entries: &VecDeque<HistoryEntry>) {
        if let Err(e) = self.store.set_history(entries.iter()) {
            warn!("Failed to persist search history: {}", e);
        }
    }
}
