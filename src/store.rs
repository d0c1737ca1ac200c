use dashmap::DashMap;
use std::sync::atomic::{AtomicUsize, Ordering};

// One active quota window for one key
pub struct CounterEntry {
    pub count: u32,
    pub reset_at: i64, // epoch ms, entry is stale once this has passed
}

// Shared map of counter entries. Keys are opaque strings like
// "<identity>:minute" or "ip:<address>" - the store doesn't care.
pub struct CounterStore {
    entries: DashMap<String, CounterEntry>,
}

impl CounterStore {
    pub fn new() -> Self {
        Self {
            entries: DashMap::new(),
        }
    }

    pub fn entries(&self) -> &DashMap<String, CounterEntry> {
        &self.entries
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    // Drop every entry whose window has already expired. Returns how many
    // were removed. Safe to run while requests are mutating the map -
    // deleting an expired entry never changes an admission decision.
    // Removals are counted inside the predicate - request threads keep
    // inserting while retain scans, so diffing map lengths is wrong.
    pub fn sweep(&self, now_ms: i64) -> usize {
        let removed = AtomicUsize::new(0);
        self.entries.retain(|_, entry| {
            if entry.reset_at > now_ms {
                true
            } else {
                removed.fetch_add(1, Ordering::Relaxed);
                false
            }
        });
        removed.load(Ordering::Relaxed)
    }

    #[cfg(test)]
    pub fn count_for(&self, key: &str) -> Option<u32> {
        self.entries.get(key).map(|e| e.count)
    }
}

impl Default for CounterStore {
    fn default() -> Self {
        Self::new()
    }
}
