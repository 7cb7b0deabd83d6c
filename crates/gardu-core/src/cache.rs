//! ---
//! gardu_section: "02-data-sync"
//! gardu_subsection: "module"
//! gardu_type: "source"
//! gardu_scope: "code"
//! gardu_description: "Record loading, change detection, and remote synchronisation."
//! gardu_version: "v0.1.0"
//! gardu_owner: "tbd"
//! ---
use std::collections::HashMap;
use std::sync::Arc;
use std::time::{Duration, Instant};

use parking_lot::Mutex;
use tracing::debug;

use crate::record::Table;

#[derive(Debug)]
struct CachedTable {
    table: Arc<Table>,
    stored_at: Instant,
}

/// Time-bounded cache of loaded tables keyed by source identity.
///
/// Invalidation is local to this instance; other processes keep serving their
/// own copies until the TTL lapses.
#[derive(Debug)]
pub struct TableCache {
    ttl: Duration,
    entries: Mutex<HashMap<String, CachedTable>>,
}

impl TableCache {
    pub fn new(ttl: Duration) -> Self {
        Self {
            ttl,
            entries: Mutex::new(HashMap::new()),
        }
    }

    pub fn ttl(&self) -> Duration {
        self.ttl
    }

    pub fn get(&self, source: &str) -> Option<Arc<Table>> {
        self.get_at(source, Instant::now())
    }

    /// Lookup as of `now`; expired entries are evicted.
    pub fn get_at(&self, source: &str, now: Instant) -> Option<Arc<Table>> {
        let mut entries = self.entries.lock();
        let fresh = match entries.get(source) {
            Some(entry) => now.saturating_duration_since(entry.stored_at) < self.ttl,
            None => return None,
        };
        if fresh {
            entries.get(source).map(|entry| Arc::clone(&entry.table))
        } else {
            debug!(source, "cached table expired");
            entries.remove(source);
            None
        }
    }

    pub fn insert(&self, source: &str, table: Arc<Table>) {
        self.insert_at(source, table, Instant::now());
    }

    pub fn insert_at(&self, source: &str, table: Arc<Table>, now: Instant) {
        self.entries.lock().insert(
            source.to_owned(),
            CachedTable {
                table,
                stored_at: now,
            },
        );
    }

    /// Drop every cached table.
    pub fn invalidate(&self) {
        let mut entries = self.entries.lock();
        debug!(dropped = entries.len(), "table cache invalidated");
        entries.clear();
    }

    pub fn invalidate_source(&self, source: &str) {
        self.entries.lock().remove(source);
    }

    pub fn len(&self) -> usize {
        self.entries.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl Default for TableCache {
    fn default() -> Self {
        Self::new(Duration::from_secs(300))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn entries_expire_after_ttl() {
        let cache = TableCache::new(Duration::from_secs(300));
        let start = Instant::now();
        cache.insert_at("sheet-a", Arc::new(Table::empty()), start);

        assert!(cache
            .get_at("sheet-a", start + Duration::from_secs(299))
            .is_some());
        assert!(cache
            .get_at("sheet-a", start + Duration::from_secs(300))
            .is_none());
        assert!(cache.is_empty());
    }

    #[test]
    fn entries_are_keyed_by_source() {
        let cache = TableCache::default();
        cache.insert("sheet-a", Arc::new(Table::empty()));
        assert!(cache.get("sheet-b").is_none());
        assert!(cache.get("sheet-a").is_some());

        cache.insert("sheet-b", Arc::new(Table::empty()));
        cache.invalidate_source("sheet-a");
        assert!(cache.get("sheet-a").is_none());
        assert_eq!(cache.len(), 1);

        cache.invalidate();
        assert!(cache.is_empty());
    }
}
