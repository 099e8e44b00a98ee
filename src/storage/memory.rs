//! Keyed in-memory cache with TTL staleness.

use std::collections::HashMap;
use std::sync::{Arc, PoisonError, RwLock};
use std::time::Duration;

use chrono::{DateTime, TimeDelta, Utc};

use crate::error::{AppError, Result};
use crate::models::{AnnouncementRecord, AnnouncementRow, CacheConfig, LogicalKey};
use crate::storage::{CacheEntry, Completeness};
use crate::utils::fingerprint;

/// Authoritative per-key announcement store shared by all consumers.
///
/// Entries are swapped wholesale under a write lock and handed out as
/// `Arc`s, so readers never observe a half-written row set. Reads never
/// trigger a refresh.
#[derive(Debug)]
pub struct SharedCache {
    ttl: TimeDelta,
    entries: RwLock<HashMap<LogicalKey, Arc<CacheEntry>>>,
}

impl SharedCache {
    pub fn new(ttl: Duration) -> Self {
        Self {
            ttl: TimeDelta::from_std(ttl).unwrap_or(TimeDelta::MAX),
            entries: RwLock::new(HashMap::new()),
        }
    }

    pub fn from_config(config: &CacheConfig) -> Self {
        Self::new(config.ttl())
    }

    pub fn ttl(&self) -> TimeDelta {
        self.ttl
    }

    /// Current entry for `key`, fresh or not.
    pub fn get(&self, key: &LogicalKey) -> Option<Arc<CacheEntry>> {
        self.read().get(key).cloned()
    }

    /// Entry for `key` only if it may be trusted without a refresh.
    pub fn get_fresh(&self, key: &LogicalKey) -> Option<Arc<CacheEntry>> {
        self.get(key)
            .filter(|entry| entry.is_fresh_at(Utc::now(), self.ttl))
    }

    pub fn is_fresh(&self, key: &LogicalKey) -> bool {
        self.is_fresh_at(key, Utc::now())
    }

    /// Freshness of `key` as seen at `now`.
    pub fn is_fresh_at(&self, key: &LogicalKey, now: DateTime<Utc>) -> bool {
        self.get(key)
            .is_some_and(|entry| entry.is_fresh_at(now, self.ttl))
    }

    /// Replace the entry for `key` with a complete row set.
    pub fn put(&self, key: &LogicalKey, rows: Vec<AnnouncementRow>) -> Arc<CacheEntry> {
        self.store(key, rows, Completeness::Complete)
    }

    /// Replace the entry for `key` with a best-effort row set.
    pub fn put_partial(
        &self,
        key: &LogicalKey,
        rows: Vec<AnnouncementRow>,
        reason: impl Into<String>,
    ) -> Arc<CacheEntry> {
        self.store(
            key,
            rows,
            Completeness::Partial {
                reason: reason.into(),
            },
        )
    }

    /// Replace the entry for `key` with rows cut off at `max_pages`.
    pub fn put_truncated(
        &self,
        key: &LogicalKey,
        rows: Vec<AnnouncementRow>,
        max_pages: u32,
    ) -> Arc<CacheEntry> {
        self.store(key, rows, Completeness::Truncated { max_pages })
    }

    /// Validate untyped rows and store them as a complete set.
    ///
    /// The write is refused as a whole if any row is not exactly five wide.
    pub fn put_raw(&self, key: &LogicalKey, rows: Vec<Vec<String>>) -> Result<Arc<CacheEntry>> {
        let rows = rows
            .into_iter()
            .map(AnnouncementRow::try_from)
            .collect::<Result<Vec<_>>>()
            .inspect_err(|e| log::error!("Refusing cache write for '{}': {}", key, e))?;
        Ok(self.put(key, rows))
    }

    /// Projected view of the entry for `key`.
    pub fn projected(&self, key: &LogicalKey) -> Option<Vec<AnnouncementRecord>> {
        self.get(key).map(|entry| entry.records())
    }

    /// Drop the entry for `key`, forcing the next read to refresh.
    pub fn invalidate(&self, key: &LogicalKey) -> bool {
        self.write().remove(key).is_some()
    }

    pub fn keys(&self) -> Vec<LogicalKey> {
        let mut keys: Vec<_> = self.read().keys().cloned().collect();
        keys.sort();
        keys
    }

    pub fn len(&self) -> usize {
        self.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.read().is_empty()
    }

    fn store(
        &self,
        key: &LogicalKey,
        rows: Vec<AnnouncementRow>,
        completeness: Completeness,
    ) -> Arc<CacheEntry> {
        let entry = Arc::new(CacheEntry {
            key: key.clone(),
            fingerprint: fingerprint(&rows),
            rows,
            last_refreshed: Utc::now(),
            completeness,
        });

        let previous = self.write().insert(key.clone(), Arc::clone(&entry));
        let changed = previous.is_none_or(|p| p.fingerprint != entry.fingerprint);
        log::info!(
            "Cache updated for '{}': {} items ({}){}",
            key,
            entry.len(),
            entry.completeness.label(),
            if changed { "" } else { ", unchanged" }
        );
        entry
    }

    fn read(&self) -> std::sync::RwLockReadGuard<'_, HashMap<LogicalKey, Arc<CacheEntry>>> {
        self.entries.read().unwrap_or_else(PoisonError::into_inner)
    }

    fn write(&self) -> std::sync::RwLockWriteGuard<'_, HashMap<LogicalKey, Arc<CacheEntry>>> {
        self.entries.write().unwrap_or_else(PoisonError::into_inner)
    }
}

impl Default for SharedCache {
    fn default() -> Self {
        Self::from_config(&CacheConfig::default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    fn key(raw: &str) -> LogicalKey {
        LogicalKey::parse(raw).unwrap()
    }

    fn rows(n: usize) -> Vec<AnnouncementRow> {
        (0..n)
            .map(|i| AnnouncementRow::new(i.to_string(), "t", "a", "1", "2024-01-01"))
            .collect()
    }

    #[test]
    fn miss_is_not_fresh() {
        let cache = SharedCache::default();
        assert!(cache.get(&key("computer")).is_none());
        assert!(!cache.is_fresh(&key("computer")));
    }

    #[test]
    fn ttl_boundary() {
        let cache = SharedCache::new(Duration::from_secs(1800));
        let k = key("computer");
        let written = cache.put(&k, rows(2)).last_refreshed;

        assert!(cache.is_fresh_at(&k, written + TimeDelta::seconds(1799)));
        assert!(!cache.is_fresh_at(&k, written + TimeDelta::seconds(1800)));
        assert!(!cache.is_fresh_at(&k, written + TimeDelta::seconds(1801)));
        // Stale entries stay readable.
        assert_eq!(cache.get(&k).unwrap().len(), 2);
    }

    #[test]
    fn put_replaces_wholesale() {
        let cache = SharedCache::default();
        let k = key("computer");
        cache.put(&k, rows(5));
        let second = cache.put(&k, rows(2));
        assert_eq!(cache.get(&k).unwrap().rows, second.rows);
        assert_eq!(cache.len(), 1);
    }

    #[test]
    fn partial_entries_are_never_fresh() {
        let cache = SharedCache::default();
        let k = key("computer");
        let entry = cache.put_partial(&k, rows(3), "network error");
        assert!(!entry.is_complete());
        assert!(!cache.is_fresh(&k));
        assert!(cache.get_fresh(&k).is_none());
        assert_eq!(cache.get(&k).unwrap().len(), 3);
    }

    #[test]
    fn truncated_entries_follow_the_ttl() {
        let cache = SharedCache::new(Duration::from_secs(1800));
        let k = key("computer");
        let entry = cache.put_truncated(&k, rows(3), 50);
        assert!(!entry.is_complete());
        assert!(entry.is_trusted());
        assert!(cache.get_fresh(&k).is_some());
        assert!(!cache.is_fresh_at(&k, entry.last_refreshed + TimeDelta::seconds(1800)));
    }

    #[test]
    fn put_raw_refuses_any_wrong_width_row() {
        let cache = SharedCache::default();
        let k = key("computer");
        for len in 0..=10 {
            let mut raw: Vec<Vec<String>> = rows(2).into_iter().map(Vec::from).collect();
            raw.push((0..len).map(|i| i.to_string()).collect());
            let result = cache.put_raw(&k, raw);
            if len == 5 {
                assert_eq!(result.unwrap().len(), 3);
            } else {
                assert!(matches!(result, Err(AppError::InvalidShape { .. })));
            }
        }
        for entry_row in &cache.get(&k).unwrap().rows {
            assert_eq!(entry_row.fields().len(), 5);
        }
    }

    #[test]
    fn refused_write_keeps_previous_entry() {
        let cache = SharedCache::default();
        let k = key("computer");
        cache.put(&k, rows(4));
        let bad = vec![vec!["1".to_string(), "Title".to_string()]];
        assert!(cache.put_raw(&k, bad).is_err());
        assert_eq!(cache.get(&k).unwrap().len(), 4);
    }

    #[test]
    fn projected_view_matches_rows() {
        let cache = SharedCache::default();
        let k = key("electrical");
        cache.put(&k, rows(3));
        let records = cache.projected(&k).unwrap();
        let ids: Vec<_> = records.iter().map(|r| r.id.as_str()).collect();
        assert_eq!(ids, ["0", "1", "2"]);
        assert!(cache.projected(&key("computer")).is_none());
    }

    #[test]
    fn invalidate_removes_entry() {
        let cache = SharedCache::default();
        let k = key("computer");
        cache.put(&k, rows(1));
        assert!(cache.invalidate(&k));
        assert!(!cache.invalidate(&k));
        assert!(cache.is_empty());
    }

    proptest! {
        #[test]
        fn only_five_wide_rows_are_accepted(widths in proptest::collection::vec(0usize..=10, 0..8)) {
            let cache = SharedCache::default();
            let k = key("computer");
            let raw: Vec<Vec<String>> = widths
                .iter()
                .map(|w| (0..*w).map(|i| i.to_string()).collect())
                .collect();
            let all_valid = widths.iter().all(|w| *w == 5);
            match cache.put_raw(&k, raw) {
                Ok(entry) => {
                    prop_assert!(all_valid);
                    prop_assert!(entry.rows.iter().all(|r| r.fields().len() == 5));
                }
                Err(e) => {
                    prop_assert!(!all_valid);
                    let is_shape_error = matches!(e, AppError::InvalidShape { .. });
                    prop_assert!(is_shape_error);
                }
            }
        }
    }
}
