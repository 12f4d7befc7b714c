//! Time-window cache for binned access statistics
//!
//! Windows are identified by their rounded (endTime, rangeSec, binSec)
//! triple. Entries are immutable once inserted and are evicted strictly
//! in load order, one at a time, once the cache exceeds its bound. There
//! is no TTL; a window stays valid until it ages out.

use std::collections::{BTreeMap, HashMap};

use crate::api::types::AccessResponse;
use crate::constants::cache::MAX_CACHE_SIZE;
use crate::error::{Result, StatsError};

/// Identifies one fetched slice of time-series data
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct WindowKey {
    /// Window end, epoch ms, rounded down to whole seconds
    pub end_time_ms: i64,
    /// Window span in seconds
    pub range_sec: i64,
    /// Bin width in seconds
    pub bin_sec: i64,
}

impl WindowKey {
    /// Build a deterministic key from a raw view triple
    pub fn new(end_time_ms: i64, range_sec: i64, bin_sec: i64) -> Self {
        Self {
            end_time_ms: (end_time_ms / 1000) * 1000,
            range_sec,
            bin_sec,
        }
    }

    /// Start of the window, epoch ms
    pub fn start_ms(&self) -> i64 {
        self.end_time_ms - self.range_sec * 1000
    }

    /// The window immediately preceding this one (shifted by one range)
    pub fn previous(&self) -> Self {
        Self {
            end_time_ms: self.end_time_ms - self.range_sec * 1000,
            ..*self
        }
    }

    /// The window immediately following this one (shifted by one range)
    pub fn next(&self) -> Self {
        Self {
            end_time_ms: self.end_time_ms + self.range_sec * 1000,
            ..*self
        }
    }
}

/// One fetched, validated window of binned counts
#[derive(Debug, Clone)]
pub struct StatsWindow {
    pub key: WindowKey,

    /// Bin start timestamps, epoch ms, strictly increasing
    pub bins: Vec<i64>,

    /// Per-category counts, each parallel to `bins`
    pub counts: BTreeMap<String, Vec<f64>>,

    /// Total counts across categories, parallel to `bins` (may be empty)
    pub total: Vec<f64>,

    /// Server-declared [min, max] available range, if reported
    pub available: Option<(i64, i64)>,

    /// Categories observed in this fetch
    pub categories: Vec<String>,
}

impl StatsWindow {
    /// Validate and normalize a raw response into a window.
    ///
    /// Enforces the parallel-array invariant: every category's count
    /// sequence must match the bin sequence in length.
    pub fn from_response(key: WindowKey, resp: AccessResponse) -> Result<Self> {
        if resp.bins.is_empty() {
            return Err(StatsError::MalformedResponse(
                "bin sequence missing or empty".to_string(),
            ));
        }
        if resp.bins.windows(2).any(|pair| pair[0] >= pair[1]) {
            return Err(StatsError::MalformedResponse(
                "bin timestamps not strictly increasing".to_string(),
            ));
        }
        for (category, counts) in &resp.counts_by_type {
            if counts.len() != resp.bins.len() {
                return Err(StatsError::MalformedResponse(format!(
                    "counts for '{}' have {} entries, expected {}",
                    category,
                    counts.len(),
                    resp.bins.len()
                )));
            }
        }
        if !resp.total.is_empty() && resp.total.len() != resp.bins.len() {
            return Err(StatsError::MalformedResponse(format!(
                "total has {} entries, expected {}",
                resp.total.len(),
                resp.bins.len()
            )));
        }

        let available = match (resp.meta.available_min, resp.meta.available_max) {
            (Some(min), Some(max)) => Some((min, max)),
            _ => None,
        };
        let categories = if resp.meta.types.is_empty() {
            resp.counts_by_type.keys().cloned().collect()
        } else {
            resp.meta.types
        };

        Ok(Self {
            key,
            bins: resp.bins,
            counts: resp.counts_by_type,
            total: resp.total,
            available,
            categories,
        })
    }
}

struct CacheEntry {
    window: StatsWindow,
    loaded: u64,
}

/// Bounded keyed cache of fetched windows.
///
/// Eviction is by load order (not access order): once an insertion
/// pushes the cache over its bound, the entry with the oldest load
/// sequence is dropped.
pub struct WindowCache {
    entries: HashMap<WindowKey, CacheEntry>,
    load_seq: u64,
    max_entries: usize,
}

impl WindowCache {
    pub fn new(max_entries: usize) -> Self {
        Self {
            entries: HashMap::new(),
            load_seq: 0,
            max_entries,
        }
    }

    pub fn get(&self, key: &WindowKey) -> Option<&StatsWindow> {
        self.entries.get(key).map(|entry| &entry.window)
    }

    pub fn contains(&self, key: &WindowKey) -> bool {
        self.entries.contains_key(key)
    }

    /// Insert a freshly loaded window, evicting the oldest load once the
    /// bound is exceeded
    pub fn insert(&mut self, window: StatsWindow) {
        self.load_seq += 1;
        self.entries.insert(
            window.key,
            CacheEntry {
                window,
                loaded: self.load_seq,
            },
        );
        while self.entries.len() > self.max_entries {
            let oldest = self
                .entries
                .iter()
                .min_by_key(|(_, entry)| entry.loaded)
                .map(|(key, _)| *key);
            match oldest {
                Some(key) => {
                    self.entries.remove(&key);
                }
                None => break,
            }
        }
    }

    /// Iterate over all cached windows, in no particular order
    pub fn windows(&self) -> impl Iterator<Item = &StatsWindow> {
        self.entries.values().map(|entry| &entry.window)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl Default for WindowCache {
    fn default() -> Self {
        Self::new(MAX_CACHE_SIZE)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn window(end_time_ms: i64) -> StatsWindow {
        StatsWindow {
            key: WindowKey::new(end_time_ms, 3600, 60),
            bins: vec![end_time_ms - 120_000, end_time_ms - 60_000],
            counts: BTreeMap::new(),
            total: Vec::new(),
            available: None,
            categories: Vec::new(),
        }
    }

    #[test]
    fn test_key_rounds_to_whole_seconds() {
        let key = WindowKey::new(1_700_000_000_789, 3600, 60);
        assert_eq!(key.end_time_ms, 1_700_000_000_000);
        assert_eq!(key, WindowKey::new(1_700_000_000_123, 3600, 60));
    }

    #[test]
    fn test_key_neighbors_shift_by_one_range() {
        let key = WindowKey::new(1_700_000_000_000, 3600, 60);
        assert_eq!(key.previous().end_time_ms, 1_700_000_000_000 - 3_600_000);
        assert_eq!(key.next().end_time_ms, 1_700_000_000_000 + 3_600_000);
        assert_eq!(key.start_ms(), 1_700_000_000_000 - 3_600_000);
    }

    #[test]
    fn test_eviction_drops_least_recently_loaded() {
        let mut cache = WindowCache::new(3);
        let keys: Vec<WindowKey> = (0..4)
            .map(|i| {
                let w = window(1_700_000_000_000 + i * 3_600_000);
                let key = w.key;
                cache.insert(w);
                key
            })
            .collect();

        assert_eq!(cache.len(), 3);
        // The first-loaded window is gone, the rest remain
        assert!(!cache.contains(&keys[0]));
        assert!(cache.contains(&keys[1]));
        assert!(cache.contains(&keys[3]));
    }

    #[test]
    fn test_eviction_is_by_load_order_not_access_order() {
        let mut cache = WindowCache::new(2);
        let first = window(1_700_000_000_000);
        let first_key = first.key;
        cache.insert(first);
        cache.insert(window(1_700_003_600_000));

        // Touching the oldest entry does not protect it
        let _ = cache.get(&first_key);
        cache.insert(window(1_700_007_200_000));

        assert!(!cache.contains(&first_key));
        assert_eq!(cache.len(), 2);
    }

    #[test]
    fn test_reinsert_refreshes_load_order() {
        let mut cache = WindowCache::new(2);
        let first = window(1_700_000_000_000);
        let first_key = first.key;
        cache.insert(first.clone());
        cache.insert(window(1_700_003_600_000));
        // Re-loading the first window makes the second the oldest
        cache.insert(first);
        cache.insert(window(1_700_007_200_000));

        assert!(cache.contains(&first_key));
        assert!(!cache.contains(&WindowKey::new(1_700_003_600_000, 3600, 60)));
    }

    #[test]
    fn test_from_response_rejects_length_mismatch() {
        let body = r#"{
            "meta": {},
            "bins": [1705320000000, 1705320060000],
            "countsByType": { "cmd": [1] },
            "total": []
        }"#;
        let resp: crate::api::types::AccessResponse = serde_json::from_str(body).unwrap();
        let key = WindowKey::new(1_705_320_120_000, 3600, 60);
        assert!(matches!(
            StatsWindow::from_response(key, resp),
            Err(StatsError::MalformedResponse(_))
        ));
    }

    #[test]
    fn test_from_response_rejects_unordered_bins() {
        let body = r#"{
            "meta": {},
            "bins": [1705320060000, 1705320000000],
            "countsByType": {},
            "total": []
        }"#;
        let resp: crate::api::types::AccessResponse = serde_json::from_str(body).unwrap();
        let key = WindowKey::new(1_705_320_120_000, 3600, 60);
        assert!(StatsWindow::from_response(key, resp).is_err());
    }

    #[test]
    fn test_from_response_falls_back_to_observed_categories() {
        let body = r#"{
            "meta": { "availableMin": 1705000000000, "availableMax": 1705400000000 },
            "bins": [1705320000000],
            "countsByType": { "cmd": [3], "chat": [1] },
            "total": [4]
        }"#;
        let resp: crate::api::types::AccessResponse = serde_json::from_str(body).unwrap();
        let key = WindowKey::new(1_705_320_060_000, 3600, 60);
        let window = StatsWindow::from_response(key, resp).unwrap();
        assert_eq!(window.categories, vec!["chat", "cmd"]);
        assert_eq!(window.available, Some((1_705_000_000_000, 1_705_400_000_000)));
    }
}
