//! Merged series assembly
//!
//! Folds every cached window into per-category time series for the
//! chart, plus the outage-interval pairing for the light overlay.
//! Overlapping bins at the same timestamp are summed, not replaced; the
//! Y-axis scaling downstream assumes additive composition.

use std::collections::BTreeMap;

use crate::api::types::LightEvent;
use crate::data::cache::WindowCache;

/// Per-category merged time series, each sorted by timestamp
#[derive(Debug, Clone, Default)]
pub struct MergedSeries {
    /// Category -> (epoch ms, count) points
    pub by_category: BTreeMap<String, Vec<[f64; 2]>>,
    /// Total counts across categories
    pub total: Vec<[f64; 2]>,
}

impl MergedSeries {
    /// Fold all cached windows into sorted, deduplicated series
    pub fn from_cache(cache: &WindowCache) -> Self {
        profiling::scope!("merge_series");

        let mut by_category: BTreeMap<String, BTreeMap<i64, f64>> = BTreeMap::new();
        let mut total: BTreeMap<i64, f64> = BTreeMap::new();

        for window in cache.windows() {
            for (category, counts) in &window.counts {
                let series = by_category.entry(category.clone()).or_default();
                for (&ts, &count) in window.bins.iter().zip(counts) {
                    *series.entry(ts).or_insert(0.0) += count;
                }
            }
            for (&ts, &count) in window.bins.iter().zip(&window.total) {
                *total.entry(ts).or_insert(0.0) += count;
            }
        }

        Self {
            by_category: by_category
                .into_iter()
                .map(|(category, points)| (category, to_points(points)))
                .collect(),
            total: to_points(total),
        }
    }

    /// Restrict every series to the visible [start, end] interval
    pub fn visible(&self, start_ms: i64, end_ms: i64) -> MergedSeries {
        let clip = |points: &Vec<[f64; 2]>| {
            points
                .iter()
                .copied()
                .filter(|p| p[0] >= start_ms as f64 && p[0] <= end_ms as f64)
                .collect::<Vec<_>>()
        };
        MergedSeries {
            by_category: self
                .by_category
                .iter()
                .map(|(category, points)| (category.clone(), clip(points)))
                .collect(),
            total: clip(&self.total),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.by_category.values().all(|points| points.is_empty()) && self.total.is_empty()
    }
}

fn to_points(map: BTreeMap<i64, f64>) -> Vec<[f64; 2]> {
    map.into_iter().map(|(ts, v)| [ts as f64, v]).collect()
}

/// One contiguous lights-off interval; `end_ms` is None while still off
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct OutageInterval {
    pub start_ms: i64,
    pub end_ms: Option<i64>,
}

/// Pair an ordered on/off event stream into outage intervals.
///
/// Repeated same-state events collapse into the interval already open.
pub fn outage_intervals(events: &[LightEvent]) -> Vec<OutageInterval> {
    let mut intervals = Vec::new();
    let mut off_since: Option<i64> = None;

    for event in events {
        match (event.on, off_since) {
            (false, None) => off_since = Some(event.ts),
            (true, Some(start)) => {
                intervals.push(OutageInterval {
                    start_ms: start,
                    end_ms: Some(event.ts),
                });
                off_since = None;
            }
            _ => {}
        }
    }

    if let Some(start) = off_since {
        intervals.push(OutageInterval {
            start_ms: start,
            end_ms: None,
        });
    }
    intervals
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::cache::{StatsWindow, WindowKey};

    fn window(end_time_ms: i64, bins: Vec<i64>, counts: Vec<(&str, Vec<f64>)>) -> StatsWindow {
        StatsWindow {
            key: WindowKey::new(end_time_ms, 3600, 60),
            bins,
            counts: counts
                .into_iter()
                .map(|(category, values)| (category.to_string(), values))
                .collect(),
            total: Vec::new(),
            available: None,
            categories: Vec::new(),
        }
    }

    #[test]
    fn test_overlapping_bins_are_summed() {
        let mut cache = WindowCache::new(10);
        let (t1, t2, t3) = (1_000, 2_000, 3_000);
        cache.insert(window(t2, vec![t1, t2], vec![("cmd", vec![5.0, 7.0])]));
        cache.insert(window(t3, vec![t2, t3], vec![("cmd", vec![3.0, 9.0])]));

        let merged = MergedSeries::from_cache(&cache);
        let cmd = &merged.by_category["cmd"];
        assert_eq!(
            cmd,
            &vec![[t1 as f64, 5.0], [t2 as f64, 10.0], [t3 as f64, 9.0]]
        );
    }

    #[test]
    fn test_merge_is_sorted_across_windows() {
        let mut cache = WindowCache::new(10);
        // Later-loaded window covers earlier timestamps
        cache.insert(window(9_000, vec![8_000, 9_000], vec![("cmd", vec![1.0, 1.0])]));
        cache.insert(window(3_000, vec![2_000, 3_000], vec![("cmd", vec![1.0, 1.0])]));

        let merged = MergedSeries::from_cache(&cache);
        let timestamps: Vec<f64> = merged.by_category["cmd"].iter().map(|p| p[0]).collect();
        assert_eq!(timestamps, vec![2_000.0, 3_000.0, 8_000.0, 9_000.0]);
    }

    #[test]
    fn test_visible_filters_to_interval() {
        let mut cache = WindowCache::new(10);
        cache.insert(window(
            4_000,
            vec![1_000, 2_000, 3_000, 4_000],
            vec![("cmd", vec![1.0, 2.0, 3.0, 4.0])],
        ));

        let merged = MergedSeries::from_cache(&cache);
        let visible = merged.visible(2_000, 3_000);
        assert_eq!(
            visible.by_category["cmd"],
            vec![[2_000.0, 2.0], [3_000.0, 3.0]]
        );
    }

    #[test]
    fn test_total_series_merges_like_categories() {
        let mut cache = WindowCache::new(10);
        let mut first = window(2_000, vec![1_000, 2_000], vec![]);
        first.total = vec![4.0, 6.0];
        let mut second = window(3_000, vec![2_000, 3_000], vec![]);
        second.total = vec![1.0, 2.0];
        cache.insert(first);
        cache.insert(second);

        let merged = MergedSeries::from_cache(&cache);
        assert_eq!(
            merged.total,
            vec![[1_000.0, 4.0], [2_000.0, 7.0], [3_000.0, 2.0]]
        );
    }

    #[test]
    fn test_outage_pairing() {
        let events = vec![
            LightEvent { ts: 100, on: true },
            LightEvent { ts: 200, on: false },
            LightEvent { ts: 250, on: false }, // repeated off, same interval
            LightEvent { ts: 300, on: true },
            LightEvent { ts: 500, on: false },
        ];
        let intervals = outage_intervals(&events);
        assert_eq!(
            intervals,
            vec![
                OutageInterval { start_ms: 200, end_ms: Some(300) },
                OutageInterval { start_ms: 500, end_ms: None },
            ]
        );
    }

    #[test]
    fn test_outage_pairing_empty() {
        assert!(outage_intervals(&[]).is_empty());
    }
}
