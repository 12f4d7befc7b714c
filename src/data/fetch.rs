//! Fetch controller: cache-fronted, coalescing window fetches
//!
//! Owns the window cache and the in-flight table. Everything here runs
//! on the UI thread, so the cache check, the in-flight check, and the
//! request start are atomic with respect to any other caller; two
//! back-to-back requests for the same key always collapse onto one
//! network call.
//!
//! Every view-driving request carries the controller's sequence number.
//! A result whose number no longer matches when it arrives is discarded:
//! it may still be cached, but it neither renders nor clears loading or
//! error state. `cancel_pending` bumps the sequence, which is how
//! teardown invalidates everything still in flight without aborting the
//! underlying network calls.

use std::collections::HashMap;

use log::{debug, warn};

use crate::api::client::StatsClient;
use crate::api::types::{InsightsResponse, LightsResponse, SummaryResponse};
use crate::data::cache::{StatsWindow, WindowCache, WindowKey};
use crate::data::worker::{FetchOrigin, FetchWorker, WorkerRequest, WorkerResult};
use crate::error::{Result, StatsError};

/// Outcome of a window request, from the caller's perspective
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FetchOutcome {
    /// Window already cached; no network access
    Hit,
    /// A request for this key was already in flight; the caller adopted it
    Coalesced,
    /// A new request was handed to the worker
    Started,
}

/// Events produced by draining completed worker results.
///
/// Window events are only emitted while their sequence number still
/// matches the controller; section events pass through with their own
/// sequence for the owning section to judge.
pub enum FetchEvent {
    WindowLoaded { key: WindowKey, seq: u64 },
    WindowFailed { seq: u64, error: StatsError },
    Summary { seq: u64, result: Result<SummaryResponse> },
    Insights { seq: u64, result: Result<InsightsResponse> },
    Lights { seq: u64, result: Result<LightsResponse> },
}

/// Cache-fronted fetch pipeline for stat windows and section data
pub struct FetchController {
    cache: WindowCache,
    in_flight: HashMap<WindowKey, FetchOrigin>,
    worker: FetchWorker,
    seq: u64,
    /// Last known server-declared [min, max] available range
    available: Option<(i64, i64)>,
}

impl FetchController {
    pub fn new(client: StatsClient) -> Self {
        Self {
            cache: WindowCache::default(),
            in_flight: HashMap::new(),
            worker: FetchWorker::spawn(client),
            seq: 0,
            available: None,
        }
    }

    pub fn cache(&self) -> &WindowCache {
        &self.cache
    }

    /// Current request sequence; results tagged with an older value are stale
    pub fn current_sequence(&self) -> u64 {
        self.seq
    }

    /// Invalidate every in-flight view request (teardown or supersession)
    pub fn cancel_pending(&mut self) {
        self.seq += 1;
    }

    /// Last known server-declared available range, epoch ms
    pub fn available_range(&self) -> Option<(i64, i64)> {
        self.available
    }

    pub fn has_in_flight(&self) -> bool {
        !self.in_flight.is_empty()
    }

    pub fn is_in_flight(&self, key: &WindowKey) -> bool {
        self.in_flight.contains_key(key)
    }

    /// Request the window for the current view.
    ///
    /// Bumps the sequence, so whatever was previously in flight for the
    /// view becomes stale. Cache hits return synchronously; an identical
    /// in-flight request is adopted instead of duplicated.
    pub fn fetch(&mut self, key: WindowKey) -> (u64, FetchOutcome) {
        self.seq += 1;
        let seq = self.seq;

        if self.cache.contains(&key) {
            return (seq, FetchOutcome::Hit);
        }

        if let Some(origin) = self.in_flight.get_mut(&key) {
            // The pending request now answers to the newest caller
            *origin = FetchOrigin::View { seq };
            debug!("coalesced window fetch onto in-flight request: {:?}", key);
            return (seq, FetchOutcome::Coalesced);
        }

        let origin = FetchOrigin::View { seq };
        self.in_flight.insert(key, origin);
        self.worker.request(WorkerRequest::Window { key, origin });
        (seq, FetchOutcome::Started)
    }

    /// Speculative fetch: no sequence bump, no surfaced errors
    fn prefetch(&mut self, key: WindowKey) {
        if self.cache.contains(&key) || self.in_flight.contains_key(&key) {
            return;
        }
        debug!("prefetching adjacent window: {:?}", key);
        self.in_flight.insert(key, FetchOrigin::Prefetch);
        self.worker.request(WorkerRequest::Window {
            key,
            origin: FetchOrigin::Prefetch,
        });
    }

    /// Prefetch the windows one range before and after `key`.
    ///
    /// The preceding window is skipped when its start would precede the
    /// declared minimum; the following window when it would fall entirely
    /// after the declared maximum. Metadata from the just-loaded window
    /// wins over the last known range.
    fn prefetch_adjacent(&mut self, key: WindowKey, window_available: Option<(i64, i64)>) {
        let available = window_available.or(self.available);

        let previous = key.previous();
        let skip_previous =
            matches!(available, Some((min, _)) if previous.start_ms() < min);
        if skip_previous {
            debug!("skipping prefetch before available range: {:?}", previous);
        } else {
            self.prefetch(previous);
        }

        let next = key.next();
        let skip_next = matches!(available, Some((_, max)) if next.start_ms() >= max);
        if skip_next {
            debug!("skipping prefetch after available range: {:?}", next);
        } else {
            self.prefetch(next);
        }
    }

    /// Fetch aggregate counters for the totals section
    pub fn fetch_summary(&self, refresh: bool, seq: u64) {
        self.worker.request(WorkerRequest::Summary { refresh, seq });
    }

    /// Fetch outage/load insights for the cards section
    pub fn fetch_insights(&self, seq: u64) {
        self.worker.request(WorkerRequest::Insights { seq });
    }

    /// Fetch light events for the outage overlay
    pub fn fetch_lights(&self, start_ms: i64, end_ms: i64, seq: u64) {
        self.worker.request(WorkerRequest::Lights { start_ms, end_ms, seq });
    }

    /// Drain completed worker results, updating the cache and in-flight
    /// table, and return the events that are still current.
    pub fn drain(&mut self) -> Vec<FetchEvent> {
        let mut events = Vec::new();
        while let Some(result) = self.worker.poll() {
            match result {
                WorkerResult::Window { key, origin: _, result } => {
                    let normalized =
                        result.and_then(|resp| StatsWindow::from_response(key, resp));
                    if let Some(event) = self.handle_window_result(key, normalized) {
                        events.push(event);
                    }
                }
                WorkerResult::Summary { seq, result } => {
                    events.push(FetchEvent::Summary { seq, result });
                }
                WorkerResult::Insights { seq, result } => {
                    events.push(FetchEvent::Insights { seq, result });
                }
                WorkerResult::Lights { seq, result } => {
                    events.push(FetchEvent::Lights { seq, result });
                }
            }
        }
        events
    }

    /// Apply one settled window request.
    ///
    /// The in-flight table entry, not the worker's echo, decides who the
    /// result answers to: coalescing may have handed the request to a
    /// newer sequence while it was in flight. The entry is removed
    /// unconditionally, success or failure.
    fn handle_window_result(
        &mut self,
        key: WindowKey,
        result: Result<StatsWindow>,
    ) -> Option<FetchEvent> {
        let origin = self.in_flight.remove(&key);
        match result {
            Ok(window) => {
                if let Some(available) = window.available {
                    self.available = Some(available);
                }
                let window_available = window.available;
                self.cache.insert(window);
                match origin {
                    Some(FetchOrigin::View { seq }) if seq == self.seq => {
                        self.prefetch_adjacent(key, window_available);
                        Some(FetchEvent::WindowLoaded { key, seq })
                    }
                    Some(FetchOrigin::View { seq }) => {
                        debug!("discarding stale window result (seq {} < {})", seq, self.seq);
                        None
                    }
                    Some(FetchOrigin::Prefetch) | None => None,
                }
            }
            Err(error) => match origin {
                Some(FetchOrigin::View { seq }) if seq == self.seq => {
                    Some(FetchEvent::WindowFailed { seq, error })
                }
                Some(FetchOrigin::Prefetch) => {
                    warn!("prefetch failed (ignored): {}", error);
                    None
                }
                _ => {
                    debug!("discarding stale fetch error: {}", error);
                    None
                }
            },
        }
    }
}
