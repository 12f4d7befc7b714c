//! Application-wide constants and default values
//!
//! This module centralizes the tuning knobs for caching, range selection,
//! and the upstream statistics API.

/// Window cache tuning
pub mod cache {
    /// Maximum number of cached stat windows before eviction kicks in
    pub const MAX_CACHE_SIZE: usize = 20;
}

/// Range selection and zoom behavior
pub mod range {
    /// Debounce window for pan/zoom gestures (milliseconds)
    pub const ZOOM_DEBOUNCE_MS: u64 = 250;

    /// Absolute floor for the sticky-snap tolerance (seconds)
    pub const SNAP_TOLERANCE_MIN_SEC: f64 = 2.0;

    /// Sticky-snap tolerance as a fraction of the active zoom limit
    pub const SNAP_TOLERANCE_FRACTION: f64 = 0.01;

    /// Tolerance for re-matching a committed span against a preset (seconds)
    pub const PRESET_MATCH_TOLERANCE_SEC: i64 = 1;

    /// Gestures moving both end time and span by less than this are ignored (seconds)
    pub const NOOP_SUPPRESS_SEC: f64 = 1.0;

    /// Hard floor for zooming in (seconds)
    pub const MIN_ZOOM_SPAN_SEC: i64 = 60;

    /// Zooming in is also limited to one-seventh of the active preset span
    pub const ZOOM_IN_DIVISOR: i64 = 7;

    /// Fallback span for "All" before the server range is known (30 days)
    pub const ALL_FALLBACK_SPAN_SEC: i64 = 30 * 24 * 3600;
}

/// Upstream statistics API
pub mod api {
    /// Default base URL of the stats service
    pub const DEFAULT_BASE_URL: &str = "http://127.0.0.1:8900";

    /// Environment variable overriding the base URL
    pub const BASE_URL_ENV: &str = "HITSCOPE_API";

    /// HTTP request timeout (seconds)
    pub const REQUEST_TIMEOUT_SEC: u64 = 30;
}

/// UI layout defaults
pub mod layout {
    /// Insight cards panel width
    pub const CARDS_PANEL_WIDTH: f32 = 300.0;

    /// Minimum chart height
    pub const MIN_CHART_HEIGHT: f32 = 200.0;
}
