//! Application state management
//!
//! Organizes the dashboard state into focused modules: the range/zoom
//! state machine, per-section fetch state, and display options.

mod range;
mod sections;
mod view;

pub use range::{Debouncer, Preset, RangeController, RangeView, Selection};
pub use sections::{ChartStatus, SectionState};
pub use view::ViewState;

use crate::api::types::{InsightsResponse, LightsResponse, SummaryResponse};

/// Main application state container
pub struct AppState {
    /// Display options
    pub view: ViewState,

    /// Range/zoom state machine for the chart
    pub range: RangeController,

    /// Chart section status; the series data lives in the window cache
    pub chart: ChartStatus,

    /// Aggregate counters section
    pub totals: SectionState<SummaryResponse>,

    /// Outage/load insight cards section
    pub insights: SectionState<InsightsResponse>,

    /// Light on/off events for the outage overlay
    pub lights: SectionState<LightsResponse>,
}

impl AppState {
    pub fn new(now_ms: i64) -> Self {
        Self {
            view: ViewState::default(),
            range: RangeController::new(now_ms),
            chart: ChartStatus::default(),
            totals: SectionState::default(),
            insights: SectionState::default(),
            lights: SectionState::default(),
        }
    }

    /// True while any section still has a request outstanding
    pub fn anything_loading(&self) -> bool {
        self.chart.loading
            || self.totals.loading
            || self.insights.loading
            || self.lights.loading
    }
}
