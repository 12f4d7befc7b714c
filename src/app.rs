//! Application shell
//!
//! Owns the fetch controller and the range state machine, drains worker
//! results once per frame, and lays out the dashboard sections.

use std::time::{Duration, Instant};

use eframe::App;
use eframe::egui::{self, CentralPanel};
use egui_extras::{Size, StripBuilder};

use crate::api::client::StatsClient;
use crate::constants;
use crate::data::cache::WindowKey;
use crate::data::fetch::{FetchController, FetchEvent, FetchOutcome};
use crate::data::series::MergedSeries;
use crate::error::StatsError;
use crate::state::{AppState, Preset, RangeView};
use crate::ui;

pub struct HitScope {
    pub state: AppState,
    pub fetcher: FetchController,

    /// Merged view over every cached window, rebuilt when the cache changes
    pub merged: MergedSeries,

    /// X-bounds the plot showed last frame, for detecting user gestures
    pub last_plot_bounds: Option<(f64, f64)>,

    base_url: String,
}

impl HitScope {
    pub fn new(base_url: String) -> Result<Self, StatsError> {
        let client = StatsClient::new(base_url.clone())?;
        let now_ms = chrono::Utc::now().timestamp_millis();

        let mut app = Self {
            state: AppState::new(now_ms),
            fetcher: FetchController::new(client),
            merged: MergedSeries::default(),
            last_plot_bounds: None,
            base_url,
        };

        let view = app.state.range.view();
        app.request_view_window(view);
        app.on_refresh_summary(false);
        app.refresh_insights();
        Ok(app)
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Preset button pressed: immediate transition, bounds pushed to the plot
    pub fn on_select_preset(&mut self, preset: Preset) {
        let now_ms = chrono::Utc::now().timestamp_millis();
        let view = self
            .state
            .range
            .select_preset(preset, now_ms, self.fetcher.available_range());
        self.state.view.reset_bounds = true;
        self.request_view_window(view);
    }

    /// Raw plot gesture; the range controller debounces the commit
    pub fn on_zoom_gesture(&mut self, a_ms: f64, b_ms: f64) {
        self.state.range.zoom_gesture(a_ms, b_ms, Instant::now());
    }

    pub fn on_refresh_summary(&mut self, refresh: bool) {
        let seq = self.state.totals.begin_load();
        self.fetcher.fetch_summary(refresh, seq);
    }

    pub fn on_refresh_all(&mut self) {
        self.on_refresh_summary(true);
        self.refresh_insights();
        let view = self.state.range.view();
        self.refresh_lights(view);
    }

    fn refresh_insights(&mut self) {
        let seq = self.state.insights.begin_load();
        self.fetcher.fetch_insights(seq);
    }

    fn refresh_lights(&mut self, view: RangeView) {
        let seq = self.state.lights.begin_load();
        self.fetcher
            .fetch_lights(view.start_ms(), view.end_time_ms, seq);
    }

    /// Ask the fetch layer for the window backing `view`, and re-query the
    /// light events covering it
    fn request_view_window(&mut self, view: RangeView) {
        let key = WindowKey::new(view.end_time_ms, view.range_sec, view.bin_sec);
        let (_seq, outcome) = self.fetcher.fetch(key);
        match outcome {
            FetchOutcome::Hit => {
                self.state.chart.loading = false;
                self.state.chart.error = None;
                self.state.range.mark_loaded();
                self.merged = MergedSeries::from_cache(self.fetcher.cache());
            }
            FetchOutcome::Coalesced | FetchOutcome::Started => {
                self.state.chart.loading = true;
            }
        }
        self.refresh_lights(view);
    }

    /// Apply everything the worker finished since the last frame
    fn drain_fetches(&mut self) {
        for event in self.fetcher.drain() {
            match event {
                FetchEvent::WindowLoaded { .. } => {
                    self.state.chart.loading = false;
                    self.state.chart.error = None;
                    self.state.range.mark_loaded();
                    self.merged = MergedSeries::from_cache(self.fetcher.cache());
                    // Re-push bounds so the y-axis fits the fresh data
                    self.state.view.reset_bounds = true;
                }
                FetchEvent::WindowFailed { error, .. } => {
                    self.state.chart.loading = false;
                    self.state.chart.error = Some(error.user_message());
                }
                FetchEvent::Summary { seq, result } => {
                    self.state.totals.finish(seq, result);
                }
                FetchEvent::Insights { seq, result } => {
                    self.state.insights.finish(seq, result);
                }
                FetchEvent::Lights { seq, result } => {
                    self.state.lights.finish(seq, result);
                }
            }
        }
    }
}

impl App for HitScope {
    fn update(&mut self, ctx: &egui::Context, _frame: &mut eframe::Frame) {
        profiling::finish_frame!();

        if self.state.view.dark_mode {
            ctx.set_visuals(egui::Visuals::dark());
        } else {
            ctx.set_visuals(egui::Visuals::light());
        }

        self.drain_fetches();

        // Commit any debounced gesture; the plot already shows the gesture
        // bounds, so no bounds push here
        if let Some(view) = self.state.range.poll(Instant::now()) {
            self.request_view_window(view);
        }

        CentralPanel::default().show(ctx, |ui| {
            ui::render_toolbar(self, ui);
            ui.separator();
            ui::render_totals(self, ui);
            ui.separator();

            let mut strip = StripBuilder::new(ui).size(Size::remainder());
            if self.state.view.show_cards {
                strip = strip.size(Size::exact(constants::layout::CARDS_PANEL_WIDTH));
            }
            strip.horizontal(|mut strip| {
                strip.cell(|ui| {
                    ui::render_range_buttons(self, ui);
                    ui::render_chart(self, ui);
                });
                if self.state.view.show_cards {
                    strip.cell(|ui| {
                        ui::render_cards(self, ui);
                    });
                }
            });
        });

        // Keep painting while work is outstanding; otherwise wake up for
        // the debounce deadline
        if self.fetcher.has_in_flight() || self.state.anything_loading() {
            ctx.request_repaint_after(Duration::from_millis(100));
        } else if let Some(deadline) = self.state.range.next_deadline() {
            ctx.request_repaint_after(deadline.saturating_duration_since(Instant::now()));
        }
    }

    fn on_exit(&mut self, _gl: Option<&eframe::glow::Context>) {
        // Late worker results must not touch state during teardown
        self.fetcher.cancel_pending();
    }
}
