//! Time-series chart section
//!
//! Thin adapter over egui_plot. Renders the visible merged series and
//! the outage overlay, and feeds whatever bounds the user produced back
//! into the range controller as a raw pan/zoom gesture. All snapping,
//! clamping, and debouncing happens in the controller; nothing here
//! mutates the view directly.

use chrono::{DateTime, Utc};
use eframe::egui::{self, Color32, Stroke};
use egui_plot::{Corner, Legend, Line, Plot, PlotBounds, PlotPoints, Polygon};

use crate::app::HitScope;
use crate::constants;
use crate::data::series::{MergedSeries, outage_intervals};
use crate::state::{Preset, Selection};
use crate::timeutil;

fn series_color(index: usize) -> Color32 {
    let colors = [
        Color32::from_rgb(31, 119, 180),  // Blue
        Color32::from_rgb(255, 127, 14),  // Orange
        Color32::from_rgb(44, 160, 44),   // Green
        Color32::from_rgb(214, 39, 40),   // Red
        Color32::from_rgb(148, 103, 189), // Purple
        Color32::from_rgb(140, 86, 75),   // Brown
        Color32::from_rgb(227, 119, 194), // Pink
        Color32::from_rgb(127, 127, 127), // Gray
        Color32::from_rgb(188, 189, 34),  // Yellow
        Color32::from_rgb(23, 190, 207),  // Cyan
    ];
    colors[index % colors.len()]
}

/// Render the preset buttons row above the chart
pub fn render_range_buttons(app: &mut HitScope, ui: &mut egui::Ui) {
    ui.horizontal(|ui| {
        ui.label("Range:");
        for preset in Preset::ALL_PRESETS {
            let selected = app.state.range.selection() == Selection::Preset(preset);
            if ui.selectable_label(selected, preset.label()).clicked() && !selected {
                app.on_select_preset(preset);
            }
        }
        if let Selection::Custom { span_sec } = app.state.range.selection() {
            let _ = ui.selectable_label(true, timeutil::format_span_sec(span_sec));
        }
        if app.state.chart.loading {
            ui.spinner();
        }
        if let Some(error) = app.state.chart.error.clone() {
            ui.colored_label(Color32::from_rgb(220, 80, 80), error);
        }
    });
}

/// Render the zoomable access chart
pub fn render_chart(app: &mut HitScope, ui: &mut egui::Ui) {
    profiling::scope!("render_chart");

    let view = app.state.range.view();
    let visible = app.merged.visible(view.start_ms(), view.end_time_ms);
    let show_total = app.state.view.show_total;

    if app.merged.is_empty() && !app.state.chart.loading && app.state.chart.error.is_none() {
        ui.vertical_centered(|ui| {
            ui.label("No access data yet");
        });
    }

    // Outage intervals clipped to the visible window
    let outages: Vec<(String, i64, i64)> = app
        .state
        .lights
        .data
        .as_ref()
        .map(|lights| {
            lights
                .areas
                .iter()
                .flat_map(|(area, events)| {
                    outage_intervals(events)
                        .into_iter()
                        .filter_map(|interval| {
                            let end = interval.end_ms.unwrap_or(view.end_time_ms);
                            (end > view.start_ms() && interval.start_ms < view.end_time_ms)
                                .then(|| {
                                    (
                                        area.clone(),
                                        interval.start_ms.max(view.start_ms()),
                                        end.min(view.end_time_ms),
                                    )
                                })
                        })
                        .collect::<Vec<_>>()
                })
                .collect()
        })
        .unwrap_or_default();

    let push_bounds = std::mem::take(&mut app.state.view.reset_bounds);
    let span_sec = view.range_sec;

    let plot_height = ui
        .available_height()
        .max(constants::layout::MIN_CHART_HEIGHT);
    let mut plot = Plot::new("access_chart")
        .height(plot_height)
        .show_grid(app.state.view.show_grid)
        .x_axis_formatter(move |mark, _range| {
            let secs = (mark.value / 1000.0).floor() as i64;
            match DateTime::<Utc>::from_timestamp(secs, 0) {
                Some(dt) if span_sec > 2 * 86_400 => dt.format("%m-%d").to_string(),
                Some(dt) => dt.format("%m-%d\n%H:%M").to_string(),
                None => format!("{:.0}", mark.value),
            }
        })
        .label_formatter(|name, value| {
            let when = timeutil::format_timestamp_ms(value.x as i64, "%Y-%m-%d %H:%M");
            if name.is_empty() {
                format!("{}\n{:.0}", when, value.y)
            } else {
                format!("{}\n{}\n{:.0}", name, when, value.y)
            }
        });

    if app.state.view.show_legend {
        plot = plot.legend(Legend::default().position(Corner::RightTop));
    }

    let response = plot.show(ui, |plot_ui| {
        if push_bounds {
            let (y_min, y_max) = y_extent(&visible);
            plot_ui.set_plot_bounds(PlotBounds::from_min_max(
                [view.start_ms() as f64, y_min],
                [view.end_time_ms as f64, y_max],
            ));
        }

        // Outage shading sits behind the series
        let bounds = plot_ui.plot_bounds();
        let (y0, y1) = (bounds.min()[1], bounds.max()[1]);
        for (area, start_ms, end_ms) in &outages {
            let corners = vec![
                [*start_ms as f64, y0],
                [*end_ms as f64, y0],
                [*end_ms as f64, y1],
                [*start_ms as f64, y1],
            ];
            plot_ui.polygon(
                Polygon::new(format!("{} outage", area), PlotPoints::from(corners))
                    .fill_color(Color32::from_rgba_unmultiplied(220, 60, 60, 24))
                    .stroke(Stroke::NONE),
            );
        }

        for (index, (category, points)) in visible.by_category.iter().enumerate() {
            plot_ui.line(Line::new(category.clone(), points.clone()).color(series_color(index)));
        }
        if show_total && !visible.total.is_empty() {
            plot_ui.line(Line::new("total", visible.total.clone()).width(2.0));
        }
    });

    // Whatever x-bounds the user produced become a gesture; the
    // controller decides whether they amount to anything
    let bounds = response.transform.bounds();
    let (x0, x1) = (bounds.min()[0], bounds.max()[0]);
    let moved = app
        .last_plot_bounds
        .is_some_and(|(p0, p1)| (x0 - p0).abs() >= 1.0 || (x1 - p1).abs() >= 1.0);
    app.last_plot_bounds = Some((x0, x1));
    if moved && !push_bounds {
        app.on_zoom_gesture(x0, x1);
    }
}

/// Y range covering every visible point, padded, never degenerate
fn y_extent(series: &MergedSeries) -> (f64, f64) {
    let mut min = f64::INFINITY;
    let mut max = f64::NEG_INFINITY;
    for points in series
        .by_category
        .values()
        .chain(std::iter::once(&series.total))
    {
        for point in points {
            min = min.min(point[1]);
            max = max.max(point[1]);
        }
    }
    if !min.is_finite() || !max.is_finite() {
        return (0.0, 1.0);
    }
    let pad = ((max - min) * 0.05).max(1.0);
    ((min - pad).min(0.0), max + pad)
}
