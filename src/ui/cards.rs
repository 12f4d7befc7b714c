//! Outage and load insight cards

use eframe::egui::{self, Color32};

use crate::api::types::InsightStats;
use crate::app::HitScope;
use crate::constants;
use crate::timeutil;

/// Render the insights side panel: one card per scope
pub fn render_cards(app: &mut HitScope, ui: &mut egui::Ui) {
    ui.horizontal(|ui| {
        ui.heading("Insights");
        if app.state.insights.loading {
            ui.spinner();
        }
    });
    if let Some(error) = app.state.insights.error.clone() {
        ui.colored_label(Color32::from_rgb(220, 80, 80), error);
    }
    ui.separator();

    egui::ScrollArea::vertical().show(ui, |ui| {
        if let Some(insights) = app.state.insights.data.as_ref() {
            insight_card(ui, "All areas", &insights.global);
            for (area, stats) in &insights.areas {
                insight_card(ui, area, stats);
            }
        } else if !app.state.insights.loading {
            ui.label("No insights yet");
        }
    });
}

fn insight_card(ui: &mut egui::Ui, title: &str, stats: &InsightStats) {
    ui.group(|ui| {
        ui.set_min_width(constants::layout::CARDS_PANEL_WIDTH - 24.0);
        ui.strong(title);
        ui.label(format!("Uptime: {:.2}%", stats.uptime_pct));
        ui.label(format!("Outages: {}", stats.outage_count));
        if stats.longest_outage_sec > 0 {
            ui.label(format!(
                "Longest outage: {}",
                timeutil::format_span_sec(stats.longest_outage_sec as i64)
            ));
            ui.label(format!(
                "Total downtime: {}",
                timeutil::format_span_sec(stats.total_outage_sec as i64)
            ));
        }
        if let Some(day) = stats.max_day {
            ui.label(format!(
                "Busiest day: {} ({} hits)",
                timeutil::format_timestamp_ms(day, "%Y-%m-%d"),
                stats.max_day_count
            ));
        }
    });
    ui.add_space(4.0);
}
