//! Aggregate counters header

use eframe::egui::{self, Color32, RichText};

use crate::app::HitScope;
use crate::timeutil;

/// Render the totals row: overall counters plus per-category breakdown
pub fn render_totals(app: &mut HitScope, ui: &mut egui::Ui) {
    ui.horizontal(|ui| {
        match app.state.totals.data.as_ref() {
            Some(summary) => {
                stat_box(ui, "Total hits", &format_count(summary.total_hits));
                stat_box(ui, "Unique users", &format_count(summary.unique_users));
                stat_box(ui, "Groups", &format_count(summary.unique_groups));
                for (category, count) in &summary.total_by_type {
                    stat_box(ui, category, &format_count(*count));
                }
                if let Some(generated) = summary.generated_at {
                    ui.label(
                        RichText::new(format!(
                            "as of {}",
                            timeutil::format_timestamp_ms(generated, "%H:%M:%S")
                        ))
                        .weak(),
                    );
                }
            }
            None => {
                ui.label("No summary yet");
            }
        }

        if app.state.totals.loading {
            ui.spinner();
        }
        if let Some(error) = app.state.totals.error.clone() {
            ui.colored_label(Color32::from_rgb(220, 80, 80), error);
        }
        if ui.button("⟳ Recount").clicked() {
            app.on_refresh_summary(true);
        }
    });
}

fn stat_box(ui: &mut egui::Ui, label: &str, value: &str) {
    ui.group(|ui| {
        ui.vertical(|ui| {
            ui.label(RichText::new(label).small().weak());
            ui.label(RichText::new(value).strong().size(18.0));
        });
    });
}

fn format_count(count: u64) -> String {
    if count >= 1_000_000 {
        format!("{:.1}M", count as f64 / 1_000_000.0)
    } else if count >= 10_000 {
        format!("{:.1}k", count as f64 / 1_000.0)
    } else {
        count.to_string()
    }
}
