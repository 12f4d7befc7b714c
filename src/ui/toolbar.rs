//! Top toolbar: refresh, display toggles, theme

use eframe::egui::{self, RichText};

use crate::app::HitScope;

pub fn render_toolbar(app: &mut HitScope, ui: &mut egui::Ui) {
    ui.horizontal(|ui| {
        ui.heading("hitscope");
        ui.separator();

        if ui.button("⟳ Refresh").clicked() {
            app.on_refresh_all();
        }

        ui.separator();
        ui.checkbox(&mut app.state.view.show_grid, "Grid");
        ui.checkbox(&mut app.state.view.show_legend, "Legend");
        ui.checkbox(&mut app.state.view.show_total, "Total line");
        ui.checkbox(&mut app.state.view.show_cards, "Cards");

        ui.separator();
        let theme_label = if app.state.view.dark_mode {
            "🌙 Dark"
        } else {
            "☀ Light"
        };
        if ui.button(theme_label).clicked() {
            app.state.view.toggle_dark_mode();
        }

        ui.with_layout(egui::Layout::right_to_left(egui::Align::Center), |ui| {
            ui.label(RichText::new(app.base_url().to_string()).weak());
        });
    });
}
