#![cfg_attr(not(debug_assertions), windows_subsystem = "windows")]

// Upstream API types and client
mod api;

// Application shell
mod app;

// Application constants
mod constants;

// Window cache, fetch pipeline, and series assembly
mod data;

// Error handling
mod error;

// Application state modules
mod state;

// Time parsing and range helpers
mod timeutil;

// Dashboard panels
mod ui;

use app::HitScope;

fn main() {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let base_url = std::env::var(constants::api::BASE_URL_ENV)
        .unwrap_or_else(|_| constants::api::DEFAULT_BASE_URL.to_string());
    log::info!("using stats service at {}", base_url);

    let options = eframe::NativeOptions::default();
    eframe::run_native(
        "hitscope - Bot Access Statistics",
        options,
        Box::new(move |_| match HitScope::new(base_url) {
            Ok(app) => Ok(Box::new(app)),
            Err(e) => Err(format!("failed to start: {}", e).into()),
        }),
    )
    .unwrap();
}
