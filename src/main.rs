//! Delivery Dashboard - Entry Point
//!
//! Projektstatus, milstolpar och veckorapporter för leveransteam.

#![cfg_attr(not(debug_assertions), windows_subsystem = "windows")]
#![allow(dead_code)]

mod app;
mod db;
mod models;
mod services;
mod ui;
mod utils;

use app::DashboardApp;
use eframe::egui;
use models::AppSettings;

fn main() -> eframe::Result<()> {
    let settings = AppSettings::load();

    // Initiera logging
    tracing_subscriber::fmt()
        .with_max_level(settings.tracing_level())
        .with_target(false)
        .init();

    tracing::info!("Startar Delivery Dashboard v{}", env!("CARGO_PKG_VERSION"));

    // Fönsterinställningar
    let options = eframe::NativeOptions {
        viewport: egui::ViewportBuilder::default()
            .with_title(format!("Delivery Dashboard v{}", env!("CARGO_PKG_VERSION")))
            .with_inner_size([settings.window_width, settings.window_height])
            .with_min_inner_size([900.0, 600.0])
            .with_app_id("delivery-dashboard"),
        ..Default::default()
    };

    eframe::run_native(
        "Delivery Dashboard",
        options,
        Box::new(|cc| Ok(Box::new(DashboardApp::new(cc, settings)))),
    )
}
