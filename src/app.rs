//! Huvudapplikation för Delivery Dashboard

use eframe::egui;
use std::sync::Arc;

use crate::db::Database;
use crate::models::AppSettings;
use crate::ui::{
    state::AppState,
    theme::{configure_style, Colors, Icons},
    views::{DashboardView, LoginView, MilestonesView, ProjectsView, ReportsView, WeeklyUpdateView},
    StatusType, View,
};

/// Huvudapplikation
pub struct DashboardApp {
    /// None om varken databasfilen eller in-memory gick att öppna
    db: Option<Arc<Database>>,
    state: AppState,
    app_settings: AppSettings,

    // Vyer
    login: LoginView,
    dashboard: DashboardView,
    projects: ProjectsView,
    weekly_update: WeeklyUpdateView,
    milestones: MilestonesView,
    reports: ReportsView,

    // Intern
    style_initialized: bool,
}

impl DashboardApp {
    pub fn new(_cc: &eframe::CreationContext<'_>, app_settings: AppSettings) -> Self {
        let db = open_database(&app_settings);

        let mut state = AppState::new();
        state.dark_mode = app_settings.dark_mode;
        if db.is_none() {
            state.show_error("Databasen kunde inte öppnas");
        }

        Self {
            db,
            state,
            app_settings,
            login: LoginView::new(),
            dashboard: DashboardView::new(),
            projects: ProjectsView::new(),
            weekly_update: WeeklyUpdateView::new(),
            milestones: MilestonesView::new(),
            reports: ReportsView::new(),
            style_initialized: false,
        }
    }

    /// Hantera navigation och uppdatera relevanta vyer
    fn handle_view_change(&mut self, new_view: View) {
        match new_view {
            View::Dashboard => self.dashboard.mark_needs_refresh(),
            View::Projects => self.projects.mark_needs_refresh(),
            View::WeeklyUpdate => self.weekly_update.mark_needs_refresh(),
            View::Milestones => self.milestones.mark_needs_refresh(),
            View::Reports => self.reports.mark_needs_refresh(),
        }
    }

    fn navigate_to(&mut self, view: View) {
        let old = self.state.current_view;
        self.state.navigate(view);
        if old != view {
            self.handle_view_change(view);
        }
    }

    fn logout(&mut self) {
        if let Some(ref session) = self.state.session {
            tracing::info!("Utloggning: {}", session.username);
        }
        self.state.logout();
        self.login.mark_needs_refresh();
    }

    fn toggle_dark_mode(&mut self, ctx: &egui::Context) {
        self.state.dark_mode = !self.state.dark_mode;
        configure_style(ctx, self.state.dark_mode);
        self.app_settings.dark_mode = self.state.dark_mode;
        if let Err(e) = self.app_settings.save() {
            tracing::warn!("Kunde inte spara inställningar: {}", e);
        }
    }

    fn show_top_bar(&mut self, ctx: &egui::Context) {
        egui::TopBottomPanel::top("top_panel").show(ctx, |ui| {
            ui.horizontal(|ui| {
                ui.heading("Delivery Dashboard");
                ui.separator();

                let mut clicked_view = None;
                for view in View::all() {
                    if ui
                        .selectable_label(self.state.current_view == *view, view.label())
                        .clicked()
                    {
                        clicked_view = Some(*view);
                    }
                }
                if let Some(view) = clicked_view {
                    self.navigate_to(view);
                }

                // Höger sida
                ui.with_layout(egui::Layout::right_to_left(egui::Align::Center), |ui| {
                    if ui
                        .button(format!("{} Logga ut", Icons::LOGOUT))
                        .clicked()
                    {
                        self.logout();
                        return;
                    }

                    let mode_icon = if self.state.dark_mode { "🌙" } else { "☀" };
                    if ui.button(mode_icon).clicked() {
                        self.toggle_dark_mode(ctx);
                    }

                    ui.separator();
                    if let Some(ref session) = self.state.session {
                        ui.label(format!("{} {}", Icons::USER, session.username));
                    }
                    ui.label(
                        egui::RichText::new(format!("v{}", env!("CARGO_PKG_VERSION")))
                            .small()
                            .weak(),
                    );
                });
            });
        });
    }

    fn show_status_bar(&self, ctx: &egui::Context) {
        if let Some(ref status) = self.state.status_message {
            egui::TopBottomPanel::bottom("status_bar").show(ctx, |ui| {
                let color = match status.status_type {
                    StatusType::Success => Colors::SUCCESS,
                    StatusType::Error => Colors::ERROR,
                    StatusType::Warning => Colors::WARNING,
                    StatusType::Info => Colors::INFO,
                };
                ui.colored_label(color, &status.text);
            });
        }
    }
}

impl eframe::App for DashboardApp {
    fn update(&mut self, ctx: &egui::Context, _frame: &mut eframe::Frame) {
        // Konfigurera stil (endast första gången)
        if !self.style_initialized {
            configure_style(ctx, self.state.dark_mode);
            self.style_initialized = true;
        }

        self.state.clear_old_status();

        let Some(db) = self.db.clone() else {
            self.show_status_bar(ctx);
            egui::CentralPanel::default().show(ctx, |ui| {
                ui.vertical_centered(|ui| {
                    ui.add_space(80.0);
                    ui.heading(
                        egui::RichText::new(format!("{} Databasen är inte tillgänglig", Icons::WARNING))
                            .color(Colors::ERROR),
                    );
                });
            });
            return;
        };

        // Inloggning krävs innan något annat visas
        if !self.state.is_logged_in() {
            self.show_status_bar(ctx);
            egui::CentralPanel::default().show(ctx, |ui| {
                self.login.show(ui, &mut self.state, &db);
            });
            return;
        }

        self.show_top_bar(ctx);
        self.show_status_bar(ctx);

        let view_before = self.state.current_view;

        // Huvudinnehåll
        egui::CentralPanel::default().show(ctx, |ui| {
            if !self.state.is_logged_in() {
                return;
            }
            match self.state.current_view {
                View::Dashboard => self.dashboard.show(ui, &mut self.state, &db),
                View::Projects => self.projects.show(ui, &mut self.state, &db),
                View::WeeklyUpdate => self.weekly_update.show(ui, &mut self.state, &db),
                View::Milestones => self.milestones.show(ui, &mut self.state, &db),
                View::Reports => {
                    self.reports
                        .show(ui, &mut self.state, &db, &self.app_settings)
                }
            }
        });

        // Vyer kan navigera själva (snabbknappar) eller ändra data som de visar
        if self.state.current_view != view_before || self.state.data_changed {
            self.handle_view_change(self.state.current_view);
        }
        self.state.data_changed = false;
    }
}

/// Öppna databasen från inställningarna, in-memory som reserv
fn open_database(settings: &AppSettings) -> Option<Arc<Database>> {
    let db_path = settings.database_path();
    tracing::info!("Öppnar databas: {:?}", db_path);

    match Database::open(&db_path).and_then(|db| db.migrate().map(|_| db)) {
        Ok(db) => Some(Arc::new(db)),
        Err(e) => {
            tracing::error!("Kunde inte öppna databas: {}", e);
            match Database::open_in_memory() {
                Ok(db) => {
                    tracing::warn!("Använder in-memory databas, data sparas inte");
                    Some(Arc::new(db))
                }
                Err(e) => {
                    tracing::error!("Kunde inte skapa in-memory databas: {}", e);
                    None
                }
            }
        }
    }
}
