use chrono::NaiveDate;
use egui::{self, Color32, RichText};

use crate::db::Database;
use crate::services::entry::{DashboardStats, EntryService};
use crate::ui::{state::AppState, theme::{Colors, Icons}, View};
use crate::utils::date::{format_date, week_ending_for};

pub struct DashboardView {
    // Cachad statistik
    stats: DashboardStats,
    week: NaiveDate,
    recent_weeks: Vec<NaiveDate>,
    needs_refresh: bool,
}

impl DashboardView {
    pub fn new() -> Self {
        Self {
            stats: DashboardStats::default(),
            week: week_ending_for(chrono::Local::now().date_naive()),
            recent_weeks: Vec::new(),
            needs_refresh: true,
        }
    }

    pub fn show(&mut self, ui: &mut egui::Ui, state: &mut AppState, db: &Database) {
        if self.needs_refresh || state.data_changed {
            self.refresh_stats(state, db);
            self.needs_refresh = false;
        }

        ui.vertical(|ui| {
            ui.horizontal(|ui| {
                ui.heading(format!("{} Dashboard", Icons::DASHBOARD));
                ui.label(
                    RichText::new(format!("Vecka som slutar {}", format_date(self.week)))
                        .color(Colors::TEXT_SECONDARY),
                );
            });

            ui.add_space(16.0);

            // Statistikkort
            ui.horizontal(|ui| {
                self.stat_card(ui, Icons::PROJECT, "Projekt", &self.stats.project_count.to_string(), Colors::PRIMARY);
                ui.add_space(8.0);
                let reported = format!("{} / {}", self.stats.updates_this_week, self.stats.project_count);
                self.stat_card(ui, Icons::UPDATE, "Rapporterade", &reported, Colors::SUCCESS);
                ui.add_space(8.0);
                self.stat_card(ui, Icons::CHECK, "Väntande åtgärder", &self.stats.pending_actions.to_string(), Colors::INFO);
                ui.add_space(8.0);
                let delayed_color = if self.stats.delayed_projects > 0 { Colors::RED } else { Colors::GREEN };
                self.stat_card(ui, Icons::WARNING, "Försenade", &self.stats.delayed_projects.to_string(), delayed_color);
            });

            ui.add_space(24.0);

            // Snabbåtgärder
            ui.heading("Snabbåtgärder");
            ui.add_space(8.0);

            ui.horizontal(|ui| {
                if ui.button(format!("{} Nytt projekt", Icons::ADD)).clicked() {
                    state.navigate(View::Projects);
                }
                if ui.button(format!("{} Veckouppdatering", Icons::UPDATE)).clicked() {
                    state.navigate(View::WeeklyUpdate);
                }
                if ui.button(format!("{} Milstolpar", Icons::MILESTONE)).clicked() {
                    state.navigate(View::Milestones);
                }
                if ui.button(format!("{} Rapporter", Icons::REPORT)).clicked() {
                    state.navigate(View::Reports);
                }
            });

            ui.add_space(24.0);

            ui.heading("Rapporterade veckor");
            ui.add_space(8.0);
            if self.recent_weeks.is_empty() {
                ui.label(
                    RichText::new("Inga veckouppdateringar ännu.").color(Colors::TEXT_SECONDARY),
                );
            }
            for week in self.recent_weeks.iter().rev().take(8) {
                ui.horizontal(|ui| {
                    ui.label(Icons::CALENDAR);
                    ui.label(format_date(*week));
                });
            }
        });
    }

    fn stat_card(&self, ui: &mut egui::Ui, icon: &str, label: &str, value: &str, color: Color32) {
        egui::Frame::none()
            .fill(ui.visuals().extreme_bg_color)
            .rounding(8.0)
            .inner_margin(16.0)
            .show(ui, |ui| {
                ui.set_min_width(150.0);
                ui.vertical(|ui| {
                    ui.horizontal(|ui| {
                        ui.label(RichText::new(icon).size(24.0));
                        ui.label(RichText::new(label).color(Colors::TEXT_SECONDARY));
                    });
                    ui.add_space(8.0);
                    ui.label(RichText::new(value).size(28.0).strong().color(color));
                });
            });
    }

    fn refresh_stats(&mut self, state: &mut AppState, db: &Database) {
        let service = EntryService::new(db);
        match service.dashboard_stats(self.week) {
            Ok(stats) => self.stats = stats,
            Err(e) => state.show_error(&format!("Kunde inte läsa statistik: {}", e)),
        }
        self.recent_weeks = service.week_dates().unwrap_or_default();
    }

    pub fn mark_needs_refresh(&mut self) {
        self.needs_refresh = true;
    }
}
