//! Formulär för veckouppdatering

use egui::{self, RichText};

use crate::db::Database;
use crate::models::{ProjectRef, RagStatus, StatusIndicator};
use crate::services::entry::{EntryService, WeeklyUpdateForm};
use crate::ui::{
    state::AppState,
    theme::{Colors, Icons},
};
use crate::utils::date::{format_date, week_ending_for};

use super::projects::{date_field, project_picker};

pub struct WeeklyUpdateView {
    form: WeeklyUpdateForm,
    projects: Vec<ProjectRef>,
    error_message: Option<String>,
    needs_refresh: bool,
}

impl WeeklyUpdateView {
    pub fn new() -> Self {
        Self {
            form: Self::empty_form(),
            projects: Vec::new(),
            error_message: None,
            needs_refresh: true,
        }
    }

    fn empty_form() -> WeeklyUpdateForm {
        WeeklyUpdateForm {
            week_ending_date: format_date(week_ending_for(chrono::Local::now().date_naive())),
            ..Default::default()
        }
    }

    pub fn show(&mut self, ui: &mut egui::Ui, state: &mut AppState, db: &Database) {
        if self.needs_refresh || state.data_changed {
            self.projects = EntryService::new(db).project_refs().unwrap_or_else(|e| {
                state.show_error(&format!("Kunde inte läsa projekt: {}", e));
                Vec::new()
            });
            self.needs_refresh = false;
        }
        if state.selected_project_id.is_some() && self.form.project_id != state.selected_project_id {
            self.form.project_id = state.selected_project_id;
        }

        ui.heading(format!("{} Veckouppdatering", Icons::UPDATE));
        ui.add_space(12.0);

        if self.projects.is_empty() {
            ui.label(
                RichText::new("Skapa ett projekt innan du rapporterar.").color(Colors::TEXT_SECONDARY),
            );
            return;
        }

        egui::ScrollArea::vertical().show(ui, |ui| {
            egui::Grid::new("update_header_grid")
                .num_columns(2)
                .spacing([8.0, 8.0])
                .show(ui, |ui| {
                    ui.label("Projekt:");
                    if project_picker(ui, "update_project", &self.projects, &mut self.form.project_id) {
                        state.selected_project_id = self.form.project_id;
                    }
                    ui.end_row();

                    ui.label("Veckoslut:");
                    date_field(ui, &mut self.form.week_ending_date);
                    ui.end_row();

                    ui.label("Status:");
                    ui.horizontal(|ui| {
                        for indicator in StatusIndicator::all() {
                            ui.radio_value(
                                &mut self.form.status_indicator,
                                *indicator,
                                indicator.display_name(),
                            );
                        }
                    });
                    ui.end_row();
                });

            ui.add_space(12.0);
            text_area(ui, "Genomfört (en per rad)", &mut self.form.accomplishments);
            text_area(ui, "Beslut som behövs (en per rad)", &mut self.form.decisions_needed);
            text_area(ui, "Milstolpar", &mut self.form.milestones);

            ui.add_space(12.0);
            ui.label(RichText::new("RAG-status").strong());
            egui::Grid::new("rag_grid")
                .num_columns(3)
                .spacing([12.0, 6.0])
                .show(ui, |ui| {
                    for input in &mut self.form.rag {
                        ui.label(input.area.display_name());
                        ui.horizontal(|ui| {
                            for status in RagStatus::all() {
                                let text = RichText::new(status.display_name())
                                    .color(crate::ui::theme::Colors::named(status.color_name()));
                                ui.radio_value(&mut input.status, *status, text);
                            }
                        });
                        ui.add(
                            egui::TextEdit::singleline(&mut input.comment)
                                .hint_text("Kommentar")
                                .desired_width(280.0),
                        );
                        ui.end_row();
                    }
                });

            ui.add_space(12.0);
            text_area(ui, "Risker (en per rad)", &mut self.form.risks);
            text_area(ui, "Problem (en per rad)", &mut self.form.issues);
            text_area(ui, "Åtgärder (en per rad)", &mut self.form.action_items);
            ui.checkbox(&mut self.form.client_input_required, "Kräver input från kund");

            ui.add_space(12.0);
            ui.checkbox(&mut self.form.include_qe, "Inkludera QE-mätvärden");
            if self.form.include_qe {
                self.show_qe_fields(ui);
            }

            if let Some(ref error) = self.error_message {
                ui.add_space(8.0);
                ui.label(RichText::new(error).color(Colors::ERROR));
            }

            ui.add_space(12.0);
            if ui.button(format!("{} Skicka uppdatering", Icons::SAVE)).clicked() {
                self.submit(state, db);
            }
        });
    }

    fn show_qe_fields(&mut self, ui: &mut egui::Ui) {
        let qe = &mut self.form.qe;
        let fields: [(&str, &mut String); 9] = [
            ("Totalt antal testfall", &mut qe.total_test_cases),
            ("Körda", &mut qe.executed_test_cases),
            ("Godkända", &mut qe.passed_test_cases),
            ("Misslyckade", &mut qe.failed_test_cases),
            ("Blockerade", &mut qe.blocked_test_cases),
            ("Öppna defekter", &mut qe.open_defects),
            ("Stängda defekter", &mut qe.closed_defects),
            ("Kritiska defekter", &mut qe.critical_defects),
            ("Framsteg (%)", &mut qe.progress_percent),
        ];

        egui::Grid::new("qe_grid")
            .num_columns(2)
            .spacing([8.0, 6.0])
            .show(ui, |ui| {
                for (label, value) in fields {
                    ui.label(label);
                    ui.add(egui::TextEdit::singleline(value).desired_width(80.0));
                    ui.end_row();
                }
            });
    }

    fn submit(&mut self, state: &mut AppState, db: &Database) {
        match EntryService::new(db).submit_weekly_update(&self.form) {
            Ok(_) => {
                state.show_success(&format!(
                    "Veckouppdatering för {} sparad",
                    self.form.week_ending_date.trim()
                ));
                state.data_changed = true;
                let project_id = self.form.project_id;
                let week = std::mem::take(&mut self.form.week_ending_date);
                self.form = Self::empty_form();
                self.form.project_id = project_id;
                self.form.week_ending_date = week;
                self.error_message = None;
            }
            Err(e) => {
                tracing::warn!("Veckouppdatering avvisad: {}", e);
                self.error_message = Some(e.to_string());
            }
        }
    }

    pub fn mark_needs_refresh(&mut self) {
        self.needs_refresh = true;
    }
}

fn text_area(ui: &mut egui::Ui, label: &str, value: &mut String) {
    ui.label(label);
    ui.add(
        egui::TextEdit::multiline(value)
            .desired_rows(3)
            .desired_width(f32::INFINITY),
    );
    ui.add_space(4.0);
}
