//! Projektlista och formulär för nytt projekt

use egui::{self, RichText};

use crate::db::Database;
use crate::models::{Project, ProjectPhase};
use crate::services::entry::{EntryService, ProjectForm};
use crate::ui::{
    state::AppState,
    theme::{Colors, Icons},
    View,
};

pub struct ProjectsView {
    form: ProjectForm,
    error_message: Option<String>,
    projects: Vec<Project>,
    needs_refresh: bool,
}

impl ProjectsView {
    pub fn new() -> Self {
        Self {
            form: ProjectForm::default(),
            error_message: None,
            projects: Vec::new(),
            needs_refresh: true,
        }
    }

    pub fn show(&mut self, ui: &mut egui::Ui, state: &mut AppState, db: &Database) {
        if self.needs_refresh || state.data_changed {
            self.projects = match db.projects().find_all() {
                Ok(projects) => projects,
                Err(e) => {
                    state.show_error(&format!("Kunde inte läsa projekt: {}", e));
                    Vec::new()
                }
            };
            self.needs_refresh = false;
        }

        ui.heading(format!("{} Projekt", Icons::PROJECT));
        ui.add_space(12.0);

        egui::ScrollArea::vertical().show(ui, |ui| {
            self.show_form(ui, state, db);
            ui.add_space(16.0);
            self.show_list(ui, state);
        });
    }

    fn show_form(&mut self, ui: &mut egui::Ui, state: &mut AppState, db: &Database) {
        egui::Frame::none()
            .fill(ui.visuals().extreme_bg_color)
            .rounding(8.0)
            .inner_margin(16.0)
            .show(ui, |ui| {
                ui.label(RichText::new("Nytt projekt").strong());
                ui.add_space(8.0);

                egui::Grid::new("project_form_grid")
                    .num_columns(2)
                    .spacing([8.0, 8.0])
                    .show(ui, |ui| {
                        ui.label("Projektnamn:");
                        ui.text_edit_singleline(&mut self.form.name);
                        ui.end_row();

                        ui.label("Kund/BU:");
                        ui.text_edit_singleline(&mut self.form.client_business_unit);
                        ui.end_row();

                        ui.label("Projektledare:");
                        ui.text_edit_singleline(&mut self.form.project_manager);
                        ui.end_row();

                        ui.label("Startdatum:");
                        date_field(ui, &mut self.form.start_date);
                        ui.end_row();

                        ui.label("Slutdatum:");
                        date_field(ui, &mut self.form.end_date);
                        ui.end_row();

                        ui.label("Fas:");
                        egui::ComboBox::from_id_salt("project_phase")
                            .selected_text(self.form.current_phase.display_name())
                            .show_ui(ui, |ui| {
                                for phase in ProjectPhase::all() {
                                    ui.selectable_value(
                                        &mut self.form.current_phase,
                                        *phase,
                                        phase.display_name(),
                                    );
                                }
                            });
                        ui.end_row();
                    });

                if let Some(ref error) = self.error_message {
                    ui.add_space(8.0);
                    ui.label(RichText::new(error).color(Colors::ERROR));
                }

                ui.add_space(8.0);
                if ui.button(format!("{} Lägg till projekt", Icons::SAVE)).clicked() {
                    match EntryService::new(db).add_project(&self.form) {
                        Ok(id) => {
                            state.show_success(&format!("Projekt '{}' skapat", self.form.name.trim()));
                            state.selected_project_id = Some(id);
                            state.data_changed = true;
                            self.form = ProjectForm::default();
                            self.error_message = None;
                        }
                        Err(e) => {
                            tracing::warn!("Kunde inte skapa projekt: {}", e);
                            self.error_message = Some(e.to_string());
                        }
                    }
                }
            });
    }

    fn show_list(&mut self, ui: &mut egui::Ui, state: &mut AppState) {
        ui.label(RichText::new(format!("Alla projekt ({})", self.projects.len())).strong());
        ui.add_space(8.0);

        if self.projects.is_empty() {
            ui.label(RichText::new("Inga projekt ännu.").color(Colors::TEXT_SECONDARY));
            return;
        }

        egui::Grid::new("project_list_grid")
            .num_columns(6)
            .striped(true)
            .spacing([16.0, 6.0])
            .show(ui, |ui| {
                for header in ["Projekt", "Kund/BU", "Projektledare", "Period", "Fas", ""] {
                    ui.label(RichText::new(header).strong());
                }
                ui.end_row();

                for project in &self.projects {
                    ui.label(&project.name);
                    ui.label(&project.client_business_unit);
                    ui.label(&project.project_manager);
                    ui.label(project.duration_display());
                    ui.label(project.current_phase.display_name());
                    ui.horizontal(|ui| {
                        if ui.small_button(Icons::UPDATE).on_hover_text("Veckouppdatering").clicked() {
                            state.selected_project_id = project.id;
                            state.navigate(View::WeeklyUpdate);
                        }
                        if ui.small_button(Icons::MILESTONE).on_hover_text("Milstolpar").clicked() {
                            state.selected_project_id = project.id;
                            state.navigate(View::Milestones);
                        }
                    });
                    ui.end_row();
                }
            });
    }

    pub fn mark_needs_refresh(&mut self) {
        self.needs_refresh = true;
    }
}

/// Datumfält med formatledtext
pub fn date_field(ui: &mut egui::Ui, value: &mut String) {
    ui.horizontal(|ui| {
        ui.add(egui::TextEdit::singleline(value).desired_width(100.0));
        ui.label(RichText::new("YYYY-MM-DD").small().color(Colors::TEXT_MUTED));
    });
}

/// Projektväljare; returnerar true om valet ändrades
pub fn project_picker(
    ui: &mut egui::Ui,
    id: &str,
    projects: &[crate::models::ProjectRef],
    selected: &mut Option<i64>,
) -> bool {
    let selected_name = selected
        .and_then(|pid| projects.iter().find(|p| p.id == pid))
        .map(|p| p.name.as_str())
        .unwrap_or("Välj projekt");

    let before = *selected;
    egui::ComboBox::from_id_salt(id)
        .selected_text(selected_name)
        .width(240.0)
        .show_ui(ui, |ui| {
            for project in projects {
                ui.selectable_value(selected, Some(project.id), &project.name);
            }
        });
    before != *selected
}
