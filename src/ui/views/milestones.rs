//! Milstolpar per projekt och veckovis framsteg

use chrono::NaiveDate;
use egui::{self, RichText};
use egui_extras::{Column, TableBuilder};

use crate::db::Database;
use crate::models::{Milestone, ProjectRef};
use crate::services::entry::{EntryService, MilestoneForm};
use crate::ui::{
    state::AppState,
    theme::{Colors, Icons},
};
use crate::utils::date::{format_date, parse_date, week_ending_for};

use super::projects::{date_field, project_picker};

pub struct MilestonesView {
    projects: Vec<ProjectRef>,
    project_id: Option<i64>,
    milestones: Vec<Milestone>,
    form: MilestoneForm,
    /// Vecka som framsteg registreras för
    progress_week: String,
    /// Inmatat framsteg i procent per milstolpe
    progress_inputs: Vec<(i64, String)>,
    error_message: Option<String>,
    needs_refresh: bool,
}

impl MilestonesView {
    pub fn new() -> Self {
        Self {
            projects: Vec::new(),
            project_id: None,
            milestones: Vec::new(),
            form: MilestoneForm::default(),
            progress_week: format_date(week_ending_for(chrono::Local::now().date_naive())),
            progress_inputs: Vec::new(),
            error_message: None,
            needs_refresh: true,
        }
    }

    pub fn show(&mut self, ui: &mut egui::Ui, state: &mut AppState, db: &Database) {
        if state.selected_project_id.is_some() && self.project_id != state.selected_project_id {
            self.project_id = state.selected_project_id;
            self.needs_refresh = true;
        }
        if self.needs_refresh || state.data_changed {
            self.refresh(state, db);
            self.needs_refresh = false;
        }

        ui.heading(format!("{} Milstolpar", Icons::MILESTONE));
        ui.add_space(12.0);

        ui.horizontal(|ui| {
            ui.label("Projekt:");
            if project_picker(ui, "milestone_project", &self.projects, &mut self.project_id) {
                state.selected_project_id = self.project_id;
                self.needs_refresh = true;
            }
        });

        let Some(project_id) = self.project_id else {
            ui.label(RichText::new("Välj ett projekt.").color(Colors::TEXT_SECONDARY));
            return;
        };

        ui.add_space(12.0);
        egui::ScrollArea::vertical().show(ui, |ui| {
            self.show_table(ui, state, db);
            ui.add_space(16.0);
            self.show_form(ui, state, db, project_id);
        });
    }

    fn show_table(&mut self, ui: &mut egui::Ui, state: &mut AppState, db: &Database) {
        if self.milestones.is_empty() {
            ui.label(RichText::new("Inga milstolpar ännu.").color(Colors::TEXT_SECONDARY));
            return;
        }

        ui.horizontal(|ui| {
            ui.label("Framsteg för vecka:");
            date_field(ui, &mut self.progress_week);
        });
        ui.add_space(8.0);

        let week = parse_date(&self.progress_week);
        let mut to_save: Option<(i64, String)> = None;

        TableBuilder::new(ui)
            .striped(true)
            .vscroll(false)
            .column(Column::initial(220.0).resizable(true))
            .column(Column::auto())
            .column(Column::auto())
            .column(Column::auto())
            .column(Column::auto())
            .column(Column::remainder())
            .header(20.0, |mut header| {
                for title in ["Milstolpe", "Start", "Slut", "Vikt", "Förväntat", "Faktiskt (%)"] {
                    header.col(|ui| {
                        ui.strong(title);
                    });
                }
            })
            .body(|mut body| {
                for milestone in &self.milestones {
                    let Some(id) = milestone.id else { continue };
                    let expected = week
                        .map(|w| format!("{:.0}%", milestone.expected_progress(w) * 100.0))
                        .unwrap_or_default();

                    body.row(22.0, |mut row| {
                        row.col(|ui| {
                            let name = if milestone.parent_id.is_some() {
                                format!("    {}", milestone.name)
                            } else {
                                milestone.name.clone()
                            };
                            ui.label(name);
                        });
                        row.col(|ui| {
                            ui.label(format_date(milestone.planned_start));
                        });
                        row.col(|ui| {
                            ui.label(format_date(milestone.planned_end));
                        });
                        row.col(|ui| {
                            ui.label(format!("{:.0}%", milestone.weightage * 100.0));
                        });
                        row.col(|ui| {
                            ui.label(expected);
                        });
                        row.col(|ui| {
                            if let Some((_, input)) =
                                self.progress_inputs.iter_mut().find(|(mid, _)| *mid == id)
                            {
                                ui.add(egui::TextEdit::singleline(input).desired_width(50.0));
                                if ui.small_button(Icons::SAVE).clicked() {
                                    to_save = Some((id, input.clone()));
                                }
                            }
                        });
                    });
                }
            });

        if let Some((id, input)) = to_save {
            self.save_progress(state, db, id, week, &input);
        }
    }

    fn save_progress(
        &mut self,
        state: &mut AppState,
        db: &Database,
        milestone_id: i64,
        week: Option<NaiveDate>,
        input: &str,
    ) {
        let Some(week) = week else {
            state.show_error("Ogiltigt veckodatum");
            return;
        };
        let Ok(percent) = input.trim().replace(',', ".").parse::<f64>() else {
            state.show_error(&format!("'{}' är inte ett tal", input.trim()));
            return;
        };

        match EntryService::new(db).record_milestone_progress(milestone_id, week, percent) {
            Ok(()) => {
                state.show_success("Framsteg sparat");
                state.data_changed = true;
            }
            Err(e) => state.show_error(&format!("Kunde inte spara framsteg: {}", e)),
        }
    }

    fn show_form(&mut self, ui: &mut egui::Ui, state: &mut AppState, db: &Database, project_id: i64) {
        egui::Frame::none()
            .fill(ui.visuals().extreme_bg_color)
            .rounding(8.0)
            .inner_margin(16.0)
            .show(ui, |ui| {
                ui.label(RichText::new("Ny milstolpe").strong());
                ui.add_space(8.0);

                let parents: Vec<(i64, String)> = self
                    .milestones
                    .iter()
                    .filter(|m| m.parent_id.is_none())
                    .filter_map(|m| m.id.map(|id| (id, m.name.clone())))
                    .collect();

                egui::Grid::new("milestone_form_grid")
                    .num_columns(2)
                    .spacing([8.0, 8.0])
                    .show(ui, |ui| {
                        ui.label("Namn:");
                        ui.text_edit_singleline(&mut self.form.name);
                        ui.end_row();

                        ui.label("Överordnad:");
                        let parent_name = self
                            .form
                            .parent_id
                            .and_then(|pid| parents.iter().find(|(id, _)| *id == pid))
                            .map(|(_, name)| name.as_str())
                            .unwrap_or("(ingen)");
                        egui::ComboBox::from_id_salt("milestone_parent")
                            .selected_text(parent_name)
                            .show_ui(ui, |ui| {
                                ui.selectable_value(&mut self.form.parent_id, None, "(ingen)");
                                for (id, name) in &parents {
                                    ui.selectable_value(&mut self.form.parent_id, Some(*id), name);
                                }
                            });
                        ui.end_row();

                        ui.label("Planerad start:");
                        date_field(ui, &mut self.form.planned_start);
                        ui.end_row();

                        ui.label("Planerat slut:");
                        date_field(ui, &mut self.form.planned_end);
                        ui.end_row();

                        ui.label("Vikt (%):");
                        ui.add(egui::TextEdit::singleline(&mut self.form.weightage_percent).desired_width(60.0));
                        ui.end_row();
                    });

                if let Some(ref error) = self.error_message {
                    ui.add_space(8.0);
                    ui.label(RichText::new(error).color(Colors::ERROR));
                }

                ui.add_space(8.0);
                if ui.button(format!("{} Lägg till milstolpe", Icons::ADD)).clicked() {
                    self.form.project_id = Some(project_id);
                    match EntryService::new(db).add_milestone(&self.form) {
                        Ok(_) => {
                            state.show_success(&format!("Milstolpe '{}' skapad", self.form.name.trim()));
                            state.data_changed = true;
                            self.form = MilestoneForm::default();
                            self.error_message = None;
                        }
                        Err(e) => {
                            tracing::warn!("Kunde inte skapa milstolpe: {}", e);
                            self.error_message = Some(e.to_string());
                        }
                    }
                }
            });
    }

    fn refresh(&mut self, state: &mut AppState, db: &Database) {
        let service = EntryService::new(db);
        self.projects = service.project_refs().unwrap_or_default();

        self.milestones = match self.project_id {
            Some(id) => service.milestones_for(id).unwrap_or_else(|e| {
                state.show_error(&format!("Kunde inte läsa milstolpar: {}", e));
                Vec::new()
            }),
            None => Vec::new(),
        };

        // Förifyll med senaste registrerade framsteg för veckan
        let week = parse_date(&self.progress_week);
        self.progress_inputs = self
            .milestones
            .iter()
            .filter_map(|m| m.id)
            .map(|id| {
                let current = week
                    .and_then(|w| db.milestones().progress_for_week(id, w).ok().flatten())
                    .map(|p| format!("{:.0}", p * 100.0))
                    .unwrap_or_default();
                (id, current)
            })
            .collect();
    }

    pub fn mark_needs_refresh(&mut self) {
        self.needs_refresh = true;
    }
}
