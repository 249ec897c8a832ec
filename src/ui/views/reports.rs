//! Rapportvy: generera, förhandsgranska och exportera

use chrono::NaiveDate;
use egui::{self, RichText};
use egui_extras::{Column, TableBuilder};

use crate::db::Database;
use crate::models::{AppSettings, ProjectRef, ProjectReport, Report, ReportKind};
use crate::services::aggregator::{ReportAggregator, ReportOutcome};
use crate::services::export::{export_file_name, ExportFormat, ExportService};
use crate::services::render::{
    comment_or_placeholder, entry_heading, percent, qe_rows, status_color, yes_no,
    NONE_PLACEHOLDER, NO_ACTIONS_PLACEHOLDER, NO_RAG_PLACEHOLDER, NO_RISKS_PLACEHOLDER,
};
use crate::ui::{
    state::AppState,
    theme::{Colors, Icons},
};
use crate::utils::date::{format_date, parse_date, week_ending_for};

use super::projects::project_picker;

pub struct ReportsView {
    /// Vald rapporttyp
    selected_kind: ReportKind,
    /// Valt exportformat
    selected_format: ExportFormat,
    week_input: String,
    /// Filter för veckorapport, krävs för projekthistorik
    project_id: Option<i64>,
    projects: Vec<ProjectRef>,
    available_weeks: Vec<NaiveDate>,
    report: Option<Report>,
    /// Visas när rapporten blev tom
    empty_notice: Option<String>,
    /// Senaste exportresultat (meddelande)
    last_result: Option<String>,
    needs_refresh: bool,
}

impl Default for ReportsView {
    fn default() -> Self {
        Self::new()
    }
}

impl ReportsView {
    pub fn new() -> Self {
        Self {
            selected_kind: ReportKind::WeeklySummary,
            selected_format: ExportFormat::Pdf,
            week_input: format_date(week_ending_for(chrono::Local::now().date_naive())),
            project_id: None,
            projects: Vec::new(),
            available_weeks: Vec::new(),
            report: None,
            empty_notice: None,
            last_result: None,
            needs_refresh: true,
        }
    }

    pub fn show(
        &mut self,
        ui: &mut egui::Ui,
        state: &mut AppState,
        db: &Database,
        settings: &AppSettings,
    ) {
        if self.needs_refresh || state.data_changed {
            self.projects = db.projects().list_refs().unwrap_or_default();
            self.available_weeks = db.updates().distinct_week_dates().unwrap_or_default();
            self.needs_refresh = false;
        }

        ui.heading(format!("{} Rapporter", Icons::REPORT));
        ui.add_space(12.0);

        self.show_controls(ui, state, db, settings);

        if let Some(ref notice) = self.empty_notice {
            ui.add_space(8.0);
            ui.label(RichText::new(notice).color(Colors::WARNING));
        }

        if let Some(ref result) = self.last_result {
            ui.add_space(8.0);
            egui::Frame::none()
                .fill(Colors::SUCCESS.gamma_multiply(0.2))
                .rounding(8.0)
                .inner_margin(12.0)
                .show(ui, |ui| {
                    ui.horizontal(|ui| {
                        ui.label(RichText::new(Icons::CHECK).color(Colors::SUCCESS));
                        ui.label(result);
                    });
                });
        }

        ui.add_space(12.0);
        ui.separator();

        if let Some(ref report) = self.report {
            egui::ScrollArea::vertical()
                .auto_shrink([false, false])
                .show(ui, |ui| show_preview(ui, report));
        }
    }

    fn show_controls(
        &mut self,
        ui: &mut egui::Ui,
        state: &mut AppState,
        db: &Database,
        settings: &AppSettings,
    ) {
        egui::Frame::none()
            .fill(ui.visuals().extreme_bg_color)
            .rounding(8.0)
            .inner_margin(16.0)
            .show(ui, |ui| {
                ui.horizontal(|ui| {
                    ui.label("Rapport:");
                    egui::ComboBox::from_id_salt("report_kind")
                        .selected_text(self.selected_kind.display_name())
                        .show_ui(ui, |ui| {
                            for kind in ReportKind::all() {
                                ui.selectable_value(&mut self.selected_kind, *kind, kind.display_name());
                            }
                        });

                    ui.separator();

                    if self.selected_kind == ReportKind::WeeklySummary {
                        ui.label(format!("{} Veckoslut:", Icons::CALENDAR));
                        egui::ComboBox::from_id_salt("report_week")
                            .selected_text(self.week_input.clone())
                            .show_ui(ui, |ui| {
                                for week in self.available_weeks.iter().rev() {
                                    let text = format_date(*week);
                                    ui.selectable_value(&mut self.week_input, text.clone(), text);
                                }
                            });
                        ui.add(egui::TextEdit::singleline(&mut self.week_input).desired_width(90.0));
                        ui.separator();
                    }

                    ui.label("Projekt:");
                    project_picker(ui, "report_project", &self.projects, &mut self.project_id);
                    if self.project_id.is_some() && ui.small_button("Alla").clicked() {
                        self.project_id = None;
                    }
                });

                ui.add_space(8.0);

                ui.horizontal(|ui| {
                    if ui.button(format!("{} Generera", Icons::REFRESH)).clicked() {
                        self.generate(state, db);
                    }

                    ui.separator();

                    ui.label("Format:");
                    egui::ComboBox::from_id_salt("export_format")
                        .selected_text(self.selected_format.display_name())
                        .show_ui(ui, |ui| {
                            for format in ExportFormat::all() {
                                ui.selectable_value(&mut self.selected_format, *format, format.display_name());
                            }
                        });

                    let can_export = self.report.is_some();
                    if ui
                        .add_enabled(can_export, egui::Button::new(format!("{} Exportera", Icons::EXPORT)))
                        .clicked()
                    {
                        self.do_export(state, settings);
                    }
                });
            });
    }

    fn generate(&mut self, state: &mut AppState, db: &Database) {
        self.empty_notice = None;
        self.last_result = None;
        let aggregator = ReportAggregator::new(db);

        let outcome = match self.selected_kind {
            ReportKind::WeeklySummary => {
                let Some(week) = parse_date(&self.week_input) else {
                    state.show_error(&format!("Ogiltigt datum: '{}'", self.week_input.trim()));
                    return;
                };
                aggregator.weekly_summary(week, self.project_id)
            }
            ReportKind::ProjectHistory => {
                let Some(project_id) = self.project_id else {
                    state.show_error("Välj ett projekt för projekthistorik");
                    return;
                };
                aggregator.project_history(project_id)
            }
        };

        match outcome {
            Ok(ReportOutcome::Ready(report)) => {
                state.show_info(&format!("{}: {} poster", report.title, report.projects.len()));
                self.report = Some(report);
            }
            Ok(ReportOutcome::Empty { available_weeks }) => {
                self.report = None;
                let weeks = if available_weeks.is_empty() {
                    "inga".to_string()
                } else {
                    available_weeks
                        .iter()
                        .map(|w| format_date(*w))
                        .collect::<Vec<_>>()
                        .join(", ")
                };
                self.empty_notice = Some(format!(
                    "Ingen data för valet. Veckor med uppdateringar: {}",
                    weeks
                ));
                self.available_weeks = available_weeks;
            }
            Err(e) => {
                self.report = None;
                state.show_error(&format!("Kunde inte generera rapport: {}", e));
            }
        }
    }

    fn do_export(&mut self, state: &mut AppState, settings: &AppSettings) {
        let Some(ref report) = self.report else {
            return;
        };

        let filename = export_file_name(report, self.selected_format);
        let mut file_dialog = rfd::FileDialog::new()
            .set_file_name(&filename)
            .add_filter(
                self.selected_format.display_name(),
                &[self.selected_format.extension()],
            );
        if let Some(ref dir) = settings.report_directory {
            file_dialog = file_dialog.set_directory(dir);
        }

        let Some(path) = file_dialog.save_file() else {
            return;
        };

        let export_service = ExportService::new(settings.debug_html_path.clone());
        match export_service.export_to_file(report, self.selected_format, &path) {
            Ok(result) => {
                let msg = result.summary();
                if result.fallback_reason.is_some() {
                    state.show_warning(&msg);
                } else {
                    state.show_success(&msg);
                }
                self.last_result = Some(msg);
            }
            Err(e) => {
                state.show_error(&format!("Export misslyckades: {}", e));
            }
        }
    }

    pub fn mark_needs_refresh(&mut self) {
        self.needs_refresh = true;
    }
}

fn show_preview(ui: &mut egui::Ui, report: &Report) {
    ui.vertical_centered(|ui| {
        ui.heading(RichText::new(&report.title).color(Colors::PRIMARY));
    });
    ui.separator();

    for project in &report.projects {
        ui.push_id(project.update_id, |ui| show_project(ui, report, project));
        ui.separator();
    }
}

fn show_project(ui: &mut egui::Ui, report: &Report, project: &ProjectReport) {
    ui.label(
        RichText::new(entry_heading(report, project))
            .size(20.0)
            .strong()
            .color(Colors::PRIMARY),
    );

    egui::Grid::new("facts").num_columns(2).spacing([16.0, 4.0]).show(ui, |ui| {
        let facts = [
            ("Client/BU", project.client_business_unit.clone()),
            ("Project Manager", project.project_manager.clone()),
            ("Duration", project.duration_display()),
            ("Phase", project.phase_display().to_string()),
        ];
        for (label, value) in facts {
            ui.strong(label);
            ui.label(value);
            ui.end_row();
        }
        ui.strong("Status");
        ui.colored_label(Colors::named(status_color(project)), project.status_display());
        ui.end_row();
    });

    lines_section(ui, "Accomplishments", &project.accomplishment_lines());
    lines_section(ui, "Decisions Needed", &project.decision_lines());
    let milestones_text = project.milestones_text.trim();
    if milestones_text.is_empty() {
        lines_section(ui, "Milestones", &[]);
    } else {
        lines_section(ui, "Milestones", &[milestones_text]);
    }

    egui::CollapsingHeader::new(format!("RAG Status ({})", project.rag_status.len()))
        .default_open(true)
        .show(ui, |ui| {
            if project.rag_status.is_empty() {
                ui.label(NO_RAG_PLACEHOLDER);
            }
            for rag in &project.rag_status {
                ui.horizontal(|ui| {
                    ui.strong(format!("{}:", rag.area.display_name()));
                    ui.colored_label(Colors::named(rag.status.color_name()), rag.status.display_name());
                    ui.label(format!("- {}", comment_or_placeholder(&rag.comment)));
                });
            }
        });

    egui::CollapsingHeader::new(format!("Risks & Issues ({})", project.risks_issues.len()))
        .default_open(true)
        .show(ui, |ui| {
            if project.risks_issues.is_empty() {
                ui.label(NO_RISKS_PLACEHOLDER);
            }
            for ri in &project.risks_issues {
                ui.horizontal_wrapped(|ui| {
                    ui.strong(format!("{}:", ri.kind.display_name()));
                    ui.label(format!(
                        "{} (Owner: {}, ETA: {})",
                        ri.description, ri.owner, ri.mitigation_eta
                    ));
                });
            }
        });

    egui::CollapsingHeader::new(format!("Action Items ({})", project.action_items.len()))
        .default_open(true)
        .show(ui, |ui| {
            if project.action_items.is_empty() {
                ui.label(NO_ACTIONS_PLACEHOLDER);
            }
            for action in &project.action_items {
                ui.label(format!(
                    "• {} - {} (Client Input: {})",
                    action.description,
                    action.status,
                    yes_no(action.client_input_required)
                ));
            }
        });

    let qe = qe_rows(project);
    if !qe.is_empty() {
        egui::CollapsingHeader::new("QE Metrics").show(ui, |ui| {
            egui::Grid::new("qe").num_columns(2).show(ui, |ui| {
                for (label, value) in qe {
                    ui.label(label);
                    ui.label(value);
                    ui.end_row();
                }
            });
        });
    }

    if !project.milestones.is_empty() {
        egui::CollapsingHeader::new("Milestone Tracking")
            .default_open(true)
            .show(ui, |ui| milestone_table(ui, project));
    }
}

fn lines_section(ui: &mut egui::Ui, heading: &str, lines: &[&str]) {
    ui.add_space(4.0);
    ui.label(RichText::new(heading).strong().color(Colors::ACCENT));
    if lines.is_empty() {
        ui.label(format!("• {}", NONE_PLACEHOLDER));
    }
    for line in lines {
        ui.label(format!("• {}", line));
    }
}

fn milestone_table(ui: &mut egui::Ui, project: &ProjectReport) {
    TableBuilder::new(ui)
        .striped(true)
        .vscroll(false)
        .column(Column::initial(200.0).resizable(true))
        .columns(Column::auto(), 5)
        .column(Column::remainder())
        .header(20.0, |mut header| {
            for title in ["Milestone", "Start", "End", "Weight", "Expected", "Actual", "Status"] {
                header.col(|ui| {
                    ui.strong(title);
                });
            }
        })
        .body(|mut body| {
            for ms in &project.milestones {
                body.row(20.0, |mut row| {
                    row.col(|ui| {
                        if ms.is_child() {
                            ui.label(format!("    {}", ms.name));
                        } else {
                            ui.label(&ms.name);
                        }
                    });
                    row.col(|ui| {
                        ui.label(format_date(ms.planned_start));
                    });
                    row.col(|ui| {
                        ui.label(format_date(ms.planned_end));
                    });
                    row.col(|ui| {
                        ui.label(percent(ms.weightage));
                    });
                    row.col(|ui| {
                        ui.label(percent(ms.expected_progress));
                    });
                    row.col(|ui| {
                        ui.label(ms.actual_progress.map(percent).unwrap_or_else(|| "-".into()));
                    });
                    row.col(|ui| {
                        ui.colored_label(Colors::named(ms.status.color_name()), ms.status.label());
                    });
                });
            }
        });

    if let Some(weighted) = project.weighted_progress {
        ui.horizontal(|ui| {
            ui.strong("Weighted Progress:");
            ui.label(percent(weighted));
        });
    }
}
