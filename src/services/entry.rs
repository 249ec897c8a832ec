//! Datainmatning: formulär till domänobjekt och vidare till repositories

use anyhow::Result;
use chrono::NaiveDate;
use tracing::info;

use crate::db::Database;
use crate::models::{
    unique_lines, ActionItem, Milestone, MilestoneUpdate, Project, ProjectPhase, ProjectRef,
    QeMetrics, RagArea, RagEntry, RagStatus, RiskIssue, RiskKind, StatusIndicator, WeeklyUpdate,
};
use crate::utils::date::parse_date;
use crate::utils::AppError;

/// Formulärdata för nytt projekt
#[derive(Debug, Clone, Default)]
pub struct ProjectForm {
    pub name: String,
    pub client_business_unit: String,
    pub project_manager: String,
    pub start_date: String,
    pub end_date: String,
    pub current_phase: ProjectPhase,
}

impl ProjectForm {
    pub fn to_project(&self) -> Result<Project, AppError> {
        let start = required_date(&self.start_date, "Startdatum")?;
        let end = required_date(&self.end_date, "Slutdatum")?;

        let mut project = Project::new(self.name.trim(), start, end);
        project.client_business_unit = self.client_business_unit.trim().to_string();
        project.project_manager = self.project_manager.trim().to_string();
        project.current_phase = self.current_phase;
        project.validate()?;
        Ok(project)
    }
}

/// En RAG-rad i formuläret
#[derive(Debug, Clone)]
pub struct RagInput {
    pub area: RagArea,
    pub status: RagStatus,
    pub comment: String,
}

/// QE-fält som text, tomma fält räknas som 0
#[derive(Debug, Clone, Default)]
pub struct QeForm {
    pub total_test_cases: String,
    pub executed_test_cases: String,
    pub passed_test_cases: String,
    pub failed_test_cases: String,
    pub blocked_test_cases: String,
    pub open_defects: String,
    pub closed_defects: String,
    pub critical_defects: String,
    pub progress_percent: String,
}

impl QeForm {
    pub fn to_metrics(&self) -> Result<QeMetrics, AppError> {
        let metrics = QeMetrics {
            total_test_cases: parse_count(&self.total_test_cases, "Totalt antal testfall")?,
            executed_test_cases: parse_count(&self.executed_test_cases, "Körda testfall")?,
            passed_test_cases: parse_count(&self.passed_test_cases, "Godkända testfall")?,
            failed_test_cases: parse_count(&self.failed_test_cases, "Misslyckade testfall")?,
            blocked_test_cases: parse_count(&self.blocked_test_cases, "Blockerade testfall")?,
            open_defects: parse_count(&self.open_defects, "Öppna defekter")?,
            closed_defects: parse_count(&self.closed_defects, "Stängda defekter")?,
            critical_defects: parse_count(&self.critical_defects, "Kritiska defekter")?,
            progress_percent: parse_number(&self.progress_percent, "Framsteg")?,
        };
        metrics.validate()?;
        Ok(metrics)
    }
}

/// Formulärdata för veckouppdatering
#[derive(Debug, Clone)]
pub struct WeeklyUpdateForm {
    pub project_id: Option<i64>,
    pub week_ending_date: String,
    pub accomplishments: String,
    pub decisions_needed: String,
    pub milestones: String,
    pub status_indicator: StatusIndicator,
    pub rag: Vec<RagInput>,
    /// En risk per rad
    pub risks: String,
    /// Ett problem per rad
    pub issues: String,
    /// En åtgärd per rad
    pub action_items: String,
    /// Gäller alla åtgärder i formuläret
    pub client_input_required: bool,
    pub include_qe: bool,
    pub qe: QeForm,
}

impl Default for WeeklyUpdateForm {
    fn default() -> Self {
        Self {
            project_id: None,
            week_ending_date: String::new(),
            accomplishments: String::new(),
            decisions_needed: String::new(),
            milestones: String::new(),
            status_indicator: StatusIndicator::default(),
            rag: RagArea::ALL
                .into_iter()
                .map(|area| RagInput {
                    area,
                    status: RagStatus::Green,
                    comment: String::new(),
                })
                .collect(),
            risks: String::new(),
            issues: String::new(),
            action_items: String::new(),
            client_input_required: false,
            include_qe: false,
            qe: QeForm::default(),
        }
    }
}

impl WeeklyUpdateForm {
    pub fn to_update(&self) -> Result<WeeklyUpdate, AppError> {
        let project_id = self
            .project_id
            .ok_or_else(|| AppError::validation("Välj ett projekt"))?;
        let week = required_date(&self.week_ending_date, "Veckoslut")?;

        let mut update = WeeklyUpdate::new(project_id, week);
        update.accomplishments = self.accomplishments.trim().to_string();
        update.decisions_needed = self.decisions_needed.trim().to_string();
        update.milestones = self.milestones.trim().to_string();
        update.status_indicator = self.status_indicator;
        update.rag = self
            .rag
            .iter()
            .map(|input| RagEntry {
                id: None,
                area: input.area,
                status: input.status,
                comment: input.comment.trim().to_string(),
            })
            .collect();

        update.risks_issues = unique_lines(&self.risks)
            .into_iter()
            .map(|line| RiskIssue::new(RiskKind::Risk, line))
            .chain(
                unique_lines(&self.issues)
                    .into_iter()
                    .map(|line| RiskIssue::new(RiskKind::Issue, line)),
            )
            .collect();

        update.action_items = unique_lines(&self.action_items)
            .into_iter()
            .map(|line| ActionItem::pending(line, self.client_input_required))
            .collect();

        if self.include_qe {
            update.qe_metrics = Some(self.qe.to_metrics()?);
        }

        update.validate()?;
        Ok(update)
    }
}

/// Formulärdata för ny milstolpe
#[derive(Debug, Clone, Default)]
pub struct MilestoneForm {
    pub project_id: Option<i64>,
    pub parent_id: Option<i64>,
    pub name: String,
    pub planned_start: String,
    pub planned_end: String,
    /// Procent 0-100 i formuläret, lagras som andel
    pub weightage_percent: String,
}

impl MilestoneForm {
    pub fn to_milestone(&self) -> Result<Milestone, AppError> {
        let project_id = self
            .project_id
            .ok_or_else(|| AppError::validation("Välj ett projekt"))?;
        let start = required_date(&self.planned_start, "Planerad start")?;
        let end = required_date(&self.planned_end, "Planerat slut")?;
        let weightage = parse_number(&self.weightage_percent, "Vikt")? / 100.0;

        let mut milestone = Milestone::new(project_id, self.name.trim(), start, end, weightage);
        milestone.parent_id = self.parent_id;
        milestone.validate()?;
        Ok(milestone)
    }
}

/// Översiktssiffror för startsidan
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DashboardStats {
    pub project_count: i64,
    pub updates_this_week: i64,
    pub pending_actions: i64,
    pub delayed_projects: i64,
}

pub struct EntryService<'a> {
    db: &'a Database,
}

impl<'a> EntryService<'a> {
    pub fn new(db: &'a Database) -> Self {
        Self { db }
    }

    pub fn add_project(&self, form: &ProjectForm) -> Result<i64> {
        let mut project = form.to_project()?;
        self.db.projects().create(&mut project)
    }

    pub fn submit_weekly_update(&self, form: &WeeklyUpdateForm) -> Result<i64> {
        let mut update = form.to_update()?;
        let id = self.db.updates().submit(&mut update)?;
        info!(
            "Veckouppdatering {} inskickad: {} risker/problem, {} åtgärder",
            id,
            update.risks_issues.len(),
            update.action_items.len()
        );
        Ok(id)
    }

    pub fn add_milestone(&self, form: &MilestoneForm) -> Result<i64> {
        let mut milestone = form.to_milestone()?;
        self.db.milestones().create(&mut milestone)
    }

    /// Framsteg i procent 0-100, kläms till giltigt intervall
    pub fn record_milestone_progress(
        &self,
        milestone_id: i64,
        week: NaiveDate,
        progress_percent: f64,
    ) -> Result<()> {
        let update = MilestoneUpdate::new(milestone_id, week, progress_percent / 100.0);
        self.db.milestones().upsert_progress(&update)?;
        info!(
            "Framsteg för milstolpe {} vecka {}: {:.0}%",
            milestone_id,
            week,
            update.actual_progress * 100.0
        );
        Ok(())
    }

    pub fn project_refs(&self) -> Result<Vec<ProjectRef>> {
        self.db.projects().list_refs()
    }

    pub fn week_dates(&self) -> Result<Vec<NaiveDate>> {
        self.db.updates().distinct_week_dates()
    }

    pub fn milestones_for(&self, project_id: i64) -> Result<Vec<Milestone>> {
        self.db.milestones().find_by_project(project_id)
    }

    pub fn dashboard_stats(&self, week: NaiveDate) -> Result<DashboardStats> {
        Ok(DashboardStats {
            project_count: self.db.projects().count()?,
            updates_this_week: self.db.updates().count_for_week(week)?,
            pending_actions: self.db.updates().count_pending_actions()?,
            delayed_projects: self.db.updates().count_delayed_projects()?,
        })
    }
}

fn required_date(value: &str, field: &str) -> Result<NaiveDate, AppError> {
    if value.trim().is_empty() {
        return Err(AppError::validation(format!("{} krävs", field)));
    }
    parse_date(value).ok_or_else(|| {
        AppError::validation(format!("{}: ogiltigt datum '{}'", field, value.trim()))
    })
}

fn parse_count(value: &str, field: &str) -> Result<i64, AppError> {
    let value = value.trim();
    if value.is_empty() {
        return Ok(0);
    }
    value
        .parse::<i64>()
        .map_err(|_| AppError::validation(format!("{}: '{}' är inte ett heltal", field, value)))
}

fn parse_number(value: &str, field: &str) -> Result<f64, AppError> {
    let value = value.trim();
    if value.is_empty() {
        return Ok(0.0);
    }
    value
        .replace(',', ".")
        .parse::<f64>()
        .ok()
        .filter(|v| v.is_finite())
        .ok_or_else(|| AppError::validation(format!("{}: '{}' är inte ett tal", field, value)))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn project_form(name: &str) -> ProjectForm {
        ProjectForm {
            name: name.into(),
            client_business_unit: "Retail".into(),
            project_manager: "Ana Ruiz".into(),
            start_date: "2024-01-01".into(),
            end_date: "2024-12-31".into(),
            current_phase: ProjectPhase::Build,
        }
    }

    fn update_form(project_id: i64) -> WeeklyUpdateForm {
        WeeklyUpdateForm {
            project_id: Some(project_id),
            week_ending_date: "2024-03-08".into(),
            accomplishments: "Closed sprint 4".into(),
            ..Default::default()
        }
    }

    #[test]
    fn test_project_form_validation() {
        let mut form = project_form("Payments");
        assert!(form.to_project().is_ok());

        form.end_date = "2023-12-31".into();
        assert!(form.to_project().unwrap_err().is_validation());

        form.end_date = "not a date".into();
        assert!(form.to_project().is_err());

        let blank = project_form("   ");
        assert!(blank.to_project().is_err());
    }

    #[test]
    fn test_update_form_splits_lines() {
        let mut form = update_form(1);
        form.risks = "Vendor delay\n\n  Vendor delay  \nBudget".into();
        form.issues = "Env down".into();
        form.action_items = "Escalate\nEscalate\nRe-plan\n".into();
        form.client_input_required = true;

        let update = form.to_update().unwrap();
        let risks: Vec<(RiskKind, &str)> = update
            .risks_issues
            .iter()
            .map(|r| (r.kind, r.description.as_str()))
            .collect();
        assert_eq!(
            risks,
            vec![
                (RiskKind::Risk, "Vendor delay"),
                (RiskKind::Risk, "Budget"),
                (RiskKind::Issue, "Env down"),
            ]
        );
        assert_eq!(update.risks_issues[0].owner, "TBD");
        assert_eq!(update.action_items.len(), 2);
        assert!(update.action_items.iter().all(|a| a.client_input_required));
        assert!(update.action_items.iter().all(|a| a.status == "Pending"));
        assert_eq!(update.rag.len(), 5);
        assert!(update.qe_metrics.is_none());
    }

    #[test]
    fn test_update_form_requires_project() {
        let mut form = update_form(1);
        form.project_id = None;
        assert!(form.to_update().unwrap_err().is_validation());
    }

    #[test]
    fn test_qe_form_parsing() {
        let mut form = update_form(1);
        form.include_qe = true;
        form.qe.total_test_cases = "100".into();
        form.qe.executed_test_cases = "60".into();
        form.qe.passed_test_cases = "55".into();
        form.qe.progress_percent = "60,5".into();

        let qe = form.to_update().unwrap().qe_metrics.unwrap();
        assert_eq!(qe.total_test_cases, 100);
        assert_eq!(qe.failed_test_cases, 0);
        assert_eq!(qe.progress_percent, 60.5);

        form.qe.open_defects = "many".into();
        assert!(form.to_update().is_err());
    }

    #[test]
    fn test_submit_round_trip() {
        let db = Database::open_in_memory().unwrap();
        let service = EntryService::new(&db);
        let project_id = service.add_project(&project_form("Payments")).unwrap();

        let mut form = update_form(project_id);
        form.decisions_needed = "Approve budget".into();
        form.status_indicator = StatusIndicator::Delayed;
        form.rag[1].status = RagStatus::Red;
        form.rag[1].comment = "Two weeks late".into();
        form.risks = "Vendor delay".into();
        form.action_items = "Escalate".into();

        let update_id = service.submit_weekly_update(&form).unwrap();
        let stored = db.updates().find_by_id(update_id).unwrap().unwrap();

        assert_eq!(stored.project_id, project_id);
        assert_eq!(stored.week_ending_date, NaiveDate::from_ymd_opt(2024, 3, 8).unwrap());
        assert_eq!(stored.accomplishments, "Closed sprint 4");
        assert_eq!(stored.decisions_needed, "Approve budget");
        assert_eq!(stored.status_indicator, StatusIndicator::Delayed);
        assert_eq!(stored.rag.len(), 5);
        let timeline = stored.rag.iter().find(|r| r.area == RagArea::Timeline).unwrap();
        assert_eq!(timeline.status, RagStatus::Red);
        assert_eq!(timeline.comment, "Two weeks late");
        assert_eq!(stored.risks_issues.len(), 1);
        assert_eq!(stored.action_items.len(), 1);
    }

    #[test]
    fn test_submit_for_missing_project() {
        let db = Database::open_in_memory().unwrap();
        let err = EntryService::new(&db)
            .submit_weekly_update(&update_form(42))
            .unwrap_err();
        assert!(matches!(
            err.downcast_ref::<AppError>(),
            Some(AppError::NotFound(_))
        ));
        assert_eq!(db.updates().distinct_week_dates().unwrap().len(), 0);
    }

    #[test]
    fn test_milestone_and_progress() {
        let db = Database::open_in_memory().unwrap();
        let service = EntryService::new(&db);
        let project_id = service.add_project(&project_form("Platform")).unwrap();

        let form = MilestoneForm {
            project_id: Some(project_id),
            parent_id: None,
            name: "Design".into(),
            planned_start: "2024-03-04".into(),
            planned_end: "2024-03-14".into(),
            weightage_percent: "40".into(),
        };
        let id = service.add_milestone(&form).unwrap();
        let milestones = service.milestones_for(project_id).unwrap();
        assert_eq!(milestones.len(), 1);
        assert!((milestones[0].weightage - 0.4).abs() < 1e-9);
        assert_eq!(milestones[0].duration_days, 10);

        let week = NaiveDate::from_ymd_opt(2024, 3, 8).unwrap();
        service.record_milestone_progress(id, week, 150.0).unwrap();
        assert_eq!(db.milestones().progress_for_week(id, week).unwrap(), Some(1.0));

        service.record_milestone_progress(id, week, 30.0).unwrap();
        assert_eq!(db.milestones().progress_for_week(id, week).unwrap(), Some(0.3));

        let too_heavy = MilestoneForm {
            weightage_percent: "120".into(),
            ..form
        };
        assert!(service.add_milestone(&too_heavy).is_err());
    }

    #[test]
    fn test_dashboard_stats() {
        let db = Database::open_in_memory().unwrap();
        let service = EntryService::new(&db);
        let project_id = service.add_project(&project_form("Payments")).unwrap();
        service.add_project(&project_form("Billing")).unwrap();

        let mut form = update_form(project_id);
        form.action_items = "Escalate\nRe-plan".into();
        form.status_indicator = StatusIndicator::Delayed;
        service.submit_weekly_update(&form).unwrap();

        let stats = service
            .dashboard_stats(NaiveDate::from_ymd_opt(2024, 3, 8).unwrap())
            .unwrap();
        assert_eq!(
            stats,
            DashboardStats {
                project_count: 2,
                updates_this_week: 1,
                pending_actions: 2,
                delayed_projects: 1,
            }
        );
    }
}
