//! Rapportaggregering
//!
//! Viker de platta JOIN-raderna till en post per projekt. Underrader
//! dedupliceras på rad-ID, inte på innehåll, så att fan-out från flera
//! LEFT JOIN inte ger dubbletter medan två likalydande rader behålls.

use anyhow::Result;
use chrono::NaiveDate;
use std::collections::{HashMap, HashSet};
use tracing::{debug, info};

use crate::db::{Database, MilestoneRow, ReportRow};
use crate::models::{
    expected_progress, ActionItem, MilestoneProgress, MilestoneStatus, ProjectPhase,
    ProjectReport, QeMetrics, RagArea, RagEntry, RagStatus, Report, ReportKind, RiskIssue,
    RiskKind, StatusIndicator,
};
use crate::utils::date::format_date;

/// Resultat av en rapportbegäran
#[derive(Debug, Clone)]
pub enum ReportOutcome {
    Ready(Report),
    /// Ingen data, med de veckor som faktiskt finns
    Empty { available_weeks: Vec<NaiveDate> },
}

pub struct ReportAggregator<'a> {
    db: &'a Database,
}

impl<'a> ReportAggregator<'a> {
    pub fn new(db: &'a Database) -> Self {
        Self { db }
    }

    /// Veckorapport för alla projekt eller ett valt projekt
    pub fn weekly_summary(&self, week: NaiveDate, project_id: Option<i64>) -> Result<ReportOutcome> {
        let rows = self.db.reports().weekly_rows(week, project_id)?;
        let mut projects = fold_rows(&rows, |row| row.project_name.clone());

        for project in &mut projects {
            self.attach_milestones(project, week)?;
        }

        info!(
            "Veckorapport {} sammanställd: {} projekt av {} rader",
            week,
            projects.len(),
            rows.len()
        );

        self.outcome(Report {
            kind: ReportKind::WeeklySummary,
            title: format!("Weekly Report for {}", format_date(week)),
            reference_date: week,
            projects,
        })
    }

    /// Alla veckor för ett projekt, senaste först
    pub fn project_history(&self, project_id: i64) -> Result<ReportOutcome> {
        let rows = self.db.reports().history_rows(project_id)?;
        let mut projects = fold_rows(&rows, |row| format_date(row.week_ending_date));

        for project in &mut projects {
            let week = project.week_ending_date;
            self.attach_milestones(project, week)?;
        }

        let reference_date = projects
            .first()
            .map(|p| p.week_ending_date)
            .unwrap_or_else(|| chrono::Local::now().date_naive());
        let title = match projects.first() {
            Some(p) => format!("Project History for {}", p.project_name),
            None => "Project History".to_string(),
        };

        info!(
            "Projekthistorik för projekt {}: {} veckor",
            project_id,
            projects.len()
        );

        self.outcome(Report {
            kind: ReportKind::ProjectHistory,
            title,
            reference_date,
            projects,
        })
    }

    fn outcome(&self, report: Report) -> Result<ReportOutcome> {
        if report.is_empty() {
            let available_weeks = self.db.updates().distinct_week_dates()?;
            return Ok(ReportOutcome::Empty { available_weeks });
        }
        Ok(ReportOutcome::Ready(report))
    }

    fn attach_milestones(&self, project: &mut ProjectReport, reference: NaiveDate) -> Result<()> {
        let rows = self.db.reports().milestone_rows(project.project_id, reference)?;
        project.milestones = milestone_progress(&rows, reference);
        project.weighted_progress = weighted_progress(&project.milestones);
        Ok(())
    }
}

/// Håller reda på vilka underrader som redan lagts till för en post
#[derive(Default)]
struct SeenChildren {
    rag: HashSet<i64>,
    risks: HashSet<i64>,
    actions: HashSet<i64>,
}

/// Vik platta rader till en post per nyckel i den ordning nycklarna först ses
pub fn fold_rows<K>(rows: &[ReportRow], key_of: impl Fn(&ReportRow) -> K) -> Vec<ProjectReport>
where
    K: std::hash::Hash + Eq,
{
    let mut entries: Vec<(ProjectReport, SeenChildren)> = Vec::new();
    let mut index: HashMap<K, usize> = HashMap::new();

    for row in rows {
        let key = key_of(row);
        let position = *index.entry(key).or_insert_with(|| {
            entries.push((new_entry(row), SeenChildren::default()));
            entries.len() - 1
        });
        let (entry, seen) = &mut entries[position];

        // Rader från en annan uppdatering än den första hör inte hit
        if row.update_id != entry.update_id {
            debug!(
                "Ignorerar rad från uppdatering {} för {}",
                row.update_id, entry.project_name
            );
            continue;
        }

        if let Some(rag_id) = row.rag_id {
            if seen.rag.insert(rag_id) {
                if let Some(rag) = rag_from_row(rag_id, row) {
                    entry.rag_status.push(rag);
                }
            }
        }

        if let Some(risk_id) = row.risk_issue_id {
            if seen.risks.insert(risk_id) {
                if let Some(risk) = risk_from_row(risk_id, row) {
                    entry.risks_issues.push(risk);
                }
            }
        }

        if let Some(action_id) = row.action_id {
            if seen.actions.insert(action_id) {
                entry.action_items.push(action_from_row(action_id, row));
            }
        }
    }

    entries.into_iter().map(|(entry, _)| entry).collect()
}

fn new_entry(row: &ReportRow) -> ProjectReport {
    ProjectReport {
        project_id: row.project_id,
        project_name: row.project_name.clone(),
        client_business_unit: row.client_business_unit.clone().unwrap_or_default(),
        project_manager: row.project_manager.clone().unwrap_or_default(),
        start_date: row.start_date,
        end_date: row.end_date,
        current_phase: row.current_phase.as_deref().and_then(ProjectPhase::from_db_str),
        update_id: row.update_id,
        week_ending_date: row.week_ending_date,
        accomplishments: row.accomplishments.clone().unwrap_or_default(),
        decisions_needed: row.decisions_needed.clone().unwrap_or_default(),
        milestones_text: row.milestones.clone().unwrap_or_default(),
        status_indicator: row.status_indicator.as_deref().and_then(StatusIndicator::from_db_str),
        rag_status: Vec::new(),
        risks_issues: Vec::new(),
        action_items: Vec::new(),
        qe_metrics: qe_from_row(row),
        milestones: Vec::new(),
        weighted_progress: None,
    }
}

fn rag_from_row(rag_id: i64, row: &ReportRow) -> Option<RagEntry> {
    Some(RagEntry {
        id: Some(rag_id),
        area: RagArea::from_db_str(row.rag_area.as_deref()?)?,
        status: RagStatus::from_db_str(row.rag_status.as_deref()?)?,
        comment: row.rag_comment.clone().unwrap_or_default(),
    })
}

fn risk_from_row(risk_id: i64, row: &ReportRow) -> Option<RiskIssue> {
    Some(RiskIssue {
        id: Some(risk_id),
        kind: RiskKind::from_db_str(row.risk_type.as_deref()?)?,
        description: row.risk_description.clone().unwrap_or_default(),
        owner: row.risk_owner.clone().unwrap_or_default(),
        mitigation_eta: row.risk_mitigation_eta.clone().unwrap_or_default(),
    })
}

fn action_from_row(action_id: i64, row: &ReportRow) -> ActionItem {
    ActionItem {
        id: Some(action_id),
        description: row.action_description.clone().unwrap_or_default(),
        status: row.action_status.clone().unwrap_or_default(),
        client_input_required: row.action_client_input_required.unwrap_or(false),
    }
}

fn qe_from_row(row: &ReportRow) -> Option<QeMetrics> {
    Some(QeMetrics {
        total_test_cases: row.qe_total_test_cases?,
        executed_test_cases: row.qe_executed_test_cases.unwrap_or(0),
        passed_test_cases: row.qe_passed_test_cases.unwrap_or(0),
        failed_test_cases: row.qe_failed_test_cases.unwrap_or(0),
        blocked_test_cases: row.qe_blocked_test_cases.unwrap_or(0),
        open_defects: row.qe_open_defects.unwrap_or(0),
        closed_defects: row.qe_closed_defects.unwrap_or(0),
        critical_defects: row.qe_critical_defects.unwrap_or(0),
        progress_percent: row.qe_progress_percent.unwrap_or(0.0),
    })
}

/// Förväntat framsteg och status per milstolpe vid referensdatumet
pub fn milestone_progress(rows: &[MilestoneRow], reference: NaiveDate) -> Vec<MilestoneProgress> {
    rows.iter()
        .map(|row| {
            let expected = expected_progress(row.planned_start, row.planned_end, reference);
            let actual = row.actual_progress.map(crate::models::clamp_progress);
            MilestoneProgress {
                milestone_id: row.milestone_id,
                parent_id: row.parent_id,
                name: row.name.clone(),
                planned_start: row.planned_start,
                planned_end: row.planned_end,
                weightage: row.weightage,
                expected_progress: expected,
                actual_progress: actual,
                status: MilestoneStatus::derive(expected, actual.unwrap_or(0.0)),
            }
        })
        .collect()
}

/// Viktat totalframsteg över toppnivåmilstolpar, None om inga finns
pub fn weighted_progress(milestones: &[MilestoneProgress]) -> Option<f64> {
    let top_level: Vec<&MilestoneProgress> = milestones.iter().filter(|m| !m.is_child()).collect();
    if top_level.is_empty() {
        return None;
    }

    let total: f64 = top_level
        .iter()
        .map(|m| m.weightage * m.actual_progress.unwrap_or(0.0))
        .sum();
    Some(crate::models::clamp_progress(total))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{Milestone, MilestoneUpdate, Project, WeeklyUpdate};

    fn d(y: i32, m: u32, day: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, day).unwrap()
    }

    fn week() -> NaiveDate {
        d(2024, 3, 8)
    }

    fn add_project(db: &Database, name: &str) -> i64 {
        let mut project = Project::new(name, d(2024, 1, 1), d(2024, 12, 31));
        project.project_manager = "Ana Ruiz".into();
        db.projects().create(&mut project).unwrap()
    }

    fn rag(statuses: [RagStatus; 5]) -> Vec<RagEntry> {
        RagArea::ALL
            .into_iter()
            .zip(statuses)
            .map(|(area, status)| RagEntry {
                id: None,
                area,
                status,
                comment: format!("{} comment", area),
            })
            .collect()
    }

    fn submit(
        db: &Database,
        project_id: i64,
        date: NaiveDate,
        risks: &[&str],
        actions: &[&str],
    ) -> WeeklyUpdate {
        let mut update = WeeklyUpdate::new(project_id, date);
        update.accomplishments = "Closed sprint 4".into();
        update.rag = rag([RagStatus::Green; 5]);
        update.risks_issues = risks.iter().map(|r| RiskIssue::new(RiskKind::Risk, *r)).collect();
        update.action_items = actions.iter().map(|a| ActionItem::pending(*a, false)).collect();
        db.updates().submit(&mut update).unwrap();
        update
    }

    fn ready(outcome: ReportOutcome) -> Report {
        match outcome {
            ReportOutcome::Ready(report) => report,
            ReportOutcome::Empty { .. } => panic!("väntade data"),
        }
    }

    #[test]
    fn test_fan_out_is_deduplicated() {
        let db = Database::open_in_memory().unwrap();
        let id = add_project(&db, "Payments");
        submit(&db, id, week(), &["Vendor delay", "Budget cut", "Key person leave"], &["Escalate", "Re-plan"]);

        let report = ready(ReportAggregator::new(&db).weekly_summary(week(), None).unwrap());
        assert_eq!(report.projects.len(), 1);

        let p = &report.projects[0];
        assert_eq!(p.rag_status.len(), 5);
        assert_eq!(p.risks_issues.len(), 3);
        assert_eq!(p.action_items.len(), 2);
        assert_eq!(
            p.rag_status.iter().map(|r| r.area).collect::<Vec<_>>(),
            RagArea::ALL.to_vec()
        );
        assert_eq!(p.risks_issues[0].description, "Vendor delay");
    }

    #[test]
    fn test_same_content_in_distinct_rows_is_kept() {
        // Två rader med samma text men olika ID ska båda räknas
        let row = |action_id: i64| ReportRow {
            project_id: 1,
            project_name: "Ops".into(),
            client_business_unit: None,
            project_manager: None,
            start_date: None,
            end_date: None,
            current_phase: None,
            update_id: 7,
            week_ending_date: week(),
            accomplishments: None,
            decisions_needed: None,
            milestones: None,
            status_indicator: None,
            rag_id: None,
            rag_area: None,
            rag_status: None,
            rag_comment: None,
            risk_issue_id: None,
            risk_type: None,
            risk_description: None,
            risk_owner: None,
            risk_mitigation_eta: None,
            action_id: Some(action_id),
            action_description: Some("Follow up".into()),
            action_status: Some("Pending".into()),
            action_client_input_required: Some(false),
            qe_total_test_cases: None,
            qe_executed_test_cases: None,
            qe_passed_test_cases: None,
            qe_failed_test_cases: None,
            qe_blocked_test_cases: None,
            qe_open_defects: None,
            qe_closed_defects: None,
            qe_critical_defects: None,
            qe_progress_percent: None,
        };

        let rows = vec![row(1), row(2), row(1), row(2)];
        let folded = fold_rows(&rows, |r| r.project_name.clone());
        assert_eq!(folded.len(), 1);
        assert_eq!(folded[0].action_items.len(), 2);
        assert!(folded[0].rag_status.is_empty());
        assert!(folded[0].qe_metrics.is_none());
    }

    #[test]
    fn test_project_without_children_has_empty_lists() {
        let db = Database::open_in_memory().unwrap();
        let id = add_project(&db, "Quiet");
        let mut update = WeeklyUpdate::new(id, week());
        update.rag = rag([RagStatus::Green; 5]);
        db.updates().submit(&mut update).unwrap();

        let report = ready(ReportAggregator::new(&db).weekly_summary(week(), None).unwrap());
        let p = &report.projects[0];
        assert_eq!(p.rag_status.len(), 5);
        assert!(p.risks_issues.is_empty());
        assert!(p.action_items.is_empty());
        assert!(p.milestones.is_empty());
        assert_eq!(p.weighted_progress, None);
    }

    #[test]
    fn test_project_without_update_is_absent() {
        let db = Database::open_in_memory().unwrap();
        let a = add_project(&db, "Alpha");
        add_project(&db, "Beta");
        submit(&db, a, week(), &[], &[]);

        let report = ready(ReportAggregator::new(&db).weekly_summary(week(), None).unwrap());
        let names: Vec<&str> = report.projects.iter().map(|p| p.project_name.as_str()).collect();
        assert_eq!(names, vec!["Alpha"]);
        assert_eq!(report.title, "Weekly Report for 2024-03-08");
    }

    #[test]
    fn test_empty_week_lists_available_weeks() {
        let db = Database::open_in_memory().unwrap();
        let a = add_project(&db, "Alpha");
        submit(&db, a, week(), &[], &[]);

        match ReportAggregator::new(&db).weekly_summary(d(2024, 3, 15), None).unwrap() {
            ReportOutcome::Empty { available_weeks } => assert_eq!(available_weeks, vec![week()]),
            ReportOutcome::Ready(_) => panic!("väntade tom rapport"),
        }
    }

    #[test]
    fn test_project_filter_and_order() {
        let db = Database::open_in_memory().unwrap();
        let zeta = add_project(&db, "Zeta");
        let alpha = add_project(&db, "Alpha");
        submit(&db, zeta, week(), &["Z risk"], &[]);
        submit(&db, alpha, week(), &["A risk"], &[]);

        let aggregator = ReportAggregator::new(&db);
        let all = ready(aggregator.weekly_summary(week(), None).unwrap());
        let names: Vec<&str> = all.projects.iter().map(|p| p.project_name.as_str()).collect();
        assert_eq!(names, vec!["Alpha", "Zeta"]);

        let only = ready(aggregator.weekly_summary(week(), Some(zeta)).unwrap());
        assert_eq!(only.projects.len(), 1);
        assert_eq!(only.projects[0].risks_issues[0].description, "Z risk");
    }

    #[test]
    fn test_latest_update_of_week_wins() {
        let db = Database::open_in_memory().unwrap();
        let id = add_project(&db, "Payments");
        submit(&db, id, week(), &["Old risk"], &["Old action"]);
        let latest = submit(&db, id, week(), &["New risk"], &[]);

        let report = ready(ReportAggregator::new(&db).weekly_summary(week(), None).unwrap());
        let p = &report.projects[0];
        assert_eq!(Some(p.update_id), latest.id);
        assert_eq!(p.risks_issues.len(), 1);
        assert_eq!(p.risks_issues[0].description, "New risk");
        assert!(p.action_items.is_empty());
        assert_eq!(p.rag_status.len(), 5);
    }

    #[test]
    fn test_round_trip_fields_unchanged() {
        let db = Database::open_in_memory().unwrap();
        let id = add_project(&db, "Round Trip <&>");

        let mut update = WeeklyUpdate::new(id, week());
        update.accomplishments = "Line one\nLine two".into();
        update.decisions_needed = "Approve budget".into();
        update.milestones = "UAT start 15/03".into();
        update.status_indicator = StatusIndicator::Delayed;
        update.rag = rag([
            RagStatus::Green,
            RagStatus::Amber,
            RagStatus::Red,
            RagStatus::Green,
            RagStatus::Amber,
        ]);
        update.qe_metrics = Some(QeMetrics {
            total_test_cases: 10,
            executed_test_cases: 5,
            passed_test_cases: 4,
            failed_test_cases: 1,
            progress_percent: 50.0,
            ..Default::default()
        });
        db.updates().submit(&mut update).unwrap();

        let report = ready(ReportAggregator::new(&db).weekly_summary(week(), Some(id)).unwrap());
        let p = &report.projects[0];
        assert_eq!(p.project_name, "Round Trip <&>");
        assert_eq!(p.accomplishments, update.accomplishments);
        assert_eq!(p.decisions_needed, update.decisions_needed);
        assert_eq!(p.milestones_text, update.milestones);
        assert_eq!(p.status_indicator, Some(StatusIndicator::Delayed));
        assert_eq!(p.rag_status, update.rag);
        assert_eq!(p.qe_metrics, update.qe_metrics);
        assert_eq!(p.project_manager, "Ana Ruiz");
    }

    #[test]
    fn test_milestone_progress_in_report() {
        let db = Database::open_in_memory().unwrap();
        let id = add_project(&db, "Platform");

        // 10 dagar, referens 4 dagar in -> 0.4 förväntat
        let mut design = Milestone::new(id, "Design", d(2024, 3, 4), d(2024, 3, 14), 0.5);
        let design_id = db.milestones().create(&mut design).unwrap();
        let mut build = Milestone::new(id, "Build", d(2024, 3, 20), d(2024, 4, 30), 0.5);
        db.milestones().create(&mut build).unwrap();

        db.milestones()
            .upsert_progress(&MilestoneUpdate::new(design_id, d(2024, 3, 1), 0.1))
            .unwrap();
        submit(&db, id, week(), &[], &[]);

        let report = ready(ReportAggregator::new(&db).weekly_summary(week(), None).unwrap());
        let milestones = &report.projects[0].milestones;
        assert_eq!(milestones.len(), 2);

        assert!((milestones[0].expected_progress - 0.4).abs() < 1e-9);
        assert_eq!(milestones[0].actual_progress, Some(0.1));
        assert_eq!(milestones[0].status, MilestoneStatus::Critical);

        assert_eq!(milestones[1].expected_progress, 0.0);
        assert_eq!(milestones[1].status, MilestoneStatus::NotStarted);

        let weighted = report.projects[0].weighted_progress.unwrap();
        assert!((weighted - 0.05).abs() < 1e-9);
    }

    #[test]
    fn test_project_history() {
        let db = Database::open_in_memory().unwrap();
        let id = add_project(&db, "History");
        submit(&db, id, d(2024, 3, 1), &["Early"], &[]);
        submit(&db, id, week(), &["Later"], &[]);

        let report = ready(ReportAggregator::new(&db).project_history(id).unwrap());
        assert_eq!(report.kind, ReportKind::ProjectHistory);
        assert_eq!(report.title, "Project History for History");
        let weeks: Vec<NaiveDate> = report.projects.iter().map(|p| p.week_ending_date).collect();
        assert_eq!(weeks, vec![week(), d(2024, 3, 1)]);
        assert_eq!(report.projects[1].risks_issues[0].description, "Early");
    }
}
