//! Rapportfrågor
//!
//! Returnerar platta rader direkt från JOIN-frågan. Varje uppdatering ger en
//! rad per kombination av RAG-, risk- och åtgärdsrad (fan-out); vikningen till
//! en post per projekt sker i `services::aggregator`.

use anyhow::{Context, Result};
use chrono::NaiveDate;
use rusqlite::{params, Connection, Row};
use std::sync::{Arc, Mutex};
use tracing::debug;

use super::lock;

/// En rad ur veckorapportens JOIN
#[derive(Debug, Clone, PartialEq)]
pub struct ReportRow {
    pub project_id: i64,
    pub project_name: String,
    pub client_business_unit: Option<String>,
    pub project_manager: Option<String>,
    pub start_date: Option<NaiveDate>,
    pub end_date: Option<NaiveDate>,
    pub current_phase: Option<String>,

    pub update_id: i64,
    pub week_ending_date: NaiveDate,
    pub accomplishments: Option<String>,
    pub decisions_needed: Option<String>,
    pub milestones: Option<String>,
    pub status_indicator: Option<String>,

    pub rag_id: Option<i64>,
    pub rag_area: Option<String>,
    pub rag_status: Option<String>,
    pub rag_comment: Option<String>,

    pub risk_issue_id: Option<i64>,
    pub risk_type: Option<String>,
    pub risk_description: Option<String>,
    pub risk_owner: Option<String>,
    pub risk_mitigation_eta: Option<String>,

    pub action_id: Option<i64>,
    pub action_description: Option<String>,
    pub action_status: Option<String>,
    pub action_client_input_required: Option<bool>,

    pub qe_total_test_cases: Option<i64>,
    pub qe_executed_test_cases: Option<i64>,
    pub qe_passed_test_cases: Option<i64>,
    pub qe_failed_test_cases: Option<i64>,
    pub qe_blocked_test_cases: Option<i64>,
    pub qe_open_defects: Option<i64>,
    pub qe_closed_defects: Option<i64>,
    pub qe_critical_defects: Option<i64>,
    pub qe_progress_percent: Option<f64>,
}

/// Milstolpe med senaste framsteg på eller före referensveckan
#[derive(Debug, Clone, PartialEq)]
pub struct MilestoneRow {
    pub milestone_id: i64,
    pub parent_id: Option<i64>,
    pub name: String,
    pub planned_start: NaiveDate,
    pub planned_end: NaiveDate,
    pub weightage: f64,
    pub actual_progress: Option<f64>,
}

const REPORT_QUERY: &str = "
    SELECT p.project_id, p.project_name, p.client_business_unit, p.project_manager,
           p.start_date, p.end_date, p.current_phase,
           w.update_id, w.week_ending_date, w.accomplishments, w.decisions_needed,
           w.milestones, w.status_indicator,
           r.rag_id, r.area, r.status, r.comment,
           ri.risk_issue_id, ri.type, ri.description, ri.owner, ri.mitigation_eta,
           a.action_id, a.description, a.status, a.client_input_required,
           q.total_test_cases, q.executed_test_cases, q.passed_test_cases,
           q.failed_test_cases, q.blocked_test_cases, q.open_defects,
           q.closed_defects, q.critical_defects, q.progress_percent
    FROM weekly_updates w
    JOIN projects p ON w.project_id = p.project_id
    LEFT JOIN rag_status r ON r.update_id = w.update_id
    LEFT JOIN risks_issues ri ON ri.update_id = w.update_id
    LEFT JOIN action_items a ON a.update_id = w.update_id
    LEFT JOIN qe_metrics q ON q.update_id = w.update_id
    WHERE (?1 IS NULL OR date(w.week_ending_date) = date(?1))
      AND (?2 IS NULL OR p.project_id = ?2)
      AND w.update_id = (
          SELECT MAX(w2.update_id) FROM weekly_updates w2
          WHERE w2.project_id = w.project_id
            AND date(w2.week_ending_date) = date(w.week_ending_date)
      )
    ORDER BY p.project_name, w.week_ending_date DESC, r.rag_id, ri.risk_issue_id, a.action_id
";

pub struct ReportRepository {
    conn: Arc<Mutex<Connection>>,
}

impl ReportRepository {
    pub fn new(conn: Arc<Mutex<Connection>>) -> Self {
        Self { conn }
    }

    /// Rader för en vecka, eventuellt filtrerat på projekt
    pub fn weekly_rows(&self, week: NaiveDate, project_id: Option<i64>) -> Result<Vec<ReportRow>> {
        self.query_rows(Some(week), project_id)
    }

    /// Rader för alla veckor i ett projekt, senaste veckan först
    pub fn history_rows(&self, project_id: i64) -> Result<Vec<ReportRow>> {
        self.query_rows(None, Some(project_id))
    }

    fn query_rows(&self, week: Option<NaiveDate>, project_id: Option<i64>) -> Result<Vec<ReportRow>> {
        let conn = lock(&self.conn)?;
        let mut stmt = conn.prepare(REPORT_QUERY)?;

        let rows = stmt
            .query_map(params![week, project_id], Self::row_to_report_row)?
            .collect::<rusqlite::Result<Vec<_>>>()
            .context("Kunde inte läsa rapportdata")?;

        debug!(
            "Rapportfråga (vecka {:?}, projekt {:?}) gav {} rader",
            week,
            project_id,
            rows.len()
        );
        Ok(rows)
    }

    /// Milstolpar för ett projekt med senaste framsteg till och med veckan
    pub fn milestone_rows(&self, project_id: i64, reference_week: NaiveDate) -> Result<Vec<MilestoneRow>> {
        let conn = lock(&self.conn)?;
        let mut stmt = conn.prepare(
            "SELECT m.milestone_id, m.parent_milestone_id, m.milestone_name,
                    m.planned_start_date, m.planned_end_date, m.weightage,
                    (SELECT mu.actual_progress FROM milestone_updates mu
                     WHERE mu.milestone_id = m.milestone_id
                       AND mu.week_ending_date <= ?2
                     ORDER BY mu.week_ending_date DESC
                     LIMIT 1)
             FROM milestones m
             WHERE m.project_id = ?1
             ORDER BY COALESCE(m.parent_milestone_id, m.milestone_id),
                      m.parent_milestone_id IS NOT NULL,
                      m.planned_start_date,
                      m.milestone_id",
        )?;

        let rows = stmt
            .query_map(params![project_id, reference_week], |row| {
                Ok(MilestoneRow {
                    milestone_id: row.get(0)?,
                    parent_id: row.get(1)?,
                    name: row.get(2)?,
                    planned_start: row.get(3)?,
                    planned_end: row.get(4)?,
                    weightage: row.get(5)?,
                    actual_progress: row.get(6)?,
                })
            })?
            .collect::<rusqlite::Result<Vec<_>>>()?;

        Ok(rows)
    }

    fn row_to_report_row(row: &Row) -> rusqlite::Result<ReportRow> {
        Ok(ReportRow {
            project_id: row.get(0)?,
            project_name: row.get(1)?,
            client_business_unit: row.get(2)?,
            project_manager: row.get(3)?,
            start_date: row.get(4)?,
            end_date: row.get(5)?,
            current_phase: row.get(6)?,
            update_id: row.get(7)?,
            week_ending_date: row.get(8)?,
            accomplishments: row.get(9)?,
            decisions_needed: row.get(10)?,
            milestones: row.get(11)?,
            status_indicator: row.get(12)?,
            rag_id: row.get(13)?,
            rag_area: row.get(14)?,
            rag_status: row.get(15)?,
            rag_comment: row.get(16)?,
            risk_issue_id: row.get(17)?,
            risk_type: row.get(18)?,
            risk_description: row.get(19)?,
            risk_owner: row.get(20)?,
            risk_mitigation_eta: row.get(21)?,
            action_id: row.get(22)?,
            action_description: row.get(23)?,
            action_status: row.get(24)?,
            action_client_input_required: row.get(25)?,
            qe_total_test_cases: row.get(26)?,
            qe_executed_test_cases: row.get(27)?,
            qe_passed_test_cases: row.get(28)?,
            qe_failed_test_cases: row.get(29)?,
            qe_blocked_test_cases: row.get(30)?,
            qe_open_defects: row.get(31)?,
            qe_closed_defects: row.get(32)?,
            qe_critical_defects: row.get(33)?,
            qe_progress_percent: row.get(34)?,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::Database;
    use crate::models::{
        ActionItem, Project, RagArea, RagEntry, RagStatus, RiskIssue, RiskKind, WeeklyUpdate,
    };

    fn d(y: i32, m: u32, day: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, day).unwrap()
    }

    #[test]
    fn test_join_fans_out() {
        let db = Database::open_in_memory().unwrap();
        let mut project = Project::new("Mobile App", d(2024, 1, 1), d(2024, 6, 30));
        let project_id = db.projects().create(&mut project).unwrap();

        let mut update = WeeklyUpdate::new(project_id, d(2024, 3, 8));
        update.rag = RagArea::ALL
            .into_iter()
            .map(|area| RagEntry {
                id: None,
                area,
                status: RagStatus::Amber,
                comment: String::new(),
            })
            .collect();
        update.risks_issues = vec![
            RiskIssue::new(RiskKind::Risk, "Store review"),
            RiskIssue::new(RiskKind::Issue, "Crash on login"),
        ];
        update.action_items = vec![ActionItem::pending("Book pen test", false)];
        db.updates().submit(&mut update).unwrap();

        let rows = db.reports().weekly_rows(d(2024, 3, 8), None).unwrap();
        // 5 RAG * 2 risker * 1 åtgärd
        assert_eq!(rows.len(), 10);
        assert!(rows.iter().all(|r| r.project_name == "Mobile App"));
        assert!(rows.iter().all(|r| r.qe_total_test_cases.is_none()));

        assert!(db.reports().weekly_rows(d(2024, 3, 15), None).unwrap().is_empty());
        assert!(db
            .reports()
            .weekly_rows(d(2024, 3, 8), Some(project_id + 1))
            .unwrap()
            .is_empty());
    }
}
