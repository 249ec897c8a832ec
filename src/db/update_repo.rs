use anyhow::{Context, Result};
use chrono::NaiveDate;
use rusqlite::{params, Connection, OptionalExtension, Row, Transaction};
use std::collections::HashSet;
use std::sync::{Arc, Mutex};
use tracing::{debug, info};

use super::lock;
use crate::models::{
    ActionItem, QeMetrics, RagArea, RagEntry, RagStatus, RiskIssue, RiskKind, StatusIndicator,
    WeeklyUpdate,
};
use crate::utils::AppError;

pub struct UpdateRepository {
    conn: Arc<Mutex<Connection>>,
}

impl UpdateRepository {
    pub fn new(conn: Arc<Mutex<Connection>>) -> Self {
        Self { conn }
    }

    /// Spara en veckouppdatering med alla underrader i en transaktion
    pub fn submit(&self, update: &mut WeeklyUpdate) -> Result<i64> {
        update.validate()?;

        let conn = lock(&self.conn)?;

        let project_exists: bool = conn.query_row(
            "SELECT EXISTS(SELECT 1 FROM projects WHERE project_id = ?)",
            [update.project_id],
            |row| row.get(0),
        )?;
        if !project_exists {
            return Err(AppError::not_found(format!("Projekt med ID {}", update.project_id)).into());
        }

        let tx = conn.unchecked_transaction()?;

        tx.execute(
            "INSERT INTO weekly_updates (project_id, week_ending_date, accomplishments,
                                         decisions_needed, milestones, status_indicator)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
            params![
                update.project_id,
                update.week_ending_date,
                update.accomplishments,
                update.decisions_needed,
                update.milestones,
                update.status_indicator.display_name(),
            ],
        )
        .context("Kunde inte spara veckouppdatering")?;
        let update_id = tx.last_insert_rowid();

        for entry in &mut update.rag {
            entry.comment = entry.comment.trim().to_string();
            tx.execute(
                "INSERT INTO rag_status (update_id, area, status, comment) VALUES (?1, ?2, ?3, ?4)",
                params![
                    update_id,
                    entry.area.display_name(),
                    entry.status.display_name(),
                    entry.comment,
                ],
            )?;
            entry.id = Some(tx.last_insert_rowid());
        }

        let inserted_risks = Self::insert_risks_issues(&tx, update_id, &mut update.risks_issues)?;
        let inserted_actions = Self::insert_action_items(&tx, update_id, &mut update.action_items)?;

        if let Some(ref qe) = update.qe_metrics {
            tx.execute(
                "INSERT INTO qe_metrics (update_id, total_test_cases, executed_test_cases,
                                         passed_test_cases, failed_test_cases, blocked_test_cases,
                                         open_defects, closed_defects, critical_defects,
                                         progress_percent)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10)",
                params![
                    update_id,
                    qe.total_test_cases,
                    qe.executed_test_cases,
                    qe.passed_test_cases,
                    qe.failed_test_cases,
                    qe.blocked_test_cases,
                    qe.open_defects,
                    qe.closed_defects,
                    qe.critical_defects,
                    qe.progress_percent,
                ],
            )?;
        }

        tx.commit().context("Kunde inte spara veckouppdatering")?;
        update.id = Some(update_id);

        info!(
            "Sparade veckouppdatering {} för projekt {} (vecka {}, {} risker/problem, {} åtgärder)",
            update_id, update.project_id, update.week_ending_date, inserted_risks, inserted_actions
        );
        Ok(update_id)
    }

    /// Infoga risker/problem som inte redan finns för uppdateringen.
    /// Dubbletter tas bort ur listan.
    fn insert_risks_issues(
        tx: &Transaction,
        update_id: i64,
        items: &mut Vec<RiskIssue>,
    ) -> Result<usize> {
        let mut existing: HashSet<(String, String)> = {
            let mut stmt =
                tx.prepare("SELECT type, description FROM risks_issues WHERE update_id = ?")?;
            let rows = stmt
                .query_map([update_id], |row| Ok((row.get(0)?, row.get(1)?)))?
                .collect::<rusqlite::Result<HashSet<_>>>()?;
            rows
        };

        let mut kept = Vec::with_capacity(items.len());
        for mut item in items.drain(..) {
            item.description = item.description.trim().to_string();
            if item.description.is_empty() {
                continue;
            }

            let key = (item.kind.display_name().to_string(), item.description.clone());
            if !existing.insert(key) {
                debug!("Hoppar över dubblett: {}", item.description);
                continue;
            }

            tx.execute(
                "INSERT INTO risks_issues (update_id, type, description, owner, mitigation_eta)
                 VALUES (?1, ?2, ?3, ?4, ?5)",
                params![
                    update_id,
                    item.kind.display_name(),
                    item.description,
                    item.owner.trim(),
                    item.mitigation_eta.trim(),
                ],
            )?;
            item.id = Some(tx.last_insert_rowid());
            kept.push(item);
        }

        let count = kept.len();
        *items = kept;
        Ok(count)
    }

    fn insert_action_items(
        tx: &Transaction,
        update_id: i64,
        items: &mut Vec<ActionItem>,
    ) -> Result<usize> {
        let mut existing: HashSet<String> = {
            let mut stmt = tx.prepare("SELECT description FROM action_items WHERE update_id = ?")?;
            let rows = stmt
                .query_map([update_id], |row| row.get(0))?
                .collect::<rusqlite::Result<HashSet<_>>>()?;
            rows
        };

        let mut kept = Vec::with_capacity(items.len());
        for mut item in items.drain(..) {
            item.description = item.description.trim().to_string();
            if item.description.is_empty() || !existing.insert(item.description.clone()) {
                continue;
            }

            tx.execute(
                "INSERT INTO action_items (update_id, description, status, client_input_required)
                 VALUES (?1, ?2, ?3, ?4)",
                params![
                    update_id,
                    item.description,
                    item.status,
                    item.client_input_required,
                ],
            )?;
            item.id = Some(tx.last_insert_rowid());
            kept.push(item);
        }

        let count = kept.len();
        *items = kept;
        Ok(count)
    }

    /// Hämta en uppdatering med alla underrader
    pub fn find_by_id(&self, update_id: i64) -> Result<Option<WeeklyUpdate>> {
        let conn = lock(&self.conn)?;

        let update = conn
            .query_row(
                "SELECT update_id, project_id, week_ending_date, accomplishments,
                        decisions_needed, milestones, status_indicator
                 FROM weekly_updates WHERE update_id = ?",
                [update_id],
                Self::row_to_update,
            )
            .optional()?;

        let Some(mut update) = update else {
            return Ok(None);
        };

        let mut stmt = conn.prepare(
            "SELECT rag_id, area, status, comment FROM rag_status WHERE update_id = ? ORDER BY rag_id",
        )?;
        update.rag = stmt
            .query_map([update_id], |row| {
                let area: String = row.get(1)?;
                let status: String = row.get(2)?;
                Ok((row.get(0)?, area, status, row.get(3)?))
            })?
            .collect::<rusqlite::Result<Vec<(i64, String, String, String)>>>()?
            .into_iter()
            .filter_map(|(id, area, status, comment)| {
                Some(RagEntry {
                    id: Some(id),
                    area: RagArea::from_db_str(&area)?,
                    status: RagStatus::from_db_str(&status)?,
                    comment,
                })
            })
            .collect();

        let mut stmt = conn.prepare(
            "SELECT risk_issue_id, type, description, owner, mitigation_eta
             FROM risks_issues WHERE update_id = ? ORDER BY risk_issue_id",
        )?;
        update.risks_issues = stmt
            .query_map([update_id], |row| {
                let kind: String = row.get(1)?;
                Ok((kind, RiskIssue {
                    id: Some(row.get(0)?),
                    kind: RiskKind::Risk,
                    description: row.get(2)?,
                    owner: row.get(3)?,
                    mitigation_eta: row.get(4)?,
                }))
            })?
            .collect::<rusqlite::Result<Vec<_>>>()?
            .into_iter()
            .filter_map(|(kind, mut item)| {
                item.kind = RiskKind::from_db_str(&kind)?;
                Some(item)
            })
            .collect();

        let mut stmt = conn.prepare(
            "SELECT action_id, description, status, client_input_required
             FROM action_items WHERE update_id = ? ORDER BY action_id",
        )?;
        update.action_items = stmt
            .query_map([update_id], |row| {
                Ok(ActionItem {
                    id: Some(row.get(0)?),
                    description: row.get(1)?,
                    status: row.get(2)?,
                    client_input_required: row.get(3)?,
                })
            })?
            .collect::<rusqlite::Result<Vec<_>>>()?;

        update.qe_metrics = conn
            .query_row(
                "SELECT total_test_cases, executed_test_cases, passed_test_cases,
                        failed_test_cases, blocked_test_cases, open_defects, closed_defects,
                        critical_defects, progress_percent
                 FROM qe_metrics WHERE update_id = ?",
                [update_id],
                |row| {
                    Ok(QeMetrics {
                        total_test_cases: row.get(0)?,
                        executed_test_cases: row.get(1)?,
                        passed_test_cases: row.get(2)?,
                        failed_test_cases: row.get(3)?,
                        blocked_test_cases: row.get(4)?,
                        open_defects: row.get(5)?,
                        closed_defects: row.get(6)?,
                        critical_defects: row.get(7)?,
                        progress_percent: row.get(8)?,
                    })
                },
            )
            .optional()?;

        Ok(Some(update))
    }

    /// Alla veckoslutsdatum som har minst en uppdatering
    pub fn distinct_week_dates(&self) -> Result<Vec<NaiveDate>> {
        let conn = lock(&self.conn)?;
        let mut stmt = conn.prepare(
            "SELECT DISTINCT week_ending_date FROM weekly_updates ORDER BY week_ending_date",
        )?;

        let dates = stmt
            .query_map([], |row| row.get(0))?
            .collect::<rusqlite::Result<Vec<NaiveDate>>>()?;

        Ok(dates)
    }

    /// Räkna uppdateringar för en vecka
    pub fn count_for_week(&self, week: NaiveDate) -> Result<i64> {
        let conn = lock(&self.conn)?;
        let count: i64 = conn.query_row(
            "SELECT COUNT(DISTINCT project_id) FROM weekly_updates WHERE week_ending_date = ?",
            [week],
            |row| row.get(0),
        )?;
        Ok(count)
    }

    /// Räkna väntande åtgärder i varje projekts senaste uppdatering
    pub fn count_pending_actions(&self) -> Result<i64> {
        let conn = lock(&self.conn)?;
        let count: i64 = conn.query_row(
            "SELECT COUNT(*) FROM action_items a
             WHERE a.status = 'Pending'
               AND a.update_id IN (SELECT MAX(update_id) FROM weekly_updates GROUP BY project_id)",
            [],
            |row| row.get(0),
        )?;
        Ok(count)
    }

    /// Räkna projekt vars senaste uppdatering är försenad
    pub fn count_delayed_projects(&self) -> Result<i64> {
        let conn = lock(&self.conn)?;
        let count: i64 = conn.query_row(
            "SELECT COUNT(*) FROM weekly_updates w
             WHERE w.status_indicator = ?
               AND w.update_id IN (SELECT MAX(update_id) FROM weekly_updates GROUP BY project_id)",
            [StatusIndicator::Delayed.display_name()],
            |row| row.get(0),
        )?;
        Ok(count)
    }

    fn row_to_update(row: &Row) -> rusqlite::Result<WeeklyUpdate> {
        let status: String = row.get(6)?;
        Ok(WeeklyUpdate {
            id: Some(row.get(0)?),
            project_id: row.get(1)?,
            week_ending_date: row.get(2)?,
            accomplishments: row.get(3)?,
            decisions_needed: row.get(4)?,
            milestones: row.get(5)?,
            status_indicator: StatusIndicator::from_db_str(&status).unwrap_or_default(),
            rag: Vec::new(),
            risks_issues: Vec::new(),
            action_items: Vec::new(),
            qe_metrics: None,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::Database;
    use crate::models::Project;

    fn week() -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, 3, 8).unwrap()
    }

    fn setup() -> (Database, i64) {
        let db = Database::open_in_memory().unwrap();
        let mut project = Project::new(
            "Claims Portal",
            NaiveDate::from_ymd_opt(2024, 1, 1).unwrap(),
            NaiveDate::from_ymd_opt(2024, 9, 30).unwrap(),
        );
        let id = db.projects().create(&mut project).unwrap();
        (db, id)
    }

    fn all_green() -> Vec<RagEntry> {
        RagArea::ALL
            .into_iter()
            .map(|area| RagEntry {
                id: None,
                area,
                status: RagStatus::Green,
                comment: String::new(),
            })
            .collect()
    }

    #[test]
    fn test_submit_and_read_back() {
        let (db, project_id) = setup();
        let repo = db.updates();

        let mut update = WeeklyUpdate::new(project_id, week());
        update.accomplishments = "Finished SIT\nStarted UAT".into();
        update.status_indicator = StatusIndicator::Delayed;
        update.rag = all_green();
        update.risks_issues = vec![
            RiskIssue::new(RiskKind::Risk, "Vendor delay"),
            RiskIssue::new(RiskKind::Risk, " Vendor delay "),
            RiskIssue::new(RiskKind::Issue, "Vendor delay"),
        ];
        update.action_items = vec![
            ActionItem::pending("Sign-off from client", true),
            ActionItem::pending("Sign-off from client", true),
            ActionItem::pending("   ", false),
        ];
        update.qe_metrics = Some(QeMetrics {
            total_test_cases: 50,
            executed_test_cases: 40,
            passed_test_cases: 35,
            failed_test_cases: 5,
            progress_percent: 80.0,
            ..Default::default()
        });

        let id = repo.submit(&mut update).unwrap();
        assert_eq!(update.risks_issues.len(), 2);
        assert_eq!(update.action_items.len(), 1);

        let loaded = repo.find_by_id(id).unwrap().unwrap();
        assert_eq!(loaded.accomplishments, "Finished SIT\nStarted UAT");
        assert_eq!(loaded.status_indicator, StatusIndicator::Delayed);
        assert_eq!(loaded.rag.len(), 5);
        assert_eq!(loaded.risks_issues.len(), 2);
        assert_eq!(loaded.action_items.len(), 1);
        assert!(loaded.action_items[0].client_input_required);
        assert_eq!(loaded.qe_metrics.unwrap().passed_test_cases, 35);
    }

    #[test]
    fn test_rag_comment_round_trip() {
        let (db, project_id) = setup();
        let repo = db.updates();

        let mut update = WeeklyUpdate::new(project_id, week());
        update.rag = all_green();
        update.rag[0].comment = "  scope agreed with client \n".into();
        let area = update.rag[0].area;

        let id = repo.submit(&mut update).unwrap();
        assert_eq!(update.rag[0].comment, "scope agreed with client");

        let loaded = repo.find_by_id(id).unwrap().unwrap();
        let stored = loaded.rag.iter().find(|r| r.area == area).unwrap();
        assert_eq!(stored.comment, update.rag[0].comment);
    }

    #[test]
    fn test_submit_requires_existing_project() {
        let (db, project_id) = setup();
        let mut update = WeeklyUpdate::new(project_id + 99, week());
        update.rag = all_green();

        let err = db.updates().submit(&mut update).unwrap_err();
        assert!(matches!(err.downcast_ref::<AppError>(), Some(AppError::NotFound(_))));
        assert!(db.updates().distinct_week_dates().unwrap().is_empty());
    }

    #[test]
    fn test_submit_requires_all_rag_areas() {
        let (db, project_id) = setup();
        let mut update = WeeklyUpdate::new(project_id, week());
        update.rag = all_green();
        update.rag.truncate(3);

        assert!(db.updates().submit(&mut update).is_err());
        assert_eq!(db.updates().count_for_week(week()).unwrap(), 0);
    }

    #[test]
    fn test_week_dates_and_counts() {
        let (db, project_id) = setup();
        let repo = db.updates();

        let later = NaiveDate::from_ymd_opt(2024, 3, 15).unwrap();
        for date in [later, week(), later] {
            let mut update = WeeklyUpdate::new(project_id, date);
            update.rag = all_green();
            update.action_items = vec![ActionItem::pending("Chase vendor", false)];
            repo.submit(&mut update).unwrap();
        }

        assert_eq!(repo.distinct_week_dates().unwrap(), vec![week(), later]);
        assert_eq!(repo.count_for_week(later).unwrap(), 1);
        // Endast senaste uppdateringen räknas
        assert_eq!(repo.count_pending_actions().unwrap(), 1);
        assert_eq!(repo.count_delayed_projects().unwrap(), 0);
    }
}
