use anyhow::Result;
use chrono::NaiveDate;
use rusqlite::{params, Connection, OptionalExtension, Row};
use std::sync::{Arc, Mutex};
use tracing::info;

use super::lock;
use crate::models::{Milestone, MilestoneUpdate};
use crate::utils::AppError;

pub struct MilestoneRepository {
    conn: Arc<Mutex<Connection>>,
}

const MILESTONE_COLUMNS: &str = "milestone_id, project_id, parent_milestone_id, milestone_name,
                                 planned_start_date, planned_end_date, duration_days, weightage";

impl MilestoneRepository {
    pub fn new(conn: Arc<Mutex<Connection>>) -> Self {
        Self { conn }
    }

    /// Skapa milstolpe. Föräldern måste tillhöra samma projekt och vara på toppnivå.
    pub fn create(&self, milestone: &mut Milestone) -> Result<i64> {
        milestone.validate()?;
        milestone.name = milestone.name.trim().to_string();
        milestone.duration_days = (milestone.planned_end - milestone.planned_start).num_days();

        let conn = lock(&self.conn)?;

        let project_exists: bool = conn.query_row(
            "SELECT EXISTS(SELECT 1 FROM projects WHERE project_id = ?)",
            [milestone.project_id],
            |row| row.get(0),
        )?;
        if !project_exists {
            return Err(
                AppError::not_found(format!("Projekt med ID {}", milestone.project_id)).into(),
            );
        }

        if let Some(parent_id) = milestone.parent_id {
            let parent: Option<(i64, Option<i64>)> = conn
                .query_row(
                    "SELECT project_id, parent_milestone_id FROM milestones WHERE milestone_id = ?",
                    [parent_id],
                    |row| Ok((row.get(0)?, row.get(1)?)),
                )
                .optional()?;

            match parent {
                None => {
                    return Err(AppError::not_found(format!("Milstolpe med ID {}", parent_id)).into())
                }
                Some((project_id, _)) if project_id != milestone.project_id => {
                    return Err(AppError::validation(
                        "Överordnad milstolpe tillhör ett annat projekt",
                    )
                    .into())
                }
                Some((_, Some(_))) => {
                    return Err(AppError::validation(
                        "Milstolpar kan bara nästlas en nivå",
                    )
                    .into())
                }
                Some(_) => {}
            }
        }

        conn.execute(
            "INSERT INTO milestones (project_id, parent_milestone_id, milestone_name,
                                     planned_start_date, planned_end_date, duration_days, weightage)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)",
            params![
                milestone.project_id,
                milestone.parent_id,
                milestone.name,
                milestone.planned_start,
                milestone.planned_end,
                milestone.duration_days,
                milestone.weightage,
            ],
        )?;

        let id = conn.last_insert_rowid();
        milestone.id = Some(id);

        info!(
            "Skapade milstolpe '{}' (id {}) i projekt {}",
            milestone.name, id, milestone.project_id
        );
        Ok(id)
    }

    pub fn find_by_id(&self, id: i64) -> Result<Option<Milestone>> {
        let conn = lock(&self.conn)?;
        let milestone = conn
            .query_row(
                &format!("SELECT {} FROM milestones WHERE milestone_id = ?", MILESTONE_COLUMNS),
                [id],
                Self::row_to_milestone,
            )
            .optional()?;

        Ok(milestone)
    }

    /// Milstolpar för ett projekt, föräldrar direkt följda av sina barn
    pub fn find_by_project(&self, project_id: i64) -> Result<Vec<Milestone>> {
        let conn = lock(&self.conn)?;
        let mut stmt = conn.prepare(&format!(
            "SELECT {} FROM milestones
             WHERE project_id = ?
             ORDER BY COALESCE(parent_milestone_id, milestone_id),
                      parent_milestone_id IS NOT NULL,
                      planned_start_date,
                      milestone_id",
            MILESTONE_COLUMNS
        ))?;

        let milestones = stmt
            .query_map([project_id], Self::row_to_milestone)?
            .collect::<rusqlite::Result<Vec<_>>>()?;

        Ok(milestones)
    }

    /// Spara veckans faktiska framsteg (ersätter tidigare värde för samma vecka)
    pub fn upsert_progress(&self, update: &MilestoneUpdate) -> Result<()> {
        let progress = crate::models::clamp_progress(update.actual_progress);

        let conn = lock(&self.conn)?;
        let rows = conn.execute(
            "INSERT INTO milestone_updates (milestone_id, week_ending_date, actual_progress)
             VALUES (?1, ?2, ?3)
             ON CONFLICT (milestone_id, week_ending_date)
             DO UPDATE SET actual_progress = excluded.actual_progress,
                           updated_at = datetime('now')",
            params![update.milestone_id, update.week_ending_date, progress],
        );

        match rows {
            Ok(_) => {}
            Err(rusqlite::Error::SqliteFailure(err, _))
                if err.code == rusqlite::ErrorCode::ConstraintViolation =>
            {
                return Err(AppError::not_found(format!(
                    "Milstolpe med ID {}",
                    update.milestone_id
                ))
                .into());
            }
            Err(e) => return Err(e.into()),
        }

        info!(
            "Framsteg för milstolpe {} vecka {}: {:.0}%",
            update.milestone_id,
            update.week_ending_date,
            progress * 100.0
        );
        Ok(())
    }

    /// Alla registrerade framsteg för en milstolpe, äldst först
    pub fn progress_history(&self, milestone_id: i64) -> Result<Vec<MilestoneUpdate>> {
        let conn = lock(&self.conn)?;
        let mut stmt = conn.prepare(
            "SELECT milestone_id, week_ending_date, actual_progress
             FROM milestone_updates
             WHERE milestone_id = ?
             ORDER BY week_ending_date",
        )?;

        let history = stmt
            .query_map([milestone_id], |row| {
                Ok(MilestoneUpdate {
                    milestone_id: row.get(0)?,
                    week_ending_date: row.get(1)?,
                    actual_progress: row.get(2)?,
                })
            })?
            .collect::<rusqlite::Result<Vec<_>>>()?;

        Ok(history)
    }

    /// Framsteg registrerat exakt för veckan
    pub fn progress_for_week(&self, milestone_id: i64, week: NaiveDate) -> Result<Option<f64>> {
        let conn = lock(&self.conn)?;
        let progress = conn
            .query_row(
                "SELECT actual_progress FROM milestone_updates
                 WHERE milestone_id = ? AND week_ending_date = ?",
                params![milestone_id, week],
                |row| row.get(0),
            )
            .optional()?;
        Ok(progress)
    }

    fn row_to_milestone(row: &Row) -> rusqlite::Result<Milestone> {
        Ok(Milestone {
            id: Some(row.get(0)?),
            project_id: row.get(1)?,
            parent_id: row.get(2)?,
            name: row.get(3)?,
            planned_start: row.get(4)?,
            planned_end: row.get(5)?,
            duration_days: row.get(6)?,
            weightage: row.get(7)?,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::Database;
    use crate::models::Project;

    fn d(y: i32, m: u32, day: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, day).unwrap()
    }

    fn setup() -> (Database, i64) {
        let db = Database::open_in_memory().unwrap();
        let mut project = Project::new("Data Platform", d(2024, 1, 1), d(2024, 12, 31));
        let id = db.projects().create(&mut project).unwrap();
        (db, id)
    }

    #[test]
    fn test_create_with_one_level_nesting() {
        let (db, project_id) = setup();
        let repo = db.milestones();

        let mut parent = Milestone::new(project_id, "Build", d(2024, 2, 1), d(2024, 4, 30), 0.6);
        let parent_id = repo.create(&mut parent).unwrap();

        let mut child = Milestone::new(project_id, "API", d(2024, 2, 1), d(2024, 3, 15), 0.5);
        child.parent_id = Some(parent_id);
        let child_id = repo.create(&mut child).unwrap();

        let mut grandchild = Milestone::new(project_id, "Auth", d(2024, 2, 1), d(2024, 2, 10), 0.5);
        grandchild.parent_id = Some(child_id);
        let err = repo.create(&mut grandchild).unwrap_err();
        assert!(matches!(err.downcast_ref::<AppError>(), Some(AppError::Validation(_))));

        let mut other = Milestone::new(project_id, "Test", d(2024, 1, 15), d(2024, 5, 31), 0.4);
        repo.create(&mut other).unwrap();

        let names: Vec<String> = repo
            .find_by_project(project_id)
            .unwrap()
            .into_iter()
            .map(|m| m.name)
            .collect();
        assert_eq!(names, vec!["Build", "API", "Test"]);
    }

    #[test]
    fn test_parent_must_be_same_project() {
        let (db, project_id) = setup();
        let mut other_project = Project::new("Other", d(2024, 1, 1), d(2024, 6, 30));
        let other_id = db.projects().create(&mut other_project).unwrap();

        let mut parent = Milestone::new(other_id, "Foreign", d(2024, 2, 1), d(2024, 3, 1), 1.0);
        let parent_id = db.milestones().create(&mut parent).unwrap();

        let mut child = Milestone::new(project_id, "Child", d(2024, 2, 1), d(2024, 3, 1), 1.0);
        child.parent_id = Some(parent_id);
        assert!(db.milestones().create(&mut child).is_err());
    }

    #[test]
    fn test_upsert_progress_by_week() {
        let (db, project_id) = setup();
        let repo = db.milestones();

        let mut m = Milestone::new(project_id, "Design", d(2024, 2, 1), d(2024, 2, 29), 0.2);
        let id = repo.create(&mut m).unwrap();
        assert_eq!(m.duration_days, 28);

        let week = d(2024, 2, 9);
        repo.upsert_progress(&MilestoneUpdate::new(id, week, 0.3)).unwrap();
        repo.upsert_progress(&MilestoneUpdate::new(id, week, 0.45)).unwrap();
        repo.upsert_progress(&MilestoneUpdate::new(id, d(2024, 2, 16), 7.0)).unwrap();

        let history = repo.progress_history(id).unwrap();
        assert_eq!(history.len(), 2);
        assert_eq!(history[0].actual_progress, 0.45);
        assert_eq!(history[1].actual_progress, 1.0);
        assert_eq!(repo.progress_for_week(id, week).unwrap(), Some(0.45));
    }

    #[test]
    fn test_upsert_progress_unknown_milestone() {
        let (db, _) = setup();
        let err = db
            .milestones()
            .upsert_progress(&MilestoneUpdate::new(999, d(2024, 2, 9), 0.5))
            .unwrap_err();
        assert!(matches!(err.downcast_ref::<AppError>(), Some(AppError::NotFound(_))));
    }
}
