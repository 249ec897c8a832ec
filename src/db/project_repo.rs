use anyhow::Result;
use rusqlite::{params, Connection, OptionalExtension, Row};
use std::sync::{Arc, Mutex};
use tracing::info;

use super::lock;
use crate::models::{Project, ProjectPhase, ProjectRef};
use crate::utils::AppError;

pub struct ProjectRepository {
    conn: Arc<Mutex<Connection>>,
}

const PROJECT_COLUMNS: &str = "project_id, project_name, client_business_unit, project_manager,
                               start_date, end_date, current_phase, created_at";

impl ProjectRepository {
    pub fn new(conn: Arc<Mutex<Connection>>) -> Self {
        Self { conn }
    }

    /// Hämta alla projekt sorterade på namn
    pub fn find_all(&self) -> Result<Vec<Project>> {
        let conn = lock(&self.conn)?;
        let mut stmt = conn.prepare(&format!(
            "SELECT {} FROM projects ORDER BY project_name",
            PROJECT_COLUMNS
        ))?;

        let projects = stmt
            .query_map([], Self::row_to_project)?
            .collect::<rusqlite::Result<Vec<_>>>()?;

        Ok(projects)
    }

    /// Hämta projekt via ID
    pub fn find_by_id(&self, id: i64) -> Result<Option<Project>> {
        let conn = lock(&self.conn)?;
        let project = conn
            .query_row(
                &format!("SELECT {} FROM projects WHERE project_id = ?", PROJECT_COLUMNS),
                [id],
                Self::row_to_project,
            )
            .optional()?;

        Ok(project)
    }

    /// Hämta projekt via namn
    pub fn find_by_name(&self, name: &str) -> Result<Option<Project>> {
        let conn = lock(&self.conn)?;
        let project = conn
            .query_row(
                &format!("SELECT {} FROM projects WHERE project_name = ?", PROJECT_COLUMNS),
                [name.trim()],
                Self::row_to_project,
            )
            .optional()?;

        Ok(project)
    }

    /// ID och namn för val i formulär
    pub fn list_refs(&self) -> Result<Vec<ProjectRef>> {
        let conn = lock(&self.conn)?;
        let mut stmt =
            conn.prepare("SELECT project_id, project_name FROM projects ORDER BY project_name")?;

        let refs = stmt
            .query_map([], |row| {
                Ok(ProjectRef {
                    id: row.get(0)?,
                    name: row.get(1)?,
                })
            })?
            .collect::<rusqlite::Result<Vec<_>>>()?;

        Ok(refs)
    }

    /// Skapa nytt projekt
    pub fn create(&self, project: &mut Project) -> Result<i64> {
        project.validate()?;
        project.name = project.name.trim().to_string();

        let conn = lock(&self.conn)?;

        let exists: bool = conn.query_row(
            "SELECT EXISTS(SELECT 1 FROM projects WHERE project_name = ?)",
            [&project.name],
            |row| row.get(0),
        )?;
        if exists {
            return Err(AppError::already_exists(format!("Projekt '{}'", project.name)).into());
        }

        conn.execute(
            "INSERT INTO projects (project_name, client_business_unit, project_manager,
                                   start_date, end_date, current_phase)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
            params![
                project.name,
                project.client_business_unit.trim(),
                project.project_manager.trim(),
                project.start_date,
                project.end_date,
                project.current_phase.display_name(),
            ],
        )?;

        let id = conn.last_insert_rowid();
        project.id = Some(id);

        info!("Skapade projekt '{}' (id {})", project.name, id);
        Ok(id)
    }

    /// Kontrollera att projektet finns
    pub fn exists(&self, id: i64) -> Result<bool> {
        let conn = lock(&self.conn)?;
        let exists: bool = conn.query_row(
            "SELECT EXISTS(SELECT 1 FROM projects WHERE project_id = ?)",
            [id],
            |row| row.get(0),
        )?;
        Ok(exists)
    }

    /// Räkna antal projekt
    pub fn count(&self) -> Result<i64> {
        let conn = lock(&self.conn)?;
        let count: i64 = conn.query_row("SELECT COUNT(*) FROM projects", [], |row| row.get(0))?;
        Ok(count)
    }

    fn row_to_project(row: &Row) -> rusqlite::Result<Project> {
        let phase: String = row.get(6)?;
        Ok(Project {
            id: row.get(0)?,
            name: row.get(1)?,
            client_business_unit: row.get(2)?,
            project_manager: row.get(3)?,
            start_date: row.get(4)?,
            end_date: row.get(5)?,
            current_phase: ProjectPhase::from_db_str(&phase).unwrap_or_default(),
            created_at: row.get(7).ok(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::Database;
    use chrono::NaiveDate;

    fn setup_db() -> Database {
        Database::open_in_memory().unwrap()
    }

    fn project(name: &str) -> Project {
        let mut p = Project::new(
            name,
            NaiveDate::from_ymd_opt(2024, 1, 1).unwrap(),
            NaiveDate::from_ymd_opt(2024, 12, 31).unwrap(),
        );
        p.client_business_unit = "Retail".into();
        p.project_manager = "Sam Lee".into();
        p.current_phase = ProjectPhase::Uat;
        p
    }

    #[test]
    fn test_create_and_find() {
        let db = setup_db();
        let repo = db.projects();

        let mut p = project("Billing Revamp");
        let id = repo.create(&mut p).unwrap();
        assert!(id > 0);
        assert_eq!(p.id, Some(id));

        let found = repo.find_by_id(id).unwrap().unwrap();
        assert_eq!(found.name, "Billing Revamp");
        assert_eq!(found.current_phase, ProjectPhase::Uat);
        assert_eq!(found.start_date, NaiveDate::from_ymd_opt(2024, 1, 1).unwrap());

        assert!(repo.find_by_name("Billing Revamp").unwrap().is_some());
        assert!(repo.find_by_id(id + 100).unwrap().is_none());
    }

    #[test]
    fn test_duplicate_name_rejected() {
        let db = setup_db();
        let repo = db.projects();

        repo.create(&mut project("Portal")).unwrap();
        let err = repo.create(&mut project(" Portal ")).unwrap_err();
        assert!(matches!(
            err.downcast_ref::<AppError>(),
            Some(AppError::AlreadyExists(_))
        ));
        assert_eq!(repo.count().unwrap(), 1);
    }

    #[test]
    fn test_invalid_project_not_inserted() {
        let db = setup_db();
        let repo = db.projects();

        let mut p = project("Backwards");
        std::mem::swap(&mut p.start_date, &mut p.end_date);
        assert!(repo.create(&mut p).is_err());
        assert_eq!(repo.count().unwrap(), 0);
    }

    #[test]
    fn test_list_refs_sorted() {
        let db = setup_db();
        let repo = db.projects();

        repo.create(&mut project("Zeta")).unwrap();
        repo.create(&mut project("Alpha")).unwrap();

        let names: Vec<String> = repo.list_refs().unwrap().into_iter().map(|r| r.name).collect();
        assert_eq!(names, vec!["Alpha", "Zeta"]);
    }
}
