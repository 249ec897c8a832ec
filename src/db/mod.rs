pub mod schema;
pub mod migrations;
pub mod project_repo;
pub mod update_repo;
pub mod milestone_repo;
pub mod user_repo;
pub mod report_repo;

use anyhow::{anyhow, Result};
use rusqlite::Connection;
use std::path::Path;
use std::sync::{Arc, Mutex, MutexGuard};

pub use milestone_repo::MilestoneRepository;
pub use project_repo::ProjectRepository;
pub use report_repo::{MilestoneRow, ReportRepository, ReportRow};
pub use update_repo::UpdateRepository;
pub use user_repo::UserRepository;

/// Huvuddatabas-wrapper med thread-safe access
pub struct Database {
    conn: Arc<Mutex<Connection>>,
}

impl Database {
    /// Öppna eller skapa databas
    pub fn open(path: &Path) -> Result<Self> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }

        let conn = Connection::open(path)?;

        conn.execute_batch(
            "
            PRAGMA journal_mode = WAL;
            PRAGMA synchronous = NORMAL;
            PRAGMA foreign_keys = ON;
            PRAGMA busy_timeout = 5000;
            "
        )?;

        Ok(Self {
            conn: Arc::new(Mutex::new(conn)),
        })
    }

    /// Öppna in-memory databas (för tester)
    pub fn open_in_memory() -> Result<Self> {
        let conn = Connection::open_in_memory()?;
        conn.execute_batch("PRAGMA foreign_keys = ON;")?;

        let db = Self {
            conn: Arc::new(Mutex::new(conn)),
        };
        db.migrate()?;
        Ok(db)
    }

    /// Kör databasmigrationer
    pub fn migrate(&self) -> Result<()> {
        let conn = lock(&self.conn)?;
        migrations::run_migrations(&conn)
    }

    pub fn projects(&self) -> ProjectRepository {
        ProjectRepository::new(Arc::clone(&self.conn))
    }

    pub fn updates(&self) -> UpdateRepository {
        UpdateRepository::new(Arc::clone(&self.conn))
    }

    pub fn milestones(&self) -> MilestoneRepository {
        MilestoneRepository::new(Arc::clone(&self.conn))
    }

    pub fn users(&self) -> UserRepository {
        UserRepository::new(Arc::clone(&self.conn))
    }

    pub fn reports(&self) -> ReportRepository {
        ReportRepository::new(Arc::clone(&self.conn))
    }

    /// Direkt tillgång till connection (för avancerade operationer)
    pub fn with_connection<F, T>(&self, f: F) -> Result<T>
    where
        F: FnOnce(&Connection) -> Result<T>,
    {
        let conn = lock(&self.conn)?;
        f(&conn)
    }
}

impl Clone for Database {
    fn clone(&self) -> Self {
        Self {
            conn: Arc::clone(&self.conn),
        }
    }
}

/// Lås anslutningen, ett förgiftat lås blir ett vanligt fel
pub(crate) fn lock(conn: &Mutex<Connection>) -> Result<MutexGuard<'_, Connection>> {
    conn.lock()
        .map_err(|_| anyhow!("Databasanslutningen är låst av en tråd som kraschat"))
}
