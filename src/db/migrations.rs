use anyhow::Result;
use rusqlite::Connection;
use tracing::info;

use super::schema::{CREATE_TABLES_V1, CREATE_TABLES_V2, CREATE_TABLES_V3, SCHEMA_VERSION};

/// Kör alla nödvändiga migrationer
pub fn run_migrations(conn: &Connection) -> Result<()> {
    let current_version = get_current_version(conn)?;

    if current_version == 0 {
        info!("Skapar ny databas med schema version {}", SCHEMA_VERSION);
        initial_setup(conn)?;
    } else if current_version < SCHEMA_VERSION {
        info!(
            "Migrerar databas från version {} till {}",
            current_version, SCHEMA_VERSION
        );
        migrate_from(conn, current_version)?;
    } else {
        info!("Databas är uppdaterad (version {})", current_version);
    }

    Ok(())
}

pub fn get_current_version(conn: &Connection) -> Result<i32> {
    let table_exists: bool = conn.query_row(
        "SELECT EXISTS(SELECT 1 FROM sqlite_master WHERE type='table' AND name='schema_migrations')",
        [],
        |row| row.get(0),
    )?;

    if !table_exists {
        return Ok(0);
    }

    let version: Option<i32> = conn.query_row(
        "SELECT MAX(version) FROM schema_migrations",
        [],
        |row| row.get(0),
    )?;

    Ok(version.unwrap_or(0))
}

fn initial_setup(conn: &Connection) -> Result<()> {
    conn.execute_batch(CREATE_TABLES_V1)?;
    conn.execute_batch(CREATE_TABLES_V2)?;
    conn.execute_batch(CREATE_TABLES_V3)?;

    conn.execute(
        "INSERT INTO schema_migrations (version) VALUES (?)",
        [SCHEMA_VERSION],
    )?;

    info!("Initial setup klar");
    Ok(())
}

fn migrate_from(conn: &Connection, from_version: i32) -> Result<()> {
    for version in (from_version + 1)..=SCHEMA_VERSION {
        match version {
            2 => conn.execute_batch(CREATE_TABLES_V2)?,
            3 => conn.execute_batch(CREATE_TABLES_V3)?,
            _ => {}
        }

        conn.execute(
            "INSERT INTO schema_migrations (version) VALUES (?)",
            [version],
        )?;

        info!("Migrerade till version {}", version);
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use rusqlite::Connection;

    fn table_names(conn: &Connection) -> Vec<String> {
        conn.prepare("SELECT name FROM sqlite_master WHERE type='table' ORDER BY name")
            .unwrap()
            .query_map([], |row| row.get(0))
            .unwrap()
            .filter_map(|r| r.ok())
            .collect()
    }

    #[test]
    fn test_initial_migration() {
        let conn = Connection::open_in_memory().unwrap();
        run_migrations(&conn).unwrap();

        let tables = table_names(&conn);
        for expected in [
            "projects",
            "weekly_updates",
            "rag_status",
            "risks_issues",
            "action_items",
            "qe_metrics",
            "milestones",
            "milestone_updates",
            "users",
        ] {
            assert!(tables.contains(&expected.to_string()), "saknar {}", expected);
        }
        assert_eq!(get_current_version(&conn).unwrap(), SCHEMA_VERSION);
    }

    #[test]
    fn test_migration_is_idempotent() {
        let conn = Connection::open_in_memory().unwrap();
        run_migrations(&conn).unwrap();
        run_migrations(&conn).unwrap();
        assert_eq!(get_current_version(&conn).unwrap(), SCHEMA_VERSION);
    }

    #[test]
    fn test_migrate_from_v1() {
        let conn = Connection::open_in_memory().unwrap();
        conn.execute_batch(CREATE_TABLES_V1).unwrap();
        conn.execute("INSERT INTO schema_migrations (version) VALUES (1)", [])
            .unwrap();

        run_migrations(&conn).unwrap();

        let tables = table_names(&conn);
        assert!(tables.contains(&"milestones".to_string()));
        assert!(tables.contains(&"users".to_string()));
        assert_eq!(get_current_version(&conn).unwrap(), SCHEMA_VERSION);
    }
}
