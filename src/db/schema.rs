/// SQL-schema för leveransdashboarden

pub const SCHEMA_VERSION: i32 = 3;

/// Version 1: projekt, veckouppdateringar och deras underrader
pub const CREATE_TABLES_V1: &str = r#"
-- Projekt
CREATE TABLE IF NOT EXISTS projects (
    project_id INTEGER PRIMARY KEY AUTOINCREMENT,
    project_name TEXT NOT NULL UNIQUE,
    client_business_unit TEXT NOT NULL DEFAULT '',
    project_manager TEXT NOT NULL DEFAULT '',
    start_date TEXT NOT NULL,
    end_date TEXT NOT NULL,
    current_phase TEXT NOT NULL DEFAULT 'Build',
    created_at TEXT NOT NULL DEFAULT (datetime('now'))
);

-- Veckouppdateringar
CREATE TABLE IF NOT EXISTS weekly_updates (
    update_id INTEGER PRIMARY KEY AUTOINCREMENT,
    project_id INTEGER NOT NULL,
    week_ending_date TEXT NOT NULL,
    accomplishments TEXT NOT NULL DEFAULT '',
    decisions_needed TEXT NOT NULL DEFAULT '',
    milestones TEXT NOT NULL DEFAULT '',
    status_indicator TEXT NOT NULL DEFAULT 'On Track',
    created_at TEXT NOT NULL DEFAULT (datetime('now')),
    FOREIGN KEY (project_id) REFERENCES projects(project_id) ON DELETE CASCADE
);

CREATE INDEX IF NOT EXISTS idx_updates_week ON weekly_updates(week_ending_date);
CREATE INDEX IF NOT EXISTS idx_updates_project ON weekly_updates(project_id);

-- RAG-status, en rad per område och uppdatering
CREATE TABLE IF NOT EXISTS rag_status (
    rag_id INTEGER PRIMARY KEY AUTOINCREMENT,
    update_id INTEGER NOT NULL,
    area TEXT NOT NULL CHECK (area IN ('Scope', 'Timeline', 'Cost', 'Quality', 'Resources')),
    status TEXT NOT NULL CHECK (status IN ('Green', 'Amber', 'Red')),
    comment TEXT NOT NULL DEFAULT '',
    FOREIGN KEY (update_id) REFERENCES weekly_updates(update_id) ON DELETE CASCADE,
    UNIQUE (update_id, area)
);

-- Risker och problem
CREATE TABLE IF NOT EXISTS risks_issues (
    risk_issue_id INTEGER PRIMARY KEY AUTOINCREMENT,
    update_id INTEGER NOT NULL,
    type TEXT NOT NULL CHECK (type IN ('Risk', 'Issue')),
    description TEXT NOT NULL,
    owner TEXT NOT NULL DEFAULT 'TBD',
    mitigation_eta TEXT NOT NULL DEFAULT 'TBD',
    FOREIGN KEY (update_id) REFERENCES weekly_updates(update_id) ON DELETE CASCADE
);

CREATE INDEX IF NOT EXISTS idx_risks_update ON risks_issues(update_id);

-- Åtgärdspunkter
CREATE TABLE IF NOT EXISTS action_items (
    action_id INTEGER PRIMARY KEY AUTOINCREMENT,
    update_id INTEGER NOT NULL,
    description TEXT NOT NULL,
    status TEXT NOT NULL DEFAULT 'Pending',
    client_input_required INTEGER NOT NULL DEFAULT 0,
    FOREIGN KEY (update_id) REFERENCES weekly_updates(update_id) ON DELETE CASCADE
);

CREATE INDEX IF NOT EXISTS idx_actions_update ON action_items(update_id);

-- Migrationshistorik
CREATE TABLE IF NOT EXISTS schema_migrations (
    version INTEGER PRIMARY KEY,
    applied_at TEXT NOT NULL DEFAULT (datetime('now'))
);
"#;

/// Version 2: QE-mätvärden och milstolpar
pub const CREATE_TABLES_V2: &str = r#"
CREATE TABLE IF NOT EXISTS qe_metrics (
    qe_metrics_id INTEGER PRIMARY KEY AUTOINCREMENT,
    update_id INTEGER NOT NULL UNIQUE,
    total_test_cases INTEGER NOT NULL DEFAULT 0,
    executed_test_cases INTEGER NOT NULL DEFAULT 0,
    passed_test_cases INTEGER NOT NULL DEFAULT 0,
    failed_test_cases INTEGER NOT NULL DEFAULT 0,
    blocked_test_cases INTEGER NOT NULL DEFAULT 0,
    open_defects INTEGER NOT NULL DEFAULT 0,
    closed_defects INTEGER NOT NULL DEFAULT 0,
    critical_defects INTEGER NOT NULL DEFAULT 0,
    progress_percent REAL NOT NULL DEFAULT 0,
    FOREIGN KEY (update_id) REFERENCES weekly_updates(update_id) ON DELETE CASCADE
);

CREATE TABLE IF NOT EXISTS milestones (
    milestone_id INTEGER PRIMARY KEY AUTOINCREMENT,
    project_id INTEGER NOT NULL,
    parent_milestone_id INTEGER,
    milestone_name TEXT NOT NULL,
    planned_start_date TEXT NOT NULL,
    planned_end_date TEXT NOT NULL,
    duration_days INTEGER NOT NULL DEFAULT 0,
    weightage REAL NOT NULL DEFAULT 0 CHECK (weightage >= 0 AND weightage <= 1),
    FOREIGN KEY (project_id) REFERENCES projects(project_id) ON DELETE CASCADE,
    FOREIGN KEY (parent_milestone_id) REFERENCES milestones(milestone_id) ON DELETE CASCADE
);

CREATE INDEX IF NOT EXISTS idx_milestones_project ON milestones(project_id);

CREATE TABLE IF NOT EXISTS milestone_updates (
    milestone_update_id INTEGER PRIMARY KEY AUTOINCREMENT,
    milestone_id INTEGER NOT NULL,
    week_ending_date TEXT NOT NULL,
    actual_progress REAL NOT NULL DEFAULT 0 CHECK (actual_progress >= 0 AND actual_progress <= 1),
    updated_at TEXT NOT NULL DEFAULT (datetime('now')),
    FOREIGN KEY (milestone_id) REFERENCES milestones(milestone_id) ON DELETE CASCADE,
    UNIQUE (milestone_id, week_ending_date)
);
"#;

/// Version 3: inloggning
pub const CREATE_TABLES_V3: &str = r#"
CREATE TABLE IF NOT EXISTS users (
    user_id INTEGER PRIMARY KEY AUTOINCREMENT,
    username TEXT NOT NULL UNIQUE,
    password_hash TEXT NOT NULL,
    created_at TEXT NOT NULL DEFAULT (datetime('now'))
);
"#;
