//! Tjänster för Delivery Dashboard
//!
//! Innehåller affärslogik som inte hör hemma i UI eller databas.

pub mod aggregator;
pub mod auth;
pub mod entry;
pub mod export;
pub mod render;

pub use aggregator::{ReportAggregator, ReportOutcome};
pub use auth::AuthService;
pub use entry::{DashboardStats, EntryService, MilestoneForm, ProjectForm, WeeklyUpdateForm};
pub use export::{export_file_name, ExportFormat, ExportResult, ExportService};
