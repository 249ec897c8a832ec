pub mod dashboard;
pub mod login;
pub mod milestones;
pub mod projects;
pub mod reports;
pub mod weekly_update;

pub use dashboard::DashboardView;
pub use login::LoginView;
pub use milestones::MilestonesView;
pub use projects::ProjectsView;
pub use reports::ReportsView;
pub use weekly_update::WeeklyUpdateView;
