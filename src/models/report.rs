//! Aggregerade rapportstrukturer
//!
//! Byggs av `services::aggregator` och konsumeras av alla renderare
//! (HTML, PDF, LaTeX, JSON och förhandsvisningen i UI).

use chrono::NaiveDate;
use serde::Serialize;

use super::{
    ActionItem, MilestoneStatus, ProjectPhase, QeMetrics, RagEntry, RiskIssue, StatusIndicator,
};

/// Typ av rapport
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
pub enum ReportKind {
    #[default]
    WeeklySummary,
    ProjectHistory,
}

impl ReportKind {
    pub fn display_name(&self) -> &'static str {
        match self {
            Self::WeeklySummary => "Weekly Summary",
            Self::ProjectHistory => "Project History",
        }
    }

    pub fn all() -> &'static [Self] {
        &[Self::WeeklySummary, Self::ProjectHistory]
    }
}

/// Milstolpe med förväntat och faktiskt framsteg vid rapportens referensvecka
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MilestoneProgress {
    pub milestone_id: i64,
    pub parent_id: Option<i64>,
    pub name: String,
    pub planned_start: NaiveDate,
    pub planned_end: NaiveDate,
    pub weightage: f64,
    pub expected_progress: f64,
    /// None om inget framsteg rapporterats ännu
    pub actual_progress: Option<f64>,
    pub status: MilestoneStatus,
}

impl MilestoneProgress {
    pub fn is_child(&self) -> bool {
        self.parent_id.is_some()
    }
}

/// En post per projekt (eller per vecka i projekthistorik)
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ProjectReport {
    pub project_id: i64,
    pub project_name: String,
    pub client_business_unit: String,
    pub project_manager: String,
    pub start_date: Option<NaiveDate>,
    pub end_date: Option<NaiveDate>,
    pub current_phase: Option<ProjectPhase>,
    pub update_id: i64,
    pub week_ending_date: NaiveDate,
    pub accomplishments: String,
    pub decisions_needed: String,
    pub milestones_text: String,
    pub status_indicator: Option<StatusIndicator>,
    pub rag_status: Vec<RagEntry>,
    pub risks_issues: Vec<RiskIssue>,
    pub action_items: Vec<ActionItem>,
    pub qe_metrics: Option<QeMetrics>,
    pub milestones: Vec<MilestoneProgress>,
    /// Summa vikt * faktiskt framsteg över toppnivåmilstolpar
    pub weighted_progress: Option<f64>,
}

impl ProjectReport {
    pub fn duration_display(&self) -> String {
        let fmt = |d: Option<NaiveDate>| d.map(|d| d.to_string()).unwrap_or_default();
        format!("{} to {}", fmt(self.start_date), fmt(self.end_date))
    }

    pub fn phase_display(&self) -> &str {
        self.current_phase.map(|p| p.display_name()).unwrap_or("")
    }

    pub fn status_display(&self) -> &str {
        self.status_indicator.map(|s| s.display_name()).unwrap_or("")
    }

    pub fn is_on_track(&self) -> bool {
        self.status_indicator == Some(StatusIndicator::OnTrack)
    }

    pub fn accomplishment_lines(&self) -> Vec<&str> {
        text_lines(&self.accomplishments)
    }

    pub fn decision_lines(&self) -> Vec<&str> {
        text_lines(&self.decisions_needed)
    }
}

/// Hel rapport redo att renderas
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Report {
    pub kind: ReportKind,
    pub title: String,
    pub reference_date: NaiveDate,
    pub projects: Vec<ProjectReport>,
}

impl Report {
    pub fn is_empty(&self) -> bool {
        self.projects.is_empty()
    }
}

/// Icke-tomma, trimmade rader
pub fn text_lines(text: &str) -> Vec<&str> {
    text.lines().map(str::trim).filter(|l| !l.is_empty()).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_text_lines_skips_blank() {
        assert_eq!(text_lines("a\n\n  b  \n"), vec!["a", "b"]);
        assert!(text_lines("   \n").is_empty());
    }
}
