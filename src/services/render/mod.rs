//! Rendering av aggregerade rapporter
//!
//! Alla renderare utgår från samma `Report` och samma sektionsordning.

pub mod html;
pub mod latex;
pub mod pdf;

use crate::models::{ProjectReport, Report, ReportKind};
use crate::utils::date::format_date;

pub use html::render_html;
pub use latex::render_latex;
pub use pdf::render_pdf;

pub const NONE_PLACEHOLDER: &str = "None";
pub const NO_RAG_PLACEHOLDER: &str = "No RAG status available";
pub const NO_RISKS_PLACEHOLDER: &str = "No risks or issues";
pub const NO_ACTIONS_PLACEHOLDER: &str = "No action items";
pub const NO_COMMENT_PLACEHOLDER: &str = "No comment";

/// Rubrik för en post: projektnamn, eller vecka i projekthistorik
pub fn entry_heading(report: &Report, project: &ProjectReport) -> String {
    match report.kind {
        ReportKind::WeeklySummary => project.project_name.clone(),
        ReportKind::ProjectHistory => {
            format!("Week ending {}", format_date(project.week_ending_date))
        }
    }
}

/// 0.4 -> "40%"
pub fn percent(fraction: f64) -> String {
    format!("{:.0}%", fraction * 100.0)
}

pub fn yes_no(value: bool) -> &'static str {
    if value {
        "Yes"
    } else {
        "No"
    }
}

/// Färg för projektets statusindikator
pub fn status_color(project: &ProjectReport) -> &'static str {
    if project.is_on_track() {
        "green"
    } else {
        "red"
    }
}

pub fn comment_or_placeholder(comment: &str) -> &str {
    let comment = comment.trim();
    if comment.is_empty() {
        NO_COMMENT_PLACEHOLDER
    } else {
        comment
    }
}

/// QE-tabellens rader som (etikett, värde)
pub fn qe_rows(report: &ProjectReport) -> Vec<(&'static str, String)> {
    let Some(qe) = &report.qe_metrics else {
        return Vec::new();
    };

    vec![
        ("Total Test Cases", qe.total_test_cases.to_string()),
        ("Executed", qe.executed_test_cases.to_string()),
        ("Passed", qe.passed_test_cases.to_string()),
        ("Failed", qe.failed_test_cases.to_string()),
        ("Blocked", qe.blocked_test_cases.to_string()),
        (
            "Pass Rate",
            qe.pass_rate().map(percent).unwrap_or_else(|| "-".to_string()),
        ),
        ("Open Defects", qe.open_defects.to_string()),
        ("Closed Defects", qe.closed_defects.to_string()),
        ("Critical Defects", qe.critical_defects.to_string()),
        ("Progress", format!("{:.0}%", qe.progress_percent)),
    ]
}
