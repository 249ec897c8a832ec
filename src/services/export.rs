//! Export av rapporter till fil (PDF, HTML, LaTeX, JSON)

use anyhow::{Context, Result};
use std::path::{Path, PathBuf};
use tracing::{error, info, warn};

use crate::models::{Report, ReportKind};
use crate::utils::date::format_date_compact;
use crate::utils::path::{display_path, sanitize_filename};
use crate::utils::AppResult;

use super::render::{render_html, render_latex, render_pdf};

/// Exportformat
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExportFormat {
    Pdf,
    Html,
    Latex,
    Json,
}

impl ExportFormat {
    pub fn extension(&self) -> &'static str {
        match self {
            ExportFormat::Pdf => "pdf",
            ExportFormat::Html => "html",
            ExportFormat::Latex => "tex",
            ExportFormat::Json => "json",
        }
    }

    pub fn display_name(&self) -> &'static str {
        match self {
            ExportFormat::Pdf => "PDF",
            ExportFormat::Html => "HTML",
            ExportFormat::Latex => "LaTeX",
            ExportFormat::Json => "JSON",
        }
    }

    pub fn all() -> &'static [Self] {
        &[Self::Pdf, Self::Html, Self::Latex, Self::Json]
    }
}

/// Renderat innehåll, eventuellt i ett annat format än det begärda
#[derive(Debug, Clone)]
pub struct RenderedReport {
    pub format: ExportFormat,
    pub content: Vec<u8>,
    /// Satt när PDF misslyckades och LaTeX levererades i stället
    pub fallback_reason: Option<String>,
}

/// Resultat av export
#[derive(Debug)]
pub struct ExportResult {
    pub format: ExportFormat,
    pub path: PathBuf,
    pub file_size: usize,
    pub fallback_reason: Option<String>,
}

impl ExportResult {
    pub fn summary(&self) -> String {
        match &self.fallback_reason {
            Some(reason) => format!(
                "PDF kunde inte skapas ({}). LaTeX-källa sparad: {}",
                reason,
                display_path(&self.path)
            ),
            None => format!(
                "{} exporterad: {} ({} bytes)",
                self.format.display_name(),
                display_path(&self.path),
                self.file_size
            ),
        }
    }
}

/// "Weekly_Report_20240308.pdf", historik blir "Project_History_<projekt>_20240308.pdf"
pub fn export_file_name(report: &Report, format: ExportFormat) -> String {
    let date = format_date_compact(report.reference_date);
    match report.kind {
        ReportKind::WeeklySummary => format!("Weekly_Report_{}.{}", date, format.extension()),
        ReportKind::ProjectHistory => {
            let project = report
                .projects
                .first()
                .map(|p| sanitize_filename(p.project_name.trim()).replace(' ', "_"))
                .unwrap_or_else(|| "Project".to_string());
            format!("Project_History_{}_{}.{}", project, date, format.extension())
        }
    }
}

/// Export-tjänst
pub struct ExportService {
    debug_html_path: Option<PathBuf>,
}

impl ExportService {
    pub fn new(debug_html_path: Option<PathBuf>) -> Self {
        Self { debug_html_path }
    }

    pub fn render(&self, report: &Report, format: ExportFormat) -> Result<RenderedReport> {
        self.write_debug_html(report);
        render_with(report, format, render_pdf)
    }

    /// Exportera till fil. Vid PDF-fel skrivs LaTeX med ändelsen .tex.
    pub fn export_to_file(
        &self,
        report: &Report,
        format: ExportFormat,
        path: &Path,
    ) -> Result<ExportResult> {
        let rendered = self.render(report, format)?;

        let path = if rendered.format != format {
            path.with_extension(rendered.format.extension())
        } else {
            path.to_path_buf()
        };

        std::fs::write(&path, &rendered.content)
            .with_context(|| format!("Kunde inte skriva {}", path.display()))?;

        info!(
            "Rapport exporterad som {} till {}",
            rendered.format.display_name(),
            path.display()
        );

        Ok(ExportResult {
            format: rendered.format,
            path,
            file_size: rendered.content.len(),
            fallback_reason: rendered.fallback_reason,
        })
    }

    /// Skriv HTML till den konfigurerade felsökningssökvägen; fel loggas bara
    fn write_debug_html(&self, report: &Report) {
        let Some(path) = &self.debug_html_path else {
            return;
        };

        match std::fs::write(path, render_html(report)) {
            Ok(()) => info!("Felsöknings-HTML sparad till {}", path.display()),
            Err(e) => warn!("Kunde inte spara felsöknings-HTML till {}: {}", path.display(), e),
        }
    }
}

/// Rendera med given PDF-funktion; misslyckas den levereras LaTeX
fn render_with<F>(report: &Report, format: ExportFormat, pdf: F) -> Result<RenderedReport>
where
    F: FnOnce(&Report) -> AppResult<Vec<u8>>,
{
    let rendered = |format, content| RenderedReport {
        format,
        content,
        fallback_reason: None,
    };

    Ok(match format {
        ExportFormat::Pdf => match pdf(report) {
            Ok(bytes) => rendered(ExportFormat::Pdf, bytes),
            Err(e) => {
                error!("PDF-rendering misslyckades, använder LaTeX: {}", e);
                RenderedReport {
                    format: ExportFormat::Latex,
                    content: render_latex(report).into_bytes(),
                    fallback_reason: Some(e.to_string()),
                }
            }
        },
        ExportFormat::Html => rendered(ExportFormat::Html, render_html(report).into_bytes()),
        ExportFormat::Latex => rendered(ExportFormat::Latex, render_latex(report).into_bytes()),
        ExportFormat::Json => rendered(
            ExportFormat::Json,
            serde_json::to_vec_pretty(report).context("JSON-serialisering misslyckades")?,
        ),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::services::render::fixtures::*;
    use crate::utils::AppError;
    use tempfile::TempDir;

    #[test]
    fn test_export_file_name() {
        let report = report(vec![empty_project("A")]);
        assert_eq!(export_file_name(&report, ExportFormat::Pdf), "Weekly_Report_20240308.pdf");
        assert_eq!(export_file_name(&report, ExportFormat::Latex), "Weekly_Report_20240308.tex");
    }

    #[test]
    fn test_history_file_name_uses_project() {
        let mut report = report(vec![empty_project("Billing/Core API")]);
        report.kind = ReportKind::ProjectHistory;
        assert_eq!(
            export_file_name(&report, ExportFormat::Html),
            "Project_History_Billing_Core_API_20240308.html"
        );
    }

    #[test]
    fn test_pdf_failure_falls_back_to_latex() {
        let report = report(vec![full_project("Payments")]);
        let rendered = render_with(&report, ExportFormat::Pdf, |_| {
            Err(AppError::render("inget typsnitt"))
        })
        .unwrap();

        assert_eq!(rendered.format, ExportFormat::Latex);
        assert!(rendered.fallback_reason.unwrap().contains("inget typsnitt"));
        assert!(String::from_utf8(rendered.content).unwrap().starts_with("\\documentclass"));
    }

    #[test]
    fn test_json_export() {
        let report = report(vec![full_project("Payments")]);
        let rendered = render_with(&report, ExportFormat::Json, render_pdf).unwrap();
        let value: serde_json::Value = serde_json::from_slice(&rendered.content).unwrap();
        assert_eq!(value["title"], "Weekly Report for 2024-03-08");
        assert_eq!(value["projects"][0]["project_name"], "Payments");
        assert_eq!(value["projects"][0]["risks_issues"].as_array().unwrap().len(), 1);
    }

    #[test]
    fn test_export_to_file_with_debug_html() {
        let dir = TempDir::new().unwrap();
        let debug = dir.path().join("debug_report.html");
        let service = ExportService::new(Some(debug.clone()));
        let report = report(vec![empty_project("A")]);

        let target = dir.path().join(export_file_name(&report, ExportFormat::Html));
        let result = service.export_to_file(&report, ExportFormat::Html, &target).unwrap();

        assert_eq!(result.path, target);
        assert!(result.fallback_reason.is_none());
        assert!(std::fs::read_to_string(&target).unwrap().contains("<h2>A</h2>"));
        assert!(debug.exists());
    }

    #[test]
    fn test_export_pdf_to_file() {
        let dir = TempDir::new().unwrap();
        let report = report(vec![full_project("Payments")]);
        let target = dir.path().join(export_file_name(&report, ExportFormat::Pdf));

        let result = ExportService::new(None)
            .export_to_file(&report, ExportFormat::Pdf, &target)
            .unwrap();
        assert_eq!(result.format, ExportFormat::Pdf);
        assert!(std::fs::read(&target).unwrap().starts_with(b"%PDF"));
    }
}
