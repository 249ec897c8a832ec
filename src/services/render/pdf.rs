//! PDF-rapport med printpdf
//!
//! Samma sektioner som HTML-rapporten. Ny sida per projekt och automatisk
//! sidbrytning när sidan är full.

use printpdf::{
    BuiltinFont, Color, IndirectFontRef, Mm, PdfDocument, PdfDocumentReference,
    PdfLayerReference, Rgb,
};

use crate::models::{ProjectReport, Report};
use crate::utils::date::format_date;
use crate::utils::{AppError, AppResult};

use super::{
    comment_or_placeholder, entry_heading, percent, qe_rows, status_color, yes_no,
    NONE_PLACEHOLDER, NO_ACTIONS_PLACEHOLDER, NO_RAG_PLACEHOLDER, NO_RISKS_PLACEHOLDER,
};

const PAGE_WIDTH: Mm = Mm(210.0);
const PAGE_HEIGHT: Mm = Mm(297.0);
const MARGIN_LEFT: Mm = Mm(15.0);
const MARGIN_TOP: Mm = Mm(282.0);
const MARGIN_BOTTOM: Mm = Mm(15.0);
const BODY_SIZE: f32 = 10.0;
const LINE_HEIGHT: Mm = Mm(5.0);
/// Tecken per rad för brödtext i 10pt Times på A4 med marginaler
const WRAP_WIDTH: usize = 100;

/// Textfärger
fn rgb(name: &str) -> Color {
    let (r, g, b) = match name {
        "green" => (0.0, 0.5, 0.0),
        "orange" => (1.0, 0.55, 0.0),
        "red" => (0.8, 0.0, 0.0),
        "heading" => (0.0, 0.2, 0.4),
        "subheading" => (0.0, 0.25, 0.5),
        _ => (0.0, 0.0, 0.0),
    };
    Color::Rgb(Rgb::new(r, g, b, None))
}

struct PdfWriter {
    doc: PdfDocumentReference,
    layer: PdfLayerReference,
    regular: IndirectFontRef,
    bold: IndirectFontRef,
    y: Mm,
    pages: usize,
}

impl PdfWriter {
    fn new(title: &str) -> AppResult<Self> {
        let (doc, page, layer) = PdfDocument::new(title, PAGE_WIDTH, PAGE_HEIGHT, "Layer 1");
        let layer = doc.get_page(page).get_layer(layer);
        let regular = doc
            .add_builtin_font(BuiltinFont::TimesRoman)
            .map_err(|e| AppError::render(format!("Typsnitt: {}", e)))?;
        let bold = doc
            .add_builtin_font(BuiltinFont::TimesBold)
            .map_err(|e| AppError::render(format!("Typsnitt: {}", e)))?;

        Ok(Self {
            doc,
            layer,
            regular,
            bold,
            y: MARGIN_TOP,
            pages: 1,
        })
    }

    fn new_page(&mut self) {
        self.pages += 1;
        let (page, layer) = self
            .doc
            .add_page(PAGE_WIDTH, PAGE_HEIGHT, format!("Layer {}", self.pages));
        self.layer = self.doc.get_page(page).get_layer(layer);
        self.y = MARGIN_TOP;
    }

    /// Byt sida om det inte finns plats för `height`
    fn ensure_space(&mut self, height: Mm) {
        if self.y - height < MARGIN_BOTTOM {
            self.new_page();
        }
    }

    fn text_at(&self, text: &str, size: f32, bold: bool, color: &str, x: Mm) {
        self.layer.set_fill_color(rgb(color));
        let font = if bold { &self.bold } else { &self.regular };
        self.layer.use_text(text, size, x, self.y, font);
    }

    fn line(&mut self, text: &str, size: f32, bold: bool, color: &str) {
        let height = Mm(size * 0.5);
        self.ensure_space(height);
        self.text_at(text, size, bold, color, MARGIN_LEFT);
        self.y = self.y - height;
    }

    fn title(&mut self, text: &str) {
        self.line(text, 16.0, true, "heading");
        self.y = self.y - Mm(3.0);
    }

    fn heading(&mut self, text: &str) {
        self.y = self.y - Mm(2.0);
        self.line(text, 13.0, true, "heading");
    }

    fn subheading(&mut self, text: &str) {
        // Rubriken ska inte hamna ensam längst ner på sidan
        self.ensure_space(Mm(LINE_HEIGHT.0 * 3.0));
        self.y = self.y - Mm(1.5);
        self.line(text, 11.0, true, "subheading");
    }

    /// Punkt med radbrytning; fortsättningsrader indras
    fn bullet(&mut self, text: &str) {
        for (idx, part) in textwrap::wrap(text, WRAP_WIDTH - 4).iter().enumerate() {
            self.ensure_space(LINE_HEIGHT);
            let x = MARGIN_LEFT + Mm(4.0);
            if idx == 0 {
                self.text_at("-", BODY_SIZE, false, "black", MARGIN_LEFT);
            }
            self.text_at(part, BODY_SIZE, false, "black", x);
            self.y = self.y - LINE_HEIGHT;
        }
    }

    /// Etikett i fetstil, värde i färg
    fn labeled(&mut self, label: &str, value: &str, color: &str) {
        let wrapped = textwrap::wrap(value, WRAP_WIDTH - 25);
        for (idx, part) in wrapped.iter().enumerate() {
            self.ensure_space(LINE_HEIGHT);
            if idx == 0 {
                self.text_at(label, BODY_SIZE, true, "black", MARGIN_LEFT);
            }
            self.text_at(part, BODY_SIZE, false, color, MARGIN_LEFT + Mm(45.0));
            self.y = self.y - LINE_HEIGHT;
        }
        if wrapped.is_empty() {
            self.ensure_space(LINE_HEIGHT);
            self.text_at(label, BODY_SIZE, true, "black", MARGIN_LEFT);
            self.y = self.y - LINE_HEIGHT;
        }
    }

    /// Tabellrad med fasta kolumnpositioner (mm från vänstermarginalen)
    fn row(&mut self, cells: &[(&str, f32)], bold: bool, color: &str) {
        self.ensure_space(LINE_HEIGHT);
        for (text, offset) in cells {
            self.text_at(text, 9.0, bold, color, MARGIN_LEFT + Mm(*offset));
        }
        self.y = self.y - LINE_HEIGHT;
    }

    fn rule(&mut self) {
        self.y = self.y - Mm(2.0);
    }

    fn finish(self) -> AppResult<Vec<u8>> {
        self.doc
            .save_to_bytes()
            .map_err(|e| AppError::render(format!("Kunde inte spara PDF: {}", e)))
    }
}

/// Rendera rapporten till PDF-bytes
pub fn render_pdf(report: &Report) -> AppResult<Vec<u8>> {
    let mut w = PdfWriter::new(&report.title)?;
    w.title(&report.title);

    for (idx, project) in report.projects.iter().enumerate() {
        if idx > 0 {
            w.new_page();
        }
        write_project(&mut w, report, project);
    }

    tracing::debug!("PDF renderad: {} sidor", w.pages);
    w.finish()
}

fn write_project(w: &mut PdfWriter, report: &Report, project: &ProjectReport) {
    w.heading(&entry_heading(report, project));

    w.labeled("Client/BU", &project.client_business_unit, "black");
    w.labeled("Project Manager", &project.project_manager, "black");
    w.labeled("Duration", &project.duration_display(), "black");
    w.labeled("Phase", project.phase_display(), "black");
    w.labeled("Status", project.status_display(), status_color(project));

    bullets(w, "Accomplishments", &project.accomplishment_lines(), NONE_PLACEHOLDER);
    bullets(w, "Decisions Needed", &project.decision_lines(), NONE_PLACEHOLDER);

    let milestones_text = project.milestones_text.trim();
    let milestone_lines: Vec<&str> = if milestones_text.is_empty() {
        Vec::new()
    } else {
        vec![milestones_text]
    };
    bullets(w, "Milestones", &milestone_lines, NONE_PLACEHOLDER);

    w.subheading("RAG Status");
    if project.rag_status.is_empty() {
        w.bullet(NO_RAG_PLACEHOLDER);
    }
    for rag in &project.rag_status {
        w.ensure_space(LINE_HEIGHT);
        w.text_at("-", BODY_SIZE, false, "black", MARGIN_LEFT);
        w.text_at(rag.area.display_name(), BODY_SIZE, true, "black", MARGIN_LEFT + Mm(4.0));
        w.text_at(
            rag.status.display_name(),
            BODY_SIZE,
            true,
            rag.status.color_name(),
            MARGIN_LEFT + Mm(28.0),
        );
        w.text_at(
            comment_or_placeholder(&rag.comment),
            BODY_SIZE,
            false,
            "black",
            MARGIN_LEFT + Mm(45.0),
        );
        w.y = w.y - LINE_HEIGHT;
    }

    let risks: Vec<String> = project
        .risks_issues
        .iter()
        .map(|ri| {
            format!(
                "{}: {} (Owner: {}, ETA: {})",
                ri.kind.display_name(),
                ri.description,
                ri.owner,
                ri.mitigation_eta
            )
        })
        .collect();
    bullets(w, "Risks & Issues", &as_strs(&risks), NO_RISKS_PLACEHOLDER);

    let actions: Vec<String> = project
        .action_items
        .iter()
        .map(|a| {
            format!(
                "{} - {} (Client Input: {})",
                a.description,
                a.status,
                yes_no(a.client_input_required)
            )
        })
        .collect();
    bullets(w, "Action Items", &as_strs(&actions), NO_ACTIONS_PLACEHOLDER);

    let qe = qe_rows(project);
    if !qe.is_empty() {
        w.subheading("QE Metrics");
        for (label, value) in &qe {
            w.labeled(label, value, "black");
        }
    }

    if !project.milestones.is_empty() {
        w.subheading("Milestone Tracking");
        let columns = [0.0, 60.0, 85.0, 110.0, 127.0, 145.0, 162.0];
        let headers = ["Milestone", "Start", "End", "Weight", "Expected", "Actual", "Status"];
        let header_cells: Vec<(&str, f32)> = headers.iter().copied().zip(columns).collect();
        w.row(&header_cells, true, "black");

        for ms in &project.milestones {
            let name = if ms.is_child() {
                format!("   {}", ms.name)
            } else {
                ms.name.clone()
            };
            let name = truncate(&name, 38);
            let start = format_date(ms.planned_start);
            let end = format_date(ms.planned_end);
            let weight = percent(ms.weightage);
            let expected = percent(ms.expected_progress);
            let actual = ms.actual_progress.map(percent).unwrap_or_else(|| "-".to_string());

            let cells = [
                (name.as_str(), columns[0]),
                (start.as_str(), columns[1]),
                (end.as_str(), columns[2]),
                (weight.as_str(), columns[3]),
                (expected.as_str(), columns[4]),
                (actual.as_str(), columns[5]),
            ];
            w.ensure_space(LINE_HEIGHT);
            for (text, offset) in cells {
                w.text_at(text, 9.0, false, "black", MARGIN_LEFT + Mm(offset));
            }
            w.text_at(
                ms.status.label(),
                9.0,
                true,
                ms.status.color_name(),
                MARGIN_LEFT + Mm(columns[6]),
            );
            w.y = w.y - LINE_HEIGHT;
        }

        if let Some(weighted) = project.weighted_progress {
            w.labeled("Weighted Progress", &percent(weighted), "black");
        }
    }

    w.rule();
}

fn bullets(w: &mut PdfWriter, heading: &str, lines: &[&str], placeholder: &str) {
    w.subheading(heading);
    if lines.is_empty() {
        w.bullet(placeholder);
    }
    for line in lines {
        w.bullet(line);
    }
}

fn as_strs(items: &[String]) -> Vec<&str> {
    items.iter().map(String::as_str).collect()
}

fn truncate(text: &str, max_chars: usize) -> String {
    if text.chars().count() <= max_chars {
        return text.to_string();
    }
    let mut out: String = text.chars().take(max_chars.saturating_sub(3)).collect();
    out.push_str("...");
    out
}

#[cfg(test)]
mod tests {
    use super::super::fixtures::*;
    use super::*;

    #[test]
    fn test_render_pdf_produces_document() {
        let bytes = render_pdf(&report(vec![full_project("Payments"), empty_project("Ops")])).unwrap();
        assert!(bytes.starts_with(b"%PDF"));
        assert!(bytes.len() > 1000);
    }

    #[test]
    fn test_long_report_paginates() {
        let mut project = full_project("Big");
        project.accomplishments = (0..200)
            .map(|i| format!("Accomplishment number {} with some extra words to wrap", i))
            .collect::<Vec<_>>()
            .join("\n");
        let bytes = render_pdf(&report(vec![project])).unwrap();
        assert!(bytes.starts_with(b"%PDF"));
    }

    #[test]
    fn test_truncate() {
        assert_eq!(truncate("short", 10), "short");
        assert_eq!(truncate("a very long milestone name", 10), "a very ...");
    }
}
