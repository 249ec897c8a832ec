//! HTML-rapport
//!
//! Byggs med `Markup`, som escapar all text. Endast statiska strängar kan
//! skrivas orörda.

use crate::models::{ProjectReport, Report};
use crate::utils::date::format_date;

use super::{
    comment_or_placeholder, entry_heading, percent, qe_rows, status_color, yes_no,
    NONE_PLACEHOLDER, NO_ACTIONS_PLACEHOLDER, NO_RAG_PLACEHOLDER, NO_RISKS_PLACEHOLDER,
};

const STYLE: &str = "
body { font-family: Times New Roman, Times, serif; font-size: 12pt; margin: 0.5in; line-height: 1.2; }
h1 { font-size: 18pt; text-align: center; color: #003366; margin: 10px 0; }
h2 { font-size: 14pt; color: #003366; margin: 8px 0; }
h3 { font-size: 12pt; color: #004080; margin: 6px 0; }
p, ul { margin: 4px 0; }
ul { padding-left: 20px; }
table { width: 100%; border-collapse: collapse; margin: 8px 0; }
th, td { padding: 4px; text-align: left; font-size: 12pt; }
.status-green, .rag-green, .ms-green { color: green; }
.status-red, .rag-red, .ms-red { color: red; }
.rag-orange, .ms-orange { color: orange; }
hr { margin: 8px 0; border: 0.5px solid #ccc; }
.project-container { margin-bottom: 16px; }
";

/// Enkel markup-byggare
#[derive(Debug, Default)]
pub struct Markup {
    buf: String,
}

impl Markup {
    pub fn new() -> Self {
        Self::default()
    }

    /// Statisk markup, skrivs utan escaping
    pub fn raw(&mut self, markup: &'static str) -> &mut Self {
        self.buf.push_str(markup);
        self
    }

    /// Text, escapas alltid
    pub fn text(&mut self, text: &str) -> &mut Self {
        escape_into(&mut self.buf, text);
        self
    }

    pub fn open(&mut self, tag: &'static str) -> &mut Self {
        self.buf.push('<');
        self.buf.push_str(tag);
        self.buf.push('>');
        self
    }

    /// Öppna ett element med attribut; värdena escapas
    pub fn open_with(&mut self, tag: &'static str, attrs: &[(&'static str, &str)]) -> &mut Self {
        self.buf.push('<');
        self.buf.push_str(tag);
        for (name, value) in attrs {
            self.buf.push(' ');
            self.buf.push_str(name);
            self.buf.push_str("=\"");
            escape_into(&mut self.buf, value);
            self.buf.push('"');
        }
        self.buf.push('>');
        self
    }

    pub fn close(&mut self, tag: &'static str) -> &mut Self {
        self.buf.push_str("</");
        self.buf.push_str(tag);
        self.buf.push('>');
        self
    }

    /// `<tag>text</tag>`
    pub fn element(&mut self, tag: &'static str, text: &str) -> &mut Self {
        self.open(tag).text(text).close(tag)
    }

    /// `<span class="...">text</span>`
    pub fn span(&mut self, class: &str, text: &str) -> &mut Self {
        self.open_with("span", &[("class", class)])
            .text(text)
            .close("span")
    }

    pub fn finish(self) -> String {
        self.buf
    }
}

pub fn escape(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    escape_into(&mut out, text);
    out
}

fn escape_into(out: &mut String, text: &str) {
    for c in text.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#39;"),
            _ => out.push(c),
        }
    }
}

/// Rendera hela rapporten till ett fristående HTML-dokument
pub fn render_html(report: &Report) -> String {
    let mut m = Markup::new();

    m.raw("<!DOCTYPE html>\n<html>\n<head>\n<meta charset=\"utf-8\">\n");
    m.element("title", &report.title);
    m.raw("\n<style>").raw(STYLE).raw("</style>\n</head>\n<body>\n");
    m.element("h1", &report.title).raw("\n<hr>\n");

    for (idx, project) in report.projects.iter().enumerate() {
        let style = if idx == 0 {
            ""
        } else {
            "page-break-before: always;"
        };
        m.open_with("div", &[("class", "project-container"), ("style", style)])
            .raw("\n");
        m.element("h2", &entry_heading(report, project)).raw("\n");

        facts_table(&mut m, project);
        line_list(&mut m, "Accomplishments", &project.accomplishment_lines());
        line_list(&mut m, "Decisions Needed", &project.decision_lines());

        // Milstolpetexten visas som en enda punkt
        m.element("h3", "Milestones").open("ul");
        let milestones = project.milestones_text.trim();
        m.element("li", if milestones.is_empty() { NONE_PLACEHOLDER } else { milestones });
        m.close("ul").raw("\n");

        rag_section(&mut m, project);
        risks_section(&mut m, project);
        actions_section(&mut m, project);
        qe_section(&mut m, project);
        milestone_section(&mut m, project);

        m.close("div").raw("\n<hr>\n");
    }

    m.raw("</body>\n</html>\n");
    m.finish()
}

fn facts_table(m: &mut Markup, project: &ProjectReport) {
    let row = |m: &mut Markup, label: &str, value: &str| {
        m.open("tr").element("th", label).element("td", value).close("tr");
    };

    m.open("table");
    row(m, "Client/BU", &project.client_business_unit);
    row(m, "Project Manager", &project.project_manager);
    row(m, "Duration", &project.duration_display());
    row(m, "Phase", project.phase_display());

    m.open("tr").element("th", "Status").open("td");
    m.span(&format!("status-{}", status_color(project)), project.status_display());
    m.close("td").close("tr");
    m.close("table").raw("\n");
}

fn line_list(m: &mut Markup, heading: &str, lines: &[&str]) {
    m.element("h3", heading).open("ul");
    if lines.is_empty() {
        m.element("li", NONE_PLACEHOLDER);
    }
    for line in lines {
        m.element("li", line);
    }
    m.close("ul").raw("\n");
}

fn rag_section(m: &mut Markup, project: &ProjectReport) {
    m.element("h3", "RAG Status").open("ul");
    if project.rag_status.is_empty() {
        m.element("li", NO_RAG_PLACEHOLDER);
    }
    for rag in &project.rag_status {
        m.open("li").element("strong", rag.area.display_name()).raw(": ");
        m.span(&format!("rag-{}", rag.status.color_name()), rag.status.display_name());
        m.raw(" - ").text(comment_or_placeholder(&rag.comment)).close("li");
    }
    m.close("ul").raw("\n");
}

fn risks_section(m: &mut Markup, project: &ProjectReport) {
    m.element("h3", "Risks & Issues").open("ul");
    if project.risks_issues.is_empty() {
        m.element("li", NO_RISKS_PLACEHOLDER);
    }
    for ri in &project.risks_issues {
        m.open("li").element("strong", ri.kind.display_name()).raw(": ");
        m.text(&ri.description)
            .raw(" (Owner: ")
            .text(&ri.owner)
            .raw(", ETA: ")
            .text(&ri.mitigation_eta)
            .raw(")")
            .close("li");
    }
    m.close("ul").raw("\n");
}

fn actions_section(m: &mut Markup, project: &ProjectReport) {
    m.element("h3", "Action Items").open("ul");
    if project.action_items.is_empty() {
        m.element("li", NO_ACTIONS_PLACEHOLDER);
    }
    for action in &project.action_items {
        m.open("li")
            .text(&action.description)
            .raw(" - ")
            .text(&action.status)
            .raw(" (Client Input: ")
            .raw(yes_no(action.client_input_required))
            .raw(")")
            .close("li");
    }
    m.close("ul").raw("\n");
}

fn qe_section(m: &mut Markup, project: &ProjectReport) {
    let rows = qe_rows(project);
    if rows.is_empty() {
        return;
    }

    m.element("h3", "QE Metrics").open("table");
    for (label, value) in &rows {
        m.open("tr").element("th", label).element("td", value).close("tr");
    }
    m.close("table").raw("\n");
}

fn milestone_section(m: &mut Markup, project: &ProjectReport) {
    if project.milestones.is_empty() {
        return;
    }

    m.element("h3", "Milestone Tracking").open("table").open("tr");
    for header in ["Milestone", "Planned Start", "Planned End", "Weight", "Expected", "Actual", "Status"] {
        m.element("th", header);
    }
    m.close("tr");

    for ms in &project.milestones {
        let name = if ms.is_child() {
            format!("- {}", ms.name)
        } else {
            ms.name.clone()
        };
        let actual = ms.actual_progress.map(percent).unwrap_or_else(|| "-".to_string());

        m.open("tr")
            .element("td", &name)
            .element("td", &format_date(ms.planned_start))
            .element("td", &format_date(ms.planned_end))
            .element("td", &percent(ms.weightage))
            .element("td", &percent(ms.expected_progress))
            .element("td", &actual)
            .open("td");
        m.span(&format!("ms-{}", ms.status.color_name()), ms.status.label());
        m.close("td").close("tr");
    }
    m.close("table").raw("\n");

    if let Some(weighted) = project.weighted_progress {
        m.open("p")
            .element("strong", "Weighted Progress:")
            .raw(" ")
            .text(&percent(weighted))
            .close("p")
            .raw("\n");
    }
}

#[cfg(test)]
mod tests {
    use super::super::fixtures::*;
    use super::*;

    #[test]
    fn test_escape() {
        assert_eq!(escape("<b>&\"'"), "&lt;b&gt;&amp;&quot;&#39;");
        assert_eq!(escape("plain"), "plain");
    }

    #[test]
    fn test_markup_escapes_text_and_attributes() {
        let mut m = Markup::new();
        m.open_with("td", &[("title", "a\"b")]).text("<script>").close("td");
        assert_eq!(m.finish(), "<td title=\"a&quot;b\">&lt;script&gt;</td>");
    }

    #[test]
    fn test_placeholders_for_empty_project() {
        let html = render_html(&report(vec![empty_project("Quiet")]));
        assert!(html.contains("<li>None</li>"));
        assert!(html.contains("<li>No RAG status available</li>"));
        assert!(html.contains("<li>No risks or issues</li>"));
        assert!(html.contains("<li>No action items</li>"));
        assert!(!html.contains("QE Metrics"));
        assert!(!html.contains("Milestone Tracking"));
    }

    #[test]
    fn test_full_project_sections() {
        let html = render_html(&report(vec![full_project("Payments")]));
        assert!(html.contains("<h1>Weekly Report for 2024-03-08</h1>"));
        assert!(html.contains("<li>Closed sprint 4</li><li>Deployed to test</li>"));
        assert!(html.contains("<span class=\"rag-orange\">Amber</span> - Two weeks late"));
        assert!(html.contains("<strong>Issue</strong>: Env down (Owner: TBD, ETA: TBD)"));
        assert!(html.contains("Escalate - Pending (Client Input: Yes)"));
        assert!(html.contains("<span class=\"status-red\">Delayed</span>"));
        assert!(html.contains("QE Metrics"));
        assert!(html.contains("<span class=\"ms-red\">Critical</span>"));
        assert!(html.contains("Weighted Progress:</strong> 5%"));
    }

    #[test]
    fn test_page_break_on_all_but_first() {
        let html = render_html(&report(vec![
            empty_project("A"),
            empty_project("B"),
            empty_project("C"),
        ]));
        assert_eq!(html.matches("page-break-before: always;").count(), 2);
        assert!(html.contains("<div class=\"project-container\" style=\"\">\n<h2>A</h2>"));
    }

    #[test]
    fn test_user_text_is_escaped() {
        let mut project = empty_project("R&D <Core>");
        project.accomplishments = "<script>alert(1)</script>".into();
        let html = render_html(&report(vec![project]));
        assert!(html.contains("<h2>R&amp;D &lt;Core&gt;</h2>"));
        assert!(html.contains("&lt;script&gt;alert(1)&lt;/script&gt;"));
        assert!(!html.contains("<script>"));
    }
}
