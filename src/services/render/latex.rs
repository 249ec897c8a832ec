//! LaTeX-källa, används när PDF-renderingen misslyckas

use std::fmt::Write;

use crate::models::{ProjectReport, Report};
use crate::utils::date::format_date;

use super::{
    comment_or_placeholder, entry_heading, percent, qe_rows, status_color, yes_no,
    NONE_PLACEHOLDER, NO_ACTIONS_PLACEHOLDER, NO_RAG_PLACEHOLDER, NO_RISKS_PLACEHOLDER,
};

const PREAMBLE: &str = r"\documentclass[a4paper,11pt]{article}
\usepackage[utf8]{inputenc}
\usepackage[T1]{fontenc}
\usepackage{geometry}
\geometry{margin=0.5in}
\usepackage{xcolor}
\usepackage{enumitem}
\usepackage{booktabs}
\usepackage{parskip}
\usepackage{times}
\begin{document}
";

const RULE: &str = "\\vspace{0.3cm}\n\\hrule\n\\vspace{0.3cm}\n";

/// Escapa LaTeX specialtecken
pub fn escape_latex(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '\\' => out.push_str(r"\textbackslash{}"),
            '&' | '%' | '$' | '#' | '_' | '{' | '}' => {
                out.push('\\');
                out.push(c);
            }
            '~' => out.push_str(r"\textasciitilde{}"),
            '^' => out.push_str(r"\textasciicircum{}"),
            _ => out.push(c),
        }
    }
    out
}

pub fn render_latex(report: &Report) -> String {
    let mut out = String::from(PREAMBLE);

    let _ = writeln!(
        out,
        "\\begin{{center}}\n\\textbf{{\\Large {}}}\n\\end{{center}}",
        escape_latex(&report.title)
    );
    out.push_str(RULE);

    for (idx, project) in report.projects.iter().enumerate() {
        if idx > 0 {
            out.push_str("\\newpage\n");
        }
        write_project(&mut out, report, project);
        out.push_str(RULE);
    }

    out.push_str("\\end{document}\n");
    out
}

fn write_project(out: &mut String, report: &Report, project: &ProjectReport) {
    let _ = writeln!(out, "\\section*{{{}}}", escape_latex(&entry_heading(report, project)));

    out.push_str("\\begin{tabular}{p{0.4\\textwidth} p{0.55\\textwidth}}\n");
    let facts = [
        ("Client/BU", escape_latex(&project.client_business_unit)),
        ("Project Manager", escape_latex(&project.project_manager)),
        ("Duration", escape_latex(&project.duration_display())),
        ("Phase", escape_latex(project.phase_display())),
        (
            "Status",
            format!(
                "\\textcolor{{{}}}{{{}}}",
                status_color(project),
                escape_latex(project.status_display())
            ),
        ),
    ];
    for (label, value) in &facts {
        let _ = writeln!(out, "\\textbf{{{}}} & {} \\\\", label, value);
    }
    out.push_str("\\end{tabular}\n");

    let milestones_text = project.milestones_text.trim();
    let milestone_items: Vec<String> = if milestones_text.is_empty() {
        Vec::new()
    } else {
        vec![escape_latex(milestones_text)]
    };

    item_list(out, "Accomplishments", &escaped(&project.accomplishment_lines()), NONE_PLACEHOLDER);
    item_list(out, "Decisions Needed", &escaped(&project.decision_lines()), NONE_PLACEHOLDER);
    item_list(out, "Milestones", &milestone_items, NONE_PLACEHOLDER);

    let rag: Vec<String> = project
        .rag_status
        .iter()
        .map(|r| {
            format!(
                "\\textbf{{{}}}: \\textcolor{{{}}}{{{}}} -- {}",
                r.area.display_name(),
                r.status.color_name(),
                r.status.display_name(),
                escape_latex(comment_or_placeholder(&r.comment))
            )
        })
        .collect();
    item_list(out, "RAG Status", &rag, NO_RAG_PLACEHOLDER);

    let risks: Vec<String> = project
        .risks_issues
        .iter()
        .map(|ri| {
            format!(
                "\\textbf{{{}}}: {} (Owner: {}, ETA: {})",
                ri.kind.display_name(),
                escape_latex(&ri.description),
                escape_latex(&ri.owner),
                escape_latex(&ri.mitigation_eta)
            )
        })
        .collect();
    item_list(out, "Risks \\& Issues", &risks, NO_RISKS_PLACEHOLDER);

    let actions: Vec<String> = project
        .action_items
        .iter()
        .map(|a| {
            format!(
                "{} -- {} (Client Input: {})",
                escape_latex(&a.description),
                escape_latex(&a.status),
                yes_no(a.client_input_required)
            )
        })
        .collect();
    item_list(out, "Action Items", &actions, NO_ACTIONS_PLACEHOLDER);

    let qe = qe_rows(project);
    if !qe.is_empty() {
        out.push_str("\\subsection*{QE Metrics}\n\\begin{tabular}{ll}\n");
        for (label, value) in &qe {
            let _ = writeln!(out, "\\textbf{{{}}} & {} \\\\", label, escape_latex(value));
        }
        out.push_str("\\end{tabular}\n");
    }

    if !project.milestones.is_empty() {
        out.push_str("\\subsection*{Milestone Tracking}\n\\begin{tabular}{lllrrrl}\n\\toprule\n");
        out.push_str("Milestone & Start & End & Weight & Expected & Actual & Status \\\\\n\\midrule\n");
        for ms in &project.milestones {
            let indent = if ms.is_child() { "\\quad " } else { "" };
            let actual = ms.actual_progress.map(percent).unwrap_or_else(|| "-".to_string());
            let _ = writeln!(
                out,
                "{}{} & {} & {} & {} & {} & {} & \\textcolor{{{}}}{{{}}} \\\\",
                indent,
                escape_latex(&ms.name),
                format_date(ms.planned_start),
                format_date(ms.planned_end),
                escape_latex(&percent(ms.weightage)),
                escape_latex(&percent(ms.expected_progress)),
                escape_latex(&actual),
                ms.status.color_name(),
                ms.status.label()
            );
        }
        out.push_str("\\bottomrule\n\\end{tabular}\n");

        if let Some(weighted) = project.weighted_progress {
            let _ = writeln!(
                out,
                "\n\\textbf{{Weighted Progress:}} {}",
                escape_latex(&percent(weighted))
            );
        }
    }
}

fn escaped(lines: &[&str]) -> Vec<String> {
    lines.iter().map(|l| escape_latex(l)).collect()
}

fn item_list(out: &mut String, heading: &str, items: &[String], placeholder: &str) {
    let _ = writeln!(out, "\\subsection*{{{}}}\n\\begin{{itemize}}[leftmargin=*]", heading);
    if items.is_empty() {
        let _ = writeln!(out, "\\item {}", placeholder);
    }
    for item in items {
        let _ = writeln!(out, "\\item {}", item);
    }
    out.push_str("\\end{itemize}\n");
}

#[cfg(test)]
mod tests {
    use super::super::fixtures::*;
    use super::*;

    #[test]
    fn test_escape_latex() {
        assert_eq!(escape_latex("R&D 50% $5 #1 a_b {x}"), r"R\&D 50\% \$5 \#1 a\_b \{x\}");
        assert_eq!(escape_latex(r"C:\dir ~ ^"), r"C:\textbackslash{}dir \textasciitilde{} \textasciicircum{}");
    }

    #[test]
    fn test_document_structure() {
        let tex = render_latex(&report(vec![full_project("R&D"), empty_project("Ops")]));
        assert!(tex.starts_with("\\documentclass"));
        assert!(tex.trim_end().ends_with("\\end{document}"));
        assert!(tex.contains("\\section*{R\\&D}"));
        assert!(tex.contains("\\textcolor{orange}{Amber} -- Two weeks late"));
        assert!(tex.contains("\\item No risks or issues"));
        assert!(tex.contains("\\item No action items"));
        assert!(tex.contains("\\item No RAG status available"));
        assert_eq!(tex.matches("\\newpage").count(), 1);
        assert!(tex.contains("Weighted Progress:} 5\\%"));
    }
}
