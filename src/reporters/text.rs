//! Text (terminal) reporter with colors and formatting

use crate::models::{AnalysisReport, MaturityLabel, ProbeStatus, Severity, StackCategory};
use anyhow::Result;
use console::{style, StyledObject};

const RULE: &str = "──────────────────────────────────────";
const MAX_FINDINGS: usize = 10;

fn maturity_style(label: MaturityLabel) -> StyledObject<&'static str> {
    let s = style(label.as_str()).bold();
    match label {
        MaturityLabel::Enterprise => s.green(),
        MaturityLabel::Production => s.green().bright(),
        MaturityLabel::Intermediate => s.yellow(),
        MaturityLabel::Basic => s.red(),
    }
}

fn severity_tag(severity: Severity) -> StyledObject<&'static str> {
    match severity {
        Severity::Critical => style("[C]").red().bold(),
        Severity::High => style("[H]").red().bright(),
        Severity::Medium => style("[M]").yellow(),
        Severity::Low => style("[L]").blue(),
    }
}

fn signed(value: i32) -> String {
    let text = format!("{:+}", value);
    match value {
        v if v > 0 => style(text).green().to_string(),
        v if v < 0 => style(text).red().to_string(),
        _ => style(text).dim().to_string(),
    }
}

/// Keep the tail of long paths; `chars()` avoids splitting UTF-8
fn shorten(path: &str, max: usize) -> String {
    let count = path.chars().count();
    if count <= max {
        return path.to_string();
    }
    let tail: String = path.chars().skip(count - (max - 3)).collect();
    format!("...{}", tail)
}

fn section(out: &mut String, title: &str) {
    out.push_str(&format!("{}\n", style(title).bold()));
}

/// Render report as formatted terminal output
pub fn render(report: &AnalysisReport) -> Result<String> {
    let mut out = String::new();

    out.push_str(&format!("\n{}\n", style("Archon Analysis").bold()));
    out.push_str(&format!("{}\n", style(RULE).dim()));
    out.push_str(&format!(
        "Score: {}  Maturity: {}\n\n",
        style(format!("{}/100", report.overall_score)).bold(),
        maturity_style(report.maturity_label)
    ));

    let b = &report.score_breakdown;
    section(&mut out, "SCORES");
    out.push_str(&format!(
        "  Infrastructure: {}  Standards & Tests: {}  Architecture: {}\n",
        signed(b.infrastructure),
        signed(b.standards_tests),
        signed(b.architecture)
    ));
    out.push_str(&format!(
        "  Security: {}  Complexity: {}  Duplication: {}\n\n",
        signed(b.security),
        signed(b.complexity),
        signed(b.duplication)
    ));

    section(&mut out, "STACK");
    let mut any_stack = false;
    for category in StackCategory::ALL {
        let items: Vec<&str> = report.static_scan.category(category).collect();
        if !items.is_empty() {
            any_stack = true;
            out.push_str(&format!(
                "  {:<15} {}\n",
                style(category.as_str()).dim(),
                items.join(", ")
            ));
        }
    }
    if !any_stack {
        out.push_str(&format!("  {}\n", style("nothing detected").dim()));
    }
    let standards = &report.static_scan.standards;
    let flags = [
        ("README", standards.has_readme),
        (".gitignore", standards.has_gitignore),
        ("Docker", standards.has_docker),
        ("CI", standards.has_ci),
        ("Tests", report.static_scan.testing.detected),
    ];
    let flags: Vec<String> = flags
        .iter()
        .map(|(name, on)| {
            if *on {
                format!("{} {}", style("✓").green(), name)
            } else {
                format!("{} {}", style("✗").red(), name)
            }
        })
        .collect();
    out.push_str(&format!("  {}\n\n", flags.join("  ")));

    let structure = &report.structural_evaluation;
    section(&mut out, "STRUCTURE");
    out.push_str(&format!(
        "  Modularity: {} ({})\n",
        structure.modularity_score, structure.concerns_separation
    ));
    if !structure.patterns_detected.is_empty() {
        out.push_str(&format!(
            "  Patterns: {}\n",
            structure.patterns_detected.join(", ")
        ));
    }
    out.push_str(&format!(
        "  {}\n\n",
        style(&report.architectural_critique).italic()
    ));

    let findings = &report.security_findings;
    section(&mut out, &format!("FINDINGS ({} total)", findings.len()));
    let mut summary_parts = Vec::new();
    for (severity, name) in [
        (Severity::Critical, "critical"),
        (Severity::High, "high"),
        (Severity::Medium, "medium"),
        (Severity::Low, "low"),
    ] {
        let n = report.count_severity(severity);
        if n > 0 {
            summary_parts.push(format!("{} {}", n, name));
        }
    }
    if !summary_parts.is_empty() {
        out.push_str(&format!("  {}\n", summary_parts.join(" | ")));
    }
    for finding in findings.iter().take(MAX_FINDINGS) {
        out.push_str(&format!(
            "  {}  {:<32}  {}\n",
            severity_tag(finding.severity),
            shorten(&finding.label, 32),
            style(shorten(&finding.file, 40)).dim()
        ));
    }
    let remaining = findings.len().saturating_sub(MAX_FINDINGS);
    if remaining > 0 {
        out.push_str(&format!(
            "  {}\n",
            style(format!("...and {} more (use --format json)", remaining)).dim()
        ));
    }
    out.push('\n');

    let complexity = &report.complexity;
    section(&mut out, "COMPLEXITY");
    out.push_str(&format!(
        "  Average {:.2} over {} functions\n",
        complexity.average_complexity, complexity.total_functions
    ));
    for func in &complexity.functions {
        out.push_str(&format!(
            "  {}  {:>3}  {} {}\n",
            severity_tag(func.severity),
            func.complexity,
            func.function,
            style(shorten(&func.file, 40)).dim()
        ));
    }
    out.push('\n');

    let duplication = &report.duplication;
    section(&mut out, "DUPLICATION");
    out.push_str(&format!(
        "  {:.2}% ({} of {} lines)\n",
        duplication.ratio, duplication.duplicated_lines, duplication.total_lines
    ));
    for cluster in &duplication.clusters {
        let clones: Vec<String> = cluster.clones.iter().map(|c| c.to_string()).collect();
        out.push_str(&format!(
            "  {} x{}  {}\n",
            cluster.primary,
            cluster.occurrences,
            style(clones.join(", ")).dim()
        ));
    }
    out.push('\n');

    let graph = &report.dependency_graph;
    section(&mut out, "DEPENDENCY GRAPH");
    out.push_str(&format!(
        "  {} modules, {} links\n\n",
        graph.nodes.len(),
        graph.links.len()
    ));

    if !report.domain_probes.is_empty() {
        section(&mut out, "TLS CERTIFICATES");
        for probe in &report.domain_probes {
            let status = match probe.status {
                ProbeStatus::Valid => style("valid").green(),
                ProbeStatus::Expiring => style("expiring").yellow().bold(),
                ProbeStatus::Unreachable => style("unreachable").dim(),
            };
            out.push_str(&format!(
                "  {:<30} {}  {}\n",
                probe.domain,
                status,
                style(&probe.detail).dim()
            ));
        }
        out.push('\n');
    }

    if report.actionable_roadmap.is_empty() {
        out.push_str(&format!(
            "{}\n",
            style("No remediation steps. Keep up the good work.").dim()
        ));
    } else {
        section(&mut out, "ROADMAP");
        for (i, item) in report.actionable_roadmap.iter().enumerate() {
            out.push_str(&format!("  {}. {}\n", i + 1, style(&item.title).bold()));
            out.push_str(&format!("     {}\n", item.description));
            out.push_str(&format!("     {} {}\n", style("→").cyan(), item.action));
        }
    }

    Ok(out)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::reporters::tests::test_report;

    fn plain(report: &AnalysisReport) -> String {
        console::strip_ansi_codes(&render(report).expect("render text")).into_owned()
    }

    #[test]
    fn test_text_render_sections() {
        let text = plain(&test_report());
        assert!(text.contains("Score: 42/100  Maturity: Intermediate"));
        assert!(text.contains("Security: -15"));
        assert!(text.contains("FastAPI"));
        assert!(text.contains("FINDINGS (1 total)"));
        assert!(text.contains("[H]  Insecure eval()"));
        assert!(text.contains("dispatch"));
        assert!(text.contains("app/a.py:3 x2  app/b.py:10"));
        assert!(text.contains("2 modules, 1 links"));
        assert!(text.contains("api.acme.io"));
        assert!(text.contains("1. Automated Quality Assurance"));
    }

    #[test]
    fn test_text_render_empty_roadmap() {
        let mut report = test_report();
        report.actionable_roadmap.clear();
        report.domain_probes.clear();
        let text = plain(&report);
        assert!(text.contains("No remediation steps."));
        assert!(!text.contains("TLS CERTIFICATES"));
    }

    #[test]
    fn test_shorten_keeps_tail() {
        assert_eq!(shorten("src/a.py", 40), "src/a.py");
        let long = "very/deep/directory/structure/with/many/levels/file.py";
        let short = shorten(long, 20);
        assert_eq!(short.chars().count(), 20);
        assert!(short.starts_with("..."));
        assert!(short.ends_with("file.py"));
    }
}
