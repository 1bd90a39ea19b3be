//! Size-bounded plain-text digest for an external narrative engine
//!
//! The digest is the report summary followed by file samples in priority
//! order: README, manifests, entry points, files with flagged functions,
//! then every other source file. Each sample is capped at
//! `sample_chars`, and the whole digest never exceeds `max_chars`.

use crate::config::DigestConfig;
use crate::models::{AnalysisReport, StackCategory};
use crate::scanner::{truncate_chars, SourceFile, SourceTree};
use crate::stack::Manifest;
use std::collections::{BTreeMap, HashSet};
use std::fmt::Write;
use tracing::debug;

const MAX_DIGEST_FINDINGS: usize = 30;
const TOP_CONNECTED: usize = 5;

const ENTRY_POINTS: &[&str] = &[
    "main.py", "app.py", "manage.py", "wsgi.py", "asgi.py", "server.py", "index.js", "index.ts",
    "server.js", "server.ts", "app.js", "app.ts", "main.js", "main.ts", "App.tsx", "App.jsx",
    "main.go", "main.rs", "lib.rs", "Main.java", "Application.java", "index.php",
];

/// Sampling priority; lower sorts first
fn priority(file: &SourceFile, flagged: &HashSet<&str>) -> Option<u8> {
    if file.name.to_lowercase().starts_with("readme") {
        Some(0)
    } else if Manifest::from_file_name(&file.name).is_some() {
        Some(1)
    } else if ENTRY_POINTS.contains(&file.name.as_str()) {
        Some(2)
    } else if flagged.contains(file.relative.as_str()) {
        Some(3)
    } else if file.is_source() {
        Some(4)
    } else {
        None
    }
}

/// Build the digest text
pub fn build(report: &AnalysisReport, tree: Option<&SourceTree>, config: &DigestConfig) -> String {
    let mut out = summary(report);

    if let Some(tree) = tree {
        let flagged: HashSet<&str> = report
            .complexity
            .functions
            .iter()
            .map(|f| f.file.as_str())
            .collect();

        let mut samples: Vec<(u8, &SourceFile)> = tree
            .files()
            .iter()
            .filter_map(|f| priority(f, &flagged).map(|p| (p, f)))
            .collect();
        // Stable: discovery order within each priority
        samples.sort_by_key(|(p, _)| *p);

        out.push_str("\n## File Samples\n");
        for (_, file) in samples {
            if out.chars().count() >= config.max_chars {
                break;
            }
            // A sample never needs more than sample_chars chars, i.e. 4 bytes each
            let content = match file.read_prefix(config.sample_chars.saturating_mul(4)) {
                Ok(c) => c,
                Err(e) => {
                    debug!("{}", e);
                    continue;
                }
            };
            let sample = truncate_chars(&content, config.sample_chars);
            let _ = write!(out, "\n### {}\n```\n{}\n```\n", file.relative, sample.trim_end());
        }
    }

    truncate_chars(&out, config.max_chars).to_string()
}

fn summary(report: &AnalysisReport) -> String {
    let mut out = String::new();
    let b = &report.score_breakdown;

    let _ = writeln!(out, "# Repository Analysis Digest");
    let _ = writeln!(
        out,
        "Score: {}/100 ({})",
        report.overall_score, report.maturity_label
    );
    let _ = writeln!(
        out,
        "Breakdown: infrastructure={} standards_tests={} architecture={} security={} complexity={} duplication={}",
        b.infrastructure, b.standards_tests, b.architecture, b.security, b.complexity, b.duplication
    );

    let _ = writeln!(out, "\n## Stack");
    for category in StackCategory::ALL {
        let items: Vec<&str> = report.static_scan.category(category).collect();
        if !items.is_empty() {
            let _ = writeln!(out, "{}: {}", category.as_str(), items.join(", "));
        }
    }
    let s = &report.static_scan.standards;
    let present: Vec<&str> = [
        ("readme", s.has_readme),
        ("gitignore", s.has_gitignore),
        ("docker", s.has_docker),
        ("ci", s.has_ci),
        ("terraform", s.has_terraform),
        ("kubernetes", s.has_kubernetes),
        ("openapi", s.has_openapi),
        ("linting", s.has_linting),
    ]
    .iter()
    .filter(|(_, on)| *on)
    .map(|(name, _)| *name)
    .collect();
    let _ = writeln!(out, "Standards: {}", or_none(&present.join(", ")));
    let testing = &report.static_scan.testing;
    if testing.detected {
        let frameworks: Vec<&str> = testing.frameworks.iter().map(String::as_str).collect();
        let _ = writeln!(out, "Testing: detected ({})", or_none(&frameworks.join(", ")));
    } else {
        let _ = writeln!(out, "Testing: not detected");
    }

    let structure = &report.structural_evaluation;
    let _ = writeln!(out, "\n## Structure");
    let _ = writeln!(
        out,
        "Patterns: {}",
        or_none(&structure.patterns_detected.join(", "))
    );
    let _ = writeln!(
        out,
        "Modularity: {} ({})",
        structure.modularity_score, structure.concerns_separation
    );
    let _ = writeln!(out, "Critique: {}", report.architectural_critique);

    let findings = &report.security_findings;
    let _ = writeln!(out, "\n## Security Findings ({})", findings.len());
    for f in findings.iter().take(MAX_DIGEST_FINDINGS) {
        let _ = writeln!(out, "- [{}] {}: {} in {}", f.severity, f.kind, f.label, f.file);
    }
    if findings.len() > MAX_DIGEST_FINDINGS {
        let _ = writeln!(out, "- ... {} more", findings.len() - MAX_DIGEST_FINDINGS);
    }

    let complexity = &report.complexity;
    let _ = writeln!(out, "\n## Complexity");
    let _ = writeln!(
        out,
        "Average: {:.2} over {} functions",
        complexity.average_complexity, complexity.total_functions
    );
    for f in &complexity.functions {
        let _ = writeln!(
            out,
            "- {}::{} ({}, {})",
            f.file, f.function, f.complexity, f.severity
        );
    }

    let duplication = &report.duplication;
    let _ = writeln!(out, "\n## Duplication");
    let _ = writeln!(
        out,
        "Ratio: {:.2}% ({} of {} lines)",
        duplication.ratio, duplication.duplicated_lines, duplication.total_lines
    );
    for c in &duplication.clusters {
        let _ = writeln!(out, "- {} ({} occurrences)", c.primary, c.occurrences);
    }

    let graph = &report.dependency_graph;
    let _ = writeln!(out, "\n## Dependency Graph");
    let _ = writeln!(out, "{} modules, {} links", graph.nodes.len(), graph.links.len());
    let mut degree: BTreeMap<usize, u32> = BTreeMap::new();
    for link in &graph.links {
        *degree.entry(link.source).or_default() += link.weight;
        *degree.entry(link.target).or_default() += link.weight;
    }
    let mut ranked: Vec<(usize, u32)> = degree.into_iter().collect();
    ranked.sort_by(|a, b| b.1.cmp(&a.1).then(a.0.cmp(&b.0)));
    for (id, weight) in ranked.into_iter().take(TOP_CONNECTED) {
        if let Some(node) = graph.nodes.iter().find(|n| n.id == id) {
            let _ = writeln!(out, "- {} ({} import references)", node.path, weight);
        }
    }

    if !report.domain_probes.is_empty() {
        let _ = writeln!(out, "\n## TLS Certificates");
        for p in &report.domain_probes {
            let _ = writeln!(out, "- {}: {}", p.domain, p.detail);
        }
    }

    out
}

fn or_none(joined: &str) -> &str {
    if joined.is_empty() {
        "none"
    } else {
        joined
    }
}
