//! Output reporters for analysis results
//!
//! Supports multiple output formats:
//! - `text` - Terminal summary with colors
//! - `json` - The full report as machine-readable JSON
//! - `digest` - Bounded plain-text context for a narrative engine

pub mod digest;
mod json;
mod text;

use crate::config::DigestConfig;
use crate::models::AnalysisReport;
use crate::scanner::SourceTree;
use anyhow::{anyhow, Result};
use std::str::FromStr;

/// Supported output formats
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum OutputFormat {
    #[default]
    Text,
    Json,
    Digest,
}

impl FromStr for OutputFormat {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "text" | "txt" | "terminal" => Ok(OutputFormat::Text),
            "json" => Ok(OutputFormat::Json),
            "digest" | "llm" => Ok(OutputFormat::Digest),
            _ => Err(anyhow!(
                "Unknown format '{}'. Valid formats: text, json, digest",
                s
            )),
        }
    }
}

impl std::fmt::Display for OutputFormat {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            OutputFormat::Text => write!(f, "text"),
            OutputFormat::Json => write!(f, "json"),
            OutputFormat::Digest => write!(f, "digest"),
        }
    }
}

/// Render a report in a format that needs nothing but the report itself
pub fn report(report: &AnalysisReport, format: &str) -> Result<String> {
    let fmt = OutputFormat::from_str(format)?;
    match fmt {
        OutputFormat::Digest => Err(anyhow!(
            "The digest format needs the analyzed tree; use report_with_format"
        )),
        _ => report_with_format(report, fmt, None, &DigestConfig::default()),
    }
}

/// Render a report using an OutputFormat enum
///
/// `tree` supplies file samples for the digest; without it the digest
/// carries only the report summary.
pub fn report_with_format(
    report: &AnalysisReport,
    format: OutputFormat,
    tree: Option<&SourceTree>,
    digest: &DigestConfig,
) -> Result<String> {
    match format {
        OutputFormat::Text => text::render(report),
        OutputFormat::Json => json::render(report),
        OutputFormat::Digest => Ok(digest::build(report, tree, digest)),
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use crate::models::*;

    /// A small, fully populated report for rendering tests
    pub(crate) fn test_report() -> AnalysisReport {
        let mut static_scan = StackProfile::default();
        static_scan.stack = vec!["FastAPI".into(), "Python".into()];
        if let Some(set) = static_scan.categories.get_mut(&StackCategory::Languages) {
            set.insert("Python".into());
        }
        if let Some(set) = static_scan.categories.get_mut(&StackCategory::Backend) {
            set.insert("FastAPI".into());
        }
        static_scan.standards.has_readme = true;
        static_scan.standards.has_docker = true;

        AnalysisReport {
            static_scan,
            structural_evaluation: StructuralProfile {
                patterns_detected: vec!["API Layer".into()],
                modularity_score: 50,
                concerns_separation: "Moderate".into(),
            },
            architectural_critique: "No automated tests detected.".into(),
            overall_score: 42,
            maturity_label: MaturityLabel::Intermediate,
            score_breakdown: ScoreBreakdown {
                infrastructure: 15,
                standards_tests: 5,
                architecture: 15,
                security: -15,
                complexity: -5,
                duplication: 0,
            },
            security_findings: vec![Finding::new(
                "Vulnerability (SAST)",
                Severity::High,
                "Insecure eval()",
                "app/main.py",
                "Use of eval() detected.",
            )],
            complexity: ComplexityReport {
                functions: vec![FlaggedFunction {
                    file: "app/main.py".into(),
                    function: "dispatch".into(),
                    complexity: 23,
                    severity: Severity::High,
                }],
                average_complexity: 9.5,
                total_functions: 4,
            },
            duplication: DuplicationReport {
                ratio: 3.5,
                duplicated_lines: 6,
                total_lines: 171,
                clusters: vec![DuplicateCluster {
                    primary: CodeLocation {
                        file: "app/a.py".into(),
                        line: 3,
                    },
                    occurrences: 2,
                    clones: vec![CodeLocation {
                        file: "app/b.py".into(),
                        line: 10,
                    }],
                }],
            },
            dependency_graph: DependencyGraph {
                nodes: vec![
                    GraphNode {
                        id: 0,
                        name: "main.py".into(),
                        path: "app/main.py".into(),
                        kind: "module".into(),
                    },
                    GraphNode {
                        id: 1,
                        name: "models.py".into(),
                        path: "app/models.py".into(),
                        kind: "module".into(),
                    },
                ],
                links: vec![GraphLink {
                    source: 0,
                    target: 1,
                    weight: 2,
                }],
            },
            actionable_roadmap: vec![RoadmapItem {
                title: "Automated Quality Assurance".into(),
                description: "Zero tests detected.".into(),
                action: "Implement a core testing suite.".into(),
                guide: "Start with pytest.".into(),
            }],
            domain_probes: vec![DomainProbe {
                domain: "api.acme.io".into(),
                status: ProbeStatus::Expiring,
                days_remaining: Some(12),
                detail: "Certificate expires in 12 days".into(),
            }],
            logs: vec!["Scanned 5 files".into()],
        }
    }

    #[test]
    fn test_format_parsing() {
        assert_eq!("JSON".parse::<OutputFormat>().unwrap(), OutputFormat::Json);
        assert_eq!("terminal".parse::<OutputFormat>().unwrap(), OutputFormat::Text);
        assert_eq!("digest".parse::<OutputFormat>().unwrap(), OutputFormat::Digest);
        assert!("sarif".parse::<OutputFormat>().is_err());
        assert_eq!(OutputFormat::Json.to_string(), "json");
    }

    #[test]
    fn test_report_by_name() {
        let report = test_report();
        assert!(super::report(&report, "json").unwrap().starts_with('{'));
        assert!(super::report(&report, "digest").is_err());
    }
}
