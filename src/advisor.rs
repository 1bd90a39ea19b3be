//! Architectural critique and the actionable roadmap
//!
//! Both are pure functions of a scored report: no new analysis happens here.

use crate::complexity::HIGH_THRESHOLD;
use crate::models::{AnalysisReport, ProbeStatus, RoadmapItem, Severity};
use crate::security::{dependencies, infra, sast};
use crate::structure::MONOLITHIC;

pub const COMMENDATION: &str = "The architecture follows industry best practices. It is modular, containerized, and includes testing infrastructure.";

/// Heuristic senior-architect feedback on the scored report
pub fn critique(report: &AnalysisReport) -> String {
    let standards = &report.static_scan.standards;
    let mut sentences = Vec::new();

    if !standards.has_docker {
        sentences.push(
            "Missing containerization. Adding a Dockerfile would improve deployment consistency.",
        );
    }
    if !report.static_scan.testing.detected {
        sentences.push(
            "No automated tests detected. This is a significant risk for production readiness.",
        );
    }
    if report.structural_evaluation.concerns_separation == MONOLITHIC {
        sentences.push("Project structure appears monolithic. Consider extracting business logic into a dedicated service layer.");
    }
    if !standards.has_ci {
        sentences.push("CI/CD workflows are missing. Automating builds and tests is recommended.");
    }

    if sentences.is_empty() {
        COMMENDATION.to_string()
    } else {
        sentences.join(" ")
    }
}

fn item(title: &str, description: String, action: &str, guide: &str) -> RoadmapItem {
    RoadmapItem {
        title: title.to_string(),
        description,
        action: action.to_string(),
        guide: guide.to_string(),
    }
}

/// Ordered remediation steps; secret rotation always comes first.
///
/// `compression_missing` lists proxy configs without response compression.
pub fn roadmap(report: &AnalysisReport, compression_missing: &[String]) -> Vec<RoadmapItem> {
    let standards = &report.static_scan.standards;
    let findings = &report.security_findings;
    let mut items = Vec::new();

    let critical = report.count_severity(Severity::Critical);
    if critical > 0 {
        items.push(item(
            "CRITICAL: Secret Rotation",
            format!(
                "Found {} potential hardcoded credentials. These are exposed in Git history.",
                critical
            ),
            "Immediately revoke and rotate the affected keys.",
            "Rotate leaked credentials and move them to environment variables or a secrets manager (Vault, AWS Secrets Manager).",
        ));
    }

    if !report.static_scan.testing.detected {
        items.push(item(
            "Automated Quality Assurance",
            "Zero tests detected. This prevents 'Production' maturity grading.".to_string(),
            "Implement a core testing suite to cover business logic.",
            "Start with integration tests for the most critical request paths, e.g. `tests/test_core.py` with `pytest`.",
        ));
    }

    if !standards.has_docker {
        items.push(item(
            "Deployment Consistency",
            "Environment varies between machines. Scaling will be difficult.".to_string(),
            "Containerize the application so every environment runs the same image.",
            "Create a `Dockerfile` using `python:3.12-slim` or `node:20-alpine` as a base.",
        ));
    }

    if !standards.has_ci {
        items.push(item(
            "Continuous Integration",
            "No CI/CD workflow found. Builds and tests depend on manual discipline.".to_string(),
            "Run the build and test suite on every push.",
            "Add `.github/workflows/ci.yml` that installs dependencies and runs the tests.",
        ));
    }

    if findings.iter().any(|f| f.kind == sast::FINDING_TYPE) {
        items.push(item(
            "Code Injection Hardening",
            "SAST scan identified dangerous coding patterns (eval/exec/SQLi).".to_string(),
            "Refactor dynamic code execution to use parameterized inputs or secure alternatives.",
            "Replace `eval()` with safe parsing and use parameterized queries for SQL statements.",
        ));
    }

    if findings.iter().any(|f| f.kind == dependencies::FINDING_TYPE) {
        items.push(item(
            "Standardize Dependencies",
            "One or more packages in your manifest have known vulnerabilities.".to_string(),
            "Audit and upgrade core dependencies to stable, patched versions.",
            "Run `pip install --upgrade <package>` or `npm update`, then pin the patched versions.",
        ));
    }

    let mut infra_labels: Vec<&str> = findings
        .iter()
        .filter(|f| f.kind == infra::FINDING_TYPE)
        .map(|f| f.label.as_str())
        .collect();
    if !infra_labels.is_empty() {
        infra_labels.sort_unstable();
        infra_labels.dedup();
        items.push(item(
            "Edge Security Hardening",
            format!("Reverse proxy configuration issues: {}.", infra_labels.join(", ")),
            "Add HSTS and CSP headers and restrict TLS to modern protocol versions.",
            "In nginx: `add_header Strict-Transport-Security \"max-age=63072000\" always;`, `add_header Content-Security-Policy \"default-src 'self'\";` and `ssl_protocols TLSv1.2 TLSv1.3;`.",
        ));
    }

    if !compression_missing.is_empty() {
        items.push(item(
            "Enable Response Compression",
            format!(
                "No `gzip on` directive in {}.",
                compression_missing.join(", ")
            ),
            "Compress text responses at the proxy to cut bandwidth and latency.",
            "Add `gzip on;` with `gzip_types text/css application/javascript application/json;`.",
        ));
    }

    let expiring: Vec<&str> = report
        .domain_probes
        .iter()
        .filter(|p| p.status == ProbeStatus::Expiring)
        .map(|p| p.domain.as_str())
        .collect();
    if !expiring.is_empty() {
        items.push(item(
            "Certificate Renewal",
            format!("TLS certificates expire soon for: {}.", expiring.join(", ")),
            "Renew the certificates and automate renewal.",
            "Use an ACME client (certbot, cert-manager) to renew automatically.",
        ));
    }

    let hotspots = report
        .complexity
        .functions
        .iter()
        .filter(|f| f.complexity > HIGH_THRESHOLD)
        .count();
    if hotspots > 0 || report.score_breakdown.complexity < 0 {
        items.push(item(
            "Complexity Reduction",
            format!(
                "Average cyclomatic complexity is {:.2} with {} high-complexity functions.",
                report.complexity.average_complexity, hotspots
            ),
            "Split the most branched functions into smaller, single-purpose units.",
            "Extract guard clauses and lookup tables; start with the functions listed under complexity hotspots.",
        ));
    }

    if report.score_breakdown.duplication < 0 {
        items.push(item(
            "Duplication Cleanup",
            format!(
                "{:.2}% of scanned lines are duplicated.",
                report.duplication.ratio
            ),
            "Consolidate repeated blocks into shared helpers.",
            "Start with the largest duplicate clusters and move the shared code into a common module.",
        ));
    }

    if report.structural_evaluation.concerns_separation == MONOLITHIC {
        items.push(item(
            "Modular Transformation",
            "Your code is currently monolithic. This leads to high maintenance costs.".to_string(),
            "Refactor into a Domain-Driven Design (DDD) layout.",
            "Extract business logic into a `/services` layer and keep `/api` for routing only.",
        ));
    }

    items
}
