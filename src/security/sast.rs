//! Static application security testing over source files

use super::{compile, Pattern};
use crate::models::{Finding, Severity};
use crate::scanner::SourceFile;
use std::sync::OnceLock;

pub const FINDING_TYPE: &str = "Vulnerability (SAST)";

static SAST_PATTERNS: OnceLock<Vec<Pattern>> = OnceLock::new();

fn patterns() -> &'static [Pattern] {
    SAST_PATTERNS.get_or_init(|| {
        compile(&[
            ("Insecure eval()", r"\beval\s*\("),
            ("Insecure exec()", r"\bexec\s*\("),
            ("Dynamic Function Constructor", r"\bnew\s+Function\s*\("),
            ("Shell Injection", r"shell\s*=\s*True"),
            (
                "Potential SQL Injection",
                r#"(?i)(select\s.+\sfrom\s.+\swhere\s.*(%s?|\.format\(|\$\{|"\s*\+))|((\.execute|\.run|\.query)\(\s*(f["']|.*(%\s*[(\w]|\.format\(|\$\{)))"#,
            ),
        ])
    })
}

pub fn applies_to(file: &SourceFile) -> bool {
    file.is_source()
}

pub fn scan_content(file: &str, content: &str) -> Vec<Finding> {
    patterns()
        .iter()
        .filter(|p| p.regex.is_match(content))
        .map(|p| {
            Finding::new(
                FINDING_TYPE,
                Severity::High,
                p.label,
                file,
                format!(
                    "Dangerous usage of {} detected. Susceptible to injection attacks.",
                    p.label
                ),
            )
        })
        .collect()
}
