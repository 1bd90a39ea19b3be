//! Hardcoded secret detection (CWE-798)
//!
//! Each pattern yields at most one finding per file, however many times it
//! matches.

use super::{compile, Pattern};
use crate::models::{Finding, Severity};
use crate::scanner::SourceFile;
use crate::stack::Manifest;
use std::sync::OnceLock;

pub const FINDING_TYPE: &str = "Secret Leak";

static SECRET_PATTERNS: OnceLock<Vec<Pattern>> = OnceLock::new();

fn patterns() -> &'static [Pattern] {
    SECRET_PATTERNS.get_or_init(|| {
        compile(&[
            ("AWS Access Key", r"AKIA[0-9A-Z]{16}"),
            ("GitHub Token", r"gh[pousr]_[A-Za-z0-9]{36}"),
            ("Slack Token", r"xox[baprs]-[0-9A-Za-z-]{10,}"),
            ("Stripe API Key", r"sk_live_[0-9a-zA-Z]{24,}"),
            ("Google API Key", r"AIza[0-9A-Za-z_-]{35}"),
            ("Private Key", r"-----BEGIN [A-Z ]*PRIVATE KEY-----"),
            (
                "Database URL",
                r#"(?i)\b(postgres(ql)?|mysql|mongodb(\+srv)?|redis|amqp)://[^\s:/@'"]+:[^\s@/'"]+@"#,
            ),
        ])
    })
}

/// Source, config and env files plus dependency manifests
pub fn applies_to(file: &SourceFile) -> bool {
    file.is_source() || file.is_config() || Manifest::from_file_name(&file.name).is_some()
}

pub fn scan_content(file: &str, content: &str) -> Vec<Finding> {
    patterns()
        .iter()
        .filter(|p| p.regex.is_match(content))
        .map(|p| {
            Finding::new(
                FINDING_TYPE,
                Severity::Critical,
                p.label,
                file,
                format!("Potential {} detected in plain text.", p.label),
            )
        })
        .collect()
}
