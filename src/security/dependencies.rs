//! Known-vulnerable dependency version signatures
//!
//! Signatures are plain regexes over manifest text, so they only ever run
//! against files the stack detector recognizes as manifests.

use super::{compile, Pattern};
use crate::models::{Finding, Severity};
use crate::scanner::SourceFile;
use crate::stack::Manifest;
use std::sync::OnceLock;

pub const FINDING_TYPE: &str = "Vulnerable Dependency";

static VULNERABLE_SIGNATURES: OnceLock<Vec<Pattern>> = OnceLock::new();

fn signatures() -> &'static [Pattern] {
    VULNERABLE_SIGNATURES.get_or_init(|| {
        compile(&[
            // Python
            ("requests", r"(?i)\brequests[<>=! ]*2\.(2[0-7]|1[0-9]|[0-9])\."),
            ("flask", r"(?i)\bflask[<>=! ]*(0\.|1\.0)"),
            ("django", r"(?i)\bdjango[<>=! ]*(1\.|2\.[01]\.)"),
            ("urllib3", r"(?i)\burllib3[<>=! ]*1\.(1[0-9]|2[0-5])\."),
            ("pyyaml", r"(?i)\bpyyaml[<>=! ]*[0-4]\."),
            // npm
            ("express", r#""express":\s*"[\^~]?[0-3]\."#),
            ("lodash", r#""lodash":\s*"[\^~]?[0-3]\."#),
            ("axios", r#""axios":\s*"[\^~]?0\.([0-9]|1[0-9]|20)\."#),
            ("minimist", r#""minimist":\s*"[\^~]?(0\.|1\.[01]\.)"#),
            ("jquery", r#""jquery":\s*"[\^~]?[12]\."#),
        ])
    })
}

pub fn applies_to(file: &SourceFile) -> bool {
    Manifest::from_file_name(&file.name).is_some()
}

pub fn scan_content(file: &str, content: &str) -> Vec<Finding> {
    signatures()
        .iter()
        .filter(|s| s.regex.is_match(content))
        .map(|s| {
            Finding::new(
                FINDING_TYPE,
                Severity::High,
                format!("Insecure {} version", s.label),
                file,
                format!(
                    "The version of {} detected has known security flaws (CVEs).",
                    s.label
                ),
            )
        })
        .collect()
}
