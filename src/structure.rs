//! Structural evaluation of the top-level directory layout

use crate::error::{AnalysisError, AnalysisResult};
use crate::models::StructuralProfile;
use crate::scanner::is_excluded_segment;
use std::path::Path;
use tracing::{debug, warn};

/// (directory names, pattern label) checked in order
const LAYOUT_RULES: &[(&[&str], &str)] = &[
    (&["app", "src", "api"], "Standard Source Layout"),
    (&["services", "logic", "core"], "Service Layer Pattern"),
    (&["models", "db", "entities"], "Data Modeling Layer"),
    (
        &["domain", "use_cases", "infrastructure"],
        "Clean/Hexagonal Architecture",
    ),
    (
        &["events", "pubsub", "kafka", "rabbitmq"],
        "Event-Driven Architecture",
    ),
];

const MULTI_SERVICE_DIRS: &[&str] = &["services", "apps"];
const MULTI_SERVICE_MIN_DIRS: usize = 9;

pub const MONOLITHIC: &str = "Low (Monolithic)";

#[derive(Debug, Default, Clone, Copy)]
pub struct StructuralEvaluator;

impl StructuralEvaluator {
    pub fn new() -> Self {
        Self
    }

    /// Evaluate the immediate child directories of `root`.
    ///
    /// A listing failure yields the default (empty) profile.
    pub fn evaluate(&self, root: &Path) -> StructuralProfile {
        match top_level_dirs(root) {
            Ok(dirs) => evaluate_dirs(&dirs),
            Err(e) => {
                warn!("Structural evaluation skipped: {}", e);
                StructuralProfile::default()
            }
        }
    }
}

fn top_level_dirs(root: &Path) -> AnalysisResult<Vec<String>> {
    let listing = std::fs::read_dir(root).map_err(|source| AnalysisError::DirectoryList {
        path: root.to_path_buf(),
        source,
    })?;
    let mut dirs = Vec::new();
    for entry in listing {
        let entry = match entry {
            Ok(e) => e,
            Err(e) => {
                debug!("Skipping unreadable directory entry: {}", e);
                continue;
            }
        };
        if !entry.file_type().is_ok_and(|t| t.is_dir()) {
            continue;
        }
        let name = entry.file_name().to_string_lossy().to_string();
        if name.starts_with('.') || is_excluded_segment(&name) {
            continue;
        }
        dirs.push(name);
    }
    dirs.sort();
    Ok(dirs)
}

pub fn evaluate_dirs(dirs: &[String]) -> StructuralProfile {
    let present = |names: &[&str]| dirs.iter().any(|d| names.contains(&d.as_str()));

    let mut patterns_detected: Vec<String> = LAYOUT_RULES
        .iter()
        .filter(|(names, _)| present(names))
        .map(|(_, label)| label.to_string())
        .collect();

    if present(MULTI_SERVICE_DIRS) && dirs.len() >= MULTI_SERVICE_MIN_DIRS {
        patterns_detected.push("Microservices / Multi-Repo Layout".to_string());
    }

    let (modularity_score, concerns_separation) = match dirs.len() {
        n if n > 5 => (80, "High (Modularized)"),
        n if n > 2 => (50, "Moderate"),
        _ => (20, MONOLITHIC),
    };

    StructuralProfile {
        patterns_detected,
        modularity_score,
        concerns_separation: concerns_separation.to_string(),
    }
}
