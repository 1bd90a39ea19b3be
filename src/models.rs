//! Core data models for Archon
//!
//! These models are shared by every analysis layer and make up the
//! final [`AnalysisReport`]. Every container is always present in the
//! serialized report; missing data becomes an empty value, never `null`.

use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};
use std::fmt;

/// Severity levels for findings
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, Default,
)]
#[serde(rename_all = "UPPERCASE")]
pub enum Severity {
    #[default]
    Low,
    Medium,
    High,
    Critical,
}

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Severity::Low => write!(f, "LOW"),
            Severity::Medium => write!(f, "MEDIUM"),
            Severity::High => write!(f, "HIGH"),
            Severity::Critical => write!(f, "CRITICAL"),
        }
    }
}

/// A single security or infrastructure observation
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Finding {
    #[serde(rename = "type")]
    pub kind: String,
    pub severity: Severity,
    pub label: String,
    /// Path relative to the analyzed root, `/`-separated
    pub file: String,
    pub description: String,
}

impl Finding {
    pub fn new(
        kind: impl Into<String>,
        severity: Severity,
        label: impl Into<String>,
        file: impl Into<String>,
        description: impl Into<String>,
    ) -> Self {
        Self {
            kind: kind.into(),
            severity,
            label: label.into(),
            file: file.into(),
            description: description.into(),
        }
    }
}

/// Fixed technology groupings used to bucket detected tools
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum StackCategory {
    Languages,
    Backend,
    Frontend,
    Database,
    Infrastructure,
    Testing,
    #[serde(rename = "AI/ML")]
    AiMl,
    Tools,
}

impl StackCategory {
    pub const ALL: [StackCategory; 8] = [
        StackCategory::Languages,
        StackCategory::Backend,
        StackCategory::Frontend,
        StackCategory::Database,
        StackCategory::Infrastructure,
        StackCategory::Testing,
        StackCategory::AiMl,
        StackCategory::Tools,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            StackCategory::Languages => "Languages",
            StackCategory::Backend => "Backend",
            StackCategory::Frontend => "Frontend",
            StackCategory::Database => "Database",
            StackCategory::Infrastructure => "Infrastructure",
            StackCategory::Testing => "Testing",
            StackCategory::AiMl => "AI/ML",
            StackCategory::Tools => "Tools",
        }
    }
}

/// Repository hygiene flags, OR-ed across the whole tree
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Standards {
    pub has_readme: bool,
    pub has_gitignore: bool,
    pub has_docker: bool,
    pub has_ci: bool,
    pub has_terraform: bool,
    pub has_kubernetes: bool,
    pub has_openapi: bool,
    pub has_linting: bool,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TestingSummary {
    pub detected: bool,
    pub frameworks: BTreeSet<String>,
}

/// Output of the stack detector (`static_scan` in the report)
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StackProfile {
    /// Flat, sorted union of every category set
    pub stack: Vec<String>,
    pub categories: BTreeMap<StackCategory, BTreeSet<String>>,
    pub standards: Standards,
    pub testing: TestingSummary,
}

impl Default for StackProfile {
    fn default() -> Self {
        Self {
            stack: Vec::new(),
            categories: StackCategory::ALL
                .iter()
                .map(|c| (*c, BTreeSet::new()))
                .collect(),
            standards: Standards::default(),
            testing: TestingSummary::default(),
        }
    }
}

impl StackProfile {
    /// Technologies detected for one category
    pub fn category(&self, category: StackCategory) -> impl Iterator<Item = &str> {
        self.categories
            .get(&category)
            .into_iter()
            .flat_map(|set| set.iter().map(String::as_str))
    }
}

/// Output of the structural evaluator
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StructuralProfile {
    pub patterns_detected: Vec<String>,
    pub modularity_score: u32,
    pub concerns_separation: String,
}

impl Default for StructuralProfile {
    fn default() -> Self {
        Self {
            patterns_detected: Vec::new(),
            modularity_score: 0,
            concerns_separation: "Unknown".to_string(),
        }
    }
}

/// A function whose cyclomatic complexity crossed a reporting threshold
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FlaggedFunction {
    pub file: String,
    pub function: String,
    pub complexity: u32,
    pub severity: Severity,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ComplexityReport {
    pub functions: Vec<FlaggedFunction>,
    /// Average over every function scanned, not only the flagged ones
    pub average_complexity: f64,
    pub total_functions: usize,
}

/// `file:line` position of a duplicated window
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CodeLocation {
    pub file: String,
    pub line: usize,
}

impl fmt::Display for CodeLocation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.file, self.line)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DuplicateCluster {
    pub primary: CodeLocation,
    pub occurrences: usize,
    pub clones: Vec<CodeLocation>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct DuplicationReport {
    pub ratio: f64,
    pub duplicated_lines: usize,
    pub total_lines: usize,
    pub clusters: Vec<DuplicateCluster>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GraphNode {
    pub id: usize,
    pub name: String,
    pub path: String,
    #[serde(rename = "type")]
    pub kind: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GraphLink {
    pub source: usize,
    pub target: usize,
    pub weight: u32,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DependencyGraph {
    pub nodes: Vec<GraphNode>,
    pub links: Vec<GraphLink>,
}

/// Signed score contributions; penalties are stored as negative values
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScoreBreakdown {
    pub infrastructure: i32,
    pub standards_tests: i32,
    pub architecture: i32,
    pub security: i32,
    pub complexity: i32,
    pub duplication: i32,
}

impl ScoreBreakdown {
    /// Unclamped sum of every stored term
    pub fn raw_total(&self) -> i32 {
        self.infrastructure
            + self.standards_tests
            + self.architecture
            + self.security
            + self.complexity
            + self.duplication
    }
}

/// Qualitative bucket derived from the numeric score
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum MaturityLabel {
    Basic,
    Intermediate,
    Production,
    Enterprise,
}

impl MaturityLabel {
    pub fn from_score(score: i32) -> Self {
        match score {
            s if s <= 40 => MaturityLabel::Basic,
            s if s <= 65 => MaturityLabel::Intermediate,
            s if s <= 85 => MaturityLabel::Production,
            _ => MaturityLabel::Enterprise,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            MaturityLabel::Basic => "Basic",
            MaturityLabel::Intermediate => "Intermediate",
            MaturityLabel::Production => "Production",
            MaturityLabel::Enterprise => "Enterprise",
        }
    }
}

impl fmt::Display for MaturityLabel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One remediation step in the actionable roadmap
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RoadmapItem {
    pub title: String,
    pub description: String,
    pub action: String,
    pub guide: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ProbeStatus {
    Valid,
    Expiring,
    Unreachable,
}

/// Result of a live certificate probe against one domain
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DomainProbe {
    pub domain: String,
    pub status: ProbeStatus,
    pub days_remaining: Option<i64>,
    pub detail: String,
}

/// The complete, immutable result of one analysis run
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AnalysisReport {
    pub static_scan: StackProfile,
    pub structural_evaluation: StructuralProfile,
    pub architectural_critique: String,
    pub overall_score: i32,
    pub maturity_label: MaturityLabel,
    pub score_breakdown: ScoreBreakdown,
    pub security_findings: Vec<Finding>,
    pub complexity: ComplexityReport,
    pub duplication: DuplicationReport,
    pub dependency_graph: DependencyGraph,
    pub actionable_roadmap: Vec<RoadmapItem>,
    pub domain_probes: Vec<DomainProbe>,
    pub logs: Vec<String>,
}

impl AnalysisReport {
    pub fn count_severity(&self, severity: Severity) -> usize {
        self.security_findings
            .iter()
            .filter(|f| f.severity == severity)
            .count()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_maturity_thresholds() {
        assert_eq!(MaturityLabel::from_score(0), MaturityLabel::Basic);
        assert_eq!(MaturityLabel::from_score(40), MaturityLabel::Basic);
        assert_eq!(MaturityLabel::from_score(41), MaturityLabel::Intermediate);
        assert_eq!(MaturityLabel::from_score(65), MaturityLabel::Intermediate);
        assert_eq!(MaturityLabel::from_score(66), MaturityLabel::Production);
        assert_eq!(MaturityLabel::from_score(85), MaturityLabel::Production);
        assert_eq!(MaturityLabel::from_score(86), MaturityLabel::Enterprise);
        assert_eq!(MaturityLabel::from_score(100), MaturityLabel::Enterprise);
    }

    #[test]
    fn test_severity_serializes_uppercase() {
        let json = serde_json::to_string(&Severity::Critical).unwrap();
        assert_eq!(json, "\"CRITICAL\"");
        assert!(Severity::Critical > Severity::High);
        assert!(Severity::Medium > Severity::Low);
    }

    #[test]
    fn test_default_stack_profile_has_every_category() {
        let profile = StackProfile::default();
        assert_eq!(profile.categories.len(), StackCategory::ALL.len());

        let json = serde_json::to_value(&profile).unwrap();
        assert!(json["categories"].get("AI/ML").is_some());
        assert!(json["categories"].get("Languages").is_some());
    }

    #[test]
    fn test_finding_type_field_name() {
        let finding = Finding::new("Secret Leak", Severity::Critical, "AWS Access Key", "a.py", "x");
        let json = serde_json::to_value(&finding).unwrap();
        assert_eq!(json["type"], "Secret Leak");
        assert_eq!(json["severity"], "CRITICAL");
    }

    #[test]
    fn test_default_structural_profile_is_unknown() {
        let profile = StructuralProfile::default();
        assert!(profile.patterns_detected.is_empty());
        assert_eq!(profile.concerns_separation, "Unknown");
    }
}
