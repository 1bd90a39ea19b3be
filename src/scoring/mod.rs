//! Maturity scoring
//!
//! One deterministic formula turns the layer outputs into a 0-100 score.
//!
//! # Scoring Formula
//!
//! ```text
//! infrastructure  = 15·docker + 15·ci
//! standards_tests = 5·readme + 5·gitignore + 20·tests
//! architecture    = min(30, 10 × patterns) + modularity / 10
//!
//! security    = −(30 × CRITICAL + 15 × HIGH)
//! complexity  = −15 if avg > 15, −5 if avg > 8, else 0
//! duplication = −15 if ratio > 15, −5 if ratio > 5, else 0
//!
//! overall = clamp(sum, 0, 100)
//! ```
//!
//! # Maturity Labels
//!
//! - Basic: ≤ 40
//! - Intermediate: ≤ 65
//! - Production: ≤ 85
//! - Enterprise: > 85

use crate::models::{
    ComplexityReport, DuplicationReport, Finding, MaturityLabel, ScoreBreakdown, Severity,
    StackProfile, StructuralProfile,
};

/// Score, breakdown and label for one analysis run
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ScoreCard {
    pub breakdown: ScoreBreakdown,
    pub overall_score: i32,
    pub maturity_label: MaturityLabel,
}

pub struct ScoreInputs<'a> {
    pub stack: &'a StackProfile,
    pub structure: &'a StructuralProfile,
    pub findings: &'a [Finding],
    pub complexity: &'a ComplexityReport,
    pub duplication: &'a DuplicationReport,
}

pub fn score(inputs: &ScoreInputs<'_>) -> ScoreCard {
    let standards = &inputs.stack.standards;

    let infrastructure = 15 * i32::from(standards.has_docker) + 15 * i32::from(standards.has_ci);
    let standards_tests = 5 * i32::from(standards.has_readme)
        + 5 * i32::from(standards.has_gitignore)
        + 20 * i32::from(inputs.stack.testing.detected);

    let pattern_count = inputs.structure.patterns_detected.len() as i32;
    let modularity = inputs.structure.modularity_score.min(100) as i32;
    let architecture = (10 * pattern_count).min(30) + modularity / 10;

    let count = |severity: Severity| {
        inputs
            .findings
            .iter()
            .filter(|f| f.severity == severity)
            .count() as i32
    };
    let security = -(30 * count(Severity::Critical) + 15 * count(Severity::High));

    let complexity = match inputs.complexity.average_complexity {
        avg if avg > 15.0 => -15,
        avg if avg > 8.0 => -5,
        _ => 0,
    };
    let duplication = match inputs.duplication.ratio {
        ratio if ratio > 15.0 => -15,
        ratio if ratio > 5.0 => -5,
        _ => 0,
    };

    let breakdown = ScoreBreakdown {
        infrastructure,
        standards_tests,
        architecture,
        security,
        complexity,
        duplication,
    };
    let overall_score = breakdown.raw_total().clamp(0, 100);

    ScoreCard {
        breakdown,
        overall_score,
        maturity_label: MaturityLabel::from_score(overall_score),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct Fixture {
        stack: StackProfile,
        structure: StructuralProfile,
        findings: Vec<Finding>,
        complexity: ComplexityReport,
        duplication: DuplicationReport,
    }

    impl Fixture {
        fn new() -> Self {
            Self {
                stack: StackProfile::default(),
                structure: StructuralProfile::default(),
                findings: vec![],
                complexity: ComplexityReport::default(),
                duplication: DuplicationReport::default(),
            }
        }

        fn score(&self) -> ScoreCard {
            score(&ScoreInputs {
                stack: &self.stack,
                structure: &self.structure,
                findings: &self.findings,
                complexity: &self.complexity,
                duplication: &self.duplication,
            })
        }
    }

    fn finding(severity: Severity) -> Finding {
        Finding::new("Secret Leak", severity, "x", "a.py", "x")
    }

    #[test]
    fn test_empty_repository_scores_zero() {
        let card = Fixture::new().score();
        assert_eq!(card.overall_score, 0);
        assert_eq!(card.maturity_label, MaturityLabel::Basic);
        assert_eq!(card.breakdown, ScoreBreakdown::default());
    }

    #[test]
    fn test_full_marks() {
        let mut f = Fixture::new();
        f.stack.standards.has_docker = true;
        f.stack.standards.has_ci = true;
        f.stack.standards.has_readme = true;
        f.stack.standards.has_gitignore = true;
        f.stack.testing.detected = true;
        f.structure.patterns_detected = vec!["a".into(), "b".into(), "c".into(), "d".into()];
        f.structure.modularity_score = 80;

        let card = f.score();
        assert_eq!(card.breakdown.infrastructure, 30);
        assert_eq!(card.breakdown.standards_tests, 30);
        assert_eq!(card.breakdown.architecture, 38);
        assert_eq!(card.overall_score, 98);
        assert_eq!(card.maturity_label, MaturityLabel::Enterprise);
    }

    #[test]
    fn test_penalties() {
        let mut f = Fixture::new();
        f.stack.standards.has_docker = true;
        f.stack.standards.has_ci = true;
        f.stack.testing.detected = true;
        f.structure.modularity_score = 50;
        f.findings = vec![finding(Severity::High), finding(Severity::Medium)];
        f.complexity.average_complexity = 9.5;
        f.duplication.ratio = 5.01;

        let card = f.score();
        assert_eq!(card.breakdown.security, -15);
        assert_eq!(card.breakdown.complexity, -5);
        assert_eq!(card.breakdown.duplication, -5);
        // 30 + 20 + 5 - 25
        assert_eq!(card.overall_score, 30);
    }

    #[test]
    fn test_score_is_clamped_at_zero() {
        let mut f = Fixture::new();
        f.stack.standards.has_readme = true;
        f.findings = vec![finding(Severity::Critical)];
        f.complexity.average_complexity = 15.5;
        f.duplication.ratio = 40.0;

        let card = f.score();
        assert_eq!(card.breakdown.raw_total(), 5 - 30 - 15 - 15);
        assert_eq!(card.overall_score, 0);
        assert_eq!(card.maturity_label, MaturityLabel::Basic);
    }

    #[test]
    fn test_boundaries_are_exclusive() {
        let mut f = Fixture::new();
        f.complexity.average_complexity = 8.0;
        f.duplication.ratio = 5.0;
        let card = f.score();
        assert_eq!(card.breakdown.complexity, 0);
        assert_eq!(card.breakdown.duplication, 0);

        f.complexity.average_complexity = 15.0;
        f.duplication.ratio = 15.0;
        let card = f.score();
        assert_eq!(card.breakdown.complexity, -5);
        assert_eq!(card.breakdown.duplication, -5);
    }
}
