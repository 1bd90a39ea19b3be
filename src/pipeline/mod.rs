//! Analysis pipeline
//!
//! Orchestrates the full analysis:
//! 1. Scan the source tree once
//! 2. Run the six independent layers (stack, structure, security,
//!    complexity, duplication, dependency graph) concurrently
//! 3. Score the combined result
//! 4. Derive the critique and the remediation roadmap
//!
//! Progress is reported to a [`ProgressObserver`] at each phase boundary
//! and recorded in the report's `logs`.

use std::panic::{catch_unwind, AssertUnwindSafe};
use std::path::Path;
use std::sync::Arc;
use std::time::Instant;
use tracing::{info, warn};

use crate::advisor;
use crate::complexity::ComplexityAnalyzer;
use crate::config::AnalysisConfig;
use crate::duplication::DuplicationDetector;
use crate::error::{AnalysisError, AnalysisResult};
use crate::graph::GraphBuilder;
use crate::models::{AnalysisReport, Severity};
use crate::scanner::SourceTree;
use crate::scoring::{self, ScoreInputs};
use crate::security::{CertificateProbe, SecurityScanner};
use crate::stack::StackDetector;
use crate::structure::StructuralEvaluator;

/// Receives short, human-readable phase messages.
///
/// Calls are synchronous and their outcome is ignored; a panicking
/// observer is logged and the run continues.
pub trait ProgressObserver: Send + Sync {
    fn on_progress(&self, message: &str);
}

impl<F> ProgressObserver for F
where
    F: Fn(&str) + Send + Sync,
{
    fn on_progress(&self, message: &str) {
        self(message)
    }
}

/// Observer that discards every message
pub struct NoProgress;

impl ProgressObserver for NoProgress {
    fn on_progress(&self, _message: &str) {}
}

/// Ordered run log that also forwards each entry to the observer
struct RunLog<'a> {
    observer: &'a dyn ProgressObserver,
    entries: Vec<String>,
}

impl<'a> RunLog<'a> {
    fn new(observer: &'a dyn ProgressObserver) -> Self {
        Self {
            observer,
            entries: Vec::new(),
        }
    }

    fn phase(&mut self, message: impl Into<String>) {
        let message = message.into();
        if catch_unwind(AssertUnwindSafe(|| self.observer.on_progress(&message))).is_err() {
            warn!("Progress observer panicked on '{}'", message);
        }
        self.entries.push(message);
    }

    /// Record without notifying the observer
    fn note(&mut self, message: impl Into<String>) {
        self.entries.push(message.into());
    }
}

/// Full analysis pipeline.
pub struct Pipeline {
    config: AnalysisConfig,
    probe: Option<Arc<dyn CertificateProbe>>,
}

impl Pipeline {
    pub fn new(config: AnalysisConfig) -> Self {
        Self {
            config,
            probe: None,
        }
    }

    /// Replace the live TLS probe, e.g. with a fake in tests.
    pub fn with_probe(mut self, probe: Arc<dyn CertificateProbe>) -> Self {
        self.probe = Some(probe);
        self
    }

    /// Run the full analysis without progress reporting
    pub fn analyze(&self, root: &Path) -> AnalysisResult<AnalysisReport> {
        self.run(root, &NoProgress)
    }

    /// Run the full analysis on `root`.
    ///
    /// Only a missing or unreadable root is an error; every per-file,
    /// per-directory and per-domain failure is absorbed.
    pub fn run(
        &self,
        root: &Path,
        observer: &dyn ProgressObserver,
    ) -> AnalysisResult<AnalysisReport> {
        let started = Instant::now();
        check_root(root)?;
        let mut log = RunLog::new(observer);

        log.phase("Scanning repository tree");
        let tree = SourceTree::scan(root);
        log.note(format!("Scanned {} files", tree.len()));

        log.phase("Running analysis layers");
        let security = match &self.probe {
            Some(probe) => SecurityScanner::with_probe(self.config.secops.clone(), probe.clone()),
            None => SecurityScanner::new(self.config.secops.clone()),
        };
        let complexity = ComplexityAnalyzer::new(&self.config.complexity, &self.config.limits);
        let duplication = DuplicationDetector::new(&self.config.limits);

        let (((stack, structure), (security, graph)), (complexity, duplication)) = rayon::join(
            || {
                rayon::join(
                    || {
                        rayon::join(
                            || StackDetector::new().detect(&tree),
                            || StructuralEvaluator::new().evaluate(root),
                        )
                    },
                    || rayon::join(|| security.scan(&tree), || GraphBuilder::new().build(&tree)),
                )
            },
            || rayon::join(|| complexity.analyze(&tree), || duplication.detect(&tree)),
        );

        log.note(format!(
            "Detected {} technologies; testing {}",
            stack.stack.len(),
            if stack.testing.detected {
                "detected"
            } else {
                "not detected"
            }
        ));
        log.note(format!(
            "Structure: {} patterns, modularity {}",
            structure.patterns_detected.len(),
            structure.modularity_score
        ));
        log.note(format!(
            "Security: {} findings, {} domains probed",
            security.findings.len(),
            security.domain_probes.len()
        ));
        log.note(format!(
            "Complexity: {} functions, average {:.2}",
            complexity.total_functions, complexity.average_complexity
        ));
        log.note(format!("Duplication: {:.2}%", duplication.ratio));
        log.note(format!(
            "Dependency graph: {} nodes, {} links",
            graph.nodes.len(),
            graph.links.len()
        ));

        log.phase("Calculating maturity score");
        let card = scoring::score(&ScoreInputs {
            stack: &stack,
            structure: &structure,
            findings: &security.findings,
            complexity: &complexity,
            duplication: &duplication,
        });

        let mut report = AnalysisReport {
            static_scan: stack,
            structural_evaluation: structure,
            architectural_critique: String::new(),
            overall_score: card.overall_score,
            maturity_label: card.maturity_label,
            score_breakdown: card.breakdown,
            security_findings: security.findings,
            complexity,
            duplication,
            dependency_graph: graph,
            actionable_roadmap: Vec::new(),
            domain_probes: security.domain_probes,
            logs: Vec::new(),
        };

        log.phase("Building recommendations");
        report.architectural_critique = advisor::critique(&report);
        report.actionable_roadmap = advisor::roadmap(&report, &security.compression_missing);

        log.phase(format!(
            "Analysis complete: {}/100 ({})",
            report.overall_score, report.maturity_label
        ));
        report.logs = log.entries;

        info!(
            "Analyzed {} in {:.2?}: score {} ({}), {} critical findings",
            root.display(),
            started.elapsed(),
            report.overall_score,
            report.maturity_label,
            report.count_severity(Severity::Critical)
        );
        Ok(report)
    }
}

fn check_root(root: &Path) -> AnalysisResult<()> {
    match std::fs::metadata(root) {
        Ok(meta) if meta.is_dir() => Ok(()),
        Ok(_) => Err(AnalysisError::Catastrophic(format!(
            "{} is not a directory",
            root.display()
        ))),
        Err(e) => Err(AnalysisError::Catastrophic(format!(
            "{} is not accessible: {}",
            root.display(),
            e
        ))),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use std::sync::Mutex;

    #[test]
    fn test_missing_root_is_catastrophic() {
        let dir = tempfile::tempdir().unwrap();
        let missing = dir.path().join("nope");
        let err = Pipeline::new(AnalysisConfig::offline())
            .analyze(&missing)
            .unwrap_err();
        assert!(err.is_fatal());
    }

    #[test]
    fn test_file_root_is_catastrophic() {
        let dir = tempfile::tempdir().unwrap();
        let file = dir.path().join("a.py");
        fs::write(&file, "x = 1\n").unwrap();
        let err = Pipeline::new(AnalysisConfig::offline())
            .analyze(&file)
            .unwrap_err();
        assert!(matches!(err, AnalysisError::Catastrophic(_)));
    }

    #[test]
    fn test_observer_receives_phases_in_order() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(dir.path().join("main.py"), "def main():\n    return 1\n").unwrap();

        let seen = Mutex::new(Vec::new());
        let observer = |msg: &str| seen.lock().unwrap().push(msg.to_string());
        let report = Pipeline::new(AnalysisConfig::offline())
            .run(dir.path(), &observer)
            .unwrap();

        let seen = seen.into_inner().unwrap();
        assert_eq!(seen[0], "Scanning repository tree");
        assert!(seen.last().unwrap().starts_with("Analysis complete"));
        // Every notification is also logged, in the same order
        let logged: Vec<&String> = report.logs.iter().filter(|l| seen.contains(l)).collect();
        assert_eq!(logged.len(), seen.len());
        assert!(report.logs.iter().any(|l| l == "Scanned 1 files"));
    }

    #[test]
    fn test_panicking_observer_does_not_abort() {
        let dir = tempfile::tempdir().unwrap();
        let observer = |_: &str| panic!("observer failure");
        let report = Pipeline::new(AnalysisConfig::offline())
            .run(dir.path(), &observer)
            .unwrap();
        // An empty tree still earns the monolithic modularity share
        assert_eq!(report.overall_score, 2);
        assert!(report.logs.len() >= 5);
    }
}
