//! Complexity analysis across every parseable source file

use crate::config::{ComplexityConfig, LimitsConfig};
use crate::models::{ComplexityReport, FlaggedFunction, Severity};
use crate::parsers::{function_complexities, FunctionComplexity, Grammar};
use crate::scanner::{SourceFile, SourceTree};
use rayon::prelude::*;
use tracing::{debug, info};

pub const HIGH_THRESHOLD: u32 = 20;
pub const MEDIUM_THRESHOLD: u32 = 10;

pub fn severity_for(complexity: u32) -> Option<Severity> {
    if complexity > HIGH_THRESHOLD {
        Some(Severity::High)
    } else if complexity > MEDIUM_THRESHOLD {
        Some(Severity::Medium)
    } else {
        None
    }
}

pub fn round2(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}

pub struct ComplexityAnalyzer {
    max_reported: usize,
    max_file_bytes: u64,
}

impl ComplexityAnalyzer {
    pub fn new(complexity: &ComplexityConfig, limits: &LimitsConfig) -> Self {
        Self {
            max_reported: complexity.max_reported,
            max_file_bytes: limits.max_file_bytes,
        }
    }

    pub fn analyze(&self, tree: &SourceTree) -> ComplexityReport {
        let files: Vec<(&SourceFile, Grammar)> = tree
            .source_files()
            .filter_map(|f| Grammar::for_extension(f.ext()).map(|g| (f, g)))
            .collect();

        let per_file: Vec<(&SourceFile, Vec<FunctionComplexity>)> = files
            .par_iter()
            .filter_map(|(file, grammar)| self.analyze_file(file, *grammar).map(|f| (*file, f)))
            .collect();

        let mut report = ComplexityReport::default();
        let mut total: u64 = 0;

        for (file, functions) in per_file {
            for func in functions {
                total += u64::from(func.complexity);
                report.total_functions += 1;
                if let Some(severity) = severity_for(func.complexity) {
                    report.functions.push(FlaggedFunction {
                        file: file.relative.clone(),
                        function: func.name,
                        complexity: func.complexity,
                        severity,
                    });
                }
            }
        }

        if report.total_functions > 0 {
            report.average_complexity = round2(total as f64 / report.total_functions as f64);
        }
        report.functions.truncate(self.max_reported);

        info!(
            "Complexity: {} functions, average {:.2}, {} flagged",
            report.total_functions,
            report.average_complexity,
            report.functions.len()
        );
        report
    }

    fn analyze_file(&self, file: &SourceFile, grammar: Grammar) -> Option<Vec<FunctionComplexity>> {
        if file.size > self.max_file_bytes {
            debug!("Skipping oversized file for complexity: {}", file.relative);
            return None;
        }
        let source = match file.read_text() {
            Ok(s) => s,
            Err(e) => {
                debug!("{}", e);
                return None;
            }
        };
        match function_complexities(&source, grammar, &file.path) {
            Ok(functions) => Some(functions),
            Err(e) => {
                debug!("{}", e);
                None
            }
        }
    }
}
