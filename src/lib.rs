//! Archon - repository maturity analysis
//!
//! Inspects a materialized source tree and produces an [`AnalysisReport`]:
//! detected stack, architectural layout, security findings, cyclomatic
//! complexity, duplicated code, a file dependency graph and a weighted
//! maturity score with a remediation roadmap.
//!
//! ```no_run
//! use archon::{AnalysisConfig, Pipeline};
//! use std::path::Path;
//!
//! let report = Pipeline::new(AnalysisConfig::offline()).analyze(Path::new("."))?;
//! println!("{} ({})", report.overall_score, report.maturity_label);
//! # Ok::<(), archon::AnalysisError>(())
//! ```

pub mod advisor;
pub mod complexity;
pub mod config;
pub mod duplication;
pub mod error;
pub mod graph;
pub mod models;
pub mod parsers;
pub mod pipeline;
pub mod reporters;
pub mod scanner;
pub mod scoring;
pub mod security;
pub mod stack;
pub mod structure;

pub use config::AnalysisConfig;
pub use error::{AnalysisError, AnalysisResult};
pub use models::AnalysisReport;
pub use pipeline::{NoProgress, Pipeline, ProgressObserver};
