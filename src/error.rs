//! Error taxonomy for the analysis pipeline
//!
//! Only [`AnalysisError::Catastrophic`] ever escapes [`crate::pipeline::Pipeline::run`].
//! The other variants are produced by per-file, per-directory and per-domain
//! operations and are absorbed (logged and skipped) at their origin.

use std::path::PathBuf;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum AnalysisError {
    #[error("Cannot read {path}: {source}")]
    FileAccess {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Cannot parse {path}: {reason}")]
    Parse { path: PathBuf, reason: String },

    #[error("Network probe for {domain} failed: {reason}")]
    Network { domain: String, reason: String },

    #[error("Cannot list directory {path}: {source}")]
    DirectoryList {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Analysis failed: {0}")]
    Catastrophic(String),
}

impl AnalysisError {
    pub fn file_access(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        AnalysisError::FileAccess {
            path: path.into(),
            source,
        }
    }

    pub fn parse(path: impl Into<PathBuf>, reason: impl Into<String>) -> Self {
        AnalysisError::Parse {
            path: path.into(),
            reason: reason.into(),
        }
    }

    pub fn network(domain: impl Into<String>, reason: impl ToString) -> Self {
        AnalysisError::Network {
            domain: domain.into(),
            reason: reason.to_string(),
        }
    }

    /// Whether this error must abort the whole run
    pub fn is_fatal(&self) -> bool {
        matches!(self, AnalysisError::Catastrophic(_))
    }
}

pub type AnalysisResult<T> = Result<T, AnalysisError>;
