//! Configuration module for Archon
//!
//! This module handles:
//! - Analysis tunables (SecOps probing, report caps, file size limits)
//! - Digest sizing for the narrative engine
//! - Environment overrides

mod analysis_config;

pub use analysis_config::{
    AnalysisConfig, ComplexityConfig, DigestConfig, LimitsConfig, SecOpsConfig,
    MAX_PROBED_DOMAINS,
};
