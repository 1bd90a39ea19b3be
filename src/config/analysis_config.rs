//! Analysis configuration
//!
//! Loaded from an explicit `--config` file, or from the user config at
//! `~/.config/archon/config.toml`. Environment variables override both.
//!
//! # Configuration Format
//!
//! ```toml
//! [secops]
//! enabled = true
//! max_domains = 3
//! timeout_secs = 3
//! expiry_warning_days = 30
//!
//! [complexity]
//! max_reported = 20
//!
//! [limits]
//! max_file_bytes = 1048576
//!
//! [digest]
//! max_chars = 28000
//! sample_chars = 1500
//! ```

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;
use tracing::{debug, warn};

/// Hard ceiling on probed domains, whatever the config says
pub const MAX_PROBED_DOMAINS: usize = 3;

#[derive(Debug, Clone, Default, PartialEq, Deserialize, Serialize)]
pub struct AnalysisConfig {
    #[serde(default)]
    pub secops: SecOpsConfig,
    #[serde(default)]
    pub complexity: ComplexityConfig,
    #[serde(default)]
    pub limits: LimitsConfig,
    #[serde(default)]
    pub digest: DigestConfig,
}

#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
#[serde(default)]
pub struct SecOpsConfig {
    /// Perform live TLS probes
    pub enabled: bool,
    pub max_domains: usize,
    pub timeout_secs: u64,
    pub expiry_warning_days: i64,
}

impl Default for SecOpsConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            max_domains: MAX_PROBED_DOMAINS,
            timeout_secs: 3,
            expiry_warning_days: 30,
        }
    }
}

impl SecOpsConfig {
    pub fn domain_limit(&self) -> usize {
        self.max_domains.min(MAX_PROBED_DOMAINS)
    }

    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs.clamp(1, 10))
    }
}

#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
#[serde(default)]
pub struct ComplexityConfig {
    /// Maximum flagged functions kept in the report
    pub max_reported: usize,
}

impl Default for ComplexityConfig {
    fn default() -> Self {
        Self { max_reported: 20 }
    }
}

#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
#[serde(default)]
pub struct LimitsConfig {
    /// Source files larger than this are skipped by complexity and duplication
    pub max_file_bytes: u64,
}

impl Default for LimitsConfig {
    fn default() -> Self {
        Self {
            max_file_bytes: 1024 * 1024,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
#[serde(default)]
pub struct DigestConfig {
    pub max_chars: usize,
    pub sample_chars: usize,
}

impl Default for DigestConfig {
    fn default() -> Self {
        Self {
            max_chars: 28_000,
            sample_chars: 1_500,
        }
    }
}

impl AnalysisConfig {
    /// Load config with priority: env vars > explicit file > user config > defaults
    pub fn load(explicit: Option<&Path>) -> Result<Self> {
        let mut config = match explicit {
            Some(path) => Self::from_file(path)?,
            None => Self::user_config_path()
                .filter(|p| p.exists())
                .and_then(|p| match Self::from_file(&p) {
                    Ok(c) => {
                        debug!("Loaded user config from {}", p.display());
                        Some(c)
                    }
                    Err(e) => {
                        warn!("Ignoring unreadable user config {}: {:#}", p.display(), e);
                        None
                    }
                })
                .unwrap_or_default(),
        };

        config.apply_env();
        Ok(config)
    }

    pub fn from_file(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {}", path.display()))?;
        Self::from_toml(&content)
            .with_context(|| format!("Invalid config file: {}", path.display()))
    }

    pub fn from_toml(content: &str) -> Result<Self> {
        Ok(toml::from_str(content)?)
    }

    fn apply_env(&mut self) {
        if let Ok(v) = std::env::var("ARCHON_NO_NETWORK") {
            if matches!(v.as_str(), "1" | "true" | "yes") {
                self.secops.enabled = false;
            }
        }
        if let Ok(v) = std::env::var("ARCHON_TLS_TIMEOUT_SECS") {
            match v.parse() {
                Ok(secs) => self.secops.timeout_secs = secs,
                Err(_) => warn!("Ignoring invalid ARCHON_TLS_TIMEOUT_SECS={}", v),
            }
        }
    }

    /// Config with every network-bound probe disabled
    pub fn offline() -> Self {
        let mut config = Self::default();
        config.secops.enabled = false;
        config
    }

    pub fn user_config_path() -> Option<PathBuf> {
        dirs::config_dir().map(|p| p.join("archon").join("config.toml"))
    }

    /// Write an example config file, leaving an existing file untouched
    pub fn write_example(path: &Path) -> Result<bool> {
        if path.exists() {
            return Ok(false);
        }
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        std::fs::write(path, EXAMPLE_CONFIG)
            .with_context(|| format!("Failed to write {}", path.display()))?;
        Ok(true)
    }
}

const EXAMPLE_CONFIG: &str = r#"# Archon configuration

[secops]
# Live TLS certificate probes against domains found in config files
enabled = true
# At most 3 domains are ever probed
max_domains = 3
timeout_secs = 3
expiry_warning_days = 30

[complexity]
# Flagged functions kept in the report (discovery order)
max_reported = 20

[limits]
# Larger source files are skipped by complexity and duplication analysis
max_file_bytes = 1048576

[digest]
max_chars = 28000
sample_chars = 1500
"#;
