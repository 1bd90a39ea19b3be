//! Security scanning
//!
//! Five independent sub-scans append to one finding list, always in this
//! order: secrets, SAST, vulnerable dependencies, infra config, SecOps.
//! Each file is read once (bounded prefix) and shared by the sub-scans that
//! apply to it; an unreadable file is skipped.

pub mod dependencies;
pub mod infra;
pub mod sast;
pub mod secops;
pub mod secrets;

pub use secops::{CertificateProbe, SecOpsScanner, TlsProbe};

use crate::config::SecOpsConfig;
use crate::models::{DomainProbe, Finding};
use crate::scanner::{SourceFile, SourceTree};
use rayon::prelude::*;
use regex::Regex;
use std::sync::Arc;
use tracing::{debug, info, warn};

/// Bytes of each file inspected by the regex sub-scans
pub const SCAN_PREFIX_BYTES: usize = 5000;
/// Proxy configs are read further; headers often sit below the server block
pub const INFRA_PREFIX_BYTES: usize = 64 * 1024;

/// A labeled, compiled regex
pub struct Pattern {
    pub label: &'static str,
    pub regex: Regex,
}

/// Compile a static pattern table, dropping (and logging) any invalid entry
pub(crate) fn compile(table: &[(&'static str, &str)]) -> Vec<Pattern> {
    table
        .iter()
        .filter_map(|&(label, pattern)| match Regex::new(pattern) {
            Ok(regex) => Some(Pattern { label, regex }),
            Err(e) => {
                warn!("Invalid pattern for {}: {}", label, e);
                None
            }
        })
        .collect()
}

#[derive(Debug, Default)]
pub struct SecurityReport {
    pub findings: Vec<Finding>,
    pub domain_probes: Vec<DomainProbe>,
    /// Proxy configs without `gzip on`
    pub compression_missing: Vec<String>,
}

/// Results of every content sub-scan for one file
#[derive(Default)]
struct FileScan {
    secrets: Vec<Finding>,
    sast: Vec<Finding>,
    dependencies: Vec<Finding>,
    infra: Vec<Finding>,
    compression_missing: bool,
    domains: Vec<String>,
}

pub struct SecurityScanner {
    secops: SecOpsScanner,
}

impl SecurityScanner {
    pub fn new(config: SecOpsConfig) -> Self {
        Self {
            secops: SecOpsScanner::new(config),
        }
    }

    /// Scanner with an injected certificate probe
    pub fn with_probe(config: SecOpsConfig, probe: Arc<dyn CertificateProbe>) -> Self {
        Self {
            secops: SecOpsScanner::with_probe(config, probe),
        }
    }

    pub fn scan(&self, tree: &SourceTree) -> SecurityReport {
        let scans: Vec<(&SourceFile, FileScan)> = tree
            .files()
            .par_iter()
            .map(|file| (file, scan_file(file)))
            .collect();

        let mut report = SecurityReport::default();
        for (_, scan) in &scans {
            report.findings.extend(scan.secrets.iter().cloned());
        }
        for (_, scan) in &scans {
            report.findings.extend(scan.sast.iter().cloned());
        }
        for (_, scan) in &scans {
            report.findings.extend(scan.dependencies.iter().cloned());
        }
        for (file, scan) in &scans {
            report.findings.extend(scan.infra.iter().cloned());
            if scan.compression_missing {
                report.compression_missing.push(file.relative.clone());
            }
        }

        let mentions = scans.iter().flat_map(|(file, scan)| {
            scan.domains
                .iter()
                .map(move |d| (file.relative.as_str(), d.clone()))
        });
        let candidates = self.secops.candidates(mentions);
        let secops = self.secops.probe(&candidates);
        report.findings.extend(secops.findings);
        report.domain_probes = secops.probes;

        info!(
            "Security scan: {} findings, {} domains probed",
            report.findings.len(),
            report.domain_probes.len()
        );
        report
    }
}

fn scan_file(file: &SourceFile) -> FileScan {
    let secrets = secrets::applies_to(file);
    let sast = sast::applies_to(file);
    let dependencies = dependencies::applies_to(file);
    let infra = infra::applies_to(file);
    let secops = secops::applies_to(file);

    if !(secrets || sast || dependencies || infra || secops) {
        return FileScan::default();
    }

    let limit = if infra {
        INFRA_PREFIX_BYTES
    } else {
        SCAN_PREFIX_BYTES
    };
    let content = match file.read_prefix(limit) {
        Ok(c) => c,
        Err(e) => {
            debug!("Skipping {} for security scan: {}", file.relative, e);
            return FileScan::default();
        }
    };
    let prefix = crate::scanner::truncate_bytes(&content, SCAN_PREFIX_BYTES);
    let rel = file.relative.as_str();

    let mut scan = FileScan::default();
    if secrets {
        scan.secrets = secrets::scan_content(rel, prefix);
    }
    if sast {
        scan.sast = sast::scan_content(rel, prefix);
    }
    if dependencies {
        scan.dependencies = dependencies::scan_content(rel, prefix);
    }
    if infra {
        let infra_scan = infra::scan_content(rel, &content);
        scan.infra = infra_scan.findings;
        scan.compression_missing = infra_scan.compression_missing;
    }
    if secops {
        scan.domains = secops::extract_domains(prefix);
    }
    scan
}
