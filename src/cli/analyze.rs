//! Analyze command implementation
//!
//! 1. Load configuration (file, user config, environment, flags)
//! 2. Run the analysis pipeline with a progress spinner
//! 3. Render the report (text, json, digest) to stdout or a file
//! 4. Apply the `--fail-on` threshold

use archon::models::{AnalysisReport, Severity};
use archon::reporters::{self, OutputFormat};
use archon::scanner::SourceTree;
use archon::{AnalysisConfig, Pipeline};

use anyhow::{Context, Result};
use console::style;
use indicatif::{ProgressBar, ProgressStyle};
use std::path::{Path, PathBuf};
use std::time::{Duration, Instant};

#[derive(Debug, Default)]
pub struct Options {
    pub format: OutputFormat,
    pub output: Option<PathBuf>,
    pub config: Option<PathBuf>,
    pub no_network: bool,
    pub fail_on: Option<String>,
    pub quiet: bool,
}

/// Create spinner progress style
fn create_spinner_style() -> ProgressStyle {
    ProgressStyle::default_spinner()
        .tick_chars("⠁⠂⠄⡀⢀⠠⠐⠈ ")
        .template("{spinner:.green} {msg}")
        .unwrap_or_else(|_| ProgressStyle::default_spinner())
}

pub fn run(path: &Path, options: Options) -> Result<()> {
    let start = Instant::now();
    let repo_path = path
        .canonicalize()
        .with_context(|| format!("Path does not exist: {}", path.display()))?;

    let mut config = AnalysisConfig::load(options.config.as_deref())?;
    if options.no_network {
        config.secops.enabled = false;
    }
    let digest_config = config.digest.clone();

    // The spinner only decorates interactive text runs
    let show_progress =
        !options.quiet && options.format == OutputFormat::Text && console::Term::stderr().is_term();
    let spinner = if show_progress {
        let pb = ProgressBar::new_spinner();
        pb.set_style(create_spinner_style());
        pb.enable_steady_tick(Duration::from_millis(100));
        Some(pb)
    } else {
        None
    };

    let observer = |msg: &str| {
        if let Some(pb) = &spinner {
            pb.set_message(msg.to_string());
        }
    };
    let result = Pipeline::new(config).run(&repo_path, &observer);
    if let Some(pb) = &spinner {
        pb.finish_and_clear();
    }
    let report = result.with_context(|| format!("Analysis of {} failed", repo_path.display()))?;

    let tree = match options.format {
        OutputFormat::Digest => Some(SourceTree::scan(&repo_path)),
        _ => None,
    };
    let rendered =
        reporters::report_with_format(&report, options.format, tree.as_ref(), &digest_config)?;

    match &options.output {
        Some(out) => {
            std::fs::write(out, &rendered)
                .with_context(|| format!("Failed to write {}", out.display()))?;
            eprintln!(
                "{} Wrote {} report to {}",
                style("✓").green(),
                options.format,
                style(out.display()).cyan()
            );
        }
        None => println!("{}", rendered),
    }

    if options.format == OutputFormat::Text && options.output.is_none() {
        eprintln!(
            "{}",
            style(format!("Analyzed in {:.2?}", start.elapsed())).dim()
        );
    }

    check_fail_threshold(options.fail_on.as_deref(), &report)
}

fn parse_severity(s: &str) -> Option<Severity> {
    match s.to_lowercase().as_str() {
        "critical" => Some(Severity::Critical),
        "high" => Some(Severity::High),
        "medium" => Some(Severity::Medium),
        "low" => Some(Severity::Low),
        _ => None,
    }
}

/// Check if fail threshold is met
fn check_fail_threshold(fail_on: Option<&str>, report: &AnalysisReport) -> Result<()> {
    let Some(threshold) = fail_on else {
        return Ok(());
    };
    let Some(min) = parse_severity(threshold) else {
        anyhow::bail!("Unknown severity '{}'", threshold);
    };
    if report.security_findings.iter().any(|f| f.severity >= min) {
        eprintln!("Failing due to --fail-on={} threshold", threshold);
        std::process::exit(1);
    }
    Ok(())
}
