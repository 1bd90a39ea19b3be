//! Init command - write an example configuration file

use anyhow::{Context, Result};
use archon::AnalysisConfig;
use console::style;
use std::path::{Path, PathBuf};

/// Run the init command
pub fn run(output: Option<&Path>) -> Result<()> {
    let path: PathBuf = match output {
        Some(p) => p.to_path_buf(),
        None => AnalysisConfig::user_config_path()
            .context("Could not determine the user config directory; pass --output")?,
    };

    if AnalysisConfig::write_example(&path)? {
        println!(
            "{} Created {}",
            style("✓").green(),
            style(path.display()).cyan()
        );
    } else {
        println!(
            "{} Config already exists at {}",
            style("✓").green(),
            style(path.display()).cyan()
        );
    }

    println!("\nNext steps:");
    println!("  {} Run analysis", style("archon analyze .").cyan());
    println!(
        "  {} Use a specific config",
        style(format!("archon analyze . --config {}", path.display())).cyan()
    );
    Ok(())
}
