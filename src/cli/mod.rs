//! CLI command definitions and handlers

mod analyze;
mod init;

use anyhow::Result;
use clap::{Parser, Subcommand};
use std::path::PathBuf;

/// Archon - repository maturity analysis
///
/// Everything runs locally; the only network access is the optional TLS
/// certificate probe for domains found in config files.
#[derive(Parser, Debug)]
#[command(name = "archon")]
#[command(
    version,
    about = "Repository maturity analysis: stack, structure, security, complexity, duplication and dependencies",
    after_help = "\
Examples:
  archon .                                  Analyze current directory
  archon analyze /path/to/repo              Analyze a specific repo
  archon analyze . --format json            JSON output for scripting
  archon analyze . --format digest -o ctx.txt   Bounded digest for an LLM
  archon analyze . --no-network             Skip TLS certificate probes
  archon analyze . --fail-on critical       Exit code 1 on critical findings (CI mode)
  archon init                               Write an example config file"
)]
pub struct Cli {
    /// Path to repository (default: current directory)
    #[arg(global = true, default_value = ".")]
    pub path: PathBuf,

    /// Log level (error, warn, info, debug, trace)
    #[arg(long, global = true, default_value = "warn", value_parser = ["error", "warn", "info", "debug", "trace"])]
    pub log_level: String,

    #[command(subcommand)]
    pub command: Option<Commands>,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Write an example configuration file
    Init {
        /// Destination (default: the user config file)
        #[arg(long, short = 'o')]
        output: Option<PathBuf>,
    },

    /// Analyze a repository and report its maturity score
    Analyze {
        /// Output format: text, json, digest
        #[arg(long, short = 'f', default_value = "text", value_parser = ["text", "json", "digest"])]
        format: String,

        /// Output file path (default: stdout)
        #[arg(long, short = 'o')]
        output: Option<PathBuf>,

        /// Config file (default: the user config file, if present)
        #[arg(long, short = 'c')]
        config: Option<PathBuf>,

        /// Disable live TLS certificate probes
        #[arg(long, env = "ARCHON_NO_NETWORK")]
        no_network: bool,

        /// Exit with code 1 if findings at or above this severity exist
        #[arg(long, value_parser = ["critical", "high", "medium", "low"])]
        fail_on: Option<String>,

        /// Hide the progress spinner
        #[arg(long, short = 'q')]
        quiet: bool,
    },
}

/// Run the CLI
pub fn run(cli: Cli) -> Result<()> {
    match cli.command {
        Some(Commands::Init { output }) => init::run(output.as_deref()),

        Some(Commands::Analyze {
            format,
            output,
            config,
            no_network,
            fail_on,
            quiet,
        }) => analyze::run(
            &cli.path,
            analyze::Options {
                format: format.parse()?,
                output,
                config,
                no_network,
                fail_on,
                quiet,
            },
        ),

        None => analyze::run(&cli.path, analyze::Options::default()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_analyze_flags() {
        let cli = Cli::try_parse_from([
            "archon",
            "analyze",
            "repo",
            "--format",
            "json",
            "--no-network",
            "--fail-on",
            "high",
        ])
        .unwrap();
        assert_eq!(cli.path, PathBuf::from("repo"));
        match cli.command {
            Some(Commands::Analyze {
                format,
                no_network,
                fail_on,
                ..
            }) => {
                assert_eq!(format, "json");
                assert!(no_network);
                assert_eq!(fail_on.as_deref(), Some("high"));
            }
            other => panic!("unexpected command: {:?}", other),
        }
    }

    #[test]
    fn test_bare_invocation_defaults_to_current_dir() {
        let cli = Cli::try_parse_from(["archon"]).unwrap();
        assert_eq!(cli.path, PathBuf::from("."));
        assert!(cli.command.is_none());
        assert_eq!(cli.log_level, "warn");
    }

    #[test]
    fn test_rejects_unknown_format() {
        assert!(Cli::try_parse_from(["archon", "analyze", ".", "--format", "sarif"]).is_err());
    }
}
