//! # Tessera CLI Module
//!
//! This module implements the CLI interface for Tessera.
//!
//! ## Available Commands
//!
//! - `replay` - Replay a session script and report per-step changes
//! - `inspect` - Show the resolved configuration layout of a script
//! - `check` - Validate a script without resolving it

mod commands;

use crate::error::CliError;
use clap::{Parser, Subcommand};
use std::path::PathBuf;

pub use commands::*;

// =============================================================================
// CLI STRUCTURE
// =============================================================================

/// Tessera - incremental editor state engine
///
/// Resolves the built-in editor extensions and replays scripted edits against
/// them, reporting which facets and fields changed at every step.
#[derive(Parser, Debug)]
#[command(name = "tessera")]
#[command(version, about, long_about = None)]
pub struct Cli {
    /// Enable verbose output
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Suppress banner output
    #[arg(short, long, global = true)]
    pub quiet: bool,

    /// Output in JSON format (for programmatic access)
    #[arg(long, global = true)]
    pub json_mode: bool,

    /// Subcommand to execute
    #[command(subcommand)]
    pub command: Commands,
}

/// Available CLI commands.
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Replay a session script
    Replay {
        /// Path to the TOML script
        #[arg(short, long)]
        script: PathBuf,
    },

    /// Show the resolved configuration of a script
    Inspect {
        /// Path to the TOML script
        #[arg(short, long)]
        script: PathBuf,
    },

    /// Validate a script
    Check {
        /// Path to the TOML script
        #[arg(short, long)]
        script: PathBuf,
    },
}

// =============================================================================
// COMMAND EXECUTION
// =============================================================================

/// Execute the CLI with parsed arguments.
pub fn execute(cli: Cli) -> Result<(), CliError> {
    let json_mode = cli.json_mode;
    let verbose = cli.verbose;

    match cli.command {
        Commands::Replay { script } => cmd_replay(&script, json_mode, verbose),
        Commands::Inspect { script } => cmd_inspect(&script, json_mode),
        Commands::Check { script } => cmd_check(&script, json_mode),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_global_flags_after_subcommand() {
        let cli = Cli::try_parse_from(["tessera", "replay", "-s", "a.toml", "--json-mode", "-q"])
            .expect("parse");
        assert!(cli.json_mode);
        assert!(cli.quiet);
        assert!(matches!(cli.command, Commands::Replay { ref script } if script.ends_with("a.toml")));
    }

    #[test]
    fn requires_a_subcommand() {
        assert!(Cli::try_parse_from(["tessera"]).is_err());
    }
}
