//! Command-line argument definitions.

use std::path::PathBuf;

use clap::{Parser, Subcommand};

/// Estimate time worked on a repository.
///
/// Periodically samples file modification times under the repository root
/// and infers how long you have been editing.
#[derive(Debug, Parser)]
#[command(name = "hours", version, about, long_about = None)]
pub struct Cli {
    /// Enable verbose output.
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Path to config file.
    #[arg(short, long, global = true)]
    pub config: Option<PathBuf>,

    /// Repository root to track.
    #[arg(short = 'C', long, global = true, default_value = ".")]
    pub root: PathBuf,

    #[command(subcommand)]
    pub command: Option<Commands>,
}

/// Available subcommands.
#[derive(Debug, Subcommand)]
pub enum Commands {
    /// Sample the repository periodically and answer menu commands on stdin.
    ///
    /// This is the default when no subcommand is given.
    Watch,

    /// Run a single sampling pass and save it.
    Scan,

    /// Show the time worked on the repository.
    Status,

    /// Print every tracked path as JSON.
    Dump,
}
