use std::io;

use anyhow::{Context, Result};
use clap::Parser;
use tracing_subscriber::EnvFilter;

use hours_cli::commands::{dump, scan, status, watch};
use hours_cli::repo::Repo;
use hours_cli::{Cli, Commands, Config};

fn main() -> Result<()> {
    let cli = Cli::parse();

    // Initialize tracing with verbose flag support
    let filter = if cli.verbose {
        EnvFilter::new("debug")
    } else {
        EnvFilter::from_default_env()
    };
    // Stdout belongs to the menu and command output
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(io::stderr)
        .try_init();

    let config = Config::load_from(cli.config.as_deref()).context("failed to load configuration")?;
    tracing::debug!(?config, root = %cli.root.display(), "loaded configuration");

    let repo = Repo::open(&cli.root, &config);
    let mut stdout = io::stdout().lock();

    match cli.command.unwrap_or(Commands::Watch) {
        Commands::Watch => {
            watch::run(io::stdin().lock(), &mut stdout, repo, config.poll_interval())?;
        }
        Commands::Scan => scan::run(&mut stdout, &repo)?,
        Commands::Status => status::run(&mut stdout, &repo)?,
        Commands::Dump => dump::run(&mut stdout, &repo)?,
    }

    Ok(())
}
