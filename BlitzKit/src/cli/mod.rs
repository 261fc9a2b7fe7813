//! `BlitzKit` CLI - command-line front end for B3D models and textures

pub mod commands;
pub mod progress;

use std::path::PathBuf;

use clap::Parser;
use commands::Commands;

use crate::config::Config;

#[derive(Parser)]
#[command(name = "blitzkit")]
#[command(about = "BlitzKit: Blitz3D model and texture tools", long_about = None)]
#[command(version)]
struct Cli {
    /// TOML configuration file
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

/// Run the `BlitzKit` CLI
///
/// # Errors
/// Returns an error if the configuration cannot be loaded or the command
/// fails.
pub fn run_cli() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .init();

    let cli = Cli::parse();
    let config = match &cli.config {
        Some(path) => Config::load(path)?,
        None => Config::default(),
    };
    cli.command.execute(&config)
}
