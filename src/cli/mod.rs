//! Command-line interface definitions.

pub mod consolidate;
pub mod run;
pub mod status;

use std::path::PathBuf;

use clap::{Parser, Subcommand};

/// Roundlord - round-market orchestration for fantasy leagues.
#[derive(Parser, Debug)]
#[command(name = "roundlord")]
#[command(version, about, long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Run the polling orchestrator (foreground)
    Run(RunArgs),

    /// Show orchestrator state and recent events
    Status(ConfigPathArg),

    /// Force the finalize/consolidate pass for one round
    Consolidate(ConsolidateArgs),
}

/// Shared argument for commands that only need a config path.
#[derive(Parser, Debug)]
pub struct ConfigPathArg {
    /// Path to configuration file
    #[arg(short, long, default_value = "config.toml")]
    pub config: PathBuf,
}

/// Arguments for the `run` subcommand.
#[derive(Parser, Debug)]
pub struct RunArgs {
    /// Path to configuration file
    #[arg(short, long, default_value = "config.toml")]
    pub config: PathBuf,

    /// Override log level (debug, info, warn, error)
    #[arg(long)]
    pub log_level: Option<String>,

    /// Emit logs as JSON
    #[arg(long)]
    pub json_logs: bool,

    /// Poll and dispatch exactly once, then exit
    #[arg(long)]
    pub once: bool,
}

/// Arguments for the `consolidate` subcommand.
#[derive(Parser, Debug)]
pub struct ConsolidateArgs {
    /// Path to configuration file
    #[arg(short, long, default_value = "config.toml")]
    pub config: PathBuf,

    /// Round to consolidate
    #[arg(long)]
    pub round: u32,
}
