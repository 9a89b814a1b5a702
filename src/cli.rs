//! CLI parsing for engage

use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};

use crate::commands;

#[derive(Parser)]
#[command(name = "engage")]
#[command(about = "Analyze targets, run recommended playbooks and review past engagements", long_about = None)]
#[command(version)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    #[command(flatten)]
    pub global: GlobalArgs,
}

#[derive(Args, Debug, Clone, Default)]
pub struct GlobalArgs {
    /// Path to an engage.toml file (defaults to ./engage.toml, then the user config dir)
    #[arg(long, global = true)]
    pub config: Option<PathBuf>,

    /// Override the engagement service base address
    #[arg(long, global = true)]
    pub base_url: Option<String>,

    /// Print results as JSON instead of formatted text
    #[arg(long, global = true)]
    pub json: bool,

    #[arg(long, short, global = true)]
    pub verbose: bool,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Write a default engage.toml in the current directory
    Init(commands::init::Args),

    /// Analyze a target and list the recommended playbooks
    Analyze(commands::analyze::Args),

    /// Execute a recommended playbook
    Execute(commands::execute::Args),

    /// Show the most recent engagements
    History(commands::history::Args),

    /// Interactive console driving analysis, execution and history
    Console(commands::console::Args),
}
