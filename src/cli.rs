use std::path::PathBuf;

use clap::{Parser, Subcommand};
use clap_complete::Shell;

#[derive(Parser)]
#[command(name = "provis")]
#[command(version)]
#[command(about = "Declarative provisioning executor", long_about = None)]
#[command(propagate_version = true)]
pub struct Cli {
    /// Verbosity level
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Suppress non-essential output
    #[arg(short, long, global = true)]
    pub quiet: bool,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand)]
pub enum Command {
    /// Execute a provisioning plan
    Run(RunArgs),

    /// Show which steps are already satisfied
    Check(PlanArgs),

    /// Print the resolved plan
    List(PlanArgs),

    /// Generate shell completions
    Completions {
        /// Shell to generate completions for
        #[arg(value_enum)]
        shell: Shell,
    },
}

#[derive(Parser)]
pub struct RunArgs {
    /// Path to a step-definition file (TOML or JSON); defaults to
    /// ~/.config/provis/plan.toml, then the built-in plan
    pub plan: Option<PathBuf>,

    /// Abort remaining steps on first failure (the default)
    #[arg(long, conflicts_with = "continue_on_error")]
    pub fail_fast: bool,

    /// Keep executing remaining steps after a failure
    #[arg(long)]
    pub continue_on_error: bool,

    /// Don't invoke anything, just show what would happen
    #[arg(long)]
    pub dry_run: bool,

    /// Skip confirmation prompts
    #[arg(short = 'y', long)]
    pub yes: bool,
}

#[derive(Parser)]
pub struct PlanArgs {
    /// Path to a step-definition file (TOML or JSON)
    pub plan: Option<PathBuf>,
}
