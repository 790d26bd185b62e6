//! CLI command definitions and dispatch.

pub mod check;
pub mod env;
pub mod plan;

use std::path::PathBuf;

use clap::{Parser, Subcommand};
use kestrel_common::constants::{BIN_NAME, ROOT_ENV_VAR};

/// Kestrel — inversion-of-control application toolkit.
#[derive(Parser, Debug)]
#[command(name = BIN_NAME, version, about, long_about = None)]
pub struct Cli {
    /// Subcommand to execute.
    #[command(subcommand)]
    pub command: Command,

    /// Application root holding the category directories.
    #[arg(long, global = true, env = ROOT_ENV_VAR, default_value = ".")]
    pub root: PathBuf,
}

/// Available CLI subcommands.
#[derive(Subcommand, Debug)]
pub enum Command {
    /// Display the order services would be resolved in.
    Plan(plan::PlanArgs),
    /// Validate a manifest without constructing anything.
    Check(check::CheckArgs),
    /// Load a named environment and print its variables.
    Env(env::EnvArgs),
}

/// Dispatches the parsed CLI command to its handler.
///
/// # Errors
///
/// Returns an error if the command execution fails.
pub async fn execute(cli: Cli) -> anyhow::Result<()> {
    match cli.command {
        Command::Plan(args) => plan::execute(args, cli.root).await,
        Command::Check(args) => check::execute(args, cli.root).await,
        Command::Env(args) => env::execute(args, &cli.root).await,
    }
}
