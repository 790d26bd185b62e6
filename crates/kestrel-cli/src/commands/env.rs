//! `kestrel env` — Load a named environment and print its variables.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use clap::Args;
use kestrel_common::config::KestrelConfig;
use kestrel_common::types::Category;
use kestrel_env::{Environment, EnvironmentLoader, MemoryEnv};

use crate::output;

/// Arguments for the `env` command.
#[derive(Args, Debug)]
pub struct EnvArgs {
    /// Environment name, read from `<dir>/<name>.json`.
    pub name: String,

    /// Directory holding environment documents. Defaults to the
    /// application's environments directory.
    #[arg(long)]
    pub dir: Option<PathBuf>,

    /// Also print variables only the process defines.
    #[arg(long)]
    pub all: bool,
}

/// Executes the `env` command.
///
/// # Errors
///
/// Returns an error if the environment document is missing or invalid.
pub async fn execute(args: EnvArgs, root: &Path) -> anyhow::Result<()> {
    let directory = args
        .dir
        .unwrap_or_else(|| KestrelConfig::with_root(root).directory(Category::Environment));
    let loader = EnvironmentLoader::new(directory, Arc::new(MemoryEnv::from_process()));
    let environment = loader.load(&args.name).await?;

    println!(
        "{}",
        output::heading(&format!(
            "Environment: {} ({})",
            environment.name(),
            environment.path().display()
        ))
    );
    for (key, value, source) in rows(environment, args.all) {
        println!("  {key:<32} {value:<40} {source}");
    }
    Ok(())
}

/// Variables to print with where their value came from.
fn rows(environment: &Environment, all: bool) -> Vec<(&str, &str, &'static str)> {
    environment
        .values()
        .iter()
        .filter_map(|(key, value)| {
            let source = match environment.declared().get(key) {
                Some(declared) if declared == value => "declared",
                Some(_) => "process override",
                None if all => "process",
                None => return None,
            };
            Some((key.as_str(), value.as_str(), source))
        })
        .collect()
}
