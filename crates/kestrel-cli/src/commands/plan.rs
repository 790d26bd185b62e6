//! `kestrel plan` — Display the resolution order of a manifest.

use std::path::{Path, PathBuf};

use clap::Args;
use kestrel_container::Container;
use kestrel_sdk::{KestrelBuilder, Manifest};
use serde::Serialize;

use crate::output;

/// Arguments for the `plan` command.
#[derive(Args, Debug)]
pub struct PlanArgs {
    /// Path to the manifest, relative to the current directory.
    #[arg(default_value = "kestrel.yaml")]
    pub manifest: PathBuf,

    /// Print the plan as JSON.
    #[arg(long)]
    pub json: bool,
}

/// One step of a resolution plan.
#[derive(Debug, Serialize)]
pub struct PlanStep {
    /// Registered identifier.
    pub identifier: String,
    /// Public alias, if any.
    pub alias: Option<String>,
    /// Section the definition came from.
    pub origin: String,
    /// Whether the constructed instance is cached.
    pub singleton: bool,
}

/// Executes the `plan` command.
///
/// Registers the manifest into a bare container and prints its
/// dependency order. No module is loaded and nothing is constructed.
///
/// # Errors
///
/// Returns an error if the manifest cannot be read or registered, or if
/// the services form a cycle.
pub async fn execute(args: PlanArgs, root: PathBuf) -> anyhow::Result<()> {
    let manifest = Manifest::read(&args.manifest).await?;
    let mut container = KestrelBuilder::new().root(root).build_container()?;
    let _ = manifest.register(&mut container).await?;

    let steps = plan_steps(&container)?;
    tracing::debug!(steps = steps.len(), manifest = %args.manifest.display(), "plan computed");
    if args.json {
        println!("{}", serde_json::to_string_pretty(&steps)?);
        return Ok(());
    }
    print_plan(&args.manifest, &steps);
    Ok(())
}

/// Orders every registration of `container` for display.
///
/// # Errors
///
/// Returns an error if the registrations form a cycle.
pub fn plan_steps(container: &Container) -> anyhow::Result<Vec<PlanStep>> {
    let order = container.plan()?;
    Ok(order
        .into_iter()
        .filter_map(|identifier| {
            container.registry().get(&identifier).map(|entry| PlanStep {
                alias: entry.alias.clone(),
                origin: entry.origin.to_string(),
                singleton: entry.singleton,
                identifier,
            })
        })
        .collect())
}

fn print_plan(manifest: &Path, steps: &[PlanStep]) {
    println!("{}", output::heading(&format!("Resolution Plan for: {}", manifest.display())));
    println!();
    for (index, step) in steps.iter().enumerate() {
        let alias = step
            .alias
            .as_deref()
            .filter(|alias| *alias != step.identifier)
            .map(|alias| format!(" ({alias})"))
            .unwrap_or_default();
        let scope = if step.singleton { "singleton" } else { "transient" };
        println!(
            "  {:>3}. {:<40} {:<8} {scope}{alias}",
            index + 1,
            output::truncate(&step.identifier, 40),
            step.origin,
        );
    }
    println!();
    println!("  {} registration(s) in dependency order.", steps.len());
}

#[cfg(test)]
mod tests {
    use kestrel_container::{DiSpec, ServiceDefinition};

    use super::*;

    #[tokio::test]
    async fn steps_follow_dependency_order() {
        let mut container = KestrelBuilder::new()
            .root("/srv/app")
            .build_container()
            .expect("container");
        let _ = container
            .add(ServiceDefinition::named("api").di(DiSpec::new().arg("service::db")))
            .await
            .expect("api");
        let _ = container
            .add(ServiceDefinition::named("db").singleton())
            .await
            .expect("db");

        let steps = plan_steps(&container).expect("plan");
        let identifiers: Vec<&str> = steps.iter().map(|s| s.identifier.as_str()).collect();
        assert_eq!(identifiers, vec!["db", "api"]);
        assert!(steps[0].singleton);
        assert!(!steps[1].singleton);
    }
}
