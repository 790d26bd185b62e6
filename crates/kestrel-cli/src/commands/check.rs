//! `kestrel check` — Validate a manifest without constructing anything.

use std::path::PathBuf;

use clap::Args;
use kestrel_container::ServiceDefinition;
use kestrel_container::graph::DependencyGraph;
use kestrel_sdk::{KestrelBuilder, Manifest};

use crate::output;

/// Arguments for the `check` command.
#[derive(Args, Debug)]
pub struct CheckArgs {
    /// Path to the manifest, relative to the current directory.
    #[arg(default_value = "kestrel.yaml")]
    pub manifest: PathBuf,
}

/// Executes the `check` command.
///
/// Every definition is registered on its own so one bad entry does not
/// hide the others. Autowired definitions need their module at runtime
/// and are skipped. Dangling `service::` references and cycles are
/// reported afterwards.
///
/// # Errors
///
/// Returns an error if the manifest cannot be read or any problem was
/// found.
pub async fn execute(args: CheckArgs, root: PathBuf) -> anyhow::Result<()> {
    let manifest = Manifest::read(&args.manifest).await?;
    let mut container = KestrelBuilder::new().root(root).build_container()?;

    println!("{}", output::heading(&format!("Checking: {}", args.manifest.display())));
    println!();

    let mut problems = Vec::new();
    for definition in manifest.definitions() {
        let label = label(&definition);
        if definition.autowire {
            println!("  {} {label} (autowired, checked at runtime)", output::SKIP);
            continue;
        }
        match container.add(definition).await {
            Ok(registration) => println!("  {} {}", output::OK, registration.identifier),
            Err(e) => {
                println!("  {} {label}", output::FAIL);
                problems.push(format!("{label}: {e}"));
            }
        }
    }

    let graph = DependencyGraph::from_registry(container.registry());
    tracing::debug!(
        registered = container.registry().len(),
        missing = graph.missing().len(),
        "dependency graph built"
    );
    for missing in graph.missing() {
        problems.push(format!(
            "{}: service '{}' is not registered",
            missing.dependent, missing.service
        ));
    }
    if let Err(e) = graph.resolution_order() {
        problems.push(e.to_string());
    }

    println!();
    if problems.is_empty() {
        println!("  {} registration(s), no problems found.", container.registry().len());
        return Ok(());
    }
    println!("  Problems:");
    for problem in &problems {
        println!("    - {problem}");
    }
    anyhow::bail!("{} problem(s) found in {}", problems.len(), args.manifest.display())
}

fn label(definition: &ServiceDefinition) -> String {
    let name = definition
        .name
        .as_deref()
        .or(definition.path.as_deref())
        .unwrap_or("<unnamed>");
    match &definition.namespace {
        Some(namespace) => format!("{}:{namespace}.{name}", definition.origin),
        None => format!("{}:{name}", definition.origin),
    }
}
