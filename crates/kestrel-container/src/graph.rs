//! Static dependency graph over registered services using `petgraph`.
//!
//! Nodes are descriptor identifiers, edges come from `service::` references.
//! Nothing is loaded or constructed; the graph only answers which order the
//! resolver would visit services in and which references dangle.

use std::collections::HashMap;

use kestrel_common::error::{KestrelError, Result};
use petgraph::graph::NodeIndex;

use crate::registry::Registry;

/// A service reference with no matching descriptor.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MissingReference {
    /// Descriptor holding the reference.
    pub dependent: String,
    /// Identifier it points to.
    pub service: String,
}

/// A dependency graph of services.
#[derive(Debug, Default)]
pub struct DependencyGraph {
    graph: petgraph::Graph<String, ()>,
    nodes: HashMap<String, NodeIndex>,
    missing: Vec<MissingReference>,
}

impl DependencyGraph {
    /// Creates an empty dependency graph.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Builds the graph of every entry in a registry.
    #[must_use]
    pub fn from_registry(registry: &Registry) -> Self {
        let mut graph = Self::new();
        for entry in registry.entries() {
            let _ = graph.add_service(entry.identifier.as_str());
        }
        for entry in registry.entries() {
            let dependent = graph.add_service(entry.identifier.as_str());
            for service in entry.di.dependencies().filter_map(|d| d.service()) {
                match graph.nodes.get(service).copied() {
                    Some(dependency) => graph.add_dependency(dependent, dependency),
                    None => graph.missing.push(MissingReference {
                        dependent: entry.identifier.as_str().to_owned(),
                        service: service.to_owned(),
                    }),
                }
            }
        }
        graph
    }

    /// Adds a service node, returning the existing one for a known name.
    pub fn add_service(&mut self, name: impl Into<String>) -> NodeIndex {
        let name = name.into();
        if let Some(&index) = self.nodes.get(&name) {
            return index;
        }
        let index = self.graph.add_node(name.clone());
        let _ = self.nodes.insert(name, index);
        index
    }

    /// Adds a dependency edge: `dependent` depends on `dependency`.
    ///
    /// The graph edge points from `dependency` to `dependent`
    /// so that topological sort yields dependencies first.
    pub fn add_dependency(&mut self, dependent: NodeIndex, dependency: NodeIndex) {
        let _ = self.graph.add_edge(dependency, dependent, ());
    }

    /// References that point at no registered service.
    #[must_use]
    pub fn missing(&self) -> &[MissingReference] {
        &self.missing
    }

    /// Number of services in the graph.
    #[must_use]
    pub fn len(&self) -> usize {
        self.graph.node_count()
    }

    /// Whether the graph has no services.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.graph.node_count() == 0
    }

    /// Returns an order in which every service can be built.
    ///
    /// Dependencies appear before the services that depend on them.
    ///
    /// # Errors
    ///
    /// Returns [`KestrelError::CyclicDependency`] listing the services of
    /// one cycle in registration order.
    pub fn resolution_order(&self) -> Result<Vec<String>> {
        match petgraph::algo::toposort(&self.graph, None) {
            Ok(indices) => Ok(indices
                .iter()
                .filter_map(|&idx| self.graph.node_weight(idx).cloned())
                .collect()),
            Err(cycle) => Err(KestrelError::CyclicDependency {
                chain: self.cycle_containing(cycle.node_id()),
            }),
        }
    }

    fn cycle_containing(&self, node: NodeIndex) -> Vec<String> {
        let mut members = petgraph::algo::kosaraju_scc(&self.graph)
            .into_iter()
            .find(|component| component.contains(&node))
            .unwrap_or_else(|| vec![node]);
        members.sort_unstable();
        members
            .into_iter()
            .filter_map(|idx| self.graph.node_weight(idx).cloned())
            .collect()
    }
}
