//! # kestrel-container
//!
//! Dependency-resolution engine for Kestrel applications.
//!
//! Handles:
//! - **Grammar**: Parsing of dependency reference strings (`service::db.pool`).
//! - **Descriptor**: Service definitions and their registration lifecycle.
//! - **Registry**: Identifier-keyed storage with duplicate detection.
//! - **Resolver**: Recursive, cycle-checked construction of live instances.
//! - **Graph**: Static dependency ordering over the registry.
//! - **Value**: Runtime values, classes, and components flowing through injection.
//! - **Loader**: The module-loading boundary and an in-memory component table.

pub mod descriptor;
pub mod grammar;
pub mod graph;
pub mod loader;
pub mod registry;
pub mod resolver;
pub mod value;

pub use descriptor::{DiSpec, Registration, ServiceDefinition};
pub use grammar::token::Dependency;
pub use loader::{ComponentTable, Loader};
pub use registry::Registry;
pub use resolver::{Container, DependencyResolver};
pub use value::{
    Autowired, AutowiredClass, Class, ClassMetadata, Component, FnClass, Injectable, Invocation,
    Loaded,
};
