//! # kestrel-sdk
//!
//! Public SDK for building Kestrel applications.
//!
//! Provides the main entry points:
//! - [`KestrelBuilder`](builder::KestrelBuilder): Fluent API for the directory layout, loader, and process environment.
//! - [`Kestrel`](kestrel::Kestrel): Environment-guarded facade over services, commands, and tests.
//! - [`Manifest`](manifest::Manifest): Declarative JSON or YAML registration files.
//! - [`Guard`](guard::Guard): Validation and error context around public calls.
//!
//! # Example
//!
//! ```rust,no_run
//! use kestrel_sdk::{Kestrel, ServiceDefinition};
//!
//! # async fn run() -> kestrel_sdk::Result<()> {
//! let mut app = Kestrel::builder().root("/srv/app").build()?;
//! let _ = app.load_environment("production").await?;
//! let _ = app.add_service(ServiceDefinition::named("pool").namespace("db").singleton()).await?;
//! let pool = app.get_service("db.pool").await?;
//! # let _ = pool;
//! # Ok(())
//! # }
//! ```

pub mod builder;
pub mod guard;
pub mod kestrel;
pub mod manifest;
pub mod resolver;

pub use builder::KestrelBuilder;
pub use guard::Guard;
pub use kestrel::Kestrel;
pub use kestrel_common::config::KestrelConfig;
pub use kestrel_common::error::{KestrelError, Result};
pub use kestrel_common::types::{Category, Origin};
pub use kestrel_container::{
    Autowired, AutowiredClass, Class, ClassMetadata, Component, ComponentTable, DiSpec, FnClass,
    Injectable, Invocation, Loaded, Registration, ServiceDefinition,
};
pub use kestrel_env::{Environment, MemoryEnv, ProcessEnv, SystemEnv};
pub use manifest::{Manifest, ManifestFormat};
pub use resolver::FacadeResolver;
