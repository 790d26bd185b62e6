//! The application facade.
//!
//! [`Kestrel`] ties the environment loader, the service container, and the
//! component table together. An environment must be loaded before anything
//! else: every other guarded call fails with
//! [`KestrelError::EnvironmentNotLoaded`] until then.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use kestrel_common::config::KestrelConfig;
use kestrel_common::error::{KestrelError, Result};
use kestrel_common::types::{Category, Origin};
use kestrel_container::descriptor::module_path;
use kestrel_container::{ComponentTable, Container, Injectable, Loaded, Registration, ServiceDefinition};
use kestrel_env::{Environment, EnvironmentLoader};

use crate::builder::KestrelBuilder;
use crate::guard::{self, Guard};
use crate::manifest::Manifest;

const GUARD: Guard = Guard::new("Kestrel");

/// An inversion-of-control application.
#[derive(Debug)]
pub struct Kestrel {
    config: KestrelConfig,
    components: Option<Arc<ComponentTable>>,
    environment: Arc<EnvironmentLoader>,
    container: Container,
}

fn loaded(environment: &EnvironmentLoader) -> Result<()> {
    if environment.is_loaded() {
        Ok(())
    } else {
        Err(KestrelError::EnvironmentNotLoaded)
    }
}

fn loaded_and_named(environment: &EnvironmentLoader, argument: &str, value: &str) -> Result<()> {
    loaded(environment)?;
    guard::non_empty(argument, value)
}

impl Kestrel {
    /// Starts configuring an application.
    #[must_use]
    pub fn builder() -> KestrelBuilder {
        KestrelBuilder::new()
    }

    pub(crate) const fn from_parts(
        config: KestrelConfig,
        components: Option<Arc<ComponentTable>>,
        environment: Arc<EnvironmentLoader>,
        container: Container,
    ) -> Self {
        Self {
            config,
            components,
            environment,
            container,
        }
    }

    /// Directory layout of the application.
    #[must_use]
    pub const fn config(&self) -> &KestrelConfig {
        &self.config
    }

    /// The component table, unless a custom loader was configured.
    #[must_use]
    pub const fn components(&self) -> Option<&Arc<ComponentTable>> {
        self.components.as_ref()
    }

    /// The underlying service container.
    #[must_use]
    pub const fn container(&self) -> &Container {
        &self.container
    }

    /// Loads the named environment from the environments directory.
    ///
    /// # Errors
    ///
    /// Returns [`KestrelError::EnvironmentAlreadyLoaded`] on a second call,
    /// or a load failure.
    pub async fn load_environment(&self, name: &str) -> Result<&Environment> {
        GUARD
            .run(
                "load_environment",
                || guard::non_empty("name", name),
                self.environment.load(name),
            )
            .await
    }

    /// The loaded environment.
    ///
    /// # Errors
    ///
    /// Returns [`KestrelError::EnvironmentNotLoaded`] before loading.
    pub fn environment(&self) -> Result<&Environment> {
        GUARD.check(
            "environment",
            || loaded(&self.environment),
            || self.environment.environment(),
        )
    }

    /// Full directory of a category.
    ///
    /// # Errors
    ///
    /// Returns [`KestrelError::EnvironmentNotLoaded`] before loading.
    pub fn get_directory(&self, category: Category) -> Result<PathBuf> {
        GUARD.check(
            "get_directory",
            || loaded(&self.environment),
            || Ok(self.config.directory(category)),
        )
    }

    /// Provides a module under a dotted name of a category directory.
    ///
    /// Returns the module previously provided under the same name.
    ///
    /// # Errors
    ///
    /// Returns [`KestrelError::Config`] when the application was built with
    /// a custom loader.
    pub fn provide(
        &self,
        category: Category,
        dotted: &str,
        module: impl Into<Loaded>,
    ) -> Result<Option<Loaded>> {
        GUARD.check(
            "provide",
            || guard::non_empty("name", dotted),
            || {
                let table = self.components.as_ref().ok_or_else(|| KestrelError::Config {
                    message: "modules can only be provided to the component table".into(),
                })?;
                let path = module_path(&self.config.directory(category), dotted);
                tracing::debug!(%category, module = dotted, path = %path.display(), "module provided");
                Ok(table.insert(path, module))
            },
        )
    }

    /// Registers a service.
    ///
    /// # Errors
    ///
    /// Returns [`KestrelError::EnvironmentNotLoaded`] before loading, or any
    /// registration failure.
    pub async fn add_service(&mut self, definition: ServiceDefinition) -> Result<Registration> {
        self.register("add_service", definition.origin(Origin::Service))
            .await
    }

    /// Resolves a service by identifier or alias.
    ///
    /// # Errors
    ///
    /// Returns [`KestrelError::EnvironmentNotLoaded`] before loading, or any
    /// resolution failure.
    pub async fn get_service(&self, key: &str) -> Result<Injectable> {
        GUARD
            .run(
                "get_service",
                || loaded_and_named(&self.environment, "service", key),
                self.container.get(key),
            )
            .await
    }

    /// Registers a command.
    ///
    /// Commands get a generated identifier; run them by the returned alias.
    ///
    /// # Errors
    ///
    /// Returns [`KestrelError::EnvironmentNotLoaded`] before loading, or any
    /// registration failure.
    pub async fn add_command(&mut self, definition: ServiceDefinition) -> Result<Registration> {
        self.register("add_command", definition.origin(Origin::Command))
            .await
    }

    /// Resolves a command and executes it with `argv`.
    ///
    /// # Errors
    ///
    /// Returns [`KestrelError::EnvironmentNotLoaded`] before loading,
    /// [`KestrelError::NotFound`] when `name` is not a registered command, a
    /// resolution failure, or the command's own failure.
    pub async fn exec_command(&self, name: &str, argv: Vec<String>) -> Result<Injectable> {
        GUARD
            .run(
                "exec_command",
                || loaded_and_named(&self.environment, "command", name),
                self.execute(Origin::Command, name, argv),
            )
            .await
    }

    /// Registers a test.
    ///
    /// # Errors
    ///
    /// Returns [`KestrelError::EnvironmentNotLoaded`] before loading, or any
    /// registration failure.
    pub async fn add_test(&mut self, definition: ServiceDefinition) -> Result<Registration> {
        self.register("add_test", definition.origin(Origin::Test)).await
    }

    /// Resolves a test and runs it with `argv`.
    ///
    /// # Errors
    ///
    /// Returns [`KestrelError::EnvironmentNotLoaded`] before loading,
    /// [`KestrelError::NotFound`] when `name` is not a registered test, a
    /// resolution failure, or the test's own failure.
    pub async fn run_test(&self, name: &str, argv: Vec<String>) -> Result<Injectable> {
        GUARD
            .run(
                "run_test",
                || loaded_and_named(&self.environment, "test", name),
                self.execute(Origin::Test, name, argv),
            )
            .await
    }

    /// Registers every definition of a manifest file.
    ///
    /// # Errors
    ///
    /// Returns [`KestrelError::EnvironmentNotLoaded`] before loading, a read
    /// or parse failure, or the first registration failure.
    pub async fn load_manifest(&mut self, path: &Path) -> Result<Vec<Registration>> {
        let container = &mut self.container;
        GUARD
            .run(
                "load_manifest",
                || loaded(&self.environment),
                async move { Manifest::read(path).await?.register(container).await },
            )
            .await
    }

    /// Static resolution order of every registration.
    ///
    /// # Errors
    ///
    /// Returns [`KestrelError::EnvironmentNotLoaded`] before loading, or
    /// [`KestrelError::CyclicDependency`].
    pub fn plan(&self) -> Result<Vec<String>> {
        GUARD.check(
            "plan",
            || loaded(&self.environment),
            || self.container.plan(),
        )
    }

    async fn register(
        &mut self,
        operation: &str,
        definition: ServiceDefinition,
    ) -> Result<Registration> {
        GUARD
            .run(
                operation,
                || loaded(&self.environment),
                self.container.add(definition),
            )
            .await
    }

    async fn execute(&self, origin: Origin, name: &str, argv: Vec<String>) -> Result<Injectable> {
        let registered = self.container.registry().lookup(name);
        if registered.is_none_or(|entry| entry.origin != origin) {
            return Err(KestrelError::NotFound {
                kind: origin.category().as_str(),
                id: name.to_owned(),
            });
        }
        let resolved = self.container.get(name).await?;
        let Some(instance) = resolved.instance() else {
            return Err(KestrelError::NotExecutable {
                identifier: name.to_owned(),
            });
        };
        tracing::info!(entry = name, args = argv.len(), "executing");
        instance.execute(argv).await
    }
}
