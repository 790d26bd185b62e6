//! Fluent API for configuring a [`Kestrel`] application.

use std::path::PathBuf;
use std::sync::Arc;

use kestrel_common::config::KestrelConfig;
use kestrel_common::error::{KestrelError, Result};
use kestrel_common::types::Category;
use kestrel_container::{ComponentTable, Container, Loader};
use kestrel_env::{EnvironmentLoader, MemoryEnv, ProcessEnv};

use crate::kestrel::Kestrel;
use crate::resolver::FacadeResolver;

/// Builder for configuring an application before use.
pub struct KestrelBuilder {
    config: KestrelConfig,
    components: Option<Arc<ComponentTable>>,
    loader: Option<Arc<dyn Loader>>,
    process: Arc<dyn ProcessEnv>,
}

impl std::fmt::Debug for KestrelBuilder {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("KestrelBuilder")
            .field("config", &self.config)
            .field("components", &self.components)
            .finish_non_exhaustive()
    }
}

impl Default for KestrelBuilder {
    fn default() -> Self {
        Self::new()
    }
}

impl KestrelBuilder {
    /// Creates a builder with the default directory layout under `.`.
    #[must_use]
    pub fn new() -> Self {
        Self {
            config: KestrelConfig::default(),
            components: None,
            loader: None,
            process: Arc::new(MemoryEnv::from_process()),
        }
    }

    /// Starts from an existing configuration.
    #[must_use]
    pub fn config(mut self, config: KestrelConfig) -> Self {
        self.config = config;
        self
    }

    /// Sets the application root.
    #[must_use]
    pub fn root(mut self, root: impl Into<PathBuf>) -> Self {
        self.config.set_root(root);
        self
    }

    /// Overrides the directory of one category, relative to the root.
    #[must_use]
    pub fn path(mut self, category: Category, path: impl Into<PathBuf>) -> Self {
        self.config.set_path(category, path);
        self
    }

    /// Uses a shared component table as the module loader.
    #[must_use]
    pub fn components(mut self, components: Arc<ComponentTable>) -> Self {
        self.components = Some(components);
        self.loader = None;
        self
    }

    /// Uses a custom module loader.
    ///
    /// Modules cannot be provided through [`Kestrel::provide`] afterwards.
    #[must_use]
    pub fn loader(mut self, loader: Arc<dyn Loader>) -> Self {
        self.loader = Some(loader);
        self.components = None;
        self
    }

    /// Sets the environment merged with loaded environments.
    ///
    /// Defaults to a snapshot of the process environment, so exported
    /// variables stay inside the application. Pass a
    /// [`SystemEnv`](kestrel_env::SystemEnv) to export into the process.
    #[must_use]
    pub fn process_env(mut self, process: Arc<dyn ProcessEnv>) -> Self {
        self.process = process;
        self
    }

    /// Builds the application.
    ///
    /// # Errors
    ///
    /// Returns an error if the configured root is empty.
    pub fn build(self) -> Result<Kestrel> {
        let parts = self.into_parts()?;
        Ok(Kestrel::from_parts(
            parts.config,
            parts.components,
            parts.environment,
            parts.container,
        ))
    }

    /// Builds a bare container wired like the application's, for static
    /// inspection of registrations without loading an environment.
    ///
    /// # Errors
    ///
    /// Returns an error if the configured root is empty.
    pub fn build_container(self) -> Result<Container> {
        Ok(self.into_parts()?.container)
    }

    fn into_parts(self) -> Result<Parts> {
        if self.config.root.as_os_str().is_empty() {
            return Err(KestrelError::Config {
                message: "application root is required".into(),
            });
        }
        let components = match (&self.loader, self.components) {
            (Some(_), _) => None,
            (None, Some(table)) => Some(table),
            (None, None) => Some(Arc::new(ComponentTable::new())),
        };
        let loader: Arc<dyn Loader> = match (self.loader, &components) {
            (Some(loader), _) => loader,
            (None, Some(table)) => Arc::clone(table) as Arc<dyn Loader>,
            (None, None) => Arc::new(ComponentTable::new()),
        };
        let environment = Arc::new(EnvironmentLoader::new(
            self.config.directory(Category::Environment),
            self.process,
        ));
        let resolver = FacadeResolver::new(
            self.config.clone(),
            Arc::clone(&loader),
            Arc::clone(&environment),
        );
        let container = Container::new(self.config.clone(), loader, Arc::new(resolver));
        tracing::debug!(root = %self.config.root.display(), "application configured");
        Ok(Parts {
            config: self.config,
            components,
            environment,
            container,
        })
    }
}

struct Parts {
    config: KestrelConfig,
    components: Option<Arc<ComponentTable>>,
    environment: Arc<EnvironmentLoader>,
    container: Container,
}

#[cfg(test)]
mod tests {
    use std::path::Path;

    use super::*;

    #[test]
    fn paths_follow_root_and_overrides() {
        let kestrel = KestrelBuilder::new()
            .root("/srv/app")
            .path(Category::Service, "src/services")
            .build()
            .expect("build");
        assert_eq!(
            kestrel.config().directory(Category::Service),
            Path::new("/srv/app/src/services")
        );
        assert_eq!(
            kestrel.config().directory(Category::Config),
            Path::new("/srv/app/configs")
        );
    }

    #[test]
    fn empty_root_is_rejected() {
        let err = KestrelBuilder::new().root("").build().expect_err("empty root");
        assert!(matches!(err, KestrelError::Config { .. }));
    }

    #[test]
    fn custom_loader_disables_component_table() {
        let kestrel = KestrelBuilder::new()
            .loader(Arc::new(ComponentTable::new()))
            .build()
            .expect("build");
        assert!(kestrel.components().is_none());

        let kestrel = KestrelBuilder::new().build().expect("build");
        assert!(kestrel.components().is_some());
    }
}
