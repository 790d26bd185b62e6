//! Resolution of config, environment, factory, and helper references.

use std::path::PathBuf;
use std::sync::Arc;

use async_trait::async_trait;
use kestrel_common::config::KestrelConfig;
use kestrel_common::error::{KestrelError, Result};
use kestrel_common::types::Category;
use kestrel_container::descriptor::module_path;
use kestrel_container::{Dependency, DependencyResolver, Injectable, Loaded, Loader};
use kestrel_env::EnvironmentLoader;

/// Dependency resolver backed by the category directories and the loaded
/// environment.
///
/// - `config::` and `helper::` load the module from their directory and
///   extract the requested property,
/// - `environment::` reads a variable of the loaded environment,
/// - `factory::` loads a class and injects it unconstructed.
pub struct FacadeResolver {
    config: KestrelConfig,
    loader: Arc<dyn Loader>,
    environment: Arc<EnvironmentLoader>,
}

impl std::fmt::Debug for FacadeResolver {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FacadeResolver")
            .field("config", &self.config)
            .field("environment", &self.environment)
            .finish_non_exhaustive()
    }
}

impl FacadeResolver {
    /// Creates a resolver over the given directories and environment.
    #[must_use]
    pub fn new(
        config: KestrelConfig,
        loader: Arc<dyn Loader>,
        environment: Arc<EnvironmentLoader>,
    ) -> Self {
        Self {
            config,
            loader,
            environment,
        }
    }

    async fn load(&self, category: Category, name: &str) -> Result<(PathBuf, Loaded)> {
        let path = module_path(&self.config.directory(category), name);
        match self.loader.load(&path).await {
            Ok(loaded) => Ok((path, loaded)),
            Err(source) => Err(KestrelError::Load {
                category,
                name: name.to_owned(),
                path,
                source: Box::new(source),
            }),
        }
    }
}

#[async_trait]
impl DependencyResolver for FacadeResolver {
    async fn resolve(&self, dependency: &Dependency) -> Result<Injectable> {
        match dependency {
            Dependency::Config { name, prop } => {
                let (_, loaded) = self.load(Category::Config, name).await?;
                loaded.into_injectable().extract(prop)
            }
            Dependency::Helper { name, prop } => {
                let (_, loaded) = self.load(Category::Helper, name).await?;
                loaded.into_injectable().extract(prop)
            }
            Dependency::Environment { prop } => self.environment.get(prop).map(Injectable::from),
            Dependency::Factory { name } => match self.load(Category::Factory, name).await? {
                (_, Loaded::Class(class)) => Ok(Injectable::Class(class)),
                (path, Loaded::Value(_)) => Err(KestrelError::NotAClass {
                    identifier: dependency.to_string(),
                    path,
                }),
            },
            Dependency::Service { .. } | Dependency::Static(_) => Err(KestrelError::Config {
                message: format!("'{dependency}' is resolved by the container"),
            }),
        }
    }
}

#[cfg(test)]
mod tests {
    use kestrel_container::{Component, ComponentTable, FnClass};
    use kestrel_env::MemoryEnv;
    use serde_json::json;

    use super::*;

    struct Widget;

    impl Component for Widget {}

    fn resolver(table: ComponentTable) -> FacadeResolver {
        let config = KestrelConfig::with_root("/app");
        let environment = EnvironmentLoader::new(
            config.directory(Category::Environment),
            Arc::new(MemoryEnv::new()),
        );
        FacadeResolver::new(config, Arc::new(table), Arc::new(environment))
    }

    #[tokio::test]
    async fn config_property_is_extracted() {
        let table = ComponentTable::new();
        let _ = table.insert("/app/configs/db", json!({ "host": "localhost" }));
        let value = resolver(table)
            .resolve(&Dependency::Config {
                name: "db".into(),
                prop: "host".into(),
            })
            .await
            .expect("resolve");
        assert_eq!(value.as_str(), Some("localhost"));
    }

    #[tokio::test]
    async fn helper_without_prop_is_the_whole_module() {
        let table = ComponentTable::new();
        let _ = table.insert("/app/helpers/fmt/date", json!({ "format": "%Y" }));
        let value = resolver(table)
            .resolve(&Dependency::Helper {
                name: "fmt.date".into(),
                prop: String::new(),
            })
            .await
            .expect("resolve");
        assert_eq!(value.data(), Some(&json!({ "format": "%Y" })));
    }

    #[tokio::test]
    async fn factory_is_injected_as_class() {
        let table = ComponentTable::new();
        let _ = table.insert(
            "/app/factories/widget",
            FnClass::new(|_| Ok(Box::new(Widget))).shared(),
        );
        let value = resolver(table)
            .resolve(&Dependency::Factory {
                name: "widget".into(),
            })
            .await
            .expect("resolve");
        assert!(value.class().is_some());
    }

    #[tokio::test]
    async fn factory_value_is_not_a_class() {
        let table = ComponentTable::new();
        let _ = table.insert("/app/factories/widget", json!(1));
        let err = resolver(table)
            .resolve(&Dependency::Factory {
                name: "widget".into(),
            })
            .await
            .expect_err("not a class");
        assert!(matches!(err, KestrelError::NotAClass { .. }));
    }

    #[tokio::test]
    async fn environment_requires_a_loaded_environment() {
        let err = resolver(ComponentTable::new())
            .resolve(&Dependency::Environment { prop: "PORT".into() })
            .await
            .expect_err("not loaded");
        assert!(matches!(err, KestrelError::EnvironmentNotLoaded));
    }

    #[tokio::test]
    async fn missing_config_is_a_load_error() {
        let err = resolver(ComponentTable::new())
            .resolve(&Dependency::Config {
                name: "db".into(),
                prop: String::new(),
            })
            .await
            .expect_err("missing");
        assert!(err.to_string().starts_with("can't load config 'db'"));
    }
}
