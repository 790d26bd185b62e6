//! Recursive construction of live instances from registered descriptors.
//!
//! Resolution of one identifier:
//!
//! 1. fail with [`KestrelError::CyclicDependency`] if it is already on the
//!    active path, or [`KestrelError::ServiceNotFound`] if unknown,
//! 2. load the class once and check it is constructible,
//! 3. hand out the class itself when a class was asked for,
//! 4. hand out the cached instance of a singleton,
//! 5. resolve constructor then setter dependencies strictly in sequence,
//! 6. construct, call setters in declaration order, then the after hook,
//! 7. cache singletons only once every step succeeded.
//!
//! The active path is a plain `Vec` threaded through the recursion by
//! `&mut`; every exit, successful or not, pops what it pushed.
//!
//! Singletons are built inside their entry's [`tokio::sync::OnceCell`], so
//! concurrent `get` calls construct one instance and the others wait for
//! it. A failed build leaves the cell empty for the next caller.

use std::future::Future;
use std::path::{Path, PathBuf};
use std::pin::Pin;
use std::sync::Arc;

use async_trait::async_trait;
use kestrel_common::config::KestrelConfig;
use kestrel_common::error::{KestrelError, Result};
use kestrel_common::types::Category;

use crate::descriptor::{self, Registration, ResolvedDi, ServiceDefinition, ServiceEntry};
use crate::grammar::token::Dependency;
use crate::graph::DependencyGraph;
use crate::loader::Loader;
use crate::registry::Registry;
use crate::value::{Injectable, Invocation, Loaded};

type BoxFuture<'a, T> = Pin<Box<dyn Future<Output = T> + Send + 'a>>;

/// Resolves every non-service dependency on behalf of the container.
///
/// Service references and static values are handled by the container
/// itself; config, environment, factory and helper references are
/// delegated here.
#[async_trait]
pub trait DependencyResolver: Send + Sync {
    /// Produces the value for one dependency token.
    ///
    /// # Errors
    ///
    /// Returns any failure to locate or extract the value.
    async fn resolve(&self, dependency: &Dependency) -> Result<Injectable>;
}

/// Owns the registry and turns identifiers into instances.
pub struct Container {
    config: KestrelConfig,
    registry: Registry,
    loader: Arc<dyn Loader>,
    dependencies: Arc<dyn DependencyResolver>,
}

impl std::fmt::Debug for Container {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Container")
            .field("config", &self.config)
            .field("registry", &self.registry)
            .finish_non_exhaustive()
    }
}

impl Container {
    /// Creates an empty container.
    #[must_use]
    pub fn new(
        config: KestrelConfig,
        loader: Arc<dyn Loader>,
        dependencies: Arc<dyn DependencyResolver>,
    ) -> Self {
        Self {
            config,
            registry: Registry::new(),
            loader,
            dependencies,
        }
    }

    /// The registered descriptors.
    #[must_use]
    pub const fn registry(&self) -> &Registry {
        &self.registry
    }

    /// Directory layout the container formats paths against.
    #[must_use]
    pub const fn config(&self) -> &KestrelConfig {
        &self.config
    }

    /// Registers a definition.
    ///
    /// The module path is formatted against the directory of the
    /// definition's origin. Autowired definitions load their class here so
    /// its metadata can complete the definition.
    ///
    /// # Errors
    ///
    /// Returns any formatting, loading, or registration failure. Nothing is
    /// stored when an error is returned.
    pub async fn add(&mut self, definition: ServiceDefinition) -> Result<Registration> {
        let category = definition.origin.category();
        let path = descriptor::format_path(&definition, &self.config.directory(category))?;
        let preloaded = if definition.autowire {
            let name = definition
                .name
                .clone()
                .or_else(|| definition.path.clone())
                .unwrap_or_default();
            Some(self.load(category, &name, &path).await?)
        } else {
            None
        };
        self.registry.register(definition, path, preloaded)
    }

    /// Whether `key` names a registered identifier or alias.
    #[must_use]
    pub fn has(&self, key: &str) -> bool {
        self.registry.has(key)
    }

    /// Resolves an instance by identifier or alias.
    ///
    /// # Errors
    ///
    /// Returns [`KestrelError::ServiceNotFound`] for an unknown key, or the
    /// first failure met while resolving the dependency tree.
    pub async fn get(&self, key: &str) -> Result<Injectable> {
        self.resolve_key(key, false).await
    }

    /// Resolves the class of a service without constructing it.
    ///
    /// # Errors
    ///
    /// Returns [`KestrelError::ServiceNotFound`] for an unknown key, or a
    /// loading failure.
    pub async fn get_class(&self, key: &str) -> Result<Injectable> {
        self.resolve_key(key, true).await
    }

    /// Static resolution order of every registered service.
    ///
    /// # Errors
    ///
    /// Returns [`KestrelError::CyclicDependency`] when service references
    /// form a cycle.
    pub fn plan(&self) -> Result<Vec<String>> {
        DependencyGraph::from_registry(&self.registry).resolution_order()
    }

    async fn resolve_key(&self, key: &str, want_class: bool) -> Result<Injectable> {
        let entry = self
            .registry
            .lookup(key)
            .ok_or_else(|| KestrelError::ServiceNotFound {
                identifier: key.to_owned(),
            })?;
        let mut ancestry = Vec::new();
        self.resolve(entry.identifier.as_str(), &mut ancestry, want_class)
            .await
    }

    fn resolve<'a>(
        &'a self,
        identifier: &'a str,
        ancestry: &'a mut Vec<String>,
        want_class: bool,
    ) -> BoxFuture<'a, Result<Injectable>> {
        Box::pin(async move {
            if ancestry.iter().any(|active| active == identifier) {
                return Err(KestrelError::CyclicDependency {
                    chain: ancestry.clone(),
                });
            }
            let entry =
                self.registry
                    .get(identifier)
                    .ok_or_else(|| KestrelError::ServiceNotFound {
                        identifier: identifier.to_owned(),
                    })?;

            ancestry.push(identifier.to_owned());
            let outcome = self.build(entry, ancestry, want_class).await;
            let _ = ancestry.pop();
            outcome
        })
    }

    async fn build(
        &self,
        entry: &ServiceEntry,
        ancestry: &mut Vec<String>,
        want_class: bool,
    ) -> Result<Injectable> {
        let class = self.ensure_class(entry).await?;
        if want_class {
            return Ok(class.into_injectable());
        }
        if !entry.singleton {
            return self.construct(entry, class, ancestry).await;
        }
        if let Some(instance) = entry.cached_instance() {
            tracing::debug!(identifier = %entry.identifier, "singleton cache hit");
            return Ok(instance.clone());
        }
        // Concurrent callers wait on the cell; only one constructs.
        entry
            .instance
            .get_or_try_init(|| self.construct(entry, class, ancestry))
            .await
            .cloned()
    }

    async fn construct(
        &self,
        entry: &ServiceEntry,
        class: Loaded,
        ancestry: &mut Vec<String>,
    ) -> Result<Injectable> {
        if entry.is_instance {
            return Ok(class.into_injectable());
        }
        let Loaded::Class(class) = class else {
            return Err(KestrelError::NotAClass {
                identifier: entry.identifier.as_str().to_owned(),
                path: entry.path.clone(),
            });
        };

        let resolved = self.resolve_di(entry, ancestry).await?;
        tracing::debug!(
            identifier = %entry.identifier,
            arguments = resolved.constructor.len(),
            "constructing service"
        );
        let mut component = class.construct(resolved.constructor).await?;

        for (method, arguments) in resolved.setters {
            if component.invoke(&method, arguments).await? == Invocation::Unknown {
                return Err(KestrelError::SetterNotFound {
                    method,
                    service: entry.name.clone(),
                });
            }
        }
        if let Some(method) = resolved.after {
            if component.invoke(&method, Vec::new()).await? == Invocation::Unknown {
                return Err(KestrelError::AfterHookNotFound {
                    method,
                    service: entry.name.clone(),
                });
            }
        }
        Ok(Injectable::Instance(Arc::from(component)))
    }

    async fn ensure_class(&self, entry: &ServiceEntry) -> Result<Loaded> {
        if let Some(loaded) = entry.class() {
            return Ok(loaded.clone());
        }
        let loaded = self
            .load(entry.origin.category(), &entry.name, &entry.path)
            .await?;
        descriptor::check_loaded(
            entry.identifier.as_str(),
            &entry.path,
            entry.is_instance,
            &loaded,
        )?;
        Ok(entry.class.get_or_init(|| loaded).clone())
    }

    async fn load(&self, category: Category, name: &str, path: &Path) -> Result<Loaded> {
        tracing::debug!(%category, module = name, path = %path.display(), "loading module");
        self.loader
            .load(path)
            .await
            .map_err(|source| KestrelError::Load {
                category,
                name: name.to_owned(),
                path: PathBuf::from(path),
                source: Box::new(source),
            })
    }

    async fn resolve_di(
        &self,
        entry: &ServiceEntry,
        ancestry: &mut Vec<String>,
    ) -> Result<ResolvedDi> {
        let mut constructor = Vec::with_capacity(entry.di.constructor.len());
        for dependency in &entry.di.constructor {
            constructor.push(self.resolve_dependency(entry, dependency, ancestry).await?);
        }
        let mut setters = Vec::with_capacity(entry.di.setters.len());
        for (method, dependencies) in &entry.di.setters {
            let mut arguments = Vec::with_capacity(dependencies.len());
            for dependency in dependencies {
                arguments.push(self.resolve_dependency(entry, dependency, ancestry).await?);
            }
            setters.push((method.clone(), arguments));
        }
        Ok(ResolvedDi {
            constructor,
            setters,
            after: entry.di.after.clone(),
        })
    }

    async fn resolve_dependency(
        &self,
        entry: &ServiceEntry,
        dependency: &Dependency,
        ancestry: &mut Vec<String>,
    ) -> Result<Injectable> {
        tracing::trace!(identifier = %entry.identifier, %dependency, "resolving dependency");
        let resolved = match dependency {
            Dependency::Service {
                service,
                inject_class,
            } => self.resolve(service, ancestry, *inject_class).await,
            Dependency::Static(value) => Ok(Injectable::Data(value.clone())),
            other => self.dependencies.resolve(other).await,
        };
        resolved.map_err(|source| KestrelError::Dependency {
            identifier: entry.identifier.as_str().to_owned(),
            dependency: dependency.to_string(),
            source: Box::new(source),
        })
    }
}
