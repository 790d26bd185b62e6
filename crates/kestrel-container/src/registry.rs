//! Identifier-keyed storage of service descriptors.
//!
//! The registry is the sole owner of every [`ServiceEntry`]. Entries are
//! never removed; their caches are filled in place during resolution.

use std::collections::HashMap;
use std::path::PathBuf;
use std::sync::OnceLock;

use indexmap::IndexMap;
use kestrel_common::error::{KestrelError, Result};

use crate::descriptor::{self, Registration, ServiceDefinition, ServiceEntry};
use crate::value::Loaded;

/// Registered descriptors in registration order.
#[derive(Debug, Default)]
pub struct Registry {
    entries: IndexMap<String, ServiceEntry>,
    aliases: HashMap<String, String>,
}

impl Registry {
    /// Creates an empty registry.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Validates, normalizes, and stores a definition.
    ///
    /// `path` must already be formatted. `preloaded` carries the class of an
    /// autowired definition; its metadata fills the fields the definition
    /// leaves empty, and it becomes the entry's cached class.
    ///
    /// # Errors
    ///
    /// Returns an error if no name can be determined, a setter name or
    /// reference is invalid, the preloaded module is not a class, or the
    /// identifier or alias is already taken.
    pub fn register(
        &mut self,
        mut definition: ServiceDefinition,
        path: PathBuf,
        preloaded: Option<Loaded>,
    ) -> Result<Registration> {
        if let Some(Loaded::Class(class)) = &preloaded {
            descriptor::apply_metadata(&mut definition, &class.metadata());
        }
        let Some(name) = definition.name.clone() else {
            return Err(KestrelError::MissingName {
                descriptor: format!("{definition:?}"),
            });
        };
        let di = descriptor::format_di(&name, definition.di.as_ref())?;
        let (identifier, alias) = descriptor::generate_identifier(&definition, &name);

        self.check_available(identifier.as_str())?;
        if let Some(alias) = &alias {
            if alias != identifier.as_str() {
                self.check_available(alias)?;
            }
        }
        if let Some(loaded) = &preloaded {
            descriptor::check_loaded(identifier.as_str(), &path, definition.is_instance, loaded)?;
        }

        let class = OnceLock::new();
        if let Some(loaded) = preloaded {
            let _ = class.set(loaded);
        }
        let entry = ServiceEntry {
            identifier,
            alias,
            name,
            namespace: definition.namespace,
            origin: definition.origin,
            path,
            is_instance: definition.is_instance,
            singleton: definition.singleton || definition.is_instance,
            di,
            class,
            instance: tokio::sync::OnceCell::new(),
        };
        let registration = entry.registration();
        tracing::info!(
            identifier = %registration.identifier,
            alias = ?registration.alias,
            origin = %registration.origin,
            "service registered"
        );

        let key = registration.identifier.as_str().to_owned();
        if let Some(alias) = &registration.alias {
            if alias != &key {
                let _ = self.aliases.insert(alias.clone(), key.clone());
            }
        }
        let _ = self.entries.insert(key, entry);
        Ok(registration)
    }

    fn check_available(&self, key: &str) -> Result<()> {
        if self.has(key) {
            return Err(KestrelError::DuplicateIdentifier {
                identifier: key.to_owned(),
            });
        }
        Ok(())
    }

    /// Whether `key` is a registered identifier or alias.
    #[must_use]
    pub fn has(&self, key: &str) -> bool {
        self.entries.contains_key(key) || self.aliases.contains_key(key)
    }

    /// Returns the entry stored under an identifier.
    #[must_use]
    pub fn get(&self, identifier: &str) -> Option<&ServiceEntry> {
        self.entries.get(identifier)
    }

    /// Returns the entry for an identifier, falling back to aliases.
    #[must_use]
    pub fn lookup(&self, key: &str) -> Option<&ServiceEntry> {
        self.entries.get(key).or_else(|| {
            self.aliases
                .get(key)
                .and_then(|identifier| self.entries.get(identifier))
        })
    }

    /// Identifiers starting with `prefix`, in registration order.
    #[must_use]
    pub fn list_by_namespace(&self, prefix: &str) -> Vec<&str> {
        self.entries
            .keys()
            .filter(|identifier| identifier.starts_with(prefix))
            .map(String::as_str)
            .collect()
    }

    /// Every entry in registration order.
    pub fn entries(&self) -> impl Iterator<Item = &ServiceEntry> {
        self.entries.values()
    }

    /// Number of registered entries.
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Whether nothing is registered.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
