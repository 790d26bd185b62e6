//! Named environment loading.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::sync::{Arc, OnceLock};

use kestrel_common::constants::DATA_EXTENSION;
use kestrel_common::error::{KestrelError, Result};
use kestrel_common::types::Category;
use serde_json::Value;

use crate::process::ProcessEnv;

/// A loaded and merged environment.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Environment {
    name: String,
    path: PathBuf,
    declared: BTreeMap<String, String>,
    values: BTreeMap<String, String>,
}

impl Environment {
    /// Name the environment was loaded under.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// File the declared values were read from.
    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Variables as declared in the document, before merging.
    #[must_use]
    pub const fn declared(&self) -> &BTreeMap<String, String> {
        &self.declared
    }

    /// Merged variables.
    #[must_use]
    pub const fn values(&self) -> &BTreeMap<String, String> {
        &self.values
    }

    /// One merged variable.
    #[must_use]
    pub fn get(&self, key: &str) -> Option<&str> {
        self.values.get(key).map(String::as_str)
    }
}

/// Loads one named environment from a directory of JSON documents.
pub struct EnvironmentLoader {
    directory: PathBuf,
    process: Arc<dyn ProcessEnv>,
    loaded: OnceLock<Environment>,
}

impl std::fmt::Debug for EnvironmentLoader {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("EnvironmentLoader")
            .field("directory", &self.directory)
            .field("loaded", &self.loaded.get().map(Environment::name))
            .finish_non_exhaustive()
    }
}

impl EnvironmentLoader {
    /// Creates a loader reading `<directory>/<name>.json`.
    pub fn new(directory: impl Into<PathBuf>, process: Arc<dyn ProcessEnv>) -> Self {
        Self {
            directory: directory.into(),
            process,
            loaded: OnceLock::new(),
        }
    }

    /// Directory environments are read from.
    #[must_use]
    pub fn directory(&self) -> &Path {
        &self.directory
    }

    /// Whether an environment has been loaded.
    #[must_use]
    pub fn is_loaded(&self) -> bool {
        self.loaded.get().is_some()
    }

    /// Loads and merges the environment called `name`.
    ///
    /// Declared variables the process does not define are exported to it.
    ///
    /// # Errors
    ///
    /// Returns [`KestrelError::EnvironmentAlreadyLoaded`] on a second call,
    /// or a [`KestrelError::Load`] wrapping the read or decode failure.
    pub async fn load(&self, name: &str) -> Result<&Environment> {
        if let Some(current) = self.loaded.get() {
            return Err(already_loaded(current, name));
        }

        let path = self.document_path(name);
        let declared = read_declared(&path).await.map_err(|source| KestrelError::Load {
            category: Category::Environment,
            name: name.to_owned(),
            path: path.clone(),
            source: Box::new(source),
        })?;

        let process = self.process.vars();
        let missing: Vec<(String, String)> = declared
            .iter()
            .filter(|(key, _)| !process.contains_key(*key))
            .map(|(key, value)| (key.clone(), value.clone()))
            .collect();
        let mut values = declared.clone();
        values.extend(process);

        let environment = Environment {
            name: name.to_owned(),
            path,
            declared,
            values,
        };
        if let Err(rejected) = self.loaded.set(environment) {
            return Err(self
                .loaded
                .get()
                .map_or(KestrelError::EnvironmentNotLoaded, |current| {
                    already_loaded(current, rejected.name())
                }));
        }

        for (key, value) in &missing {
            self.process.set_var(key, value);
        }
        tracing::info!(
            environment = name,
            variables = self.loaded.get().map_or(0, |env| env.values.len()),
            exported = missing.len(),
            "environment loaded"
        );
        self.environment()
    }

    /// The loaded environment.
    ///
    /// # Errors
    ///
    /// Returns [`KestrelError::EnvironmentNotLoaded`] before [`load`](Self::load).
    pub fn environment(&self) -> Result<&Environment> {
        self.loaded.get().ok_or(KestrelError::EnvironmentNotLoaded)
    }

    /// Name of the loaded environment.
    ///
    /// # Errors
    ///
    /// Returns [`KestrelError::EnvironmentNotLoaded`] before [`load`](Self::load).
    pub fn name(&self) -> Result<&str> {
        self.environment().map(Environment::name)
    }

    /// One variable of the loaded environment.
    ///
    /// # Errors
    ///
    /// Returns [`KestrelError::EnvironmentNotLoaded`] before loading, or
    /// [`KestrelError::PropertyNotFound`] for an unknown variable.
    pub fn get(&self, key: &str) -> Result<&str> {
        self.environment()?
            .get(key)
            .ok_or_else(|| KestrelError::PropertyNotFound {
                property: key.to_owned(),
                path: key.to_owned(),
            })
    }

    fn document_path(&self, name: &str) -> PathBuf {
        self.directory.join(format!("{name}.{DATA_EXTENSION}"))
    }
}

fn already_loaded(current: &Environment, requested: &str) -> KestrelError {
    KestrelError::EnvironmentAlreadyLoaded {
        current: current.name.clone(),
        requested: requested.to_owned(),
    }
}

async fn read_declared(path: &Path) -> Result<BTreeMap<String, String>> {
    let content = tokio::fs::read_to_string(path)
        .await
        .map_err(|source| KestrelError::Io {
            path: path.to_path_buf(),
            source,
        })?;
    let document: Value = serde_json::from_str(&content)?;
    parse_declared(document)
}

/// Flattens a declared environment document into string variables.
///
/// Strings are kept, numbers and booleans are rendered, nulls are dropped.
///
/// # Errors
///
/// Returns [`KestrelError::Config`] when the document is not an object or a
/// value is an array or object.
pub fn parse_declared(document: Value) -> Result<BTreeMap<String, String>> {
    let Value::Object(map) = document else {
        return Err(KestrelError::Config {
            message: "environment document must be an object".into(),
        });
    };
    let mut values = BTreeMap::new();
    for (key, value) in map {
        let rendered = match value {
            Value::String(s) => s,
            Value::Number(n) => n.to_string(),
            Value::Bool(b) => b.to_string(),
            Value::Null => continue,
            Value::Array(_) | Value::Object(_) => {
                return Err(KestrelError::Config {
                    message: format!("environment variable '{key}' must be a scalar"),
                });
            }
        };
        let _ = values.insert(key, rendered);
    }
    Ok(values)
}
