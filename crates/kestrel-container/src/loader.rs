//! Module loading boundary.
//!
//! Descriptors name their module by a formatted path. A [`Loader`] turns
//! that path into a class or a plain value. [`ComponentTable`] is the
//! in-process loader: classes and values are provided up front under the
//! path they will be requested by, and data modules fall back to
//! `<path>.json` on disk.

use std::collections::HashMap;
use std::ffi::OsString;
use std::path::{Path, PathBuf};
use std::sync::{PoisonError, RwLock};

use async_trait::async_trait;
use kestrel_common::constants::DATA_EXTENSION;
use kestrel_common::error::{KestrelError, Result};

use crate::value::Loaded;

/// Produces the module stored at a path.
#[async_trait]
pub trait Loader: Send + Sync {
    /// Loads the module at `path`.
    ///
    /// # Errors
    ///
    /// Returns [`KestrelError::NotFound`] when nothing lives at `path`, or
    /// any read or decode failure.
    async fn load(&self, path: &Path) -> Result<Loaded>;
}

/// Path-keyed table of provided modules with a JSON file fallback.
#[derive(Debug, Default)]
pub struct ComponentTable {
    modules: RwLock<HashMap<PathBuf, Loaded>>,
}

impl ComponentTable {
    /// Creates an empty table.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Provides a module under `path`, returning the one it replaces.
    pub fn insert(&self, path: impl Into<PathBuf>, module: impl Into<Loaded>) -> Option<Loaded> {
        self.modules
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .insert(path.into(), module.into())
    }

    /// Whether a module was provided under `path`.
    #[must_use]
    pub fn contains(&self, path: &Path) -> bool {
        self.modules
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .contains_key(path)
    }

    /// Number of provided modules.
    #[must_use]
    pub fn len(&self) -> usize {
        self.modules
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .len()
    }

    /// Whether no module was provided.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    fn provided(&self, path: &Path) -> Option<Loaded> {
        self.modules
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .get(path)
            .cloned()
    }
}

fn data_file(path: &Path) -> PathBuf {
    let mut file = OsString::from(path.as_os_str());
    file.push(".");
    file.push(DATA_EXTENSION);
    PathBuf::from(file)
}

#[async_trait]
impl Loader for ComponentTable {
    async fn load(&self, path: &Path) -> Result<Loaded> {
        if let Some(module) = self.provided(path) {
            tracing::trace!(path = %path.display(), "module served from table");
            return Ok(module);
        }

        let file = data_file(path);
        let content = match tokio::fs::read_to_string(&file).await {
            Ok(content) => content,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                return Err(KestrelError::NotFound {
                    kind: "module",
                    id: path.display().to_string(),
                });
            }
            Err(source) => return Err(KestrelError::Io { path: file, source }),
        };
        let value: serde_json::Value = serde_json::from_str(&content)?;
        tracing::debug!(path = %file.display(), "data module loaded from disk");
        Ok(Loaded::from(value))
    }
}
