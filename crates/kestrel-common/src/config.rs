//! Directory layout configuration for a Kestrel application.

use std::collections::BTreeMap;
use std::path::PathBuf;

use serde::{Deserialize, Serialize};

use crate::types::Category;

/// Root configuration: an application root plus one directory per category.
///
/// Category paths are relative to `root` unless they are absolute.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct KestrelConfig {
    /// Application root directory.
    pub root: PathBuf,
    /// Directory of each category, relative to `root`.
    pub paths: BTreeMap<Category, PathBuf>,
}

impl Default for KestrelConfig {
    fn default() -> Self {
        let paths = Category::ALL
            .iter()
            .map(|&c| (c, PathBuf::from(crate::constants::default_dir(c))))
            .collect();
        Self {
            root: PathBuf::from("."),
            paths,
        }
    }
}

impl KestrelConfig {
    /// Creates a configuration with default category paths under `root`.
    #[must_use]
    pub fn with_root(root: impl Into<PathBuf>) -> Self {
        Self {
            root: root.into(),
            ..Self::default()
        }
    }

    /// Replaces the application root; category directories follow it.
    pub fn set_root(&mut self, root: impl Into<PathBuf>) {
        self.root = root.into();
    }

    /// Overrides the directory of a single category.
    pub fn set_path(&mut self, category: Category, path: impl Into<PathBuf>) {
        let _ = self.paths.insert(category, path.into());
    }

    /// Returns the full directory for a category.
    #[must_use]
    pub fn directory(&self, category: Category) -> PathBuf {
        let relative = self
            .paths
            .get(&category)
            .cloned()
            .unwrap_or_else(|| PathBuf::from(crate::constants::default_dir(category)));
        self.root.join(relative)
    }
}

#[cfg(test)]
mod tests {
    use std::path::Path;

    use super::*;

    #[test]
    fn default_paths_cover_every_category() {
        let config = KestrelConfig::default();
        assert_eq!(config.paths.len(), Category::ALL.len());
        assert_eq!(
            config.directory(Category::Service),
            Path::new(".").join("services")
        );
    }

    #[test]
    fn root_change_moves_directories() {
        let mut config = KestrelConfig::with_root("/app");
        assert_eq!(config.directory(Category::Config), Path::new("/app/configs"));
        config.set_root("/srv");
        assert_eq!(config.directory(Category::Config), Path::new("/srv/configs"));
    }

    #[test]
    fn path_override_applies_to_one_category() {
        let mut config = KestrelConfig::with_root("/app");
        config.set_path(Category::Command, "bin");
        assert_eq!(config.directory(Category::Command), Path::new("/app/bin"));
        assert_eq!(config.directory(Category::Test), Path::new("/app/tests"));
    }

    #[test]
    fn absolute_override_ignores_root() {
        let mut config = KestrelConfig::with_root("/app");
        config.set_path(Category::Environment, "/etc/kestrel/env");
        assert_eq!(
            config.directory(Category::Environment),
            Path::new("/etc/kestrel/env")
        );
    }

    #[test]
    fn deserializes_partial_document() {
        let config: KestrelConfig =
            serde_json::from_str(r#"{"root": "/opt/app"}"#).expect("deserialize");
        assert_eq!(config.directory(Category::Helper), Path::new("/opt/app/helpers"));
    }
}
