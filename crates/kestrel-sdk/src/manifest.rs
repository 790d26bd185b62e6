//! Declarative registration files.
//!
//! A manifest lists services, commands, and tests in JSON or YAML:
//!
//! ```yaml
//! services:
//!   - name: pool
//!     namespace: db
//!     singleton: true
//!     di:
//!       constructor: ["config::db>url"]
//! commands:
//!   - name: migrate
//!     di:
//!       constructor: ["service::db.pool"]
//! ```
//!
//! The section a definition appears in decides its origin.

use std::path::Path;

use kestrel_common::error::{KestrelError, Result};
use kestrel_common::types::Origin;
use kestrel_container::{Container, Registration, ServiceDefinition};
use serde::{Deserialize, Serialize};

/// Supported manifest encodings.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ManifestFormat {
    /// JSON document.
    Json,
    /// YAML document.
    Yaml,
}

impl ManifestFormat {
    /// Picks the format from a file extension, defaulting to JSON.
    #[must_use]
    pub fn from_path(path: &Path) -> Self {
        match path.extension().and_then(|ext| ext.to_str()) {
            Some("yaml" | "yml") => Self::Yaml,
            _ => Self::Json,
        }
    }
}

/// Services, commands, and tests to register together.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Manifest {
    /// Service definitions.
    pub services: Vec<ServiceDefinition>,
    /// Command definitions.
    pub commands: Vec<ServiceDefinition>,
    /// Test definitions.
    pub tests: Vec<ServiceDefinition>,
}

impl Manifest {
    /// Parses a manifest document.
    ///
    /// # Errors
    ///
    /// Returns a serialization or configuration error for malformed input.
    pub fn parse(content: &str, format: ManifestFormat) -> Result<Self> {
        match format {
            ManifestFormat::Json => Ok(serde_json::from_str(content)?),
            ManifestFormat::Yaml => serde_yaml::from_str(content).map_err(|e| KestrelError::Config {
                message: format!("invalid manifest: {e}"),
            }),
        }
    }

    /// Reads and parses a manifest file.
    ///
    /// # Errors
    ///
    /// Returns an I/O error if the file cannot be read, or a parse error.
    pub async fn read(path: &Path) -> Result<Self> {
        tracing::info!(path = %path.display(), "loading manifest");
        let content = tokio::fs::read_to_string(path)
            .await
            .map_err(|source| KestrelError::Io {
                path: path.to_path_buf(),
                source,
            })?;
        Self::parse(&content, ManifestFormat::from_path(path))
    }

    /// Number of definitions across all sections.
    #[must_use]
    pub fn len(&self) -> usize {
        self.services.len() + self.commands.len() + self.tests.len()
    }

    /// Whether every section is empty.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Every definition with its origin set from its section.
    pub fn definitions(self) -> impl Iterator<Item = ServiceDefinition> {
        let tag = |origin: Origin| move |definition: ServiceDefinition| definition.origin(origin);
        self.services
            .into_iter()
            .map(tag(Origin::Service))
            .chain(self.commands.into_iter().map(tag(Origin::Command)))
            .chain(self.tests.into_iter().map(tag(Origin::Test)))
    }

    /// Registers every definition in order, stopping at the first failure.
    ///
    /// # Errors
    ///
    /// Returns the first registration failure; definitions before it stay
    /// registered.
    pub async fn register(self, container: &mut Container) -> Result<Vec<Registration>> {
        let mut registrations = Vec::with_capacity(self.len());
        for definition in self.definitions() {
            registrations.push(container.add(definition).await?);
        }
        Ok(registrations)
    }
}
