//! Unified error types for the Kestrel workspace.
//!
//! Every failure in registration, resolution, and environment loading is a
//! variant of [`KestrelError`]. Wrapping variants ([`KestrelError::Context`],
//! [`KestrelError::Dependency`]) add call-site context while unwinding and
//! keep the original error as their source; [`KestrelError::root_cause`]
//! strips them again.

use std::path::PathBuf;

use thiserror::Error;

use crate::types::{Category, DependencyKind};

/// Top-level error type shared across the workspace.
#[derive(Debug, Error)]
pub enum KestrelError {
    /// A dependency reference string has a malformed body.
    #[error("invalid {kind} dependency '{input}'")]
    InvalidDependency {
        /// Category named by the reference.
        kind: DependencyKind,
        /// The offending reference, verbatim.
        input: String,
    },

    /// Another descriptor already uses this identifier or alias.
    #[error("another service '{identifier}' is already set")]
    DuplicateIdentifier {
        /// The clashing key.
        identifier: String,
    },

    /// No descriptor is registered under this key.
    #[error("service '{identifier}' not found")]
    ServiceNotFound {
        /// The requested key.
        identifier: String,
    },

    /// Resolution re-entered a descriptor that is still being resolved.
    #[error("cyclic dependency detected ({})", .chain.join(" -> "))]
    CyclicDependency {
        /// Identifiers on the active resolution path, outermost first.
        chain: Vec<String>,
    },

    /// A non-instance descriptor loaded a value that cannot be constructed.
    #[error("service '{identifier}' loaded from '{}' is not a class", .path.display())]
    NotAClass {
        /// Descriptor identifier.
        identifier: String,
        /// Path the value was loaded from.
        path: PathBuf,
    },

    /// A property path did not match the resolved value.
    #[error("property '{property}' not found in object (path '{path}')")]
    PropertyNotFound {
        /// First missing segment.
        property: String,
        /// Full requested path.
        path: String,
    },

    /// A declared setter does not exist on the constructed instance.
    #[error("setter method '{method}' not found in service '{service}' instance")]
    SetterNotFound {
        /// Setter name.
        method: String,
        /// Descriptor name.
        service: String,
    },

    /// The declared after hook does not exist on the constructed instance.
    #[error("after method '{method}' not found in service '{service}' instance")]
    AfterHookNotFound {
        /// Hook name.
        method: String,
        /// Descriptor name.
        service: String,
    },

    /// A setter name is private or not a valid method identifier.
    #[error("invalid dependency '{service}' {reason} '{method}'")]
    InvalidSetter {
        /// Descriptor name.
        service: String,
        /// Rejected method name.
        method: String,
        /// `private method` or `method`.
        reason: &'static str,
    },

    /// A descriptor has neither a name nor an autowire-derivable one.
    #[error("trying to add a service without a name: {descriptor}")]
    MissingName {
        /// Debug rendering of the rejected definition.
        descriptor: String,
    },

    /// An operation requires a loaded environment.
    #[error("environment is not loaded")]
    EnvironmentNotLoaded,

    /// The environment was already loaded once.
    #[error("environment already loaded (current '{current}', requested '{requested}')")]
    EnvironmentAlreadyLoaded {
        /// Name of the loaded environment.
        current: String,
        /// Name passed to the rejected call.
        requested: String,
    },

    /// The module loader could not produce a value for a path.
    #[error("can't load {category} '{name}' using path '{}': {source}", .path.display())]
    Load {
        /// Category of the module.
        category: Category,
        /// Declared dotted name.
        name: String,
        /// Resolved path.
        path: PathBuf,
        /// Underlying loader failure.
        source: Box<KestrelError>,
    },

    /// Resolving one dependency of a descriptor failed.
    #[error("service '{identifier}' failed to resolve dependency '{dependency}': {source}")]
    Dependency {
        /// Descriptor being resolved.
        identifier: String,
        /// Rendered dependency reference.
        dependency: String,
        /// Underlying failure.
        source: Box<KestrelError>,
    },

    /// An error re-tagged with the component and operation it escaped from.
    #[error("({component}.{operation}) {source}")]
    Context {
        /// Component name, e.g. `Kestrel`.
        component: &'static str,
        /// Operation name, e.g. `get_service`.
        operation: String,
        /// Underlying failure.
        source: Box<KestrelError>,
    },

    /// Argument validation rejected a public call.
    #[error("{message}")]
    Validation {
        /// Description of the rejected argument.
        message: String,
    },

    /// The resolved instance cannot be executed as a command or test.
    #[error("'{identifier}' is not executable")]
    NotExecutable {
        /// Key the instance was resolved from.
        identifier: String,
    },

    /// A user component reported a failure.
    #[error("{message}")]
    Component {
        /// Component-provided description.
        message: String,
    },

    /// A required resource was not found.
    #[error("{kind} not found: {id}")]
    NotFound {
        /// Type of the missing resource.
        kind: &'static str,
        /// Identifier of the missing resource.
        id: String,
    },

    /// A configuration value is invalid.
    #[error("invalid configuration: {message}")]
    Config {
        /// Description of the invalid configuration.
        message: String,
    },

    /// An I/O operation failed.
    #[error("I/O error at {}: {source}", .path.display())]
    Io {
        /// Path where the I/O error occurred.
        path: PathBuf,
        /// Underlying I/O error.
        source: std::io::Error,
    },

    /// Serialization or deserialization failed.
    #[error("serialization error: {source}")]
    Serialization {
        /// Underlying serialization error.
        #[from]
        source: serde_json::Error,
    },
}

impl KestrelError {
    /// Creates a component failure from any message.
    pub fn component(message: impl Into<String>) -> Self {
        Self::Component {
            message: message.into(),
        }
    }

    /// Creates a validation failure from any message.
    pub fn validation(message: impl Into<String>) -> Self {
        Self::Validation {
            message: message.into(),
        }
    }

    /// Wraps `self` with the component and operation it escaped from.
    #[must_use]
    pub fn context(self, component: &'static str, operation: impl Into<String>) -> Self {
        Self::Context {
            component,
            operation: operation.into(),
            source: Box::new(self),
        }
    }

    /// Returns the innermost error below any context layers.
    ///
    /// [`Context`](Self::Context) and [`Dependency`](Self::Dependency)
    /// wrappers are stripped; every other variant is returned as is.
    #[must_use]
    pub fn root_cause(&self) -> &Self {
        let mut current = self;
        while let Self::Context { source, .. } | Self::Dependency { source, .. } = current {
            current = &**source;
        }
        current
    }
}

/// Convenience alias used throughout the workspace.
pub type Result<T> = std::result::Result<T, KestrelError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn cyclic_message_lists_chain() {
        let err = KestrelError::CyclicDependency {
            chain: vec!["a".into(), "b".into()],
        };
        assert_eq!(err.to_string(), "cyclic dependency detected (a -> b)");
    }

    #[test]
    fn context_keeps_original_message() {
        let err = KestrelError::ServiceNotFound {
            identifier: "db".into(),
        }
        .context("Kestrel", "get_service");
        assert_eq!(err.to_string(), "(Kestrel.get_service) service 'db' not found");
    }

    #[test]
    fn root_cause_strips_wrappers() {
        let err = KestrelError::Dependency {
            identifier: "api".into(),
            dependency: "service::db".into(),
            source: Box::new(KestrelError::EnvironmentNotLoaded),
        }
        .context("Kestrel", "get_service");
        assert!(matches!(err.root_cause(), KestrelError::EnvironmentNotLoaded));
    }

    #[test]
    fn root_cause_keeps_load_errors() {
        let err = KestrelError::Load {
            category: Category::Service,
            name: "db".into(),
            path: PathBuf::from("/app/services/db"),
            source: Box::new(KestrelError::NotFound {
                kind: "module",
                id: "/app/services/db".into(),
            }),
        };
        assert!(matches!(err.root_cause(), KestrelError::Load { .. }));
        assert!(err.to_string().contains("/app/services/db"));
    }

    #[test]
    fn invalid_dependency_names_input() {
        let err = KestrelError::InvalidDependency {
            kind: DependencyKind::Config,
            input: "..bad".into(),
        };
        assert_eq!(err.to_string(), "invalid config dependency '..bad'");
    }
}
