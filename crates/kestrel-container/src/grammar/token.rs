//! Parsed form of a dependency reference.

use std::fmt;

use kestrel_common::types::DependencyKind;

/// A dependency reference after parsing.
///
/// Produced once per argument at registration time and never re-parsed.
#[derive(Debug, Clone, PartialEq)]
pub enum Dependency {
    /// `config::<name>[><prop>]`
    Config {
        /// Dotted path into the config directory.
        name: String,
        /// Dotted property path to extract, empty for the whole document.
        prop: String,
    },
    /// `environment::<prop>`
    Environment {
        /// Key (or dotted path) in the loaded environment.
        prop: String,
    },
    /// `factory::<name>`
    Factory {
        /// Dotted path into the factory directory.
        name: String,
    },
    /// `helper::<name>[><prop>]`
    Helper {
        /// Dotted path into the helper directory.
        name: String,
        /// Dotted property path to extract, empty for the whole value.
        prop: String,
    },
    /// `service::<service>[:class]`
    Service {
        /// Identifier of the referenced descriptor.
        service: String,
        /// Inject the class itself rather than an instance.
        inject_class: bool,
    },
    /// Any argument that is not a reference; injected unchanged.
    Static(serde_json::Value),
}

impl Dependency {
    /// Reference category, or `None` for static values.
    #[must_use]
    pub const fn kind(&self) -> Option<DependencyKind> {
        match self {
            Self::Config { .. } => Some(DependencyKind::Config),
            Self::Environment { .. } => Some(DependencyKind::Environment),
            Self::Factory { .. } => Some(DependencyKind::Factory),
            Self::Helper { .. } => Some(DependencyKind::Helper),
            Self::Service { .. } => Some(DependencyKind::Service),
            Self::Static(_) => None,
        }
    }

    /// Identifier of the referenced service, if this is a service reference.
    #[must_use]
    pub fn service(&self) -> Option<&str> {
        match self {
            Self::Service { service, .. } => Some(service),
            _ => None,
        }
    }
}

impl fmt::Display for Dependency {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Config { name, prop } | Self::Helper { name, prop } => {
                let kind = self.kind().map_or("", DependencyKind::as_str);
                write!(f, "{kind}::{name}")?;
                if !prop.is_empty() {
                    write!(f, ">{prop}")?;
                }
                Ok(())
            }
            Self::Environment { prop } => write!(f, "environment::{prop}"),
            Self::Factory { name } => write!(f, "factory::{name}"),
            Self::Service {
                service,
                inject_class,
            } => {
                write!(f, "service::{service}")?;
                if *inject_class {
                    f.write_str(":class")?;
                }
                Ok(())
            }
            Self::Static(serde_json::Value::String(s)) => f.write_str(s),
            Self::Static(value) => write!(f, "{value}"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn display_renders_canonical_reference() {
        let dep = Dependency::Config {
            name: "db".into(),
            prop: "host".into(),
        };
        assert_eq!(dep.to_string(), "config::db>host");

        let dep = Dependency::Helper {
            name: "fmt.date".into(),
            prop: String::new(),
        };
        assert_eq!(dep.to_string(), "helper::fmt.date");

        let dep = Dependency::Service {
            service: "db.pool".into(),
            inject_class: true,
        };
        assert_eq!(dep.to_string(), "service::db.pool:class");
    }

    #[test]
    fn static_display_is_raw() {
        assert_eq!(Dependency::Static("plain".into()).to_string(), "plain");
        assert_eq!(Dependency::Static(serde_json::json!(42)).to_string(), "42");
    }

    #[test]
    fn kind_is_none_for_static() {
        assert_eq!(Dependency::Static(serde_json::Value::Null).kind(), None);
        assert_eq!(
            Dependency::Factory { name: "x".into() }.kind(),
            Some(DependencyKind::Factory)
        );
    }
}
