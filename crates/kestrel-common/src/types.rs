//! Domain primitive types used across the Kestrel workspace.

use std::fmt;

use serde::{Deserialize, Serialize};

/// Unique key naming a stored service descriptor (`namespace.name`).
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct Identifier(String);

impl Identifier {
    /// Creates an identifier from an already joined string.
    #[must_use]
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    /// Joins an optional namespace and a name with a dot.
    ///
    /// An empty namespace is treated as absent.
    #[must_use]
    pub fn from_parts(namespace: Option<&str>, name: &str) -> Self {
        match namespace {
            Some(ns) if !ns.is_empty() => Self(format!("{ns}.{name}")),
            _ => Self(name.to_owned()),
        }
    }

    /// Returns the inner string representation.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for Identifier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl AsRef<str> for Identifier {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

/// Resource category, each mapped to its own root directory.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Category {
    /// Executable commands.
    Command,
    /// Static configuration documents.
    Config,
    /// Environment definitions.
    Environment,
    /// Factories injected as constructors.
    Factory,
    /// Helper modules.
    Helper,
    /// Regular services.
    Service,
    /// Runnable tests.
    Test,
}

impl Category {
    /// Every category, in declaration order.
    pub const ALL: [Self; 7] = [
        Self::Command,
        Self::Config,
        Self::Environment,
        Self::Factory,
        Self::Helper,
        Self::Service,
        Self::Test,
    ];

    /// Lowercase name used in reference strings and messages.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Command => "command",
            Self::Config => "config",
            Self::Environment => "environment",
            Self::Factory => "factory",
            Self::Helper => "helper",
            Self::Service => "service",
            Self::Test => "test",
        }
    }
}

impl fmt::Display for Category {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Registration origin of a descriptor; selects its module directory.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Origin {
    /// Registered through `add_service`.
    #[default]
    Service,
    /// Registered through `add_command`.
    Command,
    /// Registered through `add_test`.
    Test,
}

impl Origin {
    /// Category whose directory holds modules of this origin.
    #[must_use]
    pub const fn category(self) -> Category {
        match self {
            Self::Service => Category::Service,
            Self::Command => Category::Command,
            Self::Test => Category::Test,
        }
    }
}

impl fmt::Display for Origin {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.category().as_str())
    }
}

/// Category of a dependency reference (`<kind>::<body>`).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DependencyKind {
    /// `config::<path>[><prop>]`
    Config,
    /// `environment::<prop>`
    Environment,
    /// `factory::<path>`
    Factory,
    /// `helper::<path>[><prop>]`
    Helper,
    /// `service::<path>[:class]`
    Service,
}

impl DependencyKind {
    /// Lowercase keyword as written in reference strings.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Config => "config",
            Self::Environment => "environment",
            Self::Factory => "factory",
            Self::Helper => "helper",
            Self::Service => "service",
        }
    }

    /// Directory category the referenced module lives in.
    #[must_use]
    pub const fn category(self) -> Category {
        match self {
            Self::Config => Category::Config,
            Self::Environment => Category::Environment,
            Self::Factory => Category::Factory,
            Self::Helper => Category::Helper,
            Self::Service => Category::Service,
        }
    }
}

impl fmt::Display for DependencyKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn identifier_joins_namespace() {
        assert_eq!(Identifier::from_parts(Some("db"), "pool").as_str(), "db.pool");
    }

    #[test]
    fn identifier_skips_empty_namespace() {
        assert_eq!(Identifier::from_parts(Some(""), "pool").as_str(), "pool");
        assert_eq!(Identifier::from_parts(None, "pool").as_str(), "pool");
    }

    #[test]
    fn origin_maps_to_category() {
        assert_eq!(Origin::Service.category(), Category::Service);
        assert_eq!(Origin::Command.category(), Category::Command);
        assert_eq!(Origin::Test.category(), Category::Test);
    }

    #[test]
    fn category_serializes_lowercase() {
        let json = serde_json::to_string(&Category::Factory).expect("serialize");
        assert_eq!(json, "\"factory\"");
    }
}
