//! Service definitions and their registration lifecycle.
//!
//! A [`ServiceDefinition`] is what callers hand in. Registration turns it
//! into a [`ServiceEntry`] owned by the registry:
//!
//! 1. the module path is formatted once from `path` or `namespace.name`,
//! 2. autowired classes are loaded and their metadata applied,
//! 3. every DI argument is parsed into a [`Dependency`],
//! 4. the identifier (and alias) is generated.

use std::path::{Path, PathBuf};
use std::sync::OnceLock;

use indexmap::IndexMap;
use kestrel_common::constants::PRIVATE_PREFIX;
use kestrel_common::error::{KestrelError, Result};
use kestrel_common::types::{Identifier, Origin};
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::grammar::{self, token::Dependency};
use crate::value::{ClassMetadata, Injectable, Loaded};

/// Declared dependencies of a service.
///
/// String arguments are dependency references; any other JSON value is
/// passed to the constructor or setter unchanged.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DiSpec {
    /// Constructor arguments, left to right.
    pub constructor: Vec<Value>,
    /// Setter methods and their arguments, in declaration order.
    pub setters: IndexMap<String, Vec<Value>>,
    /// Zero-argument method called after all setters.
    pub after: Option<String>,
}

impl DiSpec {
    /// Creates an empty spec.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Appends a constructor argument.
    #[must_use]
    pub fn arg(mut self, argument: impl Into<Value>) -> Self {
        self.constructor.push(argument.into());
        self
    }

    /// Declares a setter call; later declarations of the same name replace
    /// the arguments but keep the original position.
    #[must_use]
    pub fn setter<I, V>(mut self, method: impl Into<String>, arguments: I) -> Self
    where
        I: IntoIterator<Item = V>,
        V: Into<Value>,
    {
        let _ = self.setters.insert(
            method.into(),
            arguments.into_iter().map(Into::into).collect(),
        );
        self
    }

    /// Declares the after hook.
    #[must_use]
    pub fn after(mut self, method: impl Into<String>) -> Self {
        self.after = Some(method.into());
        self
    }
}

/// Registration input for one component.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ServiceDefinition {
    /// Component name.
    pub name: Option<String>,
    /// Optional dotted namespace prefixed to the name.
    pub namespace: Option<String>,
    /// Secondary lookup key.
    pub alias: Option<String>,
    /// Dotted module path overriding `namespace.name` for loading.
    pub path: Option<String>,
    /// Directory category the module path is resolved against.
    pub origin: Origin,
    /// Load the class at registration and read metadata off it.
    pub autowire: bool,
    /// The module is a ready-made value, never constructed.
    pub is_instance: bool,
    /// Cache the first constructed instance.
    pub singleton: bool,
    /// Declared dependencies.
    pub di: Option<DiSpec>,
}

impl ServiceDefinition {
    /// Starts a definition with a name.
    #[must_use]
    pub fn named(name: impl Into<String>) -> Self {
        Self {
            name: Some(name.into()),
            ..Self::default()
        }
    }

    /// Starts an autowired definition located by its dotted module path.
    #[must_use]
    pub fn autowired(path: impl Into<String>) -> Self {
        Self {
            path: Some(path.into()),
            autowire: true,
            ..Self::default()
        }
    }

    /// Sets the namespace.
    #[must_use]
    pub fn namespace(mut self, namespace: impl Into<String>) -> Self {
        self.namespace = Some(namespace.into());
        self
    }

    /// Sets the alias.
    #[must_use]
    pub fn alias(mut self, alias: impl Into<String>) -> Self {
        self.alias = Some(alias.into());
        self
    }

    /// Sets the origin.
    #[must_use]
    pub const fn origin(mut self, origin: Origin) -> Self {
        self.origin = origin;
        self
    }

    /// Marks the definition as a singleton.
    #[must_use]
    pub const fn singleton(mut self) -> Self {
        self.singleton = true;
        self
    }

    /// Marks the module as a ready-made instance.
    #[must_use]
    pub const fn instance(mut self) -> Self {
        self.is_instance = true;
        self
    }

    /// Sets the declared dependencies.
    #[must_use]
    pub fn di(mut self, di: DiSpec) -> Self {
        self.di = Some(di);
        self
    }
}

/// [`DiSpec`] with every argument parsed.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct FormattedDi {
    /// Constructor dependencies, left to right.
    pub constructor: Vec<Dependency>,
    /// Setter dependencies, in declaration order.
    pub setters: Vec<(String, Vec<Dependency>)>,
    /// After hook name, passed through unresolved.
    pub after: Option<String>,
}

impl FormattedDi {
    /// Every dependency in resolution order.
    pub fn dependencies(&self) -> impl Iterator<Item = &Dependency> {
        self.constructor
            .iter()
            .chain(self.setters.iter().flat_map(|(_, deps)| deps.iter()))
    }
}

/// [`FormattedDi`] with every dependency replaced by its value.
///
/// Built fresh on every resolution pass and never stored.
#[derive(Debug, Default)]
pub struct ResolvedDi {
    /// Constructor arguments.
    pub constructor: Vec<Injectable>,
    /// Setter calls in declaration order.
    pub setters: Vec<(String, Vec<Injectable>)>,
    /// After hook name.
    pub after: Option<String>,
}

/// A stored descriptor, owned by the registry.
#[derive(Debug)]
pub struct ServiceEntry {
    /// Unique key.
    pub identifier: Identifier,
    /// Secondary key.
    pub alias: Option<String>,
    /// Declared or autowired name.
    pub name: String,
    /// Declared or autowired namespace.
    pub namespace: Option<String>,
    /// Directory category.
    pub origin: Origin,
    /// Module path, formatted once at registration.
    pub path: PathBuf,
    /// The module is a ready-made value.
    pub is_instance: bool,
    /// Instances are cached.
    pub singleton: bool,
    /// Parsed dependencies.
    pub di: FormattedDi,
    pub(crate) class: OnceLock<Loaded>,
    pub(crate) instance: tokio::sync::OnceCell<Injectable>,
}

impl ServiceEntry {
    /// The loaded class or value, once loaded.
    #[must_use]
    pub fn class(&self) -> Option<&Loaded> {
        self.class.get()
    }

    /// The cached singleton instance, once constructed.
    #[must_use]
    pub fn cached_instance(&self) -> Option<&Injectable> {
        self.instance.get()
    }

    /// Read-back summary of this entry.
    #[must_use]
    pub fn registration(&self) -> Registration {
        Registration {
            identifier: self.identifier.clone(),
            alias: self.alias.clone(),
            origin: self.origin,
            path: self.path.clone(),
        }
    }
}

/// What registration returns to callers.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Registration {
    /// Generated identifier.
    pub identifier: Identifier,
    /// Alias, when one was declared or generated.
    pub alias: Option<String>,
    /// Directory category.
    pub origin: Origin,
    /// Module path.
    pub path: PathBuf,
}

/// Formats the module path of a definition under `directory`.
///
/// `path` wins over `namespace.name`; dots become path separators.
///
/// # Errors
///
/// Returns [`KestrelError::MissingName`] when neither a name nor a path is
/// declared, since there is nothing to locate the module by.
pub fn format_path(definition: &ServiceDefinition, directory: &Path) -> Result<PathBuf> {
    let dotted = match (&definition.path, &definition.name) {
        (Some(path), _) => path.clone(),
        (None, Some(name)) => Identifier::from_parts(definition.namespace.as_deref(), name)
            .as_str()
            .to_owned(),
        (None, None) => {
            return Err(KestrelError::MissingName {
                descriptor: format!("{definition:?}"),
            });
        }
    };
    Ok(module_path(directory, &dotted))
}

/// Joins a dotted module name onto a directory.
#[must_use]
pub fn module_path(directory: &Path, dotted: &str) -> PathBuf {
    dotted
        .split('.')
        .filter(|segment| !segment.is_empty())
        .fold(directory.to_path_buf(), |path, segment| path.join(segment))
}

/// Fills missing definition fields from autowire metadata.
///
/// Name and namespace are taken together, and only when no name was
/// declared. The DI spec is taken only when none was declared. A singleton
/// flag in the metadata always wins.
pub fn apply_metadata(definition: &mut ServiceDefinition, metadata: &ClassMetadata) {
    if definition.name.is_none() {
        definition.name.clone_from(&metadata.name);
        definition.namespace.clone_from(&metadata.namespace);
    }
    if definition.di.is_none() {
        definition.di.clone_from(&metadata.di);
    }
    if metadata.singleton {
        definition.singleton = true;
    }
}

/// Rejects private or malformed setter method names.
///
/// # Errors
///
/// Returns [`KestrelError::InvalidSetter`].
pub fn validate_setter(service: &str, method: &str) -> Result<()> {
    let reject = |reason| KestrelError::InvalidSetter {
        service: service.to_owned(),
        method: method.to_owned(),
        reason,
    };
    if method.starts_with(PRIVATE_PREFIX) {
        return Err(reject("private method"));
    }
    let mut chars = method.chars();
    let valid = chars.next().is_some_and(|c| c.is_ascii_alphabetic())
        && chars.all(|c| c.is_ascii_alphanumeric() || c == '_');
    if !valid {
        return Err(reject("method"));
    }
    Ok(())
}

/// Parses every argument of a DI spec.
///
/// # Errors
///
/// Returns the first setter-name or reference parse failure.
pub fn format_di(service: &str, di: Option<&DiSpec>) -> Result<FormattedDi> {
    let Some(di) = di else {
        return Ok(FormattedDi::default());
    };
    let constructor = di
        .constructor
        .iter()
        .map(grammar::format_argument)
        .collect::<Result<Vec<_>>>()?;
    let mut setters = Vec::with_capacity(di.setters.len());
    for (method, arguments) in &di.setters {
        validate_setter(service, method)?;
        let dependencies = arguments
            .iter()
            .map(grammar::format_argument)
            .collect::<Result<Vec<_>>>()?;
        setters.push((method.clone(), dependencies));
    }
    Ok(FormattedDi {
        constructor,
        setters,
        after: di.after.clone(),
    })
}

/// Generates the identifier and alias of a named definition.
///
/// Services are keyed by `namespace.name`. Commands and tests get a random
/// internal identifier and keep `namespace.name` (or their declared alias)
/// as the public alias.
#[must_use]
pub fn generate_identifier(definition: &ServiceDefinition, name: &str) -> (Identifier, Option<String>) {
    let public = Identifier::from_parts(definition.namespace.as_deref(), name);
    match definition.origin {
        Origin::Service => (public, definition.alias.clone()),
        Origin::Command | Origin::Test => {
            let internal = Identifier::new(format!(
                "{}.{}",
                definition.origin,
                uuid::Uuid::new_v4().simple()
            ));
            let alias = definition
                .alias
                .clone()
                .unwrap_or_else(|| public.as_str().to_owned());
            (internal, Some(alias))
        }
    }
}

/// Checks that a loaded module fits the descriptor.
///
/// # Errors
///
/// Returns [`KestrelError::NotAClass`] when a non-instance descriptor
/// loaded a plain value.
pub fn check_loaded(identifier: &str, path: &Path, is_instance: bool, loaded: &Loaded) -> Result<()> {
    if !is_instance && matches!(loaded, Loaded::Value(_)) {
        return Err(KestrelError::NotAClass {
            identifier: identifier.to_owned(),
            path: path.to_path_buf(),
        });
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    #[test]
    fn format_path_from_namespace_and_name() {
        let definition = ServiceDefinition::named("pool").namespace("db.sql");
        let path = format_path(&definition, Path::new("/app/services")).expect("path");
        assert_eq!(path, Path::new("/app/services/db/sql/pool"));
    }

    #[test]
    fn format_path_prefers_explicit_path() {
        let mut definition = ServiceDefinition::named("pool");
        definition.path = Some("legacy.pool_v1".into());
        let path = format_path(&definition, Path::new("/app/services")).expect("path");
        assert_eq!(path, Path::new("/app/services/legacy/pool_v1"));
    }

    #[test]
    fn format_path_without_name_or_path_fails() {
        let err = format_path(&ServiceDefinition::default(), Path::new("/app"))
            .expect_err("missing name");
        assert!(matches!(err, KestrelError::MissingName { .. }));
    }

    #[test]
    fn metadata_fills_missing_fields_only() {
        let mut definition = ServiceDefinition::autowired("db.pool");
        let metadata = ClassMetadata {
            name: Some("pool".into()),
            namespace: Some("db".into()),
            di: Some(DiSpec::new().arg("config::db")),
            singleton: true,
        };
        apply_metadata(&mut definition, &metadata);
        assert_eq!(definition.name.as_deref(), Some("pool"));
        assert_eq!(definition.namespace.as_deref(), Some("db"));
        assert_eq!(definition.di, metadata.di);
        assert!(definition.singleton);

        let mut declared = ServiceDefinition::named("custom").di(DiSpec::new());
        apply_metadata(&mut declared, &metadata);
        assert_eq!(declared.name.as_deref(), Some("custom"));
        assert_eq!(declared.namespace, None);
        assert_eq!(declared.di, Some(DiSpec::new()));
    }

    #[test]
    fn setter_names_are_validated() {
        assert!(validate_setter("svc", "setLogger").is_ok());
        assert!(validate_setter("svc", "set_logger2").is_ok());

        let err = validate_setter("svc", "_secret").expect_err("private");
        assert!(err.to_string().contains("private method '_secret'"));

        for bad in ["2fast", "set-logger", "", "set logger"] {
            let err = validate_setter("svc", bad).expect_err(bad);
            assert!(matches!(err, KestrelError::InvalidSetter { reason: "method", .. }));
        }
    }

    #[test]
    fn format_di_keeps_setter_order() {
        let di = DiSpec::new()
            .arg("service::db")
            .arg(json!(3))
            .setter("zeta", ["environment::Z"])
            .setter("alpha", ["helper::fmt>date"])
            .after("init");
        let formatted = format_di("svc", Some(&di)).expect("format");
        assert_eq!(formatted.constructor.len(), 2);
        assert_eq!(formatted.constructor[1], Dependency::Static(json!(3)));
        let methods: Vec<&str> = formatted.setters.iter().map(|(m, _)| m.as_str()).collect();
        assert_eq!(methods, vec!["zeta", "alpha"]);
        assert_eq!(formatted.after.as_deref(), Some("init"));
        assert_eq!(formatted.dependencies().count(), 4);
    }

    #[test]
    fn format_di_propagates_parse_errors() {
        let di = DiSpec::new().arg("service::..db");
        assert!(matches!(
            format_di("svc", Some(&di)),
            Err(KestrelError::InvalidDependency { .. })
        ));
    }

    #[test]
    fn service_identifier_is_namespace_and_name() {
        let definition = ServiceDefinition::named("pool").namespace("db").alias("pool");
        let (identifier, alias) = generate_identifier(&definition, "pool");
        assert_eq!(identifier.as_str(), "db.pool");
        assert_eq!(alias.as_deref(), Some("pool"));
    }

    #[test]
    fn command_identifier_is_random_with_public_alias() {
        let definition = ServiceDefinition::named("migrate")
            .namespace("db")
            .origin(Origin::Command);
        let (first, alias) = generate_identifier(&definition, "migrate");
        let (second, _) = generate_identifier(&definition, "migrate");
        assert!(first.as_str().starts_with("command."));
        assert_ne!(first, second);
        assert_eq!(alias.as_deref(), Some("db.migrate"));
    }

    #[test]
    fn definition_deserializes_from_json() {
        let definition: ServiceDefinition = serde_json::from_value(json!({
            "name": "api",
            "singleton": true,
            "di": {
                "constructor": ["service::db", 8080],
                "setters": { "setLogger": ["service::logger"] },
                "after": "init"
            }
        }))
        .expect("deserialize");
        assert_eq!(definition.name.as_deref(), Some("api"));
        assert_eq!(definition.origin, Origin::Service);
        let di = definition.di.expect("di");
        assert_eq!(di.constructor, vec![json!("service::db"), json!(8080)]);
        assert_eq!(di.after.as_deref(), Some("init"));
    }
}
