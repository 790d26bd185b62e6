//! Runtime values that flow through injection.
//!
//! Three kinds of value can be injected: plain data (configs, environment
//! values, static arguments), constructed component instances, and classes
//! (constructors). Classes report their own registration metadata through
//! [`Class::metadata`], which is how autowiring works without reflection.

use std::any::Any;
use std::fmt;
use std::marker::PhantomData;
use std::sync::Arc;

use async_trait::async_trait;
use kestrel_common::error::{KestrelError, Result};
use serde_json::Value;

use crate::descriptor::DiSpec;

/// Erases a shared component into `Any` for downcasting.
pub trait IntoAny: Any + Send + Sync {
    /// Converts a shared handle into a shared `Any`.
    fn into_any(self: Arc<Self>) -> Arc<dyn Any + Send + Sync>;
}

impl<T: Any + Send + Sync> IntoAny for T {
    fn into_any(self: Arc<Self>) -> Arc<dyn Any + Send + Sync> {
        self
    }
}

/// Outcome of a named method call on a component.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Invocation {
    /// The component has the method and ran it.
    Handled,
    /// The component has no method by that name.
    Unknown,
}

/// A constructed object managed by the container.
///
/// Setters and the after hook are dispatched by name through
/// [`invoke`](Self::invoke) while the instance is still exclusively owned,
/// before it is shared or cached.
#[async_trait]
pub trait Component: IntoAny {
    /// Calls the method `method` with resolved arguments.
    ///
    /// Returns [`Invocation::Unknown`] when the component has no such method.
    ///
    /// # Errors
    ///
    /// Returns any failure raised by the method itself.
    async fn invoke(&mut self, method: &str, args: Vec<Injectable>) -> Result<Invocation> {
        let _ = (method, args);
        Ok(Invocation::Unknown)
    }

    /// Runs the component as a command or test.
    ///
    /// # Errors
    ///
    /// The default implementation reports the component as not executable.
    async fn execute(&self, argv: Vec<String>) -> Result<Injectable> {
        let _ = argv;
        Err(KestrelError::NotExecutable {
            identifier: std::any::type_name::<Self>().to_owned(),
        })
    }
}

/// Registration metadata a class can report about itself.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ClassMetadata {
    /// Descriptor name.
    pub name: Option<String>,
    /// Descriptor namespace.
    pub namespace: Option<String>,
    /// Declared dependencies.
    pub di: Option<DiSpec>,
    /// Whether instances are cached.
    pub singleton: bool,
}

/// A constructor the container can instantiate.
#[async_trait]
pub trait Class: Send + Sync {
    /// Metadata used when the descriptor is autowired.
    fn metadata(&self) -> ClassMetadata {
        ClassMetadata::default()
    }

    /// Creates a new instance from resolved constructor arguments.
    ///
    /// # Errors
    ///
    /// Returns any failure raised while building the instance.
    async fn construct(&self, args: Vec<Injectable>) -> Result<Box<dyn Component>>;
}

type Constructor = dyn Fn(Vec<Injectable>) -> Result<Box<dyn Component>> + Send + Sync;

/// A class backed by a plain constructor closure.
pub struct FnClass {
    metadata: ClassMetadata,
    constructor: Box<Constructor>,
}

impl FnClass {
    /// Wraps a constructor closure.
    pub fn new<F>(constructor: F) -> Self
    where
        F: Fn(Vec<Injectable>) -> Result<Box<dyn Component>> + Send + Sync + 'static,
    {
        Self {
            metadata: ClassMetadata::default(),
            constructor: Box::new(constructor),
        }
    }

    /// Attaches autowire metadata.
    #[must_use]
    pub fn with_metadata(mut self, metadata: ClassMetadata) -> Self {
        self.metadata = metadata;
        self
    }

    /// Converts into a shareable class handle.
    #[must_use]
    pub fn shared(self) -> Arc<dyn Class> {
        Arc::new(self)
    }
}

impl fmt::Debug for FnClass {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FnClass")
            .field("metadata", &self.metadata)
            .finish_non_exhaustive()
    }
}

#[async_trait]
impl Class for FnClass {
    fn metadata(&self) -> ClassMetadata {
        self.metadata.clone()
    }

    async fn construct(&self, args: Vec<Injectable>) -> Result<Box<dyn Component>> {
        (self.constructor)(args)
    }
}

/// A component type that declares its own registration metadata.
pub trait Autowired: Component + Sized {
    /// Name, namespace, dependencies, and lifetime of the type.
    fn metadata() -> ClassMetadata;

    /// Builds the component from resolved constructor arguments.
    ///
    /// # Errors
    ///
    /// Returns any failure raised while building the instance.
    fn build(args: Vec<Injectable>) -> Result<Self>;
}

/// Class adapter for an [`Autowired`] type.
pub struct AutowiredClass<T>(PhantomData<fn() -> T>);

impl<T: Autowired> AutowiredClass<T> {
    /// Creates a shareable class handle for `T`.
    #[must_use]
    pub fn shared() -> Arc<dyn Class> {
        Arc::new(Self(PhantomData))
    }
}

#[async_trait]
impl<T: Autowired> Class for AutowiredClass<T> {
    fn metadata(&self) -> ClassMetadata {
        T::metadata()
    }

    async fn construct(&self, args: Vec<Injectable>) -> Result<Box<dyn Component>> {
        Ok(Box::new(T::build(args)?))
    }
}

/// A value that can be passed to constructors and setters.
#[derive(Clone)]
pub enum Injectable {
    /// Plain data.
    Data(Value),
    /// A constructed component.
    Instance(Arc<dyn Component>),
    /// A class, injected instead of an instance.
    Class(Arc<dyn Class>),
}

impl Injectable {
    /// Returns the data payload, if any.
    #[must_use]
    pub const fn data(&self) -> Option<&Value> {
        match self {
            Self::Data(value) => Some(value),
            _ => None,
        }
    }

    /// Returns the payload as a string slice when it is string data.
    #[must_use]
    pub fn as_str(&self) -> Option<&str> {
        self.data().and_then(Value::as_str)
    }

    /// Returns the class handle, if any.
    #[must_use]
    pub const fn class(&self) -> Option<&Arc<dyn Class>> {
        match self {
            Self::Class(class) => Some(class),
            _ => None,
        }
    }

    /// Returns the shared instance, if any.
    #[must_use]
    pub const fn instance(&self) -> Option<&Arc<dyn Component>> {
        match self {
            Self::Instance(instance) => Some(instance),
            _ => None,
        }
    }

    /// Downcasts an instance to its concrete component type.
    #[must_use]
    pub fn downcast<T: Component>(&self) -> Option<Arc<T>> {
        self.instance()
            .and_then(|instance| Arc::clone(instance).into_any().downcast::<T>().ok())
    }

    /// Whether both values are the same shared instance or class.
    #[must_use]
    pub fn same_as(&self, other: &Self) -> bool {
        match (self, other) {
            (Self::Instance(a), Self::Instance(b)) => Arc::ptr_eq(a, b),
            (Self::Class(a), Self::Class(b)) => Arc::ptr_eq(a, b),
            (Self::Data(a), Self::Data(b)) => a == b,
            _ => false,
        }
    }

    /// Extracts a dotted property path from data.
    ///
    /// An empty path returns the value itself, whatever its kind.
    ///
    /// # Errors
    ///
    /// Returns [`KestrelError::PropertyNotFound`] when a segment is missing
    /// or the value is not data.
    pub fn extract(&self, prop: &str) -> Result<Self> {
        if prop.is_empty() {
            return Ok(self.clone());
        }
        match self {
            Self::Data(value) => extract_property(value, prop).map(Self::Data),
            _ => Err(KestrelError::PropertyNotFound {
                property: prop.split('.').next().unwrap_or(prop).to_owned(),
                path: prop.to_owned(),
            }),
        }
    }
}

impl fmt::Debug for Injectable {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Data(value) => f.debug_tuple("Data").field(value).finish(),
            Self::Instance(_) => f.write_str("Instance(..)"),
            Self::Class(_) => f.write_str("Class(..)"),
        }
    }
}

impl From<Value> for Injectable {
    fn from(value: Value) -> Self {
        Self::Data(value)
    }
}

impl From<&str> for Injectable {
    fn from(value: &str) -> Self {
        Self::Data(Value::String(value.to_owned()))
    }
}

/// What the module loader produces for a path.
#[derive(Clone)]
pub enum Loaded {
    /// A constructible class.
    Class(Arc<dyn Class>),
    /// A ready-made value.
    Value(Injectable),
}

impl Loaded {
    /// Converts into an injectable value, classes staying classes.
    #[must_use]
    pub fn into_injectable(self) -> Injectable {
        match self {
            Self::Class(class) => Injectable::Class(class),
            Self::Value(value) => value,
        }
    }
}

impl fmt::Debug for Loaded {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Class(_) => f.write_str("Class(..)"),
            Self::Value(value) => f.debug_tuple("Value").field(value).finish(),
        }
    }
}

impl From<Arc<dyn Class>> for Loaded {
    fn from(class: Arc<dyn Class>) -> Self {
        Self::Class(class)
    }
}

impl From<Value> for Loaded {
    fn from(value: Value) -> Self {
        Self::Value(Injectable::Data(value))
    }
}

/// Deep property lookup on plain data.
///
/// Objects are indexed by key, arrays by numeric segment. An empty path
/// returns the whole value.
///
/// # Errors
///
/// Returns [`KestrelError::PropertyNotFound`] naming the first missing segment.
pub fn extract_property(value: &Value, path: &str) -> Result<Value> {
    if path.is_empty() {
        return Ok(value.clone());
    }
    let mut current = value;
    for segment in path.split('.') {
        let next = match current {
            Value::Object(map) => map.get(segment),
            Value::Array(items) => segment.parse::<usize>().ok().and_then(|i| items.get(i)),
            _ => None,
        };
        current = next.ok_or_else(|| KestrelError::PropertyNotFound {
            property: segment.to_owned(),
            path: path.to_owned(),
        })?;
    }
    Ok(current.clone())
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    #[derive(Debug, Default)]
    struct Counter {
        hits: u32,
    }

    #[async_trait]
    impl Component for Counter {
        async fn invoke(&mut self, method: &str, _args: Vec<Injectable>) -> Result<Invocation> {
            if method == "hit" {
                self.hits += 1;
                return Ok(Invocation::Handled);
            }
            Ok(Invocation::Unknown)
        }
    }

    impl Autowired for Counter {
        fn metadata() -> ClassMetadata {
            ClassMetadata {
                name: Some("counter".into()),
                singleton: true,
                ..ClassMetadata::default()
            }
        }

        fn build(_args: Vec<Injectable>) -> Result<Self> {
            Ok(Self::default())
        }
    }

    #[test]
    fn extract_nested_property() {
        let value = json!({ "db": { "host": "localhost", "ports": [5432, 5433] } });
        assert_eq!(
            extract_property(&value, "db.host").expect("host"),
            json!("localhost")
        );
        assert_eq!(
            extract_property(&value, "db.ports.1").expect("port"),
            json!(5433)
        );
    }

    #[test]
    fn extract_empty_path_returns_value() {
        let value = json!({ "a": 1 });
        assert_eq!(extract_property(&value, "").expect("root"), value);
    }

    #[test]
    fn extract_missing_segment_fails() {
        let value = json!({ "db": { "host": "localhost" } });
        let err = extract_property(&value, "db.port.number").expect_err("missing");
        match err {
            KestrelError::PropertyNotFound { property, path } => {
                assert_eq!(property, "port");
                assert_eq!(path, "db.port.number");
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn extract_null_counts_as_present() {
        let value = json!({ "a": null });
        assert_eq!(extract_property(&value, "a").expect("null"), Value::Null);
    }

    #[test]
    fn injectable_extract_on_class_requires_empty_path() {
        let class = Injectable::Class(AutowiredClass::<Counter>::shared());
        assert!(class.extract("").is_ok());
        assert!(matches!(
            class.extract("name"),
            Err(KestrelError::PropertyNotFound { .. })
        ));
    }

    #[tokio::test]
    async fn autowired_class_reports_metadata_and_builds() {
        let class = AutowiredClass::<Counter>::shared();
        assert_eq!(class.metadata().name.as_deref(), Some("counter"));
        assert!(class.metadata().singleton);

        let mut instance = class.construct(Vec::new()).await.expect("construct");
        let outcome = instance.invoke("hit", Vec::new()).await.expect("invoke");
        assert_eq!(outcome, Invocation::Handled);
        let outcome = instance.invoke("miss", Vec::new()).await.expect("invoke");
        assert_eq!(outcome, Invocation::Unknown);

        let shared = Injectable::Instance(Arc::from(instance));
        let counter = shared.downcast::<Counter>().expect("downcast");
        assert_eq!(counter.hits, 1);
    }

    #[tokio::test]
    async fn default_execute_is_not_executable() {
        let counter = Counter::default();
        let err = counter.execute(Vec::new()).await.expect_err("not executable");
        assert!(matches!(err, KestrelError::NotExecutable { .. }));
    }

    #[test]
    fn same_as_compares_identity() {
        let a: Arc<dyn Component> = Arc::new(Counter::default());
        let b: Arc<dyn Component> = Arc::new(Counter::default());
        let first = Injectable::Instance(Arc::clone(&a));
        assert!(first.same_as(&Injectable::Instance(a)));
        assert!(!first.same_as(&Injectable::Instance(b)));
    }
}
