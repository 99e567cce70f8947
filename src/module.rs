//! Exported surface of a loaded module.
//!
//! A module's real value is an [`Export`]: plain data, a function, a
//! constructible class, or a namespace of named exports. Namespaces may carry a
//! conventional `default` export, which handles unwrap when invoked.

use std::collections::BTreeMap;
use std::fmt;
use std::sync::Arc;

use parking_lot::RwLock;

pub use serde_json::Value;

/// Name of the conventional default export inside a namespace.
pub const DEFAULT_EXPORT: &str = "default";

type Callable = dyn Fn(&[Value]) -> anyhow::Result<Value> + Send + Sync;

/// What kind of export a value is.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExportKind {
    Value,
    Function,
    Class,
    Namespace,
}

impl ExportKind {
    pub fn label(self) -> &'static str {
        match self {
            Self::Value => "value",
            Self::Function => "function",
            Self::Class => "class",
            Self::Namespace => "namespace",
        }
    }
}

impl fmt::Display for ExportKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// A callable export.
#[derive(Clone)]
pub struct Function {
    name: Arc<str>,
    call: Arc<Callable>,
}

impl Function {
    pub fn new<F>(name: impl Into<Arc<str>>, call: F) -> Self
    where
        F: Fn(&[Value]) -> anyhow::Result<Value> + Send + Sync + 'static,
    {
        Self {
            name: name.into(),
            call: Arc::new(call),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn call(&self, args: &[Value]) -> anyhow::Result<Value> {
        (self.call)(args)
    }
}

/// A constructible export. Constructing it yields a fresh instance.
#[derive(Clone)]
pub struct Class {
    name: Arc<str>,
    construct: Arc<Callable>,
}

impl Class {
    pub fn new<F>(name: impl Into<Arc<str>>, construct: F) -> Self
    where
        F: Fn(&[Value]) -> anyhow::Result<Value> + Send + Sync + 'static,
    {
        Self {
            name: name.into(),
            construct: Arc::new(construct),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn construct(&self, args: &[Value]) -> anyhow::Result<Value> {
        (self.construct)(args)
    }
}

/// Named exports of a module.
///
/// Cloning shares the same table: a namespace mutated through one clone is
/// observed through every other clone, like a module namespace object held by
/// several importers of the same cache entry.
#[derive(Clone, Default)]
pub struct Namespace(Arc<RwLock<BTreeMap<String, Export>>>);

impl Namespace {
    pub fn new() -> Self {
        Self::default()
    }

    /// Builder-style insert.
    pub fn with(self, name: impl Into<String>, export: impl Into<Export>) -> Self {
        self.insert(name, export);
        self
    }

    /// Insert or replace a named export, returning the previous one.
    pub fn insert(&self, name: impl Into<String>, export: impl Into<Export>) -> Option<Export> {
        self.0.write().insert(name.into(), export.into())
    }

    pub fn remove(&self, name: &str) -> Option<Export> {
        self.0.write().remove(name)
    }

    pub fn get(&self, name: &str) -> Option<Export> {
        self.0.read().get(name).cloned()
    }

    pub fn contains(&self, name: &str) -> bool {
        self.0.read().contains_key(name)
    }

    pub fn keys(&self) -> Vec<String> {
        self.0.read().keys().cloned().collect()
    }

    pub fn len(&self) -> usize {
        self.0.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.read().is_empty()
    }

    /// Whether both namespaces share the same table.
    pub fn ptr_eq(&self, other: &Self) -> bool {
        Arc::ptr_eq(&self.0, &other.0)
    }
}

/// The exported surface of a module.
#[derive(Clone)]
pub enum Export {
    Value(Value),
    Function(Function),
    Class(Class),
    Namespace(Namespace),
}

impl Export {
    pub fn function<F>(name: impl Into<Arc<str>>, call: F) -> Self
    where
        F: Fn(&[Value]) -> anyhow::Result<Value> + Send + Sync + 'static,
    {
        Self::Function(Function::new(name, call))
    }

    pub fn class<F>(name: impl Into<Arc<str>>, construct: F) -> Self
    where
        F: Fn(&[Value]) -> anyhow::Result<Value> + Send + Sync + 'static,
    {
        Self::Class(Class::new(name, construct))
    }

    pub fn kind(&self) -> ExportKind {
        match self {
            Self::Value(_) => ExportKind::Value,
            Self::Function(_) => ExportKind::Function,
            Self::Class(_) => ExportKind::Class,
            Self::Namespace(_) => ExportKind::Namespace,
        }
    }

    /// The export a plain call or a constructor call should target.
    ///
    /// A namespace whose `default` export is a function or a class is
    /// unwrapped to that default; everything else targets itself.
    pub fn primary(&self) -> Export {
        if let Self::Namespace(ns) = self
            && let Some(default) = ns.get(DEFAULT_EXPORT)
            && matches!(default, Self::Function(_) | Self::Class(_))
        {
            return default;
        }
        self.clone()
    }

    /// Named member: a namespace export, or a field of an object value.
    pub fn get(&self, name: &str) -> Option<Export> {
        match self {
            Self::Namespace(ns) => ns.get(name),
            Self::Value(Value::Object(map)) => map.get(name).cloned().map(Self::Value),
            _ => None,
        }
    }

    /// Names of the members reachable with [`Export::get`].
    pub fn keys(&self) -> Vec<String> {
        match self {
            Self::Namespace(ns) => ns.keys(),
            Self::Value(Value::Object(map)) => map.keys().cloned().collect(),
            _ => Vec::new(),
        }
    }

    pub fn as_value(&self) -> Option<&Value> {
        match self {
            Self::Value(value) => Some(value),
            _ => None,
        }
    }

    pub fn as_namespace(&self) -> Option<&Namespace> {
        match self {
            Self::Namespace(ns) => Some(ns),
            _ => None,
        }
    }
}

impl From<Value> for Export {
    fn from(value: Value) -> Self {
        Self::Value(value)
    }
}

impl From<Function> for Export {
    fn from(function: Function) -> Self {
        Self::Function(function)
    }
}

impl From<Class> for Export {
    fn from(class: Class) -> Self {
        Self::Class(class)
    }
}

impl From<Namespace> for Export {
    fn from(ns: Namespace) -> Self {
        Self::Namespace(ns)
    }
}

impl fmt::Debug for Export {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Value(value) => f.debug_tuple("Value").field(value).finish(),
            Self::Function(func) => write!(f, "Function({})", func.name()),
            Self::Class(class) => write!(f, "Class({})", class.name()),
            Self::Namespace(ns) => f.debug_tuple("Namespace").field(&ns.keys()).finish(),
        }
    }
}
