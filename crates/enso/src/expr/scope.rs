//! Chained, read-only variable lookup for expression evaluation.

use std::collections::BTreeMap;
use std::sync::Arc;

use minijinja::value::{Enumerator, Object, Value};

/// A shared map of JSON values seen by expressions as a map object.
///
/// Entries are converted when an expression reads them, so evaluating
/// `this.count` does not touch the component's other fields.
#[derive(Debug, Clone, Default)]
pub struct Fields(Arc<BTreeMap<String, serde_json::Value>>);

impl Fields {
    pub fn new(map: Arc<BTreeMap<String, serde_json::Value>>) -> Self {
        Self(map)
    }

    pub fn get(&self, name: &str) -> Option<Value> {
        self.0.get(name).map(Value::from_serialize)
    }

    pub fn into_value(self) -> Value {
        Value::from_object(self)
    }
}

impl Object for Fields {
    fn get_value(self: &Arc<Self>, key: &Value) -> Option<Value> {
        self.get(key.as_str()?)
    }

    fn enumerate(self: &Arc<Self>) -> Enumerator {
        Enumerator::Values(self.0.keys().map(|key| Value::from(key.as_str())).collect())
    }
}

/// A frame of named values with an optional parent frame.
///
/// Lookups that miss in this frame continue in the parent, so a fragment's
/// locals shadow the component's `this` and exposed values without copying
/// them. The scope is handed to minijinja as a dynamic object and is the only
/// thing an expression can see besides the registered helpers.
#[derive(Debug, Default)]
pub struct Scope {
    vars: BTreeMap<String, Value>,
    fields: Option<Fields>,
    parent: Option<Arc<Scope>>,
}

impl Scope {
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates an empty frame that falls back to `parent`.
    pub fn with_parent(parent: Arc<Scope>) -> Self {
        Self {
            vars: BTreeMap::new(),
            fields: None,
            parent: Some(parent),
        }
    }

    /// Makes `fields` visible by name below the names inserted in this frame.
    pub fn with_fields(mut self, fields: Fields) -> Self {
        self.fields = Some(fields);
        self
    }

    /// Adds or shadows a name in this frame.
    pub fn insert(&mut self, name: impl Into<String>, value: Value) {
        self.vars.insert(name.into(), value);
    }

    /// Builder variant of [`insert`](Self::insert).
    pub fn with(mut self, name: impl Into<String>, value: Value) -> Self {
        self.insert(name, value);
        self
    }

    /// Resolves `name` in this frame, then up the chain.
    pub fn lookup(&self, name: &str) -> Option<Value> {
        let mut frame = Some(self);
        while let Some(scope) = frame {
            if let Some(value) = scope.vars.get(name) {
                return Some(value.clone());
            }
            if let Some(value) = scope.fields.as_ref().and_then(|fields| fields.get(name)) {
                return Some(value);
            }
            frame = scope.parent.as_deref();
        }
        None
    }

    /// Wraps the scope as an evaluation context.
    pub fn into_value(self) -> Value {
        Value::from_object(self)
    }
}

impl Object for Scope {
    fn get_value(self: &Arc<Self>, key: &Value) -> Option<Value> {
        self.lookup(key.as_str()?)
    }
}
