//! Object sets: the runtime attributes a decision is evaluated against
//!
//! An object set answers `get_attribute("type.attr")` for the subject,
//! resource and action of a request. The evaluator only reads through the
//! [`ObjectSet`] trait; [`MapObjectSet`] is the in-memory implementation.

use crate::value::Value;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::sync::Arc;

/// Attribute lookup consumed by the evaluator and renderer
///
/// Implementations must be safe to call repeatedly; lookups of unknown paths
/// return `None`, which is evaluated as [`Value::Null`].
pub trait ObjectSet {
    fn get_attribute(&self, path: &str) -> Option<Value>;
}

impl<T: ObjectSet + ?Sized> ObjectSet for &T {
    fn get_attribute(&self, path: &str) -> Option<Value> {
        (**self).get_attribute(path)
    }
}

impl<T: ObjectSet + ?Sized> ObjectSet for Arc<T> {
    fn get_attribute(&self, path: &str) -> Option<Value> {
        (**self).get_attribute(path)
    }
}

/// Flat map keyed by the full dotted path
impl ObjectSet for HashMap<String, Value> {
    fn get_attribute(&self, path: &str) -> Option<Value> {
        self.get(path).cloned()
    }
}

/// Attribute bag of one object (e.g. the requested resource)
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Object {
    pub attributes: HashMap<String, Value>,
}

impl Object {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_attribute(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        self.attributes.insert(key.into(), value.into());
        self
    }

    pub fn get(&self, key: &str) -> Option<&Value> {
        self.attributes.get(key)
    }
}

/// Object set keyed by object type (`"subject"`, `"resource"`, ...)
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct MapObjectSet {
    objects: HashMap<String, Object>,
}

impl MapObjectSet {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add (or replace) the object of the given type
    pub fn add(&mut self, object_type: impl Into<String>, object: Object) {
        self.objects.insert(object_type.into(), object);
    }

    /// Builder form of [`MapObjectSet::add`]
    pub fn with_object(mut self, object_type: impl Into<String>, object: Object) -> Self {
        self.add(object_type, object);
        self
    }

    pub fn get(&self, object_type: &str) -> Option<&Object> {
        self.objects.get(object_type)
    }

    pub fn has(&self, object_type: &str) -> bool {
        self.objects.contains_key(object_type)
    }

    pub fn remove(&mut self, object_type: &str) -> Option<Object> {
        self.objects.remove(object_type)
    }

    pub fn len(&self) -> usize {
        self.objects.len()
    }

    pub fn is_empty(&self) -> bool {
        self.objects.is_empty()
    }
}

impl ObjectSet for MapObjectSet {
    /// Resolve `type.attr`; only the first `.` separates the object type
    fn get_attribute(&self, path: &str) -> Option<Value> {
        let (object_type, attr) = path.split_once('.')?;
        self.objects.get(object_type)?.attributes.get(attr).cloned()
    }
}
