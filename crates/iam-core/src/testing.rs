//! Test utilities and helper functions for IAM tests
//!
//! This module provides common test setup functions to reduce duplication
//! across test suites and make tests more readable.

use crate::engine::{InMemoryPolicySource, PolicyRequest, PolicySource};
use crate::expression::{ExprCell, BK_IAM_PATH};
use crate::object::ObjectSet;
use crate::operator::Op;
use crate::value::Value;
use crate::{Error, Result};
use parking_lot::Mutex;
use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};

/// Build a flat object set from `(path, value)` pairs
///
/// # Examples
/// ```
/// use iam_core::testing::object_set;
/// use iam_core::{ObjectSet, Value};
///
/// let objects = object_set(&[("dept", Value::from("finance")), ("level", Value::Int(2))]);
/// assert_eq!(objects.get_attribute("level"), Some(Value::Int(2)));
/// ```
pub fn object_set(pairs: &[(&str, Value)]) -> HashMap<String, Value> {
    pairs.iter().map(|(path, value)| (path.to_string(), value.clone())).collect()
}

/// `starts_with` leaf on `<object_type>._bk_iam_path_`
///
/// # Examples
/// ```
/// use iam_core::testing::path_leaf;
///
/// let leaf = path_leaf("resource", "/biz,1/set,*/");
/// assert_eq!(leaf.field, "resource._bk_iam_path_");
/// ```
pub fn path_leaf(object_type: &str, policy_path: &str) -> ExprCell {
    ExprCell::leaf(Op::StartsWith, format!("{}.{}", object_type, BK_IAM_PATH), policy_path)
}

/// Object set wrapper that records every attribute lookup
pub struct CountingObjectSet<O> {
    inner: O,
    lookups: Mutex<Vec<String>>,
}

impl<O: ObjectSet> CountingObjectSet<O> {
    pub fn new(inner: O) -> Self {
        Self { inner, lookups: Mutex::new(Vec::new()) }
    }

    /// Paths looked up so far, in call order
    pub fn lookups(&self) -> Vec<String> {
        self.lookups.lock().clone()
    }

    /// Number of lookups of one path
    pub fn count(&self, path: &str) -> usize {
        self.lookups.lock().iter().filter(|p| p.as_str() == path).count()
    }

    pub fn total(&self) -> usize {
        self.lookups.lock().len()
    }
}

impl<O: ObjectSet> ObjectSet for CountingObjectSet<O> {
    fn get_attribute(&self, path: &str) -> Option<Value> {
        self.lookups.lock().push(path.to_string());
        self.inner.get_attribute(path)
    }
}

/// In-memory policy source that counts fetches
#[derive(Default)]
pub struct CountingPolicySource {
    inner: InMemoryPolicySource,
    fetches: AtomicUsize,
}

impl CountingPolicySource {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_policy(self, request: PolicyRequest, expr: ExprCell) -> Self {
        self.inner.insert(request, expr);
        self
    }

    pub fn fetches(&self) -> usize {
        self.fetches.load(Ordering::SeqCst)
    }
}

impl PolicySource for CountingPolicySource {
    fn fetch(&self, request: &PolicyRequest) -> Result<Option<ExprCell>> {
        self.fetches.fetch_add(1, Ordering::SeqCst);
        self.inner.fetch(request)
    }
}

/// Policy source whose every fetch fails
pub struct FailingPolicySource;

impl PolicySource for FailingPolicySource {
    fn fetch(&self, request: &PolicyRequest) -> Result<Option<ExprCell>> {
        Err(Error::PolicySource(format!("unreachable policy service for {}", request.cache_key())))
    }
}
