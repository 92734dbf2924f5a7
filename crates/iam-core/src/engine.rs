//! Permission checks: fetch a policy, evaluate it, produce a [`Decision`]

use crate::cache::{Cache, MemoryCache};
use crate::expression::ExprCell;
use crate::object::ObjectSet;
use crate::Result;
use parking_lot::RwLock;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

/// Identifies the policy governing one permission check
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct PolicyRequest {
    pub system: String,
    pub subject_type: String,
    pub subject_id: String,
    pub action: String,
}

impl PolicyRequest {
    pub fn new(
        system: impl Into<String>,
        subject_type: impl Into<String>,
        subject_id: impl Into<String>,
        action: impl Into<String>,
    ) -> Self {
        Self {
            system: system.into(),
            subject_type: subject_type.into(),
            subject_id: subject_id.into(),
            action: action.into(),
        }
    }

    /// Stable key for the policy cache
    pub fn cache_key(&self) -> String {
        format!("{}:{}:{}:{}", self.system, self.subject_type, self.subject_id, self.action)
    }
}

/// Where policy expressions come from (usually a remote policy service)
///
/// `Ok(None)` means the subject has no policy for the action.
pub trait PolicySource: Send + Sync {
    fn fetch(&self, request: &PolicyRequest) -> Result<Option<ExprCell>>;
}

/// Policies held in memory, keyed by request
#[derive(Default)]
pub struct InMemoryPolicySource {
    policies: RwLock<HashMap<PolicyRequest, ExprCell>>,
}

impl InMemoryPolicySource {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&self, request: PolicyRequest, expr: ExprCell) {
        self.policies.write().insert(request, expr);
    }

    pub fn remove(&self, request: &PolicyRequest) -> Option<ExprCell> {
        self.policies.write().remove(request)
    }

    pub fn len(&self) -> usize {
        self.policies.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.policies.read().is_empty()
    }
}

impl PolicySource for InMemoryPolicySource {
    fn fetch(&self, request: &PolicyRequest) -> Result<Option<ExprCell>> {
        Ok(self.policies.read().get(request).cloned())
    }
}

/// Cached result of a policy fetch; `None` records "no policy"
pub type CachedPolicy = Option<Arc<ExprCell>>;

/// Engine configuration
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct EngineConfig {
    /// Memoize policy fetches per request
    pub cache_enabled: bool,
    pub policy_ttl_seconds: u64,
    /// Attach the evaluated render to every decision
    pub trace: bool,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            cache_enabled: true,
            policy_ttl_seconds: 10,
            trace: false,
        }
    }
}

impl EngineConfig {
    /// No caching, every decision traced
    pub fn debug() -> Self {
        Self {
            cache_enabled: false,
            policy_ttl_seconds: 0,
            trace: true,
        }
    }

    pub fn policy_ttl(&self) -> Duration {
        Duration::from_secs(self.policy_ttl_seconds)
    }
}

/// Policy decision result
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Decision {
    pub kind: DecisionKind,
    pub reason: Option<String>,
    /// Expression rendered with the attribute values it was evaluated against
    pub trace: Option<String>,
}

impl Decision {
    pub fn from_bool(allowed: bool) -> Self {
        Self {
            kind: if allowed { DecisionKind::Allow } else { DecisionKind::Deny },
            reason: None,
            trace: None,
        }
    }

    pub fn deny(reason: impl Into<String>) -> Self {
        Self {
            kind: DecisionKind::Deny,
            reason: Some(reason.into()),
            trace: None,
        }
    }

    pub fn is_allowed(&self) -> bool {
        self.kind == DecisionKind::Allow
    }
}

/// Decision kinds
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum DecisionKind {
    Allow,
    Deny,
}

/// Main permission-check engine
pub struct PolicyEngine {
    source: Arc<dyn PolicySource>,
    cache: Arc<dyn Cache<CachedPolicy>>,
    config: EngineConfig,
}

impl PolicyEngine {
    pub fn new(
        source: Arc<dyn PolicySource>,
        cache: Arc<dyn Cache<CachedPolicy>>,
        config: EngineConfig,
    ) -> Self {
        Self { source, cache, config }
    }

    /// Engine backed by a fresh [`MemoryCache`] with default expiry
    pub fn with_memory_cache(source: Arc<dyn PolicySource>, config: EngineConfig) -> Self {
        Self::new(source, Arc::new(MemoryCache::<CachedPolicy>::default()), config)
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    /// Check a permission: fetch the request's policy and evaluate it
    ///
    /// Fails only when the policy source fails; a missing policy denies.
    pub fn is_allowed<O: ObjectSet + ?Sized>(
        &self,
        request: &PolicyRequest,
        objects: &O,
    ) -> Result<Decision> {
        match self.policy(request)? {
            Some(expr) => {
                let decision = self.is_allowed_with_expr(&expr, objects);
                tracing::debug!(
                    system = %request.system,
                    subject = %request.subject_id,
                    action = %request.action,
                    allowed = decision.is_allowed(),
                    "policy evaluated"
                );
                Ok(decision)
            }
            None => {
                tracing::debug!(
                    system = %request.system,
                    subject = %request.subject_id,
                    action = %request.action,
                    "no policy, denying"
                );
                Ok(Decision::deny("no policy"))
            }
        }
    }

    /// Evaluate an already fetched expression
    pub fn is_allowed_with_expr<O: ObjectSet + ?Sized>(&self, expr: &ExprCell, objects: &O) -> Decision {
        let mut decision = Decision::from_bool(expr.eval(objects));
        if self.config.trace {
            let rendered = expr.render(objects);
            tracing::debug!(expr = %expr, rendered = %rendered, allowed = decision.is_allowed(), "decision trace");
            decision.trace = Some(rendered);
        }
        decision
    }

    fn policy(&self, request: &PolicyRequest) -> Result<CachedPolicy> {
        if !self.config.cache_enabled {
            return Ok(self.source.fetch(request)?.map(Arc::new));
        }

        let key = request.cache_key();
        if let Some(cached) = self.cache.get(&key) {
            tracing::trace!(key = %key, "policy cache hit");
            return Ok(cached);
        }

        let fetched = self.source.fetch(request)?.map(Arc::new);
        self.cache.set(&key, fetched.clone(), self.config.policy_ttl());
        Ok(fetched)
    }
}
