pub mod cache;
pub mod engine;
pub mod eval;
pub mod expression;
pub mod object;
pub mod operator;
pub mod validate;
pub mod value;
pub mod visitor;

// Test utilities (available in tests and when used as a dependency with the `testing` feature)
#[cfg(any(test, feature = "testing"))]
pub mod testing;

pub use cache::{Cache, CacheConfig, MemoryCache};
pub use engine::{
    Decision, DecisionKind, EngineConfig, InMemoryPolicySource, PolicyEngine, PolicyRequest, PolicySource,
};
pub use expression::ExprCell;
pub use object::{MapObjectSet, Object, ObjectSet};
pub use operator::Op;
pub use validate::{validate, ShapeError};
pub use value::Value;

use thiserror::Error;

#[derive(Error, Debug)]
pub enum Error {
    #[error("Policy source error: {0}")]
    PolicySource(String),

    #[error("Unsupported value: {0}")]
    UnsupportedValue(String),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

pub type Result<T> = std::result::Result<T, Error>;
