//! Expression operators and their wire tokens

use crate::eval::{self, OpFn};
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::convert::Infallible;
use std::fmt;
use std::str::FromStr;

/// Operator of an expression node
///
/// `And`/`Or` combine child nodes, every other variant is a leaf comparison
/// between an attribute and the node's policy value. Tokens that are not
/// recognised are kept in `Unknown` so a tree round-trips unchanged; such
/// leaves always evaluate to `false`.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Op {
    And,
    Or,
    Eq,
    NotEq,
    Lt,
    Lte,
    Gt,
    Gte,
    StartsWith,
    NotStartsWith,
    EndsWith,
    NotEndsWith,
    In,
    NotIn,
    Contains,
    NotContains,
    Any,
    Unknown(String),
}

impl Op {
    /// Wire token of the operator
    pub fn as_str(&self) -> &str {
        match self {
            Op::And => "AND",
            Op::Or => "OR",
            Op::Eq => "eq",
            Op::NotEq => "not_eq",
            Op::Lt => "lt",
            Op::Lte => "lte",
            Op::Gt => "gt",
            Op::Gte => "gte",
            Op::StartsWith => "starts_with",
            Op::NotStartsWith => "not_starts_with",
            Op::EndsWith => "ends_with",
            Op::NotEndsWith => "not_ends_with",
            Op::In => "in",
            Op::NotIn => "not_in",
            Op::Contains => "contains",
            Op::NotContains => "not_contains",
            Op::Any => "any",
            Op::Unknown(token) => token.as_str(),
        }
    }

    /// AND / OR
    pub fn is_logical(&self) -> bool {
        matches!(self, Op::And | Op::Or)
    }

    /// Operators satisfied when any element of an array attribute matches
    pub fn is_positive(&self) -> bool {
        matches!(
            self,
            Op::Eq
                | Op::Lt
                | Op::Lte
                | Op::Gt
                | Op::Gte
                | Op::StartsWith
                | Op::EndsWith
                | Op::In
        )
    }

    /// Operators satisfied only when every element of an array attribute matches
    pub fn is_negative(&self) -> bool {
        matches!(self, Op::NotEq | Op::NotStartsWith | Op::NotEndsWith | Op::NotIn)
    }

    /// Operators whose policy value must be an array
    pub fn expects_array_value(&self) -> bool {
        matches!(self, Op::In | Op::NotIn)
    }

    /// Comparison primitive backing a leaf operator
    ///
    /// `None` for combinators, `Any` and unknown tokens.
    pub fn primitive(&self) -> Option<OpFn> {
        let f: OpFn = match self {
            Op::Eq => eval::equal,
            Op::NotEq => eval::not_equal,
            Op::Lt => eval::less,
            Op::Lte => eval::less_or_equal,
            Op::Gt => eval::greater,
            Op::Gte => eval::greater_or_equal,
            Op::StartsWith => eval::starts_with,
            Op::NotStartsWith => eval::not_starts_with,
            Op::EndsWith => eval::ends_with,
            Op::NotEndsWith => eval::not_ends_with,
            Op::In => eval::in_list,
            Op::NotIn => eval::not_in_list,
            Op::Contains => eval::contains,
            Op::NotContains => eval::not_contains,
            Op::And | Op::Or | Op::Any | Op::Unknown(_) => return None,
        };
        Some(f)
    }

    /// Map a wire token to its operator, keeping unrecognised tokens
    pub fn from_token(token: &str) -> Self {
        match token {
            "AND" => Op::And,
            "OR" => Op::Or,
            "eq" => Op::Eq,
            "not_eq" => Op::NotEq,
            "lt" => Op::Lt,
            "lte" => Op::Lte,
            "gt" => Op::Gt,
            "gte" => Op::Gte,
            "starts_with" => Op::StartsWith,
            "not_starts_with" => Op::NotStartsWith,
            "ends_with" => Op::EndsWith,
            "not_ends_with" => Op::NotEndsWith,
            "in" => Op::In,
            "not_in" => Op::NotIn,
            "contains" => Op::Contains,
            "not_contains" => Op::NotContains,
            "any" => Op::Any,
            other => Op::Unknown(other.to_string()),
        }
    }
}

impl FromStr for Op {
    type Err = Infallible;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(Op::from_token(s))
    }
}

impl fmt::Display for Op {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl Serialize for Op {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.as_str())
    }
}

impl<'de> Deserialize<'de> for Op {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let token = String::deserialize(deserializer)?;
        Ok(Op::from_token(&token))
    }
}
