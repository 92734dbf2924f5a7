//! Policy expression trees
//!
//! An [`ExprCell`] is either a combinator (`AND`/`OR` over `content`) or a
//! leaf comparing the attribute named by `field` against `value`. Evaluation
//! never fails: anything that cannot be decided resolves to `false`.
//!
//! ```
//! use iam_core::{ExprCell, MapObjectSet, Object, Op, Value};
//!
//! let expr = ExprCell::and(vec![
//!     ExprCell::leaf(Op::Eq, "subject.dept", "finance"),
//!     ExprCell::leaf(Op::In, "subject.level", vec![1, 2, 3]),
//! ]);
//!
//! let objects = MapObjectSet::new().with_object(
//!     "subject",
//!     Object::new().with_attribute("dept", "finance").with_attribute("level", 2),
//! );
//!
//! assert!(expr.eval(&objects));
//! assert_eq!(expr.to_string(), "((subject.dept eq finance) AND (subject.level in [1 2 3]))");
//! ```

use crate::eval::OpFn;
use crate::object::ObjectSet;
use crate::operator::Op;
use crate::value::Value;
use crate::visitor::Visitor;
use crate::Result;
use serde::{Deserialize, Deserializer, Serialize};
use std::borrow::Cow;
use std::fmt;

/// Attribute name of hierarchical resource paths
pub const BK_IAM_PATH: &str = "_bk_iam_path_";

/// Field suffix marking a hierarchical path attribute (`resource._bk_iam_path_`)
pub const BK_IAM_PATH_FIELD_SUFFIX: &str = "._bk_iam_path_";

/// Trailing wildcard segment of a path policy value (`/a,1/b,*/`)
const PATH_WILDCARD_SUFFIX: &str = ",*/";

/// One node of a policy expression tree
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExprCell {
    pub op: Op,
    #[serde(default, deserialize_with = "null_as_empty")]
    pub content: Vec<ExprCell>,
    #[serde(default)]
    pub field: String,
    #[serde(default)]
    pub value: Value,
}

/// `"content": null` is how empty child lists arrive on the wire
fn null_as_empty<'de, D: Deserializer<'de>>(deserializer: D) -> std::result::Result<Vec<ExprCell>, D::Error> {
    Ok(Option::<Vec<ExprCell>>::deserialize(deserializer)?.unwrap_or_default())
}

impl ExprCell {
    /// Create an AND combinator
    pub fn and(content: Vec<ExprCell>) -> Self {
        Self::combinator(Op::And, content)
    }

    /// Create an OR combinator
    pub fn or(content: Vec<ExprCell>) -> Self {
        Self::combinator(Op::Or, content)
    }

    fn combinator(op: Op, content: Vec<ExprCell>) -> Self {
        Self { op, content, field: String::new(), value: Value::Null }
    }

    /// Create a leaf comparing `field` against `value`
    pub fn leaf(op: Op, field: impl Into<String>, value: impl Into<Value>) -> Self {
        Self { op, content: Vec::new(), field: field.into(), value: value.into() }
    }

    /// Create an unconditional leaf
    pub fn any(field: impl Into<String>) -> Self {
        Self::leaf(Op::Any, field, Value::Array(Vec::new()))
    }

    /// Parse a tree from its JSON form
    pub fn from_json(json: &str) -> Result<Self> {
        Ok(serde_json::from_str(json)?)
    }

    pub fn from_json_value(json: serde_json::Value) -> Result<Self> {
        Ok(serde_json::from_value(json)?)
    }

    pub fn to_json(&self) -> Result<String> {
        Ok(serde_json::to_string(self)?)
    }

    /// Evaluate the expression against an object set
    pub fn eval<O: ObjectSet + ?Sized>(&self, data: &O) -> bool {
        match self.op {
            Op::And => self.content.iter().all(|c| c.eval(data)),
            Op::Or => self.content.iter().any(|c| c.eval(data)),
            _ => self.eval_leaf(data),
        }
    }

    fn eval_leaf<O: ObjectSet + ?Sized>(&self, data: &O) -> bool {
        let object_value = data.get_attribute(&self.field).unwrap_or_default();

        let primitive = match (&self.op, self.op.primitive()) {
            (Op::Any, _) => return true,
            (_, Some(f)) => f,
            (op, None) => {
                tracing::warn!(op = %op, field = %self.field, "unsupported leaf operator, evaluating to false");
                return false;
            }
        };

        let policy_value = self.policy_value();
        if self.op.is_positive() {
            eval_positive(primitive, &object_value, &policy_value)
        } else if self.op.is_negative() {
            eval_negative(primitive, &object_value, &policy_value)
        } else {
            // contains / not_contains: the primitive handles the attribute array itself
            primitive(&object_value, &policy_value)
        }
    }

    /// Policy value with the path wildcard stripped for `starts_with` on path fields
    ///
    /// `/a,1/b,*/` becomes `/a,1/b,` so any descendant of `b` matches.
    fn policy_value(&self) -> Cow<'_, Value> {
        if self.op == Op::StartsWith && self.field.ends_with(BK_IAM_PATH_FIELD_SUFFIX) {
            if let Value::String(v) = &self.value {
                if v.ends_with(PATH_WILDCARD_SUFFIX) {
                    if let Some(prefix) = v.strip_suffix("*/") {
                        return Cow::Owned(Value::String(prefix.to_string()));
                    }
                }
            }
        }
        Cow::Borrowed(&self.value)
    }

    /// Render the expression with attribute values in place of field names
    pub fn render<O: ObjectSet + ?Sized>(&self, data: &O) -> String {
        match self.op {
            Op::And | Op::Or => {
                let parts: Vec<String> = self.content.iter().map(|c| c.render(data)).collect();
                format!("({})", parts.join(&format!(" {} ", self.op)))
            }
            _ => {
                let attr_value = data.get_attribute(&self.field).unwrap_or_default();
                format!("({} {} {})", attr_value, self.op, self.value)
            }
        }
    }

    /// Distinct leaf fields in first-seen order
    pub fn fields(&self) -> Vec<&str> {
        let mut collector = FieldCollector::default();
        collector.visit_expr(self);
        collector.fields
    }
}

/// Any element of an array attribute may match
fn eval_positive(f: OpFn, object_value: &Value, policy_value: &Value) -> bool {
    match object_value {
        Value::Array(items) => items.iter().any(|item| f(item, policy_value)),
        _ => f(object_value, policy_value),
    }
}

/// Every element of an array attribute must match
fn eval_negative(f: OpFn, object_value: &Value, policy_value: &Value) -> bool {
    match object_value {
        Value::Array(items) => items.iter().all(|item| f(item, policy_value)),
        _ => f(object_value, policy_value),
    }
}

impl fmt::Display for ExprCell {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.op {
            Op::And | Op::Or => {
                write!(f, "(")?;
                for (i, c) in self.content.iter().enumerate() {
                    if i > 0 {
                        write!(f, " {} ", self.op)?;
                    }
                    write!(f, "{}", c)?;
                }
                write!(f, ")")
            }
            _ => write!(f, "({} {} {})", self.field, self.op, self.value),
        }
    }
}

#[derive(Default)]
struct FieldCollector<'a> {
    fields: Vec<&'a str>,
}

impl<'a> Visitor<'a> for FieldCollector<'a> {
    fn visit_leaf(&mut self, expr: &'a ExprCell) {
        if !self.fields.contains(&expr.field.as_str()) {
            self.fields.push(expr.field.as_str());
        }
    }
}
