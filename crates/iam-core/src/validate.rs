//! Structural checks for expression trees
//!
//! Evaluation is permissive: a leaf whose value has the wrong shape for its
//! operator simply fails to match. The checker here lets policy authors and
//! loaders find those trees up front. It is never run by `ExprCell::eval`.

use crate::expression::ExprCell;
use crate::operator::Op;
use crate::visitor::{walk_expr, Visitor};
use thiserror::Error;

/// A malformed node, addressed by its path from the root (`$.content[1]`)
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ShapeError {
    #[error("{path}: {op} has no children")]
    EmptyCombinator { path: String, op: String },

    #[error("{path}: {op} carries field `{field}`")]
    CombinatorWithField { path: String, op: String, field: String },

    #[error("{path}: {op} has an empty field")]
    EmptyField { path: String, op: String },

    #[error("{path}: leaf {op} has {count} children")]
    LeafWithChildren { path: String, op: String, count: usize },

    #[error("{path}: {op} expects an array value, got {found}")]
    ExpectedArray { path: String, op: String, found: &'static str },

    #[error("{path}: {op} expects a scalar value, got Array")]
    ExpectedScalar { path: String, op: String },

    #[error("{path}: unknown operator `{token}`")]
    UnknownOperator { path: String, token: String },
}

/// Collects every shape problem of a tree
pub struct ShapeChecker {
    path: Vec<String>,
    errors: Vec<ShapeError>,
}

impl ShapeChecker {
    pub fn new() -> Self {
        Self { path: vec!["$".to_string()], errors: Vec::new() }
    }

    /// Check a tree, accumulating errors
    pub fn check(&mut self, expr: &ExprCell) {
        self.visit_expr(expr);
    }

    /// Get collected errors
    pub fn errors(&self) -> &[ShapeError] {
        &self.errors
    }

    /// Check if there are any errors
    pub fn has_errors(&self) -> bool {
        !self.errors.is_empty()
    }

    pub fn into_errors(self) -> Vec<ShapeError> {
        self.errors
    }

    fn current_path(&self) -> String {
        self.path.join(".")
    }
}

impl Default for ShapeChecker {
    fn default() -> Self {
        Self::new()
    }
}

impl<'a> Visitor<'a> for ShapeChecker {
    fn visit_expr(&mut self, expr: &'a ExprCell) {
        if let Op::Unknown(token) = &expr.op {
            self.errors.push(ShapeError::UnknownOperator {
                path: self.current_path(),
                token: token.clone(),
            });
            return;
        }
        walk_expr(self, expr);
    }

    fn visit_combinator(&mut self, expr: &'a ExprCell) {
        let op = expr.op.to_string();
        if expr.content.is_empty() {
            self.errors.push(ShapeError::EmptyCombinator { path: self.current_path(), op: op.clone() });
        }
        if !expr.field.is_empty() {
            self.errors.push(ShapeError::CombinatorWithField {
                path: self.current_path(),
                op,
                field: expr.field.clone(),
            });
        }

        for (i, child) in expr.content.iter().enumerate() {
            self.path.push(format!("content[{}]", i));
            self.visit_expr(child);
            self.path.pop();
        }
    }

    fn visit_leaf(&mut self, expr: &'a ExprCell) {
        let op = expr.op.to_string();
        if !expr.content.is_empty() {
            self.errors.push(ShapeError::LeafWithChildren {
                path: self.current_path(),
                op: op.clone(),
                count: expr.content.len(),
            });
        }

        // `any` ignores both field and value
        if expr.op == Op::Any {
            return;
        }

        if expr.field.is_empty() {
            self.errors.push(ShapeError::EmptyField { path: self.current_path(), op: op.clone() });
        }

        if expr.op.expects_array_value() {
            if !expr.value.is_array() {
                self.errors.push(ShapeError::ExpectedArray {
                    path: self.current_path(),
                    op,
                    found: expr.value.type_name(),
                });
            }
        } else if expr.value.is_array() {
            self.errors.push(ShapeError::ExpectedScalar { path: self.current_path(), op });
        }
    }
}

/// Validate a tree, returning every problem found
pub fn validate(expr: &ExprCell) -> Result<(), Vec<ShapeError>> {
    let mut checker = ShapeChecker::new();
    checker.check(expr);
    if checker.has_errors() {
        Err(checker.into_errors())
    } else {
        Ok(())
    }
}
