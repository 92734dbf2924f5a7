//! Visitor pattern for traversing expression trees

use crate::expression::ExprCell;

/// Read-only traversal over an [`ExprCell`] tree
///
/// The lifetime lets visitors keep references into the tree they walk.
pub trait Visitor<'a>: Sized {
    /// Visit any node
    fn visit_expr(&mut self, expr: &'a ExprCell) {
        walk_expr(self, expr);
    }

    /// Visit an AND/OR node
    fn visit_combinator(&mut self, expr: &'a ExprCell) {
        walk_children(self, expr);
    }

    /// Visit a comparison leaf
    fn visit_leaf(&mut self, _expr: &'a ExprCell) {
        // Leaf node, no children
    }
}

/// Dispatch a node to `visit_combinator` or `visit_leaf`
pub fn walk_expr<'a, V: Visitor<'a>>(visitor: &mut V, expr: &'a ExprCell) {
    if expr.op.is_logical() {
        visitor.visit_combinator(expr);
    } else {
        visitor.visit_leaf(expr);
    }
}

/// Visit the children of a combinator in order
pub fn walk_children<'a, V: Visitor<'a>>(visitor: &mut V, expr: &'a ExprCell) {
    for child in &expr.content {
        visitor.visit_expr(child);
    }
}
