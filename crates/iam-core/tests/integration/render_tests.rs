//! Display and render output of expression trees

use iam_core::testing::{object_set, path_leaf};
use iam_core::{ExprCell, MapObjectSet, Object, Op, Value};

fn policy() -> ExprCell {
    ExprCell::and(vec![
        ExprCell::leaf(Op::Eq, "user.dept", "finance"),
        ExprCell::or(vec![
            ExprCell::leaf(Op::Gte, "user.level", 3),
            ExprCell::leaf(Op::In, "host.os", vec!["linux", "bsd"]),
        ]),
    ])
}

#[test]
fn test_display_nested_tree() {
    assert_eq!(
        policy().to_string(),
        "((user.dept eq finance) AND ((user.level gte 3) OR (host.os in [linux bsd])))"
    );
}

#[test]
fn test_display_empty_combinators() {
    assert_eq!(ExprCell::and(vec![]).to_string(), "()");
    assert_eq!(ExprCell::or(vec![]).to_string(), "()");
}

#[test]
fn test_display_any_and_unknown() {
    assert_eq!(ExprCell::any("host.id").to_string(), "(host.id any [])");
    let unknown = ExprCell::leaf(Op::Unknown("regex".to_string()), "host.name", "^web");
    assert_eq!(unknown.to_string(), "(host.name regex ^web)");
}

#[test]
fn test_render_substitutes_attribute_values() {
    let data = object_set(&[
        ("user.dept", Value::from("finance")),
        ("user.level", Value::Int(2)),
        ("host.os", Value::from(vec!["linux", "windows"])),
    ]);
    assert_eq!(
        policy().render(&data),
        "((finance eq finance) AND ((2 gte 3) OR ([linux windows] in [linux bsd])))"
    );
}

#[test]
fn test_render_missing_attribute_is_null() {
    let expr = ExprCell::leaf(Op::Eq, "user.dept", "finance");
    assert_eq!(expr.render(&object_set(&[])), "(null eq finance)");
}

#[test]
fn test_render_through_map_object_set() {
    let objects = MapObjectSet::new()
        .with_object("user", Object::new().with_attribute("dept", "finance"))
        .with_object("host", Object::new().with_attribute("os", "linux"));
    let expr = ExprCell::and(vec![
        ExprCell::leaf(Op::Eq, "user.dept", "finance"),
        ExprCell::leaf(Op::NotEq, "host.os", "windows"),
    ]);
    assert_eq!(expr.render(&objects), "((finance eq finance) AND (linux not_eq windows))");
}

#[test]
fn test_render_shows_policy_path_as_written() {
    let leaf = path_leaf("host", "/biz,1/set,*/");
    let data = object_set(&[("host._bk_iam_path_", Value::from("/biz,1/set,3/"))]);
    assert!(leaf.eval(&data));
    assert_eq!(leaf.render(&data), "(/biz,1/set,3/ starts_with /biz,1/set,*/)");
}

#[test]
fn test_json_round_trip_keeps_display() {
    let expr = policy();
    let json = expr.to_json().unwrap();
    let decoded = ExprCell::from_json(&json).unwrap();
    assert_eq!(decoded, expr);
    assert_eq!(decoded.to_string(), expr.to_string());
}

#[test]
fn test_json_wire_shape() {
    let json = r#"{
        "op": "OR",
        "content": [
            {"op": "eq", "field": "host.os", "value": "linux"},
            {"op": "any", "field": "host.id", "value": []}
        ]
    }"#;
    let expr = ExprCell::from_json(json).unwrap();
    assert_eq!(expr.op, Op::Or);
    assert_eq!(expr.content.len(), 2);
    assert_eq!(expr.to_string(), "((host.os eq linux) OR (host.id any []))");
    assert_eq!(expr.fields(), vec!["host.os", "host.id"]);
}
