//! End-to-end evaluation against object sets

use iam_core::testing::{object_set, path_leaf, CountingObjectSet};
use iam_core::{ExprCell, MapObjectSet, Object, Op, Value};
use std::sync::Arc;
use std::thread;

fn dept_and_level() -> ExprCell {
    ExprCell::and(vec![
        ExprCell::leaf(Op::Eq, "dept", "finance"),
        ExprCell::leaf(Op::In, "level", vec![1, 2, 3]),
    ])
}

#[test]
fn test_end_to_end_scenario() {
    let expr = dept_and_level();

    let finance = object_set(&[("dept", Value::from("finance")), ("level", Value::Int(2))]);
    assert!(expr.eval(&finance));

    let eng = object_set(&[("dept", Value::from("eng")), ("level", Value::Int(2))]);
    assert!(!expr.eval(&eng));
}

#[test]
fn test_end_to_end_from_json() {
    let json = r#"{
        "op": "AND",
        "content": [
            {"op": "eq", "content": [], "field": "dept", "value": "finance"},
            {"op": "in", "content": [], "field": "level", "value": [1, 2, 3]}
        ],
        "field": "",
        "value": null
    }"#;
    let expr = ExprCell::from_json(json).unwrap();
    assert_eq!(expr, dept_and_level());

    let data = object_set(&[("dept", Value::from("finance")), ("level", Value::Int(3))]);
    assert!(expr.eval(&data));
}

#[test]
fn test_and_short_circuits_on_first_false() {
    let expr = ExprCell::and(vec![
        ExprCell::leaf(Op::Eq, "a", 1),
        ExprCell::leaf(Op::Eq, "b", 2),
        ExprCell::leaf(Op::Eq, "c", 3),
    ]);
    let data = CountingObjectSet::new(object_set(&[("a", Value::Int(0)), ("b", Value::Int(2))]));

    assert!(!expr.eval(&data));
    assert_eq!(data.lookups(), vec!["a".to_string()]);
    assert_eq!(data.count("b"), 0);
    assert_eq!(data.count("c"), 0);
}

#[test]
fn test_or_short_circuits_on_first_true() {
    let expr = ExprCell::or(vec![ExprCell::leaf(Op::Eq, "a", 1), ExprCell::leaf(Op::Eq, "b", 2)]);
    let data = CountingObjectSet::new(object_set(&[("a", Value::Int(1))]));

    assert!(expr.eval(&data));
    assert_eq!(data.total(), 1);
    assert_eq!(data.count("b"), 0);
}

#[test]
fn test_all_children_evaluated_when_needed() {
    let expr = ExprCell::or(vec![
        ExprCell::leaf(Op::Eq, "a", 1),
        ExprCell::leaf(Op::Eq, "b", 2),
        ExprCell::leaf(Op::Eq, "c", 3),
    ]);
    let data = CountingObjectSet::new(object_set(&[("c", Value::Int(3))]));

    assert!(expr.eval(&data));
    assert_eq!(data.lookups(), vec!["a".to_string(), "b".to_string(), "c".to_string()]);
}

#[test]
fn test_hierarchical_path_with_map_object_set() {
    let expr = ExprCell::and(vec![
        ExprCell::leaf(Op::Eq, "host.os", "linux"),
        path_leaf("host", "/biz,1/set,*/"),
    ]);

    let objects = MapObjectSet::new().with_object(
        "host",
        Object::new()
            .with_attribute("os", "linux")
            .with_attribute("_bk_iam_path_", vec!["/biz,2/", "/biz,1/set,7/module,3/"]),
    );
    assert!(expr.eval(&objects));

    let elsewhere = MapObjectSet::new().with_object(
        "host",
        Object::new().with_attribute("os", "linux").with_attribute("_bk_iam_path_", "/biz,1/"),
    );
    assert!(!expr.eval(&elsewhere));
}

#[test]
fn test_subject_with_multiple_departments() {
    let expr = ExprCell::or(vec![
        ExprCell::leaf(Op::Eq, "subject.department", "finance"),
        ExprCell::leaf(Op::Contains, "subject.groups", "auditors"),
    ]);

    let multi = MapObjectSet::new().with_object(
        "subject",
        Object::new().with_attribute("department", vec!["eng", "finance"]),
    );
    assert!(expr.eval(&multi));

    let auditor = MapObjectSet::new().with_object(
        "subject",
        Object::new()
            .with_attribute("department", "sales")
            .with_attribute("groups", vec!["staff", "auditors"]),
    );
    assert!(expr.eval(&auditor));

    let nobody = MapObjectSet::new();
    assert!(!expr.eval(&nobody));
}

#[test]
fn test_negative_operators_over_arrays() {
    let data = object_set(&[("files", Value::from(vec!["a.txt", "b.txt"]))]);

    assert!(ExprCell::leaf(Op::NotEndsWith, "files", ".exe").eval(&data));
    assert!(!ExprCell::leaf(Op::NotEndsWith, "files", "b.txt").eval(&data));
    assert!(ExprCell::leaf(Op::NotStartsWith, "files", "c").eval(&data));
    assert!(!ExprCell::leaf(Op::NotIn, "files", vec!["b.txt"]).eval(&data));
}

#[test]
fn test_numeric_ordering_across_int_and_float() {
    let data = object_set(&[("score", Value::Float(7.5)), ("age", Value::Int(30))]);
    assert!(ExprCell::leaf(Op::Gt, "score", 7).eval(&data));
    assert!(ExprCell::leaf(Op::Lte, "age", 30.0).eval(&data));
    assert!(!ExprCell::leaf(Op::Lt, "age", "40").eval(&data));
}

#[test]
fn test_malformed_policy_fails_closed() {
    let data = object_set(&[("level", Value::Int(2))]);
    // in/not_in need an array policy value
    assert!(!ExprCell::leaf(Op::In, "level", 2).eval(&data));
    assert!(!ExprCell::leaf(Op::NotIn, "level", 5).eval(&data));

    let unknown = ExprCell::from_json(r#"{"op": "regex", "field": "level", "value": ".*"}"#).unwrap();
    assert!(!unknown.eval(&data));
}

#[test]
fn test_concurrent_evaluation_of_shared_tree() {
    let expr = Arc::new(dept_and_level());

    let handles: Vec<_> = (0..8)
        .map(|i| {
            let expr = Arc::clone(&expr);
            thread::spawn(move || {
                let dept = if i % 2 == 0 { "finance" } else { "eng" };
                let data = object_set(&[("dept", Value::from(dept)), ("level", Value::Int(1))]);
                (0..100).all(|_| expr.eval(&data) == (i % 2 == 0))
            })
        })
        .collect();

    for handle in handles {
        assert!(handle.join().unwrap());
    }
}
