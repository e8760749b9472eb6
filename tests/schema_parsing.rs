//! Schema Parsing Tests
//!
//! End-to-end behavior of full and partial document validation:
//! - Constraint failures name the field and the bound
//! - Parsing is idempotent on its own output
//! - Optional and nullable compose in either order
//! - Update parsing omits absent fields and never injects defaults

use docshape::schema::{
    array, binary, boolean, date, decimal, number, object, object_id, string, tuple, union,
    NodeExt, Parse, Schema, SchemaNode, ValidationErrorCode,
};
use docshape::value::{Document, Value};
use serde_json::json;

// =============================================================================
// Helper Functions
// =============================================================================

fn v(json: serde_json::Value) -> Value {
    Value::from(json)
}

fn doc(json: serde_json::Value) -> Document {
    match v(json) {
        Value::Document(doc) => doc,
        other => panic!("not a document: {:?}", other),
    }
}

fn people() -> Schema {
    Schema::new(
        "people",
        object()
            .field("age", number().min(0).max(120))
            .field("name", string()),
    )
}

fn orders() -> Schema {
    Schema::new(
        "orders",
        object()
            .field("ref", string().trim().uppercase())
            .field("placedAt", date())
            .field("customer", object_id())
            .field("total", decimal())
            .field("paid", boolean().default(false))
            .field("notes", string().optional().nullable())
            .field(
                "lines",
                array(
                    object()
                        .field("sku", string().min_length(1))
                        .field("qty", number().integer().min(1)),
                )
                .min_length(1),
            )
            .field("geo", tuple().item(number()).item(number()).optional())
            .field("code", union().or(number()).or(string()))
            .field("blob", binary().optional()),
    )
}

fn order_input() -> Value {
    v(json!({
        "ref": "  ab-12 ",
        "placedAt": "2024-03-01T10:00:00Z",
        "customer": "65f1a2b3c4d5e6f708192a3b",
        "total": "19.99",
        "notes": null,
        "lines": [{ "sku": "A1", "qty": 2 }, { "sku": "B2", "qty": 1 }],
        "geo": [52.1, 4.3],
        "code": 7,
        "blob": [1, 2, 3]
    }))
}

// =============================================================================
// End-to-End Scenario
// =============================================================================

#[test]
fn test_age_bound_violation_names_field_and_bound() {
    let err = people()
        .parse(&v(json!({ "age": 150, "name": "x" })))
        .unwrap_err();
    assert_eq!(err.code(), ValidationErrorCode::ConstraintViolation);
    assert!(err.message().contains("age"));
    assert!(err.message().contains("120"));
}

#[test]
fn test_valid_person_round_trips_verbatim() {
    let out = people()
        .parse(&v(json!({ "age": 30, "name": "x" })))
        .unwrap();
    assert_eq!(out, doc(json!({ "age": 30, "name": "x" })));
}

#[test]
fn test_missing_required_field_reports_key() {
    let err = people().parse(&v(json!({ "age": 30 }))).unwrap_err();
    assert_eq!(err.code(), ValidationErrorCode::MissingRequiredField);
    assert_eq!(err.path(), ["name".to_string()]);
}

// =============================================================================
// Round-Trip Tests
// =============================================================================

#[test]
fn test_parse_is_idempotent_on_output() {
    let schema = orders();
    let first = schema.parse(&order_input()).unwrap();
    let second = schema.parse(&Value::Document(first.clone())).unwrap();
    assert_eq!(first, second);
}

#[test]
fn test_parse_normalizes_native_values() {
    let out = orders().parse(&order_input()).unwrap();
    assert_eq!(out.get("ref"), Some(&Value::from("AB-12")));
    assert!(matches!(out.get("placedAt"), Some(Value::DateTime(_))));
    assert!(matches!(out.get("customer"), Some(Value::ObjectId(_))));
    assert!(matches!(out.get("total"), Some(Value::Decimal(_))));
    assert!(matches!(out.get("blob"), Some(Value::Binary(_))));
    assert_eq!(out.get("paid"), Some(&Value::Boolean(false)));
    assert_eq!(out.get("notes"), Some(&Value::Null));
}

#[test]
fn test_round_trip_through_extended_json() {
    let schema = orders();
    let out = schema.parse(&order_input()).unwrap();
    let json = Value::Document(out.clone()).to_json();
    let reparsed = schema.parse(&Value::from(json)).unwrap();
    assert_eq!(reparsed, out);
}

// =============================================================================
// Wrapper Tests
// =============================================================================

#[test]
fn test_optional_nullable_either_order() {
    let a: SchemaNode = number().optional().nullable();
    let b: SchemaNode = number().nullable().optional();
    for node in [&a, &b] {
        assert_eq!(node.parse(None).unwrap(), None);
        assert_eq!(node.parse(Some(&Value::Null)).unwrap(), Some(Value::Null));
        assert_eq!(node.parse(Some(&Value::Undefined)).unwrap(), None);
    }
}

#[test]
fn test_update_omission_on_every_kind() {
    let nodes: Vec<SchemaNode> = vec![
        number().into(),
        string().into(),
        boolean().into(),
        date().into(),
        object_id().into(),
        decimal().into(),
        binary().into(),
        object().field("a", number()).into(),
        array(number()).into(),
        tuple().item(number()).into(),
        union().or(number()).or(string()).into(),
        number().default(5),
        string().optional(),
        string().nullable(),
    ];
    for node in &nodes {
        assert_eq!(node.parse_for_update(None).unwrap(), None, "{}", node.describe());
    }
}

#[test]
fn test_update_keeps_only_supplied_fields() {
    let schema = Schema::new(
        "t",
        object()
            .field("a", number())
            .field("b", string().optional())
            .field("c", boolean().default(true)),
    );
    let out = schema.parse_for_update(&v(json!({ "b": "x" }))).unwrap();
    assert_eq!(out, doc(json!({ "b": "x" })));
}

// =============================================================================
// Array Bound Tests
// =============================================================================

#[test]
fn test_array_length_bounds_inclusive() {
    let node: SchemaNode = array(number()).min_length(1).max_length(3).into();
    for len in 0..=4usize {
        let input = Value::Array((0..len).map(|i| Value::from(i as i32)).collect());
        let result = node.parse(Some(&input));
        if (1..=3).contains(&len) {
            assert!(result.is_ok(), "length {} should pass", len);
        } else {
            assert_eq!(
                result.unwrap_err().code(),
                ValidationErrorCode::ConstraintViolation
            );
        }
    }
}

#[test]
fn test_nested_array_error_path() {
    let mut input = order_input();
    if let Value::Document(d) = &mut input {
        d.insert("lines".into(), v(json!([{ "sku": "A1", "qty": 2 }, { "sku": "B2", "qty": 0 }])));
    }
    let err = orders().parse(&input).unwrap_err();
    assert_eq!(err.message(), "lines: [1] qty: must be at least 1");
    assert_eq!(err.path(), ["lines", "1", "qty"].map(String::from));
}

#[test]
fn test_undeclared_fields_are_stripped() {
    let out = people()
        .parse(&v(json!({ "age": 1, "name": "x", "extra": true })))
        .unwrap();
    assert!(!out.contains_key("extra"));
}

#[test]
fn test_array_output_never_gains_nulls() {
    let schema = Schema::new("notes", object().field("tags", array(string().optional())));
    let mut input = Document::new();
    input.insert(
        "tags".into(),
        Value::Array(vec![Value::from("a"), Value::Undefined]),
    );

    let err = schema.parse(&Value::Document(input)).unwrap_err();
    assert_eq!(err.code(), ValidationErrorCode::MissingRequiredField);
    assert_eq!(err.path(), ["tags", "1"].map(String::from));

    let out = schema.parse(&v(json!({ "tags": ["a", "b"] }))).unwrap();
    let again = schema.parse(&Value::Document(out.clone())).unwrap();
    assert_eq!(again, out);
}
