//! Update-operator validation.
//!
//! Every `(operator, path, payload)` triple is checked against the node the
//! path resolves to. Validation stops at the first failure, which is
//! reported as `"$<operator>.<path>: <reason>"`.

use tracing::trace;

use crate::schema::{
    date, ArrayNode, NodeType, ObjectNode, Parse, SchemaNode, SchemaOptions, ValidationError,
    ValidationErrorCode, ValidationResult,
};
use crate::value::{Document, Value};

use super::operators::UpdateOperator;
use super::path::{resolve_path, ResolvedPath};

const PUSH_MODIFIERS: [&str; 4] = ["$each", "$slice", "$position", "$sort"];
const BIT_OPERATIONS: [&str; 3] = ["and", "or", "xor"];

/// Validates an update document of the form `{ "$op": { "path": payload } }`.
///
/// Operator names are checked before any payload so a typo'd operator is
/// reported even when another operator's payload is also wrong.
pub fn validate_mutation(
    update: &Document,
    shape: &ObjectNode,
    options: &SchemaOptions,
) -> ValidationResult<()> {
    let operators = update
        .keys()
        .map(|key| key.parse::<UpdateOperator>())
        .collect::<ValidationResult<Vec<_>>>()?;

    let context = Context {
        shape,
        options,
        timestamp: SchemaNode::from(date()),
    };

    for (op, payload) in operators.into_iter().zip(update.values()) {
        let fields = payload.as_document().ok_or_else(|| {
            ValidationError::invalid_payload(format!(
                "{} expects a document of field paths, received {}",
                op,
                payload.type_name()
            ))
        })?;
        for (path, arg) in fields {
            context
                .check(op, path, arg)
                .map_err(|e| e.within_operator(op.as_str(), path))?;
            trace!(operator = op.as_str(), path = path.as_str(), "update operator validated");
        }
    }
    Ok(())
}

struct Context<'a> {
    shape: &'a ObjectNode,
    options: &'a SchemaOptions,
    timestamp: SchemaNode,
}

impl Context<'_> {
    fn resolve(&self, path: &str) -> ValidationResult<ResolvedPath<'_>> {
        if self.shape.get(path).is_none() && self.options.is_timestamp_field(path) {
            return Ok(ResolvedPath {
                node: &self.timestamp,
                is_optional: true,
                is_nullable: false,
            });
        }
        resolve_path(path, self.shape)?
            .ok_or_else(|| ValidationError::structural("empty field path"))
    }

    fn check(&self, op: UpdateOperator, path: &str, arg: &Value) -> ValidationResult<()> {
        if op == UpdateOperator::CurrentDate
            && self.shape.get(path).is_none()
            && self.options.is_timestamp_field(path)
        {
            return Ok(());
        }

        let target = self.resolve(path)?;
        match op {
            UpdateOperator::Set | UpdateOperator::SetOnInsert => check_set(&target, arg),
            UpdateOperator::Unset => check_unset(&target, arg),
            UpdateOperator::Inc | UpdateOperator::Mul => {
                if !arg.is_number() {
                    return Err(ValidationError::invalid_payload(format!(
                        "expected a numeric payload, received {}",
                        arg.type_name()
                    )));
                }
                expect_target(&target, NodeType::Number)
            }
            UpdateOperator::Min | UpdateOperator::Max => check_value(target.node, arg),
            UpdateOperator::CurrentDate => {
                check_current_date_payload(arg)?;
                expect_target(&target, NodeType::Date)
            }
            UpdateOperator::Push => check_push(array_target(&target)?, arg, &PUSH_MODIFIERS),
            UpdateOperator::AddToSet => check_push(array_target(&target)?, arg, &["$each"]),
            UpdateOperator::Pull => {
                let array = array_target(&target)?;
                match arg {
                    // match expression, not a value
                    Value::Document(_) => Ok(()),
                    _ => check_value(array.element(), arg),
                }
            }
            UpdateOperator::PullAll => {
                let array = array_target(&target)?;
                let members = arg.as_array().ok_or_else(|| {
                    ValidationError::invalid_payload(format!(
                        "expected an array payload, received {}",
                        arg.type_name()
                    ))
                })?;
                check_elements(array, members)
            }
            UpdateOperator::Pop => {
                array_target(&target)?;
                match arg.as_f64() {
                    Some(n) if n == 1.0 || n == -1.0 => Ok(()),
                    _ => Err(ValidationError::invalid_payload("payload must be 1 or -1")),
                }
            }
            UpdateOperator::Bit => {
                expect_target(&target, NodeType::Number)?;
                check_bit_payload(arg)
            }
            UpdateOperator::Rename => self.check_rename(&target, arg),
        }
    }

    fn check_rename(&self, source: &ResolvedPath<'_>, arg: &Value) -> ValidationResult<()> {
        let to = arg.as_str().ok_or_else(|| {
            ValidationError::invalid_payload(format!(
                "rename target must be a string path, received {}",
                arg.type_name()
            ))
        })?;
        let target = self.resolve(to)?;
        let (from_type, to_type) = (source.node.node_type(), target.node.node_type());
        if from_type != to_type {
            return Err(ValidationError::new(
                ValidationErrorCode::TypeMismatch,
                format!(
                    "cannot rename {} field to {} field '{}'",
                    from_type, to_type, to
                ),
            ));
        }
        Ok(())
    }
}

fn check_set(target: &ResolvedPath<'_>, arg: &Value) -> ValidationResult<()> {
    match arg {
        Value::Undefined => Err(ValidationError::invalid_payload(
            "undefined is not a value, use $unset instead",
        )),
        Value::Null if target.is_nullable => Ok(()),
        _ => check_value(target.node, arg),
    }
}

fn check_unset(target: &ResolvedPath<'_>, arg: &Value) -> ValidationResult<()> {
    let accepted = match arg {
        Value::String(s) => s.is_empty(),
        Value::Boolean(b) => *b,
        other => other.as_f64() == Some(1.0),
    };
    if !accepted {
        return Err(ValidationError::invalid_payload(
            "payload must be \"\", 1 or true",
        ));
    }
    if !target.is_optional {
        return Err(ValidationError::new(
            ValidationErrorCode::MissingRequiredField,
            "cannot unset a required field",
        ));
    }
    Ok(())
}

fn check_value(node: &SchemaNode, arg: &Value) -> ValidationResult<()> {
    if arg.is_undefined() {
        return Err(ValidationError::invalid_payload("undefined is not a value"));
    }
    node.parse_for_update(Some(arg)).map(drop)
}

fn check_elements(array: &ArrayNode, elements: &[Value]) -> ValidationResult<()> {
    for (i, element) in elements.iter().enumerate() {
        check_value(array.element(), element).map_err(|e| e.within_index(i))?;
    }
    Ok(())
}

fn check_push(array: &ArrayNode, arg: &Value, allowed: &[&str]) -> ValidationResult<()> {
    let modifiers = match arg {
        Value::Document(doc) if doc.keys().any(|k| k.starts_with('$')) => doc,
        _ => return check_value(array.element(), arg),
    };

    if let Some(key) = modifiers.keys().find(|k| !allowed.contains(&k.as_str())) {
        return Err(ValidationError::invalid_payload(format!(
            "unsupported modifier '{}'",
            key
        )));
    }
    let each = modifiers
        .get("$each")
        .ok_or_else(|| ValidationError::invalid_payload("modifiers require $each"))?;
    let elements = each.as_array().ok_or_else(|| {
        ValidationError::invalid_payload(format!(
            "$each must be an array, received {}",
            each.type_name()
        ))
    })?;

    for key in ["$slice", "$position"] {
        if let Some(v) = modifiers.get(key) {
            if !is_integer(v) {
                return Err(ValidationError::invalid_payload(format!(
                    "{} must be an integer",
                    key
                )));
            }
        }
    }
    if let Some(sort) = modifiers.get("$sort") {
        check_sort(sort)?;
    }

    check_elements(array, elements)
}

fn check_sort(sort: &Value) -> ValidationResult<()> {
    let valid = match sort {
        Value::Document(fields) => !fields.is_empty() && fields.values().all(is_direction),
        other => is_direction(other),
    };
    if valid {
        Ok(())
    } else {
        Err(ValidationError::invalid_payload(
            "$sort must be 1, -1 or a document of field directions",
        ))
    }
}

fn check_current_date_payload(arg: &Value) -> ValidationResult<()> {
    let valid = match arg {
        Value::Boolean(_) => true,
        Value::Document(type_doc) => {
            type_doc.len() == 1
                && matches!(
                    type_doc.get("$type").and_then(Value::as_str),
                    Some("date") | Some("timestamp")
                )
        }
        _ => false,
    };
    if valid {
        Ok(())
    } else {
        Err(ValidationError::invalid_payload(
            "payload must be a boolean or { $type: \"date\" | \"timestamp\" }",
        ))
    }
}

fn check_bit_payload(arg: &Value) -> ValidationResult<()> {
    let operation = arg.as_document().ok_or_else(|| {
        ValidationError::invalid_payload(format!(
            "expected a document payload, received {}",
            arg.type_name()
        ))
    })?;
    let mut entries = operation.iter();
    match (entries.next(), entries.next()) {
        (Some((op, operand)), None) if BIT_OPERATIONS.contains(&op.as_str()) => {
            if operand.as_i64().is_some() {
                Ok(())
            } else {
                Err(ValidationError::invalid_payload(format!(
                    "{} operand must be an integer",
                    op
                )))
            }
        }
        _ => Err(ValidationError::invalid_payload(
            "payload must have exactly one of and, or, xor",
        )),
    }
}

fn array_target<'a>(target: &ResolvedPath<'a>) -> ValidationResult<&'a ArrayNode> {
    target
        .node
        .as_array()
        .ok_or_else(|| target_mismatch(NodeType::Array, target.node.node_type()))
}

fn expect_target(target: &ResolvedPath<'_>, expected: NodeType) -> ValidationResult<()> {
    let actual = target.node.node_type();
    if actual == expected {
        Ok(())
    } else {
        Err(target_mismatch(expected, actual))
    }
}

fn target_mismatch(expected: NodeType, actual: NodeType) -> ValidationError {
    ValidationError::new(
        ValidationErrorCode::TypeMismatch,
        format!("target field is {}, expected {}", actual, expected),
    )
}

fn is_integer(value: &Value) -> bool {
    match value {
        Value::Int32(_) | Value::Int64(_) => true,
        Value::Double(n) => n.fract() == 0.0,
        _ => false,
    }
}

fn is_direction(value: &Value) -> bool {
    matches!(value.as_f64(), Some(n) if n == 1.0 || n == -1.0)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::schema::{array, boolean, number, object, string, NodeExt};
    use serde_json::json;

    fn shape() -> ObjectNode {
        object()
            .field("name", string())
            .field("nickname", string().optional())
            .field("bio", string().nullable())
            .field("age", number().min(0))
            .field("tags", array(string()))
            .field("seenAt", date())
            .field("active", boolean())
    }

    fn update(json: serde_json::Value) -> Document {
        match Value::from(json) {
            Value::Document(doc) => doc,
            other => panic!("not a document: {:?}", other),
        }
    }

    fn check(json: serde_json::Value) -> ValidationResult<()> {
        validate_mutation(&update(json), &shape(), &SchemaOptions::default())
    }

    #[test]
    fn test_empty_update_is_accepted() {
        assert!(check(json!({})).is_ok());
    }

    #[test]
    fn test_unknown_operator_checked_first() {
        let err = check(json!({ "$set": { "age": "x" }, "$bogus": {} })).unwrap_err();
        assert_eq!(err.code(), ValidationErrorCode::UnknownOperator);
    }

    #[test]
    fn test_non_document_operator_payload() {
        let err = check(json!({ "$set": 1 })).unwrap_err();
        assert_eq!(err.code(), ValidationErrorCode::InvalidOperatorPayload);
    }

    #[test]
    fn test_set_null_requires_nullable() {
        assert!(check(json!({ "$set": { "bio": null } })).is_ok());
        let err = check(json!({ "$set": { "name": null } })).unwrap_err();
        assert_eq!(err.code(), ValidationErrorCode::TypeMismatch);
        assert!(err.message().starts_with("$set.name: "));
    }

    #[test]
    fn test_set_undefined_points_to_unset() {
        let mut fields = Document::new();
        fields.insert("nickname".into(), Value::Undefined);
        let mut doc = Document::new();
        doc.insert("$set".into(), Value::Document(fields));
        let err = validate_mutation(&doc, &shape(), &SchemaOptions::default()).unwrap_err();
        assert!(err.message().contains("use $unset instead"));
    }

    #[test]
    fn test_inc_distinguishes_payload_and_target() {
        let err = check(json!({ "$inc": { "age": "1" } })).unwrap_err();
        assert_eq!(err.code(), ValidationErrorCode::InvalidOperatorPayload);
        let err = check(json!({ "$inc": { "name": 1 } })).unwrap_err();
        assert_eq!(err.code(), ValidationErrorCode::TypeMismatch);
        assert!(check(json!({ "$mul": { "age": 2.5 } })).is_ok());
    }

    #[test]
    fn test_push_modifiers() {
        assert!(check(json!({ "$push": { "tags": { "$each": ["a"], "$slice": -5, "$sort": 1 } } })).is_ok());
        let err = check(json!({ "$push": { "tags": { "$each": ["a"], "$limit": 1 } } })).unwrap_err();
        assert_eq!(err.code(), ValidationErrorCode::InvalidOperatorPayload);
        let err = check(json!({ "$addToSet": { "tags": { "$each": ["a"], "$slice": 1 } } })).unwrap_err();
        assert_eq!(err.code(), ValidationErrorCode::InvalidOperatorPayload);
    }

    #[test]
    fn test_each_elements_are_indexed_in_message() {
        let err = check(json!({ "$push": { "tags": { "$each": ["a", 2] } } })).unwrap_err();
        assert_eq!(
            err.message(),
            "$push.tags: [1] expected string, received number"
        );
    }

    #[test]
    fn test_current_date_on_timestamp_field_is_exempt() {
        let options = SchemaOptions::with_timestamps();
        let doc = update(json!({ "$currentDate": { "updatedAt": true } }));
        assert!(validate_mutation(&doc, &shape(), &options).is_ok());
        assert!(validate_mutation(&doc, &shape(), &SchemaOptions::default()).is_err());

        let doc = update(json!({ "$set": { "createdAt": "not a date" } }));
        assert!(validate_mutation(&doc, &shape(), &options).is_err());
    }

    #[test]
    fn test_bit_payload_shape() {
        assert!(check(json!({ "$bit": { "age": { "and": 5 } } })).is_ok());
        assert!(check(json!({ "$bit": { "age": { "and": 5, "or": 1 } } })).is_err());
        assert!(check(json!({ "$bit": { "age": { "and": 1.5 } } })).is_err());
        assert!(check(json!({ "$bit": { "name": { "xor": 1 } } })).is_err());
    }
}
