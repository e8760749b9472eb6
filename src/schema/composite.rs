//! Composite nodes: object, array, tuple, union.
//!
//! Composites delegate to their children and prefix child failures with the
//! key (`"<key>: ..."`) or position (`"[i] ..."`) so path context survives
//! the recursion.

use indexmap::IndexMap;

use crate::value::{Document, Value};

use super::errors::{ValidationError, ValidationErrorCode, ValidationResult};
use super::node::{present, Parse, SchemaNode};

fn mismatch(expected: &str, value: &Value) -> ValidationError {
    ValidationError::type_mismatch(expected, value.type_name())
}

// =============================================================================
// Object
// =============================================================================

/// An embedded document shape: key -> node in declaration order.
#[derive(Debug, Clone, Default)]
pub struct ObjectNode {
    fields: IndexMap<String, SchemaNode>,
    strict: bool,
}

impl ObjectNode {
    pub fn new() -> Self {
        Self::default()
    }

    /// Declares a field. Redeclaring a key replaces the earlier node.
    pub fn field(mut self, key: impl Into<String>, node: impl Into<SchemaNode>) -> Self {
        self.fields.insert(key.into(), node.into());
        self
    }

    /// Rejects undeclared input keys instead of stripping them.
    pub fn strict(mut self) -> Self {
        self.strict = true;
        self
    }

    pub fn fields(&self) -> &IndexMap<String, SchemaNode> {
        &self.fields
    }

    pub fn get(&self, key: &str) -> Option<&SchemaNode> {
        self.fields.get(key)
    }

    pub fn is_strict(&self) -> bool {
        self.strict
    }

    fn document<'a>(&self, value: &'a Value) -> ValidationResult<&'a Document> {
        let doc = value.as_document().ok_or_else(|| mismatch("object", value))?;
        self.reject_undeclared(doc, |_| false)?;
        Ok(doc)
    }

    /// In strict mode, fails on the first input key that is neither declared
    /// nor `allowed`.
    pub(crate) fn reject_undeclared(
        &self,
        doc: &Document,
        allowed: impl Fn(&str) -> bool,
    ) -> ValidationResult<()> {
        if !self.strict {
            return Ok(());
        }
        match doc
            .keys()
            .find(|k| !self.fields.contains_key(*k) && !allowed(k))
        {
            Some(extra) => Err(ValidationError::new(
                ValidationErrorCode::UnknownField,
                "field is not declared in the schema",
            )
            .within_field(extra)),
            None => Ok(()),
        }
    }

    /// Validates a present document field by field.
    pub(crate) fn parse_document(&self, doc: &Document) -> ValidationResult<Document> {
        let mut out = Document::with_capacity(self.fields.len());
        for (key, node) in &self.fields {
            let parsed = node.parse(doc.get(key)).map_err(|e| e.within_field(key))?;
            if let Some(value) = parsed {
                out.insert(key.clone(), value);
            }
        }
        Ok(out)
    }

    /// Validates only the fields present; absent children are omitted.
    pub(crate) fn parse_document_for_update(&self, doc: &Document) -> ValidationResult<Document> {
        let mut out = Document::new();
        for (key, node) in &self.fields {
            let parsed = node
                .parse_for_update(doc.get(key))
                .map_err(|e| e.within_field(key))?;
            if let Some(value) = parsed {
                out.insert(key.clone(), value);
            }
        }
        Ok(out)
    }
}

impl Parse for ObjectNode {
    fn parse(&self, input: Option<&Value>) -> ValidationResult<Option<Value>> {
        let value = present(input).ok_or_else(ValidationError::missing_required)?;
        let doc = self.document(value)?;
        self.parse_document(doc).map(|d| Some(Value::Document(d)))
    }

    fn parse_for_update(&self, input: Option<&Value>) -> ValidationResult<Option<Value>> {
        let Some(value) = present(input) else {
            return Ok(None);
        };
        let doc = self.document(value)?;
        self.parse_document_for_update(doc)
            .map(|d| Some(Value::Document(d)))
    }
}

// =============================================================================
// Array
// =============================================================================

#[derive(Debug, Clone)]
pub struct ArrayNode {
    element: Box<SchemaNode>,
    min_length: Option<usize>,
    max_length: Option<usize>,
}

impl ArrayNode {
    pub fn new(element: SchemaNode) -> Self {
        Self {
            element: Box::new(element),
            min_length: None,
            max_length: None,
        }
    }

    pub fn min_length(mut self, len: usize) -> Self {
        self.min_length = Some(len);
        self
    }

    pub fn max_length(mut self, len: usize) -> Self {
        self.max_length = Some(len);
        self
    }

    pub fn length(self, len: usize) -> Self {
        self.min_length(len).max_length(len)
    }

    pub fn element(&self) -> &SchemaNode {
        &self.element
    }

    fn items<'a>(&self, value: &'a Value) -> ValidationResult<&'a Vec<Value>> {
        let items = value.as_array().ok_or_else(|| mismatch("array", value))?;
        if let Some(min) = self.min_length {
            if items.len() < min {
                return Err(ValidationError::constraint(format!(
                    "must contain at least {} element(s)",
                    min
                )));
            }
        }
        if let Some(max) = self.max_length {
            if items.len() > max {
                return Err(ValidationError::constraint(format!(
                    "must contain at most {} element(s)",
                    max
                )));
            }
        }
        Ok(items)
    }
}

impl Parse for ArrayNode {
    fn parse(&self, input: Option<&Value>) -> ValidationResult<Option<Value>> {
        let value = present(input).ok_or_else(ValidationError::missing_required)?;
        let items = self.items(value)?;
        let mut out = Vec::with_capacity(items.len());
        for (i, item) in items.iter().enumerate() {
            let parsed = self.element.parse(Some(item));
            out.push(slot(parsed).map_err(|e| e.within_index(i))?);
        }
        Ok(Some(Value::Array(out)))
    }

    fn parse_for_update(&self, input: Option<&Value>) -> ValidationResult<Option<Value>> {
        let Some(value) = present(input) else {
            return Ok(None);
        };
        let items = self.items(value)?;
        let mut out = Vec::with_capacity(items.len());
        for (i, item) in items.iter().enumerate() {
            out.push(element_for_update(&self.element, item).map_err(|e| e.within_index(i))?);
        }
        Ok(Some(Value::Array(out)))
    }
}

/// Elements of a present array cannot be omitted: an absent partial result
/// falls back to a full parse.
fn element_for_update(node: &SchemaNode, item: &Value) -> ValidationResult<Value> {
    match node.parse_for_update(Some(item))? {
        Some(value) => Ok(value),
        None => slot(node.parse(Some(item))),
    }
}

/// An array position always holds a value; an element that parses to
/// absent (`Undefined` under an optional node) is rejected.
fn slot(parsed: ValidationResult<Option<Value>>) -> ValidationResult<Value> {
    parsed?.ok_or_else(|| {
        ValidationError::new(
            ValidationErrorCode::MissingRequiredField,
            "array elements cannot be omitted",
        )
    })
}

// =============================================================================
// Tuple
// =============================================================================

/// Fixed-length positional array.
#[derive(Debug, Clone, Default)]
pub struct TupleNode {
    items: Vec<SchemaNode>,
}

impl TupleNode {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn item(mut self, node: impl Into<SchemaNode>) -> Self {
        self.items.push(node.into());
        self
    }

    pub fn items(&self) -> &[SchemaNode] {
        &self.items
    }

    fn positions<'a>(&self, value: &'a Value) -> ValidationResult<&'a Vec<Value>> {
        let items = value.as_array().ok_or_else(|| mismatch("tuple", value))?;
        if items.len() != self.items.len() {
            return Err(ValidationError::structural(format!(
                "length mismatch: expected {} element(s), received {}",
                self.items.len(),
                items.len()
            )));
        }
        Ok(items)
    }
}

impl Parse for TupleNode {
    fn parse(&self, input: Option<&Value>) -> ValidationResult<Option<Value>> {
        let value = present(input).ok_or_else(ValidationError::missing_required)?;
        let items = self.positions(value)?;
        let mut out = Vec::with_capacity(items.len());
        for (i, (node, item)) in self.items.iter().zip(items).enumerate() {
            out.push(slot(node.parse(Some(item))).map_err(|e| e.within_index(i))?);
        }
        Ok(Some(Value::Array(out)))
    }

    fn parse_for_update(&self, input: Option<&Value>) -> ValidationResult<Option<Value>> {
        let Some(value) = present(input) else {
            return Ok(None);
        };
        let items = self.positions(value)?;
        let mut out = Vec::with_capacity(items.len());
        for (i, (node, item)) in self.items.iter().zip(items).enumerate() {
            out.push(element_for_update(node, item).map_err(|e| e.within_index(i))?);
        }
        Ok(Some(Value::Array(out)))
    }
}

// =============================================================================
// Union
// =============================================================================

/// Ordered alternatives; the first candidate that accepts the input wins.
#[derive(Debug, Clone, Default)]
pub struct UnionNode {
    variants: Vec<SchemaNode>,
}

impl UnionNode {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn or(mut self, node: impl Into<SchemaNode>) -> Self {
        self.variants.push(node.into());
        self
    }

    pub fn variants(&self) -> &[SchemaNode] {
        &self.variants
    }

    fn no_match(&self, value: Option<&Value>, last: Option<ValidationError>) -> ValidationError {
        let expected: Vec<String> = self.variants.iter().map(SchemaNode::describe).collect();
        let received = value.map_or("undefined", Value::type_name);
        let err = ValidationError::new(
            ValidationErrorCode::TypeMismatch,
            format!(
                "no union variant matched: expected one of [{}], received {}",
                expected.join(", "),
                received
            ),
        );
        match last {
            Some(cause) => err.with_cause(cause),
            None => err,
        }
    }
}

impl Parse for UnionNode {
    fn parse(&self, input: Option<&Value>) -> ValidationResult<Option<Value>> {
        let input = present(input);
        let mut last = None;
        for candidate in &self.variants {
            match candidate.parse(input) {
                Ok(parsed) => return Ok(parsed),
                Err(e) => last = Some(e),
            }
        }
        Err(self.no_match(input, last))
    }

    fn parse_for_update(&self, input: Option<&Value>) -> ValidationResult<Option<Value>> {
        let input = present(input);
        if input.is_none() {
            return Ok(None);
        }
        let mut last = None;
        for candidate in &self.variants {
            match candidate.parse_for_update(input) {
                Ok(Some(parsed)) => return Ok(Some(parsed)),
                Ok(None) => {}
                Err(e) => last = Some(e),
            }
        }
        Err(self.no_match(input, last))
    }
}
