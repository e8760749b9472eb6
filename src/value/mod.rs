//! Document value model for docshape
//!
//! Documents are validated in the store's native representation rather than
//! raw JSON, so database scalars (object identifiers, decimals, binary blobs,
//! instants) keep their identity through parsing.
//!
//! # Design Principles
//!
//! - Insertion-ordered documents (declaration order is preserved on output)
//! - `Undefined` is distinct from `Null`
//! - Lossless conversion to and from relaxed extended JSON

mod json;
mod types;

pub use types::{Binary, BinarySubtype, Decimal128, ObjectId};

use chrono::{DateTime, Utc};
use indexmap::IndexMap;

/// An insertion-ordered document.
pub type Document = IndexMap<String, Value>;

/// A document value.
#[derive(Debug, Clone, PartialEq)]
pub enum Value {
    /// Explicitly undefined (treated as absent by every node)
    Undefined,
    /// Null
    Null,
    /// Boolean
    Boolean(bool),
    /// 32-bit signed integer
    Int32(i32),
    /// 64-bit signed integer
    Int64(i64),
    /// 64-bit floating point
    Double(f64),
    /// UTF-8 string
    String(String),
    /// Array of values
    Array(Vec<Value>),
    /// Embedded document
    Document(Document),
    /// UTC instant, millisecond precision
    DateTime(DateTime<Utc>),
    /// Object identifier
    ObjectId(ObjectId),
    /// High-precision decimal
    Decimal(Decimal128),
    /// Tagged binary blob
    Binary(Binary),
}

impl Value {
    /// Returns the type name for error messages
    pub fn type_name(&self) -> &'static str {
        match self {
            Value::Undefined => "undefined",
            Value::Null => "null",
            Value::Boolean(_) => "boolean",
            Value::Int32(_) | Value::Int64(_) | Value::Double(_) => "number",
            Value::String(_) => "string",
            Value::Array(_) => "array",
            Value::Document(_) => "object",
            Value::DateTime(_) => "date",
            Value::ObjectId(_) => "objectId",
            Value::Decimal(_) => "decimal",
            Value::Binary(_) => "binary",
        }
    }

    /// Returns the numeric value as f64 for any of the number variants.
    pub fn as_f64(&self) -> Option<f64> {
        match self {
            Value::Int32(n) => Some(f64::from(*n)),
            Value::Int64(n) => Some(*n as f64),
            Value::Double(n) => Some(*n),
            _ => None,
        }
    }

    /// Returns the value as i64 if it is an integer variant.
    pub fn as_i64(&self) -> Option<i64> {
        match self {
            Value::Int32(n) => Some(i64::from(*n)),
            Value::Int64(n) => Some(*n),
            _ => None,
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            Value::String(s) => Some(s),
            _ => None,
        }
    }

    pub fn as_array(&self) -> Option<&Vec<Value>> {
        match self {
            Value::Array(items) => Some(items),
            _ => None,
        }
    }

    pub fn as_document(&self) -> Option<&Document> {
        match self {
            Value::Document(doc) => Some(doc),
            _ => None,
        }
    }

    pub fn is_number(&self) -> bool {
        matches!(self, Value::Int32(_) | Value::Int64(_) | Value::Double(_))
    }

    pub fn is_null(&self) -> bool {
        matches!(self, Value::Null)
    }

    pub fn is_undefined(&self) -> bool {
        matches!(self, Value::Undefined)
    }
}

impl From<bool> for Value {
    fn from(v: bool) -> Self {
        Value::Boolean(v)
    }
}

impl From<i32> for Value {
    fn from(v: i32) -> Self {
        Value::Int32(v)
    }
}

impl From<i64> for Value {
    fn from(v: i64) -> Self {
        Value::Int64(v)
    }
}

impl From<f64> for Value {
    fn from(v: f64) -> Self {
        Value::Double(v)
    }
}

impl From<&str> for Value {
    fn from(v: &str) -> Self {
        Value::String(v.to_string())
    }
}

impl From<String> for Value {
    fn from(v: String) -> Self {
        Value::String(v)
    }
}

impl From<DateTime<Utc>> for Value {
    fn from(v: DateTime<Utc>) -> Self {
        Value::DateTime(v)
    }
}

impl From<ObjectId> for Value {
    fn from(v: ObjectId) -> Self {
        Value::ObjectId(v)
    }
}

impl From<Decimal128> for Value {
    fn from(v: Decimal128) -> Self {
        Value::Decimal(v)
    }
}

impl From<Binary> for Value {
    fn from(v: Binary) -> Self {
        Value::Binary(v)
    }
}

impl From<Document> for Value {
    fn from(v: Document) -> Self {
        Value::Document(v)
    }
}

impl<T: Into<Value>> From<Vec<T>> for Value {
    fn from(v: Vec<T>) -> Self {
        Value::Array(v.into_iter().map(Into::into).collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_type_names() {
        assert_eq!(Value::Int32(1).type_name(), "number");
        assert_eq!(Value::Double(1.5).type_name(), "number");
        assert_eq!(Value::Null.type_name(), "null");
        assert_eq!(Value::Undefined.type_name(), "undefined");
        assert_eq!(Value::Document(Document::new()).type_name(), "object");
    }

    #[test]
    fn test_numeric_accessors() {
        assert_eq!(Value::Int32(3).as_f64(), Some(3.0));
        assert_eq!(Value::Int64(-7).as_i64(), Some(-7));
        assert_eq!(Value::Double(2.5).as_i64(), None);
        assert_eq!(Value::String("3".into()).as_f64(), None);
    }

    #[test]
    fn test_document_equality_ignores_order() {
        let mut a = Document::new();
        a.insert("x".into(), Value::Int32(1));
        a.insert("y".into(), Value::Int32(2));
        let mut b = Document::new();
        b.insert("y".into(), Value::Int32(2));
        b.insert("x".into(), Value::Int32(1));
        assert_eq!(Value::Document(a), Value::Document(b));
    }
}
