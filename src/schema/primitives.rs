//! Primitive and database scalar nodes
//!
//! Each node checks type identity first, then its constraints in a fixed
//! order: range, membership, pattern.

use chrono::{DateTime, NaiveDate, NaiveDateTime, SecondsFormat, TimeZone, Utc};
use regex::Regex;

use crate::value::{Binary, BinarySubtype, Decimal128, ObjectId, Value};

use super::errors::{ValidationError, ValidationResult};

/// Formats a bound without a trailing `.0` for integral values.
pub(crate) fn fmt_number(n: f64) -> String {
    if n.fract() == 0.0 && n.abs() < 1e15 {
        format!("{}", n as i64)
    } else {
        format!("{}", n)
    }
}

fn mismatch(expected: &str, value: &Value) -> ValidationError {
    ValidationError::type_mismatch(expected, value.type_name())
}

// =============================================================================
// Number
// =============================================================================

#[derive(Debug, Clone, Default)]
pub struct NumberNode {
    min: Option<f64>,
    max: Option<f64>,
    integer: bool,
    one_of: Vec<f64>,
}

impl NumberNode {
    pub fn new() -> Self {
        Self::default()
    }

    /// Inclusive lower bound.
    pub fn min(mut self, min: impl Into<f64>) -> Self {
        self.min = Some(min.into());
        self
    }

    /// Inclusive upper bound.
    pub fn max(mut self, max: impl Into<f64>) -> Self {
        self.max = Some(max.into());
        self
    }

    /// Rejects values with a fractional part.
    pub fn integer(mut self) -> Self {
        self.integer = true;
        self
    }

    pub fn one_of(mut self, values: impl IntoIterator<Item = impl Into<f64>>) -> Self {
        self.one_of = values.into_iter().map(Into::into).collect();
        self
    }

    pub(crate) fn check(&self, value: &Value) -> ValidationResult<Value> {
        let n = match value.as_f64() {
            Some(n) if !n.is_nan() => n,
            Some(_) => return Err(ValidationError::type_mismatch("number", "NaN")),
            None => return Err(mismatch("number", value)),
        };

        if let Some(min) = self.min {
            if n < min {
                return Err(ValidationError::constraint(format!(
                    "must be at least {}",
                    fmt_number(min)
                )));
            }
        }
        if let Some(max) = self.max {
            if n > max {
                return Err(ValidationError::constraint(format!(
                    "must be at most {}",
                    fmt_number(max)
                )));
            }
        }
        if self.integer && n.fract() != 0.0 {
            return Err(ValidationError::constraint("must be an integer"));
        }
        if !self.one_of.is_empty() && !self.one_of.contains(&n) {
            let allowed: Vec<String> = self.one_of.iter().map(|v| fmt_number(*v)).collect();
            return Err(ValidationError::constraint(format!(
                "must be one of [{}]",
                allowed.join(", ")
            )));
        }

        Ok(value.clone())
    }
}

// =============================================================================
// String
// =============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum CaseTransform {
    Lower,
    Upper,
}

#[derive(Debug, Clone, Default)]
pub struct StringNode {
    min_length: Option<usize>,
    max_length: Option<usize>,
    one_of: Vec<String>,
    pattern: Option<Regex>,
    trim: bool,
    case: Option<CaseTransform>,
}

impl StringNode {
    pub fn new() -> Self {
        Self::default()
    }

    /// Minimum length in characters.
    pub fn min_length(mut self, len: usize) -> Self {
        self.min_length = Some(len);
        self
    }

    /// Maximum length in characters.
    pub fn max_length(mut self, len: usize) -> Self {
        self.max_length = Some(len);
        self
    }

    /// Exact length in characters.
    pub fn length(self, len: usize) -> Self {
        self.min_length(len).max_length(len)
    }

    pub fn one_of<S: Into<String>>(mut self, values: impl IntoIterator<Item = S>) -> Self {
        self.one_of = values.into_iter().map(Into::into).collect();
        self
    }

    pub fn pattern(mut self, pattern: Regex) -> Self {
        self.pattern = Some(pattern);
        self
    }

    /// Strips surrounding whitespace before constraints run.
    pub fn trim(mut self) -> Self {
        self.trim = true;
        self
    }

    pub fn lowercase(mut self) -> Self {
        self.case = Some(CaseTransform::Lower);
        self
    }

    pub fn uppercase(mut self) -> Self {
        self.case = Some(CaseTransform::Upper);
        self
    }

    pub(crate) fn check(&self, value: &Value) -> ValidationResult<Value> {
        let Value::String(raw) = value else {
            return Err(mismatch("string", value));
        };

        let mut s = if self.trim { raw.trim().to_string() } else { raw.clone() };
        match self.case {
            Some(CaseTransform::Lower) => s = s.to_lowercase(),
            Some(CaseTransform::Upper) => s = s.to_uppercase(),
            None => {}
        }

        let len = s.chars().count();
        if let Some(min) = self.min_length {
            if len < min {
                return Err(ValidationError::constraint(format!(
                    "must contain at least {} characters",
                    min
                )));
            }
        }
        if let Some(max) = self.max_length {
            if len > max {
                return Err(ValidationError::constraint(format!(
                    "must contain at most {} characters",
                    max
                )));
            }
        }
        if !self.one_of.is_empty() && !self.one_of.contains(&s) {
            let allowed: Vec<String> = self.one_of.iter().map(|v| format!("\"{}\"", v)).collect();
            return Err(ValidationError::constraint(format!(
                "must be one of [{}]",
                allowed.join(", ")
            )));
        }
        if let Some(pattern) = &self.pattern {
            if !pattern.is_match(&s) {
                return Err(ValidationError::constraint(format!(
                    "must match pattern /{}/",
                    pattern.as_str()
                )));
            }
        }

        Ok(Value::String(s))
    }
}

// =============================================================================
// Boolean
// =============================================================================

#[derive(Debug, Clone, Copy, Default)]
pub struct BooleanNode;

impl BooleanNode {
    pub(crate) fn check(&self, value: &Value) -> ValidationResult<Value> {
        match value {
            Value::Boolean(_) => Ok(value.clone()),
            other => Err(mismatch("boolean", other)),
        }
    }
}

// =============================================================================
// Date
// =============================================================================

#[derive(Debug, Clone, Default)]
pub struct DateNode {
    after: Option<DateTime<Utc>>,
    before: Option<DateTime<Utc>>,
}

impl DateNode {
    pub fn new() -> Self {
        Self::default()
    }

    /// Inclusive lower bound.
    pub fn after(mut self, instant: DateTime<Utc>) -> Self {
        self.after = Some(instant);
        self
    }

    /// Inclusive upper bound.
    pub fn before(mut self, instant: DateTime<Utc>) -> Self {
        self.before = Some(instant);
        self
    }

    pub(crate) fn check(&self, value: &Value) -> ValidationResult<Value> {
        let instant = match value {
            Value::DateTime(dt) => *dt,
            Value::String(s) => parse_date_string(s).ok_or_else(invalid_date)?,
            Value::Int32(_) | Value::Int64(_) | Value::Double(_) => {
                epoch_millis(value).ok_or_else(invalid_date)?
            }
            other => return Err(mismatch("date", other)),
        };

        if let Some(after) = self.after {
            if instant < after {
                return Err(ValidationError::constraint(format!(
                    "must be on or after {}",
                    after.to_rfc3339_opts(SecondsFormat::Millis, true)
                )));
            }
        }
        if let Some(before) = self.before {
            if instant > before {
                return Err(ValidationError::constraint(format!(
                    "must be on or before {}",
                    before.to_rfc3339_opts(SecondsFormat::Millis, true)
                )));
            }
        }

        Ok(Value::DateTime(instant))
    }
}

fn invalid_date() -> ValidationError {
    ValidationError::constraint("invalid date")
}

fn parse_date_string(s: &str) -> Option<DateTime<Utc>> {
    let s = s.trim();
    if let Ok(dt) = DateTime::parse_from_rfc3339(s) {
        return Some(dt.with_timezone(&Utc));
    }
    if let Ok(naive) = NaiveDateTime::parse_from_str(s, "%Y-%m-%dT%H:%M:%S%.f") {
        return Some(Utc.from_utc_datetime(&naive));
    }
    if let Ok(day) = NaiveDate::parse_from_str(s, "%Y-%m-%d") {
        return day.and_hms_opt(0, 0, 0).map(|naive| Utc.from_utc_datetime(&naive));
    }
    None
}

fn epoch_millis(value: &Value) -> Option<DateTime<Utc>> {
    let millis = match value {
        Value::Double(n) if !n.is_finite() => return None,
        Value::Double(n) if n.abs() > i64::MAX as f64 => return None,
        Value::Double(n) => n.trunc() as i64,
        other => other.as_i64()?,
    };
    Utc.timestamp_millis_opt(millis).single()
}

// =============================================================================
// Database scalars
// =============================================================================

#[derive(Debug, Clone, Copy, Default)]
pub struct ObjectIdNode;

impl ObjectIdNode {
    /// Accepts an identifier or its 24-character hex form.
    pub(crate) fn check(&self, value: &Value) -> ValidationResult<Value> {
        match value {
            Value::ObjectId(_) => Ok(value.clone()),
            Value::String(s) => ObjectId::parse_hex(s)
                .map(Value::ObjectId)
                .ok_or_else(|| ValidationError::type_mismatch("objectId", "string")),
            other => Err(mismatch("objectId", other)),
        }
    }
}

#[derive(Debug, Clone, Copy, Default)]
pub struct DecimalNode;

impl DecimalNode {
    /// Accepts a decimal, a decimal literal string, or a number.
    pub(crate) fn check(&self, value: &Value) -> ValidationResult<Value> {
        let decimal = match value {
            Value::Decimal(_) => return Ok(value.clone()),
            Value::String(s) => Decimal128::parse(s),
            Value::Int32(n) => Decimal128::parse(&n.to_string()),
            Value::Int64(n) => Decimal128::parse(&n.to_string()),
            Value::Double(n) if n.is_finite() => Decimal128::parse(&n.to_string()),
            _ => None,
        };
        decimal
            .map(Value::Decimal)
            .ok_or_else(|| mismatch("decimal", value))
    }
}

#[derive(Debug, Clone, Default)]
pub struct BinaryNode {
    subtype: Option<BinarySubtype>,
}

impl BinaryNode {
    pub fn new() -> Self {
        Self::default()
    }

    /// Requires the given subtype. Tagged inputs carrying a different tag
    /// are rejected; untagged byte arrays are tagged with it.
    pub fn subtype(mut self, subtype: BinarySubtype) -> Self {
        self.subtype = Some(subtype);
        self
    }

    pub(crate) fn check(&self, value: &Value) -> ValidationResult<Value> {
        match value {
            Value::Binary(bin) => {
                if let Some(expected) = self.subtype {
                    if bin.subtype != expected {
                        return Err(ValidationError::constraint(format!(
                            "binary subtype mismatch: expected {}, received {}",
                            expected, bin.subtype
                        )));
                    }
                }
                Ok(value.clone())
            }
            Value::Array(items) => {
                let bytes = items
                    .iter()
                    .map(|item| item.as_i64().and_then(|b| u8::try_from(b).ok()))
                    .collect::<Option<Vec<u8>>>()
                    .ok_or_else(|| ValidationError::type_mismatch("binary", "array"))?;
                let subtype = self.subtype.unwrap_or(BinarySubtype::Generic);
                Ok(Value::Binary(Binary::new(subtype, bytes)))
            }
            other => Err(mismatch("binary", other)),
        }
    }
}
