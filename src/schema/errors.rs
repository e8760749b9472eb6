//! Validation error types
//!
//! Error codes:
//! - TYPE_MISMATCH
//! - CONSTRAINT_VIOLATION
//! - MISSING_REQUIRED_FIELD
//! - UNKNOWN_FIELD
//! - STRUCTURAL_MISMATCH
//! - INVALID_OPERATOR_PAYLOAD
//! - UNKNOWN_OPERATOR
//! - CUSTOM_VALIDATION_FAILED

use std::fmt;

/// Validation error codes
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ValidationErrorCode {
    /// Wrong kind of value entirely
    TypeMismatch,
    /// min/max/enum/pattern/length bound broken
    ConstraintViolation,
    /// Required value absent
    MissingRequiredField,
    /// Path or key not declared in the shape
    UnknownField,
    /// Wrong arity, array index on a non-array, ...
    StructuralMismatch,
    /// Operator-specific payload rule broken
    InvalidOperatorPayload,
    /// Update operator outside the closed set
    UnknownOperator,
    /// Caller-supplied predicate rejected the value
    CustomValidationFailed,
}

impl ValidationErrorCode {
    /// Returns the stable string code
    pub fn code(&self) -> &'static str {
        match self {
            ValidationErrorCode::TypeMismatch => "TYPE_MISMATCH",
            ValidationErrorCode::ConstraintViolation => "CONSTRAINT_VIOLATION",
            ValidationErrorCode::MissingRequiredField => "MISSING_REQUIRED_FIELD",
            ValidationErrorCode::UnknownField => "UNKNOWN_FIELD",
            ValidationErrorCode::StructuralMismatch => "STRUCTURAL_MISMATCH",
            ValidationErrorCode::InvalidOperatorPayload => "INVALID_OPERATOR_PAYLOAD",
            ValidationErrorCode::UnknownOperator => "UNKNOWN_OPERATOR",
            ValidationErrorCode::CustomValidationFailed => "CUSTOM_VALIDATION_FAILED",
        }
    }
}

impl fmt::Display for ValidationErrorCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.code())
    }
}

/// Validation failure with the path context accumulated during descent.
///
/// The message carries the path prefixes in display form
/// (`"address: city: expected string, received number"`,
/// `"[2] must be at most 10"`); `path()` exposes the same context as
/// segments, outermost first.
#[derive(Debug, Clone, PartialEq)]
pub struct ValidationError {
    code: ValidationErrorCode,
    message: String,
    path: Vec<String>,
    cause: Option<Box<ValidationError>>,
}

impl ValidationError {
    pub fn new(code: ValidationErrorCode, message: impl Into<String>) -> Self {
        Self {
            code,
            message: message.into(),
            path: Vec::new(),
            cause: None,
        }
    }

    /// Create a type mismatch error
    pub fn type_mismatch(expected: impl fmt::Display, received: impl fmt::Display) -> Self {
        Self::new(
            ValidationErrorCode::TypeMismatch,
            format!("expected {}, received {}", expected, received),
        )
    }

    /// Create a constraint violation error
    pub fn constraint(message: impl Into<String>) -> Self {
        Self::new(ValidationErrorCode::ConstraintViolation, message)
    }

    /// Create a missing required value error
    pub fn missing_required() -> Self {
        Self::new(ValidationErrorCode::MissingRequiredField, "value is required")
    }

    /// Create an unknown field error
    pub fn unknown_field(path: impl fmt::Display) -> Self {
        Self::new(
            ValidationErrorCode::UnknownField,
            format!("field '{}' does not exist", path),
        )
    }

    /// Create a structural mismatch error
    pub fn structural(message: impl Into<String>) -> Self {
        Self::new(ValidationErrorCode::StructuralMismatch, message)
    }

    /// Create an invalid operator payload error
    pub fn invalid_payload(message: impl Into<String>) -> Self {
        Self::new(ValidationErrorCode::InvalidOperatorPayload, message)
    }

    /// Create an unknown operator error
    pub fn unknown_operator(operator: impl fmt::Display) -> Self {
        Self::new(
            ValidationErrorCode::UnknownOperator,
            format!("unknown update operator '{}'", operator),
        )
    }

    /// Create a custom validation failure
    pub fn custom(message: impl Into<String>) -> Self {
        Self::new(ValidationErrorCode::CustomValidationFailed, message)
    }

    pub fn with_cause(mut self, cause: ValidationError) -> Self {
        self.cause = Some(Box::new(cause));
        self
    }

    /// Prefixes the error with an object key: `"<key>: <message>"`.
    pub fn within_field(mut self, key: &str) -> Self {
        self.message = format!("{}: {}", key, self.message);
        self.path.insert(0, key.to_string());
        self
    }

    /// Prefixes the error with an array position: `"[i] <message>"`.
    pub fn within_index(mut self, index: usize) -> Self {
        self.message = format!("[{}] {}", index, self.message);
        self.path.insert(0, index.to_string());
        self
    }

    /// Prefixes the error with an operator and field path:
    /// `"$<operator>.<path>: <message>"`.
    pub fn within_operator(mut self, operator: &str, path: &str) -> Self {
        self.message = format!("{}.{}: {}", operator, path, self.message);
        let mut segments = vec![operator.to_string()];
        segments.extend(path.split('.').map(str::to_string));
        segments.append(&mut self.path);
        self.path = segments;
        self
    }

    /// Returns the error code
    pub fn code(&self) -> ValidationErrorCode {
        self.code
    }

    /// Returns the error message, path prefixes included
    pub fn message(&self) -> &str {
        &self.message
    }

    /// Returns the path segments, outermost first
    pub fn path(&self) -> &[String] {
        &self.path
    }

    /// Returns the nested cause if any
    pub fn cause(&self) -> Option<&ValidationError> {
        self.cause.as_deref()
    }
}

impl fmt::Display for ValidationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.code, self.message)
    }
}

impl std::error::Error for ValidationError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        self.cause.as_deref().map(|c| c as &(dyn std::error::Error + 'static))
    }
}

/// Result type for validation operations
pub type ValidationResult<T> = Result<T, ValidationError>;
