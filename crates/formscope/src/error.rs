#![forbid(unsafe_code)]

//! Error types for scope operations.
//!
//! Only usage violations surface here. Validation failures are plain
//! message strings collected into a field's error list — they are expected,
//! recoverable, and never an `Err`.

use serde_json::Value;

/// A contract violation while operating on a scope.
///
/// These are programmer errors: the operation aborts with a diagnostic and
/// is never retried or swallowed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ScopeError {
    /// A child value was read under a name absent from the enclosing slice.
    FieldNotFound { name: String },
    /// A write required the scope's slice to be an object.
    NotAnObject { scope: String, found: &'static str },
    /// A keyed-list write required the scope's slice to be an array.
    NotAnArray { scope: String, found: &'static str },
}

impl std::fmt::Display for ScopeError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::FieldNotFound { name } => write!(f, "field not found: {name}"),
            Self::NotAnObject { scope, found } => {
                write!(f, "scope '{scope}' holds {found}, not an object")
            }
            Self::NotAnArray { scope, found } => {
                write!(f, "scope '{scope}' holds {found}, not an array")
            }
        }
    }
}

impl std::error::Error for ScopeError {}

/// Human-readable name of a JSON value's type, for diagnostics.
pub(crate) fn value_type(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "an array",
        Value::Object(_) => "an object",
    }
}
