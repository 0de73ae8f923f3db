#![forbid(unsafe_code)]

//! Built-in validators.
//!
//! Each constructor returns a fresh [`Validator`]. Callers that care about
//! registration stability should build the validator once and clone it,
//! since identity is per-construction (see [`Validator::same_as`]).
//!
//! All length checks treat strings by character count and arrays by
//! element count, and return [`Verdict::NotApplicable`] for every other
//! type — a type mismatch is not a failure.

use serde_json::Value;

use crate::field::{Validator, Verdict};

fn length_of(value: &Value) -> Option<usize> {
    match value {
        Value::String(s) => Some(s.chars().count()),
        Value::Array(items) => Some(items.len()),
        _ => None,
    }
}

/// Fails unless the value is a string.
#[must_use]
pub fn is_string() -> Validator {
    Validator::new("Must be a string.", |value, _| {
        if value.is_string() {
            Verdict::Pass
        } else {
            Verdict::Fail
        }
    })
}

/// Fails for empty strings; not applicable to other types.
#[must_use]
pub fn required() -> Validator {
    Validator::new("Must not be empty.", |value, _| match value {
        Value::String(s) if s.is_empty() => Verdict::Fail,
        Value::String(_) => Verdict::Pass,
        _ => Verdict::NotApplicable,
    })
}

/// Fails for strings or arrays shorter than `min`; not applicable to
/// other types.
#[must_use]
pub fn min_length(min: usize) -> Validator {
    Validator::new(
        format!("Must be at least {min} in length."),
        move |value, _| match length_of(value) {
            Some(len) if len < min => Verdict::Fail,
            Some(_) => Verdict::Pass,
            None => Verdict::NotApplicable,
        },
    )
}

/// Fails for strings or arrays longer than `max`; not applicable to
/// other types.
#[must_use]
pub fn max_length(max: usize) -> Validator {
    Validator::new(
        format!("Must be at most {max} in length."),
        move |value, _| match length_of(value) {
            Some(len) if len > max => Verdict::Fail,
            Some(_) => Verdict::Pass,
            None => Verdict::NotApplicable,
        },
    )
}
