#![forbid(unsafe_code)]

//! Field records and validators.
//!
//! A [`Validator`] is a pure predicate over `(child value, enclosing scope
//! value)` plus the message reported on failure. A [`Field`] pairs a
//! child's name within its immediate scope with its ordered validators.
//!
//! # Invariants
//!
//! 1. Validators are total: they return a [`Verdict`] for any input and
//!    never panic under normal contract.
//! 2. [`Verdict::NotApplicable`] is not a failure. A validator that
//!    declines to judge a value (e.g. a length check handed a number)
//!    contributes nothing to the error list.
//! 3. Cloning a `Validator` or `Field` preserves identity: clones compare
//!    equal under `same_as`, freshly built values do not. Callers memoize
//!    field records so re-registration is identity-stable.

use std::fmt;
use std::rc::Rc;

use serde_json::Value;

/// Outcome of a single validator check.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Verdict {
    /// The value satisfies the check.
    Pass,
    /// The value violates the check; the validator's message is reported.
    Fail,
    /// The validator declined to judge this value. Distinct from [`Fail`]:
    /// conflating the two is a correctness bug.
    ///
    /// [`Fail`]: Verdict::Fail
    NotApplicable,
}

/// A pure check plus the message reported when it fails.
///
/// Cheap to clone (the check function is shared behind an `Rc`).
#[derive(Clone)]
pub struct Validator {
    message: Rc<str>,
    check: Rc<dyn Fn(&Value, &Value) -> Verdict>,
}

impl Validator {
    /// Create a validator from a message and a check function.
    ///
    /// The check receives `(child value, enclosing scope value)` and must
    /// be a total, side-effect-free function of its inputs.
    pub fn new(
        message: impl Into<String>,
        check: impl Fn(&Value, &Value) -> Verdict + 'static,
    ) -> Self {
        Self {
            message: message.into().into(),
            check: Rc::new(check),
        }
    }

    /// The message reported when the check fails.
    #[must_use]
    pub fn message(&self) -> &str {
        &self.message
    }

    /// Run the check against a child value and its enclosing scope value.
    #[must_use]
    pub fn run(&self, value: &Value, scope_value: &Value) -> Verdict {
        (self.check)(value, scope_value)
    }

    /// Identity comparison: same check function (by pointer) and message.
    ///
    /// Clones of one validator are `same_as`; two validators built from
    /// separate closures are not, even if behaviorally identical.
    #[must_use]
    pub fn same_as(&self, other: &Self) -> bool {
        let a = Rc::as_ptr(&self.check).cast::<()>();
        let b = Rc::as_ptr(&other.check).cast::<()>();
        std::ptr::eq(a, b) && self.message == other.message
    }
}

impl fmt::Debug for Validator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Validator")
            .field("message", &self.message)
            .finish_non_exhaustive()
    }
}

/// A field record: a child's name plus its ordered validators.
#[derive(Clone, Debug)]
pub struct Field {
    name: String,
    validators: Vec<Validator>,
}

impl Field {
    /// Create a field record with no validators.
    #[must_use]
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            validators: Vec::new(),
        }
    }

    /// Create a field record with the given validators, in declaration order.
    #[must_use]
    pub fn with_validators(name: impl Into<String>, validators: Vec<Validator>) -> Self {
        Self {
            name: name.into(),
            validators,
        }
    }

    /// Append a validator (builder style). Declaration order is evaluation
    /// order.
    #[must_use]
    pub fn validator(mut self, validator: Validator) -> Self {
        self.validators.push(validator);
        self
    }

    /// The field's name within its immediate scope.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// The field's validators, in declaration order.
    #[must_use]
    pub fn validators(&self) -> &[Validator] {
        &self.validators
    }

    /// Structural identity: same name and the same validators (by
    /// [`Validator::same_as`]) in the same order.
    #[must_use]
    pub fn same_as(&self, other: &Field) -> bool {
        self.name == other.name
            && self.validators.len() == other.validators.len()
            && self
                .validators
                .iter()
                .zip(&other.validators)
                .all(|(a, b)| a.same_as(b))
    }
}
