#![forbid(unsafe_code)]

//! The scope contract and leaf field bindings.
//!
//! A [`Scope`] is one node in the nesting hierarchy: it owns one slice of
//! the value tree and the registration/error bookkeeping for its direct
//! children. Descendants receive their enclosing scope as an explicit
//! [`ScopeRef`] handle passed at construction — there is no ambient or
//! global lookup, so "engine invoked outside an active scope" cannot be
//! expressed.
//!
//! [`BoundField`] is the programmatic analogue of a mounted input widget:
//! construction registers the field, drop unregisters it, and the
//! `(value, set, errors)` triple drives a concrete editor.

use std::fmt;
use std::rc::Rc;

use serde_json::Value;

use crate::error::ScopeError;
use crate::field::Field;
use crate::registry::{FieldErrors, Registration};

/// The contract shared by all scope variants ([`Form`], [`FieldGroup`],
/// [`FieldGroupList`]).
///
/// Error lists are pull-based: every query recomputes from the live value
/// and the currently registered fields, so results always reflect a
/// consistent `(value, registrations)` snapshot.
///
/// [`Form`]: crate::Form
/// [`FieldGroup`]: crate::FieldGroup
/// [`FieldGroupList`]: crate::FieldGroupList
pub trait Scope {
    /// Snapshot of the slice this scope exposes to its direct children.
    ///
    /// An object for [`Form`] and [`FieldGroup`]; for [`FieldGroupList`]
    /// it is the key-to-item index, an object keyed by derived key.
    ///
    /// [`Form`]: crate::Form
    /// [`FieldGroup`]: crate::FieldGroup
    /// [`FieldGroupList`]: crate::FieldGroupList
    fn value(&self) -> Value;

    /// One child's current value.
    ///
    /// # Errors
    ///
    /// [`ScopeError::FieldNotFound`] when `name` is absent from the slice.
    fn child_value(&self, name: &str) -> Result<Value, ScopeError>;

    /// Merge one child's new value into this scope's slice and bubble the
    /// merged slice upward, ending at the root's change callback.
    ///
    /// The enclosing value is read at call time, never from a capture, so
    /// rapid sequential writes compose instead of racing a stale snapshot.
    ///
    /// # Errors
    ///
    /// [`ScopeError::NotAnObject`] / [`ScopeError::NotAnArray`] when the
    /// live slice has the wrong shape for this scope variant.
    fn set_child_value(&self, name: &str, value: Value) -> Result<(), ScopeError>;

    /// Attach a field record. Drop the returned guard to detach it.
    fn register(&self, field: Field) -> Registration;

    /// Failure messages for one registered child, recomputed from the live
    /// value. Unregistered names yield an empty list.
    fn child_errors(&self, name: &str) -> Vec<String>;

    /// Failure messages for every registered child.
    fn errors(&self) -> FieldErrors;
}

/// Shared handle to a scope, passed explicitly to descendants.
pub type ScopeRef = Rc<dyn Scope>;

/// A leaf field bound to its enclosing scope.
///
/// Holds the field's [`Registration`] for its own lifetime: dropping the
/// `BoundField` detaches the field and removes its error entry.
pub struct BoundField {
    scope: ScopeRef,
    name: String,
    _registration: Registration,
}

impl BoundField {
    /// Register `field` in `scope` and bind to it.
    #[must_use]
    pub fn new(scope: ScopeRef, field: Field) -> Self {
        let name = field.name().to_owned();
        let registration = scope.register(field);
        Self {
            scope,
            name,
            _registration: registration,
        }
    }

    /// The field's name within its scope.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// The field's current value; `Null` when the slice does not contain
    /// the name yet.
    #[must_use]
    pub fn value(&self) -> Value {
        self.scope
            .value()
            .get(&self.name)
            .cloned()
            .unwrap_or(Value::Null)
    }

    /// Write a new value for this field into the enclosing scope.
    ///
    /// # Errors
    ///
    /// Propagates shape violations from [`Scope::set_child_value`].
    pub fn set(&self, value: Value) -> Result<(), ScopeError> {
        self.scope.set_child_value(&self.name, value)
    }

    /// The field's current failure messages.
    #[must_use]
    pub fn errors(&self) -> Vec<String> {
        self.scope.child_errors(&self.name)
    }
}

impl fmt::Debug for BoundField {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("BoundField")
            .field("name", &self.name)
            .field("value", &self.value())
            .finish_non_exhaustive()
    }
}
