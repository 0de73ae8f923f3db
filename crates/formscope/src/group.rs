#![forbid(unsafe_code)]

//! Object sub-scope: wraps one named object-valued slice of a parent
//! scope as a new scope for its descendants.
//!
//! A [`FieldGroup`] plays two roles at once. Toward its parent it is one
//! field: it registers itself under its own name, so its own validators
//! run against the whole sub-object and their messages surface as the
//! *parent's* errors for that name. Toward its descendants it is a scope:
//! it tracks their registrations independently and computes their errors
//! against the sub-object.
//!
//! # Invariants
//!
//! 1. Child writes merge into the sub-object read from the parent at call
//!    time, then bubble the merged sub-object upward. Sequential writes
//!    compose; there is no captured stale snapshot anywhere.
//! 2. A `Null` (or absent) slice merges as an empty object, so a group
//!    can populate a tree that does not contain its key yet.
//! 3. The group's registration in its parent lives exactly as long as the
//!    group; dropping the last `FieldGroup` clone detaches it.

use std::cell::RefCell;
use std::rc::Rc;

use serde_json::{Map, Value};
use tracing::trace;

use crate::error::{value_type, ScopeError};
use crate::field::{Field, Validator};
use crate::registry::{FieldErrors, Registration, Registry};
use crate::scope::{Scope, ScopeRef};

/// An object sub-scope over one named slice of a parent scope.
///
/// Cheap to clone; clones share registrations and the parent handle.
#[derive(Clone)]
pub struct FieldGroup {
    inner: Rc<GroupInner>,
}

struct GroupInner {
    name: String,
    parent: ScopeRef,
    registry: Rc<RefCell<Registry>>,
    _registration: Registration,
}

impl FieldGroup {
    /// Create a group over `parent[name]`, registering it as a field of
    /// the parent with the given validators (which run against the whole
    /// sub-object).
    #[must_use]
    pub fn new(parent: ScopeRef, name: impl Into<String>, validators: Vec<Validator>) -> Self {
        let name = name.into();
        let registration = parent.register(Field::with_validators(name.clone(), validators));
        Self {
            inner: Rc::new(GroupInner {
                name,
                parent,
                registry: Rc::new(RefCell::new(Registry::new())),
                _registration: registration,
            }),
        }
    }

    /// The group's name within its parent.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.inner.name
    }

    /// Handle for constructing this group's descendants.
    #[must_use]
    pub fn handle(&self) -> ScopeRef {
        let inner: Rc<dyn Scope> = self.inner.clone();
        inner
    }

    /// The whole sub-object (`Null` when the parent slice lacks the name).
    #[must_use]
    pub fn value(&self) -> Value {
        self.inner.value()
    }

    /// Replace the whole sub-object in the parent.
    ///
    /// # Errors
    ///
    /// Propagates shape violations from the parent chain.
    pub fn set(&self, value: Value) -> Result<(), ScopeError> {
        self.inner.parent.set_child_value(&self.inner.name, value)
    }

    /// Messages the *parent* computed for this group's own validators —
    /// distinct from the errors this group computes for its children.
    #[must_use]
    pub fn own_errors(&self) -> Vec<String> {
        self.inner.parent.child_errors(&self.inner.name)
    }

    /// See [`Scope::set_child_value`].
    ///
    /// # Errors
    ///
    /// [`ScopeError::NotAnObject`] when the live sub-object has the wrong
    /// shape; otherwise whatever the parent chain reports.
    pub fn set_child_value(&self, name: &str, value: Value) -> Result<(), ScopeError> {
        self.inner.set_child_value(name, value)
    }

    /// See [`Scope::register`].
    pub fn register(&self, field: Field) -> Registration {
        self.inner.register(field)
    }

    /// See [`Scope::child_errors`].
    #[must_use]
    pub fn child_errors(&self, name: &str) -> Vec<String> {
        self.inner.child_errors(name)
    }

    /// See [`Scope::errors`].
    #[must_use]
    pub fn errors(&self) -> FieldErrors {
        self.inner.errors()
    }
}

impl std::fmt::Debug for FieldGroup {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FieldGroup")
            .field("name", &self.inner.name)
            .field("value", &self.value())
            .finish_non_exhaustive()
    }
}

impl Scope for GroupInner {
    fn value(&self) -> Value {
        self.parent
            .value()
            .get(&self.name)
            .cloned()
            .unwrap_or(Value::Null)
    }

    fn child_value(&self, name: &str) -> Result<Value, ScopeError> {
        self.value()
            .get(name)
            .cloned()
            .ok_or_else(|| ScopeError::FieldNotFound {
                name: name.to_owned(),
            })
    }

    fn set_child_value(&self, name: &str, value: Value) -> Result<(), ScopeError> {
        // Live read at call time; the merge must never race a stale copy.
        let mut map = match self.value() {
            Value::Object(map) => map,
            Value::Null => Map::new(),
            other => {
                return Err(ScopeError::NotAnObject {
                    scope: self.name.clone(),
                    found: value_type(&other),
                })
            }
        };
        map.insert(name.to_owned(), value);
        trace!(group = %self.name, field = name, "sub-object merged, bubbling up");
        self.parent.set_child_value(&self.name, Value::Object(map))
    }

    fn register(&self, field: Field) -> Registration {
        Registry::attach(&self.registry, field)
    }

    fn child_errors(&self, name: &str) -> Vec<String> {
        self.registry.borrow().child_errors(name, &self.value())
    }

    fn errors(&self) -> FieldErrors {
        self.registry.borrow().compute_errors(&self.value())
    }
}
