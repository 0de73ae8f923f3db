#![forbid(unsafe_code)]

//! Root scope: owns the whole value tree.
//!
//! The external owner creates a [`Form`] over an initial tree, installs a
//! change callback, and redistributes accepted trees back down through
//! [`Form::set_value`]. Descendant scopes and fields attach through the
//! handle returned by [`Form::handle`].
//!
//! # Invariants
//!
//! 1. Every accepted write produces a new tree by copy-and-merge; trees
//!    handed out through `value()` are snapshots and never mutated.
//! 2. Same-pass sibling writes are commutative: each merge folds into the
//!    live tree at call time, so no write is lost when several children
//!    change in one pass.
//! 3. The change callback fires after the fold, with the whole new tree.
//!    `set_value` (top-down redistribution) does not fire it.
//!
//! # Failure Modes
//!
//! | Failure | Cause | Behavior |
//! |---------|-------|----------|
//! | Write against a non-object tree | Mis-shaped initial value | `ScopeError::NotAnObject` |
//! | `child_value` for an absent name | Programmer error | `ScopeError::FieldNotFound` |
//! | Callback reinstalled from within itself | Re-entrant `on_change` | Allowed; takes effect next write |

use std::cell::RefCell;
use std::rc::Rc;

use serde_json::Value;
use tracing::trace;

use crate::error::{value_type, ScopeError};
use crate::field::Field;
use crate::registry::{FieldErrors, Registration, Registry};
use crate::scope::{Scope, ScopeRef};

/// Callback invoked with the whole new tree after every accepted write.
type ChangeCallback = Rc<dyn Fn(&Value)>;

/// The root scope. Cheap to clone; clones share the same tree.
#[derive(Clone)]
pub struct Form {
    inner: Rc<FormInner>,
}

struct FormInner {
    value: RefCell<Value>,
    on_change: RefCell<Option<ChangeCallback>>,
    registry: Rc<RefCell<Registry>>,
}

impl Form {
    /// Create a root scope over `initial`.
    ///
    /// The tree should be an object; writes against any other shape fail
    /// with [`ScopeError::NotAnObject`].
    #[must_use]
    pub fn new(initial: Value) -> Self {
        Self {
            inner: Rc::new(FormInner {
                value: RefCell::new(initial),
                on_change: RefCell::new(None),
                registry: Rc::new(RefCell::new(Registry::new())),
            }),
        }
    }

    /// Install the external change callback.
    pub fn on_change(&self, callback: impl Fn(&Value) + 'static) {
        *self.inner.on_change.borrow_mut() = Some(Rc::new(callback));
    }

    /// Replace the whole tree: top-down redistribution by the external
    /// owner. Does not fire the change callback.
    pub fn set_value(&self, value: Value) {
        *self.inner.value.borrow_mut() = value;
        trace!("tree redistributed");
    }

    /// Handle for constructing descendant scopes and bound fields.
    #[must_use]
    pub fn handle(&self) -> ScopeRef {
        let inner: Rc<dyn Scope> = self.inner.clone();
        inner
    }

    /// Snapshot of the whole tree.
    #[must_use]
    pub fn value(&self) -> Value {
        self.inner.value()
    }

    /// See [`Scope::child_value`].
    ///
    /// # Errors
    ///
    /// [`ScopeError::FieldNotFound`] when `name` is absent.
    pub fn child_value(&self, name: &str) -> Result<Value, ScopeError> {
        self.inner.child_value(name)
    }

    /// See [`Scope::set_child_value`].
    ///
    /// # Errors
    ///
    /// [`ScopeError::NotAnObject`] when the tree is not an object.
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

impl std::fmt::Debug for Form {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Form")
            .field("value", &*self.inner.value.borrow())
            .finish_non_exhaustive()
    }
}

impl Scope for FormInner {
    fn value(&self) -> Value {
        self.value.borrow().clone()
    }

    fn child_value(&self, name: &str) -> Result<Value, ScopeError> {
        self.value
            .borrow()
            .get(name)
            .cloned()
            .ok_or_else(|| ScopeError::FieldNotFound {
                name: name.to_owned(),
            })
    }

    fn set_child_value(&self, name: &str, value: Value) -> Result<(), ScopeError> {
        let new_tree = {
            let mut tree = self.value.borrow_mut();
            let Value::Object(map) = &mut *tree else {
                return Err(ScopeError::NotAnObject {
                    scope: "root".to_owned(),
                    found: value_type(&tree),
                });
            };
            map.insert(name.to_owned(), value);
            tree.clone()
        };
        trace!(field = name, "root tree updated");
        // Borrow released before the callback runs, so the callback may
        // read the form or redistribute a new tree.
        let callback = self.on_change.borrow().clone();
        if let Some(callback) = callback {
            callback(&new_tree);
        }
        Ok(())
    }

    fn register(&self, field: Field) -> Registration {
        Registry::attach(&self.registry, field)
    }

    fn child_errors(&self, name: &str) -> Vec<String> {
        self.registry
            .borrow()
            .child_errors(name, &self.value.borrow())
    }

    fn errors(&self) -> FieldErrors {
        self.registry.borrow().compute_errors(&self.value.borrow())
    }
}
