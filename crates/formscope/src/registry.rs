#![forbid(unsafe_code)]

//! Registered-children bookkeeping and the shared validation loop.
//!
//! Every scope variant owns a [`Registry`]: the ordered set of field
//! records its direct descendants have attached. Attaching returns an RAII
//! [`Registration`] guard; dropping the guard detaches the record. The
//! registry also runs the validation loop shared by all scope variants.
//!
//! # Invariants
//!
//! 1. Error computation iterates fields in registration order; each
//!    field's validators run in declaration order.
//! 2. Re-registering a name replaces the field in place, keeping its
//!    registration slot. Registering an identical record (same validators
//!    by identity) is observable only as a token refresh, not churn.
//! 3. A `Registration` guard detaches exactly the entry it was issued
//!    for. A stale guard for a name that was since re-registered cannot
//!    evict the newer entry.
//! 4. Dropping a guard after its registry is gone is a no-op.
//!
//! # Failure Modes
//!
//! | Failure | Cause | Behavior |
//! |---------|-------|----------|
//! | Child absent from slice | Value not initialized yet | Validated as `Null` |
//! | Guard dropped twice | Impossible (`Drop` runs once) | — |
//! | Registry dropped first | Scope torn down before children | Guard drop is a no-op |

use std::cell::RefCell;
use std::collections::HashMap;
use std::fmt;
use std::rc::{Rc, Weak};

use serde_json::Value;
use tracing::{debug, trace};

use crate::field::{Field, Verdict};

/// Per-scope error map: registered child name → ordered failure messages.
pub type FieldErrors = HashMap<String, Vec<String>, ahash::RandomState>;

/// Registered-children set for one scope, in registration order.
///
/// Lives exactly as long as its owning scope; never persisted.
#[derive(Default)]
pub(crate) struct Registry {
    entries: Vec<Entry>,
    next_token: u64,
}

struct Entry {
    token: u64,
    field: Field,
}

impl Registry {
    pub(crate) fn new() -> Self {
        Self::default()
    }

    /// Attach a field record, returning a guard that detaches it on drop.
    pub(crate) fn attach(registry: &Rc<RefCell<Self>>, field: Field) -> Registration {
        let token = registry.borrow_mut().register(field);
        Registration {
            registry: Rc::downgrade(registry),
            token,
        }
    }

    fn register(&mut self, field: Field) -> u64 {
        self.next_token += 1;
        let token = self.next_token;
        if let Some(entry) = self
            .entries
            .iter_mut()
            .find(|e| e.field.name() == field.name())
        {
            if entry.field.same_as(&field) {
                trace!(name = field.name(), "identical field re-registered");
            } else {
                debug!(name = field.name(), "field replaced in place");
            }
            entry.field = field;
            entry.token = token;
        } else {
            debug!(name = field.name(), "field registered");
            self.entries.push(Entry { token, field });
        }
        token
    }

    fn unregister(&mut self, token: u64) {
        if let Some(pos) = self.entries.iter().position(|e| e.token == token) {
            let entry = self.entries.remove(pos);
            debug!(name = entry.field.name(), "field unregistered");
        }
    }

    fn get(&self, name: &str) -> Option<&Field> {
        self.entries
            .iter()
            .find(|e| e.field.name() == name)
            .map(|e| &e.field)
    }

    /// The validation loop shared by every scope variant: for each
    /// registered field in registration order, read the child's value out
    /// of `scope_value` (absent reads as `Null`) and collect the message
    /// of every validator that fails.
    pub(crate) fn compute_errors(&self, scope_value: &Value) -> FieldErrors {
        let null = Value::Null;
        let mut errors = FieldErrors::default();
        for entry in &self.entries {
            let field = &entry.field;
            let child = scope_value.get(field.name()).unwrap_or(&null);
            errors.insert(
                field.name().to_owned(),
                run_validators(field, child, scope_value),
            );
        }
        trace!(fields = self.entries.len(), "validation pass complete");
        errors
    }

    /// Failure messages for one registered child. Unregistered names yield
    /// an empty list.
    pub(crate) fn child_errors(&self, name: &str, scope_value: &Value) -> Vec<String> {
        match self.get(name) {
            Some(field) => {
                let null = Value::Null;
                let child = scope_value.get(name).unwrap_or(&null);
                run_validators(field, child, scope_value)
            }
            None => Vec::new(),
        }
    }
}

/// Run one field's validators in declaration order. `Fail` contributes its
/// message; `Pass` and `NotApplicable` contribute nothing.
fn run_validators(field: &Field, value: &Value, scope_value: &Value) -> Vec<String> {
    let mut messages = Vec::new();
    for validator in field.validators() {
        if validator.run(value, scope_value) == Verdict::Fail {
            messages.push(validator.message().to_owned());
        }
    }
    messages
}

/// RAII guard for one attached field record.
///
/// Dropping the guard detaches the record from its registry, if the
/// registry is still alive. Modeled as scoped acquisition with guaranteed
/// release: there is no other way to detach a field.
#[must_use = "dropping a Registration immediately detaches the field"]
pub struct Registration {
    registry: Weak<RefCell<Registry>>,
    token: u64,
}

impl Drop for Registration {
    fn drop(&mut self) {
        if let Some(registry) = self.registry.upgrade() {
            registry.borrow_mut().unregister(self.token);
        }
    }
}

impl fmt::Debug for Registration {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Registration")
            .field("token", &self.token)
            .field("attached", &(self.registry.strong_count() > 0))
            .finish()
    }
}
