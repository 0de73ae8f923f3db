#![forbid(unsafe_code)]

//! Keyed-list sub-scope: wraps one named array-valued slice, addressing
//! elements by derived stable key instead of index.
//!
//! Elements may be reordered, inserted, or removed between passes, so
//! descendants address them through a caller-supplied key function
//! `(item, index) -> String`. Identity survives edits: error attribution
//! and in-place update follow the key, not the position.
//!
//! # Invariants
//!
//! 1. The key-to-item index is derived fresh on every pass by applying the
//!    key function to the live array; nothing is cached across passes.
//! 2. A write targeting a key that no longer resolves (the element was
//!    removed in the interim) is dropped silently — a no-op, never an
//!    error.
//! 3. Within one pass, derived keys are expected to be unique. On
//!    collision the later element shadows the earlier one in the index;
//!    error attribution for the shadowed element is undefined.
//!
//! # Failure Modes
//!
//! | Failure | Cause | Behavior |
//! |---------|-------|----------|
//! | Write to a removed key | Element removed before merge | Dropped, `warn!`, `Ok(())` |
//! | Slice is not an array | Mis-shaped tree | `ScopeError::NotAnArray` |
//! | Duplicate derived keys | Bad key function | Later element shadows |

use std::cell::RefCell;
use std::rc::Rc;

use serde_json::{Map, Value};
use tracing::{trace, warn};

use crate::error::{value_type, ScopeError};
use crate::field::{Field, Validator};
use crate::registry::{FieldErrors, Registration, Registry};
use crate::scope::{Scope, ScopeRef};

/// Derives the stable address of one array element from `(item, index)`.
pub type KeyFn = Rc<dyn Fn(&Value, usize) -> String>;

/// A keyed-list sub-scope over one named array slice of a parent scope.
///
/// Cheap to clone; clones share registrations and the parent handle.
#[derive(Clone)]
pub struct FieldGroupList {
    inner: Rc<ListInner>,
}

struct ListInner {
    name: String,
    parent: ScopeRef,
    key_fn: KeyFn,
    registry: Rc<RefCell<Registry>>,
    _registration: Registration,
}

impl FieldGroupList {
    /// Create a list scope over `parent[name]`, registering it as a field
    /// of the parent with the given validators (which run against the
    /// whole array — cardinality checks live here).
    #[must_use]
    pub fn new(
        parent: ScopeRef,
        name: impl Into<String>,
        key_fn: impl Fn(&Value, usize) -> String + 'static,
        validators: Vec<Validator>,
    ) -> Self {
        let name = name.into();
        let registration = parent.register(Field::with_validators(name.clone(), validators));
        Self {
            inner: Rc::new(ListInner {
                name,
                parent,
                key_fn: Rc::new(key_fn),
                registry: Rc::new(RefCell::new(Registry::new())),
                _registration: registration,
            }),
        }
    }

    /// The list's name within its parent.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.inner.name
    }

    /// Handle for constructing this list's descendants (per-element
    /// groups and fields, named by derived key).
    #[must_use]
    pub fn handle(&self) -> ScopeRef {
        let inner: Rc<dyn Scope> = self.inner.clone();
        inner
    }

    /// The raw array. A `Null` or absent slice reads as empty.
    #[must_use]
    pub fn items(&self) -> Vec<Value> {
        self.inner.items()
    }

    /// Replace the whole array in the parent (add/remove flows).
    ///
    /// # Errors
    ///
    /// Propagates shape violations from the parent chain.
    pub fn set_items(&self, items: Vec<Value>) -> Result<(), ScopeError> {
        self.inner
            .parent
            .set_child_value(&self.inner.name, Value::Array(items))
    }

    /// Derived key of one element, exactly as this scope's children
    /// address it.
    #[must_use]
    pub fn item_key(&self, item: &Value, index: usize) -> String {
        (self.inner.key_fn)(item, index)
    }

    /// Messages the *parent* computed for this list's own validators
    /// (run against the whole array).
    #[must_use]
    pub fn own_errors(&self) -> Vec<String> {
        self.inner.parent.child_errors(&self.inner.name)
    }

    /// See [`Scope::set_child_value`]; `name` is a derived key.
    ///
    /// # Errors
    ///
    /// [`ScopeError::NotAnArray`] when the live slice has the wrong shape.
    /// A key that no longer resolves is a silent no-op, not an error.
    pub fn set_child_value(&self, key: &str, value: Value) -> Result<(), ScopeError> {
        self.inner.set_child_value(key, value)
    }

    /// See [`Scope::register`]; the field's name is a derived key.
    pub fn register(&self, field: Field) -> Registration {
        self.inner.register(field)
    }

    /// See [`Scope::child_errors`]; `name` is a derived key.
    #[must_use]
    pub fn child_errors(&self, key: &str) -> Vec<String> {
        self.inner.child_errors(key)
    }

    /// See [`Scope::errors`], keyed by derived key.
    #[must_use]
    pub fn errors(&self) -> FieldErrors {
        self.inner.errors()
    }
}

impl std::fmt::Debug for FieldGroupList {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FieldGroupList")
            .field("name", &self.inner.name)
            .field("items", &self.items())
            .finish_non_exhaustive()
    }
}

impl ListInner {
    fn raw_slice(&self) -> Value {
        self.parent
            .value()
            .get(&self.name)
            .cloned()
            .unwrap_or(Value::Null)
    }

    fn items(&self) -> Vec<Value> {
        match self.raw_slice() {
            Value::Array(items) => items,
            _ => Vec::new(),
        }
    }
}

impl Scope for ListInner {
    /// The key-to-item index: an object keyed by derived key, rebuilt on
    /// every pass from the live array.
    fn value(&self) -> Value {
        let mut index = Map::new();
        for (i, item) in self.items().into_iter().enumerate() {
            index.insert((self.key_fn)(&item, i), item);
        }
        Value::Object(index)
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
        let mut items = match self.raw_slice() {
            Value::Array(items) => items,
            Value::Null => Vec::new(),
            other => {
                return Err(ScopeError::NotAnArray {
                    scope: self.name.clone(),
                    found: value_type(&other),
                })
            }
        };
        // Scan the live array with the same key function; an index from an
        // earlier pass must never decide placement.
        let position = items
            .iter()
            .enumerate()
            .find(|(i, item)| (self.key_fn)(item, *i) == name)
            .map(|(i, _)| i);
        let Some(position) = position else {
            warn!(list = %self.name, key = name, "write dropped: no element with this key");
            return Ok(());
        };
        items[position] = value;
        trace!(list = %self.name, key = name, index = position, "element replaced, bubbling up");
        self.parent.set_child_value(&self.name, Value::Array(items))
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

#[cfg(test)]
mod tests {
    use super::*;
    use crate::form::Form;
    use crate::validators;
    use serde_json::json;

    fn by_id(item: &Value, _index: usize) -> String {
        item.get("id").and_then(Value::as_i64).unwrap_or(-1).to_string()
    }

    fn id_form() -> Form {
        Form::new(json!({ "rows": [{ "id": 1 }, { "id": 2 }, { "id": 3 }] }))
    }

    #[test]
    fn index_is_keyed_by_derived_key() {
        let form = id_form();
        let list = FieldGroupList::new(form.handle(), "rows", by_id, Vec::new());
        assert_eq!(
            list.inner.value(),
            json!({ "1": { "id": 1 }, "2": { "id": 2 }, "3": { "id": 3 } })
        );
    }

    #[test]
    fn write_by_key_replaces_the_right_element() {
        let form = id_form();
        let list = FieldGroupList::new(form.handle(), "rows", by_id, Vec::new());
        list.set_child_value("2", json!({ "id": 2, "note": "x" }))
            .unwrap();
        assert_eq!(
            form.value(),
            json!({ "rows": [{ "id": 1 }, { "id": 2, "note": "x" }, { "id": 3 }] })
        );
    }

    #[test]
    fn write_after_removal_is_a_noop() {
        let form = id_form();
        let list = FieldGroupList::new(form.handle(), "rows", by_id, Vec::new());

        // Remove the element with id 2, as an add/remove control would.
        let remaining: Vec<Value> = list
            .items()
            .into_iter()
            .filter(|item| item.get("id") != Some(&json!(2)))
            .collect();
        list.set_items(remaining).unwrap();
        assert_eq!(form.value(), json!({ "rows": [{ "id": 1 }, { "id": 3 }] }));

        // A write previously targeted at the removed key arrives late.
        list.set_child_value("2", json!({ "id": 2, "stale": true }))
            .unwrap();
        assert_eq!(
            form.value(),
            json!({ "rows": [{ "id": 1 }, { "id": 3 }] }),
            "late write for a removed element must change nothing"
        );
    }

    #[test]
    fn keys_follow_reordering() {
        let form = id_form();
        let list = FieldGroupList::new(form.handle(), "rows", by_id, Vec::new());
        let mut reversed = list.items();
        reversed.reverse();
        list.set_items(reversed).unwrap();

        list.set_child_value("1", json!({ "id": 1, "touched": true }))
            .unwrap();
        assert_eq!(
            form.value(),
            json!({ "rows": [{ "id": 3 }, { "id": 2 }, { "id": 1, "touched": true }] })
        );
    }

    #[test]
    fn cardinality_check_runs_against_the_whole_array() {
        let form = Form::new(json!({ "rows": [] }));
        let list = FieldGroupList::new(
            form.handle(),
            "rows",
            by_id,
            vec![validators::min_length(1)],
        );
        assert_eq!(list.own_errors(), ["Must be at least 1 in length."]);

        list.set_items(vec![json!({ "id": 1 })]).unwrap();
        assert!(list.own_errors().is_empty());
    }

    #[test]
    fn per_child_errors_resolve_through_the_key_index() {
        let form = Form::new(json!({ "rows": [{ "id": 1, "name": "" }] }));
        let list = FieldGroupList::new(form.handle(), "rows", by_id, Vec::new());
        let _guard = list.register(Field::new("1").validator(crate::Validator::new(
            "name required",
            |item, _| {
                match item.get("name").and_then(Value::as_str) {
                    Some("") => crate::Verdict::Fail,
                    Some(_) => crate::Verdict::Pass,
                    None => crate::Verdict::NotApplicable,
                }
            },
        )));
        assert_eq!(list.child_errors("1"), ["name required"]);

        list.set_child_value("1", json!({ "id": 1, "name": "ok" }))
            .unwrap();
        assert!(list.child_errors("1").is_empty());
    }

    #[test]
    fn index_based_keys_work_like_the_classic_form() {
        let form = Form::new(json!({ "rows": ["a", "b"] }));
        let list = FieldGroupList::new(
            form.handle(),
            "rows",
            |_, index| index.to_string(),
            Vec::new(),
        );
        list.set_child_value("1", json!("B")).unwrap();
        assert_eq!(form.value(), json!({ "rows": ["a", "B"] }));
    }

    #[test]
    fn non_array_slice_rejects_writes() {
        let form = Form::new(json!({ "rows": { "not": "an array" } }));
        let list = FieldGroupList::new(form.handle(), "rows", by_id, Vec::new());
        let err = list.set_child_value("1", json!({})).unwrap_err();
        assert_eq!(
            err,
            ScopeError::NotAnArray {
                scope: "rows".into(),
                found: "an object"
            }
        );
    }

    #[test]
    fn duplicate_keys_shadow_later_wins() {
        let form = Form::new(json!({ "rows": [{ "id": 1, "v": "first" }, { "id": 1, "v": "second" }] }));
        let list = FieldGroupList::new(form.handle(), "rows", by_id, Vec::new());
        assert_eq!(
            list.inner.value(),
            json!({ "1": { "id": 1, "v": "second" } }),
            "later element shadows the earlier one"
        );
    }

    #[test]
    fn group_inside_list_bubbles_through_both() {
        let form = Form::new(json!({ "users": [{ "firstName": "", "lastName": "B" }] }));
        let list = FieldGroupList::new(
            form.handle(),
            "users",
            |_, index| index.to_string(),
            Vec::new(),
        );
        let user = crate::FieldGroup::new(list.handle(), "0", Vec::new());
        user.set_child_value("firstName", json!("A")).unwrap();
        assert_eq!(
            form.value(),
            json!({ "users": [{ "firstName": "A", "lastName": "B" }] })
        );
    }
}
