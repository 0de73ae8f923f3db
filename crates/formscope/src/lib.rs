#![forbid(unsafe_code)]

//! Hierarchical form state and validation.
//!
//! `formscope` tracks a single tree-shaped value (a [`serde_json::Value`]),
//! lets arbitrarily nested scopes read and write slices of it, and computes
//! per-field error lists from pluggable validators, recomputed
//! deterministically on every pass.
//!
//! - [`Form`]: root scope, owns the whole tree and the change callback.
//! - [`FieldGroup`]: object sub-scope over one named object slice.
//! - [`FieldGroupList`]: keyed-list sub-scope over one named array slice,
//!   addressing elements by derived stable key instead of index.
//! - [`BoundField`]: a leaf field bound to its scope — the
//!   `(value, set, errors)` triple that drives a concrete editor.
//! - [`validators`]: built-in checks (`is_string`, `required`,
//!   `min_length`, `max_length`).
//!
//! # Architecture
//!
//! Single-threaded and pass-driven. Scopes share state through
//! `Rc<RefCell<..>>`; all mutation originates from one logical thread of
//! control, so no locks are needed. Every update produces a new tree by
//! copy-and-merge, so held snapshots stay valid. Validation is pull-based:
//! every error query recomputes from the live value and the currently
//! registered fields.
//!
//! # Invariants
//!
//! 1. A child write merges into its scope's live slice and bubbles the
//!    merged slice upward until the root's change callback fires with the
//!    whole new tree.
//! 2. Same-pass sibling writes are commutative: each merge reads the live
//!    value at call time, so no write is lost.
//! 3. Error lists are a pure function of `(live value, registered
//!    fields)`: fields iterate in registration order, validators in
//!    declaration order, `Fail` contributes its message, `Pass` and
//!    `NotApplicable` contribute nothing.
//! 4. Registration is RAII: [`Scope::register`] returns a guard; dropping
//!    it detaches the field and removes its error entry.
//!
//! # Example
//!
//! ```
//! use formscope::{BoundField, Field, Form, validators};
//! use serde_json::json;
//!
//! let form = Form::new(json!({ "name": "" }));
//! let field = BoundField::new(
//!     form.handle(),
//!     Field::new("name")
//!         .validator(validators::is_string())
//!         .validator(validators::required()),
//! );
//!
//! assert_eq!(field.errors(), ["Must not be empty."]);
//!
//! field.set(json!("Ada")).unwrap();
//! assert!(field.errors().is_empty());
//! assert_eq!(form.value(), json!({ "name": "Ada" }));
//! ```

pub mod error;
pub mod field;
pub mod form;
pub mod group;
pub mod list;
pub mod registry;
pub mod scope;
pub mod validators;

pub use error::ScopeError;
pub use field::{Field, Validator, Verdict};
pub use form::Form;
pub use group::FieldGroup;
pub use list::{FieldGroupList, KeyFn};
pub use registry::{FieldErrors, Registration};
pub use scope::{BoundField, Scope, ScopeRef};
