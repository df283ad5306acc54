//! # nested-builder - Nested attribute reconciliation for document relations
//!
//! When a parent document is saved with nested child payloads (from a form
//! or an API call), each payload has to become a create, an update, or a
//! destroy of a child document. This crate holds the policy that drives
//! that choice for one relation, plus planners that apply it to one-to-one
//! and one-to-many relations without touching storage.
//!
//! ## Core Concepts
//!
//! - **ReconciliationPolicy**: destroy permission, rejection rule, update-only
//!   flag, and id coercion for one relation
//! - **RelationMetadata**: the relation's name, cardinality, and target model
//! - **NestedOptions**: options declared on the relation, optionally loaded
//!   from configuration
//! - **Decision**: what the caller should do with one payload
//!
//! ## Usage
//!
//! ```rust
//! use std::sync::Arc;
//! use nested_builder::{
//!     reconcile_many, Decision, IdType, NestedOptions, ReconciliationPolicy, RelationMetadata,
//!     TargetModel, Value,
//! };
//!
//! let meta = RelationMetadata::many("addresses", TargetModel::new("Address", IdType::Int));
//! let options = NestedOptions::new().allow_destroy(true);
//! let policy = ReconciliationPolicy::new(Arc::new(meta), Arc::new(options))?;
//!
//! let payload = nested_builder::attributes_from_json(serde_json::json!({
//!     "id": "7",
//!     "_destroy": "1",
//! }))?;
//! let existing = vec![Value::Int(7)];
//!
//! let decisions = reconcile_many(&policy, vec![payload], &existing)?;
//! assert_eq!(decisions, vec![Decision::Destroy { id: Value::Int(7) }]);
//! # Ok::<(), nested_builder::NestedError>(())
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]

pub mod error;
pub mod metadata;
pub mod object_id;
pub mod options;
pub mod policy;
pub mod reconcile;
pub mod value;

pub use error::{ConversionError, NestedError, NestedResult, ReconcileError, ValidationError};
pub use metadata::{Cardinality, IdStrategy, IdType, RelationMetadata, TargetModel};
pub use object_id::ObjectId;
pub use options::{NestedOptions, NestedOptionsConfig, RejectIf, RejectIfConfig, RejectPredicate};
pub use policy::ReconciliationPolicy;
pub use reconcile::{extract_id, reconcile_many, reconcile_one, ChildDocument, Decision, SkipReason};
pub use value::{attributes_from_json, Attributes, Value, DESTROY_KEY};
