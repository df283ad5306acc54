//! The reconciliation policy shared by one-to-one and one-to-many builders.
//!
//! A policy answers three questions about a relation (may children be
//! destroyed, should this payload be skipped, is the relation update-only)
//! and normalizes submitted ids so they compare equal to stored ids.
//! It never touches storage; the caller decides and performs the mutation.

use std::sync::Arc;

use tracing::{trace, warn};
use uuid::Uuid;

use crate::error::{ConversionError, ValidationError};
use crate::metadata::{Cardinality, IdStrategy, IdType, RelationMetadata};
use crate::object_id::ObjectId;
use crate::options::NestedOptions;
use crate::value::{Attributes, Value};

/// Decision primitives for one relation.
///
/// Cloning is cheap: metadata and options are shared read-only, so one
/// policy can serve concurrent batches as long as any configured
/// rejection predicate is itself reentrant.
///
/// # Examples
///
/// ```
/// use std::sync::Arc;
/// use nested_builder::{
///     IdType, NestedOptions, ReconciliationPolicy, RelationMetadata, TargetModel, Value,
/// };
///
/// let meta = RelationMetadata::many("addresses", TargetModel::new("Address", IdType::Int));
/// let policy = ReconciliationPolicy::new(Arc::new(meta), Arc::new(NestedOptions::default()))?;
///
/// assert!(!policy.allow_destroy());
/// assert_eq!(policy.convert_id(Some(&Value::from("42")))?, Some(Value::Int(42)));
/// # Ok::<(), nested_builder::NestedError>(())
/// ```
#[derive(Debug, Clone)]
pub struct ReconciliationPolicy {
    metadata: Arc<RelationMetadata>,
    options: Arc<NestedOptions>,
    strategy: IdStrategy,
}

impl ReconciliationPolicy {
    /// Creates a policy for one relation definition.
    ///
    /// # Errors
    /// - `EmptyRelationName` / `EmptyModelName` for blank names
    /// - `InvalidLimit` when `options.limit` is zero
    pub fn new(
        metadata: Arc<RelationMetadata>,
        options: Arc<NestedOptions>,
    ) -> Result<Self, ValidationError> {
        if metadata.name.trim().is_empty() {
            return Err(ValidationError::EmptyRelationName);
        }
        if metadata.target.name.trim().is_empty() {
            return Err(ValidationError::EmptyModelName);
        }
        options.validate()?;

        if options.update_only && metadata.cardinality == Cardinality::Many {
            warn!(
                relation = %metadata.name,
                "update_only has no effect on a many relation"
            );
        }

        let strategy = IdStrategy::from(&metadata.target);
        Ok(Self {
            metadata,
            options,
            strategy,
        })
    }

    /// Returns the relation this policy was built for.
    #[must_use]
    pub fn metadata(&self) -> &RelationMetadata {
        &self.metadata
    }

    /// Returns the configured options.
    #[must_use]
    pub fn options(&self) -> &NestedOptions {
        &self.options
    }

    /// Returns the id coercion strategy resolved from the target model.
    #[must_use]
    pub const fn id_strategy(&self) -> IdStrategy {
        self.strategy
    }

    /// Returns true if payloads may destroy existing children.
    #[must_use]
    pub fn allow_destroy(&self) -> bool {
        self.options.allow_destroy
    }

    /// Returns true if the payload should be skipped.
    ///
    /// With no rule configured this is always false. A custom predicate is
    /// invoked exactly once, synchronously; a panic inside it propagates.
    #[must_use]
    pub fn reject(&self, attributes: &Attributes) -> bool {
        self.options
            .reject_if
            .as_ref()
            .is_some_and(|rule| rule.matches(attributes))
    }

    /// Returns true if new children must never be created.
    ///
    /// Only meaningful for one-to-one relations; enforcement is left to the
    /// caller.
    #[must_use]
    pub fn update_only(&self) -> bool {
        self.options.update_only
    }

    /// Returns the configured batch limit for one-to-many relations.
    #[must_use]
    pub fn limit(&self) -> Option<usize> {
        self.options.limit
    }

    /// Coerces a submitted id into the target model's id representation.
    ///
    /// Absent input (`None`, `Value::Null`, or `false`) yields `None`. For models
    /// keyed by object ids, strings are parsed and existing object ids pass
    /// through. Otherwise the value is converted to the model's id type;
    /// values that cannot be converted are returned unchanged.
    ///
    /// # Errors
    /// Returns `ConversionError::MalformedObjectId` when the target uses
    /// object ids and the value is not a well-formed one.
    pub fn convert_id(&self, id: Option<&Value>) -> Result<Option<Value>, ConversionError> {
        let Some(raw) = id.filter(|v| !matches!(v, Value::Null | Value::Bool(false))) else {
            return Ok(None);
        };

        let converted = match self.strategy {
            IdStrategy::NativeObjectId => Value::ObjectId(cast_object_id(raw)?),
            IdStrategy::Typed(id_type) => coerce_typed(raw, id_type),
        };
        trace!(
            relation = %self.metadata.name,
            from = raw.type_name(),
            to = converted.type_name(),
            "converted nested id"
        );
        Ok(Some(converted))
    }
}

fn cast_object_id(raw: &Value) -> Result<ObjectId, ConversionError> {
    match raw {
        Value::ObjectId(oid) => Ok(*oid),
        Value::String(s) => ObjectId::parse_str(s),
        other => Err(ConversionError::MalformedObjectId {
            input: other.to_string(),
        }),
    }
}

#[allow(clippy::cast_precision_loss)]
fn coerce_typed(raw: &Value, id_type: IdType) -> Value {
    let coerced = match (id_type, raw) {
        (IdType::String, Value::String(_) | Value::Structured(_)) => None,
        (IdType::String, other) => Some(Value::String(other.to_string())),

        (IdType::Int, Value::String(s)) => s.trim().parse::<i64>().ok().map(Value::Int),
        (IdType::Int, Value::Float(f)) => float_to_int(*f).map(Value::Int),

        (IdType::Float, Value::String(s)) => s.trim().parse::<f64>().ok().map(Value::Float),
        (IdType::Float, Value::Int(i)) => Some(Value::Float(*i as f64)),

        (IdType::Uuid, Value::String(s)) => Uuid::parse_str(s.trim()).ok().map(Value::Uuid),

        _ => None,
    };
    coerced.unwrap_or_else(|| raw.clone())
}

#[allow(clippy::cast_possible_truncation, clippy::cast_precision_loss)]
fn float_to_int(f: f64) -> Option<i64> {
    if f.fract() == 0.0 && f >= i64::MIN as f64 && f < i64::MAX as f64 {
        Some(f as i64)
    } else {
        None
    }
}
