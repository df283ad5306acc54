//! Planning create, update, and destroy decisions for nested payloads.
//!
//! The planners sequence the [`ReconciliationPolicy`] primitives for each
//! payload and return what should happen. They never mutate storage, so
//! the caller applies the decisions with whatever persistence it owns.

use tracing::debug;

use crate::error::{NestedResult, ReconcileError, ValidationError};
use crate::metadata::Cardinality;
use crate::policy::ReconciliationPolicy;
use crate::value::{Attributes, Value, DESTROY_KEY};

/// An existing persisted child that payloads are matched against.
pub trait ChildDocument {
    /// The child's stored identifier.
    fn id(&self) -> &Value;
}

impl ChildDocument for Value {
    fn id(&self) -> &Value {
        self
    }
}

/// Why a payload produced no mutation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SkipReason {
    /// The relation's rejection rule matched.
    Rejected,
    /// The relation is update-only and there is no child to update.
    UpdateOnlyWithoutExisting,
    /// The payload asked for destruction but matched no child.
    NothingToDestroy,
    /// The payload carried no attributes to build a child from.
    BlankPayload,
}

/// What the caller should do with one payload.
///
/// Attributes carried by `Create`, `Replace`, and `Update` have the
/// `_destroy` flag and null id keys removed. `Replace` and `Update` also
/// drop the submitted `id`/`_id`; `Update` carries the converted id instead.
#[derive(Debug, Clone, PartialEq)]
pub enum Decision {
    /// Build a new child.
    Create { attributes: Attributes },
    /// Build a new child in place of the existing one-to-one child.
    Replace { existing: Value, attributes: Attributes },
    /// Apply the attributes to the child with this id.
    Update { id: Value, attributes: Attributes },
    /// Remove the child with this id.
    Destroy { id: Value },
    /// Leave everything as it is.
    Skip { reason: SkipReason },
}

impl Decision {
    /// Returns a short stable name suitable for logging.
    #[must_use]
    pub const fn kind(&self) -> &'static str {
        match self {
            Self::Create { .. } => "create",
            Self::Replace { .. } => "replace",
            Self::Update { .. } => "update",
            Self::Destroy { .. } => "destroy",
            Self::Skip { .. } => "skip",
        }
    }

    /// Returns true if the decision leaves storage untouched.
    #[must_use]
    pub const fn is_skip(&self) -> bool {
        matches!(self, Self::Skip { .. })
    }
}

/// Returns the payload's submitted id, preferring `id` over `_id`.
#[must_use]
pub fn extract_id(attributes: &Attributes) -> Option<&Value> {
    attributes
        .get("id")
        .filter(|v| !v.is_null())
        .or_else(|| attributes.get("_id"))
}

fn destroy_requested(attributes: &Attributes) -> bool {
    attributes.get(DESTROY_KEY).is_some_and(Value::is_truthy_flag)
}

const ID_KEYS: [&str; 2] = ["id", "_id"];

/// Drops the destroy flag and id keys that were submitted as null.
fn without_destroy_flag(mut attributes: Attributes) -> Attributes {
    attributes.remove(DESTROY_KEY);
    for key in ID_KEYS {
        if attributes.get(key).is_some_and(Value::is_null) {
            attributes.remove(key);
        }
    }
    attributes
}

/// Attributes to apply to an existing child; the decision carries the
/// converted id, so the raw submitted one is dropped.
fn update_attributes(attributes: Attributes) -> Attributes {
    let mut attributes = without_destroy_flag(attributes);
    for key in ID_KEYS {
        attributes.remove(key);
    }
    attributes
}

fn ensure_cardinality(
    policy: &ReconciliationPolicy,
    expected: Cardinality,
) -> Result<(), ValidationError> {
    let meta = policy.metadata();
    if meta.cardinality == expected {
        Ok(())
    } else {
        Err(ValidationError::CardinalityMismatch {
            relation: meta.name.clone(),
            expected,
            actual: meta.cardinality,
        })
    }
}

/// Plans the decision for a one-to-one relation.
///
/// The submitted id is converted first. Then, in order:
/// 1. destroy, when permitted and the payload is flagged and its id is
///    absent or names the existing child
/// 2. skip, when the rejection rule matches
/// 3. update the existing child when the submitted id matches it, is
///    absent, or the relation is update-only; otherwise replace it
/// 4. with no existing child, create unless update-only or blank
///
/// # Errors
/// - `ValidationError::CardinalityMismatch` if the relation holds many
/// - `ConversionError::MalformedObjectId` for a bad native id
pub fn reconcile_one<C: ChildDocument>(
    policy: &ReconciliationPolicy,
    attributes: Attributes,
    existing: Option<&C>,
) -> NestedResult<Decision> {
    ensure_cardinality(policy, Cardinality::One)?;

    let decision = plan_one(policy, attributes, existing)?;
    debug!(
        relation = %policy.metadata().name,
        decision = decision.kind(),
        "planned nested one"
    );
    Ok(decision)
}

fn plan_one<C: ChildDocument>(
    policy: &ReconciliationPolicy,
    attributes: Attributes,
    existing: Option<&C>,
) -> NestedResult<Decision> {
    let submitted = policy.convert_id(extract_id(&attributes))?;
    let names_child =
        |child: &C| submitted.as_ref().map_or(true, |id| id == child.id());

    if policy.allow_destroy() && destroy_requested(&attributes) {
        return Ok(match existing.filter(|&child| names_child(child)) {
            Some(child) => Decision::Destroy {
                id: child.id().clone(),
            },
            None => Decision::Skip {
                reason: SkipReason::NothingToDestroy,
            },
        });
    }

    if policy.reject(&attributes) {
        return Ok(Decision::Skip {
            reason: SkipReason::Rejected,
        });
    }

    let attributes = without_destroy_flag(attributes);

    let Some(child) = existing else {
        if policy.update_only() {
            return Ok(Decision::Skip {
                reason: SkipReason::UpdateOnlyWithoutExisting,
            });
        }
        if attributes.is_empty() {
            return Ok(Decision::Skip {
                reason: SkipReason::BlankPayload,
            });
        }
        return Ok(Decision::Create { attributes });
    };

    if names_child(child) || policy.update_only() {
        Ok(Decision::Update {
            id: child.id().clone(),
            attributes: update_attributes(attributes),
        })
    } else {
        Ok(Decision::Replace {
            existing: child.id().clone(),
            attributes: update_attributes(attributes),
        })
    }
}

/// Plans one decision per payload for a one-to-many relation.
///
/// Decisions are returned in payload order. For each payload the submitted
/// id is converted and matched against `existing`; a matched child is
/// destroyed when permitted and flagged, otherwise the payload is skipped
/// when rejected, updates a matched child, or creates a new one. A payload
/// flagged for destruction that matches nothing is skipped.
///
/// # Errors
/// - `ValidationError::CardinalityMismatch` if the relation holds one
/// - `ReconcileError::TooManyRecords` when the batch exceeds the limit
/// - `ConversionError::MalformedObjectId` for a bad native id; no
///   decisions are returned for the batch in that case
pub fn reconcile_many<C: ChildDocument>(
    policy: &ReconciliationPolicy,
    payloads: Vec<Attributes>,
    existing: &[C],
) -> NestedResult<Vec<Decision>> {
    ensure_cardinality(policy, Cardinality::Many)?;

    if let Some(limit) = policy.limit() {
        if payloads.len() > limit {
            return Err(ReconcileError::TooManyRecords {
                relation: policy.metadata().name.clone(),
                limit,
                actual: payloads.len(),
            }
            .into());
        }
    }

    let mut decisions = Vec::with_capacity(payloads.len());
    for attributes in payloads {
        let decision = plan_many_child(policy, attributes, existing)?;
        debug!(
            relation = %policy.metadata().name,
            decision = decision.kind(),
            "planned nested child"
        );
        decisions.push(decision);
    }
    Ok(decisions)
}

fn plan_many_child<C: ChildDocument>(
    policy: &ReconciliationPolicy,
    attributes: Attributes,
    existing: &[C],
) -> NestedResult<Decision> {
    let submitted = policy.convert_id(extract_id(&attributes))?;
    let matched = submitted
        .as_ref()
        .and_then(|id| existing.iter().find(|child| child.id() == id));

    if policy.allow_destroy() && destroy_requested(&attributes) {
        return Ok(match matched {
            Some(child) => Decision::Destroy {
                id: child.id().clone(),
            },
            None => Decision::Skip {
                reason: SkipReason::NothingToDestroy,
            },
        });
    }

    if policy.reject(&attributes) {
        return Ok(Decision::Skip {
            reason: SkipReason::Rejected,
        });
    }

    Ok(match matched {
        Some(child) => Decision::Update {
            id: child.id().clone(),
            attributes: update_attributes(attributes),
        },
        None => Decision::Create {
            attributes: without_destroy_flag(attributes),
        },
    })
}
