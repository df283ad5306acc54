//! Error types for nested attribute reconciliation.
//!
//! All errors are strongly typed using thiserror so callers can match on
//! the specific condition instead of parsing messages.

use thiserror::Error;

use crate::metadata::Cardinality;

/// Errors raised while validating configuration or caller input.
#[derive(Debug, Error)]
pub enum ValidationError {
    #[error("Relation name cannot be empty")]
    EmptyRelationName,

    #[error("Target model name cannot be empty")]
    EmptyModelName,

    #[error("Nested attribute limit must be at least 1")]
    InvalidLimit,

    #[error("Relation '{relation}' is {actual}, expected {expected}")]
    CardinalityMismatch {
        relation: String,
        expected: Cardinality,
        actual: Cardinality,
    },

    #[error("Nested attribute payload must be an object, got {kind}")]
    PayloadNotObject {
        kind: &'static str,
    },

    #[error("Invalid nested attribute configuration: {reason}")]
    InvalidConfig {
        reason: String,
    },
}

/// Errors raised while coercing a submitted identifier.
#[derive(Debug, Error)]
pub enum ConversionError {
    #[error("Malformed object id: {input:?}")]
    MalformedObjectId {
        input: String,
    },
}

/// Errors raised while planning a reconciliation batch.
#[derive(Debug, Error)]
pub enum ReconcileError {
    #[error("Relation '{relation}' accepts at most {limit} nested records, got {actual}")]
    TooManyRecords {
        relation: String,
        limit: usize,
        actual: usize,
    },
}

/// Top-level error type for the crate.
#[derive(Debug, Error)]
pub enum NestedError {
    #[error("Validation error: {0}")]
    Validation(#[from] ValidationError),

    #[error("Conversion error: {0}")]
    Conversion(#[from] ConversionError),

    #[error("Reconcile error: {0}")]
    Reconcile(#[from] ReconcileError),
}

impl NestedError {
    /// Returns true if this is a validation error.
    #[must_use]
    pub const fn is_validation(&self) -> bool {
        matches!(self, Self::Validation(_))
    }

    /// Returns true if this is an identifier conversion error.
    #[must_use]
    pub const fn is_conversion(&self) -> bool {
        matches!(self, Self::Conversion(_))
    }

    /// Returns true if this is a reconciliation planning error.
    #[must_use]
    pub const fn is_reconcile(&self) -> bool {
        matches!(self, Self::Reconcile(_))
    }

    /// Returns true if the failure came from the submitted payload rather
    /// than from how the relation was configured.
    ///
    /// Payload errors abort the current batch; fixing the input and
    /// resubmitting can succeed.
    #[must_use]
    pub const fn is_payload_error(&self) -> bool {
        match self {
            Self::Validation(e) => matches!(e, ValidationError::PayloadNotObject { .. }),
            Self::Conversion(_) | Self::Reconcile(_) => true,
        }
    }
}

/// Result type alias for nested attribute operations.
pub type NestedResult<T> = Result<T, NestedError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_validation_error_cardinality() {
        let err = ValidationError::CardinalityMismatch {
            relation: "addresses".to_string(),
            expected: Cardinality::One,
            actual: Cardinality::Many,
        };
        let msg = format!("{err}");
        assert!(msg.contains("addresses"));
        assert!(msg.contains("many"));
        assert!(msg.contains("one"));
    }

    #[test]
    fn test_conversion_error_malformed() {
        let err = ConversionError::MalformedObjectId {
            input: "xyz".to_string(),
        };
        let msg = format!("{err}");
        assert!(msg.contains("Malformed object id"));
        assert!(msg.contains("\"xyz\""));
    }

    #[test]
    fn test_reconcile_error_too_many() {
        let err = ReconcileError::TooManyRecords {
            relation: "addresses".to_string(),
            limit: 2,
            actual: 5,
        };
        let msg = format!("{err}");
        assert!(msg.contains("at most 2"));
        assert!(msg.contains("got 5"));
    }

    #[test]
    fn test_nested_error_from_validation() {
        let err: NestedError = ValidationError::EmptyModelName.into();
        assert!(err.is_validation());
        assert!(!err.is_payload_error());
    }

    #[test]
    fn test_nested_error_from_conversion() {
        let err: NestedError = ConversionError::MalformedObjectId {
            input: "1".to_string(),
        }
        .into();
        assert!(err.is_conversion());
        assert!(err.is_payload_error());
    }

    #[test]
    fn test_nested_error_from_reconcile() {
        let err: NestedError = ReconcileError::TooManyRecords {
            relation: "addresses".to_string(),
            limit: 1,
            actual: 2,
        }
        .into();
        assert!(err.is_reconcile());
        assert!(err.is_payload_error());
        assert!(format!("{err}").contains("addresses"));
    }

    #[test]
    fn test_payload_not_object_is_payload_error() {
        let err: NestedError = ValidationError::PayloadNotObject { kind: "array" }.into();
        assert!(err.is_validation());
        assert!(err.is_payload_error());
    }
}
