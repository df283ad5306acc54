//! Nested attribute options declared on a relation.
//!
//! Options are fixed when the relation is defined. [`NestedOptionsConfig`]
//! is the serializable snapshot loaded from configuration; closures cannot
//! be serialized, so a custom rejection predicate is attached afterwards
//! with [`NestedOptions::with_reject_if`].

use std::fmt;
use std::path::Path;
use std::sync::Arc;

use serde::{Deserialize, Serialize};

use crate::error::ValidationError;
use crate::value::{Attributes, DESTROY_KEY};

/// Signature of a caller-supplied rejection predicate.
pub type RejectPredicate = dyn Fn(&Attributes) -> bool + Send + Sync;

/// Rule deciding whether a payload is skipped entirely.
#[derive(Clone)]
pub enum RejectIf {
    /// Reject when every field other than `_destroy` is blank.
    AllBlank,

    /// Reject when the predicate returns true.
    ///
    /// The predicate receives the payload unmodified and is called once per
    /// check. It may be called from several threads when batches run in
    /// parallel, so it must be reentrant; purity is not assumed, but
    /// side effects are the caller's concern.
    Predicate(Arc<RejectPredicate>),
}

impl RejectIf {
    /// Wraps a closure as a rejection rule.
    pub fn predicate<F>(f: F) -> Self
    where
        F: Fn(&Attributes) -> bool + Send + Sync + 'static,
    {
        Self::Predicate(Arc::new(f))
    }

    /// Evaluates the rule against a payload.
    #[must_use]
    pub fn matches(&self, attributes: &Attributes) -> bool {
        match self {
            Self::AllBlank => attributes
                .iter()
                .all(|(key, value)| key == DESTROY_KEY || value.is_blank()),
            Self::Predicate(f) => f(attributes),
        }
    }
}

impl fmt::Debug for RejectIf {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::AllBlank => write!(f, "AllBlank"),
            Self::Predicate(_) => write!(f, "Predicate(<fn>)"),
        }
    }
}

/// Options recognized by a nested attributes relation.
///
/// # Examples
///
/// ```
/// use nested_builder::{NestedOptions, RejectIf};
///
/// let options = NestedOptions::new()
///     .allow_destroy(true)
///     .with_reject_if(RejectIf::AllBlank);
/// assert!(options.allow_destroy);
/// assert!(!options.update_only);
/// ```
#[derive(Debug, Clone, Default)]
pub struct NestedOptions {
    /// Whether payloads flagged with `_destroy` may remove children.
    pub allow_destroy: bool,
    /// Rule for skipping payloads.
    pub reject_if: Option<RejectIf>,
    /// Whether a one-to-one relation may only update its existing child.
    pub update_only: bool,
    /// Maximum payloads a one-to-many batch may carry.
    pub limit: Option<usize>,
}

impl NestedOptions {
    /// Creates options with every key at its default.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Converts a loaded configuration snapshot.
    #[must_use]
    pub fn from_config(config: &NestedOptionsConfig) -> Self {
        Self {
            allow_destroy: config.allow_destroy,
            reject_if: config.reject_if.map(|rule| match rule {
                RejectIfConfig::AllBlank => RejectIf::AllBlank,
            }),
            update_only: config.update_only,
            limit: config.limit,
        }
    }

    #[must_use]
    pub fn allow_destroy(mut self, allow: bool) -> Self {
        self.allow_destroy = allow;
        self
    }

    #[must_use]
    pub fn update_only(mut self, update_only: bool) -> Self {
        self.update_only = update_only;
        self
    }

    #[must_use]
    pub fn limit(mut self, limit: usize) -> Self {
        self.limit = Some(limit);
        self
    }

    /// Sets the rejection rule, replacing any rule already configured.
    #[must_use]
    pub fn with_reject_if(mut self, rule: RejectIf) -> Self {
        self.reject_if = Some(rule);
        self
    }

    /// Checks the options for values that can never be satisfied.
    ///
    /// # Errors
    /// Returns `ValidationError::InvalidLimit` when `limit` is zero.
    pub fn validate(&self) -> Result<(), ValidationError> {
        if self.limit == Some(0) {
            return Err(ValidationError::InvalidLimit);
        }
        Ok(())
    }
}

/// Named rejection rules available from configuration.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RejectIfConfig {
    AllBlank,
}

/// Serializable options snapshot.
///
/// Absent keys take their defaults and unknown keys are ignored.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct NestedOptionsConfig {
    pub allow_destroy: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reject_if: Option<RejectIfConfig>,
    pub update_only: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub limit: Option<usize>,
}

impl NestedOptionsConfig {
    /// Parses a JSON options object.
    ///
    /// # Errors
    /// Returns `ValidationError::InvalidConfig` if the JSON is malformed or a
    /// recognized key has the wrong type.
    pub fn from_json_str(json: &str) -> Result<Self, ValidationError> {
        serde_json::from_str(json).map_err(|e| ValidationError::InvalidConfig {
            reason: e.to_string(),
        })
    }

    /// Reads and parses a JSON options file.
    ///
    /// # Errors
    /// Returns `ValidationError::InvalidConfig` if the file cannot be read or
    /// parsed.
    pub fn from_path(path: impl AsRef<Path>) -> Result<Self, ValidationError> {
        let path = path.as_ref();
        let raw = std::fs::read_to_string(path).map_err(|e| ValidationError::InvalidConfig {
            reason: format!("failed to read {}: {e}", path.display()),
        })?;
        Self::from_json_str(&raw)
    }
}
