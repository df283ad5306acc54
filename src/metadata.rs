//! Relation metadata consumed from the model registry.
//!
//! A relation describes one parent-to-child association: its name, the
//! target model, and whether the parent holds one child or many. The
//! target model declares the concrete type of its identifier field, which
//! decides how submitted ids are coerced before matching.

use std::fmt;

use serde::{Deserialize, Serialize};

/// Concrete type of a target model's identifier field.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum IdType {
    /// The storage engine's native [`ObjectId`](crate::ObjectId).
    ObjectId,
    /// Signed 64-bit integer.
    Int,
    /// 64-bit float.
    Float,
    /// Plain text.
    String,
    /// RFC 4122 UUID.
    Uuid,
}

impl fmt::Display for IdType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::ObjectId => write!(f, "object_id"),
            Self::Int => write!(f, "int"),
            Self::Float => write!(f, "float"),
            Self::String => write!(f, "string"),
            Self::Uuid => write!(f, "uuid"),
        }
    }
}

/// Descriptor of the child model a relation points at.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TargetModel {
    pub name: String,
    pub id_type: IdType,
}

impl TargetModel {
    /// Creates a descriptor for `name` whose identifier field is `id_type`.
    #[must_use]
    pub fn new(name: impl Into<String>, id_type: IdType) -> Self {
        Self {
            name: name.into(),
            id_type,
        }
    }

    /// Creates a descriptor for a model keyed by native object ids.
    #[must_use]
    pub fn with_object_ids(name: impl Into<String>) -> Self {
        Self::new(name, IdType::ObjectId)
    }

    /// Returns true if the model is keyed by native object ids.
    #[must_use]
    pub fn using_object_ids(&self) -> bool {
        self.id_type == IdType::ObjectId
    }
}

/// How many children a relation holds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Cardinality {
    One,
    Many,
}

impl fmt::Display for Cardinality {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::One => write!(f, "one"),
            Self::Many => write!(f, "many"),
        }
    }
}

/// Static descriptor of one parent-to-child relation.
///
/// # Examples
///
/// ```
/// use nested_builder::{Cardinality, IdType, RelationMetadata, TargetModel};
///
/// let meta = RelationMetadata::many("addresses", TargetModel::new("Address", IdType::Int));
/// assert_eq!(meta.cardinality, Cardinality::Many);
/// assert!(!meta.target.using_object_ids());
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RelationMetadata {
    pub name: String,
    pub target: TargetModel,
    pub cardinality: Cardinality,
}

impl RelationMetadata {
    /// Describes a one-to-one relation.
    #[must_use]
    pub fn one(name: impl Into<String>, target: TargetModel) -> Self {
        Self {
            name: name.into(),
            target,
            cardinality: Cardinality::One,
        }
    }

    /// Describes a one-to-many relation.
    #[must_use]
    pub fn many(name: impl Into<String>, target: TargetModel) -> Self {
        Self {
            name: name.into(),
            target,
            cardinality: Cardinality::Many,
        }
    }
}

/// Identifier coercion strategy, resolved once per target model.
///
/// `Typed` never carries [`IdType::ObjectId`]; models keyed by object ids
/// always resolve to `NativeObjectId`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum IdStrategy {
    NativeObjectId,
    Typed(IdType),
}

impl From<&TargetModel> for IdStrategy {
    fn from(model: &TargetModel) -> Self {
        if model.using_object_ids() {
            Self::NativeObjectId
        } else {
            Self::Typed(model.id_type)
        }
    }
}
