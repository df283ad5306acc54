//! Raw attribute values carried by nested payloads.
//!
//! Payloads arrive from forms and API calls, so their values are loosely
//! typed: an id may be `"42"` on the wire while the stored child holds `42`.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::ValidationError;
use crate::object_id::ObjectId;

/// Field name of the destroy flag inside a payload.
pub const DESTROY_KEY: &str = "_destroy";

/// A nested attribute payload: field name to raw value.
pub type Attributes = BTreeMap<String, Value>;

/// A single raw attribute value.
///
/// # Examples
///
/// ```
/// use nested_builder::Value;
///
/// let name = Value::from("Ann");
/// assert!(name.is_string());
/// assert!(!name.is_blank());
/// assert!(Value::from("  ").is_blank());
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", content = "value", rename_all = "snake_case")]
pub enum Value {
    Null,
    Bool(bool),
    Int(i64),
    Float(f64),
    String(String),
    ObjectId(ObjectId),
    Uuid(Uuid),
    Structured(serde_json::Value),
}

impl Value {
    /// Converts a raw JSON value into the closest variant.
    ///
    /// Integral numbers become `Int`, other numbers `Float`. Arrays and
    /// objects are kept as `Structured`.
    #[must_use]
    pub fn from_json(json: serde_json::Value) -> Self {
        match json {
            serde_json::Value::Null => Self::Null,
            serde_json::Value::Bool(v) => Self::Bool(v),
            serde_json::Value::Number(n) => match n.as_i64() {
                Some(i) => Self::Int(i),
                None => n.as_f64().map_or(Self::Structured(serde_json::Value::Number(n)), Self::Float),
            },
            serde_json::Value::String(s) => Self::String(s),
            other => Self::Structured(other),
        }
    }

    pub const fn is_null(&self) -> bool {
        matches!(self, Self::Null)
    }

    pub const fn is_bool(&self) -> bool {
        matches!(self, Self::Bool(_))
    }

    pub const fn is_int(&self) -> bool {
        matches!(self, Self::Int(_))
    }

    pub const fn is_float(&self) -> bool {
        matches!(self, Self::Float(_))
    }

    pub const fn is_string(&self) -> bool {
        matches!(self, Self::String(_))
    }

    pub const fn is_object_id(&self) -> bool {
        matches!(self, Self::ObjectId(_))
    }

    pub const fn is_uuid(&self) -> bool {
        matches!(self, Self::Uuid(_))
    }

    pub const fn as_bool(&self) -> Option<bool> {
        match self {
            Self::Bool(v) => Some(*v),
            _ => None,
        }
    }

    pub const fn as_int(&self) -> Option<i64> {
        match self {
            Self::Int(v) => Some(*v),
            _ => None,
        }
    }

    pub fn as_string(&self) -> Option<&str> {
        match self {
            Self::String(v) => Some(v),
            _ => None,
        }
    }

    pub const fn as_object_id(&self) -> Option<ObjectId> {
        match self {
            Self::ObjectId(v) => Some(*v),
            _ => None,
        }
    }

    pub const fn as_uuid(&self) -> Option<Uuid> {
        match self {
            Self::Uuid(v) => Some(*v),
            _ => None,
        }
    }

    /// Returns true for values a form would submit for an untouched field.
    ///
    /// `Null`, `false`, whitespace-only strings, and empty structured values
    /// are blank. Numbers and identifiers never are.
    #[must_use]
    pub fn is_blank(&self) -> bool {
        match self {
            Self::Null | Self::Bool(false) => true,
            Self::String(s) => s.trim().is_empty(),
            Self::Structured(json) => match json {
                serde_json::Value::Null => true,
                serde_json::Value::String(s) => s.trim().is_empty(),
                serde_json::Value::Array(items) => items.is_empty(),
                serde_json::Value::Object(map) => map.is_empty(),
                _ => false,
            },
            _ => false,
        }
    }

    /// Returns true if this value marks a payload for destruction.
    ///
    /// Accepted spellings are `true`, `1`, `"1"` and `"true"`.
    #[must_use]
    pub fn is_truthy_flag(&self) -> bool {
        match self {
            Self::Bool(v) => *v,
            Self::Int(v) => *v == 1,
            Self::String(s) => s == "1" || s == "true",
            _ => false,
        }
    }

    /// Returns a human-readable type name.
    #[must_use]
    pub const fn type_name(&self) -> &'static str {
        match self {
            Self::Null => "null",
            Self::Bool(_) => "bool",
            Self::Int(_) => "int",
            Self::Float(_) => "float",
            Self::String(_) => "string",
            Self::ObjectId(_) => "object_id",
            Self::Uuid(_) => "uuid",
            Self::Structured(_) => "structured",
        }
    }
}

impl Default for Value {
    fn default() -> Self {
        Self::Null
    }
}

impl std::fmt::Display for Value {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Null => write!(f, "null"),
            Self::Bool(v) => write!(f, "{v}"),
            Self::Int(v) => write!(f, "{v}"),
            Self::Float(v) => write!(f, "{v}"),
            Self::String(v) => write!(f, "{v}"),
            Self::ObjectId(v) => write!(f, "{v}"),
            Self::Uuid(v) => write!(f, "{v}"),
            Self::Structured(v) => write!(f, "{v}"),
        }
    }
}

impl From<bool> for Value {
    fn from(v: bool) -> Self {
        Self::Bool(v)
    }
}

impl From<i32> for Value {
    fn from(v: i32) -> Self {
        Self::Int(i64::from(v))
    }
}

impl From<i64> for Value {
    fn from(v: i64) -> Self {
        Self::Int(v)
    }
}

impl From<f64> for Value {
    fn from(v: f64) -> Self {
        Self::Float(v)
    }
}

impl From<String> for Value {
    fn from(v: String) -> Self {
        Self::String(v)
    }
}

impl From<&str> for Value {
    fn from(v: &str) -> Self {
        Self::String(v.to_string())
    }
}

impl From<ObjectId> for Value {
    fn from(v: ObjectId) -> Self {
        Self::ObjectId(v)
    }
}

impl From<Uuid> for Value {
    fn from(v: Uuid) -> Self {
        Self::Uuid(v)
    }
}

impl From<serde_json::Value> for Value {
    fn from(v: serde_json::Value) -> Self {
        Self::from_json(v)
    }
}

/// Builds a payload from a JSON object, converting each field with
/// [`Value::from_json`].
///
/// # Errors
/// Returns `ValidationError::PayloadNotObject` if `json` is not an object.
pub fn attributes_from_json(json: serde_json::Value) -> Result<Attributes, ValidationError> {
    match json {
        serde_json::Value::Object(map) => Ok(map
            .into_iter()
            .map(|(key, value)| (key, Value::from_json(value)))
            .collect()),
        serde_json::Value::Null => Err(ValidationError::PayloadNotObject { kind: "null" }),
        serde_json::Value::Bool(_) => Err(ValidationError::PayloadNotObject { kind: "bool" }),
        serde_json::Value::Number(_) => Err(ValidationError::PayloadNotObject { kind: "number" }),
        serde_json::Value::String(_) => Err(ValidationError::PayloadNotObject { kind: "string" }),
        serde_json::Value::Array(_) => Err(ValidationError::PayloadNotObject { kind: "array" }),
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    #[test]
    fn test_from_json_numbers() {
        assert_eq!(Value::from_json(json!(42)), Value::Int(42));
        assert_eq!(Value::from_json(json!(1.5)), Value::Float(1.5));
        assert_eq!(Value::from_json(json!("42")), Value::String("42".into()));
        assert_eq!(Value::from_json(json!(null)), Value::Null);
    }

    #[test]
    fn test_from_json_structured() {
        let val = Value::from_json(json!([1, 2]));
        assert_eq!(val.type_name(), "structured");
    }

    #[test]
    fn test_blank_values() {
        assert!(Value::Null.is_blank());
        assert!(Value::Bool(false).is_blank());
        assert!(Value::from("").is_blank());
        assert!(Value::from(" \t").is_blank());
        assert!(Value::Structured(json!([])).is_blank());
        assert!(Value::Structured(json!({})).is_blank());
    }

    #[test]
    fn test_non_blank_values() {
        assert!(!Value::Bool(true).is_blank());
        assert!(!Value::Int(0).is_blank());
        assert!(!Value::from("x").is_blank());
        assert!(!Value::ObjectId(ObjectId::new()).is_blank());
        assert!(!Value::Structured(json!({"a": 1})).is_blank());
    }

    #[test]
    fn test_truthy_flag_vocabulary() {
        assert!(Value::Bool(true).is_truthy_flag());
        assert!(Value::Int(1).is_truthy_flag());
        assert!(Value::from("1").is_truthy_flag());
        assert!(Value::from("true").is_truthy_flag());

        assert!(!Value::Bool(false).is_truthy_flag());
        assert!(!Value::Int(0).is_truthy_flag());
        assert!(!Value::from("0").is_truthy_flag());
        assert!(!Value::from("yes").is_truthy_flag());
        assert!(!Value::Null.is_truthy_flag());
    }

    #[test]
    fn test_display() {
        assert_eq!(Value::Int(42).to_string(), "42");
        assert_eq!(Value::from("abc").to_string(), "abc");
        assert_eq!(Value::Null.to_string(), "null");
    }

    #[test]
    fn test_attributes_from_json() {
        let attrs = attributes_from_json(json!({"id": "42", "name": "Ann", "_destroy": 1})).unwrap();
        assert_eq!(attrs.get("id"), Some(&Value::from("42")));
        assert_eq!(attrs.get("name"), Some(&Value::from("Ann")));
        assert!(attrs[DESTROY_KEY].is_truthy_flag());
    }

    #[test]
    fn test_attributes_from_json_rejects_array() {
        let err = attributes_from_json(json!([{"name": "Ann"}])).unwrap_err();
        assert!(matches!(err, ValidationError::PayloadNotObject { kind: "array" }));
    }

    #[test]
    fn test_value_serialization() {
        let val = Value::ObjectId(ObjectId::new());
        let json = serde_json::to_string(&val).unwrap();
        let back: Value = serde_json::from_str(&json).unwrap();
        assert_eq!(val, back);
    }
}
