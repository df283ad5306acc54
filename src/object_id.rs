//! Native storage-engine object identifiers.
//!
//! An `ObjectId` is 12 bytes: a 4-byte big-endian creation timestamp in
//! seconds, 5 bytes of per-process randomness, and a 3-byte counter.
//! Its text form is 24 lowercase hex digits.

use std::fmt;
use std::str::FromStr;
use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::OnceLock;

use chrono::{DateTime, TimeZone, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::ConversionError;

const COUNTER_MASK: u32 = 0x00FF_FFFF;

static COUNTER: AtomicU32 = AtomicU32::new(0);
static PROCESS_RANDOM: OnceLock<[u8; 5]> = OnceLock::new();

fn process_random() -> [u8; 5] {
    *PROCESS_RANDOM.get_or_init(|| {
        let seed = Uuid::new_v4();
        let bytes = seed.as_bytes();
        COUNTER.store(u32::from_be_bytes([0, bytes[5], bytes[6], bytes[7]]), Ordering::Relaxed);
        [bytes[0], bytes[1], bytes[2], bytes[3], bytes[4]]
    })
}

/// The storage engine's native 12-byte document identifier.
///
/// # Examples
///
/// ```
/// use nested_builder::ObjectId;
///
/// let id: ObjectId = "4d371b444835d98b8b000010".parse().unwrap();
/// assert_eq!(id.to_string(), "4d371b444835d98b8b000010");
/// assert!("not-an-id".parse::<ObjectId>().is_err());
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ObjectId([u8; 12]);

impl ObjectId {
    /// Generates a new identifier stamped with the current time.
    #[must_use]
    pub fn new() -> Self {
        let random = process_random();
        let count = COUNTER.fetch_add(1, Ordering::Relaxed) & COUNTER_MASK;
        // ObjectId timestamps are 32-bit seconds and wrap in 2106.
        #[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
        let seconds = Utc::now().timestamp() as u32;

        let mut bytes = [0u8; 12];
        bytes[..4].copy_from_slice(&seconds.to_be_bytes());
        bytes[4..9].copy_from_slice(&random);
        bytes[9..].copy_from_slice(&count.to_be_bytes()[1..]);
        Self(bytes)
    }

    /// Creates an identifier from its raw bytes.
    #[must_use]
    pub const fn from_bytes(bytes: [u8; 12]) -> Self {
        Self(bytes)
    }

    /// Returns the raw bytes.
    #[must_use]
    pub const fn bytes(&self) -> [u8; 12] {
        self.0
    }

    /// Parses the 24-digit hex form.
    ///
    /// Upper- and lowercase digits are accepted. Surrounding whitespace is
    /// not trimmed.
    ///
    /// # Errors
    /// Returns `ConversionError::MalformedObjectId` for any other input.
    pub fn parse_str(input: &str) -> Result<Self, ConversionError> {
        let malformed = || ConversionError::MalformedObjectId {
            input: input.to_string(),
        };
        if input.len() != 24 {
            return Err(malformed());
        }
        let mut bytes = [0u8; 12];
        hex::decode_to_slice(input, &mut bytes).map_err(|_| malformed())?;
        Ok(Self(bytes))
    }

    /// Returns the creation time encoded in the first four bytes.
    #[must_use]
    pub fn timestamp(&self) -> DateTime<Utc> {
        let seconds = u32::from_be_bytes([self.0[0], self.0[1], self.0[2], self.0[3]]);
        Utc.timestamp_opt(i64::from(seconds), 0)
            .single()
            .unwrap_or_default()
    }

    /// Returns the lowercase hex form.
    #[must_use]
    pub fn to_hex(&self) -> String {
        hex::encode(self.0)
    }
}

impl Default for ObjectId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for ObjectId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_hex())
    }
}

impl FromStr for ObjectId {
    type Err = ConversionError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse_str(s)
    }
}

impl Serialize for ObjectId {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: serde::Serializer,
    {
        serializer.serialize_str(&self.to_hex())
    }
}

impl<'de> Deserialize<'de> for ObjectId {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        let raw = String::deserialize(deserializer)?;
        ObjectId::parse_str(&raw).map_err(serde::de::Error::custom)
    }
}
