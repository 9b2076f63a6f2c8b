//! 12-byte document identifiers
//!
//! Layout:
//! - 4 bytes: seconds since the Unix epoch, big-endian
//! - 5 bytes: random value, fixed per process
//! - 3 bytes: counter, starting at a random value
//!
//! Serialized in extended JSON as `{"$oid": "<24 hex chars>"}`.

use chrono::{DateTime, TimeZone, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::fmt;
use std::str::FromStr;
use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::OnceLock;

use super::errors::StoreError;
use crate::pipeline::{as_object_id, OID_KEY};

const COUNTER_MASK: u32 = 0x00FF_FFFF;

static PROCESS_UNIQUE: OnceLock<[u8; 5]> = OnceLock::new();
static COUNTER: OnceLock<AtomicU32> = OnceLock::new();

/// A document identifier
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "ExtendedOid", into = "ExtendedOid")]
pub struct ObjectId([u8; 12]);

#[derive(Serialize, Deserialize)]
struct ExtendedOid {
    #[serde(rename = "$oid")]
    oid: String,
}

impl ObjectId {
    /// Generates a fresh identifier
    pub fn new() -> Self {
        Self::with_timestamp(Utc::now())
    }

    /// Generates an identifier for the given creation time
    pub fn with_timestamp(at: DateTime<Utc>) -> Self {
        let seconds = u32::try_from(at.timestamp()).unwrap_or(0);
        let unique = PROCESS_UNIQUE.get_or_init(rand::random::<[u8; 5]>);
        let counter = COUNTER
            .get_or_init(|| AtomicU32::new(rand::random::<u32>() & COUNTER_MASK))
            .fetch_add(1, Ordering::Relaxed)
            & COUNTER_MASK;

        let mut bytes = [0u8; 12];
        bytes[..4].copy_from_slice(&seconds.to_be_bytes());
        bytes[4..9].copy_from_slice(unique);
        bytes[9..].copy_from_slice(&counter.to_be_bytes()[1..]);
        Self(bytes)
    }

    pub fn from_bytes(bytes: [u8; 12]) -> Self {
        Self(bytes)
    }

    pub fn bytes(&self) -> [u8; 12] {
        self.0
    }

    /// Creation time embedded in the first four bytes
    pub fn timestamp(&self) -> DateTime<Utc> {
        let seconds = u32::from_be_bytes([self.0[0], self.0[1], self.0[2], self.0[3]]);
        Utc.timestamp_opt(i64::from(seconds), 0)
            .single()
            .unwrap_or_default()
    }

    /// 24 lowercase hex characters
    pub fn to_hex(&self) -> String {
        self.0.iter().map(|b| format!("{:02x}", b)).collect()
    }

    /// Extended-JSON form
    pub fn to_value(&self) -> Value {
        serde_json::json!({ OID_KEY: self.to_hex() })
    }

    /// Reads an extended-JSON `{"$oid": ..}` value
    pub fn from_value(value: &Value) -> Option<Self> {
        as_object_id(value).and_then(|hex| hex.parse().ok())
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
    type Err = StoreError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let invalid = || StoreError::InvalidDocument(format!("invalid ObjectId '{}'", s));
        if s.len() != 24 || !s.bytes().all(|b| b.is_ascii_hexdigit()) {
            return Err(invalid());
        }

        let mut bytes = [0u8; 12];
        for (i, byte) in bytes.iter_mut().enumerate() {
            *byte = u8::from_str_radix(&s[i * 2..i * 2 + 2], 16).map_err(|_| invalid())?;
        }
        Ok(Self(bytes))
    }
}

impl TryFrom<ExtendedOid> for ObjectId {
    type Error = StoreError;

    fn try_from(value: ExtendedOid) -> Result<Self, Self::Error> {
        value.oid.parse()
    }
}

impl From<ObjectId> for ExtendedOid {
    fn from(id: ObjectId) -> Self {
        Self { oid: id.to_hex() }
    }
}
