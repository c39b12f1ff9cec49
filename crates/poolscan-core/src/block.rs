//! Canonical block records.
//!
//! Every pool API reports found blocks in its own shape; adapters normalize
//! them into [`Block`] so the rest of the system never has to care which
//! source a record came from. The block id is the content identity used for
//! deduplication within a pool's store.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};

/// A 32-byte block id, rendered as lowercase hex.
///
/// The all-zero value is reserved to mean "no canonical id" and is used by
/// synthetic placeholder entries in derived views.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct BlockId([u8; 32]);

impl BlockId {
    /// The reserved zero id.
    pub const ZERO: Self = Self([0u8; 32]);

    /// Returns true for the reserved zero id.
    pub fn is_zero(&self) -> bool {
        *self == Self::ZERO
    }

    /// The raw bytes of the id.
    pub fn as_bytes(&self) -> &[u8; 32] {
        &self.0
    }
}

impl From<[u8; 32]> for BlockId {
    fn from(bytes: [u8; 32]) -> Self {
        Self(bytes)
    }
}

impl FromStr for BlockId {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        let bytes = hex::decode(s).map_err(|e| Error::InvalidHash(e.to_string()))?;
        if bytes.len() != 32 {
            return Err(Error::InvalidHash(format!(
                "expected 32 bytes, got {}",
                bytes.len()
            )));
        }
        let mut arr = [0u8; 32];
        arr.copy_from_slice(&bytes);
        Ok(Self(arr))
    }
}

impl fmt::Display for BlockId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&hex::encode(self.0))
    }
}

impl Serialize for BlockId {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.to_string())
    }
}

impl<'de> Deserialize<'de> for BlockId {
    fn deserialize<D: serde::Deserializer<'de>>(deserializer: D) -> std::result::Result<Self, D::Error> {
        let s = String::deserialize(deserializer)?;
        s.parse().map_err(serde::de::Error::custom)
    }
}

/// One found block, normalized to the canonical schema.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Block {
    /// Content-addressed block id; [`BlockId::ZERO`] only on synthetic entries.
    pub id: BlockId,
    /// Block height; the natural ordering key within a source.
    pub height: u64,
    /// Unix timestamp in seconds (adapters normalize source units).
    pub timestamp: u64,
    /// Reward in atomic units.
    pub reward: u64,
    /// False marks a block the pool itself flagged as orphaned/invalidated.
    pub valid: bool,
    /// Miner attribution when the source reports one; empty otherwise.
    #[serde(default)]
    pub miner: String,
}

/// Rescale a raw source timestamp to Unix seconds.
///
/// Sources report timestamps in seconds, milliseconds, or microseconds with
/// no unit field, so the unit is inferred from magnitude. The thresholds are
/// far above any plausible seconds-precision Unix timestamp (~10^9..10^10),
/// so real timestamps are never misclassified.
pub fn normalize_timestamp(ts: u64) -> u64 {
    if ts > 1_000_000_000_000_000 {
        // microseconds
        ts / 1_000_000
    } else if ts > 1_000_000_000_000 {
        // milliseconds
        ts / 1_000
    } else {
        ts
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const SAMPLE_ID: &str = "4ff2236ceb2fdc6dee6317cd0b841f3f020ac985bb3f99f7f4c1f973ec28d06b";

    #[test]
    fn block_id_roundtrip() {
        let id: BlockId = SAMPLE_ID.parse().unwrap();
        assert_eq!(id.to_string(), SAMPLE_ID);
        assert!(!id.is_zero());
    }

    #[test]
    fn block_id_rejects_wrong_length() {
        assert!("abcd".parse::<BlockId>().is_err());
        assert!("".parse::<BlockId>().is_err());
    }

    #[test]
    fn block_id_rejects_non_hex() {
        let bad = "zz".repeat(32);
        assert!(bad.parse::<BlockId>().is_err());
    }

    #[test]
    fn zero_id_is_zero() {
        assert!(BlockId::ZERO.is_zero());
        assert_eq!(BlockId::default(), BlockId::ZERO);
    }

    #[test]
    fn block_id_serde_as_hex_string() {
        let id: BlockId = SAMPLE_ID.parse().unwrap();
        let json = serde_json::to_string(&id).unwrap();
        assert_eq!(json, format!("\"{}\"", SAMPLE_ID));
        let back: BlockId = serde_json::from_str(&json).unwrap();
        assert_eq!(back, id);
    }

    #[test]
    fn normalize_seconds_unchanged() {
        assert_eq!(normalize_timestamp(1_700_000_000), 1_700_000_000);
    }

    #[test]
    fn normalize_milliseconds() {
        assert_eq!(normalize_timestamp(1_700_000_000_000), 1_700_000_000);
    }

    #[test]
    fn normalize_microseconds() {
        assert_eq!(normalize_timestamp(1_700_000_000_000_000), 1_700_000_000);
    }

    #[test]
    fn normalize_zero_stays_zero() {
        assert_eq!(normalize_timestamp(0), 0);
    }
}
