//! Parameter fingerprints — deterministic identity of a strategy's parameter set.
//!
//! Logged whenever the registry accepts new parameters, so a signal can be
//! traced back to the exact values that produced it.

use serde::{Deserialize, Serialize};
use std::fmt;

use crate::domain::{ParamValue, StrategyParameters};

/// BLAKE3 hex digest of a canonical parameter encoding.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ParamsHash(pub String);

impl ParamsHash {
    /// First 12 hex chars, enough for log lines.
    pub fn short(&self) -> &str {
        &self.0[..self.0.len().min(12)]
    }
}

impl fmt::Display for ParamsHash {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl StrategyParameters {
    /// Hash of id, enabled flag and every value in key order.
    ///
    /// Every variable-length field is prefixed with its byte length, so no
    /// choice of key or text value can mimic another parameter set. Numbers
    /// are hashed by bit pattern, so `0.0` and `-0.0` differ.
    pub fn fingerprint(&self) -> ParamsHash {
        let mut hasher = blake3::Hasher::new();
        update_field(&mut hasher, self.strategy_id.as_bytes());
        hasher.update(&[u8::from(self.enabled)]);
        hasher.update(&(self.values.len() as u64).to_le_bytes());
        for (name, value) in &self.values {
            update_field(&mut hasher, name.as_bytes());
            match value {
                ParamValue::Number(n) => {
                    hasher.update(b"n");
                    hasher.update(&n.to_bits().to_le_bytes());
                }
                ParamValue::Text(t) => {
                    hasher.update(b"t");
                    update_field(&mut hasher, t.as_bytes());
                }
            }
        }
        ParamsHash(hasher.finalize().to_hex().to_string())
    }
}

fn update_field(hasher: &mut blake3::Hasher, bytes: &[u8]) {
    hasher.update(&(bytes.len() as u64).to_le_bytes());
    hasher.update(bytes);
}
