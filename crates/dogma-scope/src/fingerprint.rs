//! Content fingerprints of evaluated configurations
//!
//! A [`Fingerprint`] is the Blake3 digest of a configuration's canonical JSON
//! (object keys sorted, no whitespace), so two evaluations that produce the
//! same values hash the same regardless of assignment order.

use std::fmt::{self, Display, Formatter};
use std::str::FromStr;

use serde_json::Value as JsonValue;

/// 32-byte Blake3 digest
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Fingerprint([u8; 32]);

impl Fingerprint {
    /// Wrap raw digest bytes
    #[inline]
    #[must_use]
    pub const fn new(bytes: [u8; 32]) -> Self {
        Self(bytes)
    }

    /// Digest of arbitrary bytes
    #[inline]
    #[must_use]
    pub fn compute(data: &[u8]) -> Self {
        Self(*blake3::hash(data).as_bytes())
    }

    /// Digest of the canonical encoding of `value`
    #[must_use]
    pub fn of_json(value: &JsonValue) -> Self {
        Self::compute(canonical_json(value).as_bytes())
    }

    /// Parse from a byte slice
    ///
    /// # Errors
    /// Returns error if the slice is not exactly 32 bytes
    pub fn from_slice(bytes: &[u8]) -> Result<Self, FingerprintError> {
        let arr: [u8; 32] = bytes
            .try_into()
            .map_err(|_| FingerprintError::InvalidLength {
                expected: 32,
                actual: bytes.len(),
            })?;
        Ok(Self(arr))
    }

    /// Raw digest bytes
    #[inline]
    #[must_use]
    pub const fn as_bytes(&self) -> &[u8; 32] {
        &self.0
    }

    /// First 16 hex characters
    #[inline]
    #[must_use]
    pub fn short(&self) -> String {
        hex::encode(&self.0[..8])
    }
}

impl Display for Fingerprint {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        f.write_str(&hex::encode(self.0))
    }
}

impl FromStr for Fingerprint {
    type Err = FingerprintError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::from_slice(&hex::decode(s)?)
    }
}

impl serde::Serialize for Fingerprint {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: serde::Serializer,
    {
        serializer.serialize_str(&self.to_string())
    }
}

impl<'de> serde::Deserialize<'de> for Fingerprint {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        let hex = String::deserialize(deserializer)?;
        hex.parse().map_err(serde::de::Error::custom)
    }
}

/// Errors parsing a fingerprint
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum FingerprintError {
    /// Wrong number of bytes
    #[error("invalid fingerprint length: expected {expected}, got {actual}")]
    InvalidLength {
        /// Required length
        expected: usize,
        /// Length found
        actual: usize,
    },

    /// Not hexadecimal
    #[error("hex decode error: {0}")]
    HexDecode(#[from] hex::FromHexError),
}

/// Compact JSON with object keys sorted at every level
pub(crate) fn canonical_json(value: &JsonValue) -> String {
    let mut out = String::new();
    write_canonical(value, &mut out);
    out
}

fn write_canonical(value: &JsonValue, out: &mut String) {
    match value {
        JsonValue::Object(map) => {
            let mut keys: Vec<&String> = map.keys().collect();
            keys.sort();
            out.push('{');
            for (i, key) in keys.into_iter().enumerate() {
                if i > 0 {
                    out.push(',');
                }
                out.push_str(&JsonValue::String(key.clone()).to_string());
                out.push(':');
                if let Some(child) = map.get(key) {
                    write_canonical(child, out);
                }
            }
            out.push('}');
        }
        JsonValue::Array(items) => {
            out.push('[');
            for (i, item) in items.iter().enumerate() {
                if i > 0 {
                    out.push(',');
                }
                write_canonical(item, out);
            }
            out.push(']');
        }
        scalar => out.push_str(&scalar.to_string()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use serde_json::json;

    #[test]
    fn canonical_form_sorts_and_escapes() {
        let value = json!({"b": [1, 2.5, null], "a": {"y": "q\"uote", "x": true}});
        assert_eq!(
            canonical_json(&value),
            r#"{"a":{"x":true,"y":"q\"uote"},"b":[1,2.5,null]}"#
        );
    }

    #[test]
    fn equal_values_share_a_fingerprint() {
        let a = Fingerprint::of_json(&json!({"lr": 0.1, "epochs": 3}));
        let b = Fingerprint::of_json(&json!({"epochs": 3, "lr": 0.1}));
        let c = Fingerprint::of_json(&json!({"epochs": 3, "lr": 0.2}));
        assert_eq!(a, b);
        assert_ne!(a, c);
        assert_eq!(a.short().len(), 16);
    }

    #[test]
    fn hex_round_trip_and_errors() {
        let fp = Fingerprint::compute(b"dogma");
        assert_eq!(fp.to_string().parse::<Fingerprint>().unwrap(), fp);
        assert_eq!(
            "abcd".parse::<Fingerprint>(),
            Err(FingerprintError::InvalidLength {
                expected: 32,
                actual: 2
            })
        );
        assert!(matches!("zz".parse::<Fingerprint>(), Err(FingerprintError::HexDecode(_))));
    }

    #[test]
    fn hex_decode_errors_compare_by_cause() {
        let err = "zz".parse::<Fingerprint>().unwrap_err();
        assert_eq!(
            err,
            FingerprintError::HexDecode(hex::FromHexError::InvalidHexCharacter { c: 'z', index: 0 })
        );
        assert_eq!(err.clone(), err);
    }

    #[test]
    fn serializes_as_hex_string() {
        let fp = Fingerprint::new([0xab; 32]);
        let encoded = serde_json::to_value(fp).unwrap();
        assert_eq!(encoded, json!("ab".repeat(32)));
        assert_eq!(serde_json::from_value::<Fingerprint>(encoded).unwrap(), fp);
    }
}
