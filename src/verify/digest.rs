//! Content digest over raw asset bytes.
//!
//! A 128-bit MD5 digest, hex encoded. It guards against transport or storage
//! corruption only and is not a security primitive.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Hex-encoded content digest.
///
/// Compared by value: a local digest and a digest of fetched bytes are equal
/// when the bytes are equal.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ContentDigest(String);

impl ContentDigest {
    /// Digest the given bytes.
    #[must_use]
    pub fn of(bytes: &[u8]) -> Self {
        Self(hex::encode(md5::compute(bytes).0))
    }

    /// Wrap an already computed hex digest. Case is normalised.
    #[must_use]
    pub fn from_hex(hex: &str) -> Self {
        Self(hex.to_ascii_lowercase())
    }

    /// Hex string form.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for ContentDigest {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}
