//! Spec hashing for change detection.

use std::fmt;

use sha2::{Digest, Sha256};

use capstan_core::ProducerSpec;

/// Hash of a gauge spec, used to skip no-op applies and detect changes.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct SpecHash(String);

impl SpecHash {
    /// Compute the hash of a spec.
    ///
    /// Struct field order is fixed and every map in the spec is a BTreeMap,
    /// so the JSON encoding is already canonical.
    pub fn of(spec: &ProducerSpec) -> Self {
        let bytes = serde_json::to_vec(spec).unwrap_or_default();
        let digest = Sha256::digest(&bytes);
        Self(format!("sha256:{}", hex::encode(&digest[..16])))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for SpecHash {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}
