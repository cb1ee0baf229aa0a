use std::fmt;

use serde::{Deserialize, Serialize};
use sha2::{Digest as _, Sha256};

use crate::error::{Result, VaultError};

/// A 32-byte content digest computed as SHA-256. The identity key for a blob:
/// two blobs with equal digest are assumed byte-identical.
#[derive(Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct Digest(pub [u8; 32]);

impl Digest {
    /// Compute the digest of `data`. Deterministic, no side effects.
    pub fn compute(data: &[u8]) -> Self {
        let mut hasher = Sha256::new();
        hasher.update(data);
        let mut out = [0u8; 32];
        out.copy_from_slice(&hasher.finalize());
        Digest(out)
    }

    /// Hex-encode the full digest for use as a storage key.
    pub fn to_hex(&self) -> String {
        hex::encode(self.0)
    }

    /// Decode a 64-char hex string back into a digest.
    pub fn from_hex(s: &str) -> Result<Self> {
        let bytes = hex::decode(s)
            .map_err(|e| VaultError::InvalidFormat(format!("bad digest hex '{s}': {e}")))?;
        let arr: [u8; 32] = bytes.try_into().map_err(|_| {
            VaultError::InvalidFormat(format!("bad digest length: '{s}' is not 32 bytes"))
        })?;
        Ok(Digest(arr))
    }

    /// First byte as a two-char hex string, used for the shard directory.
    pub fn shard_prefix(&self) -> String {
        hex::encode(&self.0[..1])
    }
}

impl fmt::Debug for Digest {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Digest({})", &self.to_hex()[..16])
    }
}

impl fmt::Display for Digest {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", &self.to_hex()[..16])
    }
}
