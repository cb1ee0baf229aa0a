use std::sync::Arc;

use tracing::warn;

use crate::digest::Digest;
use crate::error::{Result, VaultError};
use crate::storage::StorageBackend;

const BLOBS_PREFIX: &str = "blobs/";

/// Storage key for a blob: `blobs/<shard>/<hex>`, sharded by the first
/// digest byte to keep directory sizes bounded.
fn blob_key(digest: &Digest) -> String {
    format!("{BLOBS_PREFIX}{}/{}", digest.shard_prefix(), digest.to_hex())
}

/// Content-addressed store of immutable whole-file blobs.
///
/// Deduplication falls out of the addressing: identical content yields an
/// identical key, and `put` never writes an object that already exists.
/// The store holds no reference information; reachability is reconstructed
/// by the prune sweep from surviving file entries.
pub struct BlobStore {
    storage: Arc<dyn StorageBackend>,
}

impl BlobStore {
    pub fn new(storage: Arc<dyn StorageBackend>) -> Self {
        Self { storage }
    }

    /// Store `content` under its digest. Returns the digest and whether a
    /// new object was written (`false` means the content was already stored).
    ///
    /// An existing object is only trusted when its stored size matches the
    /// content; a truncated or padded object is rewritten from the bytes in
    /// hand, repairing the damage instead of no-opping over it.
    pub fn put(&self, content: &[u8]) -> Result<(Digest, bool)> {
        let digest = Digest::compute(content);
        let key = blob_key(&digest);
        match self.storage.size(&key)? {
            Some(stored) if stored == content.len() as u64 => return Ok((digest, false)),
            Some(stored) => {
                warn!(
                    %digest,
                    stored,
                    expected = content.len(),
                    "stored blob has wrong size, rewriting"
                );
            }
            None => {}
        }
        self.storage.put(&key, content)?;
        Ok((digest, true))
    }

    /// Fetch a blob, re-verifying that the stored bytes still hash to the
    /// requested digest. A mismatch means on-disk corruption.
    pub fn get(&self, digest: &Digest) -> Result<Vec<u8>> {
        let data = self
            .storage
            .get(&blob_key(digest))?
            .ok_or(VaultError::BlobNotFound(*digest))?;
        let actual = Digest::compute(&data);
        if actual != *digest {
            return Err(VaultError::Corrupt(format!(
                "blob {digest} content hashes to {actual} ({} bytes on disk)",
                data.len()
            )));
        }
        Ok(data)
    }

    pub fn exists(&self, digest: &Digest) -> Result<bool> {
        self.storage.exists(&blob_key(digest))
    }

    /// Stored size of a blob in bytes, `None` when absent.
    pub fn size(&self, digest: &Digest) -> Result<Option<u64>> {
        self.storage.size(&blob_key(digest))
    }

    /// Remove a stored blob. Only the prune sweep may call this, and only
    /// after establishing the digest is unreferenced by every surviving
    /// snapshot.
    pub fn delete(&self, digest: &Digest) -> Result<()> {
        let key = blob_key(digest);
        if !self.storage.exists(&key)? {
            return Err(VaultError::BlobNotFound(*digest));
        }
        self.storage.delete(&key)
    }

    /// Enumerate every digest present in the store. Keys that do not decode
    /// as digests are reported and skipped, never deleted.
    pub fn digests(&self) -> Result<Vec<Digest>> {
        let mut out = Vec::new();
        for key in self.storage.list(BLOBS_PREFIX)? {
            let name = key.rsplit('/').next().unwrap_or(&key);
            match Digest::from_hex(name) {
                Ok(digest) => out.push(digest),
                Err(_) => warn!(%key, "ignoring non-blob object in blob directory"),
            }
        }
        Ok(out)
    }

    /// Number of stored objects.
    pub fn count(&self) -> Result<usize> {
        Ok(self.digests()?.len())
    }
}
