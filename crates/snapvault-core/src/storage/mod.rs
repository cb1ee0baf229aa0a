pub mod local;

use crate::error::Result;

/// Abstraction over the repository's object storage.
///
/// Keys are `/`-separated relative paths. Implementations must make `put`
/// atomic with respect to concurrent readers (no partially written objects
/// ever visible) and must tolerate deleting a key that does not exist.
pub trait StorageBackend: Send + Sync {
    /// Read an object. `Ok(None)` when the key does not exist.
    fn get(&self, key: &str) -> Result<Option<Vec<u8>>>;

    /// Write an object, overwriting any previous value.
    fn put(&self, key: &str, data: &[u8]) -> Result<()>;

    /// Remove an object. Removing a missing key is a no-op.
    fn delete(&self, key: &str) -> Result<()>;

    fn exists(&self, key: &str) -> Result<bool>;

    /// Size in bytes of a stored object, `Ok(None)` when absent.
    fn size(&self, key: &str) -> Result<Option<u64>>;

    /// List all object keys under `prefix`.
    fn list(&self, prefix: &str) -> Result<Vec<String>>;
}
