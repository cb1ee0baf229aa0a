pub mod lock;

use std::path::{Path, PathBuf};
use std::sync::Arc;

use tracing::debug;

use crate::blob::BlobStore;
use crate::error::Result;
use crate::meta::MetadataStore;
use crate::storage::local::LocalBackend;
use crate::storage::StorageBackend;

/// Filename of the metadata database inside the repository root.
const INDEX_DB: &str = "index.db";

/// An on-disk repository: a blob directory, a metadata database, and a
/// lock directory, all under one root.
///
/// Layout:
/// ```text
/// <root>/blobs/<shard>/<hex>   one immutable object per distinct digest
/// <root>/index.db              snapshots + file entries (SQLite)
/// <root>/locks/                advisory lock objects
/// ```
pub struct Repository {
    pub root: PathBuf,
    pub storage: Arc<dyn StorageBackend>,
    pub blobs: BlobStore,
    pub meta: MetadataStore,
}

impl Repository {
    /// Open a repository, creating the on-disk layout on first use.
    pub fn open(root: &Path) -> Result<Self> {
        let storage: Arc<dyn StorageBackend> = Arc::new(LocalBackend::new(root)?);
        let root = std::fs::canonicalize(root)?;
        let meta = MetadataStore::open(&root.join(INDEX_DB))?;
        let blobs = BlobStore::new(Arc::clone(&storage));
        debug!(root = %root.display(), "repository opened");
        Ok(Self {
            root,
            storage,
            blobs,
            meta,
        })
    }
}
