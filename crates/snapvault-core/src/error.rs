use thiserror::Error;

use crate::digest::Digest;

pub type Result<T> = std::result::Result<T, VaultError>;

#[derive(Debug, Error)]
pub enum VaultError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("cannot read source file '{path}': {source}")]
    SourceRead {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("cannot access target directory '{path}': {source}")]
    TargetDir {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("target is not a directory: {0}")]
    NotADirectory(String),

    #[error("directory walk failed: {0}")]
    Walk(#[from] ignore::Error),

    #[error("snapshot not found: {0}")]
    SnapshotNotFound(u64),

    #[error("blob not found: {0}")]
    BlobNotFound(Digest),

    #[error("corrupt backup: {0}")]
    Corrupt(String),

    #[error("metadata store error: {0}")]
    Metadata(#[from] rusqlite::Error),

    #[error("repository is locked by another process (lock: {0})")]
    Locked(String),

    #[error("invalid format: {0}")]
    InvalidFormat(String),

    #[error("{0}")]
    Other(String),
}
