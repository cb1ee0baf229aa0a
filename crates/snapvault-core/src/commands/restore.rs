use std::path::{Component, Path, PathBuf};

use tracing::info;

use crate::error::{Result, VaultError};
use crate::repo::Repository;

use super::util::with_repo_lock;

#[derive(Debug, Default)]
pub struct RestoreStats {
    pub files: u64,
    pub bytes_written: u64,
}

/// Run `snapvault restore`: reconstruct the tree recorded in a snapshot
/// under `output_dir`, byte-for-byte.
///
/// The destination need not be empty; pre-existing regular files are
/// overwritten, but a directory or symlink sitting at a target path is an
/// error. A file entry whose blob is missing or fails digest verification
/// surfaces as `Corrupt` — the store and metadata have diverged, and that
/// is never silently skipped.
///
/// Restore takes the repository lock: a concurrent prune could delete
/// blobs out from under an entry list fetched moments earlier.
pub fn run(repo: &mut Repository, snapshot_id: u64, output_dir: &Path) -> Result<RestoreStats> {
    with_repo_lock(repo, |repo| restore_locked(repo, snapshot_id, output_dir))
}

fn restore_locked(repo: &mut Repository, snapshot_id: u64, output_dir: &Path) -> Result<RestoreStats> {
    let entries = repo.meta.file_entries(snapshot_id)?;

    std::fs::create_dir_all(output_dir)?;
    let dest_root = std::fs::canonicalize(output_dir)
        .map_err(|e| VaultError::Other(format!("invalid destination '{}': {e}", output_dir.display())))?;

    let mut stats = RestoreStats::default();
    for entry in &entries {
        let rel = sanitize_entry_path(&entry.path)?;
        let target = dest_root.join(&rel);

        if let Some(parent) = target.parent() {
            std::fs::create_dir_all(parent)?;
        }
        match std::fs::symlink_metadata(&target) {
            Ok(meta) if !meta.file_type().is_file() => {
                return Err(VaultError::Other(format!(
                    "refusing to overwrite non-regular entry at '{}'",
                    target.display()
                )));
            }
            Ok(_) => {}
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {}
            Err(e) => return Err(e.into()),
        }

        let content = match repo.blobs.get(&entry.digest) {
            Ok(content) => content,
            Err(VaultError::BlobNotFound(digest)) => {
                return Err(VaultError::Corrupt(format!(
                    "snapshot {snapshot_id} entry '{}' references missing blob {digest}",
                    entry.path
                )));
            }
            Err(VaultError::Corrupt(msg)) => {
                return Err(VaultError::Corrupt(format!(
                    "snapshot {snapshot_id} entry '{}': {msg}",
                    entry.path
                )));
            }
            Err(e) => return Err(e),
        };

        std::fs::write(&target, &content)?;
        stats.files += 1;
        stats.bytes_written += content.len() as u64;
    }

    info!(
        snapshot_id,
        files = stats.files,
        bytes_written = stats.bytes_written,
        dest = %dest_root.display(),
        "snapshot restored"
    );
    Ok(stats)
}

/// Normalize a recorded entry path and refuse anything that could land
/// outside the destination. The metadata store is trusted for integrity,
/// not for path safety.
fn sanitize_entry_path(raw: &str) -> Result<PathBuf> {
    let path = Path::new(raw);
    if path.is_absolute() {
        return Err(VaultError::InvalidFormat(format!(
            "refusing to restore absolute path: {raw}"
        )));
    }
    let mut out = PathBuf::new();
    for component in path.components() {
        match component {
            Component::Normal(part) => out.push(part),
            Component::CurDir => {}
            Component::ParentDir | Component::RootDir | Component::Prefix(_) => {
                return Err(VaultError::InvalidFormat(format!(
                    "refusing to restore unsafe path: {raw}"
                )));
            }
        }
    }
    if out.as_os_str().is_empty() {
        return Err(VaultError::InvalidFormat(format!(
            "refusing to restore empty path: {raw}"
        )));
    }
    Ok(out)
}
