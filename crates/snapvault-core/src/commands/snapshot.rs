use std::path::{Path, PathBuf};

use ignore::WalkBuilder;
use rayon::prelude::*;
use tracing::info;

use crate::error::{Result, VaultError};
use crate::meta::FileEntry;
use crate::repo::Repository;

use super::util::with_repo_lock;

#[derive(Debug)]
pub struct SnapshotStats {
    pub snapshot_id: u64,
    pub files: u64,
    pub bytes_read: u64,
    pub blobs_written: u64,
}

/// Run `snapvault snapshot`: capture a full enumeration of the regular
/// files under `target`, store their content in the blob store, and commit
/// the snapshot record plus all file entries in one metadata transaction.
///
/// Only regular file content is recorded; symbolic links, special files and
/// empty directories are deliberately out of scope. Any unreadable file or
/// walk error aborts the whole attempt before the transaction opens, so a
/// partially captured snapshot is never visible.
pub fn run(repo: &mut Repository, target: &Path) -> Result<SnapshotStats> {
    with_repo_lock(repo, |repo| snapshot_locked(repo, target))
}

fn snapshot_locked(repo: &mut Repository, target: &Path) -> Result<SnapshotStats> {
    let target = std::fs::canonicalize(target).map_err(|e| VaultError::TargetDir {
        path: target.display().to_string(),
        source: e,
    })?;
    if !target.is_dir() {
        return Err(VaultError::NotADirectory(target.display().to_string()));
    }

    let files = collect_files(&target)?;

    // Reading and hashing distinct files is independent; blob puts are
    // idempotent, so the workers may race on identical content safely.
    let hashed: Vec<(FileEntry, u64, bool)> = files
        .par_iter()
        .map(|(rel_path, abs_path)| {
            let content = std::fs::read(abs_path).map_err(|e| VaultError::SourceRead {
                path: abs_path.display().to_string(),
                source: e,
            })?;
            let (digest, written) = repo.blobs.put(&content)?;
            Ok((
                FileEntry {
                    path: rel_path.clone(),
                    digest,
                },
                content.len() as u64,
                written,
            ))
        })
        .collect::<Result<_>>()?;

    let mut entries = Vec::with_capacity(hashed.len());
    let mut bytes_read = 0u64;
    let mut blobs_written = 0u64;
    for (entry, len, written) in hashed {
        bytes_read += len;
        blobs_written += u64::from(written);
        entries.push(entry);
    }

    let snapshot_id = repo
        .meta
        .create_snapshot(&target.to_string_lossy(), &entries)?;

    info!(
        snapshot_id,
        files = entries.len(),
        bytes_read,
        blobs_written,
        "snapshot created"
    );

    Ok(SnapshotStats {
        snapshot_id,
        files: entries.len() as u64,
        bytes_read,
        blobs_written,
    })
}

/// Enumerate all regular files under `target` as `(relative path, absolute
/// path)` pairs, relative paths `/`-separated. Walk errors are hard errors.
fn collect_files(target: &Path) -> Result<Vec<(String, PathBuf)>> {
    let mut walk_builder = WalkBuilder::new(target);
    walk_builder.follow_links(false);
    walk_builder.hidden(false);
    walk_builder.ignore(false);
    walk_builder.git_global(false);
    walk_builder.git_exclude(false);
    walk_builder.git_ignore(false);
    walk_builder.parents(false);
    walk_builder.require_git(false);
    walk_builder.sort_by_file_name(std::ffi::OsStr::cmp);

    let mut files = Vec::new();
    for entry_result in walk_builder.build() {
        let entry = entry_result?;
        let file_type = entry
            .file_type()
            .ok_or_else(|| VaultError::Other(format!("stdin entry in walk: {}", entry.path().display())))?;
        if !file_type.is_file() {
            // Directories, symlinks and special files carry no entry.
            continue;
        }
        let rel = entry
            .path()
            .strip_prefix(target)
            .map_err(|e| VaultError::Other(format!("walk produced out-of-tree path: {e}")))?;
        let rel_path = rel
            .components()
            .map(|c| c.as_os_str().to_string_lossy())
            .collect::<Vec<_>>()
            .join("/");
        if rel_path.is_empty() {
            continue;
        }
        files.push((rel_path, entry.path().to_path_buf()));
    }
    Ok(files)
}
