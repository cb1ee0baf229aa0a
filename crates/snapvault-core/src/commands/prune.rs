use tracing::info;

use crate::error::Result;
use crate::repo::Repository;

use super::util::with_repo_lock;

#[derive(Debug)]
pub struct PruneStats {
    pub snapshot_id: u64,
    pub blobs_deleted: u64,
    pub bytes_freed: u64,
}

/// Run `snapvault prune`: delete one snapshot's metadata, then reclaim
/// every blob no longer referenced by any surviving snapshot.
///
/// The ordering is mark-and-sweep: the metadata delete commits durably
/// first, then the live set is recomputed over the remaining snapshots and
/// the blob directory is swept. A crash between the two phases leaves at
/// worst an orphaned blob that a later prune collects — never a surviving
/// snapshot referencing a missing blob.
pub fn run(repo: &mut Repository, snapshot_id: u64) -> Result<PruneStats> {
    with_repo_lock(repo, |repo| prune_locked(repo, snapshot_id))
}

fn prune_locked(repo: &mut Repository, snapshot_id: u64) -> Result<PruneStats> {
    // Surfaces SnapshotNotFound for unknown identifiers.
    repo.meta.delete_snapshot(snapshot_id)?;

    let live = repo.meta.digests_in_use()?;

    let mut blobs_deleted = 0u64;
    let mut bytes_freed = 0u64;
    for digest in repo.blobs.digests()? {
        if live.contains(&digest) {
            continue;
        }
        bytes_freed += repo.blobs.size(&digest)?.unwrap_or(0);
        repo.blobs.delete(&digest)?;
        blobs_deleted += 1;
    }

    info!(snapshot_id, blobs_deleted, bytes_freed, "snapshot pruned");
    Ok(PruneStats {
        snapshot_id,
        blobs_deleted,
        bytes_freed,
    })
}
