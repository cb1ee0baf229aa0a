use crate::error::Result;
use crate::meta::SnapshotRecord;
use crate::repo::Repository;

/// Run `snapvault list`: all snapshot records in creation order.
/// Read-only; takes no repository lock. An empty repository yields an
/// empty list, not an error.
pub fn run(repo: &Repository) -> Result<Vec<SnapshotRecord>> {
    repo.meta.list_snapshots()
}
