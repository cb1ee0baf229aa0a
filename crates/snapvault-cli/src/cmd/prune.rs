use std::path::Path;

use snapvault_core::commands;
use snapvault_core::repo::Repository;

use crate::table::format_bytes;

pub(crate) fn run_prune(
    repo_root: &Path,
    snapshot: u64,
) -> Result<(), Box<dyn std::error::Error>> {
    let mut repo = Repository::open(repo_root)?;
    let stats = commands::prune::run(&mut repo, snapshot)?;

    println!(
        "Pruned snapshot {}: {} blobs reclaimed ({})",
        stats.snapshot_id,
        stats.blobs_deleted,
        format_bytes(stats.bytes_freed),
    );

    Ok(())
}
