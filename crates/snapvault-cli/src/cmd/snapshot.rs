use std::path::Path;

use snapvault_core::commands;
use snapvault_core::repo::Repository;

use crate::table::format_bytes;

pub(crate) fn run_snapshot(
    repo_root: &Path,
    target_directory: &str,
) -> Result<(), Box<dyn std::error::Error>> {
    let mut repo = Repository::open(repo_root)?;
    let stats = commands::snapshot::run(&mut repo, Path::new(target_directory))?;

    println!("Snapshot created: {}", stats.snapshot_id);
    println!(
        "  {} files, {} read, {} new blobs stored",
        stats.files,
        format_bytes(stats.bytes_read),
        stats.blobs_written,
    );

    Ok(())
}
