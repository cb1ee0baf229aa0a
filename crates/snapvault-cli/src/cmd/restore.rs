use std::path::Path;

use snapvault_core::commands;
use snapvault_core::repo::Repository;

use crate::table::format_bytes;

pub(crate) fn run_restore(
    repo_root: &Path,
    snapshot_number: u64,
    output_directory: &str,
) -> Result<(), Box<dyn std::error::Error>> {
    let mut repo = Repository::open(repo_root)?;
    let stats = commands::restore::run(&mut repo, snapshot_number, Path::new(output_directory))?;

    println!(
        "Restored: {} files ({})",
        stats.files,
        format_bytes(stats.bytes_written),
    );

    Ok(())
}
