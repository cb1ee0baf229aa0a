use std::path::Path;

use comfy_table::Cell;

use snapvault_core::commands;
use snapvault_core::repo::Repository;

use crate::table::CliTableTheme;

pub(crate) fn run_list(repo_root: &Path) -> Result<(), Box<dyn std::error::Error>> {
    let repo = Repository::open(repo_root)?;
    let snapshots = commands::list::run(&repo)?;

    if snapshots.is_empty() {
        println!("No snapshots.");
        return Ok(());
    }

    let theme = CliTableTheme::detect();
    let mut table = theme.new_data_table(&["ID", "Date", "Target"]);
    for record in &snapshots {
        table.add_row(vec![
            Cell::new(record.id),
            Cell::new(record.created_at.format("%Y-%m-%d %H:%M:%S").to_string()),
            Cell::new(record.target_path.clone()),
        ]);
    }
    println!("{table}");

    Ok(())
}
