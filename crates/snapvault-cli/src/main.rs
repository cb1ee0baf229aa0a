mod cli;
mod cmd;
mod table;

use std::path::PathBuf;

use clap::Parser;

use cli::{Cli, Commands};

fn main() {
    let cli = Cli::parse();

    let filter = match cli.verbose {
        0 => "warn",
        1 => "info",
        2 => "debug",
        _ => "trace",
    };
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .init();

    let repo_root = resolve_repo_root(cli.repo.as_deref());
    tracing::debug!(repo = %repo_root.display(), command = cli.command.name(), "dispatching");

    let result = match &cli.command {
        Commands::Snapshot { target_directory } => {
            cmd::snapshot::run_snapshot(&repo_root, target_directory)
        }
        Commands::List => cmd::list::run_list(&repo_root),
        Commands::Restore {
            snapshot_number,
            output_directory,
        } => cmd::restore::run_restore(&repo_root, *snapshot_number, output_directory),
        Commands::Prune { snapshot } => cmd::prune::run_prune(&repo_root, *snapshot),
        Commands::Test => cmd::selftest::run_selftest(),
    };

    if let Err(e) = result {
        eprintln!("Error: {e}");
        std::process::exit(1);
    }
}

/// Repository location: explicit flag, then SNAPVAULT_REPO, then
/// `.snapvault` in the current directory.
fn resolve_repo_root(flag: Option<&str>) -> PathBuf {
    if let Some(path) = flag {
        return PathBuf::from(path);
    }
    if let Some(path) = std::env::var_os("SNAPVAULT_REPO") {
        return PathBuf::from(path);
    }
    PathBuf::from(".snapvault")
}
