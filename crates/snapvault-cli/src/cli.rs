use clap::{Parser, Subcommand};

#[derive(Parser)]
#[command(
    name = "snapvault",
    version,
    about = "Deduplicating, content-addressed directory snapshots",
    after_help = "\
Repository location lookup order:
  1. --repo <path>               (explicit flag)
  2. $SNAPVAULT_REPO             (environment variable)
  3. ./.snapvault                (default)"
)]
pub(crate) struct Cli {
    /// Path to the repository root (overrides SNAPVAULT_REPO)
    #[arg(short = 'R', long = "repo")]
    pub repo: Option<String>,

    /// Verbosity level (-v, -vv, -vvv)
    #[arg(short, long, action = clap::ArgAction::Count)]
    pub verbose: u8,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub(crate) enum Commands {
    /// Capture a snapshot of a directory tree
    Snapshot {
        /// Directory to snapshot
        #[arg(long = "target-directory", value_name = "DIR")]
        target_directory: String,
    },

    /// List snapshots
    List,

    /// Restore a snapshot into a directory
    Restore {
        /// Snapshot to restore
        #[arg(long = "snapshot-number", value_name = "ID")]
        snapshot_number: u64,

        /// Destination directory to restore into
        #[arg(long = "output-directory", value_name = "DIR")]
        output_directory: String,
    },

    /// Delete a snapshot and reclaim unreferenced storage
    Prune {
        /// Snapshot to delete
        #[arg(long = "snapshot", value_name = "ID")]
        snapshot: u64,
    },

    /// Run a self-test round trip against a throwaway repository
    Test,
}

impl Commands {
    pub(crate) fn name(&self) -> &'static str {
        match self {
            Self::Snapshot { .. } => "snapshot",
            Self::List => "list",
            Self::Restore { .. } => "restore",
            Self::Prune { .. } => "prune",
            Self::Test => "test",
        }
    }
}
