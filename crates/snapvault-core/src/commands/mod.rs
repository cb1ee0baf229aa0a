pub mod list;
pub mod prune;
pub mod restore;
pub mod snapshot;
pub mod util;
