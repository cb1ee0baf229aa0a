pub(crate) mod list;
pub(crate) mod prune;
pub(crate) mod restore;
pub(crate) mod selftest;
pub(crate) mod snapshot;
