pub mod blob;
pub mod commands;
pub mod digest;
pub mod error;
pub mod meta;
pub mod platform;
pub mod repo;
pub mod storage;

#[cfg(test)]
pub(crate) mod testutil;
