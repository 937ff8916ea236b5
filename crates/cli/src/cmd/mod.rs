//! CLI command implementations

pub mod cat;
pub mod config;
pub mod import;
pub mod init;
pub mod log;
pub mod ls_tree;
pub mod prune;
pub mod show;
