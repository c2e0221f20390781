//! I/O helpers: the git adapter, child processes and configuration.

pub mod config;
pub mod git;
pub mod process;
