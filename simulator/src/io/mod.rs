//! I/O helpers for simulator commands.

pub mod config;
pub mod init;
pub mod input_store;
