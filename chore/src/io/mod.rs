//! I/O helpers for dispatcher commands.

pub mod clean;
pub mod config;
pub mod init;
pub mod process;
pub mod template;
pub mod tools;
