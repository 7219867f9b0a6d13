//! Task dispatcher for project chores: lint, type-check, format, test,
//! security scans, dependency sync, git hooks and cleanup.
//!
//! Each task is data (name, prerequisites, commands, artifacts to remove,
//! failure policy) consumed by one generic dependency-ordered runner. The
//! crate keeps a strict split:
//!
//! - **[`core`]**: Pure, deterministic logic (task table, planning,
//!   validation, failure escalation, tool inference, artifact patterns).
//! - **[`io`]**: Side-effecting operations (config files, templating, search
//!   path lookups, child processes, filesystem cleanup).
//!
//! Orchestration modules ([`dispatch`], [`catalog`]) combine the two to
//! implement the CLI.

pub mod catalog;
pub mod core;
pub mod dispatch;
pub mod error;
pub mod exit_codes;
pub mod io;
pub mod logging;
pub mod taskfile;
#[cfg(any(test, feature = "test-support"))]
pub mod test_support;
