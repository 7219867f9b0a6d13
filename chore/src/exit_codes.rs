//! Stable exit codes for the `chore` CLI.
//!
//! A failing task propagates its child's own exit code; these cover the
//! cases where no child process decided the outcome.

/// Every requested task succeeded (or the catalog was printed).
pub const OK: i32 = 0;
/// A command failed without reporting a usable exit code.
pub const FAILURE: i32 = 1;
/// Invalid invocation or configuration: unknown task, cycle, bad config or template.
pub const INVALID: i32 = 2;
/// A strict task needed a tool that is not on the search path.
pub const TOOL_MISSING: i32 = 127;
/// Added to the signal number when a child is killed by a signal.
pub const SIGNAL_BASE: i32 = 128;
