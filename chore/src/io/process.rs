//! Running task command lines as child processes.
//!
//! Children inherit stdin/stdout/stderr and run to completion; there is no
//! timeout and no output capture, the wrapped tools own their own output.

use std::ffi::OsString;
use std::path::PathBuf;
use std::process::{Command, ExitStatus, Stdio};

use anyhow::{Context, Result};
use tracing::{debug, error, instrument};

use crate::exit_codes;

/// One command line to run through the platform shell.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CommandRequest {
    pub line: String,
    pub workdir: PathBuf,
    /// Added to (or overriding) the inherited environment.
    pub env: Vec<(OsString, OsString)>,
}

/// Spawns commands and waits for them.
pub trait CommandRunner {
    /// Run to completion and return the exit code (`0` on success).
    fn run(&self, request: &CommandRequest) -> Result<i32>;
}

/// Runs lines through `sh -c` (or `cmd /C` on Windows).
pub struct ShellRunner;

impl CommandRunner for ShellRunner {
    #[instrument(skip_all, fields(line = %request.line))]
    fn run(&self, request: &CommandRequest) -> Result<i32> {
        let mut cmd = shell_command(&request.line);
        cmd.current_dir(&request.workdir)
            .envs(request.env.iter().map(|(key, value)| (key, value)))
            .stdin(Stdio::inherit())
            .stdout(Stdio::inherit())
            .stderr(Stdio::inherit());

        debug!("spawning child process");
        let status = match cmd.status() {
            Ok(status) => status,
            Err(e) => {
                error!(err = %e, "failed to spawn command");
                return Err(e).with_context(|| format!("spawn `{}`", request.line));
            }
        };

        let code = exit_code(status);
        debug!(exit_code = code, "command finished");
        Ok(code)
    }
}

fn shell_command(line: &str) -> Command {
    if cfg!(windows) {
        let mut cmd = Command::new("cmd");
        cmd.arg("/C").arg(line);
        cmd
    } else {
        let mut cmd = Command::new("sh");
        cmd.arg("-c").arg(line);
        cmd
    }
}

/// Exit code of a finished child; signals map to `128 + signal`.
pub fn exit_code(status: ExitStatus) -> i32 {
    if let Some(code) = status.code() {
        return code;
    }
    #[cfg(unix)]
    {
        use std::os::unix::process::ExitStatusExt;
        if let Some(signal) = status.signal() {
            return exit_codes::SIGNAL_BASE + signal;
        }
    }
    exit_codes::FAILURE
}
