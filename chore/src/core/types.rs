//! Task model shared by planning, validation and dispatch.
//!
//! These types carry no I/O. Command lines are stored unrendered; templating
//! and tool lookup happen in the io layer.

use serde::{Deserialize, Serialize};

/// How a task reacts to a failing command.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Policy {
    /// First failing command stops the task and the failure propagates.
    #[default]
    Strict,
    /// Failing commands are reported and skipped; the task always succeeds.
    Lenient,
}

impl Policy {
    pub fn as_str(self) -> &'static str {
        match self {
            Policy::Strict => "strict",
            Policy::Lenient => "lenient",
        }
    }
}

/// Table-wide failure flavor for the built-in tasks.
///
/// The strict variant also makes `check` depend on `security`.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Variant {
    #[default]
    Strict,
    Lenient,
}

impl Variant {
    /// Policy given to tasks that do not declare one.
    pub fn default_policy(self) -> Policy {
        match self {
            Variant::Strict => Policy::Strict,
            Variant::Lenient => Policy::Lenient,
        }
    }

    pub fn checks_security(self) -> bool {
        matches!(self, Variant::Strict)
    }
}

/// One shell command line inside a task.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Step {
    /// Command line (a template until rendered).
    pub run: String,
    /// Executable that must be on the search path. Inferred from `run` when `None`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tool: Option<String>,
}

impl Step {
    pub fn new(run: impl Into<String>) -> Self {
        Self {
            run: run.into(),
            tool: None,
        }
    }

    pub fn with_tool(run: impl Into<String>, tool: impl Into<String>) -> Self {
        Self {
            run: run.into(),
            tool: Some(tool.into()),
        }
    }
}

/// A named unit of orchestration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Task {
    pub name: String,
    pub description: String,
    pub category: String,
    /// Prerequisite task names, run in this order before `commands`.
    pub needs: Vec<String>,
    pub commands: Vec<Step>,
    /// Artifact paths or glob patterns removed before `commands` run.
    pub remove: Vec<String>,
    pub policy: Policy,
}

/// Why a task did not succeed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FailureReason {
    /// A command exited non-zero (or could not be spawned).
    Command { line: String },
    /// A required executable is not on the search path.
    MissingTool { tool: String },
    /// A prerequisite failed, so the task's own commands never ran.
    Prerequisite { task: String },
    /// Removing artifacts failed.
    Artifacts { message: String },
}

/// Final state of a task after dispatch.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TaskStatus {
    Succeeded,
    Failed { code: i32, reason: FailureReason },
}

impl TaskStatus {
    pub fn is_failed(&self) -> bool {
        matches!(self, TaskStatus::Failed { .. })
    }

    pub fn code(&self) -> i32 {
        match self {
            TaskStatus::Succeeded => 0,
            TaskStatus::Failed { code, .. } => *code,
        }
    }
}
