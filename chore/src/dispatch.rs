//! Orchestration for `chore <task>...`.
//!
//! Two phases: [`prepare`] validates the table, builds the plan and renders
//! every command line and artifact pattern, so configuration mistakes surface
//! before anything runs. [`Dispatcher::run`] then executes the plan one child
//! process at a time.

use std::ffi::OsString;
use std::fmt::Write as _;
use std::path::PathBuf;

use serde::Serialize;
use tracing::{debug, info, info_span, warn};

use crate::core::invariants::validate_table;
use crate::core::pattern::ArtifactPattern;
use crate::core::plan::{Plan, build_plan, escalates, escalates_through_requesters};
use crate::core::table::TaskTable;
use crate::core::tools::required_tool;
use crate::core::types::{FailureReason, Policy, TaskStatus};
use crate::error::DispatchError;
use crate::exit_codes;
use crate::io::clean::remove_artifacts;
use crate::io::process::{CommandRequest, CommandRunner};
use crate::io::template::CommandRenderer;
use crate::io::tools::ToolProbe;

/// A command line after templating.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PreparedCommand {
    pub line: String,
    /// Executable checked on the search path before spawning.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tool: Option<String>,
}

/// A planned task with everything rendered.
#[derive(Debug, Clone, Serialize)]
pub struct PreparedTask {
    pub name: String,
    pub policy: Policy,
    pub needs: Vec<String>,
    pub remove: Vec<String>,
    pub commands: Vec<PreparedCommand>,
    #[serde(skip)]
    patterns: Vec<ArtifactPattern>,
}

/// Plan plus rendered tasks, in execution order.
#[derive(Debug, Clone, Serialize)]
pub struct Prepared {
    #[serde(skip)]
    pub plan: Plan,
    pub tasks: Vec<PreparedTask>,
}

/// Validate `table`, plan `targets` and render every task in the plan.
pub fn prepare(
    table: &TaskTable,
    targets: &[String],
    renderer: &CommandRenderer,
) -> Result<Prepared, DispatchError> {
    let errors = validate_table(table);
    if !errors.is_empty() {
        return Err(DispatchError::InvalidTable(errors));
    }
    let plan = build_plan(table, targets)?;

    let mut tasks = Vec::with_capacity(plan.entries.len());
    for entry in &plan.entries {
        let task = table
            .get(&entry.task)
            .ok_or_else(|| DispatchError::UnknownTask(entry.task.clone()))?;
        let template_err = |source| DispatchError::Template {
            task: task.name.clone(),
            source,
        };

        let mut commands = Vec::with_capacity(task.commands.len());
        for step in &task.commands {
            let line = renderer.render(&step.run).map_err(template_err)?;
            let tool = required_tool(step, &line);
            commands.push(PreparedCommand { line, tool });
        }

        let mut remove = Vec::with_capacity(task.remove.len());
        let mut patterns = Vec::with_capacity(task.remove.len());
        for raw in &task.remove {
            let rendered = renderer.render(raw).map_err(template_err)?;
            let pattern =
                ArtifactPattern::parse(&rendered).map_err(|source| DispatchError::Pattern {
                    task: task.name.clone(),
                    pattern: rendered.clone(),
                    source,
                })?;
            remove.push(pattern.as_str().to_string());
            patterns.push(pattern);
        }

        tasks.push(PreparedTask {
            name: task.name.clone(),
            policy: task.policy,
            needs: task.needs.clone(),
            remove,
            commands,
            patterns,
        });
    }

    debug!(order = ?plan.order(), "plan prepared");
    Ok(Prepared { plan, tasks })
}

/// Human-readable plan for `--dry-run`.
pub fn describe_plan(prepared: &Prepared) -> String {
    let mut out = String::new();
    for task in &prepared.tasks {
        let _ = writeln!(out, "{} ({})", task.name, task.policy.as_str());
        if !task.needs.is_empty() {
            let _ = writeln!(out, "  needs: {}", task.needs.join(", "));
        }
        for pattern in &task.remove {
            let _ = writeln!(out, "  remove {pattern}");
        }
        for command in &task.commands {
            let _ = writeln!(out, "  $ {}", command.line);
        }
    }
    out
}

/// Process-level settings shared by every command.
#[derive(Debug, Clone)]
pub struct DispatchOptions {
    pub workdir: PathBuf,
    pub env: Vec<(OsString, OsString)>,
    /// Print `==> task` headers and `$ command` lines.
    pub echo: bool,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TaskReport {
    pub task: String,
    pub status: TaskStatus,
}

/// Outcome of a dispatch run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RunReport {
    /// Tasks that were reached, in execution order.
    pub tasks: Vec<TaskReport>,
    pub exit_code: i32,
}

impl RunReport {
    pub fn status(&self, task: &str) -> Option<&TaskStatus> {
        self.tasks
            .iter()
            .find(|report| report.task == task)
            .map(|report| &report.status)
    }
}

/// Runs prepared tasks sequentially.
pub struct Dispatcher<'a, R: CommandRunner, P: ToolProbe> {
    pub table: &'a TaskTable,
    pub runner: &'a R,
    pub probe: &'a P,
    pub options: &'a DispatchOptions,
}

impl<R: CommandRunner, P: ToolProbe> Dispatcher<'_, R, P> {
    /// Execute the plan. Stops at the first failure that escalates to a
    /// requested task; failures absorbed by lenient requesters are reported
    /// and the run continues.
    ///
    /// A missing tool only fails its own task: unless a strict requester
    /// escalates it, the remaining tasks still run and the run exits with
    /// the first failure's code.
    pub fn run(&self, prepared: &Prepared) -> RunReport {
        let mut reports: Vec<TaskReport> = Vec::with_capacity(prepared.tasks.len());
        let mut first_failure: Option<i32> = None;

        for task in &prepared.tasks {
            let _span = info_span!("task", name = %task.name).entered();

            let failed_prerequisite = match task.policy {
                Policy::Strict => task.needs.iter().find_map(|needs| {
                    reports
                        .iter()
                        .find(|report| &report.task == needs && report.status.is_failed())
                }),
                Policy::Lenient => None,
            };

            let status = match failed_prerequisite {
                Some(prerequisite) => {
                    eprintln!(
                        "chore: skipping task '{}': prerequisite '{}' failed",
                        task.name, prerequisite.task
                    );
                    TaskStatus::Failed {
                        code: prerequisite.status.code(),
                        reason: FailureReason::Prerequisite {
                            task: prerequisite.task.clone(),
                        },
                    }
                }
                None => self.run_task(task),
            };

            let code = status.code();
            let failed = status.is_failed();
            let missing_tool = matches!(
                status,
                TaskStatus::Failed {
                    reason: FailureReason::MissingTool { .. },
                    ..
                }
            );
            reports.push(TaskReport {
                task: task.name.clone(),
                status,
            });

            if failed {
                if escalates(&prepared.plan, self.table, &task.name) {
                    let exit_code = *first_failure.get_or_insert(code);
                    if missing_tool
                        && !escalates_through_requesters(&prepared.plan, self.table, &task.name)
                    {
                        eprintln!(
                            "chore: error: task '{}' failed (exit {code}); continuing with the remaining tasks",
                            task.name
                        );
                        continue;
                    }
                    eprintln!("chore: error: task '{}' failed (exit {code})", task.name);
                    return RunReport {
                        tasks: reports,
                        exit_code,
                    };
                }
                warn!(task = %task.name, code, "failure absorbed by lenient requester");
                eprintln!(
                    "chore: warning: task '{}' failed (exit {code}); continuing because a lenient task requested it",
                    task.name
                );
            }
        }

        RunReport {
            tasks: reports,
            exit_code: first_failure.unwrap_or(exit_codes::OK),
        }
    }

    fn run_task(&self, task: &PreparedTask) -> TaskStatus {
        info!(policy = task.policy.as_str(), "running task");
        if self.options.echo && (!task.commands.is_empty() || !task.patterns.is_empty()) {
            eprintln!("==> {}", task.name);
        }

        if !task.patterns.is_empty() {
            match remove_artifacts(&self.options.workdir, &task.patterns) {
                Ok(removed) => {
                    if self.options.echo {
                        for path in removed {
                            let shown = path.strip_prefix(&self.options.workdir).unwrap_or(&path);
                            eprintln!("removed {}", shown.display());
                        }
                    }
                }
                Err(err) => {
                    let message = format!("{err:#}");
                    match task.policy {
                        Policy::Strict => {
                            eprintln!("chore: error: {message}");
                            return TaskStatus::Failed {
                                code: exit_codes::FAILURE,
                                reason: FailureReason::Artifacts { message },
                            };
                        }
                        Policy::Lenient => eprintln!("chore: warning: {message}"),
                    }
                }
            }
        }

        for command in &task.commands {
            if let Some(tool) = &command.tool
                && self.probe.locate(tool).is_none()
            {
                match task.policy {
                    Policy::Strict => {
                        eprintln!(
                            "chore: error: missing tool `{tool}`: not found on PATH (required by task '{}')",
                            task.name
                        );
                        return TaskStatus::Failed {
                            code: exit_codes::TOOL_MISSING,
                            reason: FailureReason::MissingTool { tool: tool.clone() },
                        };
                    }
                    Policy::Lenient => {
                        eprintln!(
                            "chore: warning: missing tool `{tool}`: not found on PATH, skipping `{}` (task '{}')",
                            command.line, task.name
                        );
                        continue;
                    }
                }
            }

            if self.options.echo {
                eprintln!("$ {}", command.line);
            }
            let request = CommandRequest {
                line: command.line.clone(),
                workdir: self.options.workdir.clone(),
                env: self.options.env.clone(),
            };
            let code = match self.runner.run(&request) {
                Ok(code) => code,
                Err(err) => {
                    eprintln!("chore: error: {err:#}");
                    exit_codes::FAILURE
                }
            };
            if code == exit_codes::OK {
                continue;
            }

            match task.policy {
                Policy::Strict => {
                    return TaskStatus::Failed {
                        code,
                        reason: FailureReason::Command {
                            line: command.line.clone(),
                        },
                    };
                }
                Policy::Lenient => {
                    warn!(line = %command.line, code, "command failed in lenient task");
                    eprintln!(
                        "chore: warning: `{}` exited with {code}; continuing (task '{}' is lenient)",
                        command.line, task.name
                    );
                }
            }
        }

        TaskStatus::Succeeded
    }
}
