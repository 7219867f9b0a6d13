//! Test-only helpers: task constructors, a scripted command runner, a fake
//! tool probe and scratch project directories.

use std::cell::RefCell;
use std::collections::{HashMap, HashSet};
use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result, anyhow};
use tempfile::TempDir;

use crate::core::types::{Policy, Step, Task};
use crate::io::config::CONFIG_FILE_NAME;
use crate::io::process::{CommandRequest, CommandRunner};
use crate::io::tools::ToolProbe;

/// Strict task with the given command lines and no prerequisites.
pub fn task(name: &str, commands: &[&str]) -> Task {
    Task {
        name: name.to_string(),
        description: format!("{name} task"),
        category: "Custom".to_string(),
        needs: Vec::new(),
        commands: commands.iter().map(|line| Step::new(*line)).collect(),
        remove: Vec::new(),
        policy: Policy::Strict,
    }
}

/// Strict task that only groups prerequisites.
pub fn aggregate(name: &str, needs: &[&str]) -> Task {
    Task {
        needs: needs.iter().map(|n| n.to_string()).collect(),
        ..task(name, &[])
    }
}

/// Same task with the lenient policy.
pub fn lenient(task: Task) -> Task {
    Task {
        policy: Policy::Lenient,
        ..task
    }
}

/// Records every command line and answers with scripted exit codes.
///
/// Lines without a scripted code exit 0.
#[derive(Debug, Default)]
pub struct ScriptedRunner {
    exits: HashMap<String, i32>,
    spawn_errors: HashSet<String>,
    calls: RefCell<Vec<String>>,
}

impl ScriptedRunner {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_exit(mut self, line: &str, code: i32) -> Self {
        self.exits.insert(line.to_string(), code);
        self
    }

    /// Fail to spawn `line`, as if the shell itself could not start.
    pub fn with_spawn_error(mut self, line: &str) -> Self {
        self.spawn_errors.insert(line.to_string());
        self
    }

    /// Lines run so far, in order.
    pub fn calls(&self) -> Vec<String> {
        self.calls.borrow().clone()
    }
}

impl CommandRunner for ScriptedRunner {
    fn run(&self, request: &CommandRequest) -> Result<i32> {
        self.calls.borrow_mut().push(request.line.clone());
        if self.spawn_errors.contains(&request.line) {
            return Err(anyhow!("spawn `{}`: shell not found", request.line));
        }
        Ok(self.exits.get(&request.line).copied().unwrap_or(0))
    }
}

/// Resolves every tool except the ones listed as missing.
#[derive(Debug, Default)]
pub struct FakeProbe {
    missing: HashSet<String>,
}

impl FakeProbe {
    pub fn missing(tools: &[&str]) -> Self {
        Self {
            missing: tools.iter().map(|tool| tool.to_string()).collect(),
        }
    }
}

impl ToolProbe for FakeProbe {
    fn locate(&self, tool: &str) -> Option<PathBuf> {
        if self.missing.contains(tool) {
            None
        } else {
            Some(PathBuf::from("/usr/local/bin").join(tool))
        }
    }
}

/// Scratch project root, removed on drop.
pub struct TestProject {
    dir: TempDir,
}

impl TestProject {
    pub fn new() -> Result<Self> {
        Ok(Self {
            dir: tempfile::tempdir().context("create temp project")?,
        })
    }

    pub fn path(&self) -> &Path {
        self.dir.path()
    }

    /// Write `chore.toml` with the given contents.
    pub fn write_config(&self, contents: &str) -> Result<PathBuf> {
        let path = self.path().join(CONFIG_FILE_NAME);
        fs::write(&path, contents).with_context(|| format!("write {}", path.display()))?;
        Ok(path)
    }

    /// Create a file (and its parent directories) relative to the root.
    pub fn touch(&self, rel: &str) -> Result<PathBuf> {
        let path = self.path().join(rel);
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)
                .with_context(|| format!("create {}", parent.display()))?;
        }
        fs::write(&path, "").with_context(|| format!("write {}", path.display()))?;
        Ok(path)
    }

    pub fn read(&self, rel: &str) -> Result<String> {
        let path = self.path().join(rel);
        fs::read_to_string(&path).with_context(|| format!("read {}", path.display()))
    }
}
