//! Project configuration stored in `chore.toml`.

use std::collections::BTreeMap;
use std::fmt;
use std::fs;
use std::path::Path;

use anyhow::{Context, Result, anyhow};
use serde::de::{MapAccess, Visitor};
use serde::{Deserialize, Deserializer, Serialize, Serializer};

use crate::core::types::{Policy, Step, Variant};

/// File name looked up in the project root when `--file` is not given.
pub const CONFIG_FILE_NAME: &str = "chore.toml";

/// Dispatcher configuration (TOML).
///
/// Every field is optional; a missing file behaves like an empty one.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct ChoreConfig {
    /// Default policy of the built-in tasks and whether `check` runs `security`.
    pub variant: Variant,

    /// Start from the built-in task table. When false only `[tasks]` are defined.
    pub builtin_tasks: bool,

    /// Prepend `<venv_dir>/bin` to the search path when that directory exists.
    pub venv_on_path: bool,

    /// Template variables for command lines. Merged over the built-in defaults.
    pub vars: BTreeMap<String, String>,

    /// Extra environment variables for every command.
    pub env: BTreeMap<String, String>,

    /// Task definitions. Replace built-ins of the same name or add new ones.
    #[serde(skip_serializing_if = "ConfigTasks::is_empty")]
    pub tasks: ConfigTasks,
}

impl Default for ChoreConfig {
    fn default() -> Self {
        Self {
            variant: Variant::Strict,
            builtin_tasks: true,
            venv_on_path: true,
            vars: BTreeMap::new(),
            env: BTreeMap::new(),
            tasks: ConfigTasks::default(),
        }
    }
}

/// `[tasks]` entries in the order they appear in the file.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ConfigTasks(Vec<(String, TaskConfig)>);

impl ConfigTasks {
    pub fn get(&self, name: &str) -> Option<&TaskConfig> {
        self.0
            .iter()
            .find(|(existing, _)| existing == name)
            .map(|(_, task)| task)
    }

    /// Replace the entry with the same name in place, or append it.
    pub fn insert(&mut self, name: impl Into<String>, task: TaskConfig) {
        let name = name.into();
        match self.0.iter_mut().find(|(existing, _)| *existing == name) {
            Some(entry) => entry.1 = task,
            None => self.0.push((name, task)),
        }
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &TaskConfig)> {
        self.0.iter().map(|(name, task)| (name.as_str(), task))
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl Serialize for ConfigTasks {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_map(self.iter())
    }
}

impl<'de> Deserialize<'de> for ConfigTasks {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        deserializer.deserialize_map(ConfigTasksVisitor)
    }
}

struct ConfigTasksVisitor;

impl<'de> Visitor<'de> for ConfigTasksVisitor {
    type Value = ConfigTasks;

    fn expecting(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("a table of task definitions")
    }

    fn visit_map<A: MapAccess<'de>>(self, mut map: A) -> Result<ConfigTasks, A::Error> {
        let mut tasks = ConfigTasks::default();
        while let Some((name, task)) = map.next_entry::<String, TaskConfig>()? {
            tasks.insert(name, task);
        }
        Ok(tasks)
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct TaskConfig {
    pub description: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub category: Option<String>,
    pub needs: Vec<String>,
    pub commands: Vec<CommandConfig>,
    pub remove: Vec<String>,
    /// Falls back to the variant's default policy.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub policy: Option<Policy>,
}

/// A command is either a bare line or a table naming its tool explicitly.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(untagged)]
pub enum CommandConfig {
    Line(String),
    Detailed {
        run: String,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        tool: Option<String>,
    },
}

impl From<&CommandConfig> for Step {
    fn from(command: &CommandConfig) -> Self {
        match command {
            CommandConfig::Line(run) => Step::new(run.clone()),
            CommandConfig::Detailed { run, tool } => Step {
                run: run.clone(),
                tool: tool.clone(),
            },
        }
    }
}

impl ChoreConfig {
    pub fn validate(&self) -> Result<()> {
        for key in self.vars.keys() {
            if !is_identifier(key) {
                return Err(anyhow!("vars.{key}: variable names must be identifiers"));
            }
        }
        for key in self.env.keys() {
            if key.is_empty() || key.contains('=') || key.contains('\0') {
                return Err(anyhow!("env.{key}: invalid environment variable name"));
            }
        }
        for (name, task) in self.tasks.iter() {
            if name.trim().is_empty() {
                return Err(anyhow!("tasks: task name must not be empty"));
            }
            if task.commands.iter().any(|command| match command {
                CommandConfig::Line(run) | CommandConfig::Detailed { run, .. } => {
                    run.trim().is_empty()
                }
            }) {
                return Err(anyhow!("tasks.{name}.commands: command must not be empty"));
            }
        }
        Ok(())
    }
}

fn is_identifier(key: &str) -> bool {
    let mut chars = key.chars();
    matches!(chars.next(), Some(c) if c.is_ascii_alphabetic() || c == '_')
        && chars.all(|c| c.is_ascii_alphanumeric() || c == '_')
}

/// Load config from a TOML file.
///
/// If the file is missing, returns `ChoreConfig::default()`.
pub fn load_config(path: &Path) -> Result<ChoreConfig> {
    if !path.exists() {
        return Ok(ChoreConfig::default());
    }
    let contents = fs::read_to_string(path).with_context(|| format!("read {}", path.display()))?;
    parse_config(&contents).with_context(|| format!("parse {}", path.display()))
}

pub fn parse_config(contents: &str) -> Result<ChoreConfig> {
    let cfg: ChoreConfig = toml::from_str(contents)?;
    cfg.validate()?;
    Ok(cfg)
}

/// Atomically write config to disk (temp file + rename).
pub fn write_config(path: &Path, cfg: &ChoreConfig) -> Result<()> {
    cfg.validate()?;
    let mut buf = toml::to_string_pretty(cfg).context("serialize config toml")?;
    buf.push('\n');
    write_atomic(path, &buf)
}

fn write_atomic(path: &Path, contents: &str) -> Result<()> {
    let parent = path
        .parent()
        .with_context(|| format!("config path missing parent {}", path.display()))?;
    if !parent.as_os_str().is_empty() {
        fs::create_dir_all(parent)
            .with_context(|| format!("create directory {}", parent.display()))?;
    }
    let tmp_path = path.with_extension("toml.tmp");
    fs::write(&tmp_path, contents)
        .with_context(|| format!("write temp config {}", tmp_path.display()))?;
    fs::rename(&tmp_path, path).with_context(|| format!("replace config {}", path.display()))?;
    Ok(())
}
