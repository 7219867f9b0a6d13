use thiserror::Error;

/// Problems with the task table itself, found before anything runs.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum TableError {
    #[error("task name must not be empty")]
    EmptyName,

    #[error("duplicate task '{0}'")]
    DuplicateTask(String),

    #[error("task '{task}' needs unknown task '{needs}'")]
    UnknownPrerequisite { task: String, needs: String },

    #[error("task '{task}' lists '{needs}' more than once")]
    RepeatedPrerequisite { task: String, needs: String },

    #[error("task '{task}' has an empty command")]
    EmptyCommand { task: String },

    #[error("dependency cycle: {}", .0.join(" -> "))]
    Cycle(Vec<String>),
}

/// Errors raised while turning a request into a runnable plan.
#[derive(Error, Debug)]
pub enum DispatchError {
    #[error("unknown task '{0}' (run `chore` with no arguments to list tasks)")]
    UnknownTask(String),

    #[error("invalid task table:\n- {}", join_errors(.0))]
    InvalidTable(Vec<TableError>),

    #[error("render command for task '{task}': {source}")]
    Template {
        task: String,
        #[source]
        source: minijinja::Error,
    },

    #[error("invalid artifact pattern '{pattern}' in task '{task}': {source}")]
    Pattern {
        task: String,
        pattern: String,
        #[source]
        source: PatternError,
    },
}

/// Artifact pattern rejected before any removal happens.
#[derive(Error, Debug)]
pub enum PatternError {
    #[error("pattern must name a path inside the project root")]
    OutsideRoot,

    #[error(transparent)]
    Regex(#[from] regex::Error),
}

impl From<TableError> for DispatchError {
    fn from(err: TableError) -> Self {
        DispatchError::InvalidTable(vec![err])
    }
}

fn join_errors(errors: &[TableError]) -> String {
    errors
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join("\n- ")
}
