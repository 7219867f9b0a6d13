//! Infer which executable a command line depends on.

use std::sync::LazyLock;

use regex::Regex;

use super::types::Step;

/// Shell builtins and keywords; these never need a search-path lookup.
const SHELL_BUILTINS: &[&str] = &[
    ".", ":", "[", "alias", "break", "case", "cd", "command", "continue", "echo", "eval",
    "exec", "exit", "export", "false", "for", "if", "printf", "pwd", "read", "return", "set",
    "shift", "source", "test", "trap", "true", "type", "ulimit", "umask", "unset", "until",
    "wait", "while",
];

static ASSIGNMENT_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[A-Za-z_][A-Za-z0-9_]*=").expect("valid assignment regex"));

/// Executable required by `step`: the explicit tool if set, otherwise inferred.
pub fn required_tool(step: &Step, rendered: &str) -> Option<String> {
    match &step.tool {
        Some(tool) if tool.trim().is_empty() => None,
        Some(tool) => Some(tool.trim().to_string()),
        None => infer_tool(rendered),
    }
}

/// First word of `line` after any leading `VAR=value` assignments.
///
/// Returns `None` for shell builtins, subshells and groups.
pub fn infer_tool(line: &str) -> Option<String> {
    let word = line
        .split_whitespace()
        .find(|word| !ASSIGNMENT_RE.is_match(word))?;
    let word = word.trim_matches(|c| c == '"' || c == '\'');
    if word.is_empty() || word.starts_with(['(', '{', '$', '!']) {
        return None;
    }
    if SHELL_BUILTINS.contains(&word) {
        return None;
    }
    Some(word.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn infers_first_word() {
        assert_eq!(infer_tool("ruff check src tests").as_deref(), Some("ruff"));
        assert_eq!(infer_tool("  mypy --strict src").as_deref(), Some("mypy"));
    }

    #[test]
    fn skips_leading_assignments() {
        assert_eq!(
            infer_tool("PYTHONPATH=src COVERAGE_FILE=.cov pytest -q").as_deref(),
            Some("pytest")
        );
    }

    #[test]
    fn builtins_and_groups_need_no_tool() {
        assert_eq!(infer_tool("echo done"), None);
        assert_eq!(infer_tool("exit 3"), None);
        assert_eq!(infer_tool("(cd docs && make)"), None);
        assert_eq!(infer_tool(""), None);
    }

    #[test]
    fn explicit_tool_wins() {
        let step = Step::with_tool("python -m pip_audit", "pip-audit");
        assert_eq!(required_tool(&step, &step.run).as_deref(), Some("pip-audit"));
    }

    #[test]
    fn blank_explicit_tool_disables_check() {
        let step = Step::with_tool("./scripts/bootstrap.sh", "");
        assert_eq!(required_tool(&step, &step.run), None);
    }
}
