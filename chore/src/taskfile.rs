//! Built-in task table for a Python project laid out as `src/` + `tests/`,
//! and its merge with `chore.toml`.

use std::collections::BTreeMap;

use crate::core::table::TaskTable;
use crate::core::types::{Policy, Step, Task, Variant};
use crate::io::config::ChoreConfig;

pub const QUALITY: &str = "Quality";
pub const TESTING: &str = "Testing";
pub const SECURITY: &str = "Security";
pub const DEPENDENCIES: &str = "Dependencies";
pub const GIT_HOOKS: &str = "Git hooks";
pub const HOUSEKEEPING: &str = "Housekeeping";
/// Category for config tasks that do not name one.
pub const CUSTOM: &str = "Custom";

/// Fixed display order of the built-in categories.
pub const CATEGORY_ORDER: &[&str] = &[QUALITY, TESTING, SECURITY, DEPENDENCIES, GIT_HOOKS, HOUSEKEEPING];

/// Name of the task that prints the catalog instead of running anything.
pub const HELP_TASK: &str = "help";

/// Template variables available to every command line.
pub fn default_vars() -> BTreeMap<String, String> {
    [
        ("sources", "src tests"),
        ("package", "contriboo"),
        ("package_dir", "src"),
        ("docs", "README.md"),
        ("venv_dir", ".venv"),
        ("requirements_file", "requirements.txt"),
        ("min_coverage", ""),
    ]
    .into_iter()
    .map(|(key, value)| (key.to_string(), value.to_string()))
    .collect()
}

/// Built-ins overlaid with the config's own vars.
pub fn resolve_vars(config: &ChoreConfig) -> BTreeMap<String, String> {
    let mut vars = default_vars();
    vars.extend(config.vars.clone());
    vars
}

struct Builder {
    policy: Policy,
    tasks: Vec<Task>,
}

impl Builder {
    fn add(&mut self, name: &str, category: &str, description: &str) -> &mut Task {
        self.tasks.push(Task {
            name: name.to_string(),
            description: description.to_string(),
            category: category.to_string(),
            needs: Vec::new(),
            commands: Vec::new(),
            remove: Vec::new(),
            policy: self.policy,
        });
        let last = self.tasks.len() - 1;
        &mut self.tasks[last]
    }
}

fn steps(lines: &[&str]) -> Vec<Step> {
    lines.iter().map(|line| Step::new(*line)).collect()
}

fn names(list: &[&str]) -> Vec<String> {
    list.iter().map(|name| name.to_string()).collect()
}

/// The built-in tasks for `variant`, each with an explicit policy.
pub fn builtin_table(variant: Variant) -> TaskTable {
    let mut b = Builder {
        policy: variant.default_policy(),
        tasks: Vec::new(),
    };

    let mut check_needs = vec!["lint", "types", "format-check", "test"];
    if variant.checks_security() {
        check_needs.push("security");
    }
    b.add("check", QUALITY, "Run every quality gate").needs = names(&check_needs);

    b.add("lint", QUALITY, "Lint sources, tests and docs").commands = steps(&[
        "ruff check {{ sources }}",
        "pymarkdown scan {{ docs }}",
    ]);

    b.add("format", QUALITY, "Format and auto-fix sources, then reformat docs")
        .commands = steps(&[
        "ruff format {{ sources }}",
        "ruff check --fix {{ sources }}",
        "mdformat {{ docs }}",
    ]);

    b.add("format-check", QUALITY, "Verify formatting without changing files")
        .commands = steps(&[
        "ruff format --check {{ sources }}",
        "mdformat --check {{ docs }}",
    ]);

    b.add("types", QUALITY, "Run the strict type checker").commands =
        steps(&["mypy --strict {{ sources }}"]);

    b.add("test", TESTING, "Run the test suite quietly").commands = steps(&["pytest -q"]);

    b.add("test-cov", TESTING, "Run tests with a coverage report").commands = steps(&[
        "pytest --cov={{ package }} --cov-report=term-missing\
         {% if min_coverage %} --cov-fail-under={{ min_coverage }}{% endif %}",
    ]);

    b.add("security", SECURITY, "Scan code and dependencies for vulnerabilities")
        .commands = steps(&["bandit -q -r {{ package_dir }}", "pip-audit"]);

    b.add("requirements", DEPENDENCIES, "Sync dependencies and freeze the lockfile")
        .commands = steps(&[
        "uv sync",
        "uv pip freeze > {{ requirements_file }}",
    ]);

    b.add("venv", DEPENDENCIES, "Create the isolated environment").commands =
        steps(&["uv venv {{ venv_dir }}"]);

    b.add("pre-commit", GIT_HOOKS, "Refresh dependencies and reformat").needs =
        names(&["requirements", "format"]);

    b.add("pre-commit-install", GIT_HOOKS, "Install the git hooks").commands =
        steps(&["pre-commit install"]);

    b.add("pre-commit-uninstall", GIT_HOOKS, "Remove the git hooks").commands =
        steps(&["pre-commit uninstall"]);

    b.add("clean", HOUSEKEEPING, "Delete build and cache artifacts and the environment")
        .remove = names(&[
        "{{ venv_dir }}",
        "build",
        "dist",
        "*.egg-info",
        "src/*.egg-info",
        ".coverage",
        "htmlcov",
        ".pytest_cache",
        ".mypy_cache",
        ".ruff_cache",
        "**/__pycache__",
        "**/*.pyc",
    ]);

    b.add(HELP_TASK, HOUSEKEEPING, "Show this catalog");

    TaskTable::new(b.tasks)
}

/// Final task table: built-ins (unless disabled) with config tasks merged over them.
pub fn build_table(config: &ChoreConfig) -> TaskTable {
    let mut table = if config.builtin_tasks {
        builtin_table(config.variant)
    } else {
        TaskTable::default()
    };

    for (name, task) in config.tasks.iter() {
        table.upsert(Task {
            name: name.to_string(),
            description: task.description.clone(),
            category: task.category.clone().unwrap_or_else(|| CUSTOM.to_string()),
            needs: task.needs.clone(),
            commands: task.commands.iter().map(Step::from).collect(),
            remove: task.remove.clone(),
            policy: task.policy.unwrap_or(config.variant.default_policy()),
        });
    }

    if !table.contains(HELP_TASK) {
        table.upsert(Task {
            name: HELP_TASK.to_string(),
            description: "Show this catalog".to_string(),
            category: HOUSEKEEPING.to_string(),
            needs: Vec::new(),
            commands: Vec::new(),
            remove: Vec::new(),
            policy: Policy::Strict,
        });
    }
    table
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::invariants::validate_table;
    use crate::io::config::{CommandConfig, TaskConfig};

    #[test]
    fn builtin_tables_are_valid() {
        assert!(validate_table(&builtin_table(Variant::Strict)).is_empty());
        assert!(validate_table(&builtin_table(Variant::Lenient)).is_empty());
    }

    #[test]
    fn strict_check_includes_security() {
        let strict = builtin_table(Variant::Strict);
        let check = strict.get("check").expect("check");
        assert_eq!(check.needs, vec!["lint", "types", "format-check", "test", "security"]);
        assert!(strict.iter().all(|task| task.policy == Policy::Strict));

        let lenient = builtin_table(Variant::Lenient);
        let check = lenient.get("check").expect("check");
        assert_eq!(check.needs, vec!["lint", "types", "format-check", "test"]);
        assert!(lenient.iter().all(|task| task.policy == Policy::Lenient));
    }

    #[test]
    fn every_documented_task_is_defined() {
        let table = builtin_table(Variant::Strict);
        for name in [
            "help",
            "check",
            "lint",
            "format",
            "format-check",
            "types",
            "test",
            "test-cov",
            "security",
            "requirements",
            "venv",
            "pre-commit",
            "pre-commit-install",
            "pre-commit-uninstall",
            "clean",
        ] {
            assert!(table.contains(name), "missing built-in task {name}");
        }
    }

    #[test]
    fn config_tasks_replace_and_extend_builtins() {
        let mut config = ChoreConfig::default();
        config.tasks.insert(
            "lint",
            TaskConfig {
                commands: vec![CommandConfig::Line("flake8 src".into())],
                policy: Some(Policy::Lenient),
                ..TaskConfig::default()
            },
        );
        config.tasks.insert(
            "docs",
            TaskConfig {
                description: "Build docs".into(),
                commands: vec![CommandConfig::Line("mkdocs build".into())],
                ..TaskConfig::default()
            },
        );

        let table = build_table(&config);
        let lint = table.get("lint").expect("lint");
        assert_eq!(lint.commands, vec![Step::new("flake8 src")]);
        assert_eq!(lint.policy, Policy::Lenient);

        let docs = table.get("docs").expect("docs");
        assert_eq!(docs.category, CUSTOM);
        assert_eq!(docs.policy, Policy::Strict);
    }

    #[test]
    fn custom_tasks_keep_config_order() {
        let mut config = ChoreConfig {
            builtin_tasks: false,
            ..ChoreConfig::default()
        };
        for name in ["serve", "docs", "bench"] {
            config.tasks.insert(
                name,
                TaskConfig {
                    commands: vec![CommandConfig::Line(format!("make {name}"))],
                    ..TaskConfig::default()
                },
            );
        }
        let table = build_table(&config);
        assert_eq!(
            table.names().collect::<Vec<_>>(),
            vec!["serve", "docs", "bench", HELP_TASK]
        );
    }

    #[test]
    fn disabling_builtins_keeps_help() {
        let config = ChoreConfig {
            builtin_tasks: false,
            ..ChoreConfig::default()
        };
        let table = build_table(&config);
        assert_eq!(table.names().collect::<Vec<_>>(), vec![HELP_TASK]);
    }

    #[test]
    fn config_vars_override_defaults() {
        let mut config = ChoreConfig::default();
        config.vars.insert("package".into(), "demo".into());
        let vars = resolve_vars(&config);
        assert_eq!(vars["package"], "demo");
        assert_eq!(vars["venv_dir"], ".venv");
    }
}
