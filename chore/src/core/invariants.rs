//! Table-wide invariants checked before any task runs.

use std::collections::HashSet;

use super::plan::build_plan;
use super::table::TaskTable;
use crate::error::{DispatchError, TableError};

/// Check the whole table:
/// - No empty or duplicate names
/// - Every prerequisite names a defined task, at most once per task
/// - No empty command lines
/// - No dependency cycles
pub fn validate_table(table: &TaskTable) -> Vec<TableError> {
    let mut errors = Vec::new();
    let mut seen = HashSet::new();

    for task in table.iter() {
        if task.name.trim().is_empty() {
            errors.push(TableError::EmptyName);
        } else if !seen.insert(task.name.as_str()) {
            errors.push(TableError::DuplicateTask(task.name.clone()));
        }

        let mut needs_seen = HashSet::new();
        for needs in &task.needs {
            if !table.contains(needs) {
                errors.push(TableError::UnknownPrerequisite {
                    task: task.name.clone(),
                    needs: needs.clone(),
                });
            } else if !needs_seen.insert(needs.as_str()) {
                errors.push(TableError::RepeatedPrerequisite {
                    task: task.name.clone(),
                    needs: needs.clone(),
                });
            }
        }

        if task.commands.iter().any(|step| step.run.trim().is_empty()) {
            errors.push(TableError::EmptyCommand {
                task: task.name.clone(),
            });
        }
    }

    // Unknown prerequisites would surface again as plan errors; only look
    // for cycles once the edges are known to be valid.
    if errors.is_empty() {
        for name in table.names() {
            if let Err(DispatchError::InvalidTable(found)) = build_plan(table, &[name.to_string()])
            {
                errors.extend(found);
                break;
            }
        }
    }

    errors
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::types::Step;
    use crate::test_support::{aggregate, task};

    #[test]
    fn valid_table_has_no_errors() {
        let table = TaskTable::new(vec![task("lint", &["ruff check"]), aggregate("check", &["lint"])]);
        assert!(validate_table(&table).is_empty());
    }

    #[test]
    fn reports_every_structural_problem() {
        let mut broken = task("lint", &["ruff check"]);
        broken.commands.push(Step::new("  "));
        let table = TaskTable::new(vec![
            broken,
            task("lint", &["flake8"]),
            task("", &["true"]),
            aggregate("check", &["lint", "lint", "deploy"]),
        ]);

        let errors = validate_table(&table);
        assert!(errors.contains(&TableError::DuplicateTask("lint".into())));
        assert!(errors.contains(&TableError::EmptyName));
        assert!(errors.contains(&TableError::EmptyCommand { task: "lint".into() }));
        assert!(errors.contains(&TableError::RepeatedPrerequisite {
            task: "check".into(),
            needs: "lint".into(),
        }));
        assert!(errors.contains(&TableError::UnknownPrerequisite {
            task: "check".into(),
            needs: "deploy".into(),
        }));
    }

    #[test]
    fn reports_cycles() {
        let table = TaskTable::new(vec![aggregate("a", &["b"]), aggregate("b", &["a"])]);
        let errors = validate_table(&table);
        assert_eq!(
            errors,
            vec![TableError::Cycle(vec!["a".into(), "b".into(), "a".into()])]
        );
    }
}
