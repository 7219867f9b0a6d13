//! Task catalog printed by `chore`, `chore help` and `chore --list`.

use std::fmt::Write as _;

use crate::core::table::TaskTable;
use crate::core::types::{Policy, Task};
use crate::taskfile::CATEGORY_ORDER;

/// Tasks grouped by category: built-in categories in fixed order, then any
/// custom categories alphabetically. Tasks keep their definition order.
pub fn group_by_category(table: &TaskTable) -> Vec<(&str, Vec<&Task>)> {
    let mut categories: Vec<&str> = Vec::new();
    for task in table.iter() {
        if !categories.contains(&task.category.as_str()) {
            categories.push(task.category.as_str());
        }
    }
    categories.sort_by_key(|category| {
        match CATEGORY_ORDER.iter().position(|known| known == category) {
            Some(pos) => (0, pos, String::new()),
            None => (1, 0, category.to_lowercase()),
        }
    });

    categories
        .into_iter()
        .map(|category| {
            let tasks = table.iter().filter(|task| task.category == category).collect();
            (category, tasks)
        })
        .collect()
}

/// Render the catalog as plain text.
pub fn render_catalog(table: &TaskTable) -> String {
    let width = table.names().map(str::len).max().unwrap_or(0);
    let mut out = String::from("Usage: chore [OPTIONS] [TASK]...\n");

    for (category, tasks) in group_by_category(table) {
        let _ = writeln!(out, "\n{category}:");
        for task in tasks {
            let mut line = format!("  {:<width$}  {}", task.name, task.description);
            if !task.needs.is_empty() {
                let _ = write!(line, " [needs: {}]", task.needs.join(", "));
            }
            if task.policy == Policy::Lenient {
                line.push_str(" (lenient)");
            }
            let _ = writeln!(out, "{}", line.trim_end());
        }
    }
    out
}
