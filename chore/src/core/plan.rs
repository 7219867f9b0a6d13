//! Dependency-ordered execution plan.
//!
//! Targets are expanded depth-first: each prerequisite is placed before the
//! task that needs it, in declared order, and every task appears at most once
//! no matter how many ancestors reference it.

use std::collections::HashSet;

use serde::Serialize;

use super::table::TaskTable;
use super::types::Policy;
use crate::error::{DispatchError, TableError};

/// One task in the plan.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PlanEntry {
    pub task: String,
    /// Tasks in this plan that list `task` among their prerequisites.
    pub requested_by: Vec<String>,
    /// True when the task was requested directly (not only as a prerequisite).
    pub target: bool,
}

/// Tasks in execution order.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct Plan {
    pub entries: Vec<PlanEntry>,
}

impl Plan {
    pub fn entry(&self, task: &str) -> Option<&PlanEntry> {
        self.entries.iter().find(|entry| entry.task == task)
    }

    pub fn order(&self) -> Vec<&str> {
        self.entries.iter().map(|entry| entry.task.as_str()).collect()
    }

    fn entry_mut(&mut self, task: &str) -> Option<&mut PlanEntry> {
        self.entries.iter_mut().find(|entry| entry.task == task)
    }
}

/// Build the execution plan for `targets`, shared visited set across all of them.
pub fn build_plan(table: &TaskTable, targets: &[String]) -> Result<Plan, DispatchError> {
    let mut plan = Plan::default();
    let mut visited = HashSet::new();
    for target in targets {
        if !table.contains(target) {
            return Err(DispatchError::UnknownTask(target.clone()));
        }
        let mut stack = Vec::new();
        visit(table, target, None, &mut stack, &mut visited, &mut plan)?;
        if let Some(entry) = plan.entry_mut(target) {
            entry.target = true;
        }
    }
    Ok(plan)
}

fn visit(
    table: &TaskTable,
    name: &str,
    parent: Option<&str>,
    stack: &mut Vec<String>,
    visited: &mut HashSet<String>,
    plan: &mut Plan,
) -> Result<(), DispatchError> {
    if let Some(pos) = stack.iter().position(|seen| seen == name) {
        let mut cycle = stack[pos..].to_vec();
        cycle.push(name.to_string());
        return Err(TableError::Cycle(cycle).into());
    }

    if visited.contains(name) {
        if let (Some(parent), Some(entry)) = (parent, plan.entry_mut(name)) {
            push_unique(&mut entry.requested_by, parent);
        }
        return Ok(());
    }

    let task = table.get(name).ok_or_else(|| match parent {
        Some(parent) => DispatchError::from(TableError::UnknownPrerequisite {
            task: parent.to_string(),
            needs: name.to_string(),
        }),
        None => DispatchError::UnknownTask(name.to_string()),
    })?;

    stack.push(name.to_string());
    for needs in &task.needs {
        visit(table, needs, Some(name), stack, visited, plan)?;
    }
    stack.pop();

    visited.insert(name.to_string());
    plan.entries.push(PlanEntry {
        task: name.to_string(),
        requested_by: parent.map(|p| vec![p.to_string()]).unwrap_or_default(),
        target: false,
    });
    Ok(())
}

fn push_unique(list: &mut Vec<String>, value: &str) {
    if !list.iter().any(|existing| existing == value) {
        list.push(value.to_string());
    }
}

/// Whether a failure of `task` must end the whole run.
///
/// A failure escalates when the task was requested directly, or when some task
/// that needs it is strict and would escalate in turn. Lenient requesters
/// absorb the failure.
pub fn escalates(plan: &Plan, table: &TaskTable, task: &str) -> bool {
    plan.entry(task).is_some_and(|entry| entry.target)
        || escalates_through_requesters(plan, table, task)
}

/// Whether some strict task that needs `task` would escalate its failure.
///
/// Unlike [`escalates`], being requested directly does not count.
pub fn escalates_through_requesters(plan: &Plan, table: &TaskTable, task: &str) -> bool {
    let Some(entry) = plan.entry(task) else {
        return false;
    };
    entry.requested_by.iter().any(|requester| {
        table
            .get(requester)
            .is_some_and(|parent| parent.policy == Policy::Strict)
            && escalates(plan, table, requester)
    })
}
