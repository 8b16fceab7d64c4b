//! Candidate sets for a move: the "today" sources and the top-level destinations.

use crate::graph::{GraphError, TaskGraph};
use crate::task::{Task, TaskId};
use chrono::NaiveDate;
use std::cmp::Ordering;
use std::collections::HashSet;

/// Tasks due on `today`, plus every descendant of such a task.
///
/// Sorted by content, then id.
pub fn today_set(graph: &TaskGraph, today: NaiveDate) -> Result<Vec<&Task>, GraphError> {
    let due_today: HashSet<&TaskId> = graph
        .tasks()
        .filter(|t| t.is_due_on(today))
        .map(|t| &t.id)
        .collect();

    let mut out = Vec::new();
    for task in graph.tasks() {
        if due_today.contains(&task.id) {
            out.push(task);
            continue;
        }
        if graph
            .ancestors_of(task)?
            .iter()
            .any(|a| due_today.contains(&a.id))
        {
            out.push(task);
        }
    }

    out.sort_by(|a, b| by_content(a, b));
    Ok(out)
}

/// Possible destinations: every task without a parent.
pub fn destination_candidates(graph: &TaskGraph) -> Vec<&Task> {
    let mut out: Vec<&Task> = graph.tasks().filter(|t| t.is_top_level()).collect();
    out.sort_by(|a, b| by_content(a, b));
    out
}

fn by_content(a: &Task, b: &Task) -> Ordering {
    a.content.cmp(&b.content).then_with(|| a.id.cmp(&b.id))
}
