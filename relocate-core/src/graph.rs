//! TaskGraph — parent/child index over one fetched task snapshot.
//!
//! Built once per snapshot and shared by the today resolver and the move
//! planner, so every ancestor walk goes through the same bounded code path.
//!
//! Tolerances:
//! - A `parent_id` that references a task missing from the snapshot ends the
//!   ancestor chain (the task is treated as a root for walking purposes).
//! - A cyclic `parent_id` chain never loops: walks are bounded by the number
//!   of tasks in the graph and fail with `GraphError` once exceeded.

use crate::task::{Task, TaskId};
use std::collections::{HashMap, HashSet, VecDeque};

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum GraphError {
    #[error("parent chain of task {task} exceeds {limit} steps; parent data is cyclic")]
    CorruptParentChain { task: TaskId, limit: usize },
}

#[derive(Debug, Clone, Default)]
pub struct TaskGraph {
    tasks: HashMap<TaskId, Task>,

    // parent id -> child ids, only for parents present in `tasks`
    children: HashMap<TaskId, Vec<TaskId>>,
}

impl TaskGraph {
    /// Index a flat task list. A later duplicate id replaces an earlier one.
    pub fn new(tasks: Vec<Task>) -> Self {
        let tasks: HashMap<TaskId, Task> = tasks.into_iter().map(|t| (t.id.clone(), t)).collect();

        let mut children: HashMap<TaskId, Vec<TaskId>> = HashMap::new();
        for task in tasks.values() {
            let Some(parent_id) = task.parent_id.as_ref() else { continue };
            if tasks.contains_key(parent_id) {
                children
                    .entry(parent_id.clone())
                    .or_default()
                    .push(task.id.clone());
            }
        }
        for ids in children.values_mut() {
            ids.sort();
        }

        Self { tasks, children }
    }

    pub fn len(&self) -> usize {
        self.tasks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tasks.is_empty()
    }

    pub fn get(&self, id: &TaskId) -> Option<&Task> {
        self.tasks.get(id)
    }

    pub fn tasks(&self) -> impl Iterator<Item = &Task> {
        self.tasks.values()
    }

    /// Direct children, ascending by id.
    pub fn children_of(&self, id: &TaskId) -> impl Iterator<Item = &Task> {
        self.children
            .get(id)
            .into_iter()
            .flatten()
            .filter_map(|cid| self.tasks.get(cid))
    }

    /// Ancestors from the immediate parent up to the root.
    pub fn ancestors_of(&self, task: &Task) -> Result<Vec<&Task>, GraphError> {
        let limit = self.tasks.len();
        let mut out: Vec<&Task> = Vec::new();
        let mut current = task;

        while let Some(parent_id) = current.parent_id.as_ref() {
            let Some(parent) = self.tasks.get(parent_id) else { break };
            if out.len() >= limit {
                return Err(GraphError::CorruptParentChain {
                    task: task.id.clone(),
                    limit,
                });
            }
            out.push(parent);
            current = parent;
        }

        Ok(out)
    }

    /// Transitive and irreflexive: a task is never its own descendant.
    pub fn is_descendant_of(&self, task: &Task, ancestor_id: &TaskId) -> Result<bool, GraphError> {
        Ok(self
            .ancestors_of(task)?
            .iter()
            .any(|a| &a.id == ancestor_id))
    }

    /// Every task below `id` at any depth, ascending by id.
    pub fn descendants_of(&self, id: &TaskId) -> Vec<&Task> {
        let mut seen: HashSet<&TaskId> = HashSet::new();
        let mut queue: VecDeque<&TaskId> = VecDeque::new();
        let mut out: Vec<&Task> = Vec::new();

        seen.insert(id);
        queue.push_back(id);
        while let Some(current) = queue.pop_front() {
            for child in self.children_of(current) {
                if seen.insert(&child.id) {
                    out.push(child);
                    queue.push_back(&child.id);
                }
            }
        }

        out.sort_by(|a, b| a.id.cmp(&b.id));
        out
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ids(tasks: &[&Task]) -> Vec<String> {
        tasks.iter().map(|t| t.id.to_string()).collect()
    }

    fn sample() -> TaskGraph {
        TaskGraph::new(vec![
            Task::new("a", "root", "p1"),
            Task::new("b", "child", "p1").with_parent("a"),
            Task::new("c", "grandchild", "p1").with_parent("b"),
            Task::new("d", "other child", "p1").with_parent("a"),
            Task::new("z", "unrelated", "p2"),
        ])
    }

    #[test]
    fn ancestors_run_from_parent_to_root() {
        let g = sample();
        let c = g.get(&TaskId::new("c")).unwrap();
        assert_eq!(ids(&g.ancestors_of(c).unwrap()), vec!["b", "a"]);
    }

    #[test]
    fn dangling_parent_ends_the_chain() {
        let g = TaskGraph::new(vec![
            Task::new("x", "orphan", "p1").with_parent("gone"),
            Task::new("y", "child of orphan", "p1").with_parent("x"),
        ]);
        let y = g.get(&TaskId::new("y")).unwrap();
        assert_eq!(ids(&g.ancestors_of(y).unwrap()), vec!["x"]);
    }

    #[test]
    fn never_its_own_descendant() {
        let g = sample();
        for t in g.tasks() {
            assert!(!g.is_descendant_of(t, &t.id).unwrap());
        }
    }

    #[test]
    fn descendant_relation_is_transitive() {
        let g = sample();
        let a = TaskId::new("a");
        let b = TaskId::new("b");
        let c = g.get(&TaskId::new("c")).unwrap();
        let bt = g.get(&b).unwrap();
        assert!(g.is_descendant_of(bt, &a).unwrap());
        assert!(g.is_descendant_of(c, &b).unwrap());
        assert!(g.is_descendant_of(c, &a).unwrap());
    }

    #[test]
    fn cyclic_parents_fail_instead_of_looping() {
        let g = TaskGraph::new(vec![
            Task::new("a", "one", "p1").with_parent("b"),
            Task::new("b", "two", "p1").with_parent("a"),
        ]);
        let a = g.get(&TaskId::new("a")).unwrap();
        let err = g.is_descendant_of(a, &TaskId::new("zzz")).unwrap_err();
        assert_eq!(
            err,
            GraphError::CorruptParentChain {
                task: TaskId::new("a"),
                limit: 2
            }
        );
    }

    #[test]
    fn self_parent_is_rejected() {
        let g = TaskGraph::new(vec![Task::new("a", "loop", "p1").with_parent("a")]);
        let a = g.get(&TaskId::new("a")).unwrap();
        assert!(g.ancestors_of(a).is_err());
    }

    #[test]
    fn descendants_cover_all_depths_sorted_by_id() {
        let g = sample();
        assert_eq!(ids(&g.descendants_of(&TaskId::new("a"))), vec!["b", "c", "d"]);
        assert_eq!(ids(&g.descendants_of(&TaskId::new("b"))), vec!["c"]);
        assert!(g.descendants_of(&TaskId::new("z")).is_empty());
        assert!(g.descendants_of(&TaskId::new("missing")).is_empty());
    }

    #[test]
    fn descendants_terminate_on_cycles() {
        let g = TaskGraph::new(vec![
            Task::new("a", "one", "p1").with_parent("b"),
            Task::new("b", "two", "p1").with_parent("a"),
        ]);
        assert_eq!(ids(&g.descendants_of(&TaskId::new("a"))), vec!["b"]);
    }
}
