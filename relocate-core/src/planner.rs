//! Move planner: turns a (source, destination) selection into ordered intents.
//!
//! Algorithm (deterministic):
//! 1) reject self moves, moves under a descendant, and unknown destination projects
//! 2) source: relocate to the destination project (if different), parent = destination
//! 3) every descendant of source, ascending by id: relocate (if different), parent = source
//!
//! Step 3 flattens the subtree: grandchildren end up as direct children of the
//! moved task. Each task therefore needs at most a fixed two-field patch and
//! nothing depends on the store cascading parent links across depths.

use serde::{Deserialize, Serialize};

use crate::graph::{GraphError, TaskGraph};
use crate::store::TaskPatch;
use crate::task::{ProjectId, ProjectSet, Task, TaskId};

/// One pending mutation against a single task.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MoveIntent {
    pub task_id: TaskId,
    /// `None` when the task already sits in the target project.
    pub target_project_id: Option<ProjectId>,
    pub target_parent_id: TaskId,
}

impl MoveIntent {
    pub fn relocates(&self) -> bool {
        self.target_project_id.is_some()
    }

    /// Single patch carrying both fields, for stores that accept it.
    pub fn combined_patch(&self) -> TaskPatch {
        TaskPatch {
            project_id: self.target_project_id.clone(),
            parent_id: Some(self.target_parent_id.clone()),
        }
    }

    /// Relocation first (if any), then the re-parent.
    pub fn sequential_patches(&self) -> Vec<TaskPatch> {
        let mut out = Vec::with_capacity(2);
        if let Some(project_id) = &self.target_project_id {
            out.push(TaskPatch::relocate(project_id.clone()));
        }
        out.push(TaskPatch::reparent(self.target_parent_id.clone()));
        out
    }
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum PlanError {
    #[error("cannot move task {0} under itself")]
    SelfMove(TaskId),

    #[error("cannot move task {source_id} under its own descendant {destination_id}")]
    CyclicMove {
        source_id: TaskId,
        destination_id: TaskId,
    },

    #[error("destination project {0} is not in the fetched project list")]
    MissingProject(ProjectId),

    #[error(transparent)]
    Graph(#[from] GraphError),
}

/// Plan a move of `source` (and its whole subtree) under `destination`.
///
/// All preconditions are checked before any intent is produced.
pub fn plan_move(
    source: &Task,
    destination: &Task,
    graph: &TaskGraph,
    projects: &ProjectSet,
) -> Result<Vec<MoveIntent>, PlanError> {
    if source.id == destination.id {
        return Err(PlanError::SelfMove(source.id.clone()));
    }
    if graph.is_descendant_of(destination, &source.id)? {
        return Err(PlanError::CyclicMove {
            source_id: source.id.clone(),
            destination_id: destination.id.clone(),
        });
    }
    if !projects.contains(&destination.project_id) {
        return Err(PlanError::MissingProject(destination.project_id.clone()));
    }

    let target = &destination.project_id;
    let relocation = |task: &Task| (task.project_id != *target).then(|| target.clone());

    let mut intents = vec![MoveIntent {
        task_id: source.id.clone(),
        target_project_id: relocation(source),
        target_parent_id: destination.id.clone(),
    }];

    for child in graph.descendants_of(&source.id) {
        intents.push(MoveIntent {
            task_id: child.id.clone(),
            target_project_id: relocation(child),
            target_parent_id: source.id.clone(),
        });
    }

    tracing::info!(
        source = %source.id,
        destination = %destination.id,
        intents = intents.len(),
        "planned move"
    );

    Ok(intents)
}
