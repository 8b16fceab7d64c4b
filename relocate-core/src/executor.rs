//! Move executor: applies planned intents strictly in order, one call at a time.
//!
//! The store offers no multi-task transaction, so there is no rollback. The
//! first failing call stops execution and the result records exactly which
//! intents were fully applied before it.

use serde::Serialize;

use crate::planner::MoveIntent;
use crate::store::{StoreError, TaskPatch, TaskStore, UpdateMode};

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "outcome", rename_all = "snake_case")]
pub enum ExecutionResult {
    Succeeded {
        applied: Vec<MoveIntent>,
    },
    Failed {
        completed: Vec<MoveIntent>,
        failing: MoveIntent,
        #[serde(serialize_with = "error_text")]
        error: StoreError,
    },
}

impl ExecutionResult {
    pub fn is_success(&self) -> bool {
        matches!(self, ExecutionResult::Succeeded { .. })
    }

    /// Intents whose remote calls all completed.
    pub fn completed(&self) -> &[MoveIntent] {
        match self {
            ExecutionResult::Succeeded { applied } => applied,
            ExecutionResult::Failed { completed, .. } => completed,
        }
    }
}

fn error_text<S: serde::Serializer>(e: &StoreError, s: S) -> Result<S::Ok, S::Error> {
    s.serialize_str(&e.to_string())
}

fn patches_for(intent: &MoveIntent, mode: UpdateMode) -> Vec<TaskPatch> {
    match mode {
        UpdateMode::Combined => vec![intent.combined_patch()],
        UpdateMode::Sequential => intent.sequential_patches(),
    }
}

/// Apply `intents` against `store`, awaiting every call before the next.
pub async fn execute<S>(intents: &[MoveIntent], store: &S) -> ExecutionResult
where
    S: TaskStore + ?Sized,
{
    let mode = store.update_mode();
    let mut completed: Vec<MoveIntent> = Vec::with_capacity(intents.len());

    for intent in intents {
        for patch in patches_for(intent, mode) {
            tracing::debug!(
                task = %intent.task_id,
                project = ?patch.project_id,
                parent = ?patch.parent_id,
                "updating task"
            );
            if let Err(error) = store.update_task(&intent.task_id, &patch).await {
                tracing::warn!(
                    task = %intent.task_id,
                    completed = completed.len(),
                    %error,
                    "move aborted"
                );
                return ExecutionResult::Failed {
                    completed,
                    failing: intent.clone(),
                    error,
                };
            }
        }
        completed.push(intent.clone());
    }

    tracing::info!(applied = completed.len(), ?mode, "move applied");
    ExecutionResult::Succeeded { applied: completed }
}
