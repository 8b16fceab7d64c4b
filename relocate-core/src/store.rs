//! Remote task store contract.
//!
//! The core never talks HTTP itself; it drives any `TaskStore`. Implementations
//! normalize their transport failures into `StoreError` and must fail with
//! `StoreError::Auth` before attempting any network call when no credential
//! is available.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::task::{Project, ProjectId, Task, TaskId};

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum StoreError {
    #[error("no access token; authenticate and retry")]
    Auth,

    #[error("{}", remote_summary(.status, .message))]
    Remote { status: u16, message: Option<String> },

    #[error("transport error: {0}")]
    Transport(String),

    #[error("unexpected response body: {0}")]
    Decode(String),
}

fn remote_summary(status: &u16, message: &Option<String>) -> String {
    match message.as_deref() {
        Some(m) if !m.trim().is_empty() => format!("remote error {status}: {m}"),
        _ => format!("remote error {status}"),
    }
}

/// Whether the store accepts `project_id` and `parent_id` in a single update.
///
/// API versions disagree, so this is a capability of the store rather than an
/// assumption of the executor. `Sequential` is always safe.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum UpdateMode {
    #[default]
    Sequential,
    Combined,
}

/// Partial task update. Absent fields are left untouched by the store.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct TaskPatch {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub project_id: Option<ProjectId>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub parent_id: Option<TaskId>,
}

impl TaskPatch {
    pub fn relocate(project_id: ProjectId) -> Self {
        Self {
            project_id: Some(project_id),
            parent_id: None,
        }
    }

    pub fn reparent(parent_id: TaskId) -> Self {
        Self {
            project_id: None,
            parent_id: Some(parent_id),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.project_id.is_none() && self.parent_id.is_none()
    }
}

#[async_trait]
pub trait TaskStore: Send + Sync {
    async fn fetch_tasks(&self) -> Result<Vec<Task>, StoreError>;

    async fn fetch_projects(&self) -> Result<Vec<Project>, StoreError>;

    /// Apply `patch` to task `id`. `Ok(None)` is a success without a body.
    async fn update_task(&self, id: &TaskId, patch: &TaskPatch)
    -> Result<Option<Task>, StoreError>;

    fn update_mode(&self) -> UpdateMode {
        UpdateMode::Sequential
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn remote_error_shows_message_when_present() {
        let e = StoreError::Remote {
            status: 404,
            message: Some("Task not found".into()),
        };
        assert_eq!(e.to_string(), "remote error 404: Task not found");

        let bare = StoreError::Remote {
            status: 500,
            message: None,
        };
        assert_eq!(bare.to_string(), "remote error 500");
    }

    #[test]
    fn patch_serializes_only_present_fields() {
        let p = TaskPatch::reparent(TaskId::new("42"));
        assert_eq!(serde_json::to_string(&p).unwrap(), r#"{"parent_id":"42"}"#);

        let both = TaskPatch {
            project_id: Some(ProjectId::new("7")),
            parent_id: Some(TaskId::new("42")),
        };
        assert_eq!(
            serde_json::to_string(&both).unwrap(),
            r#"{"project_id":"7","parent_id":"42"}"#
        );
        assert!(TaskPatch::default().is_empty());
    }
}
