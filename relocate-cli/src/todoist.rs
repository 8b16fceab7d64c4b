//! Todoist REST client implementing `TaskStore`.

use async_trait::async_trait;
use reqwest::header::AUTHORIZATION;
use reqwest::{Method, StatusCode};
use serde::Deserialize;
use serde::de::DeserializeOwned;
use std::time::Duration;

use relocate_core::{Project, StoreError, Task, TaskId, TaskPatch, TaskStore, UpdateMode};

pub const DEFAULT_BASE_URL: &str = "https://api.todoist.com/rest/v2";

#[derive(Debug, Clone)]
pub struct TodoistClient {
    http: reqwest::Client,
    base_url: String,
    token: Option<String>,
    mode: UpdateMode,
}

impl TodoistClient {
    pub fn new(
        base_url: impl Into<String>,
        token: Option<String>,
        mode: UpdateMode,
        timeout: Duration,
    ) -> anyhow::Result<Self> {
        let http = reqwest::Client::builder().timeout(timeout).build()?;
        Ok(Self {
            http,
            base_url: base_url.into().trim_end_matches('/').to_string(),
            token,
            mode,
        })
    }

    /// Issue one request and return the raw body of a successful response.
    ///
    /// `Ok(None)` means a successful response without a body (204 or blank).
    async fn send(
        &self,
        method: Method,
        path: &str,
        body: Option<&TaskPatch>,
    ) -> Result<Option<Vec<u8>>, StoreError> {
        let token = self.token.as_deref().ok_or(StoreError::Auth)?;
        let url = format!("{}{}", self.base_url, path);
        tracing::debug!(%method, %url, "todoist request");

        let mut req = self
            .http
            .request(method, &url)
            .header(AUTHORIZATION, format!("Bearer {token}"));
        if let Some(body) = body {
            req = req.json(body);
        }

        let resp = req.send().await.map_err(transport)?;
        let status = resp.status();
        if !status.is_success() {
            let txt = resp.text().await.unwrap_or_default();
            return Err(remote_error(status.as_u16(), &txt));
        }
        if status == StatusCode::NO_CONTENT {
            return Ok(None);
        }

        let bytes = resp.bytes().await.map_err(transport)?;
        if bytes.iter().all(u8::is_ascii_whitespace) {
            return Ok(None);
        }
        Ok(Some(bytes.to_vec()))
    }

    async fn list<T: DeserializeOwned>(&self, path: &str) -> Result<Vec<T>, StoreError> {
        let bytes = self
            .send(Method::GET, path, None)
            .await?
            .ok_or_else(|| StoreError::Decode(format!("{path}: empty body")))?;
        serde_json::from_slice(&bytes).map_err(|e| StoreError::Decode(format!("{path}: {e}")))
    }
}

#[async_trait]
impl TaskStore for TodoistClient {
    async fn fetch_tasks(&self) -> Result<Vec<Task>, StoreError> {
        self.list("/tasks").await
    }

    async fn fetch_projects(&self) -> Result<Vec<Project>, StoreError> {
        self.list("/projects").await
    }

    async fn update_task(
        &self,
        id: &TaskId,
        patch: &TaskPatch,
    ) -> Result<Option<Task>, StoreError> {
        let path = format!("/tasks/{id}");
        let Some(bytes) = self.send(Method::POST, &path, Some(patch)).await? else {
            return Ok(None);
        };
        // The update already happened; an unexpected body must not turn it into a failure.
        match serde_json::from_slice(&bytes) {
            Ok(task) => Ok(Some(task)),
            Err(e) => {
                tracing::warn!(%path, error = %e, "update succeeded with an unreadable body");
                Ok(None)
            }
        }
    }

    fn update_mode(&self) -> UpdateMode {
        self.mode
    }
}

fn transport(e: reqwest::Error) -> StoreError {
    StoreError::Transport(e.to_string())
}

/// Map a non-success response to `StoreError::Remote`, keeping the JSON `message` if any.
pub fn remote_error(status: u16, body: &str) -> StoreError {
    #[derive(Deserialize)]
    struct ErrorBody {
        message: Option<String>,
    }

    let message = serde_json::from_str::<ErrorBody>(body)
        .ok()
        .and_then(|b| b.message)
        .filter(|m| !m.trim().is_empty());
    StoreError::Remote { status, message }
}
