//! Task and project snapshots as returned by the remote task store.
//!
//! Identifiers are opaque tokens. Depending on the API version they arrive as
//! JSON strings or JSON integers; both are normalized to text and never used
//! for arithmetic.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fmt;

#[derive(Deserialize)]
#[serde(untagged)]
enum RawId {
    Text(String),
    Number(u64),
}

impl From<RawId> for String {
    fn from(raw: RawId) -> Self {
        match raw {
            RawId::Text(s) => s,
            RawId::Number(n) => n.to_string(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(from = "RawId")]
pub struct TaskId(String);

impl TaskId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl From<RawId> for TaskId {
    fn from(raw: RawId) -> Self {
        Self(raw.into())
    }
}

impl fmt::Display for TaskId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.pad(&self.0)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(from = "RawId")]
pub struct ProjectId(String);

impl ProjectId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl From<RawId> for ProjectId {
    fn from(raw: RawId) -> Self {
        Self(raw.into())
    }
}

impl fmt::Display for ProjectId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.pad(&self.0)
    }
}

/// Due information. `date` is always present; `datetime` only for timed tasks.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Due {
    pub date: String,
    #[serde(default)]
    pub datetime: Option<String>,
    #[serde(default)]
    pub string: Option<String>,
    #[serde(default)]
    pub is_recurring: bool,
    #[serde(default)]
    pub timezone: Option<String>,
}

impl Due {
    pub fn on(date: NaiveDate) -> Self {
        Self {
            date: date.format("%Y-%m-%d").to_string(),
            datetime: None,
            string: None,
            is_recurring: false,
            timezone: None,
        }
    }

    /// Calendar date of the all-day `date` field.
    pub fn calendar_date(&self) -> Option<NaiveDate> {
        date_component(&self.date)
    }

    /// True if either the all-day date or the date part of the timestamp is `day`.
    ///
    /// No timezone conversion happens: a timestamp is compared by its leading
    /// `YYYY-MM-DD`, exactly as the store reports it.
    pub fn falls_on(&self, day: NaiveDate) -> bool {
        if self.calendar_date() == Some(day) {
            return true;
        }
        self.datetime
            .as_deref()
            .and_then(date_component)
            .is_some_and(|d| d == day)
    }
}

fn date_component(s: &str) -> Option<NaiveDate> {
    let head = s.get(..10)?;
    NaiveDate::parse_from_str(head, "%Y-%m-%d").ok()
}

fn default_priority() -> u8 {
    1
}

/// Core task record.
///
/// `description`, `priority` and `labels` are passthrough fields: nothing in
/// the move path reads them, they are only kept so a snapshot round-trips.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Task {
    pub id: TaskId,
    pub content: String,
    pub project_id: ProjectId,
    #[serde(default)]
    pub parent_id: Option<TaskId>,
    #[serde(default)]
    pub due: Option<Due>,

    #[serde(default)]
    pub description: String,
    #[serde(default = "default_priority")]
    pub priority: u8,
    #[serde(default)]
    pub labels: Vec<String>,
}

impl Task {
    pub fn new(
        id: impl Into<String>,
        content: impl Into<String>,
        project_id: impl Into<String>,
    ) -> Self {
        Self {
            id: TaskId::new(id),
            content: content.into(),
            project_id: ProjectId::new(project_id),
            parent_id: None,
            due: None,
            description: String::new(),
            priority: default_priority(),
            labels: Vec::new(),
        }
    }

    pub fn with_parent(mut self, parent_id: impl Into<String>) -> Self {
        self.parent_id = Some(TaskId::new(parent_id));
        self
    }

    pub fn with_due(mut self, due: Due) -> Self {
        self.due = Some(due);
        self
    }

    pub fn with_due_date(self, date: NaiveDate) -> Self {
        self.with_due(Due::on(date))
    }

    pub fn is_top_level(&self) -> bool {
        self.parent_id.is_none()
    }

    pub fn is_due_on(&self, day: NaiveDate) -> bool {
        self.due.as_ref().is_some_and(|d| d.falls_on(day))
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Project {
    pub id: ProjectId,
    pub name: String,
}

impl Project {
    pub fn new(id: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            id: ProjectId::new(id),
            name: name.into(),
        }
    }
}

/// Projects of one fetched snapshot, keyed by id.
#[derive(Debug, Clone, Default)]
pub struct ProjectSet {
    by_id: HashMap<ProjectId, Project>,
}

impl ProjectSet {
    pub fn new(projects: Vec<Project>) -> Self {
        let by_id = projects.into_iter().map(|p| (p.id.clone(), p)).collect();
        Self { by_id }
    }

    pub fn len(&self) -> usize {
        self.by_id.len()
    }

    pub fn is_empty(&self) -> bool {
        self.by_id.is_empty()
    }

    pub fn contains(&self, id: &ProjectId) -> bool {
        self.by_id.contains_key(id)
    }

    pub fn get(&self, id: &ProjectId) -> Option<&Project> {
        self.by_id.get(id)
    }
}
