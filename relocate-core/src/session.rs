//! Session — the caller-owned context for one user's load → plan → execute cycle.
//!
//! The session owns the store handle and the latest snapshot. After any move
//! is executed (success or failure) the snapshot is stale and every further
//! plan or move is refused until `reload` succeeds, so a second move never
//! runs against pre-move data. `move_task` takes `&mut self`, which rules out
//! two moves in flight on the same session.

use chrono::NaiveDate;

use crate::executor::{ExecutionResult, execute};
use crate::graph::{GraphError, TaskGraph};
use crate::planner::{MoveIntent, PlanError, plan_move};
use crate::store::{StoreError, TaskStore};
use crate::task::{Project, ProjectId, ProjectSet, Task, TaskId};
use crate::today::{destination_candidates, today_set};

#[derive(Debug, thiserror::Error)]
pub enum SessionError {
    #[error("no snapshot loaded; refresh first")]
    NotLoaded,

    #[error("snapshot is stale after a move; refresh before moving again")]
    StaleSnapshot,

    #[error("task {0} is not in today's list; refresh and try again")]
    InvalidSource(TaskId),

    #[error("task {0} is not a top-level destination; refresh and try again")]
    InvalidDestination(TaskId),

    #[error(transparent)]
    Store(#[from] StoreError),

    #[error(transparent)]
    Graph(#[from] GraphError),

    #[error(transparent)]
    Plan(#[from] PlanError),
}

/// One consistent view of the remote store, plus the candidate lists derived from it.
#[derive(Debug, Clone)]
pub struct Snapshot {
    graph: TaskGraph,
    projects: ProjectSet,
    today: NaiveDate,
    today_ids: Vec<TaskId>,
    destination_ids: Vec<TaskId>,
}

impl Snapshot {
    pub fn build(
        tasks: Vec<Task>,
        projects: Vec<Project>,
        today: NaiveDate,
    ) -> Result<Self, GraphError> {
        let graph = TaskGraph::new(tasks);
        let today_ids = today_set(&graph, today)?
            .into_iter()
            .map(|t| t.id.clone())
            .collect();
        let destination_ids = destination_candidates(&graph)
            .into_iter()
            .map(|t| t.id.clone())
            .collect();

        Ok(Self {
            graph,
            projects: ProjectSet::new(projects),
            today,
            today_ids,
            destination_ids,
        })
    }

    pub fn graph(&self) -> &TaskGraph {
        &self.graph
    }

    pub fn projects(&self) -> &ProjectSet {
        &self.projects
    }

    pub fn today(&self) -> NaiveDate {
        self.today
    }

    pub fn today_tasks(&self) -> Vec<&Task> {
        self.resolve_all(&self.today_ids)
    }

    pub fn destinations(&self) -> Vec<&Task> {
        self.resolve_all(&self.destination_ids)
    }

    /// Display name of a project; tasks in unknown projects show as the inbox.
    pub fn project_name(&self, id: &ProjectId) -> &str {
        self.projects.get(id).map(|p| p.name.as_str()).unwrap_or("Inbox")
    }

    /// Plan moving a today task under a top-level destination.
    pub fn plan(
        &self,
        source_id: &TaskId,
        destination_id: &TaskId,
    ) -> Result<Vec<MoveIntent>, SessionError> {
        let source = self
            .today_ids
            .contains(source_id)
            .then(|| self.graph.get(source_id))
            .flatten()
            .ok_or_else(|| SessionError::InvalidSource(source_id.clone()))?;
        let destination = self
            .destination_ids
            .contains(destination_id)
            .then(|| self.graph.get(destination_id))
            .flatten()
            .ok_or_else(|| SessionError::InvalidDestination(destination_id.clone()))?;

        Ok(plan_move(source, destination, &self.graph, &self.projects)?)
    }

    fn resolve_all(&self, ids: &[TaskId]) -> Vec<&Task> {
        ids.iter().filter_map(|id| self.graph.get(id)).collect()
    }
}

pub struct Session<S> {
    store: S,
    snapshot: Option<Snapshot>,
    stale: bool,
}

impl<S: TaskStore> Session<S> {
    pub fn new(store: S) -> Self {
        Self {
            store,
            snapshot: None,
            stale: false,
        }
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    pub fn is_stale(&self) -> bool {
        self.stale
    }

    /// The last loaded snapshot, if it is still current.
    pub fn snapshot(&self) -> Result<&Snapshot, SessionError> {
        if self.stale {
            return Err(SessionError::StaleSnapshot);
        }
        self.snapshot.as_ref().ok_or(SessionError::NotLoaded)
    }

    /// Fetch tasks and projects concurrently and replace the snapshot.
    ///
    /// On failure the session keeps its previous state.
    pub async fn reload(&mut self, today: NaiveDate) -> Result<&Snapshot, SessionError> {
        let (tasks, projects) =
            tokio::try_join!(self.store.fetch_tasks(), self.store.fetch_projects())?;
        tracing::debug!(
            tasks = tasks.len(),
            projects = projects.len(),
            %today,
            "loaded snapshot"
        );

        let snapshot = Snapshot::build(tasks, projects, today)?;
        self.stale = false;
        let snapshot: &Snapshot = self.snapshot.insert(snapshot);
        Ok(snapshot)
    }

    pub fn plan(
        &self,
        source_id: &TaskId,
        destination_id: &TaskId,
    ) -> Result<Vec<MoveIntent>, SessionError> {
        self.snapshot()?.plan(source_id, destination_id)
    }

    /// Plan and execute a move. Planning errors leave the session untouched;
    /// once execution starts the snapshot is stale whatever the outcome.
    pub async fn move_task(
        &mut self,
        source_id: &TaskId,
        destination_id: &TaskId,
    ) -> Result<ExecutionResult, SessionError> {
        let intents = self.plan(source_id, destination_id)?;
        self.stale = true;
        Ok(execute(&intents, &self.store).await)
    }
}
