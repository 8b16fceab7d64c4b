use async_trait::async_trait;
use chrono::NaiveDate;
use pretty_assertions::assert_eq;
use relocate_core::{
    ExecutionResult, MoveIntent, Project, ProjectId, Session, SessionError, StoreError, Task,
    TaskId, TaskPatch, TaskStore, UpdateMode, execute,
};
use std::collections::BTreeMap;
use std::sync::Mutex;

/// In-memory store that applies patches and can fail a chosen update call.
struct MemoryStore {
    tasks: Mutex<BTreeMap<TaskId, Task>>,
    projects: Vec<Project>,
    calls: Mutex<Vec<(TaskId, TaskPatch)>>,
    fetches: Mutex<usize>,
    /// 1-based index of the update call that fails with a 500.
    fail_on_call: Option<usize>,
    mode: UpdateMode,
}

impl MemoryStore {
    fn new(tasks: Vec<Task>) -> Self {
        Self {
            tasks: Mutex::new(tasks.into_iter().map(|t| (t.id.clone(), t)).collect()),
            projects: vec![Project::new("1", "Personal"), Project::new("2", "Work")],
            calls: Mutex::new(Vec::new()),
            fetches: Mutex::new(0),
            fail_on_call: None,
            mode: UpdateMode::Sequential,
        }
    }

    fn failing_on(mut self, call: usize) -> Self {
        self.fail_on_call = Some(call);
        self
    }

    fn combined(mut self) -> Self {
        self.mode = UpdateMode::Combined;
        self
    }

    fn task(&self, id: &str) -> Task {
        self.tasks.lock().unwrap()[&TaskId::new(id)].clone()
    }

    fn calls(&self) -> Vec<(TaskId, TaskPatch)> {
        self.calls.lock().unwrap().clone()
    }

    fn fetch_count(&self) -> usize {
        *self.fetches.lock().unwrap()
    }
}

#[async_trait]
impl TaskStore for MemoryStore {
    async fn fetch_tasks(&self) -> Result<Vec<Task>, StoreError> {
        *self.fetches.lock().unwrap() += 1;
        Ok(self.tasks.lock().unwrap().values().cloned().collect())
    }

    async fn fetch_projects(&self) -> Result<Vec<Project>, StoreError> {
        Ok(self.projects.clone())
    }

    async fn update_task(
        &self,
        id: &TaskId,
        patch: &TaskPatch,
    ) -> Result<Option<Task>, StoreError> {
        let mut calls = self.calls.lock().unwrap();
        calls.push((id.clone(), patch.clone()));
        if self.fail_on_call == Some(calls.len()) {
            return Err(StoreError::Remote {
                status: 500,
                message: Some("boom".into()),
            });
        }

        let mut tasks = self.tasks.lock().unwrap();
        let task = tasks.get_mut(id).ok_or(StoreError::Remote {
            status: 404,
            message: Some("Task not found".into()),
        })?;
        if let Some(project_id) = &patch.project_id {
            task.project_id = project_id.clone();
        }
        if let Some(parent_id) = &patch.parent_id {
            task.parent_id = Some(parent_id.clone());
        }
        Ok(None)
    }

    fn update_mode(&self) -> UpdateMode {
        self.mode
    }
}

fn today() -> NaiveDate {
    NaiveDate::from_ymd_opt(2026, 3, 10).unwrap()
}

fn id(s: &str) -> TaskId {
    TaskId::new(s)
}

fn intent(task: &str, project: Option<&str>, parent: &str) -> MoveIntent {
    MoveIntent {
        task_id: id(task),
        target_project_id: project.map(ProjectId::new),
        target_parent_id: id(parent),
    }
}

fn scenario() -> Vec<Task> {
    vec![
        Task::new("A", "Plan trip", "1").with_due_date(today()),
        Task::new("B", "Book flights", "1").with_parent("A"),
        Task::new("Z", "Travel", "2"),
    ]
}

#[tokio::test]
async fn end_to_end_move_relocates_and_reparents() {
    let mut session = Session::new(MemoryStore::new(scenario()));
    session.reload(today()).await.unwrap();

    let result = session.move_task(&id("A"), &id("Z")).await.unwrap();
    assert_eq!(
        result,
        ExecutionResult::Succeeded {
            applied: vec![intent("A", Some("2"), "Z"), intent("B", Some("2"), "A")],
        }
    );

    let store = session.store();
    let a = store.task("A");
    let b = store.task("B");
    assert_eq!(a.project_id, ProjectId::new("2"));
    assert_eq!(a.parent_id, Some(id("Z")));
    assert_eq!(b.project_id, ProjectId::new("2"));
    assert_eq!(b.parent_id, Some(id("A")));
}

#[tokio::test]
async fn sequential_mode_relocates_before_reparenting() {
    let store = MemoryStore::new(scenario());
    let intents = vec![intent("A", Some("2"), "Z")];
    execute(&intents, &store).await;
    assert_eq!(
        store.calls(),
        vec![
            (id("A"), TaskPatch::relocate(ProjectId::new("2"))),
            (id("A"), TaskPatch::reparent(id("Z"))),
        ]
    );
}

#[tokio::test]
async fn combined_mode_sends_one_call_per_intent() {
    let store = MemoryStore::new(scenario()).combined();
    let intents = vec![intent("A", Some("2"), "Z"), intent("B", None, "A")];
    let res = execute(&intents, &store).await;
    assert!(res.is_success());
    assert_eq!(store.calls().len(), 2);
}

#[tokio::test]
async fn failure_on_second_intent_stops_before_third() {
    let store = MemoryStore::new(vec![
        Task::new("S", "source", "2"),
        Task::new("C1", "one", "2").with_parent("S"),
        Task::new("C2", "two", "2").with_parent("S"),
        Task::new("Z", "dest", "2"),
    ])
    .failing_on(2);
    let intents = vec![
        intent("S", None, "Z"),
        intent("C1", None, "S"),
        intent("C2", None, "S"),
    ];

    let res = execute(&intents, &store).await;
    match res {
        ExecutionResult::Failed {
            completed,
            failing,
            error,
        } => {
            assert_eq!(completed, vec![intent("S", None, "Z")]);
            assert_eq!(failing, intent("C1", None, "S"));
            assert_eq!(error.to_string(), "remote error 500: boom");
        }
        other => panic!("expected failure, got {other:?}"),
    }
    assert_eq!(store.calls().len(), 2);
    assert!(store.calls().iter().all(|(t, _)| t != &id("C2")));
}

#[tokio::test]
async fn failed_relocation_half_does_not_count_as_completed() {
    let store = MemoryStore::new(scenario()).failing_on(2);
    let intents = vec![intent("A", Some("2"), "Z")];
    let res = execute(&intents, &store).await;
    assert!(res.completed().is_empty());
    assert_eq!(store.task("A").project_id, ProjectId::new("2"));
    assert_eq!(store.task("A").parent_id, None);
}

#[tokio::test]
async fn second_move_requires_reload() {
    let mut session = Session::new(MemoryStore::new(scenario()));
    session.reload(today()).await.unwrap();
    session.move_task(&id("A"), &id("Z")).await.unwrap();

    let err = session.move_task(&id("A"), &id("Z")).await.unwrap_err();
    assert!(matches!(err, SessionError::StaleSnapshot));

    session.reload(today()).await.unwrap();
    assert!(!session.is_stale());
    assert_eq!(session.store().fetch_count(), 2);
}

#[tokio::test]
async fn failed_execution_also_marks_snapshot_stale() {
    let mut session = Session::new(MemoryStore::new(scenario()).failing_on(1));
    session.reload(today()).await.unwrap();
    let res = session.move_task(&id("A"), &id("Z")).await.unwrap();
    assert!(!res.is_success());
    assert!(session.is_stale());
}

#[tokio::test]
async fn planning_errors_never_reach_the_store() {
    let mut session = Session::new(MemoryStore::new(scenario()));
    session.reload(today()).await.unwrap();

    // Z is not due today, so it cannot be a source.
    let err = session.move_task(&id("Z"), &id("A")).await.unwrap_err();
    assert!(matches!(err, SessionError::InvalidSource(_)));

    // B is a subtask, so it cannot be a destination.
    let err = session.move_task(&id("A"), &id("B")).await.unwrap_err();
    assert!(matches!(err, SessionError::InvalidDestination(_)));

    // Unknown ids are rejected the same way.
    let err = session.move_task(&id("nope"), &id("Z")).await.unwrap_err();
    assert!(matches!(err, SessionError::InvalidSource(ref t) if t == &id("nope")));
    let err = session.move_task(&id("A"), &id("nope")).await.unwrap_err();
    assert!(matches!(err, SessionError::InvalidDestination(ref t) if t == &id("nope")));

    assert!(session.store().calls().is_empty());
    assert!(!session.is_stale());
}

#[tokio::test]
async fn repeating_a_completed_move_is_a_remote_no_op() {
    let mut session = Session::new(MemoryStore::new(vec![
        Task::new("Z", "Travel", "2").with_due_date(today()),
        Task::new("A", "Plan trip", "2").with_parent("Z"),
        Task::new("B", "Book flights", "2").with_parent("A"),
        Task::new("Y", "Other", "2"),
    ]));
    let snapshot = session.reload(today()).await.unwrap();
    let before: Vec<Task> = snapshot.graph().tasks().cloned().collect();

    // Z is top-level and A descends from a task due today.
    let intents = session.plan(&id("A"), &id("Z")).unwrap();
    assert!(intents.iter().all(|i| !i.relocates()));

    let res = session.move_task(&id("A"), &id("Z")).await.unwrap();
    assert!(res.is_success());

    let snapshot = session.reload(today()).await.unwrap();
    for task in before {
        assert_eq!(snapshot.graph().get(&task.id), Some(&task));
    }
}

#[tokio::test]
async fn plan_without_snapshot_is_refused() {
    let session = Session::new(MemoryStore::new(scenario()));
    assert!(matches!(
        session.plan(&id("A"), &id("Z")).unwrap_err(),
        SessionError::NotLoaded
    ));
}

fn corrupt_parent_chain(store: &MemoryStore) {
    let mut tasks = store.tasks.lock().unwrap();
    tasks.insert(id("X"), Task::new("X", "loop one", "1").with_parent("W"));
    tasks.insert(id("W"), Task::new("W", "loop two", "1").with_parent("X"));
}

#[tokio::test]
async fn reload_of_cyclic_data_keeps_previous_snapshot() {
    let mut session = Session::new(MemoryStore::new(scenario()));
    session.reload(today()).await.unwrap();

    corrupt_parent_chain(session.store());
    let err = session.reload(today()).await.unwrap_err();
    assert!(matches!(err, SessionError::Graph(_)), "got {err:?}");

    assert!(!session.is_stale());
    let snapshot = session.snapshot().unwrap();
    assert!(snapshot.graph().get(&id("X")).is_none());
    assert_eq!(snapshot.graph().len(), 3);
    assert!(session.plan(&id("A"), &id("Z")).is_ok());
}

#[tokio::test]
async fn reload_of_cyclic_data_after_move_stays_stale() {
    let mut session = Session::new(MemoryStore::new(scenario()));
    session.reload(today()).await.unwrap();
    session.move_task(&id("A"), &id("Z")).await.unwrap();

    corrupt_parent_chain(session.store());
    let err = session.reload(today()).await.unwrap_err();
    assert!(matches!(err, SessionError::Graph(_)), "got {err:?}");

    assert!(session.is_stale());
    assert!(matches!(
        session.snapshot().unwrap_err(),
        SessionError::StaleSnapshot
    ));
    assert_eq!(session.store().calls().len(), 4);
}
