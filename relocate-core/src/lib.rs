//! relocate-core: move a task and its subtree under another task, across projects.

pub mod executor;
pub mod graph;
pub mod planner;
pub mod session;
pub mod store;
pub mod task;
pub mod today;

pub use executor::{ExecutionResult, execute};
pub use graph::{GraphError, TaskGraph};
pub use planner::{MoveIntent, PlanError, plan_move};
pub use session::{Session, SessionError, Snapshot};
pub use store::{StoreError, TaskPatch, TaskStore, UpdateMode};
pub use task::{Due, Project, ProjectId, ProjectSet, Task, TaskId};
pub use today::{destination_candidates, today_set};
