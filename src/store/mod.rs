//! Storage seams of the dependency engine.
//!
//! The engine depends on these traits only, so the backend (SQLite via
//! [`crate::db::Database`], or [`memory::MemoryStore`] for tests and
//! embedding) can vary without touching graph logic. Every method may
//! suspend.

pub mod memory;

use async_trait::async_trait;

use crate::error::GraphResult;
use crate::types::{
    Dependency, DependencyId, DependencyPatch, NewDependency, TaskFilter, TaskId, TaskSummary,
};

pub use memory::MemoryStore;

/// Durable CRUD for dependency edges.
#[async_trait]
pub trait DependencyStore: Send + Sync {
    /// Insert an edge. Fails with `SelfLoop`, `DuplicateEdge`, or
    /// `TaskNotFound` when an endpoint is unknown to the backend.
    async fn create(&self, new: &NewDependency) -> GraphResult<Dependency>;

    async fn get(&self, id: DependencyId) -> GraphResult<Option<Dependency>>;

    /// Look up the edge for an ordered pair.
    async fn find_pair(
        &self,
        predecessor_id: TaskId,
        successor_id: TaskId,
    ) -> GraphResult<Option<Dependency>>;

    /// Every edge where the task is either endpoint, newest first.
    async fn get_by_task(&self, task_id: TaskId) -> GraphResult<Vec<Dependency>>;

    /// Every edge touching any of the tasks, newest first.
    async fn get_by_tasks(&self, task_ids: &[TaskId]) -> GraphResult<Vec<Dependency>>;

    /// Direct successors of a task.
    async fn successors(&self, task_id: TaskId) -> GraphResult<Vec<TaskId>>;

    async fn list_all(&self) -> GraphResult<Vec<Dependency>>;

    /// Apply a patch. Returns false if the edge does not exist.
    async fn update(&self, id: DependencyId, patch: &DependencyPatch) -> GraphResult<bool>;

    /// Returns false if the edge does not exist.
    async fn delete(&self, id: DependencyId) -> GraphResult<bool>;

    /// Remove every edge touching the task; returns how many went away.
    async fn delete_all_for_task(&self, task_id: TaskId) -> GraphResult<u64>;
}

/// Read side of the external task store, plus its delete entry point.
#[async_trait]
pub trait TaskStore: Send + Sync {
    async fn get_task(&self, id: TaskId) -> GraphResult<Option<TaskSummary>>;

    /// Batch lookup; unknown ids are skipped.
    async fn get_tasks(&self, ids: &[TaskId]) -> GraphResult<Vec<TaskSummary>>;

    async fn task_ids_in_project(&self, project_id: i64) -> GraphResult<Vec<TaskId>>;

    async fn list_tasks(&self, filter: &TaskFilter) -> GraphResult<Vec<TaskSummary>>;

    /// Delete the task record. Callers run the dependency deletion hook first.
    async fn delete_task(&self, id: TaskId) -> GraphResult<bool>;
}

/// Newest first; ids break timestamp ties.
pub(crate) fn sort_newest_first(deps: &mut [Dependency]) {
    deps.sort_by(|a, b| {
        b.created_at
            .cmp(&a.created_at)
            .then_with(|| b.id.cmp(&a.id))
    });
}
