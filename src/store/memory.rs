//! In-memory storage backend.
//!
//! Holds edges and task records in ordered maps behind a tokio mutex. Used by
//! the test suites and by callers that embed the engine without SQLite.

use async_trait::async_trait;
use std::collections::{BTreeMap, HashSet};
use std::sync::Arc;
use tokio::sync::Mutex;

use super::{DependencyStore, TaskStore, sort_newest_first};
use crate::db::now_ms;
use crate::error::{GraphError, GraphResult};
use crate::types::{
    Dependency, DependencyId, DependencyPatch, NewDependency, TaskFilter, TaskId, TaskSummary,
};

#[derive(Default)]
struct Inner {
    edges: BTreeMap<DependencyId, Dependency>,
    tasks: BTreeMap<TaskId, TaskSummary>,
    next_edge_id: DependencyId,
}

/// Thread-safe in-memory dependency and task store.
#[derive(Clone, Default)]
pub struct MemoryStore {
    inner: Arc<Mutex<Inner>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert or replace a task record.
    pub async fn put_task(&self, task: TaskSummary) {
        let mut inner = self.inner.lock().await;
        inner.tasks.insert(task.id, task);
    }

    /// Drop a task record without touching its edges.
    pub async fn forget_task(&self, id: TaskId) -> bool {
        let mut inner = self.inner.lock().await;
        inner.tasks.remove(&id).is_some()
    }

    pub async fn edge_count(&self) -> usize {
        self.inner.lock().await.edges.len()
    }
}

#[async_trait]
impl DependencyStore for MemoryStore {
    async fn create(&self, new: &NewDependency) -> GraphResult<Dependency> {
        if new.predecessor_id == new.successor_id {
            return Err(GraphError::self_loop(new.predecessor_id));
        }

        let mut inner = self.inner.lock().await;
        let exists = inner.edges.values().any(|d| {
            d.predecessor_id == new.predecessor_id && d.successor_id == new.successor_id
        });
        if exists {
            return Err(GraphError::duplicate_edge(
                new.predecessor_id,
                new.successor_id,
            ));
        }
        for task_id in [new.predecessor_id, new.successor_id] {
            if !inner.tasks.contains_key(&task_id) {
                return Err(GraphError::task_not_found(task_id));
            }
        }

        inner.next_edge_id += 1;
        let now = now_ms();
        let dep = Dependency {
            id: inner.next_edge_id,
            predecessor_id: new.predecessor_id,
            successor_id: new.successor_id,
            dep_type: new.dep_type,
            lag: new.lag,
            created_at: now,
            updated_at: now,
        };
        inner.edges.insert(dep.id, dep.clone());
        Ok(dep)
    }

    async fn get(&self, id: DependencyId) -> GraphResult<Option<Dependency>> {
        Ok(self.inner.lock().await.edges.get(&id).cloned())
    }

    async fn find_pair(
        &self,
        predecessor_id: TaskId,
        successor_id: TaskId,
    ) -> GraphResult<Option<Dependency>> {
        let inner = self.inner.lock().await;
        Ok(inner
            .edges
            .values()
            .find(|d| d.predecessor_id == predecessor_id && d.successor_id == successor_id)
            .cloned())
    }

    async fn get_by_task(&self, task_id: TaskId) -> GraphResult<Vec<Dependency>> {
        self.get_by_tasks(&[task_id]).await
    }

    async fn get_by_tasks(&self, task_ids: &[TaskId]) -> GraphResult<Vec<Dependency>> {
        let wanted: HashSet<TaskId> = task_ids.iter().copied().collect();
        let inner = self.inner.lock().await;
        let mut deps: Vec<Dependency> = inner
            .edges
            .values()
            .filter(|d| wanted.contains(&d.predecessor_id) || wanted.contains(&d.successor_id))
            .cloned()
            .collect();
        sort_newest_first(&mut deps);
        Ok(deps)
    }

    async fn successors(&self, task_id: TaskId) -> GraphResult<Vec<TaskId>> {
        let inner = self.inner.lock().await;
        Ok(inner
            .edges
            .values()
            .filter(|d| d.predecessor_id == task_id)
            .map(|d| d.successor_id)
            .collect())
    }

    async fn list_all(&self) -> GraphResult<Vec<Dependency>> {
        Ok(self.inner.lock().await.edges.values().cloned().collect())
    }

    async fn update(&self, id: DependencyId, patch: &DependencyPatch) -> GraphResult<bool> {
        let mut inner = self.inner.lock().await;
        let Some(dep) = inner.edges.get_mut(&id) else {
            return Ok(false);
        };
        if let Some(dep_type) = patch.dep_type {
            dep.dep_type = dep_type;
        }
        if let Some(lag) = patch.lag {
            dep.lag = lag;
        }
        dep.updated_at = now_ms();
        Ok(true)
    }

    async fn delete(&self, id: DependencyId) -> GraphResult<bool> {
        Ok(self.inner.lock().await.edges.remove(&id).is_some())
    }

    async fn delete_all_for_task(&self, task_id: TaskId) -> GraphResult<u64> {
        let mut inner = self.inner.lock().await;
        let before = inner.edges.len();
        inner
            .edges
            .retain(|_, d| d.predecessor_id != task_id && d.successor_id != task_id);
        Ok((before - inner.edges.len()) as u64)
    }
}

#[async_trait]
impl TaskStore for MemoryStore {
    async fn get_task(&self, id: TaskId) -> GraphResult<Option<TaskSummary>> {
        Ok(self.inner.lock().await.tasks.get(&id).cloned())
    }

    async fn get_tasks(&self, ids: &[TaskId]) -> GraphResult<Vec<TaskSummary>> {
        let inner = self.inner.lock().await;
        Ok(ids
            .iter()
            .filter_map(|id| inner.tasks.get(id).cloned())
            .collect())
    }

    async fn task_ids_in_project(&self, project_id: i64) -> GraphResult<Vec<TaskId>> {
        let inner = self.inner.lock().await;
        Ok(inner
            .tasks
            .values()
            .filter(|t| t.project_id == Some(project_id))
            .map(|t| t.id)
            .collect())
    }

    async fn list_tasks(&self, filter: &TaskFilter) -> GraphResult<Vec<TaskSummary>> {
        let inner = self.inner.lock().await;
        Ok(inner
            .tasks
            .values()
            .filter(|t| filter.matches(t))
            .cloned()
            .collect())
    }

    async fn delete_task(&self, id: TaskId) -> GraphResult<bool> {
        let mut inner = self.inner.lock().await;
        if inner.tasks.remove(&id).is_none() {
            return Ok(false);
        }
        inner
            .edges
            .retain(|_, d| d.predecessor_id != id && d.successor_id != id);
        Ok(true)
    }
}
