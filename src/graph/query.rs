//! Read projections: edges touching a task or a project, decorated with the
//! endpoint tasks' current schedule fields.

use std::collections::HashMap;

use tracing::debug;

use super::DependencyGraph;
use crate::error::{GraphError, GraphResult};
use crate::store::TaskStore;
use crate::types::{
    DecoratedDependency, Dependency, DependencyId, EndpointSnapshot, TaskId, TaskSummary,
};

/// Attach endpoint snapshots to raw edges.
///
/// Task records are fetched in one batch at call time. An endpoint missing
/// from the task store gets a blank snapshot.
pub async fn decorate(
    tasks: &dyn TaskStore,
    edges: Vec<Dependency>,
) -> GraphResult<Vec<DecoratedDependency>> {
    if edges.is_empty() {
        return Ok(Vec::new());
    }

    let mut ids: Vec<TaskId> = edges
        .iter()
        .flat_map(|e| [e.predecessor_id, e.successor_id])
        .collect();
    ids.sort_unstable();
    ids.dedup();

    let index: HashMap<TaskId, TaskSummary> = tasks
        .get_tasks(&ids)
        .await?
        .into_iter()
        .map(|t| (t.id, t))
        .collect();

    let snapshot = |id: TaskId| {
        index
            .get(&id)
            .map(EndpointSnapshot::of)
            .unwrap_or_default()
    };

    Ok(edges
        .into_iter()
        .map(|dependency| DecoratedDependency {
            predecessor: snapshot(dependency.predecessor_id),
            successor: snapshot(dependency.successor_id),
            dependency,
        })
        .collect())
}

impl DependencyGraph {
    /// Every edge where the task is predecessor or successor, newest first.
    pub async fn dependencies_for_task(
        &self,
        task_id: TaskId,
    ) -> GraphResult<Vec<DecoratedDependency>> {
        let edges = self.store().get_by_task(task_id).await?;
        debug!(task_id, count = edges.len(), "loaded dependencies for task");
        decorate(self.tasks(), edges).await
    }

    /// Every edge with at least one endpoint in the project, newest first.
    pub async fn dependencies_for_project(
        &self,
        project_id: i64,
    ) -> GraphResult<Vec<DecoratedDependency>> {
        let task_ids = self.tasks().task_ids_in_project(project_id).await?;
        let edges = self.store().get_by_tasks(&task_ids).await?;
        debug!(
            project_id,
            tasks = task_ids.len(),
            count = edges.len(),
            "loaded dependencies for project"
        );
        decorate(self.tasks(), edges).await
    }

    /// A single decorated edge.
    pub async fn get_dependency(&self, id: DependencyId) -> GraphResult<DecoratedDependency> {
        let edge = self
            .store()
            .get(id)
            .await?
            .ok_or_else(|| GraphError::dependency_not_found(id))?;
        let mut decorated = decorate(self.tasks(), vec![edge]).await?;
        decorated
            .pop()
            .ok_or_else(|| GraphError::internal("decoration dropped an edge"))
    }
}
