//! The dependency graph engine.
//!
//! [`DependencyGraph`] ties the cycle guard, the query service and the
//! schedule assembler to an injected [`DependencyStore`] and [`TaskStore`].
//! Mutations live here; read projections are in [`query`] and [`schedule`].

pub mod cycle;
pub mod query;
pub mod schedule;

use std::sync::Arc;

use serde::Serialize;
use tokio::sync::Mutex;
use tracing::{info, warn};

use crate::config::DependenciesConfig;
use crate::error::{GraphError, GraphResult};
use crate::store::{DependencyStore, TaskStore};
use crate::types::{Dependency, DependencyId, DependencyPatch, NewDependency, TaskId};

pub use schedule::ExternalEdgePolicy;

/// Result of scanning the stored edge set.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct AuditReport {
    pub edge_count: usize,
    /// One cycle, first and last task equal. `None` when the graph is acyclic.
    pub cycle: Option<Vec<TaskId>>,
}

/// Dependency graph service.
pub struct DependencyGraph {
    deps: Arc<dyn DependencyStore>,
    tasks: Arc<dyn TaskStore>,
    config: DependenciesConfig,
    external_edges: ExternalEdgePolicy,
    /// Held across check-then-insert so concurrent creates cannot jointly
    /// close a cycle or attach to a task being deleted.
    create_lock: Mutex<()>,
}

impl DependencyGraph {
    pub fn new(deps: Arc<dyn DependencyStore>, tasks: Arc<dyn TaskStore>) -> Self {
        Self {
            deps,
            tasks,
            config: DependenciesConfig::default(),
            external_edges: ExternalEdgePolicy::default(),
            create_lock: Mutex::new(()),
        }
    }

    pub fn with_config(mut self, config: DependenciesConfig) -> Self {
        self.config = config;
        self
    }

    pub fn with_external_edges(mut self, policy: ExternalEdgePolicy) -> Self {
        self.external_edges = policy;
        self
    }

    pub fn config(&self) -> &DependenciesConfig {
        &self.config
    }

    pub fn external_edges(&self) -> ExternalEdgePolicy {
        self.external_edges
    }

    pub fn tasks(&self) -> &dyn TaskStore {
        self.tasks.as_ref()
    }

    pub fn store(&self) -> &dyn DependencyStore {
        self.deps.as_ref()
    }

    /// Create an edge after the self-loop, duplicate and cycle checks.
    ///
    /// The endpoint, duplicate and cycle checks and the insert run under one
    /// lock, shared with [`delete_task`](Self::delete_task); a rejected create
    /// leaves the edge set unchanged.
    pub async fn create_dependency(&self, new: NewDependency) -> GraphResult<Dependency> {
        if new.predecessor_id == new.successor_id {
            warn!(task_id = new.predecessor_id, "rejected self-loop dependency");
            return Err(GraphError::self_loop(new.predecessor_id));
        }
        self.config.check_lag(new.lag)?;

        let _guard = self.create_lock.lock().await;

        for task_id in [new.predecessor_id, new.successor_id] {
            if self.tasks.get_task(task_id).await?.is_none() {
                return Err(GraphError::task_not_found(task_id));
            }
        }

        if self
            .deps
            .find_pair(new.predecessor_id, new.successor_id)
            .await?
            .is_some()
        {
            warn!(
                predecessor_id = new.predecessor_id,
                successor_id = new.successor_id,
                "rejected duplicate dependency"
            );
            return Err(GraphError::duplicate_edge(
                new.predecessor_id,
                new.successor_id,
            ));
        }

        if cycle::would_create_cycle(self.deps.as_ref(), new.predecessor_id, new.successor_id)
            .await?
        {
            warn!(
                predecessor_id = new.predecessor_id,
                successor_id = new.successor_id,
                "rejected circular dependency"
            );
            return Err(GraphError::circular_dependency(
                new.predecessor_id,
                new.successor_id,
            ));
        }

        let dep = self.deps.create(&new).await?;
        info!(
            id = dep.id,
            predecessor_id = dep.predecessor_id,
            successor_id = dep.successor_id,
            dep_type = %dep.dep_type,
            lag = dep.lag,
            "dependency created"
        );
        Ok(dep)
    }

    /// Change type and/or lag of an edge and return the stored result.
    pub async fn update_dependency(
        &self,
        id: DependencyId,
        patch: DependencyPatch,
    ) -> GraphResult<Dependency> {
        if let Some(lag) = patch.lag {
            self.config.check_lag(lag)?;
        }

        if !patch.is_empty() && !self.deps.update(id, &patch).await? {
            return Err(GraphError::dependency_not_found(id));
        }

        let dep = self
            .deps
            .get(id)
            .await?
            .ok_or_else(|| GraphError::dependency_not_found(id))?;
        info!(id, dep_type = %dep.dep_type, lag = dep.lag, "dependency updated");
        Ok(dep)
    }

    pub async fn delete_dependency(&self, id: DependencyId) -> GraphResult<()> {
        if !self.deps.delete(id).await? {
            return Err(GraphError::dependency_not_found(id));
        }
        info!(id, "dependency deleted");
        Ok(())
    }

    /// Task deletion hook: drop every edge touching the task.
    pub async fn delete_all_for_task(&self, task_id: TaskId) -> GraphResult<u64> {
        let removed = self.deps.delete_all_for_task(task_id).await?;
        info!(task_id, removed, "dependencies removed for task");
        Ok(removed)
    }

    /// Delete a task through the task store, running the hook first.
    ///
    /// Holds the create lock so no edge to the task can land in between.
    pub async fn delete_task(&self, task_id: TaskId) -> GraphResult<u64> {
        let _guard = self.create_lock.lock().await;
        if self.tasks.get_task(task_id).await?.is_none() {
            return Err(GraphError::task_not_found(task_id));
        }
        let removed = self.delete_all_for_task(task_id).await?;
        if !self.tasks.delete_task(task_id).await? {
            return Err(GraphError::task_not_found(task_id));
        }
        info!(task_id, removed, "task deleted");
        Ok(removed)
    }

    /// Scan every stored edge for a cycle.
    pub async fn audit(&self) -> GraphResult<AuditReport> {
        let edges = self.deps.list_all().await?;
        let cycle = cycle::find_cycle(&edges);
        if let Some(ref path) = cycle {
            warn!(?path, "stored dependency graph contains a cycle");
        }
        Ok(AuditReport {
            edge_count: edges.len(),
            cycle,
        })
    }
}
