//! Gantt schedule assembly.
//!
//! Given the visible task set, collect every edge touching at least one of
//! those tasks exactly once, decorate it, and apply the external edge policy.

use std::collections::{BTreeSet, HashSet};

use serde::{Deserialize, Serialize};
use tracing::debug;

use super::DependencyGraph;
use super::query::decorate;
use crate::error::GraphResult;
use crate::types::{
    DecoratedDependency, EndpointSnapshot, GanttPayload, TaskFilter, TaskId, TaskSummary,
};

/// What to do with an edge whose other endpoint is not in the visible task
/// set (filtered out, or in another project).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ExternalEdgePolicy {
    /// Keep the edge but blank the hidden endpoint's snapshot. Edges with
    /// no visible endpoint at all are dropped.
    #[default]
    Redact,
    /// Keep the edge with both snapshots.
    Include,
    /// Drop edges that leave the visible set.
    Omit,
}

impl ExternalEdgePolicy {
    pub fn as_str(&self) -> &'static str {
        match self {
            ExternalEdgePolicy::Redact => "redact",
            ExternalEdgePolicy::Include => "include",
            ExternalEdgePolicy::Omit => "omit",
        }
    }

    fn apply(
        self,
        visible: &HashSet<TaskId>,
        edges: Vec<DecoratedDependency>,
    ) -> Vec<DecoratedDependency> {
        match self {
            ExternalEdgePolicy::Include => edges,
            ExternalEdgePolicy::Omit => edges
                .into_iter()
                .filter(|e| {
                    visible.contains(&e.dependency.predecessor_id)
                        && visible.contains(&e.dependency.successor_id)
                })
                .collect(),
            ExternalEdgePolicy::Redact => edges
                .into_iter()
                .filter_map(|mut e| {
                    let pred_visible = visible.contains(&e.dependency.predecessor_id);
                    let succ_visible = visible.contains(&e.dependency.successor_id);
                    if !pred_visible && !succ_visible {
                        return None;
                    }
                    if !pred_visible {
                        e.predecessor = EndpointSnapshot::default();
                    }
                    if !succ_visible {
                        e.successor = EndpointSnapshot::default();
                    }
                    Some(e)
                })
                .collect(),
        }
    }
}

impl std::fmt::Display for ExternalEdgePolicy {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl DependencyGraph {
    /// Build the Gantt payload for an already selected task list.
    ///
    /// With `project_id` the project's edge set is used. Otherwise edges are
    /// fetched per task and merged by id, keeping first-seen order, so an
    /// edge between two visible tasks shows up once.
    pub async fn assemble_schedule(
        &self,
        tasks: Vec<TaskSummary>,
        project_id: Option<i64>,
    ) -> GraphResult<GanttPayload> {
        let visible: HashSet<TaskId> = tasks.iter().map(|t| t.id).collect();

        let edges = match project_id {
            Some(project_id) => {
                let ids = self.tasks().task_ids_in_project(project_id).await?;
                self.store().get_by_tasks(&ids).await?
            }
            None => {
                let ids: BTreeSet<TaskId> = visible.iter().copied().collect();
                let mut seen = HashSet::new();
                let mut merged = Vec::new();
                for task_id in ids {
                    for edge in self.store().get_by_task(task_id).await? {
                        if seen.insert(edge.id) {
                            merged.push(edge);
                        }
                    }
                }
                merged
            }
        };

        let fetched = edges.len();
        let dependencies = self
            .external_edges()
            .apply(&visible, decorate(self.tasks(), edges).await?);

        debug!(
            tasks = tasks.len(),
            fetched,
            kept = dependencies.len(),
            policy = %self.external_edges(),
            "assembled gantt schedule"
        );

        Ok(GanttPayload {
            tasks,
            dependencies,
        })
    }

    /// Select tasks through the task store and assemble their schedule.
    pub async fn gantt_data(&self, filter: &TaskFilter) -> GraphResult<GanttPayload> {
        let tasks = self.tasks().list_tasks(filter).await?;
        self.assemble_schedule(tasks, filter.project_id).await
    }
}
