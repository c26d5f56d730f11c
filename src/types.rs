//! Core types for the task dependency graph.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::error::GraphError;

/// Identifier of a task record owned by the task store.
pub type TaskId = i64;

/// Identifier of a dependency edge.
pub type DependencyId = i64;

/// Which pair of (start, end) timestamps an edge constrains.
///
/// The engine stores and round-trips the type; it never checks task dates
/// against it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DependencyType {
    /// Successor starts after predecessor finishes.
    #[default]
    FinishToStart,
    /// Successor starts after predecessor starts.
    StartToStart,
    /// Successor finishes after predecessor finishes.
    FinishToFinish,
    /// Successor finishes after predecessor starts.
    StartToFinish,
}

impl DependencyType {
    pub const ALL: [DependencyType; 4] = [
        DependencyType::FinishToStart,
        DependencyType::StartToStart,
        DependencyType::FinishToFinish,
        DependencyType::StartToFinish,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            DependencyType::FinishToStart => "finish_to_start",
            DependencyType::StartToStart => "start_to_start",
            DependencyType::FinishToFinish => "finish_to_finish",
            DependencyType::StartToFinish => "start_to_finish",
        }
    }
}

impl fmt::Display for DependencyType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for DependencyType {
    type Err = GraphError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        DependencyType::ALL
            .into_iter()
            .find(|t| t.as_str() == s)
            .ok_or_else(|| {
                let valid: Vec<&str> = DependencyType::ALL.iter().map(|t| t.as_str()).collect();
                GraphError::invalid_value(
                    "type",
                    format!(
                        "Invalid dependency type '{}'. Valid types: {}",
                        s,
                        valid.join(", ")
                    ),
                )
            })
    }
}

/// A directed precedence edge: `predecessor_id -> successor_id`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Dependency {
    pub id: DependencyId,
    pub predecessor_id: TaskId,
    pub successor_id: TaskId,
    #[serde(rename = "type")]
    pub dep_type: DependencyType,
    /// Signed day offset; negative is a lead. Stored, never applied.
    pub lag: i32,
    pub created_at: i64,
    pub updated_at: i64,
}

/// Input for creating an edge.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewDependency {
    pub predecessor_id: TaskId,
    pub successor_id: TaskId,
    pub dep_type: DependencyType,
    pub lag: i32,
}

impl NewDependency {
    pub fn new(predecessor_id: TaskId, successor_id: TaskId) -> Self {
        Self {
            predecessor_id,
            successor_id,
            dep_type: DependencyType::default(),
            lag: 0,
        }
    }

    pub fn with_type(mut self, dep_type: DependencyType) -> Self {
        self.dep_type = dep_type;
        self
    }

    pub fn with_lag(mut self, lag: i32) -> Self {
        self.lag = lag;
        self
    }
}

/// Mutable fields of an edge. Endpoints are fixed at creation.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DependencyPatch {
    pub dep_type: Option<DependencyType>,
    pub lag: Option<i32>,
}

impl DependencyPatch {
    pub fn is_empty(&self) -> bool {
        self.dep_type.is_none() && self.lag.is_none()
    }
}

/// Task metadata as exposed by the task store.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TaskSummary {
    pub id: TaskId,
    pub title: String,
    pub status: String,
    pub start_date: Option<String>,
    /// The task's due date.
    pub end_date: Option<String>,
    #[serde(default)]
    pub progress: i32,
    pub project_id: Option<i64>,
    pub assignee_id: Option<i64>,
    pub category: Option<String>,
}

impl TaskSummary {
    /// Minimal pending task, mostly for seeding stores.
    pub fn new(id: TaskId, title: impl Into<String>) -> Self {
        Self {
            id,
            title: title.into(),
            status: "pending".to_string(),
            start_date: None,
            end_date: None,
            progress: 0,
            project_id: None,
            assignee_id: None,
            category: None,
        }
    }

    pub fn in_project(mut self, project_id: i64) -> Self {
        self.project_id = Some(project_id);
        self
    }

    pub fn with_dates(mut self, start: Option<&str>, end: Option<&str>) -> Self {
        self.start_date = start.map(String::from);
        self.end_date = end.map(String::from);
        self
    }
}

/// Schedule fields of one endpoint, captured at query time.
///
/// All fields are `None` when the task no longer exists or is hidden from
/// the caller.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct EndpointSnapshot {
    pub title: Option<String>,
    pub status: Option<String>,
    pub start_date: Option<String>,
    pub end_date: Option<String>,
}

impl EndpointSnapshot {
    pub fn of(task: &TaskSummary) -> Self {
        Self {
            title: Some(task.title.clone()),
            status: Some(task.status.clone()),
            start_date: task.start_date.clone(),
            end_date: task.end_date.clone(),
        }
    }

    pub fn is_blank(&self) -> bool {
        self == &Self::default()
    }
}

/// An edge together with both endpoints' schedule snapshots.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DecoratedDependency {
    #[serde(flatten)]
    pub dependency: Dependency,
    pub predecessor: EndpointSnapshot,
    pub successor: EndpointSnapshot,
}

/// Task selection for the Gantt view. Every criterion is optional.
///
/// Dates are ISO `YYYY-MM-DD` strings; a task is kept when its window
/// overlaps `[start_date, end_date]`, open ends included.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TaskFilter {
    pub start_date: Option<String>,
    pub end_date: Option<String>,
    pub assignee_id: Option<i64>,
    pub category: Option<String>,
    pub project_id: Option<i64>,
    pub status: Option<String>,
}

impl TaskFilter {
    pub fn matches(&self, task: &TaskSummary) -> bool {
        if let Some(ref from) = self.start_date {
            if task.end_date.as_deref().is_some_and(|end| end < from.as_str()) {
                return false;
            }
        }
        if let Some(ref until) = self.end_date {
            if task
                .start_date
                .as_deref()
                .is_some_and(|start| start > until.as_str())
            {
                return false;
            }
        }
        if self.assignee_id.is_some() && task.assignee_id != self.assignee_id {
            return false;
        }
        if self.project_id.is_some() && task.project_id != self.project_id {
            return false;
        }
        if let Some(ref category) = self.category {
            if task.category.as_deref() != Some(category.as_str()) {
                return false;
            }
        }
        if let Some(ref status) = self.status {
            if &task.status != status {
                return false;
            }
        }
        true
    }
}

/// Everything a Gantt view needs in one payload.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GanttPayload {
    pub tasks: Vec<TaskSummary>,
    pub dependencies: Vec<DecoratedDependency>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ErrorCode;

    #[test]
    fn dependency_type_parses_every_wire_name() {
        for t in DependencyType::ALL {
            assert_eq!(t.as_str().parse::<DependencyType>().unwrap(), t);
        }
        let err = "blocks".parse::<DependencyType>().unwrap_err();
        assert_eq!(err.code, ErrorCode::InvalidFieldValue);
        assert_eq!(err.field.as_deref(), Some("type"));
    }

    #[test]
    fn dependency_serializes_type_field() {
        let dep = Dependency {
            id: 1,
            predecessor_id: 10,
            successor_id: 11,
            dep_type: DependencyType::StartToFinish,
            lag: -2,
            created_at: 5,
            updated_at: 5,
        };
        let json = serde_json::to_value(&dep).unwrap();
        assert_eq!(json["type"], "start_to_finish");
        assert_eq!(json["lag"], -2);
    }

    #[test]
    fn decorated_dependency_flattens_edge() {
        let task = TaskSummary::new(10, "Design").with_dates(Some("2024-01-01"), None);
        let decorated = DecoratedDependency {
            dependency: Dependency {
                id: 3,
                predecessor_id: 10,
                successor_id: 11,
                dep_type: DependencyType::FinishToStart,
                lag: 0,
                created_at: 1,
                updated_at: 1,
            },
            predecessor: EndpointSnapshot::of(&task),
            successor: EndpointSnapshot::default(),
        };
        let json = serde_json::to_value(&decorated).unwrap();
        assert_eq!(json["id"], 3);
        assert_eq!(json["predecessor"]["title"], "Design");
        assert_eq!(json["predecessor"]["start_date"], "2024-01-01");
        assert!(json["successor"]["title"].is_null());
    }

    #[test]
    fn filter_keeps_overlapping_windows() {
        let task = TaskSummary::new(1, "Build").with_dates(Some("2024-03-01"), Some("2024-03-10"));
        let mut filter = TaskFilter {
            start_date: Some("2024-03-05".into()),
            end_date: Some("2024-03-20".into()),
            ..Default::default()
        };
        assert!(filter.matches(&task));

        filter.start_date = Some("2024-03-11".into());
        assert!(!filter.matches(&task));

        filter.start_date = None;
        filter.end_date = Some("2024-02-28".into());
        assert!(!filter.matches(&task));
    }

    #[test]
    fn filter_matches_scalar_criteria() {
        let task = TaskSummary {
            assignee_id: Some(4),
            category: Some("general_work".into()),
            ..TaskSummary::new(1, "Write docs").in_project(9)
        };
        assert!(TaskFilter::default().matches(&task));
        assert!(
            TaskFilter {
                project_id: Some(9),
                assignee_id: Some(4),
                category: Some("general_work".into()),
                status: Some("pending".into()),
                ..Default::default()
            }
            .matches(&task)
        );
        assert!(
            !TaskFilter {
                project_id: Some(8),
                ..Default::default()
            }
            .matches(&task)
        );
        assert!(
            !TaskFilter {
                status: Some("completed".into()),
                ..Default::default()
            }
            .matches(&task)
        );
    }
}
