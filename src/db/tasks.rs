//! Task records: the slice of the task store the dependency engine needs.
//!
//! Task lifecycle belongs to the task store. This module only seeds tasks,
//! reads them for decoration and Gantt filtering, and deletes them through
//! the dependency cascade.

use async_trait::async_trait;
use rusqlite::{OptionalExtension, Row, params, params_from_iter};

use super::{Database, MAX_BOUND_IDS, now_ms};
use crate::error::GraphResult;
use crate::store::TaskStore;
use crate::types::{TaskFilter, TaskId, TaskSummary};

const TASK_COLUMNS: &str =
    "id, title, status, start_date, due_date, progress, project_id, assignee_id, category";

/// Input for inserting a task record.
#[derive(Debug, Clone, Default)]
pub struct NewTask {
    pub title: String,
    pub status: Option<String>,
    pub start_date: Option<String>,
    pub due_date: Option<String>,
    pub project_id: Option<i64>,
    pub assignee_id: Option<i64>,
    pub category: Option<String>,
}

impl NewTask {
    pub fn titled(title: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            ..Default::default()
        }
    }

    pub fn in_project(mut self, project_id: i64) -> Self {
        self.project_id = Some(project_id);
        self
    }

    pub fn between(mut self, start_date: &str, due_date: &str) -> Self {
        self.start_date = Some(start_date.to_string());
        self.due_date = Some(due_date.to_string());
        self
    }
}

pub fn parse_task_row(row: &Row) -> rusqlite::Result<TaskSummary> {
    Ok(TaskSummary {
        id: row.get("id")?,
        title: row.get("title")?,
        status: row.get("status")?,
        start_date: row.get("start_date")?,
        end_date: row.get("due_date")?,
        progress: row.get("progress")?,
        project_id: row.get("project_id")?,
        assignee_id: row.get("assignee_id")?,
        category: row.get("category")?,
    })
}

impl Database {
    /// Insert a task and return its summary.
    pub fn insert_task(&self, task: &NewTask) -> GraphResult<TaskSummary> {
        self.with_conn(|conn| {
            let now = now_ms();
            let status = task.status.as_deref().unwrap_or("pending");
            conn.execute(
                "INSERT INTO tasks (title, status, start_date, due_date, project_id, assignee_id, category, created_at, updated_at)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?8)",
                params![
                    task.title,
                    status,
                    task.start_date,
                    task.due_date,
                    task.project_id,
                    task.assignee_id,
                    task.category,
                    now
                ],
            )?;

            Ok(TaskSummary {
                id: conn.last_insert_rowid(),
                title: task.title.clone(),
                status: status.to_string(),
                start_date: task.start_date.clone(),
                end_date: task.due_date.clone(),
                progress: 0,
                project_id: task.project_id,
                assignee_id: task.assignee_id,
                category: task.category.clone(),
            })
        })
    }

    /// Change a task's status and dates. Used to show decoration is read live.
    pub fn reschedule_task(
        &self,
        id: TaskId,
        status: &str,
        start_date: Option<&str>,
        due_date: Option<&str>,
    ) -> GraphResult<bool> {
        self.with_conn(|conn| {
            let changed = conn.execute(
                "UPDATE tasks SET status = ?1, start_date = ?2, due_date = ?3, updated_at = ?4
                 WHERE id = ?5",
                params![status, start_date, due_date, now_ms(), id],
            )?;
            Ok(changed > 0)
        })
    }

    /// Get a task summary by id.
    pub fn get_task_summary(&self, id: TaskId) -> GraphResult<Option<TaskSummary>> {
        self.with_conn(|conn| {
            let task = conn
                .query_row(
                    &format!("SELECT {} FROM tasks WHERE id = ?1", TASK_COLUMNS),
                    params![id],
                    parse_task_row,
                )
                .optional()?;
            Ok(task)
        })
    }

    /// Get summaries for a set of ids; unknown ids are skipped.
    pub fn get_task_summaries(&self, ids: &[TaskId]) -> GraphResult<Vec<TaskSummary>> {
        if ids.is_empty() {
            return Ok(Vec::new());
        }

        self.with_conn(|conn| {
            let mut tasks = Vec::with_capacity(ids.len());
            for chunk in ids.chunks(MAX_BOUND_IDS) {
                let placeholders = vec!["?"; chunk.len()].join(", ");
                let mut stmt = conn.prepare(&format!(
                    "SELECT {} FROM tasks WHERE id IN ({})",
                    TASK_COLUMNS, placeholders
                ))?;
                let rows = stmt
                    .query_map(params_from_iter(chunk.iter()), parse_task_row)?
                    .collect::<rusqlite::Result<Vec<_>>>()?;
                tasks.extend(rows);
            }
            tasks.sort_by_key(|t| t.id);
            tasks.dedup_by_key(|t| t.id);
            Ok(tasks)
        })
    }

    /// Ids of every task in a project.
    pub fn get_project_task_ids(&self, project_id: i64) -> GraphResult<Vec<TaskId>> {
        self.with_conn(|conn| {
            let mut stmt = conn.prepare("SELECT id FROM tasks WHERE project_id = ?1 ORDER BY id")?;
            let ids = stmt
                .query_map(params![project_id], |row| row.get(0))?
                .collect::<rusqlite::Result<Vec<TaskId>>>()?;
            Ok(ids)
        })
    }

    /// List tasks matching a Gantt filter, ordered by start date then id.
    pub fn list_task_summaries(&self, filter: &TaskFilter) -> GraphResult<Vec<TaskSummary>> {
        self.with_conn(|conn| {
            let mut sql = format!("SELECT {} FROM tasks t WHERE 1 = 1", TASK_COLUMNS);
            let mut params_vec: Vec<Box<dyn rusqlite::ToSql>> = Vec::new();
            let mut param_idx = 1;

            // Window overlap: tasks ending before the range or starting after it are out
            if let Some(ref from) = filter.start_date {
                sql.push_str(&format!(
                    " AND (t.due_date IS NULL OR t.due_date >= ?{})",
                    param_idx
                ));
                params_vec.push(Box::new(from.clone()));
                param_idx += 1;
            }
            if let Some(ref until) = filter.end_date {
                sql.push_str(&format!(
                    " AND (t.start_date IS NULL OR t.start_date <= ?{})",
                    param_idx
                ));
                params_vec.push(Box::new(until.clone()));
                param_idx += 1;
            }
            if let Some(assignee) = filter.assignee_id {
                sql.push_str(&format!(" AND t.assignee_id = ?{}", param_idx));
                params_vec.push(Box::new(assignee));
                param_idx += 1;
            }
            if let Some(ref category) = filter.category {
                sql.push_str(&format!(" AND t.category = ?{}", param_idx));
                params_vec.push(Box::new(category.clone()));
                param_idx += 1;
            }
            if let Some(project) = filter.project_id {
                sql.push_str(&format!(" AND t.project_id = ?{}", param_idx));
                params_vec.push(Box::new(project));
                param_idx += 1;
            }
            if let Some(ref status) = filter.status {
                sql.push_str(&format!(" AND t.status = ?{}", param_idx));
                params_vec.push(Box::new(status.clone()));
            }

            sql.push_str(" ORDER BY t.start_date IS NULL, t.start_date, t.id");

            let params_refs: Vec<&dyn rusqlite::ToSql> =
                params_vec.iter().map(|b| b.as_ref()).collect();
            let mut stmt = conn.prepare(&sql)?;
            let tasks = stmt
                .query_map(params_refs.as_slice(), parse_task_row)?
                .collect::<rusqlite::Result<Vec<_>>>()?;
            Ok(tasks)
        })
    }

    /// Delete a task and every dependency touching it in one transaction.
    ///
    /// Returns false if the task did not exist.
    pub fn delete_task(&self, id: TaskId) -> GraphResult<bool> {
        self.with_conn_mut(|conn| {
            let tx = conn.transaction()?;
            tx.execute(
                "DELETE FROM task_dependencies WHERE predecessor_id = ?1 OR successor_id = ?1",
                params![id],
            )?;
            let changed = tx.execute("DELETE FROM tasks WHERE id = ?1", params![id])?;
            tx.commit()?;
            Ok(changed > 0)
        })
    }
}

#[async_trait]
impl TaskStore for Database {
    async fn get_task(&self, id: TaskId) -> GraphResult<Option<TaskSummary>> {
        self.get_task_summary(id)
    }

    async fn get_tasks(&self, ids: &[TaskId]) -> GraphResult<Vec<TaskSummary>> {
        self.get_task_summaries(ids)
    }

    async fn task_ids_in_project(&self, project_id: i64) -> GraphResult<Vec<TaskId>> {
        self.get_project_task_ids(project_id)
    }

    async fn list_tasks(&self, filter: &TaskFilter) -> GraphResult<Vec<TaskSummary>> {
        self.list_task_summaries(filter)
    }

    async fn delete_task(&self, id: TaskId) -> GraphResult<bool> {
        Database::delete_task(self, id)
    }
}
