//! Dependency edge persistence.

use async_trait::async_trait;
use rusqlite::{Connection, OptionalExtension, Row, params, params_from_iter};

use std::collections::HashSet;

use super::{Database, MAX_BOUND_IDS, now_ms};
use crate::error::{GraphError, GraphResult};
use crate::store::{DependencyStore, sort_newest_first};
use crate::types::{Dependency, DependencyId, DependencyPatch, NewDependency, TaskId};

const DEPENDENCY_COLUMNS: &str =
    "id, predecessor_id, successor_id, type, lag, created_at, updated_at";

fn parse_dependency_row(row: &Row) -> rusqlite::Result<Dependency> {
    let dep_type: String = row.get("type")?;
    let dep_type = dep_type.parse().map_err(|e: GraphError| {
        rusqlite::Error::FromSqlConversionFailure(3, rusqlite::types::Type::Text, Box::new(e))
    })?;

    Ok(Dependency {
        id: row.get("id")?,
        predecessor_id: row.get("predecessor_id")?,
        successor_id: row.get("successor_id")?,
        dep_type,
        lag: row.get("lag")?,
        created_at: row.get("created_at")?,
        updated_at: row.get("updated_at")?,
    })
}

/// Translate constraint violations on insert into graph rejections.
fn map_insert_error(err: rusqlite::Error, new: &NewDependency) -> GraphError {
    if let rusqlite::Error::SqliteFailure(ref failure, _) = err {
        match failure.extended_code {
            rusqlite::ffi::SQLITE_CONSTRAINT_UNIQUE | rusqlite::ffi::SQLITE_CONSTRAINT_PRIMARYKEY => {
                return GraphError::duplicate_edge(new.predecessor_id, new.successor_id);
            }
            rusqlite::ffi::SQLITE_CONSTRAINT_CHECK => {
                return GraphError::self_loop(new.predecessor_id);
            }
            rusqlite::ffi::SQLITE_CONSTRAINT_FOREIGNKEY => {
                return GraphError::new(
                    crate::error::ErrorCode::TaskNotFound,
                    format!(
                        "Dependency {} -> {} references a task that does not exist",
                        new.predecessor_id, new.successor_id
                    ),
                );
            }
            _ => {}
        }
    }
    GraphError::storage(err)
}

fn query_dependencies(
    conn: &Connection,
    sql: &str,
    params: impl rusqlite::Params,
) -> GraphResult<Vec<Dependency>> {
    let mut stmt = conn.prepare(sql)?;
    let deps = stmt
        .query_map(params, parse_dependency_row)?
        .collect::<rusqlite::Result<Vec<_>>>()?;
    Ok(deps)
}

impl Database {
    /// Insert a dependency edge.
    pub fn insert_dependency(&self, new: &NewDependency) -> GraphResult<Dependency> {
        if new.predecessor_id == new.successor_id {
            return Err(GraphError::self_loop(new.predecessor_id));
        }

        self.with_conn(|conn| {
            let now = now_ms();
            conn.execute(
                "INSERT INTO task_dependencies (predecessor_id, successor_id, type, lag, created_at, updated_at)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?5)",
                params![
                    new.predecessor_id,
                    new.successor_id,
                    new.dep_type.as_str(),
                    new.lag,
                    now
                ],
            )
            .map_err(|e| map_insert_error(e, new))?;

            Ok(Dependency {
                id: conn.last_insert_rowid(),
                predecessor_id: new.predecessor_id,
                successor_id: new.successor_id,
                dep_type: new.dep_type,
                lag: new.lag,
                created_at: now,
                updated_at: now,
            })
        })
    }

    /// Get a dependency by id.
    pub fn get_dependency(&self, id: DependencyId) -> GraphResult<Option<Dependency>> {
        self.with_conn(|conn| {
            let dep = conn
                .query_row(
                    &format!(
                        "SELECT {} FROM task_dependencies WHERE id = ?1",
                        DEPENDENCY_COLUMNS
                    ),
                    params![id],
                    parse_dependency_row,
                )
                .optional()?;
            Ok(dep)
        })
    }

    /// Get the dependency for an ordered pair.
    pub fn find_dependency(
        &self,
        predecessor_id: TaskId,
        successor_id: TaskId,
    ) -> GraphResult<Option<Dependency>> {
        self.with_conn(|conn| {
            let dep = conn
                .query_row(
                    &format!(
                        "SELECT {} FROM task_dependencies
                         WHERE predecessor_id = ?1 AND successor_id = ?2",
                        DEPENDENCY_COLUMNS
                    ),
                    params![predecessor_id, successor_id],
                    parse_dependency_row,
                )
                .optional()?;
            Ok(dep)
        })
    }

    /// Get every dependency touching any of the given tasks, newest first.
    ///
    /// Large id sets are queried in chunks of [`MAX_BOUND_IDS`].
    pub fn get_dependencies_for_tasks(&self, task_ids: &[TaskId]) -> GraphResult<Vec<Dependency>> {
        if task_ids.is_empty() {
            return Ok(Vec::new());
        }

        self.with_conn(|conn| {
            let mut seen = HashSet::new();
            let mut deps = Vec::new();
            for chunk in task_ids.chunks(MAX_BOUND_IDS) {
                let placeholders = vec!["?"; chunk.len()].join(", ");
                let sql = format!(
                    "SELECT {cols} FROM task_dependencies
                     WHERE predecessor_id IN ({ph}) OR successor_id IN ({ph})",
                    cols = DEPENDENCY_COLUMNS,
                    ph = placeholders
                );
                let ids = chunk.iter().chain(chunk.iter());
                for dep in query_dependencies(conn, &sql, params_from_iter(ids))? {
                    // An edge can match from two chunks
                    if seen.insert(dep.id) {
                        deps.push(dep);
                    }
                }
            }
            sort_newest_first(&mut deps);
            Ok(deps)
        })
    }

    /// Get tasks that a given task precedes.
    pub fn get_successors(&self, task_id: TaskId) -> GraphResult<Vec<TaskId>> {
        self.with_conn(|conn| {
            let mut stmt =
                conn.prepare("SELECT successor_id FROM task_dependencies WHERE predecessor_id = ?1")?;

            let successors = stmt
                .query_map(params![task_id], |row| row.get(0))?
                .collect::<rusqlite::Result<Vec<TaskId>>>()?;

            Ok(successors)
        })
    }

    /// Get all dependencies.
    pub fn get_all_dependencies(&self) -> GraphResult<Vec<Dependency>> {
        self.with_conn(|conn| {
            query_dependencies(
                conn,
                &format!(
                    "SELECT {} FROM task_dependencies ORDER BY id",
                    DEPENDENCY_COLUMNS
                ),
                params![],
            )
        })
    }

    /// Update type and/or lag. Returns false if the dependency does not exist.
    pub fn update_dependency(&self, id: DependencyId, patch: &DependencyPatch) -> GraphResult<bool> {
        self.with_conn(|conn| {
            let changed = conn.execute(
                "UPDATE task_dependencies
                 SET type = COALESCE(?1, type),
                     lag = COALESCE(?2, lag),
                     updated_at = ?3
                 WHERE id = ?4",
                params![
                    patch.dep_type.map(|t| t.as_str()),
                    patch.lag,
                    now_ms(),
                    id
                ],
            )?;
            Ok(changed > 0)
        })
    }

    /// Remove a dependency.
    pub fn remove_dependency(&self, id: DependencyId) -> GraphResult<bool> {
        self.with_conn(|conn| {
            let changed =
                conn.execute("DELETE FROM task_dependencies WHERE id = ?1", params![id])?;
            Ok(changed > 0)
        })
    }

    /// Remove every dependency touching a task.
    pub fn remove_task_dependencies(&self, task_id: TaskId) -> GraphResult<u64> {
        self.with_conn(|conn| {
            let changed = conn.execute(
                "DELETE FROM task_dependencies WHERE predecessor_id = ?1 OR successor_id = ?1",
                params![task_id],
            )?;
            Ok(changed as u64)
        })
    }
}

#[async_trait]
impl DependencyStore for Database {
    async fn create(&self, new: &NewDependency) -> GraphResult<Dependency> {
        self.insert_dependency(new)
    }

    async fn get(&self, id: DependencyId) -> GraphResult<Option<Dependency>> {
        self.get_dependency(id)
    }

    async fn find_pair(
        &self,
        predecessor_id: TaskId,
        successor_id: TaskId,
    ) -> GraphResult<Option<Dependency>> {
        self.find_dependency(predecessor_id, successor_id)
    }

    async fn get_by_task(&self, task_id: TaskId) -> GraphResult<Vec<Dependency>> {
        self.get_dependencies_for_tasks(&[task_id])
    }

    async fn get_by_tasks(&self, task_ids: &[TaskId]) -> GraphResult<Vec<Dependency>> {
        self.get_dependencies_for_tasks(task_ids)
    }

    async fn successors(&self, task_id: TaskId) -> GraphResult<Vec<TaskId>> {
        self.get_successors(task_id)
    }

    async fn list_all(&self) -> GraphResult<Vec<Dependency>> {
        self.get_all_dependencies()
    }

    async fn update(&self, id: DependencyId, patch: &DependencyPatch) -> GraphResult<bool> {
        self.update_dependency(id, patch)
    }

    async fn delete(&self, id: DependencyId) -> GraphResult<bool> {
        self.remove_dependency(id)
    }

    async fn delete_all_for_task(&self, task_id: TaskId) -> GraphResult<u64> {
        self.remove_task_dependencies(task_id)
    }
}
