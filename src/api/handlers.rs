//! Route handlers.
//!
//! Handlers parse and validate request input, call the graph service, and
//! wrap the result in the JSON envelope. Extractor rejections are turned
//! into structured `INVALID_FIELD_VALUE` errors instead of axum's plain text.

use axum::Json;
use axum::extract::rejection::{JsonRejection, PathRejection, QueryRejection};
use axum::extract::{Path, Query, State};
use axum::response::{IntoResponse, Response};
use serde::Deserialize;
use serde_json::json;

use super::ApiState;
use super::response::{Envelope, created, ok};
use crate::error::{GraphError, GraphResult};
use crate::types::{DependencyPatch, DependencyType, NewDependency, TaskFilter};

/// Body of `POST /api/task-dependencies`.
#[derive(Debug, Default, Deserialize)]
pub struct CreateDependencyRequest {
    pub predecessor_id: Option<i64>,
    pub successor_id: Option<i64>,
    #[serde(rename = "type", alias = "dependency_type")]
    pub dep_type: Option<String>,
    #[serde(alias = "lag_days")]
    pub lag: Option<i64>,
}

/// Body of `PUT /api/task-dependencies/{id}`.
#[derive(Debug, Default, Deserialize)]
pub struct UpdateDependencyRequest {
    #[serde(rename = "type", alias = "dependency_type")]
    pub dep_type: Option<String>,
    #[serde(alias = "lag_days")]
    pub lag: Option<i64>,
}

/// Query of `GET /api/tasks/gantt/data`. Empty values count as absent.
#[derive(Debug, Default, Deserialize)]
pub struct GanttQuery {
    pub start_date: Option<String>,
    pub end_date: Option<String>,
    pub assignee_id: Option<String>,
    pub category: Option<String>,
    pub project_id: Option<String>,
    pub status: Option<String>,
}

fn body<T>(payload: Result<Json<T>, JsonRejection>) -> GraphResult<T> {
    payload
        .map(|Json(value)| value)
        .map_err(|e| GraphError::invalid_value("body", e.body_text()))
}

fn path_id(field: &str, path: Result<Path<i64>, PathRejection>) -> GraphResult<i64> {
    let Path(id) = path.map_err(|e| GraphError::invalid_value(field, e.body_text()))?;
    positive(field, id)
}

fn positive(field: &str, value: i64) -> GraphResult<i64> {
    if value <= 0 {
        return Err(GraphError::invalid_value(
            field,
            format!("{field} must be a positive integer, got {value}"),
        ));
    }
    Ok(value)
}

fn required_id(field: &str, value: Option<i64>) -> GraphResult<i64> {
    positive(field, value.ok_or_else(|| GraphError::missing_field(field))?)
}

fn parse_type(raw: Option<&str>) -> GraphResult<Option<DependencyType>> {
    raw.map(str::parse::<DependencyType>).transpose()
}

fn parse_lag(raw: Option<i64>) -> GraphResult<Option<i32>> {
    raw.map(|lag| {
        i32::try_from(lag)
            .map_err(|_| GraphError::invalid_value("lag", format!("Lag {lag} is out of range")))
    })
    .transpose()
}

fn non_empty(value: Option<String>) -> Option<String> {
    value.filter(|v| !v.trim().is_empty())
}

fn optional_id(field: &str, raw: Option<String>) -> GraphResult<Option<i64>> {
    non_empty(raw)
        .map(|v| {
            let id = v.trim().parse::<i64>().map_err(|_| {
                GraphError::invalid_value(field, format!("{field} must be an integer, got '{v}'"))
            })?;
            positive(field, id)
        })
        .transpose()
}

fn optional_date(field: &str, raw: Option<String>) -> GraphResult<Option<String>> {
    non_empty(raw)
        .map(|v| {
            chrono::NaiveDate::parse_from_str(&v, "%Y-%m-%d")
                .map(|_| v.clone())
                .map_err(|_| {
                    GraphError::invalid_value(field, format!("{field} must be YYYY-MM-DD, got '{v}'"))
                })
        })
        .transpose()
}

impl GanttQuery {
    pub fn into_filter(self) -> GraphResult<TaskFilter> {
        Ok(TaskFilter {
            start_date: optional_date("start_date", self.start_date)?,
            end_date: optional_date("end_date", self.end_date)?,
            assignee_id: optional_id("assignee_id", self.assignee_id)?,
            category: non_empty(self.category),
            project_id: optional_id("project_id", self.project_id)?,
            status: non_empty(self.status),
        })
    }
}

pub async fn create_dependency(
    State(state): State<ApiState>,
    payload: Result<Json<CreateDependencyRequest>, JsonRejection>,
) -> GraphResult<Response> {
    let req = body(payload)?;
    let predecessor_id = required_id("predecessor_id", req.predecessor_id)?;
    let successor_id = required_id("successor_id", req.successor_id)?;
    let dep_type =
        parse_type(req.dep_type.as_deref())?.unwrap_or(state.graph.config().default_type);
    let lag = parse_lag(req.lag)?.unwrap_or(0);

    let dep = state
        .graph
        .create_dependency(
            NewDependency::new(predecessor_id, successor_id)
                .with_type(dep_type)
                .with_lag(lag),
        )
        .await?;
    Ok(created(
        Envelope::data(dep).with_message("Dependency created successfully"),
    ))
}

pub async fn get_task_dependencies(
    State(state): State<ApiState>,
    task_id: Result<Path<i64>, PathRejection>,
) -> GraphResult<Response> {
    let task_id = path_id("task_id", task_id)?;
    let deps = state.graph.dependencies_for_task(task_id).await?;
    Ok(ok(Envelope::data(deps)))
}

pub async fn get_project_dependencies(
    State(state): State<ApiState>,
    project_id: Result<Path<i64>, PathRejection>,
) -> GraphResult<Response> {
    let project_id = path_id("project_id", project_id)?;
    let deps = state.graph.dependencies_for_project(project_id).await?;
    Ok(ok(Envelope::data(deps)))
}

pub async fn get_dependency(
    State(state): State<ApiState>,
    id: Result<Path<i64>, PathRejection>,
) -> GraphResult<Response> {
    let id = path_id("id", id)?;
    let dep = state.graph.get_dependency(id).await?;
    Ok(ok(Envelope::data(dep)))
}

pub async fn update_dependency(
    State(state): State<ApiState>,
    id: Result<Path<i64>, PathRejection>,
    payload: Result<Json<UpdateDependencyRequest>, JsonRejection>,
) -> GraphResult<Response> {
    let id = path_id("id", id)?;
    let req = body(payload)?;
    let patch = DependencyPatch {
        dep_type: parse_type(req.dep_type.as_deref())?,
        lag: parse_lag(req.lag)?,
    };
    let dep = state.graph.update_dependency(id, patch).await?;
    Ok(ok(
        Envelope::data(dep).with_message("Dependency updated successfully")
    ))
}

pub async fn delete_dependency(
    State(state): State<ApiState>,
    id: Result<Path<i64>, PathRejection>,
) -> GraphResult<Response> {
    let id = path_id("id", id)?;
    state.graph.delete_dependency(id).await?;
    Ok(ok(Envelope::message("Dependency deleted successfully")))
}

pub async fn delete_task_dependencies(
    State(state): State<ApiState>,
    task_id: Result<Path<i64>, PathRejection>,
) -> GraphResult<Response> {
    let task_id = path_id("task_id", task_id)?;
    let deleted = state.graph.delete_all_for_task(task_id).await?;
    Ok(ok(Envelope::data(json!({ "deleted": deleted }))
        .with_message("Task dependencies deleted successfully")))
}

pub async fn delete_task(
    State(state): State<ApiState>,
    task_id: Result<Path<i64>, PathRejection>,
) -> GraphResult<Response> {
    let task_id = path_id("task_id", task_id)?;
    let removed = state.graph.delete_task(task_id).await?;
    Ok(ok(Envelope::data(json!({
        "task_id": task_id,
        "dependencies_removed": removed,
    }))
    .with_message("Task deleted successfully")))
}

pub async fn gantt_data(
    State(state): State<ApiState>,
    query: Result<Query<GanttQuery>, QueryRejection>,
) -> GraphResult<Response> {
    let Query(query) =
        query.map_err(|e| GraphError::invalid_value("query", e.body_text()))?;
    let filter = query.into_filter()?;
    let payload = state.graph.gantt_data(&filter).await?;
    Ok(ok(Envelope::data(payload)))
}

pub async fn health() -> impl IntoResponse {
    Json(json!({
        "status": "healthy",
        "version": env!("CARGO_PKG_VERSION"),
    }))
}
