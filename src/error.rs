//! Structured error types for dependency graph operations.

use serde::Serialize;
use std::fmt;

use crate::types::{DependencyId, TaskId};

/// Error codes for programmatic error handling.
#[derive(Debug, Clone, Copy, Serialize, PartialEq, Eq)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ErrorCode {
    // Validation errors (4xx-like)
    MissingRequiredField,
    InvalidFieldValue,

    // Graph rejections
    SelfLoop,
    DuplicateEdge,
    CircularDependency,

    // Not found errors
    DependencyNotFound,
    TaskNotFound,

    // Internal errors
    StorageFailure,
    RequestTimeout,
    InternalError,
}

impl ErrorCode {
    /// Stable wire name of the code.
    pub fn as_str(&self) -> &'static str {
        match self {
            ErrorCode::MissingRequiredField => "MISSING_REQUIRED_FIELD",
            ErrorCode::InvalidFieldValue => "INVALID_FIELD_VALUE",
            ErrorCode::SelfLoop => "SELF_LOOP",
            ErrorCode::DuplicateEdge => "DUPLICATE_EDGE",
            ErrorCode::CircularDependency => "CIRCULAR_DEPENDENCY",
            ErrorCode::DependencyNotFound => "DEPENDENCY_NOT_FOUND",
            ErrorCode::TaskNotFound => "TASK_NOT_FOUND",
            ErrorCode::StorageFailure => "STORAGE_FAILURE",
            ErrorCode::RequestTimeout => "REQUEST_TIMEOUT",
            ErrorCode::InternalError => "INTERNAL_ERROR",
        }
    }

    /// Deterministic rejections: retrying the same request yields the same answer.
    pub fn is_rejection(&self) -> bool {
        matches!(
            self,
            ErrorCode::MissingRequiredField
                | ErrorCode::InvalidFieldValue
                | ErrorCode::SelfLoop
                | ErrorCode::DuplicateEdge
                | ErrorCode::CircularDependency
        )
    }

    pub fn is_not_found(&self) -> bool {
        matches!(self, ErrorCode::DependencyNotFound | ErrorCode::TaskNotFound)
    }
}

impl fmt::Display for ErrorCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Structured error returned by the engine, the stores and the HTTP layer.
#[derive(Debug, Serialize, thiserror::Error)]
#[error("{message}")]
pub struct GraphError {
    pub code: ErrorCode,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub field: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub details: Option<String>,
}

impl GraphError {
    pub fn new(code: ErrorCode, message: impl Into<String>) -> Self {
        Self {
            code,
            message: message.into(),
            field: None,
            details: None,
        }
    }

    pub fn with_field(mut self, field: impl Into<String>) -> Self {
        self.field = Some(field.into());
        self
    }

    pub fn with_details(mut self, details: impl Into<String>) -> Self {
        self.details = Some(details.into());
        self
    }

    // Convenience constructors

    pub fn missing_field(field: &str) -> Self {
        Self::new(
            ErrorCode::MissingRequiredField,
            format!("{} is required", field),
        )
        .with_field(field)
    }

    pub fn invalid_value(field: &str, reason: impl Into<String>) -> Self {
        Self::new(ErrorCode::InvalidFieldValue, reason).with_field(field)
    }

    pub fn self_loop(task_id: TaskId) -> Self {
        Self::new(
            ErrorCode::SelfLoop,
            format!("Task {} cannot depend on itself", task_id),
        )
    }

    pub fn duplicate_edge(predecessor_id: TaskId, successor_id: TaskId) -> Self {
        Self::new(
            ErrorCode::DuplicateEdge,
            format!(
                "Dependency {} -> {} already exists",
                predecessor_id, successor_id
            ),
        )
    }

    pub fn circular_dependency(predecessor_id: TaskId, successor_id: TaskId) -> Self {
        Self::new(
            ErrorCode::CircularDependency,
            format!(
                "Adding dependency {} -> {} would create a circular dependency",
                predecessor_id, successor_id
            ),
        )
        .with_details(format!(
            "task {} is already reachable from task {}",
            predecessor_id, successor_id
        ))
    }

    pub fn dependency_not_found(id: DependencyId) -> Self {
        Self::new(
            ErrorCode::DependencyNotFound,
            format!("Dependency not found: {}", id),
        )
    }

    pub fn task_not_found(task_id: TaskId) -> Self {
        Self::new(
            ErrorCode::TaskNotFound,
            format!("Task not found: {}", task_id),
        )
    }

    pub fn storage(err: impl fmt::Display) -> Self {
        Self::new(ErrorCode::StorageFailure, err.to_string())
    }

    pub fn request_timeout() -> Self {
        Self::new(ErrorCode::RequestTimeout, "Request timed out")
    }

    pub fn internal(err: impl fmt::Display) -> Self {
        Self::new(ErrorCode::InternalError, err.to_string())
    }
}

impl From<rusqlite::Error> for GraphError {
    fn from(err: rusqlite::Error) -> Self {
        GraphError::storage(err)
    }
}

// Allow using ? with anyhow errors by converting them
impl From<anyhow::Error> for GraphError {
    fn from(err: anyhow::Error) -> Self {
        match err.downcast::<GraphError>() {
            Ok(graph_err) => graph_err,
            Err(err) => match err.downcast::<rusqlite::Error>() {
                Ok(sql_err) => GraphError::from(sql_err),
                Err(err) => GraphError::internal(err),
            },
        }
    }
}

/// Result type for graph operations.
pub type GraphResult<T> = std::result::Result<T, GraphError>;
