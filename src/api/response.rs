//! JSON envelope and error-to-status mapping.

use axum::Json;
use axum::http::StatusCode;
use axum::http::header::CONTENT_TYPE;
use axum::response::{IntoResponse, Response};
use serde::Serialize;
use tracing::error;

use crate::error::{ErrorCode, GraphError};

/// Body shape shared by every endpoint.
#[derive(Debug, Serialize)]
pub struct Envelope<T: Serialize> {
    pub success: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<T>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<GraphError>,
}

impl<T: Serialize> Envelope<T> {
    pub fn data(data: T) -> Self {
        Self {
            success: true,
            message: None,
            data: Some(data),
            error: None,
        }
    }

    pub fn with_message(mut self, message: impl Into<String>) -> Self {
        self.message = Some(message.into());
        self
    }
}

impl Envelope<()> {
    pub fn message(message: impl Into<String>) -> Self {
        Self {
            success: true,
            message: Some(message.into()),
            data: None,
            error: None,
        }
    }
}

/// 200 with the envelope.
pub fn ok<T: Serialize>(envelope: Envelope<T>) -> Response {
    (StatusCode::OK, Json(envelope)).into_response()
}

/// 201 with the envelope.
pub fn created<T: Serialize>(envelope: Envelope<T>) -> Response {
    (StatusCode::CREATED, Json(envelope)).into_response()
}

pub fn error_status(code: ErrorCode) -> StatusCode {
    match code {
        ErrorCode::MissingRequiredField
        | ErrorCode::InvalidFieldValue
        | ErrorCode::SelfLoop
        | ErrorCode::DuplicateEdge
        | ErrorCode::CircularDependency => StatusCode::BAD_REQUEST,
        ErrorCode::DependencyNotFound | ErrorCode::TaskNotFound => StatusCode::NOT_FOUND,
        ErrorCode::RequestTimeout => StatusCode::REQUEST_TIMEOUT,
        ErrorCode::StorageFailure | ErrorCode::InternalError => StatusCode::INTERNAL_SERVER_ERROR,
    }
}

impl IntoResponse for GraphError {
    fn into_response(self) -> Response {
        let status = error_status(self.code);
        if status.is_server_error() {
            error!(code = %self.code, details = ?self.details, "request failed: {}", self.message);
        }
        let body = Envelope::<()> {
            success: false,
            message: Some(self.message.clone()),
            data: None,
            error: Some(self),
        };
        (status, Json(body)).into_response()
    }
}

/// Replace the timeout layer's bare 408 with the error envelope.
pub async fn envelope_timeouts(response: Response) -> Response {
    let bare = !response.headers().contains_key(CONTENT_TYPE);
    if response.status() == StatusCode::REQUEST_TIMEOUT && bare {
        return GraphError::request_timeout().into_response();
    }
    response
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rejections_are_client_errors() {
        for code in [
            ErrorCode::SelfLoop,
            ErrorCode::DuplicateEdge,
            ErrorCode::CircularDependency,
            ErrorCode::InvalidFieldValue,
            ErrorCode::MissingRequiredField,
        ] {
            assert_eq!(error_status(code), StatusCode::BAD_REQUEST, "{code}");
        }
        assert_eq!(error_status(ErrorCode::TaskNotFound), StatusCode::NOT_FOUND);
        assert_eq!(error_status(ErrorCode::DependencyNotFound), StatusCode::NOT_FOUND);
        assert_eq!(
            error_status(ErrorCode::RequestTimeout),
            StatusCode::REQUEST_TIMEOUT
        );
        assert_eq!(
            error_status(ErrorCode::StorageFailure),
            StatusCode::INTERNAL_SERVER_ERROR
        );
    }

    #[test]
    fn envelope_omits_empty_parts() {
        let json = serde_json::to_value(Envelope::message("done")).unwrap();
        assert_eq!(json, serde_json::json!({"success": true, "message": "done"}));

        let json = serde_json::to_value(Envelope::data(vec![1, 2]).with_message("ok")).unwrap();
        assert_eq!(json["data"], serde_json::json!([1, 2]));
        assert_eq!(json["message"], "ok");
    }

    #[test]
    fn error_response_carries_code() {
        let response = GraphError::circular_dependency(3, 1).into_response();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn bare_timeout_becomes_envelope() {
        let response = envelope_timeouts(StatusCode::REQUEST_TIMEOUT.into_response()).await;
        assert_eq!(response.status(), StatusCode::REQUEST_TIMEOUT);

        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        let json: serde_json::Value = serde_json::from_slice(&bytes).unwrap();
        assert_eq!(json["success"], false);
        assert_eq!(json["error"]["code"], "REQUEST_TIMEOUT");
    }

    #[tokio::test]
    async fn other_responses_pass_through() {
        let response = envelope_timeouts(StatusCode::NO_CONTENT.into_response()).await;
        assert_eq!(response.status(), StatusCode::NO_CONTENT);
    }
}
