//! Unified Error Handling
//!
//! Application-wide error type and the `{code, message, data}` response
//! envelope shared by every API handler.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;
use tracing::error;

use crate::db::repository::RepoError;

/// Unified API response structure
#[derive(Debug, Serialize)]
pub struct ApiResponse<T> {
    pub code: String,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<T>,
}

/// Application-level error type
#[derive(Debug, thiserror::Error)]
pub enum AppError {
    /// Bad input; detected before any mutation
    #[error("Validation failed: {0}")]
    Validation(String),

    /// Current state does not match the transition's expected "from" state
    #[error("Conflict: {0}")]
    Conflict(String),

    #[error("Resource not found: {0}")]
    NotFound(String),

    #[error("Database error: {0}")]
    Database(String),

    /// External collaborator (payment, shipping, listing feed) failed
    #[error("Provider error: {0}")]
    Provider(String),

    #[error("Internal server error: {0}")]
    Internal(String),
}

pub type AppResult<T> = Result<T, AppError>;

impl From<RepoError> for AppError {
    fn from(err: RepoError) -> Self {
        match err {
            RepoError::NotFound(msg) => AppError::NotFound(msg),
            RepoError::Conflict(msg) => AppError::Conflict(msg),
            RepoError::Validation(msg) => AppError::Validation(msg),
            RepoError::Database(msg) => AppError::Database(msg),
        }
    }
}

impl From<validator::ValidationErrors> for AppError {
    fn from(errs: validator::ValidationErrors) -> Self {
        AppError::Validation(errs.to_string())
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, code, message) = match &self {
            AppError::Validation(msg) => (StatusCode::BAD_REQUEST, "E0002", msg.clone()),
            AppError::NotFound(msg) => (StatusCode::NOT_FOUND, "E0003", msg.clone()),
            AppError::Conflict(msg) => (StatusCode::CONFLICT, "E0004", msg.clone()),
            AppError::Database(msg) => {
                error!(target: "database", error = %msg, "Database error occurred");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "E9002",
                    "Database error".to_string(),
                )
            }
            AppError::Provider(msg) => {
                error!(target: "provider", error = %msg, "External provider call failed");
                (StatusCode::BAD_GATEWAY, "E9003", msg.clone())
            }
            AppError::Internal(msg) => {
                error!(target: "internal", error = %msg, "Internal error occurred");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "E9001",
                    "Internal server error".to_string(),
                )
            }
        };

        let body = Json(ApiResponse::<()> {
            code: code.to_string(),
            message,
            data: None,
        });

        (status, body).into_response()
    }
}

/// Create a successful response
pub fn ok<T: Serialize>(data: T) -> Json<ApiResponse<T>> {
    Json(ApiResponse {
        code: "E0000".to_string(),
        message: "Success".to_string(),
        data: Some(data),
    })
}

/// Create a successful response with custom message
pub fn ok_with_message<T: Serialize>(data: T, message: impl Into<String>) -> Json<ApiResponse<T>> {
    Json(ApiResponse {
        code: "E0000".to_string(),
        message: message.into(),
        data: Some(data),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn success_envelope_shape() {
        let Json(body) = ok(vec!["a", "b"]);
        let json = serde_json::to_value(&body).unwrap();
        assert_eq!(json["code"], "E0000");
        assert_eq!(json["message"], "Success");
        assert_eq!(json["data"][1], "b");
    }

    #[test]
    fn error_without_data_omits_the_field() {
        let body = ApiResponse::<()> {
            code: "E0003".to_string(),
            message: "Resource not found: drop_1".to_string(),
            data: None,
        };
        let json = serde_json::to_value(&body).unwrap();
        assert!(json.get("data").is_none());
    }

    #[test]
    fn repo_errors_map_to_matching_variants() {
        let err: AppError = RepoError::NotFound("Drop d1 not found".into()).into();
        assert!(matches!(err, AppError::NotFound(_)));
        let err: AppError = RepoError::Conflict("busy".into()).into();
        assert!(matches!(err, AppError::Conflict(_)));
    }
}
