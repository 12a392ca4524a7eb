// crates/server/src/error.rs
use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use marketlens_db::{DbError, ValidationError};
use serde::Serialize;
use serde_json::{json, Value};
use thiserror::Error;

use crate::response::now_rfc3339;

/// Error envelope: `{ "success": false, "error": "...", "details": ..., "timestamp": ... }`
#[derive(Debug, Serialize)]
#[cfg_attr(test, derive(serde::Deserialize))]
pub struct ErrorResponse {
    pub success: bool,
    pub error: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub details: Option<Value>,
    pub timestamp: String,
}

impl ErrorResponse {
    pub fn new(error: impl Into<String>) -> Self {
        Self {
            success: false,
            error: error.into(),
            details: None,
            timestamp: now_rfc3339(),
        }
    }

    pub fn with_details(error: impl Into<String>, details: Value) -> Self {
        Self {
            success: false,
            error: error.into(),
            details: Some(details),
            timestamp: now_rfc3339(),
        }
    }
}

/// API error types that map to HTTP status codes
#[derive(Debug, Error)]
pub enum ApiError {
    #[error("{0}")]
    Validation(#[from] ValidationError),

    #[error("{entity} not found: {id}")]
    NotFound { entity: &'static str, id: String },

    #[error("Database error: {0}")]
    Database(DbError),

    #[error("Internal server error: {0}")]
    Internal(String),
}

impl ApiError {
    pub fn not_found(entity: &'static str, id: impl ToString) -> Self {
        Self::NotFound {
            entity,
            id: id.to_string(),
        }
    }
}

impl From<DbError> for ApiError {
    fn from(err: DbError) -> Self {
        match err {
            // Validation raised inside the db layer is still a client error.
            DbError::Validation(v) => ApiError::Validation(v),
            other => ApiError::Database(other),
        }
    }
}

fn validation_response(v: &ValidationError) -> (StatusCode, ErrorResponse) {
    tracing::warn!(field = %v.field, message = %v.message, "Rejected request");
    (
        StatusCode::BAD_REQUEST,
        ErrorResponse::with_details(
            v.to_string(),
            json!({ "field": v.field, "message": v.message }),
        ),
    )
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, error_response) = match &self {
            ApiError::Validation(v) => validation_response(v),
            ApiError::NotFound { entity, id } => {
                tracing::warn!(entity = %entity, id = %id, "Not found");
                (
                    StatusCode::NOT_FOUND,
                    ErrorResponse::with_details(
                        format!("{entity} not found"),
                        json!({ "id": id }),
                    ),
                )
            }
            ApiError::Database(db_err) => match db_err {
                DbError::Validation(v) => validation_response(v),
                DbError::NotReady { state } => {
                    tracing::warn!(state = %state, "Database not ready");
                    (
                        StatusCode::SERVICE_UNAVAILABLE,
                        ErrorResponse::with_details(
                            "Database not ready",
                            json!({ "state": state }),
                        ),
                    )
                }
                DbError::Connection { endpoint, message } => {
                    tracing::error!(endpoint = %endpoint, error = %message, "Database unavailable");
                    (
                        StatusCode::SERVICE_UNAVAILABLE,
                        ErrorResponse::new("Database unavailable"),
                    )
                }
                DbError::Query { message, sql } => {
                    tracing::error!(sql = %sql, error = %message, "Query failed");
                    (
                        StatusCode::INTERNAL_SERVER_ERROR,
                        ErrorResponse::new("Database query failed"),
                    )
                }
                DbError::Decode(message) => {
                    tracing::error!(error = %message, "Row decode failed");
                    (
                        StatusCode::INTERNAL_SERVER_ERROR,
                        ErrorResponse::new("Database query failed"),
                    )
                }
                DbError::CreateDir(source) => {
                    tracing::error!(error = %source, "Database directory unavailable");
                    (
                        StatusCode::INTERNAL_SERVER_ERROR,
                        ErrorResponse::new("Internal server error"),
                    )
                }
            },
            ApiError::Internal(msg) => {
                tracing::error!(message = %msg, "Internal server error");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    ErrorResponse::new("Internal server error"),
                )
            }
        };

        (status, Json(error_response)).into_response()
    }
}

/// Result type alias for API handlers
pub type ApiResult<T> = Result<T, ApiError>;

#[cfg(test)]
mod tests {
    use super::*;
    use axum::body::to_bytes;
    use marketlens_db::ConnectionState;

    /// Helper to extract status code and body from a response
    async fn extract_response(response: Response) -> (StatusCode, ErrorResponse) {
        let status = response.status();
        let body = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        let error_response: ErrorResponse = serde_json::from_slice(&body).unwrap();
        (status, error_response)
    }

    #[tokio::test]
    async fn test_validation_returns_400_with_field() {
        let error: ApiError = ValidationError::new("page", "must be an integer").into();
        let (status, body) = extract_response(error.into_response()).await;

        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert!(!body.success);
        assert_eq!(body.error, "Invalid page: must be an integer");
        assert_eq!(body.details.unwrap()["field"], "page");
    }

    #[tokio::test]
    async fn test_db_validation_is_still_400() {
        let error: ApiError =
            DbError::Validation(ValidationError::new("type", "expected one of: platform, region"))
                .into();
        assert!(matches!(error, ApiError::Validation(_)));
        let (status, _) = extract_response(error.into_response()).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn test_not_found_returns_404() {
        let error = ApiError::not_found("KOL", 42);
        let (status, body) = extract_response(error.into_response()).await;

        assert_eq!(status, StatusCode::NOT_FOUND);
        assert_eq!(body.error, "KOL not found");
        assert_eq!(body.details.unwrap()["id"], "42");
    }

    #[tokio::test]
    async fn test_not_ready_returns_503() {
        let error: ApiError = DbError::NotReady {
            state: ConnectionState::Initializing,
        }
        .into();
        let (status, body) = extract_response(error.into_response()).await;

        assert_eq!(status, StatusCode::SERVICE_UNAVAILABLE);
        assert_eq!(body.details.unwrap()["state"], "initializing");
    }

    #[tokio::test]
    async fn test_connection_error_returns_503_without_endpoint() {
        let error: ApiError = DbError::Connection {
            endpoint: "https://db.example.io".into(),
            message: "connection refused".into(),
        }
        .into();
        let (status, body) = extract_response(error.into_response()).await;

        assert_eq!(status, StatusCode::SERVICE_UNAVAILABLE);
        assert_eq!(body.error, "Database unavailable");
        assert!(body.details.is_none());
    }

    #[tokio::test]
    async fn test_query_error_never_leaks_sql() {
        let error: ApiError = DbError::Query {
            message: "no such table: secret_table".into(),
            sql: "SELECT * FROM secret_table".into(),
        }
        .into();
        let response = error.into_response();
        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);

        let body = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        let text = String::from_utf8(body.to_vec()).unwrap();
        assert!(!text.contains("secret_table"));
        assert!(text.contains("Database query failed"));
    }

    #[tokio::test]
    async fn test_internal_error_returns_500() {
        let error = ApiError::Internal("Something went wrong".to_string());
        let (status, body) = extract_response(error.into_response()).await;

        assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(body.error, "Internal server error");
        // Internal errors should NOT expose details to clients
        assert!(body.details.is_none());
    }

    #[test]
    fn test_error_response_serialization() {
        let json = serde_json::to_string(&ErrorResponse::new("Test error")).unwrap();
        assert!(json.starts_with(r#"{"success":false,"error":"Test error","timestamp":""#));
        assert!(!json.contains("details")); // None should be skipped
    }
}
