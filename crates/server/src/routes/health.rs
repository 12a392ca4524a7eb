// crates/server/src/routes/health.rs
//! Health check endpoints for the API.

use std::sync::Arc;

use axum::{extract::State, routing::get, Json, Router};
use marketlens_db::{ConnectionState, DbError, TableStat};
use serde::Serialize;

use crate::error::ApiResult;
use crate::response::ApiResponse;
use crate::state::AppState;

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DatabaseStatus {
    pub backend: &'static str,
    pub endpoint: String,
    pub state: ConnectionState,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub failure: Option<String>,
}

/// Response for the health check endpoint.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct HealthResponse {
    /// `ok` once the adapter is ready, `degraded` otherwise.
    pub status: &'static str,
    pub version: &'static str,
    pub uptime_secs: u64,
    pub database: DatabaseStatus,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DbHealthResponse {
    pub status: &'static str,
    pub backend: &'static str,
    pub latency_ms: u64,
    pub tables: Vec<TableStat>,
}

/// GET /api/health - Liveness. Always 200 while the process is serving.
pub async fn health_check(State(state): State<Arc<AppState>>) -> Json<ApiResponse<HealthResponse>> {
    let conn = state.db.connection();
    let conn_state = conn.state();
    Json(ApiResponse::ok(HealthResponse {
        status: if conn_state == ConnectionState::Ready {
            "ok"
        } else {
            "degraded"
        },
        version: env!("CARGO_PKG_VERSION"),
        uptime_secs: state.uptime_secs(),
        database: DatabaseStatus {
            backend: conn.backend_kind().name(),
            endpoint: conn.endpoint(),
            state: conn_state,
            failure: conn.failure(),
        },
    }))
}

/// GET /api/health/db - Probe the backend and count rows per table.
///
/// 503 while the adapter is not ready or the backend is unreachable.
pub async fn db_health(
    State(state): State<Arc<AppState>>,
) -> ApiResult<Json<ApiResponse<DbHealthResponse>>> {
    let conn = state.db.connection();
    if conn.state() != ConnectionState::Ready {
        return Err(DbError::NotReady {
            state: conn.state(),
        }
        .into());
    }

    let latency_ms = state.db.ping().await?;
    let tables = state.db.table_stats().await?;
    Ok(Json(ApiResponse::ok(DbHealthResponse {
        status: "healthy",
        backend: conn.backend_kind().name(),
        latency_ms,
        tables,
    })))
}

/// Create the health routes router.
pub fn router() -> Router<Arc<AppState>> {
    Router::new()
        .route("/health", get(health_check))
        .route("/health/db", get(db_health))
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_health_response_serialization() {
        let response = HealthResponse {
            status: "ok",
            version: "0.1.0",
            uptime_secs: 42,
            database: DatabaseStatus {
                backend: "memory",
                endpoint: "sqlite::memory:".to_string(),
                state: ConnectionState::Ready,
                failure: None,
            },
        };

        let value = serde_json::to_value(&response).unwrap();
        assert_eq!(value["uptimeSecs"], json!(42));
        assert_eq!(value["database"]["state"], json!("ready"));
        assert!(value["database"].get("failure").is_none());
    }
}
