//! Integration tests for server-first startup.
//!
//! The router is built before the adapter connects, exactly as `main` does,
//! and data routes must answer 503 until the adapter reaches `Ready`.

use std::sync::Arc;

use axum::body::Body;
use axum::http::{Request, StatusCode};
use axum::Router;
use marketlens_db::{Connection, ConnectionConfig, ConnectionState, Database};
use marketlens_server::{create_app, AppState};
use serde_json::Value;
use tower::ServiceExt;

async fn get(app: &Router, uri: &str) -> (StatusCode, Value) {
    let response = app
        .clone()
        .oneshot(Request::builder().uri(uri).body(Body::empty()).unwrap())
        .await
        .unwrap();
    let status = response.status();
    let body = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    (status, serde_json::from_slice(&body).unwrap_or(Value::Null))
}

fn app_for(conn: &Arc<Connection>) -> Router {
    create_app(AppState::new(Database::new(conn.clone())))
}

#[tokio::test]
async fn test_serves_503_then_200_after_background_connect() {
    let conn = Arc::new(Connection::new(ConnectionConfig::memory_seeded()));
    let app = app_for(&conn);

    let (status, _) = get(&app, "/api/testing/ideas").await;
    assert_eq!(status, StatusCode::SERVICE_UNAVAILABLE);

    let connector = conn.clone();
    tokio::spawn(async move { connector.connect().await })
        .await
        .unwrap()
        .unwrap();

    let (status, body) = get(&app, "/api/testing/ideas").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["pagination"]["total"], 5);
}

#[tokio::test]
async fn test_failed_connect_keeps_serving_health() {
    let dir = tempfile::tempdir().unwrap();
    // A directory cannot be opened as a database file.
    let conn = Arc::new(Connection::new(ConnectionConfig::local(dir.path())));
    let app = app_for(&conn);

    assert!(conn.connect().await.is_err());
    assert_eq!(conn.state(), ConnectionState::Failed);

    let (status, body) = get(&app, "/api/health").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["status"], "degraded");
    assert_eq!(body["data"]["database"]["state"], "failed");
    assert!(body["data"]["database"]["failure"].is_string());

    let (status, body) = get(&app, "/api/kol/total").await;
    assert_eq!(status, StatusCode::SERVICE_UNAVAILABLE);
    assert_eq!(body["success"], false);
}

#[tokio::test]
async fn test_closed_adapter_rejects_queries() {
    let conn = Connection::open(ConnectionConfig::memory_seeded()).await.unwrap();
    let app = app_for(&conn);

    let (status, _) = get(&app, "/api/ads/metrics").await;
    assert_eq!(status, StatusCode::OK);

    conn.close().await;
    let (status, body) = get(&app, "/api/ads/metrics").await;
    assert_eq!(status, StatusCode::SERVICE_UNAVAILABLE);
    assert_eq!(body["details"]["state"], "closed");
}
