// crates/server/src/lib.rs
//! marketlens server library.
//!
//! Axum HTTP layer over `marketlens-db`: request parsing, envelopes, error
//! mapping, health and metrics.

pub mod config;
pub mod error;
pub mod extract;
pub mod logging;
pub mod metrics;
pub mod response;
pub mod routes;
pub mod state;

pub use error::*;
pub use response::ApiResponse;
pub use routes::api_routes;
pub use state::AppState;

use std::sync::Arc;

use axum::{middleware, Router};
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;

/// Create the Axum application with all routes and middleware.
///
/// This sets up:
/// - API routes under `/api`
/// - CORS (allows any origin; the dashboard is served from another origin)
/// - Per-request metrics and tracing
pub fn create_app(state: Arc<AppState>) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    api_routes(state)
        .layer(middleware::from_fn(metrics::track_requests))
        .layer(cors)
        .layer(TraceLayer::new_for_http())
}

// ============================================================================
// Integration Tests
// ============================================================================
