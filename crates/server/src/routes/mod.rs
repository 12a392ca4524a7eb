//! API route handlers for the marketlens server.

pub mod ads;
pub mod health;
pub mod insight;
pub mod kol;
pub mod metrics;
pub mod testing;

use std::sync::Arc;

use axum::http::Uri;
use axum::Router;
use marketlens_db::{QueryRequest, ValidationError};

use crate::error::{ApiError, ApiResult};
use crate::state::AppState;

/// Raw query-string pairs, in order. Turned into a `QueryRequest` per handler
/// so page/sort validation errors come back as 400 envelopes.
pub type RawParams = Vec<(String, String)>;

pub(crate) fn parse_request(params: RawParams) -> ApiResult<QueryRequest> {
    Ok(QueryRequest::from_params(params)?)
}

/// Optional `limit` key; absent or non-positive means `default`.
pub(crate) fn limit(req: &QueryRequest, default: u32) -> ApiResult<u32> {
    let Some(raw) = req.filter("limit") else {
        return Ok(default);
    };
    let value: i64 = raw
        .parse()
        .map_err(|_| ValidationError::new("limit", format!("'{raw}' is not an integer")))?;
    Ok(if value <= 0 {
        default
    } else {
        u32::try_from(value).unwrap_or(u32::MAX)
    })
}

async fn unknown_route(uri: Uri) -> ApiError {
    ApiError::not_found("Route", uri.path())
}

/// Create the combined API router with all routes under /api prefix.
///
/// Routes:
/// - GET  /api/health - Liveness, version, uptime, connection state
/// - GET  /api/health/db - Round-trip probe and per-table row counts
/// - GET  /api/metrics - Prometheus text
/// - GET  /api/kol/total - Paginated KOL list (`dataset=total|2024|india`)
/// - POST /api/kol/total/search - Same, JSON body
/// - GET  /api/kol/total/videos - Random YouTube links (`limit=`, `region=`)
/// - GET  /api/kol/total/{id} - One KOL row
/// - GET  /api/kol/total/distribution - Cross-dataset distribution (`type=`)
/// - GET  /api/kol/total/statistics - Per-dataset counts
/// - GET  /api/insight/search - Paginated keyword insights
/// - GET  /api/insight/search/regions - Search volume per region
/// - GET  /api/insight/search/distribution - Keyword distribution (`type=`)
/// - GET  /api/insight/search/languages - Distinct keywords per language
/// - GET  /api/insight/search/suggestions - Suggestions for `keyword=`
/// - GET  /api/ads/campaigns - Paginated campaigns
/// - GET  /api/ads/metrics - Campaign totals and derived rates
/// - GET  /api/ads/platforms - Per-platform totals
/// - GET  /api/testing/ideas - Paginated test ideas
/// - GET  /api/testing/ideas/{id} - One test idea
/// - GET  /api/testing/statistics - Idea counts by status and priority
pub fn api_routes(state: Arc<AppState>) -> Router {
    Router::new()
        .nest("/api", health::router())
        .nest("/api", metrics::router())
        .nest("/api", kol::router())
        .nest("/api", insight::router())
        .nest("/api", ads::router())
        .nest("/api", testing::router())
        .fallback(unknown_route)
        .with_state(state)
}
