// crates/server/src/routes/insight.rs
//! Keyword search-insight endpoints.

use std::sync::Arc;

use axum::{
    extract::State,
    routing::get,
    Json, Router,
};
use marketlens_db::{AggregationBucket, InsightSearch, MetricBucket, ValidationError};

use super::{limit, parse_request, RawParams};
use crate::error::ApiResult;
use crate::extract::ApiQuery;
use crate::response::ApiResponse;
use crate::state::AppState;

/// GET /api/insight/search
pub async fn list_insights(
    State(state): State<Arc<AppState>>,
    ApiQuery(params): ApiQuery<RawParams>,
) -> ApiResult<Json<ApiResponse<Vec<InsightSearch>>>> {
    let req = parse_request(params)?;
    let page = state.db.list_insights(&req).await?;
    Ok(Json(ApiResponse::paged(page)))
}

/// GET /api/insight/search/regions - Search volume summed per region.
pub async fn volume_by_region(
    State(state): State<Arc<AppState>>,
    ApiQuery(params): ApiQuery<RawParams>,
) -> ApiResult<Json<ApiResponse<Vec<MetricBucket>>>> {
    let req = parse_request(params)?;
    let buckets = state.db.insight_volume_by_region(&req).await?;
    Ok(Json(ApiResponse::ok(buckets)))
}

/// GET /api/insight/search/distribution?type=region|language|...
pub async fn distribution(
    State(state): State<Arc<AppState>>,
    ApiQuery(params): ApiQuery<RawParams>,
) -> ApiResult<Json<ApiResponse<Vec<AggregationBucket>>>> {
    let req = parse_request(params)?;
    let dimension = req.filter("type").unwrap_or("region").to_owned();
    let buckets = state.db.insight_distribution(&dimension, &req).await?;
    Ok(Json(ApiResponse::ok(buckets)))
}

/// GET /api/insight/search/languages - Distinct keyword count per language.
pub async fn keywords_by_language(
    State(state): State<Arc<AppState>>,
    ApiQuery(params): ApiQuery<RawParams>,
) -> ApiResult<Json<ApiResponse<Vec<AggregationBucket>>>> {
    let req = parse_request(params)?;
    let buckets = state.db.insight_keywords_by_language(&req).await?;
    Ok(Json(ApiResponse::ok(buckets)))
}

/// GET /api/insight/search/suggestions?keyword=&limit=
pub async fn suggestions(
    State(state): State<Arc<AppState>>,
    ApiQuery(params): ApiQuery<RawParams>,
) -> ApiResult<Json<ApiResponse<Vec<String>>>> {
    let req = parse_request(params)?;
    let keyword = req
        .filter("keyword")
        .ok_or_else(|| ValidationError::new("keyword", "is required"))?;
    let limit = limit(&req, 5)?;
    let suggestions = state.db.insight_suggestions(keyword, limit).await?;
    Ok(Json(ApiResponse::ok(suggestions)))
}

/// Create the insight routes router.
pub fn router() -> Router<Arc<AppState>> {
    Router::new()
        .route("/insight/search", get(list_insights))
        .route("/insight/search/regions", get(volume_by_region))
        .route("/insight/search/distribution", get(distribution))
        .route("/insight/search/languages", get(keywords_by_language))
        .route("/insight/search/suggestions", get(suggestions))
}
