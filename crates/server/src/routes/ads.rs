// crates/server/src/routes/ads.rs
//! Ad campaign endpoints.

use std::sync::Arc;

use axum::{
    extract::State,
    routing::get,
    Json, Router,
};
use marketlens_db::{AdCampaign, AdMetrics, PlatformMetrics};

use super::{parse_request, RawParams};
use crate::error::ApiResult;
use crate::extract::ApiQuery;
use crate::response::ApiResponse;
use crate::state::AppState;

/// GET /api/ads/campaigns
pub async fn list_campaigns(
    State(state): State<Arc<AppState>>,
    ApiQuery(params): ApiQuery<RawParams>,
) -> ApiResult<Json<ApiResponse<Vec<AdCampaign>>>> {
    let req = parse_request(params)?;
    let page = state.db.list_campaigns(&req).await?;
    Ok(Json(ApiResponse::paged(page)))
}

/// GET /api/ads/metrics - Totals plus CTR/CPC/CPM derived from the sums.
pub async fn metrics(
    State(state): State<Arc<AppState>>,
    ApiQuery(params): ApiQuery<RawParams>,
) -> ApiResult<Json<ApiResponse<AdMetrics>>> {
    let req = parse_request(params)?;
    let totals = state.db.ad_metrics(&req).await?;
    Ok(Json(ApiResponse::ok(totals)))
}

/// GET /api/ads/platforms
pub async fn platforms(
    State(state): State<Arc<AppState>>,
    ApiQuery(params): ApiQuery<RawParams>,
) -> ApiResult<Json<ApiResponse<Vec<PlatformMetrics>>>> {
    let req = parse_request(params)?;
    let rows = state.db.platform_metrics(&req).await?;
    Ok(Json(ApiResponse::ok(rows)))
}

/// Create the ads routes router.
pub fn router() -> Router<Arc<AppState>> {
    Router::new()
        .route("/ads/campaigns", get(list_campaigns))
        .route("/ads/metrics", get(metrics))
        .route("/ads/platforms", get(platforms))
}
