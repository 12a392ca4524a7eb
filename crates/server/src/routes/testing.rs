// crates/server/src/routes/testing.rs
//! A/B test idea endpoints.

use std::sync::Arc;

use axum::{
    extract::{Path, State},
    routing::get,
    Json, Router,
};
use marketlens_db::{TestIdea, TestingStatistics};

use super::{parse_request, RawParams};
use crate::error::{ApiError, ApiResult};
use crate::extract::ApiQuery;
use crate::response::ApiResponse;
use crate::state::AppState;

/// GET /api/testing/ideas
pub async fn list_ideas(
    State(state): State<Arc<AppState>>,
    ApiQuery(params): ApiQuery<RawParams>,
) -> ApiResult<Json<ApiResponse<Vec<TestIdea>>>> {
    let req = parse_request(params)?;
    let page = state.db.list_test_ideas(&req).await?;
    Ok(Json(ApiResponse::paged(page)))
}

/// GET /api/testing/ideas/{id}
pub async fn get_idea(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
) -> ApiResult<Json<ApiResponse<TestIdea>>> {
    let idea = state
        .db
        .get_test_idea(&id)
        .await?
        .ok_or_else(|| ApiError::not_found("Test idea", &id))?;
    Ok(Json(ApiResponse::ok(idea)))
}

/// GET /api/testing/statistics
pub async fn statistics(
    State(state): State<Arc<AppState>>,
    ApiQuery(params): ApiQuery<RawParams>,
) -> ApiResult<Json<ApiResponse<TestingStatistics>>> {
    let req = parse_request(params)?;
    let stats = state.db.testing_statistics(&req).await?;
    Ok(Json(ApiResponse::ok(stats)))
}

/// Create the testing routes router.
pub fn router() -> Router<Arc<AppState>> {
    Router::new()
        .route("/testing/ideas", get(list_ideas))
        .route("/testing/ideas/{id}", get(get_idea))
        .route("/testing/statistics", get(statistics))
}
