// crates/server/src/routes/kol.rs
//! KOL (creator) endpoints across the three datasets.

use std::sync::Arc;

use axum::{
    extract::{Path, State},
    routing::{get, post},
    Json, Router,
};
use marketlens_db::{
    AggregationBucket, KolDataset, KolRecord, KolStatistics, KolVideo, QueryRequest,
    ValidationError,
};

use super::{limit, parse_request, RawParams};
use crate::error::{ApiError, ApiResult};
use crate::extract::{ApiJson, ApiQuery};
use crate::response::ApiResponse;
use crate::state::AppState;

/// `dataset` rides along as an ordinary filter key; default `total`.
fn dataset(req: &QueryRequest) -> ApiResult<KolDataset> {
    match req.filter("dataset") {
        Some(raw) => Ok(KolDataset::parse(raw)?),
        None => Ok(KolDataset::Total),
    }
}

/// GET /api/kol/total - Paginated KOL list.
pub async fn list_kols(
    State(state): State<Arc<AppState>>,
    ApiQuery(params): ApiQuery<RawParams>,
) -> ApiResult<Json<ApiResponse<Vec<KolRecord>>>> {
    let req = parse_request(params)?;
    let dataset = dataset(&req)?;
    let page = state.db.list_kols(dataset, &req).await?;
    Ok(Json(ApiResponse::paged(page)))
}

/// POST /api/kol/total/search - Same as the list, with the request in a JSON body.
pub async fn search_kols(
    State(state): State<Arc<AppState>>,
    ApiJson(body): ApiJson<serde_json::Value>,
) -> ApiResult<Json<ApiResponse<Vec<KolRecord>>>> {
    let req = QueryRequest::from_json(&body)?;
    let dataset = dataset(&req)?;
    let page = state.db.list_kols(dataset, &req).await?;
    Ok(Json(ApiResponse::paged(page)))
}

/// GET /api/kol/total/{id} - One row by its `No.` key.
pub async fn get_kol(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
    ApiQuery(params): ApiQuery<RawParams>,
) -> ApiResult<Json<ApiResponse<KolRecord>>> {
    let no: i64 = id
        .trim()
        .parse()
        .map_err(|_| ValidationError::new("id", format!("'{id}' is not an integer")))?;
    let req = parse_request(params)?;
    let dataset = dataset(&req)?;

    let record = state
        .db
        .get_kol(dataset, no)
        .await?
        .ok_or_else(|| ApiError::not_found("KOL", no))?;
    Ok(Json(ApiResponse::ok(record)))
}

/// GET /api/kol/total/distribution?type=platform|region - Honors list filters.
pub async fn distribution(
    State(state): State<Arc<AppState>>,
    ApiQuery(params): ApiQuery<RawParams>,
) -> ApiResult<Json<ApiResponse<Vec<AggregationBucket>>>> {
    let req = parse_request(params)?;
    let dimension = req.filter("type").unwrap_or("platform");
    let buckets = state.db.kol_distribution(dimension, &req).await?;
    Ok(Json(ApiResponse::ok(buckets)))
}

/// GET /api/kol/total/videos?limit=&region=
pub async fn videos(
    State(state): State<Arc<AppState>>,
    ApiQuery(params): ApiQuery<RawParams>,
) -> ApiResult<Json<ApiResponse<Vec<KolVideo>>>> {
    let req = parse_request(params)?;
    let limit = limit(&req, 10)?;
    let videos = state.db.kol_videos(limit, req.filter("region")).await?;
    Ok(Json(ApiResponse::ok(videos)))
}

/// GET /api/kol/total/statistics
pub async fn statistics(
    State(state): State<Arc<AppState>>,
) -> ApiResult<Json<ApiResponse<KolStatistics>>> {
    let stats = state.db.kol_statistics().await?;
    Ok(Json(ApiResponse::ok(stats)))
}

/// Create the KOL routes router.
pub fn router() -> Router<Arc<AppState>> {
    Router::new()
        .route("/kol/total", get(list_kols))
        .route("/kol/total/search", post(search_kols))
        .route("/kol/total/distribution", get(distribution))
        .route("/kol/total/statistics", get(statistics))
        .route("/kol/total/videos", get(videos))
        .route("/kol/total/{id}", get(get_kol))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_dataset_defaults_to_total() {
        assert_eq!(dataset(&QueryRequest::default()).unwrap(), KolDataset::Total);
        let req = QueryRequest::default().with_filter("dataset", "india");
        assert_eq!(dataset(&req).unwrap(), KolDataset::India);
    }

    #[test]
    fn test_unknown_dataset_is_validation_error() {
        let req = QueryRequest::default().with_filter("dataset", "2023");
        assert!(matches!(dataset(&req), Err(ApiError::Validation(_))));
    }
}
