// crates/server/src/response.rs
//! Success envelopes shared by every route.

use chrono::{SecondsFormat, Utc};
use marketlens_db::{PaginatedResult, Pagination};
use serde::Serialize;

/// RFC 3339 UTC timestamp stamped on every envelope.
pub(crate) fn now_rfc3339() -> String {
    Utc::now().to_rfc3339_opts(SecondsFormat::Millis, true)
}

/// `{ "success": true, "data": ..., "pagination"?: {...}, "timestamp": ... }`
#[derive(Debug, Serialize)]
pub struct ApiResponse<T> {
    pub success: bool,
    pub data: T,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub pagination: Option<Pagination>,
    pub timestamp: String,
}

impl<T> ApiResponse<T> {
    pub fn ok(data: T) -> Self {
        Self {
            success: true,
            data,
            pagination: None,
            timestamp: now_rfc3339(),
        }
    }
}

impl<T> ApiResponse<Vec<T>> {
    /// Split a page into the `data` array and its `pagination` block.
    pub fn paged(result: PaginatedResult<T>) -> Self {
        let pagination = result.pagination();
        Self {
            success: true,
            data: result.data,
            pagination: Some(pagination),
            timestamp: now_rfc3339(),
        }
    }
}
