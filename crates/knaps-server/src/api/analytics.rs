use axum::{
    extract::{rejection::QueryRejection, Query, State},
    Extension, Json,
};
use knaps_core::{OverallAnalytics, ProductAnalytics};
use serde::Deserialize;

use crate::middleware::RequestId;

use super::{month_filter, query_params, ApiError, ApiResponse, AppState};

#[derive(Debug, Deserialize)]
pub(super) struct ProductAnalyticsQuery {
    pub product_id: Option<i64>,
    pub month: Option<String>,
}

#[derive(Debug, Deserialize)]
pub(super) struct OverallAnalyticsQuery {
    pub month: Option<String>,
}

/// GET /api/v1/analytics/products?product_id=&month=: highest revenue first.
pub(super) async fn product_analytics(
    State(state): State<AppState>,
    Extension(req_id): Extension<RequestId>,
    query: Result<Query<ProductAnalyticsQuery>, QueryRejection>,
) -> Result<Json<ApiResponse<Vec<ProductAnalytics>>>, ApiError> {
    let rid = &req_id.0;
    let query = query_params(rid, query)?;
    let month = month_filter(rid, query.month)?;
    let data = state
        .store
        .product_analytics(query.product_id, month.as_deref())
        .await;
    Ok(Json(ApiResponse::new(req_id.0, data)))
}

/// GET /api/v1/analytics/overall?month=
pub(super) async fn overall_analytics(
    State(state): State<AppState>,
    Extension(req_id): Extension<RequestId>,
    query: Result<Query<OverallAnalyticsQuery>, QueryRejection>,
) -> Result<Json<ApiResponse<OverallAnalytics>>, ApiError> {
    let rid = &req_id.0;
    let query = query_params(rid, query)?;
    let month = month_filter(rid, query.month)?;
    let data = state.store.overall_analytics(month.as_deref()).await;
    Ok(Json(ApiResponse::new(req_id.0, data)))
}
