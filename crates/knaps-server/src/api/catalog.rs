//! Distributor and brand rollups over the product catalog.

use axum::{
    extract::{rejection::QueryRejection, Query, State},
    Extension, Json,
};
use knaps_db::{BrandSummary, DistributorSummary};
use serde::Deserialize;

use crate::middleware::RequestId;

use super::{query_params, ApiError, ApiResponse, AppState};

#[derive(Debug, Deserialize)]
pub(super) struct BrandQuery {
    pub distributor: Option<String>,
}

pub(super) async fn list_distributors(
    State(state): State<AppState>,
    Extension(req_id): Extension<RequestId>,
) -> Json<ApiResponse<Vec<DistributorSummary>>> {
    Json(ApiResponse::new(
        req_id.0,
        state.store.list_distributors().await,
    ))
}

/// GET /api/v1/brands?distributor=: distributor match ignores case.
pub(super) async fn list_brands(
    State(state): State<AppState>,
    Extension(req_id): Extension<RequestId>,
    query: Result<Query<BrandQuery>, QueryRejection>,
) -> Result<Json<ApiResponse<Vec<BrandSummary>>>, ApiError> {
    let query = query_params(&req_id.0, query)?;
    let distributor = query
        .distributor
        .as_deref()
        .map(str::trim)
        .filter(|d| !d.is_empty());
    let data = state.store.list_brands(distributor).await;
    Ok(Json(ApiResponse::new(req_id.0, data)))
}
