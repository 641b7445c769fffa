//! Sell-in and sell-through ledgers: append and list only.

use axum::{
    extract::{
        rejection::{JsonRejection, QueryRejection},
        Query, State,
    },
    http::StatusCode,
    Extension, Json,
};
use knaps_core::{
    validation::{validate_new_sell_in, validate_new_sell_through},
    SellIn, SellThrough,
};
use knaps_db::LedgerFilters;
use serde::Deserialize;
use serde_json::Value;

use crate::middleware::RequestId;

use super::{json_body, map_db_error, month_filter, query_params, ApiError, ApiResponse, AppState};

#[derive(Debug, Deserialize)]
pub(super) struct LedgerQuery {
    pub product_id: Option<i64>,
    pub month: Option<String>,
}

fn ledger_filters(
    request_id: &str,
    query: Result<Query<LedgerQuery>, QueryRejection>,
) -> Result<LedgerFilters, ApiError> {
    let query = query_params(request_id, query)?;
    Ok(LedgerFilters {
        product_id: query.product_id,
        month: month_filter(request_id, query.month)?,
    })
}

pub(super) async fn list_sell_ins(
    State(state): State<AppState>,
    Extension(req_id): Extension<RequestId>,
    query: Result<Query<LedgerQuery>, QueryRejection>,
) -> Result<Json<ApiResponse<Vec<SellIn>>>, ApiError> {
    let filters = ledger_filters(&req_id.0, query)?;
    let rows = state.store.list_sell_ins(&filters).await;
    Ok(Json(ApiResponse::new(req_id.0, rows)))
}

pub(super) async fn create_sell_in(
    State(state): State<AppState>,
    Extension(req_id): Extension<RequestId>,
    body: Result<Json<Value>, JsonRejection>,
) -> Result<(StatusCode, Json<ApiResponse<SellIn>>), ApiError> {
    let rid = &req_id.0;
    let body = json_body(rid, body)?;
    let entry = validate_new_sell_in(&body).map_err(|e| ApiError::validation(rid, e))?;
    let row = state
        .store
        .create_sell_in(entry)
        .await
        .map_err(|e| map_db_error(rid.clone(), &e))?;
    Ok((StatusCode::CREATED, Json(ApiResponse::new(req_id.0, row))))
}

pub(super) async fn list_sell_throughs(
    State(state): State<AppState>,
    Extension(req_id): Extension<RequestId>,
    query: Result<Query<LedgerQuery>, QueryRejection>,
) -> Result<Json<ApiResponse<Vec<SellThrough>>>, ApiError> {
    let filters = ledger_filters(&req_id.0, query)?;
    let rows = state.store.list_sell_throughs(&filters).await;
    Ok(Json(ApiResponse::new(req_id.0, rows)))
}

pub(super) async fn create_sell_through(
    State(state): State<AppState>,
    Extension(req_id): Extension<RequestId>,
    body: Result<Json<Value>, JsonRejection>,
) -> Result<(StatusCode, Json<ApiResponse<SellThrough>>), ApiError> {
    let rid = &req_id.0;
    let body = json_body(rid, body)?;
    let entry = validate_new_sell_through(&body).map_err(|e| ApiError::validation(rid, e))?;
    let row = state
        .store
        .create_sell_through(entry)
        .await
        .map_err(|e| map_db_error(rid.clone(), &e))?;
    Ok((StatusCode::CREATED, Json(ApiResponse::new(req_id.0, row))))
}
