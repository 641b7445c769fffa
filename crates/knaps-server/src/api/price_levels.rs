use axum::{
    extract::{
        rejection::{JsonRejection, PathRejection},
        Path, State,
    },
    http::StatusCode,
    Extension, Json,
};
use knaps_core::{
    validation::{validate_new_price_level, validate_price_level_patch},
    PriceLevel,
};
use serde_json::Value;

use crate::middleware::RequestId;

use super::{json_body, map_db_error, path_id, ApiError, ApiResponse, AppState};

/// GET /api/v1/products/{id}/price-levels: every row, oldest first.
pub(super) async fn list_price_levels(
    State(state): State<AppState>,
    Extension(req_id): Extension<RequestId>,
    id: Result<Path<i64>, PathRejection>,
) -> Result<Json<ApiResponse<Vec<PriceLevel>>>, ApiError> {
    let product_id = path_id(&req_id.0, id)?;
    if state.store.get_product(product_id).await.is_none() {
        return Err(ApiError::not_found(req_id.0, "product", product_id));
    }
    let levels = state.store.list_price_levels(product_id).await;
    Ok(Json(ApiResponse::new(req_id.0, levels)))
}

pub(super) async fn create_price_level(
    State(state): State<AppState>,
    Extension(req_id): Extension<RequestId>,
    id: Result<Path<i64>, PathRejection>,
    body: Result<Json<Value>, JsonRejection>,
) -> Result<(StatusCode, Json<ApiResponse<PriceLevel>>), ApiError> {
    let rid = &req_id.0;
    let product_id = path_id(rid, id)?;
    let body = json_body(rid, body)?;
    let details =
        validate_new_price_level(product_id, &body).map_err(|e| ApiError::validation(rid, e))?;

    let level = state
        .store
        .create_price_level(details)
        .await
        .map_err(|e| map_db_error(rid.clone(), &e))?;
    Ok((
        StatusCode::CREATED,
        Json(ApiResponse::new(req_id.0, level)),
    ))
}

pub(super) async fn update_price_level(
    State(state): State<AppState>,
    Extension(req_id): Extension<RequestId>,
    id: Result<Path<i64>, PathRejection>,
    body: Result<Json<Value>, JsonRejection>,
) -> Result<Json<ApiResponse<PriceLevel>>, ApiError> {
    let rid = &req_id.0;
    let id = path_id(rid, id)?;
    let body = json_body(rid, body)?;
    let patch = validate_price_level_patch(&body).map_err(|e| ApiError::validation(rid, e))?;

    let level = state
        .store
        .update_price_level(id, &patch)
        .await
        .ok_or_else(|| ApiError::not_found(rid.clone(), "price level", id))?;
    Ok(Json(ApiResponse::new(req_id.0, level)))
}

pub(super) async fn delete_price_level(
    State(state): State<AppState>,
    Extension(req_id): Extension<RequestId>,
    id: Result<Path<i64>, PathRejection>,
) -> Result<StatusCode, ApiError> {
    let id = path_id(&req_id.0, id)?;
    if state.store.delete_price_level(id).await {
        Ok(StatusCode::NO_CONTENT)
    } else {
        Err(ApiError::not_found(req_id.0, "price level", id))
    }
}
