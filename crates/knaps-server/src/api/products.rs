use axum::{
    extract::{
        rejection::{JsonRejection, PathRejection, QueryRejection},
        Path, Query, State,
    },
    http::{header, StatusCode},
    response::IntoResponse,
    Extension, Json,
};
use knaps_core::{
    csv_rows,
    validation::{validate_new_product, validate_product_patch},
    Product,
};
use knaps_db::ProductFilters;
use serde::Deserialize;
use serde_json::Value;

use crate::middleware::RequestId;

use super::{
    json_body, map_db_error, normalize_limit, path_id, query_params, searchable, ApiError,
    ApiResponse, AppState,
};

#[derive(Debug, Deserialize)]
pub(super) struct SearchQuery {
    pub q: Option<String>,
}

#[derive(Debug, Deserialize)]
pub(super) struct CoreRangeQuery {
    pub distributor: Option<String>,
    pub brand: Option<String>,
    /// Comma-separated group names.
    pub core_groups: Option<String>,
    pub limit: Option<usize>,
    pub offset: Option<usize>,
}

impl CoreRangeQuery {
    fn filters(&self) -> ProductFilters {
        ProductFilters {
            distributor: self.distributor.clone().filter(|d| !d.is_empty()),
            brand: self.brand.clone().filter(|b| !b.is_empty()),
            core_groups: self
                .core_groups
                .as_deref()
                .unwrap_or_default()
                .split(',')
                .map(str::trim)
                .filter(|g| !g.is_empty())
                .map(str::to_string)
                .collect(),
        }
    }
}

pub(super) async fn list_products(
    State(state): State<AppState>,
    Extension(req_id): Extension<RequestId>,
) -> Json<ApiResponse<Vec<Product>>> {
    Json(ApiResponse::new(req_id.0, state.store.list_products().await))
}

/// GET /api/v1/products/core-range: filtered listing, one page at a time.
pub(super) async fn core_range_products(
    State(state): State<AppState>,
    Extension(req_id): Extension<RequestId>,
    query: Result<Query<CoreRangeQuery>, QueryRejection>,
) -> Result<Json<ApiResponse<Vec<Product>>>, ApiError> {
    let query = query_params(&req_id.0, query)?;
    let data = state
        .store
        .filter_products(&query.filters())
        .await
        .into_iter()
        .skip(query.offset.unwrap_or(0))
        .take(normalize_limit(query.limit))
        .collect();
    Ok(Json(ApiResponse::new(req_id.0, data)))
}

/// GET /api/v1/products/search?q=: empty for terms under two characters.
pub(super) async fn search_products(
    State(state): State<AppState>,
    Extension(req_id): Extension<RequestId>,
    query: Result<Query<SearchQuery>, QueryRejection>,
) -> Result<Json<ApiResponse<Vec<Product>>>, ApiError> {
    let query = query_params(&req_id.0, query)?;
    let data = match searchable(query.q.as_deref()) {
        Some(q) => state.store.search_products(q).await,
        None => Vec::new(),
    };
    Ok(Json(ApiResponse::new(req_id.0, data)))
}

pub(super) async fn get_product(
    State(state): State<AppState>,
    Extension(req_id): Extension<RequestId>,
    id: Result<Path<i64>, PathRejection>,
) -> Result<Json<ApiResponse<Product>>, ApiError> {
    let id = path_id(&req_id.0, id)?;
    let product = state
        .store
        .get_product(id)
        .await
        .ok_or_else(|| ApiError::not_found(req_id.0.clone(), "product", id))?;
    Ok(Json(ApiResponse::new(req_id.0, product)))
}

pub(super) async fn create_product(
    State(state): State<AppState>,
    Extension(req_id): Extension<RequestId>,
    body: Result<Json<Value>, JsonRejection>,
) -> Result<(StatusCode, Json<ApiResponse<Product>>), ApiError> {
    let rid = &req_id.0;
    let body = json_body(rid, body)?;
    let details = validate_new_product(&body).map_err(|e| ApiError::validation(rid, e))?;

    let product = state
        .store
        .create_product(details)
        .await
        .map_err(|e| map_db_error(rid.clone(), &e))?;

    tracing::info!(id = product.id, product_code = %product.details.product_code, "product created");
    Ok((
        StatusCode::CREATED,
        Json(ApiResponse::new(req_id.0, product)),
    ))
}

/// PUT /api/v1/products/{id}: merge the supplied fields into the product.
pub(super) async fn update_product(
    State(state): State<AppState>,
    Extension(req_id): Extension<RequestId>,
    id: Result<Path<i64>, PathRejection>,
    body: Result<Json<Value>, JsonRejection>,
) -> Result<Json<ApiResponse<Product>>, ApiError> {
    let rid = &req_id.0;
    let id = path_id(rid, id)?;
    let body = json_body(rid, body)?;
    let patch = validate_product_patch(&body).map_err(|e| ApiError::validation(rid, e))?;

    let product = state
        .store
        .update_product(id, &patch)
        .await
        .map_err(|e| map_db_error(rid.clone(), &e))?
        .ok_or_else(|| ApiError::not_found(rid.clone(), "product", id))?;
    Ok(Json(ApiResponse::new(req_id.0, product)))
}

pub(super) async fn delete_product(
    State(state): State<AppState>,
    Extension(req_id): Extension<RequestId>,
    id: Result<Path<i64>, PathRejection>,
) -> Result<StatusCode, ApiError> {
    let rid = &req_id.0;
    let id = path_id(rid, id)?;
    let removed = state
        .store
        .delete_product(id)
        .await
        .map_err(|e| map_db_error(rid.clone(), &e))?;
    if removed {
        tracing::info!(id, "product deleted");
        Ok(StatusCode::NO_CONTENT)
    } else {
        Err(ApiError::not_found(rid.clone(), "product", id))
    }
}

pub(super) async fn product_template_csv() -> impl IntoResponse {
    csv_response("products-template.csv", csv_rows::template())
}

pub(super) async fn export_products_csv(
    State(state): State<AppState>,
    Extension(req_id): Extension<RequestId>,
) -> Result<impl IntoResponse, ApiError> {
    let products = state.store.list_products().await;
    let body = csv_rows::export_products(&products).map_err(|e| {
        tracing::error!(error = %e, "product export failed");
        ApiError::new(req_id.0.clone(), "internal_error", "product export failed")
    })?;
    Ok(csv_response("products.csv", body))
}

fn csv_response(filename: &str, body: String) -> impl IntoResponse {
    (
        [
            (header::CONTENT_TYPE, "text/csv; charset=utf-8".to_string()),
            (
                header::CONTENT_DISPOSITION,
                format!("attachment; filename=\"{filename}\""),
            ),
        ],
        body,
    )
}
