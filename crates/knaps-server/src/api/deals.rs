use axum::{
    extract::{
        rejection::{JsonRejection, PathRejection, QueryRejection},
        Path, Query, State,
    },
    http::StatusCode,
    Extension, Json,
};
use chrono::NaiveDate;
use knaps_core::{
    validation::{validate_deal_patch, validate_new_deal},
    Deal, DealProvider, DealType, FieldError,
};
use knaps_db::DealFilters;
use serde::Deserialize;
use serde_json::Value;

use crate::middleware::RequestId;

use super::{
    json_body, map_db_error, path_id, query_params, searchable, ApiError, ApiResponse, AppState,
};

#[derive(Debug, Deserialize)]
pub(super) struct DealQuery {
    pub product_id: Option<i64>,
    pub provider: Option<String>,
    pub deal_type: Option<String>,
    pub active_on: Option<String>,
}

#[derive(Debug, Deserialize)]
pub(super) struct DealSearchQuery {
    pub q: Option<String>,
}

fn parse_filter<T>(
    errors: &mut Vec<FieldError>,
    key: &str,
    raw: Option<String>,
    parse: impl Fn(&str) -> Result<T, String>,
) -> Option<T> {
    let raw = raw?;
    match parse(raw.trim()) {
        Ok(parsed) => Some(parsed),
        Err(message) => {
            errors.push(FieldError::new(key, message));
            None
        }
    }
}

impl DealQuery {
    fn into_filters(self) -> Result<DealFilters, Vec<FieldError>> {
        let mut errors = Vec::new();
        let provider = parse_filter(&mut errors, "provider", self.provider, DealProvider::parse);
        let deal_type = parse_filter(&mut errors, "deal_type", self.deal_type, DealType::parse);
        let active_on = parse_filter(&mut errors, "active_on", self.active_on, |raw| {
            NaiveDate::parse_from_str(raw, "%Y-%m-%d")
                .map_err(|_| "must be a date formatted YYYY-MM-DD".to_string())
        });

        if errors.is_empty() {
            Ok(DealFilters {
                product_id: self.product_id,
                provider,
                deal_type,
                active_on,
            })
        } else {
            Err(errors)
        }
    }
}

/// GET /api/v1/deals?product_id=&provider=&deal_type=&active_on=
pub(super) async fn list_deals(
    State(state): State<AppState>,
    Extension(req_id): Extension<RequestId>,
    query: Result<Query<DealQuery>, QueryRejection>,
) -> Result<Json<ApiResponse<Vec<Deal>>>, ApiError> {
    let rid = &req_id.0;
    let filters = query_params(rid, query)?
        .into_filters()
        .map_err(|e| ApiError::validation(rid, e))?;
    let deals = state.store.list_deals(&filters).await;
    Ok(Json(ApiResponse::new(req_id.0, deals)))
}

pub(super) async fn search_deals(
    State(state): State<AppState>,
    Extension(req_id): Extension<RequestId>,
    query: Result<Query<DealSearchQuery>, QueryRejection>,
) -> Result<Json<ApiResponse<Vec<Deal>>>, ApiError> {
    let query = query_params(&req_id.0, query)?;
    let data = match searchable(query.q.as_deref()) {
        Some(q) => state.store.search_deals(q).await,
        None => Vec::new(),
    };
    Ok(Json(ApiResponse::new(req_id.0, data)))
}

pub(super) async fn get_deal(
    State(state): State<AppState>,
    Extension(req_id): Extension<RequestId>,
    id: Result<Path<i64>, PathRejection>,
) -> Result<Json<ApiResponse<Deal>>, ApiError> {
    let id = path_id(&req_id.0, id)?;
    match state.store.get_deal(id).await {
        Some(deal) => Ok(Json(ApiResponse::new(req_id.0, deal))),
        None => Err(ApiError::not_found(req_id.0, "deal", id)),
    }
}

pub(super) async fn create_deal(
    State(state): State<AppState>,
    Extension(req_id): Extension<RequestId>,
    body: Result<Json<Value>, JsonRejection>,
) -> Result<(StatusCode, Json<ApiResponse<Deal>>), ApiError> {
    let rid = &req_id.0;
    let body = json_body(rid, body)?;
    let terms = validate_new_deal(&body).map_err(|e| ApiError::validation(rid, e))?;

    let deal = state
        .store
        .create_deal(terms)
        .await
        .map_err(|e| map_db_error(rid.clone(), &e))?;
    tracing::info!(id = deal.id, product_id = deal.terms.product_id, "deal created");
    Ok((StatusCode::CREATED, Json(ApiResponse::new(req_id.0, deal))))
}

pub(super) async fn update_deal(
    State(state): State<AppState>,
    Extension(req_id): Extension<RequestId>,
    id: Result<Path<i64>, PathRejection>,
    body: Result<Json<Value>, JsonRejection>,
) -> Result<Json<ApiResponse<Deal>>, ApiError> {
    let rid = &req_id.0;
    let id = path_id(rid, id)?;
    let body = json_body(rid, body)?;
    let patch = validate_deal_patch(&body).map_err(|e| ApiError::validation(rid, e))?;

    let deal = state
        .store
        .update_deal(id, &patch)
        .await
        .map_err(|e| map_db_error(rid.clone(), &e))?
        .ok_or_else(|| ApiError::not_found(rid.clone(), "deal", id))?;
    Ok(Json(ApiResponse::new(req_id.0, deal)))
}

pub(super) async fn delete_deal(
    State(state): State<AppState>,
    Extension(req_id): Extension<RequestId>,
    id: Result<Path<i64>, PathRejection>,
) -> Result<StatusCode, ApiError> {
    let id = path_id(&req_id.0, id)?;
    if state.store.delete_deal(id).await {
        Ok(StatusCode::NO_CONTENT)
    } else {
        Err(ApiError::not_found(req_id.0, "deal", id))
    }
}
