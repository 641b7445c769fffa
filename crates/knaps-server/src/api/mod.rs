mod analytics;
mod bulk;
mod catalog;
mod deals;
mod ledger;
mod price_levels;
mod pricing;
mod products;

use axum::{
    extract::{
        rejection::{JsonRejection, PathRejection, QueryRejection},
        Path, Query, State,
    },
    http::{header, HeaderName, Method, StatusCode},
    response::IntoResponse,
    routing::{get, post, put},
    Extension, Json, Router,
};
use chrono::{DateTime, Utc};
use knaps_core::{validation, FieldError, TaxRate};
use knaps_db::{DbError, Store};
use serde::{de::DeserializeOwned, Serialize};
use tower::ServiceBuilder;
use tower_http::{cors::CorsLayer, trace::TraceLayer};

use crate::middleware::{
    enforce_rate_limit, request_id, require_bearer_auth, AuthState, RateLimitState, RequestId,
};

#[derive(Clone)]
pub struct AppState {
    pub store: Store,
    pub default_tax_rate: TaxRate,
}

#[derive(Debug, Serialize)]
pub struct ApiResponse<T: Serialize> {
    pub data: T,
    pub meta: ResponseMeta,
}

#[derive(Debug, Serialize)]
pub struct ResponseMeta {
    pub request_id: String,
    pub timestamp: DateTime<Utc>,
}

#[derive(Debug, Serialize)]
pub struct ApiError {
    pub error: ErrorBody,
    pub meta: ResponseMeta,
}

#[derive(Debug, Serialize)]
pub struct ErrorBody {
    pub code: String,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub details: Option<Vec<FieldError>>,
}

#[derive(Debug, Serialize, PartialEq, Eq)]
struct HealthData {
    status: &'static str,
    products: usize,
}

impl ResponseMeta {
    pub(super) fn new(request_id: String) -> Self {
        Self {
            request_id,
            timestamp: Utc::now(),
        }
    }
}

impl<T: Serialize> ApiResponse<T> {
    pub(super) fn new(request_id: String, data: T) -> Self {
        Self {
            data,
            meta: ResponseMeta::new(request_id),
        }
    }
}

impl ApiError {
    pub fn new(
        request_id: impl Into<String>,
        code: impl Into<String>,
        message: impl Into<String>,
    ) -> Self {
        Self {
            error: ErrorBody {
                code: code.into(),
                message: message.into(),
                details: None,
            },
            meta: ResponseMeta::new(request_id.into()),
        }
    }

    /// A `validation_error` carrying every field error.
    pub fn validation(request_id: impl Into<String>, details: Vec<FieldError>) -> Self {
        let mut error = Self::new(
            request_id,
            "validation_error",
            format!("validation failed: {}", validation::describe(&details)),
        );
        error.error.details = Some(details);
        error
    }

    pub fn not_found(request_id: impl Into<String>, what: &str, id: i64) -> Self {
        Self::new(request_id, "not_found", format!("{what} {id} not found"))
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> axum::response::Response {
        let status = match self.error.code.as_str() {
            "not_found" => StatusCode::NOT_FOUND,
            "unauthorized" => StatusCode::UNAUTHORIZED,
            "bad_request" | "validation_error" | "conflict" => StatusCode::BAD_REQUEST,
            "rate_limited" => StatusCode::TOO_MANY_REQUESTS,
            _ => StatusCode::INTERNAL_SERVER_ERROR,
        };
        (status, Json(self)).into_response()
    }
}

pub(super) const PRODUCT_CODE_CONFLICT: &str = "Product code already exists";

pub(super) fn map_db_error(request_id: String, error: &DbError) -> ApiError {
    match error {
        DbError::DuplicateProductCode(code) => {
            tracing::warn!(product_code = %code, "rejected duplicate product code");
            ApiError::new(request_id, "conflict", PRODUCT_CODE_CONFLICT)
        }
        DbError::ProductNotFound(id) => ApiError::not_found(request_id, "product", *id),
        DbError::ProductHasLedgerEntries { .. } => {
            tracing::warn!(error = %error, "rejected product delete");
            ApiError::new(request_id, "conflict", error.to_string())
        }
        DbError::Invalid { field, message } => {
            ApiError::validation(request_id, vec![FieldError::new(*field, message.clone())])
        }
    }
}

/// Unwrap a JSON body, keeping rejections inside the error envelope.
///
/// Syntax errors are `bad_request`; well-formed JSON of the wrong shape is a
/// `validation_error`.
pub(super) fn json_body<T>(
    request_id: &str,
    body: Result<Json<T>, JsonRejection>,
) -> Result<T, ApiError> {
    match body {
        Ok(Json(value)) => Ok(value),
        Err(JsonRejection::JsonDataError(e)) => {
            Err(ApiError::new(request_id, "validation_error", e.body_text()))
        }
        Err(e) => Err(ApiError::new(request_id, "bad_request", e.body_text())),
    }
}

pub(super) fn query_params<T: DeserializeOwned>(
    request_id: &str,
    query: Result<Query<T>, QueryRejection>,
) -> Result<T, ApiError> {
    query
        .map(|Query(params)| params)
        .map_err(|e| ApiError::new(request_id, "bad_request", e.body_text()))
}

pub(super) fn path_id(
    request_id: &str,
    path: Result<Path<i64>, PathRejection>,
) -> Result<i64, ApiError> {
    path.map(|Path(id)| id)
        .map_err(|e| ApiError::new(request_id, "bad_request", e.body_text()))
}

/// Validate an optional `month` filter as `YYYY-MM`.
pub(super) fn month_filter(
    request_id: &str,
    month: Option<String>,
) -> Result<Option<String>, ApiError> {
    match month {
        Some(m) if !knaps_core::is_valid_month_partition(&m) => Err(ApiError::validation(
            request_id,
            vec![FieldError::new("month", "must be a month formatted YYYY-MM")],
        )),
        other => Ok(other),
    }
}

/// Search terms shorter than two characters return nothing. The term is
/// matched as sent, spaces included.
pub(super) fn searchable(query: Option<&str>) -> Option<&str> {
    query.filter(|q| q.chars().count() >= 2)
}

pub(super) fn normalize_limit(limit: Option<usize>) -> usize {
    limit.unwrap_or(50).clamp(1, 200)
}

fn build_cors() -> CorsLayer {
    CorsLayer::new()
        .allow_origin(tower_http::cors::Any)
        .allow_methods([Method::GET, Method::POST, Method::PUT, Method::DELETE])
        .allow_headers([
            header::CONTENT_TYPE,
            header::AUTHORIZATION,
            HeaderName::from_static("x-request-id"),
        ])
}

fn protected_router(auth: AuthState, rate_limit: RateLimitState) -> Router<AppState> {
    Router::new()
        .route(
            "/api/v1/products",
            get(products::list_products).post(products::create_product),
        )
        .route("/api/v1/products/search", get(products::search_products))
        .route(
            "/api/v1/products/core-range",
            get(products::core_range_products),
        )
        .route("/api/v1/products/bulk", post(bulk::bulk_create_products))
        .route(
            "/api/v1/products/bulk/csv",
            post(bulk::bulk_create_products_csv),
        )
        .route(
            "/api/v1/products/template.csv",
            get(products::product_template_csv),
        )
        .route(
            "/api/v1/products/export.csv",
            get(products::export_products_csv),
        )
        .route(
            "/api/v1/products/{id}",
            get(products::get_product)
                .put(products::update_product)
                .delete(products::delete_product),
        )
        .route(
            "/api/v1/products/{id}/price-levels",
            get(price_levels::list_price_levels).post(price_levels::create_price_level),
        )
        .route(
            "/api/v1/products/{id}/pricing",
            get(pricing::product_pricing),
        )
        .route(
            "/api/v1/price-levels/{id}",
            put(price_levels::update_price_level).delete(price_levels::delete_price_level),
        )
        .route(
            "/api/v1/deals",
            get(deals::list_deals).post(deals::create_deal),
        )
        .route("/api/v1/deals/search", get(deals::search_deals))
        .route("/api/v1/deals/bulk", post(bulk::bulk_create_deals))
        .route(
            "/api/v1/deals/{id}",
            get(deals::get_deal)
                .put(deals::update_deal)
                .delete(deals::delete_deal),
        )
        .route(
            "/api/v1/sell-ins",
            get(ledger::list_sell_ins).post(ledger::create_sell_in),
        )
        .route(
            "/api/v1/sell-throughs",
            get(ledger::list_sell_throughs).post(ledger::create_sell_through),
        )
        .route(
            "/api/v1/analytics/products",
            get(analytics::product_analytics),
        )
        .route(
            "/api/v1/analytics/overall",
            get(analytics::overall_analytics),
        )
        .route("/api/v1/distributors", get(catalog::list_distributors))
        .route("/api/v1/brands", get(catalog::list_brands))
        .route("/api/v1/pricing/margin", post(pricing::margin))
        .layer(
            ServiceBuilder::new()
                .layer(axum::middleware::from_fn_with_state(
                    rate_limit,
                    enforce_rate_limit,
                ))
                .layer(axum::middleware::from_fn_with_state(
                    auth,
                    require_bearer_auth,
                )),
        )
}

pub fn build_app(state: AppState, auth: AuthState, rate_limit: RateLimitState) -> Router {
    let public_routes = Router::new().route("/api/v1/health", get(health));

    Router::new()
        .merge(public_routes)
        .merge(protected_router(auth, rate_limit))
        .layer(
            ServiceBuilder::new()
                .layer(TraceLayer::new_for_http())
                .layer(build_cors())
                .layer(axum::middleware::from_fn(request_id)),
        )
        .with_state(state)
}

async fn health(
    State(state): State<AppState>,
    Extension(req_id): Extension<RequestId>,
) -> Json<ApiResponse<HealthData>> {
    Json(ApiResponse::new(
        req_id.0,
        HealthData {
            status: "ok",
            products: state.store.product_count().await,
        },
    ))
}

#[cfg(test)]
mod tests;
