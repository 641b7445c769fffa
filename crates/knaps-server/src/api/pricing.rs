use axum::{
    extract::{
        rejection::{JsonRejection, PathRejection, QueryRejection},
        Path, Query, State,
    },
    Extension, Json,
};
use knaps_core::{
    validation::validate_margin_request, FieldError, MarginBreakdown, MarginCalculator,
    MarginRequest, PricingError, ProductPricing, TaxRate,
};
use rust_decimal::Decimal;
use serde::Deserialize;
use serde_json::Value;

use crate::middleware::RequestId;

use super::{json_body, path_id, query_params, ApiError, ApiResponse, AppState};

#[derive(Debug, Deserialize)]
pub(super) struct PricingQuery {
    pub tax_rate: Option<Decimal>,
}

fn pricing_error(request_id: &str, error: &PricingError) -> ApiError {
    ApiError::validation(
        request_id,
        vec![FieldError::new(error.field(), error.to_string())],
    )
}

fn resolve_tax_rate(
    request_id: &str,
    requested: Option<Decimal>,
    default: TaxRate,
) -> Result<TaxRate, ApiError> {
    requested.map_or(Ok(default), |rate| {
        TaxRate::new(rate).map_err(|e| pricing_error(request_id, &e))
    })
}

fn calculate(request: MarginRequest, tax_rate: TaxRate) -> Result<MarginBreakdown, PricingError> {
    let calculator = if request.prices_include_tax {
        MarginCalculator::from_inclusive(tax_rate, request.sell_price, request.cost_price)?
    } else {
        MarginCalculator::from_exclusive(tax_rate, request.sell_price, request.cost_price)?
    };
    let calculator = match request.edit {
        Some(edit) => calculator.apply(edit)?,
        None => calculator,
    };
    calculator.breakdown()
}

/// POST /api/v1/pricing/margin: stateless margin calculator.
pub(super) async fn margin(
    State(state): State<AppState>,
    Extension(req_id): Extension<RequestId>,
    body: Result<Json<Value>, JsonRejection>,
) -> Result<Json<ApiResponse<MarginBreakdown>>, ApiError> {
    let rid = &req_id.0;
    let body = json_body(rid, body)?;
    let request = validate_margin_request(&body).map_err(|e| ApiError::validation(rid, e))?;
    let tax_rate = resolve_tax_rate(rid, request.tax_rate, state.default_tax_rate)?;
    let breakdown = calculate(request, tax_rate).map_err(|e| pricing_error(rid, &e))?;
    Ok(Json(ApiResponse::new(req_id.0, breakdown)))
}

/// GET /api/v1/products/{id}/pricing: latest levels and their margins.
pub(super) async fn product_pricing(
    State(state): State<AppState>,
    Extension(req_id): Extension<RequestId>,
    id: Result<Path<i64>, PathRejection>,
    query: Result<Query<PricingQuery>, QueryRejection>,
) -> Result<Json<ApiResponse<ProductPricing>>, ApiError> {
    let rid = &req_id.0;
    let product_id = path_id(rid, id)?;
    let query = query_params(rid, query)?;
    let tax_rate = resolve_tax_rate(rid, query.tax_rate, state.default_tax_rate)?;

    if state.store.get_product(product_id).await.is_none() {
        return Err(ApiError::not_found(rid.clone(), "product", product_id));
    }
    let levels = state.store.list_price_levels(product_id).await;
    let pricing = ProductPricing::from_levels(&levels, tax_rate).map_err(|e| {
        tracing::error!(product_id, error = %e, "stored price levels could not be priced");
        ApiError::new(rid.clone(), "internal_error", "pricing calculation failed")
    })?;
    Ok(Json(ApiResponse::new(req_id.0, pricing)))
}
