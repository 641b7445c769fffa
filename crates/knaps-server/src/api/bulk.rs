//! Bulk create endpoints.
//!
//! Rows are processed in order and independently: a failing row is recorded
//! and the batch carries on. Row numbers are 1-based positions in the input.

use axum::{
    extract::{rejection::JsonRejection, State},
    Extension, Json,
};
use knaps_core::{
    csv_rows,
    validation::{validate_new_deal, validate_new_product},
    Deal, FieldError, Product,
};
use knaps_db::{DbError, Store};
use serde::Serialize;
use serde_json::Value;

use crate::middleware::RequestId;

use super::{json_body, ApiError, ApiResponse, AppState, PRODUCT_CODE_CONFLICT};

#[derive(Debug, Serialize)]
pub(super) struct BulkResult<T: Serialize> {
    pub success: usize,
    pub errors: usize,
    pub created: Vec<T>,
    pub failed: Vec<BulkFailure>,
}

#[derive(Debug, Serialize)]
pub(super) struct BulkFailure {
    pub row: usize,
    pub error: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub details: Option<Vec<FieldError>>,
}

impl<T: Serialize> BulkResult<T> {
    fn new() -> Self {
        Self {
            success: 0,
            errors: 0,
            created: Vec::new(),
            failed: Vec::new(),
        }
    }

    fn record(&mut self, row: usize, outcome: Result<T, BulkFailure>) {
        match outcome {
            Ok(item) => {
                tracing::debug!(row, "bulk row created");
                self.success += 1;
                self.created.push(item);
            }
            Err(failure) => {
                tracing::debug!(row, error = %failure.error, "bulk row failed");
                self.errors += 1;
                self.failed.push(BulkFailure { row, ..failure });
            }
        }
    }
}

impl BulkFailure {
    fn message(error: impl Into<String>) -> Self {
        Self {
            row: 0,
            error: error.into(),
            details: None,
        }
    }

    fn invalid(details: Vec<FieldError>) -> Self {
        Self {
            row: 0,
            error: "Validation failed".to_string(),
            details: Some(details),
        }
    }

    fn from_db(error: &DbError) -> Self {
        match error {
            DbError::DuplicateProductCode(_) => Self::message(PRODUCT_CODE_CONFLICT),
            DbError::ProductNotFound(id) => Self::message(format!("Product {id} not found")),
            DbError::Invalid { field, message } => {
                Self::invalid(vec![FieldError::new(*field, message.clone())])
            }
            DbError::ProductHasLedgerEntries { .. } => Self::message(error.to_string()),
        }
    }
}

fn expect_array(request_id: &str, body: Value) -> Result<Vec<Value>, ApiError> {
    match body {
        Value::Array(rows) => Ok(rows),
        _ => Err(ApiError::new(
            request_id,
            "bad_request",
            "expected a JSON array of rows",
        )),
    }
}

async fn create_products(store: &Store, rows: &[Value]) -> BulkResult<Product> {
    let mut result = BulkResult::new();
    for (index, row) in rows.iter().enumerate() {
        let outcome = match validate_new_product(row) {
            Ok(details) => store
                .create_product(details)
                .await
                .map_err(|e| BulkFailure::from_db(&e)),
            Err(details) => Err(BulkFailure::invalid(details)),
        };
        result.record(index + 1, outcome);
    }
    tracing::info!(
        success = result.success,
        errors = result.errors,
        "bulk product upload finished"
    );
    result
}

/// POST /api/v1/products/bulk: JSON array of product objects.
pub(super) async fn bulk_create_products(
    State(state): State<AppState>,
    Extension(req_id): Extension<RequestId>,
    body: Result<Json<Value>, JsonRejection>,
) -> Result<Json<ApiResponse<BulkResult<Product>>>, ApiError> {
    let rows = expect_array(&req_id.0, json_body(&req_id.0, body)?)?;
    let result = create_products(&state.store, &rows).await;
    Ok(Json(ApiResponse::new(req_id.0, result)))
}

/// POST /api/v1/products/bulk/csv: CSV body with a header row.
pub(super) async fn bulk_create_products_csv(
    State(state): State<AppState>,
    Extension(req_id): Extension<RequestId>,
    body: String,
) -> Result<Json<ApiResponse<BulkResult<Product>>>, ApiError> {
    let rows = csv_rows::parse_product_csv(&body)
        .map_err(|e| ApiError::new(req_id.0.clone(), "bad_request", e.to_string()))?;
    let result = create_products(&state.store, &rows).await;
    Ok(Json(ApiResponse::new(req_id.0, result)))
}

/// POST /api/v1/deals/bulk: JSON array of deal objects.
pub(super) async fn bulk_create_deals(
    State(state): State<AppState>,
    Extension(req_id): Extension<RequestId>,
    body: Result<Json<Value>, JsonRejection>,
) -> Result<Json<ApiResponse<BulkResult<Deal>>>, ApiError> {
    let rows = expect_array(&req_id.0, json_body(&req_id.0, body)?)?;

    let mut result = BulkResult::new();
    for (index, row) in rows.iter().enumerate() {
        let outcome = match validate_new_deal(row) {
            Ok(terms) => state
                .store
                .create_deal(terms)
                .await
                .map_err(|e| BulkFailure::from_db(&e)),
            Err(details) => Err(BulkFailure::invalid(details)),
        };
        result.record(index + 1, outcome);
    }
    tracing::info!(
        success = result.success,
        errors = result.errors,
        "bulk deal upload finished"
    );
    Ok(Json(ApiResponse::new(req_id.0, result)))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn record_numbers_failures_by_input_row() {
        let mut result: BulkResult<u32> = BulkResult::new();
        result.record(1, Ok(10));
        result.record(2, Err(BulkFailure::message(PRODUCT_CODE_CONFLICT)));
        result.record(3, Ok(30));

        assert_eq!(result.success, 2);
        assert_eq!(result.errors, 1);
        assert_eq!(result.created, vec![10, 30]);
        assert_eq!(result.failed.len(), 1);
        assert_eq!(result.failed[0].row, 2);
        assert_eq!(result.failed[0].error, "Product code already exists");
    }

    #[test]
    fn failure_without_details_omits_the_key() {
        let json = serde_json::to_value(BulkFailure {
            row: 4,
            ..BulkFailure::message("Product 9 not found")
        })
        .expect("serialize");
        assert_eq!(json, serde_json::json!({"row": 4, "error": "Product 9 not found"}));
    }

    #[test]
    fn db_errors_become_row_messages() {
        let missing = BulkFailure::from_db(&DbError::ProductNotFound(7));
        assert_eq!(missing.error, "Product 7 not found");

        let inverted = BulkFailure::from_db(&DbError::Invalid {
            field: "end_date",
            message: "must not be before start_date".to_string(),
        });
        assert_eq!(inverted.error, "Validation failed");
        assert_eq!(
            inverted.details.expect("details")[0].path,
            "end_date".to_string()
        );
    }
}
