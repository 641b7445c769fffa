use std::time::Duration;

use axum::{
    body::{to_bytes, Body},
    http::{header, Request, StatusCode},
    response::IntoResponse,
    Router,
};
use knaps_core::TaxRate;
use knaps_db::Store;
use rust_decimal::Decimal;
use serde_json::{json, Value};
use tower::ServiceExt;

use super::*;
use crate::middleware::{AuthState, RateLimitState};

fn test_state() -> AppState {
    AppState {
        store: Store::new(),
        default_tax_rate: TaxRate::new(Decimal::TEN).expect("tax rate"),
    }
}

fn generous_limit() -> RateLimitState {
    RateLimitState::new(1_000, Duration::from_secs(60))
}

fn test_app() -> Router {
    build_app(test_state(), AuthState::disabled(), generous_limit())
}

fn product_body(code: &str) -> Value {
    json!({
        "distributor_name": "Acme Distribution",
        "brand_name": "Vista",
        "product_code": code,
        "product_name": format!("Television {code}"),
        "category_name": "Televisions",
        "trade": "500.00",
        "rrp": "899.00"
    })
}

fn dec(raw: &str) -> Decimal {
    raw.parse().expect("decimal literal")
}

async fn send(app: &Router, method: &str, uri: &str, body: Option<Value>) -> (StatusCode, Value) {
    let builder = Request::builder().method(method).uri(uri);
    let request = match body {
        Some(body) => builder
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from(body.to_string())),
        None => builder.body(Body::empty()),
    }
    .expect("request");

    let response = app.clone().oneshot(request).await.expect("response");
    let status = response.status();
    let bytes = to_bytes(response.into_body(), usize::MAX)
        .await
        .expect("body bytes");
    let json = if bytes.is_empty() {
        Value::Null
    } else {
        serde_json::from_slice(&bytes).expect("json parse")
    };
    (status, json)
}

async fn create_product(app: &Router, code: &str) -> i64 {
    let (status, json) = send(app, "POST", "/api/v1/products", Some(product_body(code))).await;
    assert_eq!(status, StatusCode::CREATED, "{json}");
    json["data"]["id"].as_i64().expect("product id")
}

#[test]
fn api_error_codes_map_to_statuses() {
    let cases = [
        ("validation_error", StatusCode::BAD_REQUEST),
        ("bad_request", StatusCode::BAD_REQUEST),
        ("conflict", StatusCode::BAD_REQUEST),
        ("not_found", StatusCode::NOT_FOUND),
        ("unauthorized", StatusCode::UNAUTHORIZED),
        ("rate_limited", StatusCode::TOO_MANY_REQUESTS),
        ("internal_error", StatusCode::INTERNAL_SERVER_ERROR),
    ];
    for (code, status) in cases {
        let response = ApiError::new("req-1", code, "message").into_response();
        assert_eq!(response.status(), status, "{code}");
    }
}

#[test]
fn month_filter_accepts_only_year_month() {
    assert_eq!(
        month_filter("req", Some("2024-03".to_string())).expect("valid"),
        Some("2024-03".to_string())
    );
    assert_eq!(month_filter("req", None).expect("absent"), None);
    for bad in ["2024-3", "2024-13", "2024-03-01", "March"] {
        assert!(month_filter("req", Some(bad.to_string())).is_err(), "{bad}");
    }
}

#[test]
fn searchable_requires_two_characters() {
    assert_eq!(searchable(Some("t")), None);
    assert_eq!(searchable(Some(" ")), None);
    assert_eq!(searchable(Some(" t")), Some(" t"));
    assert_eq!(searchable(None), None);
    assert_eq!(searchable(Some("tv")), Some("tv"));
}

#[test]
fn normalize_limit_applies_defaults_and_bounds() {
    assert_eq!(normalize_limit(None), 50);
    assert_eq!(normalize_limit(Some(0)), 1);
    assert_eq!(normalize_limit(Some(25)), 25);
    assert_eq!(normalize_limit(Some(1_000)), 200);
}

#[tokio::test]
async fn health_is_public_and_reports_product_count() {
    let auth = AuthState::from_keys(&["secret".to_string()], false).expect("auth");
    let app = build_app(test_state(), auth, generous_limit());

    let (status, json) = send(&app, "GET", "/api/v1/health", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(json["data"]["status"], "ok");
    assert_eq!(json["data"]["products"], 0);
    assert!(json["meta"]["request_id"].is_string());
}

#[tokio::test]
async fn protected_routes_require_a_configured_bearer_token() {
    let auth = AuthState::from_keys(&["secret".to_string()], false).expect("auth");
    let app = build_app(test_state(), auth, generous_limit());

    let (status, json) = send(&app, "GET", "/api/v1/products", None).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(json["error"]["code"], "unauthorized");
    assert!(json["meta"]["request_id"].is_string());

    let response = app
        .oneshot(
            Request::builder()
                .uri("/api/v1/products")
                .header(header::AUTHORIZATION, "Bearer secret")
                .body(Body::empty())
                .expect("request"),
        )
        .await
        .expect("response");
    assert_eq!(response.status(), StatusCode::OK);
}

#[tokio::test]
async fn request_id_header_is_echoed() {
    let response = test_app()
        .oneshot(
            Request::builder()
                .uri("/api/v1/health")
                .header("x-request-id", "abc-123")
                .body(Body::empty())
                .expect("request"),
        )
        .await
        .expect("response");
    assert_eq!(
        response
            .headers()
            .get("x-request-id")
            .and_then(|v| v.to_str().ok()),
        Some("abc-123")
    );
}

#[tokio::test]
async fn rate_limit_rejects_requests_over_budget() {
    let app = build_app(
        test_state(),
        AuthState::disabled(),
        RateLimitState::new(2, Duration::from_secs(60)),
    );
    for _ in 0..2 {
        let (status, _) = send(&app, "GET", "/api/v1/products", None).await;
        assert_eq!(status, StatusCode::OK);
    }
    let (status, json) = send(&app, "GET", "/api/v1/products", None).await;
    assert_eq!(status, StatusCode::TOO_MANY_REQUESTS);
    assert_eq!(json["error"]["code"], "rate_limited");
}

#[tokio::test]
async fn product_crud_round_trip() {
    let app = test_app();
    let id = create_product(&app, "TV-100").await;

    let (status, json) = send(&app, "GET", &format!("/api/v1/products/{id}"), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(json["data"]["product_code"], "TV-100");
    assert_eq!(json["data"]["pack_size"], 1);
    assert_eq!(json["data"]["status"], "Active");
    assert_eq!(json["data"]["online"], true);

    let (status, json) = send(
        &app,
        "PUT",
        &format!("/api/v1/products/{id}"),
        Some(json!({"product_name": "Television Deluxe", "pack_size": 2})),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(json["data"]["product_name"], "Television Deluxe");
    assert_eq!(json["data"]["pack_size"], 2);
    assert_eq!(json["data"]["product_code"], "TV-100");

    let (status, json) = send(&app, "DELETE", &format!("/api/v1/products/{id}"), None).await;
    assert_eq!(status, StatusCode::NO_CONTENT);
    assert_eq!(json, Value::Null);

    let (status, json) = send(&app, "GET", &format!("/api/v1/products/{id}"), None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(json["error"]["code"], "not_found");

    let (status, _) = send(&app, "DELETE", &format!("/api/v1/products/{id}"), None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn create_product_reports_field_errors() {
    let app = test_app();
    let (status, json) = send(
        &app,
        "POST",
        "/api/v1/products",
        Some(json!({"product_code": "TV-1", "trade": "abc"})),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(json["error"]["code"], "validation_error");
    let paths: Vec<&str> = json["error"]["details"]
        .as_array()
        .expect("details")
        .iter()
        .filter_map(|d| d["path"].as_str())
        .collect();
    assert!(paths.contains(&"distributor_name"));
    assert!(paths.contains(&"trade"));
    assert!(paths.contains(&"rrp"));
}

#[tokio::test]
async fn duplicate_product_code_is_a_400_conflict() {
    let app = test_app();
    create_product(&app, "TV-100").await;

    let (status, json) = send(&app, "POST", "/api/v1/products", Some(product_body("TV-100"))).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(json["error"]["code"], "conflict");
    assert_eq!(json["error"]["message"], "Product code already exists");
}

#[tokio::test]
async fn product_code_is_stored_as_sent() {
    let app = test_app();
    let mut padded = product_body("TV-100");
    padded["product_code"] = json!(" TV-100 ");

    let (status, json) = send(&app, "POST", "/api/v1/products", Some(padded)).await;
    assert_eq!(status, StatusCode::CREATED);
    let id = json["data"]["id"].as_i64().expect("product id");

    let (_, json) = send(&app, "GET", &format!("/api/v1/products/{id}"), None).await;
    assert_eq!(json["data"]["product_code"], " TV-100 ");

    let (status, _) = send(&app, "POST", "/api/v1/products", Some(product_body("TV-100"))).await;
    assert_eq!(status, StatusCode::CREATED);
}

#[tokio::test]
async fn malformed_json_is_a_bad_request_envelope() {
    let app = test_app();
    let response = app
        .oneshot(
            Request::builder()
                .method("POST")
                .uri("/api/v1/products")
                .header(header::CONTENT_TYPE, "application/json")
                .body(Body::from("{not json"))
                .expect("request"),
        )
        .await
        .expect("response");
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let bytes = to_bytes(response.into_body(), usize::MAX)
        .await
        .expect("body bytes");
    let json: Value = serde_json::from_slice(&bytes).expect("json parse");
    assert_eq!(json["error"]["code"], "bad_request");
}

#[tokio::test]
async fn non_numeric_id_is_a_bad_request_envelope() {
    let (status, json) = send(&test_app(), "GET", "/api/v1/products/abc", None).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(json["error"]["code"], "bad_request");
}

#[tokio::test]
async fn search_ignores_short_queries() {
    let app = test_app();
    create_product(&app, "TV-100").await;

    let (status, json) = send(&app, "GET", "/api/v1/products/search?q=t", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(json["data"], json!([]));

    let (_, json) = send(&app, "GET", "/api/v1/products/search?q=VISTA", None).await;
    assert_eq!(json["data"].as_array().map(Vec::len), Some(1));

    let (_, json) = send(&app, "GET", "/api/v1/products/search?q=fridge", None).await;
    assert_eq!(json["data"], json!([]));
}

#[tokio::test]
async fn core_range_filters_by_group_and_pages() {
    let app = test_app();
    for (code, brand, group) in [
        ("TV-100", "Vista", "Core A"),
        ("TV-200", "Vista", "Core B"),
        ("TV-300", "Vista", ""),
        ("SB-100", "Tonal", "Core A"),
    ] {
        let mut body = product_body(code);
        body["brand_name"] = json!(brand);
        body["core_group"] = json!(group);
        let (status, json) = send(&app, "POST", "/api/v1/products", Some(body)).await;
        assert_eq!(status, StatusCode::CREATED, "{json}");
    }
    let codes = |json: &Value| {
        json["data"]
            .as_array()
            .expect("array")
            .iter()
            .map(|p| p["product_code"].as_str().unwrap_or_default().to_string())
            .collect::<Vec<_>>()
    };

    let (status, json) = send(&app, "GET", "/api/v1/products/core-range", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(codes(&json).len(), 4);

    let (_, json) = send(
        &app,
        "GET",
        "/api/v1/products/core-range?brand=vista&core_groups=Core%20A,%20core%20b",
        None,
    )
    .await;
    assert_eq!(codes(&json), vec!["TV-100", "TV-200"]);

    let (_, json) = send(
        &app,
        "GET",
        "/api/v1/products/core-range?distributor=Acme%20Distribution&core_groups=Core%20A",
        None,
    )
    .await;
    assert_eq!(codes(&json), vec!["TV-100", "SB-100"]);

    let (_, json) = send(
        &app,
        "GET",
        "/api/v1/products/core-range?limit=2&offset=1",
        None,
    )
    .await;
    assert_eq!(codes(&json), vec!["TV-200", "TV-300"]);

    let (status, json) = send(&app, "GET", "/api/v1/products/core-range?limit=-1", None).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(json["error"]["code"], "bad_request");
}

#[tokio::test]
async fn bulk_upload_isolates_duplicate_rows() {
    let app = test_app();
    let rows = json!([
        product_body("TV-100"),
        product_body("TV-100"),
        product_body("TV-200"),
    ]);

    let (status, json) = send(&app, "POST", "/api/v1/products/bulk", Some(rows)).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(json["data"]["success"], 2);
    assert_eq!(json["data"]["errors"], 1);
    assert_eq!(
        json["data"]["failed"],
        json!([{"row": 2, "error": "Product code already exists"}])
    );

    let (_, json) = send(&app, "GET", "/api/v1/products", None).await;
    assert_eq!(json["data"].as_array().map(Vec::len), Some(2));
}

#[tokio::test]
async fn bulk_upload_reports_validation_details_per_row() {
    let app = test_app();
    let rows = json!([{"product_code": "X-1"}, product_body("TV-300")]);

    let (_, json) = send(&app, "POST", "/api/v1/products/bulk", Some(rows)).await;
    assert_eq!(json["data"]["success"], 1);
    let failure = &json["data"]["failed"][0];
    assert_eq!(failure["row"], 1);
    assert_eq!(failure["error"], "Validation failed");
    assert!(failure["details"].as_array().is_some_and(|d| !d.is_empty()));
}

#[tokio::test]
async fn bulk_upload_requires_an_array() {
    let (status, json) = send(
        &test_app(),
        "POST",
        "/api/v1/products/bulk",
        Some(product_body("TV-100")),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(json["error"]["code"], "bad_request");
}

#[tokio::test]
async fn csv_bulk_upload_uses_data_row_numbers() {
    let app = test_app();
    let csv = "distributor_name,brand_name,product_code,product_name,category_name,trade,rrp,online\n\
               Acme,Vista,TV-100,Television,Televisions,500,899,yes\n\
               Acme,Vista,TV-100,Television again,Televisions,500,899,no\n";
    let response = app
        .clone()
        .oneshot(
            Request::builder()
                .method("POST")
                .uri("/api/v1/products/bulk/csv")
                .header(header::CONTENT_TYPE, "text/csv")
                .body(Body::from(csv))
                .expect("request"),
        )
        .await
        .expect("response");
    assert_eq!(response.status(), StatusCode::OK);
    let bytes = to_bytes(response.into_body(), usize::MAX)
        .await
        .expect("body bytes");
    let json: Value = serde_json::from_slice(&bytes).expect("json parse");
    assert_eq!(json["data"]["success"], 1);
    assert_eq!(json["data"]["failed"][0]["row"], 2);
    assert_eq!(json["data"]["created"][0]["online"], true);
}

#[tokio::test]
async fn template_and_export_are_csv() {
    let app = test_app();
    create_product(&app, "TV-100").await;

    let response = app
        .clone()
        .oneshot(
            Request::builder()
                .uri("/api/v1/products/template.csv")
                .body(Body::empty())
                .expect("request"),
        )
        .await
        .expect("response");
    assert_eq!(response.status(), StatusCode::OK);
    assert!(response
        .headers()
        .get(header::CONTENT_TYPE)
        .and_then(|v| v.to_str().ok())
        .is_some_and(|v| v.starts_with("text/csv")));
    let bytes = to_bytes(response.into_body(), usize::MAX)
        .await
        .expect("body bytes");
    let text = String::from_utf8(bytes.to_vec()).expect("utf8");
    assert!(text.starts_with("distributor_name,brand_name,product_code"));
    assert_eq!(text.lines().count(), 1);

    let response = app
        .oneshot(
            Request::builder()
                .uri("/api/v1/products/export.csv")
                .body(Body::empty())
                .expect("request"),
        )
        .await
        .expect("response");
    let bytes = to_bytes(response.into_body(), usize::MAX)
        .await
        .expect("body bytes");
    let text = String::from_utf8(bytes.to_vec()).expect("utf8");
    assert_eq!(text.lines().count(), 2);
    assert!(text.contains("TV-100"));
}

#[tokio::test]
async fn analytics_follow_the_ledgers() {
    let app = test_app();
    let id = create_product(&app, "TV-100").await;

    let (status, _) = send(
        &app,
        "POST",
        "/api/v1/sell-ins",
        Some(json!({
            "product_id": id,
            "quantity": 50,
            "unit_cost": "500.00",
            "total_cost": "25000.00",
            "transaction_date": "2024-03-04"
        })),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);
    let (status, json) = send(
        &app,
        "POST",
        "/api/v1/sell-throughs",
        Some(json!({
            "product_id": id,
            "quantity": 30,
            "unit_price": "300.00",
            "total_revenue": "9000.00",
            "transaction_date": "2024-03-20"
        })),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(json["data"]["month_partition"], "2024-03");

    let (status, json) = send(
        &app,
        "GET",
        &format!("/api/v1/analytics/products?product_id={id}&month=2024-03"),
        None,
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    let row = &json["data"][0];
    assert_eq!(row["sell_in_quantity"], 50);
    assert_eq!(row["sell_through_quantity"], 30);
    assert_eq!(row["current_stock"], 20);
    assert_eq!(row["turnover_rate"].as_f64(), Some(60.0));
    assert_eq!(
        row["total_revenue"].as_str().map(dec),
        Some(dec("9000.00"))
    );

    let (_, json) = send(&app, "GET", "/api/v1/analytics/overall?month=2024-04", None).await;
    assert_eq!(json["data"]["total_sell_in"], 0);
    assert_eq!(json["data"]["average_turnover_rate"].as_f64(), Some(0.0));
    assert_eq!(json["data"]["total_products"], 1);

    let (_, json) = send(&app, "GET", "/api/v1/sell-ins?month=2024-03", None).await;
    assert_eq!(json["data"].as_array().map(Vec::len), Some(1));
}

#[tokio::test]
async fn analytics_reject_malformed_months() {
    let (status, json) = send(
        &test_app(),
        "GET",
        "/api/v1/analytics/overall?month=2024-3",
        None,
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(json["error"]["code"], "validation_error");
    assert_eq!(json["error"]["details"][0]["path"], "month");
}

#[tokio::test]
async fn ledger_rows_for_unknown_products_are_not_found() {
    let (status, json) = send(
        &test_app(),
        "POST",
        "/api/v1/sell-ins",
        Some(json!({
            "product_id": 42,
            "quantity": 1,
            "unit_cost": "1.00",
            "total_cost": "1.00",
            "transaction_date": "2024-03-04"
        })),
    )
    .await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(json["error"]["code"], "not_found");
}

#[tokio::test]
async fn deal_lifecycle_and_filters() {
    let app = test_app();
    let id = create_product(&app, "TV-100").await;

    let (status, json) = send(
        &app,
        "POST",
        "/api/v1/deals",
        Some(json!({
            "product_id": id,
            "deal_type": "sell_through",
            "amount_type": "value",
            "amount": "25.00",
            "start_date": "2024-03-01",
            "end_date": "2024-03-31",
            "provider": "head office"
        })),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED, "{json}");
    let deal_id = json["data"]["id"].as_i64().expect("deal id");
    assert_eq!(json["data"]["month_partition"], "2024-03");

    let (_, json) = send(
        &app,
        "GET",
        "/api/v1/deals?provider=head_office&active_on=2024-03-15",
        None,
    )
    .await;
    assert_eq!(json["data"].as_array().map(Vec::len), Some(1));

    let (_, json) = send(&app, "GET", "/api/v1/deals?active_on=2024-04-01", None).await;
    assert_eq!(json["data"], json!([]));

    let (status, _) = send(&app, "GET", "/api/v1/deals?provider=wholesaler", None).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let (status, json) = send(
        &app,
        "PUT",
        &format!("/api/v1/deals/{deal_id}"),
        Some(json!({"end_date": "2024-02-01"})),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(json["error"]["details"][0]["path"], "end_date");

    let (_, json) = send(&app, "GET", "/api/v1/deals/search?q=tv-1", None).await;
    assert_eq!(json["data"].as_array().map(Vec::len), Some(1));

    let (status, _) = send(&app, "DELETE", &format!("/api/v1/deals/{deal_id}"), None).await;
    assert_eq!(status, StatusCode::NO_CONTENT);
    let (status, _) = send(&app, "GET", &format!("/api/v1/deals/{deal_id}"), None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn deal_bulk_reports_unknown_products() {
    let app = test_app();
    let id = create_product(&app, "TV-100").await;
    let deal = |product_id: i64| {
        json!({
            "product_id": product_id,
            "deal_type": "sell_in",
            "amount_type": "quantity",
            "amount": 10,
            "start_date": "2024-03-01",
            "end_date": "2024-03-31",
            "provider": "narta"
        })
    };

    let (_, json) = send(
        &app,
        "POST",
        "/api/v1/deals/bulk",
        Some(json!([deal(id), deal(id + 100)])),
    )
    .await;
    assert_eq!(json["data"]["success"], 1);
    assert_eq!(json["data"]["failed"][0]["row"], 2);
    assert_eq!(
        json["data"]["failed"][0]["error"],
        format!("Product {} not found", id + 100)
    );
}

#[tokio::test]
async fn product_pricing_uses_latest_levels() {
    let app = test_app();
    let id = create_product(&app, "TV-100").await;

    for body in [
        json!({"price_level": "Trade", "value_excl": "50.00", "value_incl": "55.00"}),
        json!({"price_level": "RRP", "value_excl": "90.00"}),
    ] {
        let (status, json) = send(
            &app,
            "POST",
            &format!("/api/v1/products/{id}/price-levels"),
            Some(body),
        )
        .await;
        assert_eq!(status, StatusCode::CREATED, "{json}");
    }
    tokio::time::sleep(Duration::from_millis(5)).await;
    let (_, json) = send(
        &app,
        "POST",
        &format!("/api/v1/products/{id}/price-levels"),
        Some(json!({"price_level": "RRP", "value_excl": "100.00", "type": "Promotional"})),
    )
    .await;
    let newest_rrp = json["data"]["id"].as_i64().expect("level id");

    let (status, json) = send(&app, "GET", &format!("/api/v1/products/{id}/pricing"), None).await;
    assert_eq!(status, StatusCode::OK);
    let latest = json["data"]["latest"].as_array().expect("latest");
    assert_eq!(latest.len(), 2);
    assert!(latest.iter().any(|l| l["id"] == newest_rrp));
    let franchise = &json["data"]["franchise"];
    assert_eq!(
        franchise["gross_margin_pct"].as_str().map(dec),
        Some(dec("50"))
    );
    assert_eq!(json["data"]["mwp"], Value::Null);

    let (status, _) = send(&app, "GET", "/api/v1/products/999/pricing", None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);

    let (status, _) = send(
        &app,
        "DELETE",
        &format!("/api/v1/price-levels/{newest_rrp}"),
        None,
    )
    .await;
    assert_eq!(status, StatusCode::NO_CONTENT);
    let (_, json) = send(
        &app,
        "GET",
        &format!("/api/v1/products/{id}/price-levels"),
        None,
    )
    .await;
    assert_eq!(json["data"].as_array().map(Vec::len), Some(2));
}

#[tokio::test]
async fn margin_calculator_applies_edits() {
    let app = test_app();
    let (status, json) = send(
        &app,
        "POST",
        "/api/v1/pricing/margin",
        Some(json!({
            "prices_include_tax": false,
            "sell_price": "100",
            "cost_price": "60",
            "edit": {"field": "markup", "value": "50"}
        })),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(
        json["data"]["sell_price_excl"].as_str().map(dec),
        Some(dec("90"))
    );
    assert_eq!(
        json["data"]["sell_price_incl"].as_str().map(dec),
        Some(dec("99"))
    );

    let (status, json) = send(
        &app,
        "POST",
        "/api/v1/pricing/margin",
        Some(json!({
            "sell_price": "100",
            "cost_price": "60",
            "edit": {"field": "gross_margin", "value": "100"}
        })),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(json["error"]["code"], "validation_error");
    assert_eq!(json["error"]["details"][0]["path"], "gross_margin");

    let (status, json) = send(
        &app,
        "POST",
        "/api/v1/pricing/margin",
        Some(json!({"cost_price": "60"})),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(json["error"]["code"], "validation_error");
    assert_eq!(json["error"]["details"][0]["path"], "sell_price");
}

#[tokio::test]
async fn catalog_rollups_group_products() {
    let app = test_app();
    create_product(&app, "TV-100").await;
    create_product(&app, "TV-200").await;

    let (_, json) = send(&app, "GET", "/api/v1/distributors", None).await;
    assert_eq!(
        json["data"],
        json!([{"name": "Acme Distribution", "brand_count": 1, "product_count": 2}])
    );

    let (_, json) = send(
        &app,
        "GET",
        "/api/v1/brands?distributor=acme%20distribution",
        None,
    )
    .await;
    assert_eq!(json["data"][0]["name"], "Vista");
    assert_eq!(json["data"][0]["product_count"], 2);
}
