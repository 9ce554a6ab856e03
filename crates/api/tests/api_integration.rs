//! Integration tests for the API server.

use std::sync::{Arc, OnceLock};
use std::time::Duration;

use api::auth::TokenAuthority;
use api::config::AuthConfig;
use api::state::AppState;
use axum::body::Body;
use axum::http::{Request, StatusCode};
use metrics_exporter_prometheus::PrometheusHandle;
use serde_json::{Value, json};
use store::InMemoryStore;
use tower::ServiceExt;

static METRICS_HANDLE: OnceLock<PrometheusHandle> = OnceLock::new();

fn get_metrics_handle() -> PrometheusHandle {
    METRICS_HANDLE
        .get_or_init(|| {
            let builder = metrics_exporter_prometheus::PrometheusBuilder::new();
            builder
                .install_recorder()
                .expect("failed to install Prometheus recorder")
        })
        .clone()
}

fn setup() -> axum::Router {
    let state = Arc::new(AppState::new(
        InMemoryStore::new(),
        TokenAuthority::new(&AuthConfig::default()),
        Duration::from_secs(5),
    ));
    api::create_app(state, get_metrics_handle())
}

async fn send(
    app: &axum::Router,
    method: &str,
    uri: &str,
    token: Option<&str>,
    body: Option<Value>,
) -> (StatusCode, Value) {
    let mut builder = Request::builder().method(method).uri(uri);
    if let Some(token) = token {
        builder = builder.header("authorization", token);
    }
    let request = match body {
        Some(body) => builder
            .header("content-type", "application/json")
            .body(Body::from(body.to_string()))
            .unwrap(),
        None => builder.body(Body::empty()).unwrap(),
    };

    let response = app.clone().oneshot(request).await.unwrap();
    let status = response.status();
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    let json = if bytes.is_empty() {
        Value::Null
    } else {
        serde_json::from_slice(&bytes).unwrap_or(Value::Null)
    };
    (status, json)
}

async fn login(app: &axum::Router, role: &str) -> String {
    let (status, json) = send(app, "POST", &format!("/v1/account/login/{role}"), None, None).await;
    assert_eq!(status, StatusCode::OK);
    json["data"]["jwtToken"].as_str().unwrap().to_string()
}

fn product(code: &str) -> Value {
    json!({
        "code": code,
        "name": format!("Dish {code}"),
        "origin": "Korea",
        "price": 8.5,
        "limit": 10,
        "canOrder": true
    })
}

async fn create_product(app: &axum::Router, provider: &str, code: &str) {
    let (status, _) = send(
        app,
        "POST",
        "/v1/provider/products",
        Some(provider),
        Some(product(code)),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);
}

async fn checkout(app: &axum::Router, customer: &str, username: &str, cart: Value) -> String {
    let (status, json) = send(
        app,
        "POST",
        "/v1/customer/orders",
        Some(customer),
        Some(json!({ "user": { "username": username }, "cart": cart })),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(json["code"], 201);
    json["data"]["insertedId"].as_str().unwrap().to_string()
}

async fn set_status(app: &axum::Router, provider: &str, id: &str, status: &str) {
    let (code, json) = send(
        app,
        "PUT",
        &format!("/v1/provider/orders/{id}/status"),
        Some(provider),
        Some(json!({ "status": status })),
    )
    .await;
    assert_eq!(code, StatusCode::OK);
    assert_eq!(json["data"]["matchedCount"], 1);
}

#[tokio::test]
async fn test_health_check() {
    let app = setup();
    let (status, json) = send(&app, "GET", "/health", None, None).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(json["status"], "ok");
}

#[tokio::test]
async fn test_login_issues_bearer_token() {
    let app = setup();
    let (status, json) = send(&app, "POST", "/v1/account/login/provider", None, None).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(json["code"], 200);
    assert_eq!(json["data"]["userRole"], "provider");
    assert!(json["data"]["jwtToken"].as_str().unwrap().starts_with("Bearer "));
}

#[tokio::test]
async fn test_login_unknown_role_is_bad_request() {
    let app = setup();
    let (status, json) = send(&app, "POST", "/v1/account/login/admin", None, None).await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(json["code"], 400);
}

#[tokio::test]
async fn test_missing_token_is_unauthorized() {
    let app = setup();
    let (status, json) = send(&app, "GET", "/v1/customer/products", None, None).await;

    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(json["code"], 401);
}

#[tokio::test]
async fn test_garbage_token_is_unauthorized() {
    let app = setup();
    let (status, _) = send(
        &app,
        "GET",
        "/v1/customer/products",
        Some("Bearer not-a-jwt"),
        None,
    )
    .await;

    assert_eq!(status, StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn test_customer_token_on_provider_route() {
    let app = setup();
    let customer = login(&app, "customer").await;
    let (status, json) = send(&app, "GET", "/v1/provider/orders", Some(&customer), None).await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(json["code"], 400);
    assert_eq!(json["message"], "Insufficient scope.");
    assert!(json["data"].is_null());
}

#[tokio::test]
async fn test_create_and_get_product() {
    let app = setup();
    let provider = login(&app, "provider").await;
    let customer = login(&app, "customer").await;

    let (status, json) = send(
        &app,
        "POST",
        "/v1/provider/products",
        Some(&provider),
        Some(product("bc01")),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(json["data"]["insertedId"], "bc01");

    let (status, json) = send(&app, "GET", "/v1/customer/products/bc01", Some(&customer), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(json["data"]["info"]["code"], "bc01");
    assert_eq!(json["data"]["canView"], true);
    assert_eq!(json["data"]["stats"]["likeCount"], 0);
}

#[tokio::test]
async fn test_duplicate_product_is_server_error() {
    let app = setup();
    let provider = login(&app, "provider").await;
    create_product(&app, &provider, "bc01").await;

    let (status, json) = send(
        &app,
        "POST",
        "/v1/provider/products",
        Some(&provider),
        Some(product("bc01")),
    )
    .await;
    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(json["code"], 500);
}

#[tokio::test]
async fn test_hidden_product_only_listed_for_provider() {
    let app = setup();
    let provider = login(&app, "provider").await;
    let customer = login(&app, "customer").await;
    create_product(&app, &provider, "a").await;
    create_product(&app, &provider, "b").await;

    let (status, _) = send(&app, "DELETE", "/v1/provider/products/a", Some(&provider), None).await;
    assert_eq!(status, StatusCode::OK);

    let (_, visible) = send(&app, "GET", "/v1/customer/products", Some(&customer), None).await;
    let codes: Vec<&str> = visible["data"]
        .as_array()
        .unwrap()
        .iter()
        .map(|p| p["info"]["code"].as_str().unwrap())
        .collect();
    assert_eq!(codes, vec!["b"]);

    let (_, all) = send(&app, "GET", "/v1/provider/products", Some(&provider), None).await;
    assert_eq!(all["data"].as_array().unwrap().len(), 2);

    // Direct lookups still see hidden products.
    let (status, _) = send(&app, "GET", "/v1/customer/products/a", Some(&customer), None).await;
    assert_eq!(status, StatusCode::OK);
}

#[tokio::test]
async fn test_unknown_sort_is_bad_request() {
    let app = setup();
    let customer = login(&app, "customer").await;
    let (status, json) = send(
        &app,
        "GET",
        "/v1/customer/products?sort=price",
        Some(&customer),
        None,
    )
    .await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(json["code"], 400);
}

#[tokio::test]
async fn test_checkout_and_read_back() {
    let app = setup();
    let customer = login(&app, "customer").await;
    let id = checkout(&app, &customer, "alice", json!({ "bc01": 2 })).await;

    let (status, json) = send(&app, "GET", &format!("/v1/customer/orders/{id}"), Some(&customer), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(json["data"]["id"], id.as_str());
    assert_eq!(json["data"]["status"], "Submitting");
    assert_eq!(json["data"]["cart"]["bc01"], 2);

    let (_, json) = send(
        &app,
        "GET",
        &format!("/v1/customer/orders/{id}/status"),
        Some(&customer),
        None,
    )
    .await;
    assert_eq!(json["data"], "Submitting");
}

#[tokio::test]
async fn test_malformed_checkout_is_bad_request() {
    let app = setup();
    let customer = login(&app, "customer").await;

    let request = Request::builder()
        .method("POST")
        .uri("/v1/customer/orders")
        .header("authorization", customer.as_str())
        .header("content-type", "application/json")
        .body(Body::from("{not json"))
        .unwrap();
    let response = app.clone().oneshot(request).await.unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);

    let (status, json) = send(
        &app,
        "POST",
        "/v1/customer/orders",
        Some(&customer),
        Some(json!({ "user": { "username": "alice" }, "cart": {} })),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(json["code"], 400);
}

#[tokio::test]
async fn test_unknown_order_is_server_error() {
    let app = setup();
    let customer = login(&app, "customer").await;
    let (status, json) = send(
        &app,
        "GET",
        "/v1/customer/orders/00000000-0000-0000-0000-000000000000",
        Some(&customer),
        None,
    )
    .await;

    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(json["message"], "Internal Server Error");
    assert!(json["data"].as_str().unwrap().contains("not found"));
}

#[tokio::test]
async fn test_cart_edits_follow_status() {
    let app = setup();
    let customer = login(&app, "customer").await;
    let provider = login(&app, "provider").await;
    let id = checkout(&app, &customer, "alice", json!({ "a": 1, "b": 1 })).await;
    let cart_uri = format!("/v1/customer/orders/{id}/cart");

    let (status, _) = send(&app, "PUT", &cart_uri, Some(&customer), Some(json!({ "cart": { "c": 3 } }))).await;
    assert_eq!(status, StatusCode::OK);

    let (status, _) = send(&app, "DELETE", &cart_uri, Some(&customer), Some(json!(["a"]))).await;
    assert_eq!(status, StatusCode::OK);

    let (_, json) = send(&app, "GET", &format!("/v1/customer/orders/{id}"), Some(&customer), None).await;
    assert_eq!(json["data"]["cart"], json!({ "b": 1, "c": 3 }));

    set_status(&app, &provider, &id, "Cooking").await;

    // Removal is closed once cooking starts; upserts stay open until delivery.
    let (status, json) = send(&app, "DELETE", &cart_uri, Some(&customer), Some(json!(["b"]))).await;
    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(json["code"], 500);

    let (status, _) = send(&app, "PUT", &cart_uri, Some(&customer), Some(json!({ "cart": { "d": 1 } }))).await;
    assert_eq!(status, StatusCode::OK);

    set_status(&app, &provider, &id, "Delivering").await;
    let (status, _) = send(&app, "PUT", &cart_uri, Some(&customer), Some(json!({ "cart": { "d": 2 } }))).await;
    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
}

#[tokio::test]
async fn test_empty_removal_list_is_bad_request() {
    let app = setup();
    let customer = login(&app, "customer").await;
    let id = checkout(&app, &customer, "alice", json!({ "a": 1 })).await;

    let (status, _) = send(
        &app,
        "DELETE",
        &format!("/v1/customer/orders/{id}/cart"),
        Some(&customer),
        Some(json!([])),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_unknown_status_label_is_bad_request() {
    let app = setup();
    let customer = login(&app, "customer").await;
    let provider = login(&app, "provider").await;
    let id = checkout(&app, &customer, "alice", json!({ "a": 1 })).await;

    let (status, _) = send(
        &app,
        "PUT",
        &format!("/v1/provider/orders/{id}/status"),
        Some(&provider),
        Some(json!({ "status": "Lost" })),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_active_and_history_split() {
    let app = setup();
    let customer = login(&app, "customer").await;
    let provider = login(&app, "provider").await;
    let delivered = checkout(&app, &customer, "alice", json!({ "a": 1 })).await;
    let open = checkout(&app, &customer, "alice", json!({ "b": 1 })).await;
    checkout(&app, &customer, "bob", json!({ "c": 1 })).await;
    set_status(&app, &provider, &delivered, "Delivered").await;

    let (_, active) = send(&app, "GET", "/v1/customer/alice/orders/active", Some(&customer), None).await;
    let active = active["data"].as_array().unwrap();
    assert_eq!(active.len(), 1);
    assert_eq!(active[0]["id"], open.as_str());

    let (_, history) = send(&app, "GET", "/v1/customer/alice/orders/history", Some(&customer), None).await;
    let history = history["data"].as_array().unwrap();
    assert_eq!(history.len(), 1);
    assert_eq!(history[0]["id"], delivered.as_str());

    let (_, all) = send(&app, "GET", "/v1/provider/orders", Some(&provider), None).await;
    assert_eq!(all["data"].as_array().unwrap().len(), 3);
}

#[tokio::test]
async fn test_review_updates_products() {
    let app = setup();
    let customer = login(&app, "customer").await;
    let provider = login(&app, "provider").await;
    create_product(&app, &provider, "a").await;
    let id = checkout(&app, &customer, "alice", json!({ "a": 1 })).await;

    let review = json!({
        "rating": 4.0,
        "comment": "Great",
        "productReviews": [{ "productCode": "a", "isLiked": true, "comment": "tasty" }]
    });
    let (status, json) = send(
        &app,
        "POST",
        &format!("/v1/customer/reviews/orders/{id}"),
        Some(&customer),
        Some(review.clone()),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(json["data"]["insertedId"], id.as_str());

    let (_, json) = send(&app, "GET", "/v1/customer/products/a", Some(&customer), None).await;
    assert_eq!(json["data"]["stats"]["likeCount"], 1);
    assert_eq!(json["data"]["stats"]["reviewCount"], 1);

    let (_, json) = send(&app, "GET", "/v1/customer/reviews/products/a", Some(&customer), None).await;
    let views = json["data"].as_array().unwrap();
    assert_eq!(views.len(), 1);
    assert_eq!(views[0]["username"], "alice");
    assert_eq!(views[0]["productReview"]["comment"], "tasty");

    // A second review of the same order is rejected.
    let (status, _) = send(
        &app,
        "POST",
        &format!("/v1/customer/reviews/orders/{id}"),
        Some(&customer),
        Some(review),
    )
    .await;
    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);

    let (_, json) = send(&app, "GET", "/v1/provider/reviews/orders", Some(&provider), None).await;
    assert_eq!(json["data"].as_array().unwrap().len(), 1);
}

#[tokio::test]
async fn test_review_with_unknown_product_keeps_earlier_tallies() {
    let app = setup();
    let customer = login(&app, "customer").await;
    let provider = login(&app, "provider").await;
    create_product(&app, &provider, "a").await;
    let id = checkout(&app, &customer, "alice", json!({ "a": 1 })).await;

    let (status, _) = send(
        &app,
        "POST",
        &format!("/v1/customer/reviews/orders/{id}"),
        Some(&customer),
        Some(json!({
            "rating": 5.0,
            "productReviews": [
                { "productCode": "a", "isLiked": true },
                { "productCode": "ghost", "isLiked": true }
            ]
        })),
    )
    .await;
    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);

    let (_, json) = send(&app, "GET", "/v1/customer/products/a", Some(&customer), None).await;
    assert_eq!(json["data"]["stats"]["likeCount"], 1);

    let (_, json) = send(&app, "GET", "/v1/provider/reviews/orders", Some(&provider), None).await;
    assert!(json["data"].as_array().unwrap().is_empty());
}

#[tokio::test]
async fn test_openapi_document_served() {
    let app = setup();
    let (status, json) = send(&app, "GET", "/api-docs/openapi.json", None, None).await;

    assert_eq!(status, StatusCode::OK);
    assert!(json["paths"]["/v1/customer/orders"].is_object());
    assert!(json["components"]["securitySchemes"]["bearer"].is_object());
}

#[tokio::test]
async fn test_metrics_endpoint() {
    let app = setup();
    let request = Request::builder()
        .uri("/metrics")
        .body(Body::empty())
        .unwrap();
    let response = app.oneshot(request).await.unwrap();

    assert_eq!(response.status(), StatusCode::OK);
}
