//! HTTP API server for the online ordering system.
//!
//! Customers browse the catalog, check out carts, track and edit orders and
//! leave reviews; providers manage products and move orders through their
//! lifecycle. Every `/v1` route answers with the `{code, message, data}`
//! envelope, and role groups are guarded by bearer JWT scopes.

pub mod auth;
pub mod config;
pub mod doc;
pub mod envelope;
pub mod error;
pub mod extract;
pub mod routes;
pub mod state;
pub mod telemetry;

use std::sync::Arc;

use axum::Router;
use axum::middleware;
use axum::routing::{get, post, put};
use metrics_exporter_prometheus::PrometheusHandle;
use store::DocumentStore;
use tower_http::cors::{Any, CorsLayer};
use tower_http::timeout::TimeoutLayer;
use tower_http::trace::TraceLayer;

use auth::{Role, RoleGuard};
use routes::{account, health, orders, products, reviews};
use state::AppState;

fn customer_routes<S: DocumentStore>(state: &Arc<AppState<S>>) -> Router<Arc<AppState<S>>> {
    Router::new()
        .route("/products", get(products::list_visible::<S>))
        .route("/products/{code}", get(products::get::<S>))
        .route("/{username}/orders/active", get(orders::list_active::<S>))
        .route("/{username}/orders/history", get(orders::list_history::<S>))
        .route("/orders", post(orders::create::<S>))
        .route("/orders/{id}", get(orders::get::<S>))
        .route("/orders/{id}/status", get(orders::status::<S>))
        .route(
            "/orders/{id}/cart",
            put(orders::update_cart::<S>).delete(orders::delete_cart::<S>),
        )
        .route("/reviews/orders/{id}", post(reviews::create::<S>))
        .route(
            "/reviews/products/{code}",
            get(reviews::list_for_product::<S>),
        )
        .route_layer(middleware::from_fn_with_state(
            RoleGuard::new(state.tokens.clone(), Role::Customer),
            auth::require_role,
        ))
}

fn provider_routes<S: DocumentStore>(state: &Arc<AppState<S>>) -> Router<Arc<AppState<S>>> {
    Router::new()
        .route(
            "/products",
            get(products::list_all::<S>).post(products::create::<S>),
        )
        .route(
            "/products/{code}",
            put(products::update::<S>).delete(products::delete::<S>),
        )
        .route("/orders", get(orders::list::<S>))
        .route("/orders/{id}/status", put(orders::update_status::<S>))
        .route("/reviews/orders", get(reviews::list::<S>))
        .route_layer(middleware::from_fn_with_state(
            RoleGuard::new(state.tokens.clone(), Role::Provider),
            auth::require_role,
        ))
}

/// Creates the Axum application router with all routes and shared state.
pub fn create_app<S: DocumentStore>(
    state: Arc<AppState<S>>,
    metrics_handle: PrometheusHandle,
) -> Router {
    let metrics_router = Router::new()
        .route("/metrics", get(routes::metrics::get))
        .with_state(metrics_handle);

    let v1 = Router::new()
        .route("/account/login/{role}", post(account::login::<S>))
        .nest("/customer", customer_routes(&state))
        .nest("/provider", provider_routes(&state));

    // Outer bound only; the per-operation deadline normally fires first.
    let request_bound = state.request_timeout * 2;

    Router::new()
        .route("/health", get(health::check))
        .route("/api-docs/openapi.json", get(doc::openapi))
        .nest("/v1", v1)
        .with_state(state)
        .merge(metrics_router)
        .layer(
            CorsLayer::new()
                .allow_origin(Any)
                .allow_methods(Any)
                .allow_headers(Any),
        )
        .layer(TimeoutLayer::new(request_bound))
        .layer(TraceLayer::new_for_http())
}
