//! Prometheus metrics endpoint.

use axum::extract::State;
use axum::http::StatusCode;
use axum::http::header::CONTENT_TYPE;
use axum::response::IntoResponse;
use metrics_exporter_prometheus::PrometheusHandle;

/// Registers descriptions for the counters the services emit.
pub fn describe() {
    metrics::describe_counter!("orders_created_total", "Orders checked out");
    metrics::describe_counter!(
        "order_status_updates_total",
        "Order status overwrites, labelled by new status"
    );
    metrics::describe_counter!("products_created_total", "Products added to the catalog");
    metrics::describe_counter!("reviews_submitted_total", "Order reviews stored");
}

/// GET /metrics — returns Prometheus-formatted metrics.
pub async fn get(State(handle): State<PrometheusHandle>) -> impl IntoResponse {
    (
        StatusCode::OK,
        [(CONTENT_TYPE, "text/plain; version=0.0.4; charset=utf-8")],
        handle.render(),
    )
}
