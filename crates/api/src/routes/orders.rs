//! Order endpoints for customers and providers.

use std::sync::Arc;

use axum::extract::State;
use common::{Order, OrderId, OrderStatus};
use domain::{OrderCreate, OrderUpdateCart, OrderUpdateStatus};
use store::{DocumentStore, InsertResult, UpdateResult};

use crate::envelope::Envelope;
use crate::error::ApiError;
use crate::extract::{ApiPath, ValidatedJson};
use crate::state::AppState;

/// POST /v1/customer/orders — check out a cart.
#[utoipa::path(
    post,
    path = "/v1/customer/orders",
    tag = "orders",
    request_body = OrderCreate,
    responses(
        (status = 201, description = "Order created", body = Envelope<InsertResult>),
        (status = 400, description = "Malformed payload", body = Envelope<String>),
        (status = 500, description = "Store failure", body = Envelope<String>)
    ),
    security(("bearer" = []))
)]
#[tracing::instrument(skip(state, params))]
pub async fn create<S: DocumentStore>(
    State(state): State<Arc<AppState<S>>>,
    ValidatedJson(params): ValidatedJson<OrderCreate>,
) -> Result<Envelope<InsertResult>, ApiError> {
    let result = state.run(state.orders.create_order(params)).await?;
    Ok(Envelope::created(result))
}

/// GET /v1/customer/orders/{id} — one order.
#[utoipa::path(
    get,
    path = "/v1/customer/orders/{id}",
    tag = "orders",
    params(("id" = String, Path, description = "Order id")),
    responses(
        (status = 200, description = "The order", body = Envelope<Order>),
        (status = 400, description = "Malformed id", body = Envelope<String>),
        (status = 500, description = "Order not found", body = Envelope<String>)
    ),
    security(("bearer" = []))
)]
#[tracing::instrument(skip(state))]
pub async fn get<S: DocumentStore>(
    State(state): State<Arc<AppState<S>>>,
    ApiPath(id): ApiPath<OrderId>,
) -> Result<Envelope<Order>, ApiError> {
    let order = state.run(state.orders.get_order(id)).await?;
    Ok(Envelope::ok(order))
}

/// GET /v1/customer/orders/{id}/status — the order's status label.
#[utoipa::path(
    get,
    path = "/v1/customer/orders/{id}/status",
    tag = "orders",
    params(("id" = String, Path, description = "Order id")),
    responses(
        (status = 200, description = "Current status", body = Envelope<OrderStatus>),
        (status = 500, description = "Order not found", body = Envelope<String>)
    ),
    security(("bearer" = []))
)]
#[tracing::instrument(skip(state))]
pub async fn status<S: DocumentStore>(
    State(state): State<Arc<AppState<S>>>,
    ApiPath(id): ApiPath<OrderId>,
) -> Result<Envelope<OrderStatus>, ApiError> {
    let status = state.run(state.orders.get_order_status(id)).await?;
    Ok(Envelope::ok(status))
}

/// GET /v1/customer/{username}/orders/active — orders not yet delivered.
#[utoipa::path(
    get,
    path = "/v1/customer/{username}/orders/active",
    tag = "orders",
    params(("username" = String, Path, description = "Customer username")),
    responses(
        (status = 200, description = "Active orders, oldest first", body = Envelope<Vec<Order>>)
    ),
    security(("bearer" = []))
)]
#[tracing::instrument(skip(state))]
pub async fn list_active<S: DocumentStore>(
    State(state): State<Arc<AppState<S>>>,
    ApiPath(username): ApiPath<String>,
) -> Result<Envelope<Vec<Order>>, ApiError> {
    let orders = state
        .run(state.orders.list_orders_active(&username))
        .await?;
    Ok(Envelope::ok(orders))
}

/// GET /v1/customer/{username}/orders/history — delivered or cancelled orders.
#[utoipa::path(
    get,
    path = "/v1/customer/{username}/orders/history",
    tag = "orders",
    params(("username" = String, Path, description = "Customer username")),
    responses(
        (status = 200, description = "Past orders, oldest first", body = Envelope<Vec<Order>>)
    ),
    security(("bearer" = []))
)]
#[tracing::instrument(skip(state))]
pub async fn list_history<S: DocumentStore>(
    State(state): State<Arc<AppState<S>>>,
    ApiPath(username): ApiPath<String>,
) -> Result<Envelope<Vec<Order>>, ApiError> {
    let orders = state
        .run(state.orders.list_orders_history(&username))
        .await?;
    Ok(Envelope::ok(orders))
}

/// PUT /v1/customer/orders/{id}/cart — upsert cart quantities.
#[utoipa::path(
    put,
    path = "/v1/customer/orders/{id}/cart",
    tag = "orders",
    params(("id" = String, Path, description = "Order id")),
    request_body = OrderUpdateCart,
    responses(
        (status = 200, description = "Cart updated", body = Envelope<UpdateResult>),
        (status = 400, description = "Malformed payload", body = Envelope<String>),
        (status = 500, description = "Order missing or already out for delivery", body = Envelope<String>)
    ),
    security(("bearer" = []))
)]
#[tracing::instrument(skip(state, params))]
pub async fn update_cart<S: DocumentStore>(
    State(state): State<Arc<AppState<S>>>,
    ApiPath(id): ApiPath<OrderId>,
    ValidatedJson(params): ValidatedJson<OrderUpdateCart>,
) -> Result<Envelope<UpdateResult>, ApiError> {
    let result = state
        .run(state.orders.update_cart_items(id, params))
        .await?;
    Ok(Envelope::ok(result))
}

/// DELETE /v1/customer/orders/{id}/cart — remove products from the cart.
#[utoipa::path(
    delete,
    path = "/v1/customer/orders/{id}/cart",
    tag = "orders",
    params(("id" = String, Path, description = "Order id")),
    request_body(content = Vec<String>, description = "Product codes to remove"),
    responses(
        (status = 200, description = "Items removed", body = Envelope<UpdateResult>),
        (status = 400, description = "Malformed payload", body = Envelope<String>),
        (status = 500, description = "Order missing or already cooking", body = Envelope<String>)
    ),
    security(("bearer" = []))
)]
#[tracing::instrument(skip(state, codes))]
pub async fn delete_cart<S: DocumentStore>(
    State(state): State<Arc<AppState<S>>>,
    ApiPath(id): ApiPath<OrderId>,
    ValidatedJson(codes): ValidatedJson<Vec<String>>,
) -> Result<Envelope<UpdateResult>, ApiError> {
    let result = state
        .run(state.orders.delete_cart_items(id, codes))
        .await?;
    Ok(Envelope::ok(result))
}

/// GET /v1/provider/orders — every order, oldest first.
#[utoipa::path(
    get,
    path = "/v1/provider/orders",
    tag = "orders",
    responses(
        (status = 200, description = "All orders", body = Envelope<Vec<Order>>)
    ),
    security(("bearer" = []))
)]
#[tracing::instrument(skip(state))]
pub async fn list<S: DocumentStore>(
    State(state): State<Arc<AppState<S>>>,
) -> Result<Envelope<Vec<Order>>, ApiError> {
    let orders = state.run(state.orders.list_orders()).await?;
    Ok(Envelope::ok(orders))
}

/// PUT /v1/provider/orders/{id}/status — overwrite the status.
#[utoipa::path(
    put,
    path = "/v1/provider/orders/{id}/status",
    tag = "orders",
    params(("id" = String, Path, description = "Order id")),
    request_body = OrderUpdateStatus,
    responses(
        (status = 200, description = "Status updated", body = Envelope<UpdateResult>),
        (status = 400, description = "Unknown status label", body = Envelope<String>),
        (status = 500, description = "Order not found", body = Envelope<String>)
    ),
    security(("bearer" = []))
)]
#[tracing::instrument(skip(state, params))]
pub async fn update_status<S: DocumentStore>(
    State(state): State<Arc<AppState<S>>>,
    ApiPath(id): ApiPath<OrderId>,
    ValidatedJson(params): ValidatedJson<OrderUpdateStatus>,
) -> Result<Envelope<UpdateResult>, ApiError> {
    let result = state.run(state.orders.update_status(id, params)).await?;
    Ok(Envelope::ok(result))
}
