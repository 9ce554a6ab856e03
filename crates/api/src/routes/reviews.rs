//! Review endpoints.

use std::sync::Arc;

use axum::extract::State;
use common::{OrderId, Review, ReviewView};
use domain::ReviewOrderCreate;
use store::{DocumentStore, InsertResult};

use crate::envelope::Envelope;
use crate::error::ApiError;
use crate::extract::{ApiPath, ValidatedJson};
use crate::state::AppState;

/// POST /v1/customer/reviews/orders/{id} — review an order and its products.
///
/// Product tallies are applied one at a time; an unknown product code fails
/// the request after the earlier tallies were already recorded.
#[utoipa::path(
    post,
    path = "/v1/customer/reviews/orders/{id}",
    tag = "reviews",
    params(("id" = String, Path, description = "Order id")),
    request_body = ReviewOrderCreate,
    responses(
        (status = 201, description = "Review stored", body = Envelope<InsertResult>),
        (status = 400, description = "Malformed payload or rating out of range", body = Envelope<String>),
        (status = 500, description = "Order or product missing, or order already reviewed", body = Envelope<String>)
    ),
    security(("bearer" = []))
)]
#[tracing::instrument(skip(state, params))]
pub async fn create<S: DocumentStore>(
    State(state): State<Arc<AppState<S>>>,
    ApiPath(id): ApiPath<OrderId>,
    ValidatedJson(params): ValidatedJson<ReviewOrderCreate>,
) -> Result<Envelope<InsertResult>, ApiError> {
    let result = state.run(state.reviews.create_review(id, params)).await?;
    Ok(Envelope::created(result))
}

/// GET /v1/customer/reviews/products/{code} — one product's reviews.
#[utoipa::path(
    get,
    path = "/v1/customer/reviews/products/{code}",
    tag = "reviews",
    params(("code" = String, Path, description = "Product code")),
    responses(
        (status = 200, description = "Reviews ordered by order id", body = Envelope<Vec<ReviewView>>)
    ),
    security(("bearer" = []))
)]
#[tracing::instrument(skip(state))]
pub async fn list_for_product<S: DocumentStore>(
    State(state): State<Arc<AppState<S>>>,
    ApiPath(code): ApiPath<String>,
) -> Result<Envelope<Vec<ReviewView>>, ApiError> {
    let views = state
        .run(state.reviews.list_product_reviews(&code))
        .await?;
    Ok(Envelope::ok(views))
}

/// GET /v1/provider/reviews/orders — every order review.
#[utoipa::path(
    get,
    path = "/v1/provider/reviews/orders",
    tag = "reviews",
    responses(
        (status = 200, description = "Reviews ordered by order id", body = Envelope<Vec<Review>>)
    ),
    security(("bearer" = []))
)]
#[tracing::instrument(skip(state))]
pub async fn list<S: DocumentStore>(
    State(state): State<Arc<AppState<S>>>,
) -> Result<Envelope<Vec<Review>>, ApiError> {
    let reviews = state.run(state.reviews.list_reviews()).await?;
    Ok(Envelope::ok(reviews))
}
