//! Catalog endpoints.

use std::sync::Arc;

use axum::extract::State;
use common::Product;
use domain::{ProductCreate, ProductUpdate};
use serde::Deserialize;
use store::{DocumentStore, InsertResult, ProductSort, UpdateResult};
use utoipa::IntoParams;

use crate::envelope::Envelope;
use crate::error::ApiError;
use crate::extract::{ApiPath, ApiQuery, ValidatedJson};
use crate::state::AppState;

/// Listing options.
#[derive(Debug, Default, Deserialize, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct SortParams {
    /// Ranking key; product code when omitted.
    #[serde(default)]
    pub sort: ProductSort,
}

/// GET /v1/customer/products — visible products, ranked.
#[utoipa::path(
    get,
    path = "/v1/customer/products",
    tag = "products",
    params(SortParams),
    responses(
        (status = 200, description = "Visible products", body = Envelope<Vec<Product>>),
        (status = 400, description = "Unknown sort key", body = Envelope<String>)
    ),
    security(("bearer" = []))
)]
#[tracing::instrument(skip(state))]
pub async fn list_visible<S: DocumentStore>(
    State(state): State<Arc<AppState<S>>>,
    ApiQuery(params): ApiQuery<SortParams>,
) -> Result<Envelope<Vec<Product>>, ApiError> {
    let products = state.run(state.products.list_visible(params.sort)).await?;
    Ok(Envelope::ok(products))
}

/// GET /v1/customer/products/{code} — one product, hidden or not.
#[utoipa::path(
    get,
    path = "/v1/customer/products/{code}",
    tag = "products",
    params(("code" = String, Path, description = "Product code")),
    responses(
        (status = 200, description = "The product", body = Envelope<Product>),
        (status = 500, description = "Product not found", body = Envelope<String>)
    ),
    security(("bearer" = []))
)]
#[tracing::instrument(skip(state))]
pub async fn get<S: DocumentStore>(
    State(state): State<Arc<AppState<S>>>,
    ApiPath(code): ApiPath<String>,
) -> Result<Envelope<Product>, ApiError> {
    let product = state.run(state.products.get(&code)).await?;
    Ok(Envelope::ok(product))
}

/// GET /v1/provider/products — every product including hidden ones.
#[utoipa::path(
    get,
    path = "/v1/provider/products",
    tag = "products",
    params(SortParams),
    responses(
        (status = 200, description = "All products", body = Envelope<Vec<Product>>),
        (status = 400, description = "Unknown sort key", body = Envelope<String>)
    ),
    security(("bearer" = []))
)]
#[tracing::instrument(skip(state))]
pub async fn list_all<S: DocumentStore>(
    State(state): State<Arc<AppState<S>>>,
    ApiQuery(params): ApiQuery<SortParams>,
) -> Result<Envelope<Vec<Product>>, ApiError> {
    let products = state.run(state.products.list_all(params.sort)).await?;
    Ok(Envelope::ok(products))
}

/// POST /v1/provider/products — add a product.
#[utoipa::path(
    post,
    path = "/v1/provider/products",
    tag = "products",
    request_body = ProductCreate,
    responses(
        (status = 201, description = "Product created", body = Envelope<InsertResult>),
        (status = 400, description = "Malformed payload", body = Envelope<String>),
        (status = 500, description = "Duplicate code or store failure", body = Envelope<String>)
    ),
    security(("bearer" = []))
)]
#[tracing::instrument(skip(state, params))]
pub async fn create<S: DocumentStore>(
    State(state): State<Arc<AppState<S>>>,
    ValidatedJson(params): ValidatedJson<ProductCreate>,
) -> Result<Envelope<InsertResult>, ApiError> {
    let result = state.run(state.products.create(params)).await?;
    Ok(Envelope::created(result))
}

/// PUT /v1/provider/products/{code} — overwrite a product's editable fields.
#[utoipa::path(
    put,
    path = "/v1/provider/products/{code}",
    tag = "products",
    params(("code" = String, Path, description = "Product code")),
    request_body = ProductUpdate,
    responses(
        (status = 200, description = "Product updated", body = Envelope<UpdateResult>),
        (status = 400, description = "Malformed payload", body = Envelope<String>),
        (status = 500, description = "Product not found", body = Envelope<String>)
    ),
    security(("bearer" = []))
)]
#[tracing::instrument(skip(state, params))]
pub async fn update<S: DocumentStore>(
    State(state): State<Arc<AppState<S>>>,
    ApiPath(code): ApiPath<String>,
    ValidatedJson(params): ValidatedJson<ProductUpdate>,
) -> Result<Envelope<UpdateResult>, ApiError> {
    let result = state.run(state.products.update(&code, params)).await?;
    Ok(Envelope::ok(result))
}

/// DELETE /v1/provider/products/{code} — hide a product from customers.
#[utoipa::path(
    delete,
    path = "/v1/provider/products/{code}",
    tag = "products",
    params(("code" = String, Path, description = "Product code")),
    responses(
        (status = 200, description = "Product hidden", body = Envelope<UpdateResult>),
        (status = 500, description = "Product not found", body = Envelope<String>)
    ),
    security(("bearer" = []))
)]
#[tracing::instrument(skip(state))]
pub async fn delete<S: DocumentStore>(
    State(state): State<Arc<AppState<S>>>,
    ApiPath(code): ApiPath<String>,
) -> Result<Envelope<UpdateResult>, ApiError> {
    let result = state.run(state.products.delete(&code)).await?;
    Ok(Envelope::ok(result))
}
