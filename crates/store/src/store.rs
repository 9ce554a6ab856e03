use std::collections::BTreeMap;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use common::{Order, OrderId, OrderStatus, Product, Review};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use crate::{OrderQuery, ProductQuery, Result};

/// Outcome of inserting a document.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct InsertResult {
    /// Key of the new document: the product code, or the order id for
    /// orders and reviews.
    pub inserted_id: String,
}

impl InsertResult {
    pub fn new(inserted_id: impl Into<String>) -> Self {
        Self {
            inserted_id: inserted_id.into(),
        }
    }
}

/// Outcome of an update: how many documents matched the filter and how many
/// were rewritten.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct UpdateResult {
    pub matched_count: u64,
    pub modified_count: u64,
}

impl UpdateResult {
    /// Every matched document is rewritten since updates always touch
    /// `updatedAt`.
    pub fn matched(count: u64) -> Self {
        Self {
            matched_count: count,
            modified_count: count,
        }
    }

    /// Returns true if the filter matched nothing.
    pub fn is_unmatched(&self) -> bool {
        self.matched_count == 0
    }
}

/// Replacement values for the provider-editable product fields.
#[derive(Debug, Clone, PartialEq)]
pub struct ProductPatch {
    pub name: String,
    pub origin: String,
    pub price: f64,
    pub limit: u32,
    pub can_order: bool,
    pub can_view: bool,
}

/// Counter increments one product review applies to its product.
#[derive(Debug, Clone, PartialEq)]
pub struct ReviewTally {
    /// Reviewer whose per-user order count is bumped.
    pub username: String,
    /// Added to the rating sum.
    pub rating: f64,
    /// Adds one like when set.
    pub liked: bool,
}

impl ReviewTally {
    /// The like-count increment for this review.
    pub fn like_increment(&self) -> u64 {
        u64::from(self.liked)
    }
}

/// The `products` collection.
#[async_trait]
pub trait ProductStore: Send + Sync {
    /// Inserts a product. Fails with `DuplicateKey` if the code is taken.
    async fn insert_product(&self, product: &Product) -> Result<InsertResult>;

    /// Looks up a product by code, hidden or not.
    async fn find_product(&self, code: &str) -> Result<Option<Product>>;

    /// Lists products passing the query's filter in the query's order.
    async fn list_products(&self, query: &ProductQuery) -> Result<Vec<Product>>;

    /// Overwrites the editable fields of a product.
    async fn update_product(
        &self,
        code: &str,
        patch: &ProductPatch,
        at: DateTime<Utc>,
    ) -> Result<UpdateResult>;

    /// Soft-deletes a product by clearing its `can_view` flag.
    async fn hide_product(&self, code: &str, at: DateTime<Utc>) -> Result<UpdateResult>;

    /// Atomically applies one product review's counter increments.
    async fn apply_review_tally(&self, code: &str, tally: &ReviewTally) -> Result<UpdateResult>;
}

/// The `orders` collection.
#[async_trait]
pub trait OrderStore: Send + Sync {
    async fn insert_order(&self, order: &Order) -> Result<InsertResult>;

    async fn find_order(&self, id: OrderId) -> Result<Option<Order>>;

    /// Lists matching orders, oldest first.
    async fn list_orders(&self, query: &OrderQuery) -> Result<Vec<Order>>;

    async fn set_order_status(
        &self,
        id: OrderId,
        status: OrderStatus,
        at: DateTime<Utc>,
    ) -> Result<UpdateResult>;

    /// Sets each given code to its quantity, keeping the other cart entries.
    async fn merge_cart_items(
        &self,
        id: OrderId,
        items: &BTreeMap<String, u32>,
        at: DateTime<Utc>,
    ) -> Result<UpdateResult>;

    /// Drops the given codes from the cart. Absent codes are ignored.
    async fn remove_cart_items(
        &self,
        id: OrderId,
        codes: &[String],
        at: DateTime<Utc>,
    ) -> Result<UpdateResult>;
}

/// The `reviews` collection.
#[async_trait]
pub trait ReviewStore: Send + Sync {
    /// Inserts a review. Fails with `DuplicateKey` if the order already has one.
    async fn insert_review(&self, review: &Review) -> Result<InsertResult>;

    async fn find_review(&self, order_id: OrderId) -> Result<Option<Review>>;

    /// Lists every review ordered by order id.
    async fn list_reviews(&self) -> Result<Vec<Review>>;
}

/// A store exposing all three collections.
pub trait DocumentStore: ProductStore + OrderStore + ReviewStore + Clone + 'static {}

impl<T> DocumentStore for T where T: ProductStore + OrderStore + ReviewStore + Clone + 'static {}
