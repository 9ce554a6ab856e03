use std::collections::{BTreeMap, HashMap};
use std::sync::Arc;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use common::{Order, OrderId, OrderStatus, Product, Review};
use tokio::sync::RwLock;

use crate::{
    OrderQuery, ProductQuery, Result, StoreError,
    store::{
        InsertResult, OrderStore, ProductPatch, ProductStore, ReviewStore, ReviewTally,
        UpdateResult,
    },
};

/// In-memory document store for tests and local runs.
///
/// Collections are keyed the same way the PostgreSQL tables are, so
/// uniqueness rules behave identically.
#[derive(Clone, Default)]
pub struct InMemoryStore {
    products: Arc<RwLock<BTreeMap<String, Product>>>,
    orders: Arc<RwLock<HashMap<OrderId, Order>>>,
    reviews: Arc<RwLock<BTreeMap<OrderId, Review>>>,
}

impl InMemoryStore {
    /// Creates a new empty in-memory store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the number of stored products, hidden ones included.
    pub async fn product_count(&self) -> usize {
        self.products.read().await.len()
    }

    /// Returns the number of stored orders.
    pub async fn order_count(&self) -> usize {
        self.orders.read().await.len()
    }

    /// Clears every collection.
    pub async fn clear(&self) {
        self.products.write().await.clear();
        self.orders.write().await.clear();
        self.reviews.write().await.clear();
    }

    async fn update_order<F>(&self, id: OrderId, at: DateTime<Utc>, apply: F) -> UpdateResult
    where
        F: FnOnce(&mut Order) + Send,
    {
        let mut orders = self.orders.write().await;
        match orders.get_mut(&id) {
            Some(order) => {
                apply(order);
                order.updated_at = at;
                UpdateResult::matched(1)
            }
            None => UpdateResult::matched(0),
        }
    }

    async fn update_product_doc<F>(&self, code: &str, apply: F) -> UpdateResult
    where
        F: FnOnce(&mut Product) + Send,
    {
        let mut products = self.products.write().await;
        match products.get_mut(code) {
            Some(product) => {
                apply(product);
                UpdateResult::matched(1)
            }
            None => UpdateResult::matched(0),
        }
    }
}

#[async_trait]
impl ProductStore for InMemoryStore {
    async fn insert_product(&self, product: &Product) -> Result<InsertResult> {
        let mut products = self.products.write().await;
        if products.contains_key(product.code()) {
            return Err(StoreError::DuplicateKey {
                collection: "products",
                key: product.code().to_string(),
            });
        }
        products.insert(product.code().to_string(), product.clone());
        Ok(InsertResult::new(product.code()))
    }

    async fn find_product(&self, code: &str) -> Result<Option<Product>> {
        Ok(self.products.read().await.get(code).cloned())
    }

    async fn list_products(&self, query: &ProductQuery) -> Result<Vec<Product>> {
        let products = self.products.read().await;
        let mut matching: Vec<_> = products
            .values()
            .filter(|p| query.matches(p))
            .cloned()
            .collect();
        matching.sort_by(|a, b| query.sort.compare(a, b));
        Ok(matching)
    }

    async fn update_product(
        &self,
        code: &str,
        patch: &ProductPatch,
        at: DateTime<Utc>,
    ) -> Result<UpdateResult> {
        Ok(self
            .update_product_doc(code, |product| {
                product.info.name = patch.name.clone();
                product.info.origin = patch.origin.clone();
                product.info.price = patch.price;
                product.info.limit = patch.limit;
                product.info.can_order = patch.can_order;
                product.can_view = patch.can_view;
                product.updated_at = at;
            })
            .await)
    }

    async fn hide_product(&self, code: &str, at: DateTime<Utc>) -> Result<UpdateResult> {
        Ok(self
            .update_product_doc(code, |product| {
                product.can_view = false;
                product.updated_at = at;
            })
            .await)
    }

    async fn apply_review_tally(&self, code: &str, tally: &ReviewTally) -> Result<UpdateResult> {
        Ok(self
            .update_product_doc(code, |product| {
                let stats = &mut product.stats;
                *stats.user_orders.entry(tally.username.clone()).or_insert(0) += 1;
                stats.review_count += 1;
                stats.rating_sum += tally.rating;
                stats.like_count += tally.like_increment();
            })
            .await)
    }
}

#[async_trait]
impl OrderStore for InMemoryStore {
    async fn insert_order(&self, order: &Order) -> Result<InsertResult> {
        let mut orders = self.orders.write().await;
        if orders.contains_key(&order.id) {
            return Err(StoreError::DuplicateKey {
                collection: "orders",
                key: order.id.to_string(),
            });
        }
        orders.insert(order.id, order.clone());
        Ok(InsertResult::new(order.id.to_string()))
    }

    async fn find_order(&self, id: OrderId) -> Result<Option<Order>> {
        Ok(self.orders.read().await.get(&id).cloned())
    }

    async fn list_orders(&self, query: &OrderQuery) -> Result<Vec<Order>> {
        let orders = self.orders.read().await;
        let mut matching: Vec<_> = orders
            .values()
            .filter(|o| query.matches(o))
            .cloned()
            .collect();
        matching.sort_by(|a, b| a.created_at.cmp(&b.created_at).then(a.id.cmp(&b.id)));
        Ok(matching)
    }

    async fn set_order_status(
        &self,
        id: OrderId,
        status: OrderStatus,
        at: DateTime<Utc>,
    ) -> Result<UpdateResult> {
        Ok(self.update_order(id, at, |order| order.status = status).await)
    }

    async fn merge_cart_items(
        &self,
        id: OrderId,
        items: &BTreeMap<String, u32>,
        at: DateTime<Utc>,
    ) -> Result<UpdateResult> {
        Ok(self
            .update_order(id, at, |order| {
                order
                    .cart
                    .extend(items.iter().map(|(code, qty)| (code.clone(), *qty)));
            })
            .await)
    }

    async fn remove_cart_items(
        &self,
        id: OrderId,
        codes: &[String],
        at: DateTime<Utc>,
    ) -> Result<UpdateResult> {
        Ok(self
            .update_order(id, at, |order| {
                for code in codes {
                    order.cart.remove(code);
                }
            })
            .await)
    }
}

#[async_trait]
impl ReviewStore for InMemoryStore {
    async fn insert_review(&self, review: &Review) -> Result<InsertResult> {
        let mut reviews = self.reviews.write().await;
        if reviews.contains_key(&review.order_id) {
            return Err(StoreError::DuplicateKey {
                collection: "reviews",
                key: review.order_id.to_string(),
            });
        }
        reviews.insert(review.order_id, review.clone());
        Ok(InsertResult::new(review.order_id.to_string()))
    }

    async fn find_review(&self, order_id: OrderId) -> Result<Option<Review>> {
        Ok(self.reviews.read().await.get(&order_id).cloned())
    }

    async fn list_reviews(&self) -> Result<Vec<Review>> {
        Ok(self.reviews.read().await.values().cloned().collect())
    }
}
