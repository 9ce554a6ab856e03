//! Order reviews and per-product review tallies.

use common::{OrderId, Review, ReviewView};
use store::{DocumentStore, InsertResult, ReviewTally};

use crate::dto::{ReviewOrderCreate, Validate};
use crate::error::DomainError;

/// Service for submitting and reading reviews.
#[derive(Clone)]
pub struct ReviewService<S: DocumentStore> {
    store: S,
}

impl<S: DocumentStore> ReviewService<S> {
    /// Creates a new review service over the given store.
    pub fn new(store: S) -> Self {
        Self { store }
    }

    /// Returns a reference to the underlying store.
    pub fn store(&self) -> &S {
        &self.store
    }

    /// Reviews an order.
    ///
    /// Each product review bumps its product's counters with one atomic
    /// update, in payload order. The increments are not transactional: if a
    /// later product code is unknown the call fails with `NotFound` and the
    /// counters already applied stay in place. The review document is only
    /// stored once every increment succeeded.
    #[tracing::instrument(skip(self, params), fields(rating = params.rating))]
    pub async fn create_review(
        &self,
        order_id: OrderId,
        params: ReviewOrderCreate,
    ) -> Result<InsertResult, DomainError> {
        params.validate()?;

        let order = self
            .store
            .find_order(order_id)
            .await?
            .ok_or_else(|| DomainError::order_not_found(order_id))?;

        if self.store.find_review(order_id).await?.is_some() {
            return Err(DomainError::AlreadyReviewed(order_id));
        }

        for product_review in &params.product_reviews {
            let tally = ReviewTally {
                username: order.username().to_string(),
                rating: params.rating,
                liked: product_review.is_liked,
            };
            let result = self
                .store
                .apply_review_tally(&product_review.product_code, &tally)
                .await?;
            if result.is_unmatched() {
                tracing::warn!(
                    code = %product_review.product_code,
                    "reviewed product not found, earlier tallies kept"
                );
                return Err(DomainError::product_not_found(
                    &product_review.product_code,
                ));
            }
        }

        let review = Review {
            order_id,
            username: order.user.username,
            rating: params.rating,
            comment: params.comment,
            product_reviews: params.product_reviews,
        };
        let result = self.store.insert_review(&review).await?;

        metrics::counter!("reviews_submitted_total").increment(1);
        tracing::info!(%order_id, "review submitted");
        Ok(result)
    }

    /// Lists every order review ordered by order id.
    #[tracing::instrument(skip(self))]
    pub async fn list_reviews(&self) -> Result<Vec<Review>, DomainError> {
        Ok(self.store.list_reviews().await?)
    }

    /// Collects the sub-reviews of one product across all order reviews,
    /// ordered by order id.
    #[tracing::instrument(skip(self))]
    pub async fn list_product_reviews(&self, code: &str) -> Result<Vec<ReviewView>, DomainError> {
        let reviews = self.store.list_reviews().await?;
        Ok(reviews
            .iter()
            .flat_map(|review| review.views_for(code))
            .collect())
    }
}

#[cfg(test)]
mod tests {
    use std::collections::BTreeMap;

    use chrono::Utc;
    use common::{Order, Product, ProductInfo, ProductReview, User};
    use store::{InMemoryStore, OrderStore, ProductStore};

    use super::*;

    async fn seed(store: &InMemoryStore, codes: &[&str]) -> OrderId {
        for code in codes {
            let info = ProductInfo {
                code: code.to_string(),
                name: code.to_uppercase(),
                origin: "Korea".to_string(),
                price: 4.0,
                limit: 10,
                can_order: true,
            };
            store
                .insert_product(&Product::new(info, Utc::now()))
                .await
                .unwrap();
        }
        let order = Order::new(
            User::named("abc1"),
            BTreeMap::from([("bc01".to_string(), 1)]),
            Utc::now(),
        );
        store.insert_order(&order).await.unwrap();
        order.id
    }

    fn params(rating: f64, codes: &[(&str, bool)]) -> ReviewOrderCreate {
        ReviewOrderCreate {
            rating,
            comment: "Incredible!".to_string(),
            product_reviews: codes
                .iter()
                .map(|(code, liked)| ProductReview {
                    product_code: code.to_string(),
                    is_liked: *liked,
                    comment: String::new(),
                })
                .collect(),
        }
    }

    #[tokio::test]
    async fn test_review_updates_product_stats() {
        let store = InMemoryStore::new();
        let order_id = seed(&store, &["bc01"]).await;
        let service = ReviewService::new(store.clone());

        let result = service
            .create_review(order_id, params(4.0, &[("bc01", true)]))
            .await
            .unwrap();
        assert_eq!(result.inserted_id, order_id.to_string());

        let stats = store.find_product("bc01").await.unwrap().unwrap().stats;
        assert_eq!(stats.review_count, 1);
        assert_eq!(stats.like_count, 1);
        assert_eq!(stats.rating(), 4.0);
        assert_eq!(stats.user_orders["abc1"], 1);

        let views = service.list_product_reviews("bc01").await.unwrap();
        assert_eq!(views.len(), 1);
        assert_eq!(views[0].username, "abc1");
        assert_eq!(views[0].rating, 4.0);
    }

    #[tokio::test]
    async fn test_second_review_is_rejected_before_tallies() {
        let store = InMemoryStore::new();
        let order_id = seed(&store, &["bc01"]).await;
        let service = ReviewService::new(store.clone());

        service
            .create_review(order_id, params(4.0, &[("bc01", true)]))
            .await
            .unwrap();
        let err = service
            .create_review(order_id, params(1.0, &[("bc01", false)]))
            .await
            .unwrap_err();
        assert!(matches!(err, DomainError::AlreadyReviewed(id) if id == order_id));

        let stats = store.find_product("bc01").await.unwrap().unwrap().stats;
        assert_eq!(stats.review_count, 1);
    }

    #[tokio::test]
    async fn test_review_of_missing_order_is_not_found() {
        let service = ReviewService::new(InMemoryStore::new());
        let err = service
            .create_review(OrderId::new(), params(3.0, &[]))
            .await
            .unwrap_err();
        assert!(err.is_not_found());
    }
}
