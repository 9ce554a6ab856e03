//! Order lifecycle.
//!
//! Orders move through [`OrderStatus`] in its declared order. Cart edits are
//! gated by threshold checks on that order: quantities can change until the
//! order is out for delivery, and items can be removed only before cooking
//! starts. Status changes themselves are not checked against a transition
//! table, so a provider may set any label at any time.

use chrono::Utc;
use common::{Order, OrderId, OrderStatus};
use store::{DocumentStore, InsertResult, OrderQuery, UpdateResult};

use crate::dto::{OrderCreate, OrderUpdateCart, OrderUpdateStatus, Validate};
use crate::error::DomainError;

/// Service for placing and tracking orders.
#[derive(Clone)]
pub struct OrderService<S: DocumentStore> {
    store: S,
}

impl<S: DocumentStore> OrderService<S> {
    /// Creates a new order service over the given store.
    pub fn new(store: S) -> Self {
        Self { store }
    }

    /// Returns a reference to the underlying store.
    pub fn store(&self) -> &S {
        &self.store
    }

    /// Checks out a cart. The new order starts in `Submitting`.
    #[tracing::instrument(skip(self, params), fields(username = %params.user.username))]
    pub async fn create_order(&self, params: OrderCreate) -> Result<InsertResult, DomainError> {
        params.validate()?;

        let order = Order::new(params.user, params.cart, Utc::now());
        let result = self.store.insert_order(&order).await?;

        metrics::counter!("orders_created_total").increment(1);
        tracing::info!(order_id = %order.id, "order created");
        Ok(result)
    }

    /// Loads an order by id.
    #[tracing::instrument(skip(self))]
    pub async fn get_order(&self, id: OrderId) -> Result<Order, DomainError> {
        self.store
            .find_order(id)
            .await?
            .ok_or_else(|| DomainError::order_not_found(id))
    }

    /// Returns only the order's status.
    #[tracing::instrument(skip(self))]
    pub async fn get_order_status(&self, id: OrderId) -> Result<OrderStatus, DomainError> {
        Ok(self.get_order(id).await?.status)
    }

    /// Lists every order, oldest first.
    #[tracing::instrument(skip(self))]
    pub async fn list_orders(&self) -> Result<Vec<Order>, DomainError> {
        Ok(self.store.list_orders(&OrderQuery::new()).await?)
    }

    /// Lists a customer's orders that are not yet delivered.
    #[tracing::instrument(skip(self))]
    pub async fn list_orders_active(&self, username: &str) -> Result<Vec<Order>, DomainError> {
        Ok(self
            .store
            .list_orders(&OrderQuery::active_for(username))
            .await?)
    }

    /// Lists a customer's delivered or cancelled orders.
    #[tracing::instrument(skip(self))]
    pub async fn list_orders_history(&self, username: &str) -> Result<Vec<Order>, DomainError> {
        Ok(self
            .store
            .list_orders(&OrderQuery::history_for(username))
            .await?)
    }

    /// Overwrites the status. Any label is accepted from any state.
    #[tracing::instrument(skip(self, params), fields(status = %params.status))]
    pub async fn update_status(
        &self,
        id: OrderId,
        params: OrderUpdateStatus,
    ) -> Result<UpdateResult, DomainError> {
        let result = self
            .store
            .set_order_status(id, params.status, Utc::now())
            .await?;
        if result.is_unmatched() {
            return Err(DomainError::order_not_found(id));
        }

        metrics::counter!("order_status_updates_total", "status" => params.status.as_str())
            .increment(1);
        Ok(result)
    }

    /// Sets the quantity of each given product, adding codes not yet in the
    /// cart. Rejected once the order is out for delivery.
    #[tracing::instrument(skip(self, params))]
    pub async fn update_cart_items(
        &self,
        id: OrderId,
        params: OrderUpdateCart,
    ) -> Result<UpdateResult, DomainError> {
        params.validate()?;
        self.guard(id, OrderStatus::allows_cart_edit, "updating cart items")
            .await?;

        let result = self
            .store
            .merge_cart_items(id, &params.cart, Utc::now())
            .await?;
        if result.is_unmatched() {
            return Err(DomainError::order_not_found(id));
        }
        Ok(result)
    }

    /// Drops the given products from the cart. Rejected once cooking has
    /// started.
    #[tracing::instrument(skip(self, codes))]
    pub async fn delete_cart_items(
        &self,
        id: OrderId,
        codes: Vec<String>,
    ) -> Result<UpdateResult, DomainError> {
        codes.validate()?;
        self.guard(id, OrderStatus::allows_item_removal, "removing cart items")
            .await?;

        let result = self
            .store
            .remove_cart_items(id, &codes, Utc::now())
            .await?;
        if result.is_unmatched() {
            return Err(DomainError::order_not_found(id));
        }
        Ok(result)
    }

    async fn guard(
        &self,
        id: OrderId,
        allowed: fn(&OrderStatus) -> bool,
        operation: &'static str,
    ) -> Result<(), DomainError> {
        let status = self.get_order_status(id).await?;
        if !allowed(&status) {
            tracing::warn!(order_id = %id, %status, operation, "order change rejected");
            return Err(DomainError::InvalidState {
                order_id: id,
                status,
                operation,
            });
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use std::collections::BTreeMap;

    use super::*;
    use common::User;
    use store::{InMemoryStore, OrderStore};

    fn checkout(username: &str) -> OrderCreate {
        OrderCreate {
            user: User::named(username),
            cart: BTreeMap::from([("bc01".to_string(), 2)]),
        }
    }

    async fn placed_order(service: &OrderService<InMemoryStore>) -> OrderId {
        let result = service.create_order(checkout("abc1")).await.unwrap();
        result.inserted_id.parse().unwrap()
    }

    async fn force_status(service: &OrderService<InMemoryStore>, id: OrderId, status: OrderStatus) {
        service
            .store()
            .set_order_status(id, status, Utc::now())
            .await
            .unwrap();
    }

    #[tokio::test]
    async fn test_create_order_starts_submitting() {
        let service = OrderService::new(InMemoryStore::new());
        let id = placed_order(&service).await;

        let order = service.get_order(id).await.unwrap();
        assert_eq!(order.status, OrderStatus::Submitting);
        assert_eq!(order.created_at, order.updated_at);
        assert_eq!(order.cart["bc01"], 2);
    }

    #[tokio::test]
    async fn test_missing_order_is_not_found() {
        let service = OrderService::new(InMemoryStore::new());
        let id = OrderId::new();

        assert!(service.get_order(id).await.unwrap_err().is_not_found());
        let err = service
            .update_status(
                id,
                OrderUpdateStatus {
                    status: OrderStatus::Cooking,
                },
            )
            .await
            .unwrap_err();
        assert!(err.is_not_found());
    }

    #[tokio::test]
    async fn test_cart_edit_threshold() {
        let service = OrderService::new(InMemoryStore::new());

        for status in OrderStatus::ALL {
            let id = placed_order(&service).await;
            force_status(&service, id, status).await;

            let params = OrderUpdateCart {
                cart: BTreeMap::from([("bc02".to_string(), 1)]),
            };
            let result = service.update_cart_items(id, params).await;
            if status < OrderStatus::Delivering {
                assert!(result.is_ok(), "{status} should allow cart edits");
            } else {
                assert!(
                    matches!(result, Err(DomainError::InvalidState { .. })),
                    "{status} should reject cart edits"
                );
            }
        }
    }

    #[tokio::test]
    async fn test_item_removal_threshold() {
        let service = OrderService::new(InMemoryStore::new());

        for status in OrderStatus::ALL {
            let id = placed_order(&service).await;
            force_status(&service, id, status).await;

            let result = service
                .delete_cart_items(id, vec!["bc01".to_string()])
                .await;
            if status < OrderStatus::Cooking {
                assert!(result.is_ok(), "{status} should allow removal");
                assert!(service.get_order(id).await.unwrap().cart.is_empty());
            } else {
                assert!(
                    matches!(result, Err(DomainError::InvalidState { .. })),
                    "{status} should reject removal"
                );
            }
        }
    }

    #[tokio::test]
    async fn test_update_cart_merges_quantities() {
        let service = OrderService::new(InMemoryStore::new());
        let id = placed_order(&service).await;

        let params = OrderUpdateCart {
            cart: BTreeMap::from([("bc01".to_string(), 5), ("bc02".to_string(), 1)]),
        };
        service.update_cart_items(id, params).await.unwrap();

        let cart = service.get_order(id).await.unwrap().cart;
        assert_eq!(cart["bc01"], 5);
        assert_eq!(cart["bc02"], 1);
    }
}
