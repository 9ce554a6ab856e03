//! Domain error types.

use common::{OrderId, OrderStatus};
use store::StoreError;
use thiserror::Error;

/// A request payload that fails its field rules.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ValidationError {
    #[error("product code must not be empty")]
    EmptyCode,

    #[error("product name must not be empty")]
    EmptyName,

    #[error("price must be a non-negative number, got {0}")]
    InvalidPrice(f64),

    #[error("username must not be empty")]
    EmptyUsername,

    #[error("cart must contain at least one item")]
    EmptyCart,

    #[error("quantity for {code} must be at least 1")]
    ZeroQuantity { code: String },

    #[error("no product codes given")]
    NoCodes,

    #[error("rating must be between 0 and 5, got {0}")]
    RatingOutOfRange(f64),
}

/// Errors that can occur during domain operations.
#[derive(Debug, Error)]
pub enum DomainError {
    /// The request payload is malformed.
    #[error("Validation error: {0}")]
    Validation(#[from] ValidationError),

    /// No record matched the given key.
    #[error("{entity} not found: {key}")]
    NotFound { entity: &'static str, key: String },

    /// The order's lifecycle stage forbids the operation.
    #[error("{operation} not allowed for order {order_id} in status {status}")]
    InvalidState {
        order_id: OrderId,
        status: OrderStatus,
        operation: &'static str,
    },

    /// The order already carries a review.
    #[error("order {0} has already been reviewed")]
    AlreadyReviewed(OrderId),

    /// An error occurred in the document store.
    #[error("Store error: {0}")]
    Store(#[from] StoreError),
}

impl DomainError {
    pub(crate) fn product_not_found(code: &str) -> Self {
        DomainError::NotFound {
            entity: "product",
            key: code.to_string(),
        }
    }

    pub(crate) fn order_not_found(id: OrderId) -> Self {
        DomainError::NotFound {
            entity: "order",
            key: id.to_string(),
        }
    }

    /// Returns true for errors caused by a missing record.
    pub fn is_not_found(&self) -> bool {
        matches!(self, DomainError::NotFound { .. })
    }
}
