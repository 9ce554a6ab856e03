//! Order status labels.

use serde::{Deserialize, Serialize};
use thiserror::Error;
use utoipa::ToSchema;

/// The status of an order in its lifecycle.
///
/// Labels are totally ordered by declaration:
/// ```text
/// Submitting ─► Submitted ─► Cooking ─► Cooked ─► Delivering ─► Delivered ─► Cancelled
/// ```
///
/// Cart guards compare against fixed thresholds on this order rather than
/// checking adjacency, so a provider may set any label at any time.
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    PartialOrd,
    Ord,
    Hash,
    Serialize,
    Deserialize,
    Default,
    ToSchema,
)]
pub enum OrderStatus {
    /// Checkout in progress; the initial status of every order.
    #[default]
    Submitting,

    /// Received by the provider.
    Submitted,

    /// Being prepared. Items can no longer be removed from here on.
    Cooking,

    /// Prepared, waiting for pickup.
    Cooked,

    /// On its way. The cart is frozen from here on.
    Delivering,

    /// Handed over to the customer. First status counted as history.
    Delivered,

    /// Cancelled by the provider.
    Cancelled,
}

/// Error returned when parsing a label that is not one of the seven statuses.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("unknown order status: {0}")]
pub struct UnknownStatus(pub String);

impl OrderStatus {
    /// All statuses in lifecycle order.
    pub const ALL: [OrderStatus; 7] = [
        OrderStatus::Submitting,
        OrderStatus::Submitted,
        OrderStatus::Cooking,
        OrderStatus::Cooked,
        OrderStatus::Delivering,
        OrderStatus::Delivered,
        OrderStatus::Cancelled,
    ];

    /// Returns the position of this status in the lifecycle (0..=6).
    pub fn rank(&self) -> i16 {
        match self {
            OrderStatus::Submitting => 0,
            OrderStatus::Submitted => 1,
            OrderStatus::Cooking => 2,
            OrderStatus::Cooked => 3,
            OrderStatus::Delivering => 4,
            OrderStatus::Delivered => 5,
            OrderStatus::Cancelled => 6,
        }
    }

    /// Returns true if cart quantities may still be set in this status.
    pub fn allows_cart_edit(&self) -> bool {
        *self < OrderStatus::Delivering
    }

    /// Returns true if cart items may still be removed in this status.
    pub fn allows_item_removal(&self) -> bool {
        *self < OrderStatus::Cooking
    }

    /// Returns true if the order counts as active (not yet in history).
    pub fn is_active(&self) -> bool {
        *self < OrderStatus::Delivered
    }

    /// Returns the status label.
    pub fn as_str(&self) -> &'static str {
        match self {
            OrderStatus::Submitting => "Submitting",
            OrderStatus::Submitted => "Submitted",
            OrderStatus::Cooking => "Cooking",
            OrderStatus::Cooked => "Cooked",
            OrderStatus::Delivering => "Delivering",
            OrderStatus::Delivered => "Delivered",
            OrderStatus::Cancelled => "Cancelled",
        }
    }
}

impl std::fmt::Display for OrderStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl std::str::FromStr for OrderStatus {
    type Err = UnknownStatus;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        OrderStatus::ALL
            .into_iter()
            .find(|status| status.as_str() == s)
            .ok_or_else(|| UnknownStatus(s.to_string()))
    }
}
