use std::cmp::Ordering;

use common::{Order, OrderStatus, Product};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

/// Which part of an order's lifecycle a listing covers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum OrderPhase {
    /// Every order regardless of status.
    #[default]
    All,
    /// Orders not yet delivered.
    Active,
    /// Delivered or cancelled orders.
    History,
}

impl OrderPhase {
    /// Returns true if an order in `status` belongs to this phase.
    pub fn includes(&self, status: OrderStatus) -> bool {
        match self {
            OrderPhase::All => true,
            OrderPhase::Active => status.is_active(),
            OrderPhase::History => !status.is_active(),
        }
    }
}

/// Filter for order listings. Results are always sorted by creation time,
/// oldest first.
#[derive(Debug, Clone, Default)]
pub struct OrderQuery {
    /// Filter by the username captured at checkout.
    pub username: Option<String>,

    /// Filter by lifecycle phase.
    pub phase: OrderPhase,
}

impl OrderQuery {
    /// Creates a query matching every order.
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a query for a customer's active orders.
    pub fn active_for(username: impl Into<String>) -> Self {
        Self {
            username: Some(username.into()),
            phase: OrderPhase::Active,
        }
    }

    /// Creates a query for a customer's past orders.
    pub fn history_for(username: impl Into<String>) -> Self {
        Self {
            username: Some(username.into()),
            phase: OrderPhase::History,
        }
    }

    /// Returns true if `order` passes every filter.
    pub fn matches(&self, order: &Order) -> bool {
        if let Some(ref username) = self.username
            && order.username() != username.as_str()
        {
            return false;
        }
        self.phase.includes(order.status)
    }
}

/// Whether hidden (soft-deleted) products are listed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Visibility {
    #[default]
    All,
    /// Only products with `can_view` set.
    Visible,
}

/// Product ranking keys.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "lowercase")]
pub enum ProductSort {
    /// Product code, ascending.
    #[default]
    Code,
    /// Average rating, highest first. Unreviewed products rate 0.
    Rating,
    /// Repeat orders, most first.
    Reorders,
    /// Like count, most first.
    Likes,
    /// Creation time, newest first.
    Recent,
}

impl ProductSort {
    /// Orders two products by this key. Ties fall back to the product code.
    pub fn compare(&self, a: &Product, b: &Product) -> Ordering {
        let primary = match self {
            ProductSort::Code => Ordering::Equal,
            ProductSort::Rating => b.stats.rating().total_cmp(&a.stats.rating()),
            ProductSort::Reorders => b.stats.reorder_count().cmp(&a.stats.reorder_count()),
            ProductSort::Likes => b.stats.like_count.cmp(&a.stats.like_count),
            ProductSort::Recent => b.created_at.cmp(&a.created_at),
        };
        primary.then_with(|| a.code().cmp(b.code()))
    }
}

/// Filter and ranking for product listings.
#[derive(Debug, Clone, Default)]
pub struct ProductQuery {
    pub visibility: Visibility,
    pub sort: ProductSort,
}

impl ProductQuery {
    /// Creates a query listing every product by code.
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a query for the products customers may see.
    pub fn visible() -> Self {
        Self {
            visibility: Visibility::Visible,
            ..Default::default()
        }
    }

    /// Ranks results by `sort`.
    pub fn sorted_by(mut self, sort: ProductSort) -> Self {
        self.sort = sort;
        self
    }

    /// Returns true if `product` passes the visibility filter.
    pub fn matches(&self, product: &Product) -> bool {
        match self.visibility {
            Visibility::All => true,
            Visibility::Visible => product.can_view,
        }
    }
}
