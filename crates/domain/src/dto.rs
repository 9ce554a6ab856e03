//! Request payloads accepted by the services.
//!
//! Each payload checks its own field rules through [`Validate`]; the services
//! call it before touching the store so that a malformed request never
//! produces a partial write.

use std::collections::BTreeMap;

use common::{OrderStatus, ProductInfo, ProductReview, User};
use serde::{Deserialize, Serialize};
use store::ProductPatch;
use utoipa::ToSchema;

use crate::ValidationError;

/// Field rules for a request payload.
pub trait Validate {
    fn validate(&self) -> Result<(), ValidationError>;
}

fn check_price(price: f64) -> Result<(), ValidationError> {
    if price.is_finite() && price >= 0.0 {
        Ok(())
    } else {
        Err(ValidationError::InvalidPrice(price))
    }
}

fn check_cart(cart: &BTreeMap<String, u32>) -> Result<(), ValidationError> {
    if cart.is_empty() {
        return Err(ValidationError::EmptyCart);
    }
    for (code, quantity) in cart {
        if code.trim().is_empty() {
            return Err(ValidationError::EmptyCode);
        }
        if *quantity == 0 {
            return Err(ValidationError::ZeroQuantity { code: code.clone() });
        }
    }
    Ok(())
}

/// A new catalog entry.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct ProductCreate {
    #[schema(example = "bc01")]
    pub code: String,
    #[schema(example = "Chicken burrito")]
    pub name: String,
    #[schema(example = "Mexico")]
    pub origin: String,
    #[schema(example = 9.99)]
    pub price: f64,
    #[schema(example = 100)]
    pub limit: u32,
    #[schema(example = true)]
    pub can_order: bool,
}

impl Validate for ProductCreate {
    fn validate(&self) -> Result<(), ValidationError> {
        if self.code.trim().is_empty() {
            return Err(ValidationError::EmptyCode);
        }
        if self.name.trim().is_empty() {
            return Err(ValidationError::EmptyName);
        }
        check_price(self.price)
    }
}

impl From<ProductCreate> for ProductInfo {
    fn from(create: ProductCreate) -> Self {
        ProductInfo {
            code: create.code,
            name: create.name,
            origin: create.origin,
            price: create.price,
            limit: create.limit,
            can_order: create.can_order,
        }
    }
}

/// Replacement values for a product's editable fields. The code is taken
/// from the path and never changes.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct ProductUpdate {
    pub name: String,
    pub origin: String,
    pub price: f64,
    pub limit: u32,
    pub can_order: bool,
    pub can_view: bool,
}

impl Validate for ProductUpdate {
    fn validate(&self) -> Result<(), ValidationError> {
        if self.name.trim().is_empty() {
            return Err(ValidationError::EmptyName);
        }
        check_price(self.price)
    }
}

impl From<ProductUpdate> for ProductPatch {
    fn from(update: ProductUpdate) -> Self {
        ProductPatch {
            name: update.name,
            origin: update.origin,
            price: update.price,
            limit: update.limit,
            can_order: update.can_order,
            can_view: update.can_view,
        }
    }
}

/// Checkout payload.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct OrderCreate {
    pub user: User,
    /// Product code to quantity.
    #[schema(example = json!({"bc01": 2}))]
    pub cart: BTreeMap<String, u32>,
}

impl Validate for OrderCreate {
    fn validate(&self) -> Result<(), ValidationError> {
        if self.user.username.trim().is_empty() {
            return Err(ValidationError::EmptyUsername);
        }
        check_cart(&self.cart)
    }
}

/// New status for an order. Unknown labels fail to deserialize.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct OrderUpdateStatus {
    pub status: OrderStatus,
}

impl Validate for OrderUpdateStatus {
    fn validate(&self) -> Result<(), ValidationError> {
        Ok(())
    }
}

/// Cart entries to upsert.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct OrderUpdateCart {
    #[schema(example = json!({"bc02": 1}))]
    pub cart: BTreeMap<String, u32>,
}

impl Validate for OrderUpdateCart {
    fn validate(&self) -> Result<(), ValidationError> {
        check_cart(&self.cart)
    }
}

/// Product codes to drop from a cart.
impl Validate for Vec<String> {
    fn validate(&self) -> Result<(), ValidationError> {
        if self.is_empty() {
            return Err(ValidationError::NoCodes);
        }
        if self.iter().any(|code| code.trim().is_empty()) {
            return Err(ValidationError::EmptyCode);
        }
        Ok(())
    }
}

/// A customer's review of a whole order, with optional per-product verdicts.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct ReviewOrderCreate {
    #[schema(example = 4.5)]
    pub rating: f64,

    #[serde(default)]
    #[schema(example = "Incredible!")]
    pub comment: String,

    #[serde(default)]
    pub product_reviews: Vec<ProductReview>,
}

impl Validate for ReviewOrderCreate {
    fn validate(&self) -> Result<(), ValidationError> {
        if !(0.0..=5.0).contains(&self.rating) {
            return Err(ValidationError::RatingOutOfRange(self.rating));
        }
        if self
            .product_reviews
            .iter()
            .any(|review| review.product_code.trim().is_empty())
        {
            return Err(ValidationError::EmptyCode);
        }
        Ok(())
    }
}
