//! Product records.

use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

/// Provider-supplied product fields.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct ProductInfo {
    /// Unique product code.
    #[schema(example = "bc01")]
    pub code: String,

    #[schema(example = "Chicken burrito")]
    pub name: String,

    #[schema(example = "Mexico")]
    pub origin: String,

    #[schema(example = 9.99)]
    pub price: f64,

    /// Maximum quantity per order.
    #[schema(example = 100)]
    pub limit: u32,

    /// Whether customers can currently order this product.
    pub can_order: bool,
}

/// Counters maintained by review submission.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct ProductStats {
    pub like_count: u64,
    pub review_count: u64,
    pub rating_sum: f64,

    /// Reviewed orders per username.
    #[serde(default)]
    pub user_orders: BTreeMap<String, u64>,
}

impl ProductStats {
    /// Average order rating, or `0.0` for a product nobody has reviewed yet.
    pub fn rating(&self) -> f64 {
        if self.review_count == 0 {
            0.0
        } else {
            self.rating_sum / self.review_count as f64
        }
    }

    /// Number of reviewed orders beyond each user's first one.
    pub fn reorder_count(&self) -> u64 {
        self.user_orders
            .values()
            .map(|count| count.saturating_sub(1))
            .sum()
    }
}

/// A product document.
///
/// Products are never physically removed: deleting one clears `can_view`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct Product {
    pub info: ProductInfo,
    pub can_view: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    #[serde(default)]
    pub stats: ProductStats,
}

impl Product {
    /// Creates a visible product with zeroed counters.
    pub fn new(info: ProductInfo, now: DateTime<Utc>) -> Self {
        Self {
            info,
            can_view: true,
            created_at: now,
            updated_at: now,
            stats: ProductStats::default(),
        }
    }

    /// Returns the product code.
    pub fn code(&self) -> &str {
        &self.info.code
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn burrito() -> ProductInfo {
        ProductInfo {
            code: "bc01".to_string(),
            name: "Chicken burrito".to_string(),
            origin: "Mexico".to_string(),
            price: 9.99,
            limit: 100,
            can_order: true,
        }
    }

    #[test]
    fn test_new_product_is_visible_with_zero_counters() {
        let now = Utc::now();
        let product = Product::new(burrito(), now);

        assert!(product.can_view);
        assert_eq!(product.created_at, now);
        assert_eq!(product.updated_at, now);
        assert_eq!(product.stats, ProductStats::default());
        assert_eq!(product.code(), "bc01");
    }

    #[test]
    fn test_rating_without_reviews_is_zero() {
        assert_eq!(ProductStats::default().rating(), 0.0);
    }

    #[test]
    fn test_rating_is_average() {
        let stats = ProductStats {
            review_count: 4,
            rating_sum: 14.0,
            ..Default::default()
        };
        assert_eq!(stats.rating(), 3.5);
    }

    #[test]
    fn test_reorder_count_skips_first_orders() {
        let stats = ProductStats {
            user_orders: BTreeMap::from([
                ("abc1".to_string(), 3),
                ("abc2".to_string(), 1),
                ("abc3".to_string(), 2),
            ]),
            ..Default::default()
        };
        assert_eq!(stats.reorder_count(), 3);
    }

    #[test]
    fn test_json_uses_nested_camel_case_fields() {
        let product = Product::new(burrito(), Utc::now());
        let json = serde_json::to_value(&product).unwrap();

        assert_eq!(json["info"]["code"], "bc01");
        assert_eq!(json["info"]["canOrder"], true);
        assert_eq!(json["canView"], true);
        assert_eq!(json["stats"]["reviewCount"], 0);
        assert!(json["stats"]["userOrders"].as_object().unwrap().is_empty());
    }
}
