//! Review records.

use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use crate::OrderId;

/// A customer's verdict on one product of a reviewed order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct ProductReview {
    #[schema(example = "bc01")]
    pub product_code: String,

    pub is_liked: bool,

    #[serde(default)]
    #[schema(example = "Great salsa")]
    pub comment: String,
}

/// An order-level review document. Immutable once stored.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct Review {
    #[serde(rename = "orderID")]
    pub order_id: OrderId,
    pub username: String,

    /// Order rating between 0 and 5.
    pub rating: f64,

    #[serde(default)]
    pub comment: String,

    #[serde(default)]
    pub product_reviews: Vec<ProductReview>,
}

impl Review {
    /// Projects the sub-reviews for `product_code` alongside the reviewer and
    /// the order rating.
    pub fn views_for<'a>(&'a self, product_code: &'a str) -> impl Iterator<Item = ReviewView> + 'a {
        self.product_reviews
            .iter()
            .filter(move |review| review.product_code == product_code)
            .map(|review| ReviewView {
                username: self.username.clone(),
                rating: self.rating,
                product_review: review.clone(),
            })
    }
}

/// One product's slice of an order review.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct ReviewView {
    pub username: String,
    pub rating: f64,
    pub product_review: ProductReview,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn product_review(code: &str, liked: bool) -> ProductReview {
        ProductReview {
            product_code: code.to_string(),
            is_liked: liked,
            comment: format!("about {code}"),
        }
    }

    #[test]
    fn test_views_for_filters_by_code() {
        let review = Review {
            order_id: OrderId::new(),
            username: "abc1".to_string(),
            rating: 4.5,
            comment: "Incredible!".to_string(),
            product_reviews: vec![
                product_review("bc01", true),
                product_review("bc02", false),
                product_review("bc01", false),
            ],
        };

        let views: Vec<_> = review.views_for("bc01").collect();
        assert_eq!(views.len(), 2);
        assert!(views.iter().all(|v| v.username == "abc1" && v.rating == 4.5));
        assert!(views[0].product_review.is_liked);
        assert!(!views[1].product_review.is_liked);
        assert_eq!(review.views_for("zz99").count(), 0);
    }

    #[test]
    fn test_json_field_names() {
        let review = Review {
            order_id: OrderId::new(),
            username: "abc1".to_string(),
            rating: 4.0,
            comment: String::new(),
            product_reviews: vec![product_review("bc01", true)],
        };
        let json = serde_json::to_value(&review).unwrap();

        assert_eq!(json["orderID"], review.order_id.to_string());
        assert_eq!(json["productReviews"][0]["productCode"], "bc01");
        assert_eq!(json["productReviews"][0]["isLiked"], true);
    }
}
