//! Order records.

use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use crate::{OrderId, OrderStatus};

/// Snapshot of the customer taken at checkout.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct User {
    #[schema(example = "abc1")]
    pub username: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub phone: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub address: Option<String>,
}

impl User {
    /// Creates a user snapshot carrying only a username.
    pub fn named(username: impl Into<String>) -> Self {
        Self {
            username: username.into(),
            ..Default::default()
        }
    }
}

/// An order document.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct Order {
    pub id: OrderId,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub user: User,

    /// Product code to quantity.
    pub cart: BTreeMap<String, u32>,

    pub status: OrderStatus,
}

impl Order {
    /// Creates a freshly checked-out order in `Submitting` status.
    pub fn new(user: User, cart: BTreeMap<String, u32>, now: DateTime<Utc>) -> Self {
        Self {
            id: OrderId::new(),
            created_at: now,
            updated_at: now,
            user,
            cart,
            status: OrderStatus::Submitting,
        }
    }

    /// Returns the username of the customer who placed the order.
    pub fn username(&self) -> &str {
        &self.user.username
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new_order_starts_submitting() {
        let now = Utc::now();
        let order = Order::new(User::named("abc1"), BTreeMap::from([("bc01".into(), 2)]), now);

        assert_eq!(order.status, OrderStatus::Submitting);
        assert_eq!(order.created_at, now);
        assert_eq!(order.updated_at, now);
        assert_eq!(order.username(), "abc1");
        assert_eq!(order.cart.get("bc01"), Some(&2));
    }

    #[test]
    fn test_json_shape() {
        let order = Order::new(
            User::named("abc1"),
            BTreeMap::from([("bc01".into(), 2)]),
            Utc::now(),
        );
        let json = serde_json::to_value(&order).unwrap();

        assert_eq!(json["id"], order.id.to_string());
        assert_eq!(json["status"], "Submitting");
        assert_eq!(json["user"]["username"], "abc1");
        assert!(json["user"].get("phone").is_none());
        assert_eq!(json["cart"]["bc01"], 2);
        assert!(json["createdAt"].is_string());
    }

    #[test]
    fn test_user_optional_fields_default() {
        let user: User = serde_json::from_str(r#"{"username":"abc1"}"#).unwrap();
        assert_eq!(user, User::named("abc1"));
    }
}
