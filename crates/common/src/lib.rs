//! Shared identifiers and persisted records for the ordering service.
//!
//! Every record here is stored verbatim as a document in its own collection
//! (`products`, `orders`, `reviews`). Records reference each other only by
//! code string or denormalized copy.

pub mod order;
pub mod product;
pub mod review;
pub mod status;
pub mod types;

pub use order::{Order, User};
pub use product::{Product, ProductInfo, ProductStats};
pub use review::{ProductReview, Review, ReviewView};
pub use status::{OrderStatus, UnknownStatus};
pub use types::OrderId;
