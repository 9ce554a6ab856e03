//! HTTP handlers, one module per resource.

pub mod account;
pub mod health;
pub mod metrics;
pub mod orders;
pub mod products;
pub mod reviews;
