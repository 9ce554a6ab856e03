//! Domain layer for the online ordering system.
//!
//! This crate provides the business operations on top of the document store:
//! - Request payloads with field validation
//! - `ProductService` for the catalog
//! - `OrderService` with the status-gated cart rules
//! - `ReviewService` for reviews and product tallies

pub mod dto;
pub mod error;
pub mod order;
pub mod product;
pub mod review;

pub use dto::{
    OrderCreate, OrderUpdateCart, OrderUpdateStatus, ProductCreate, ProductUpdate,
    ReviewOrderCreate, Validate,
};
pub use error::{DomainError, ValidationError};
pub use order::OrderService;
pub use product::ProductService;
pub use review::ReviewService;
