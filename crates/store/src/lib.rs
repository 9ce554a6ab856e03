//! Document store adapter.
//!
//! Exposes the three collections (`products`, `orders`, `reviews`) through
//! async traits so services can run against PostgreSQL in production and an
//! in-memory double in tests.

pub mod error;
pub mod memory;
pub mod postgres;
pub mod query;
pub mod store;

pub use error::{Result, StoreError};
pub use memory::InMemoryStore;
pub use postgres::PostgresStore;
pub use query::{OrderPhase, OrderQuery, ProductQuery, ProductSort, Visibility};
pub use store::{
    DocumentStore, InsertResult, OrderStore, ProductPatch, ProductStore, ReviewStore, ReviewTally,
    UpdateResult,
};
