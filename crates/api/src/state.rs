//! Shared application state.

use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use domain::{DomainError, OrderService, ProductService, ReviewService};
use store::DocumentStore;

use crate::auth::TokenAuthority;
use crate::error::ApiError;

/// Shared application state accessible from all handlers.
pub struct AppState<S: DocumentStore> {
    pub products: ProductService<S>,
    pub orders: OrderService<S>,
    pub reviews: ReviewService<S>,
    pub tokens: Arc<TokenAuthority>,
    /// Deadline applied to each business operation.
    pub request_timeout: Duration,
}

impl<S: DocumentStore> AppState<S> {
    pub fn new(store: S, tokens: TokenAuthority, request_timeout: Duration) -> Self {
        Self {
            products: ProductService::new(store.clone()),
            orders: OrderService::new(store.clone()),
            reviews: ReviewService::new(store),
            tokens: Arc::new(tokens),
            request_timeout,
        }
    }

    /// Runs one service call under the request deadline. Dropping the future
    /// on expiry cancels any store I/O still in flight.
    pub async fn run<T, F>(&self, operation: F) -> Result<T, ApiError>
    where
        F: Future<Output = Result<T, DomainError>>,
    {
        tokio::time::timeout(self.request_timeout, operation)
            .await
            .map_err(|_| ApiError::Timeout(self.request_timeout))?
            .map_err(ApiError::from)
    }
}

#[cfg(test)]
mod tests {
    use store::InMemoryStore;

    use super::*;
    use crate::config::AuthConfig;

    fn state(timeout: Duration) -> AppState<InMemoryStore> {
        AppState::new(
            InMemoryStore::new(),
            TokenAuthority::new(&AuthConfig::default()),
            timeout,
        )
    }

    #[tokio::test]
    async fn test_run_passes_results_through() {
        let state = state(Duration::from_secs(1));
        let value = state.run(async { Ok::<_, DomainError>(7) }).await.unwrap();
        assert_eq!(value, 7);
    }

    #[tokio::test]
    async fn test_run_times_out() {
        let state = state(Duration::from_millis(10));
        let result = state
            .run(async {
                tokio::time::sleep(Duration::from_secs(5)).await;
                Ok::<_, DomainError>(())
            })
            .await;
        assert!(matches!(result, Err(ApiError::Timeout(_))));
    }
}
