//! Catalog management.

use chrono::Utc;
use common::{Product, ProductInfo};
use store::{DocumentStore, InsertResult, ProductQuery, ProductSort, UpdateResult};

use crate::dto::{ProductCreate, ProductUpdate, Validate};
use crate::error::DomainError;

/// Service for managing the product catalog.
#[derive(Clone)]
pub struct ProductService<S: DocumentStore> {
    store: S,
}

impl<S: DocumentStore> ProductService<S> {
    /// Creates a new product service over the given store.
    pub fn new(store: S) -> Self {
        Self { store }
    }

    /// Returns a reference to the underlying store.
    pub fn store(&self) -> &S {
        &self.store
    }

    /// Adds a product to the catalog. The code must not be taken yet.
    #[tracing::instrument(skip(self, params), fields(code = %params.code))]
    pub async fn create(&self, params: ProductCreate) -> Result<InsertResult, DomainError> {
        params.validate()?;

        let product = Product::new(ProductInfo::from(params), Utc::now());
        let result = self.store.insert_product(&product).await?;

        metrics::counter!("products_created_total").increment(1);
        tracing::info!(code = %product.code(), "product created");
        Ok(result)
    }

    /// Lists products customers may see.
    #[tracing::instrument(skip(self))]
    pub async fn list_visible(&self, sort: ProductSort) -> Result<Vec<Product>, DomainError> {
        let query = ProductQuery::visible().sorted_by(sort);
        Ok(self.store.list_products(&query).await?)
    }

    /// Lists every product, hidden ones included.
    #[tracing::instrument(skip(self))]
    pub async fn list_all(&self, sort: ProductSort) -> Result<Vec<Product>, DomainError> {
        let query = ProductQuery::new().sorted_by(sort);
        Ok(self.store.list_products(&query).await?)
    }

    /// Loads a product by code. Hidden products are still returned.
    #[tracing::instrument(skip(self))]
    pub async fn get(&self, code: &str) -> Result<Product, DomainError> {
        self.store
            .find_product(code)
            .await?
            .ok_or_else(|| DomainError::product_not_found(code))
    }

    /// Overwrites the editable fields of a product.
    #[tracing::instrument(skip(self, params))]
    pub async fn update(
        &self,
        code: &str,
        params: ProductUpdate,
    ) -> Result<UpdateResult, DomainError> {
        params.validate()?;

        let result = self
            .store
            .update_product(code, &params.into(), Utc::now())
            .await?;
        if result.is_unmatched() {
            return Err(DomainError::product_not_found(code));
        }
        Ok(result)
    }

    /// Soft-deletes a product: it stays retrievable by code but leaves the
    /// customer listing.
    #[tracing::instrument(skip(self))]
    pub async fn delete(&self, code: &str) -> Result<UpdateResult, DomainError> {
        let result = self.store.hide_product(code, Utc::now()).await?;
        if result.is_unmatched() {
            return Err(DomainError::product_not_found(code));
        }

        tracing::info!(code, "product hidden");
        Ok(result)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use store::{InMemoryStore, StoreError};

    fn create_params(code: &str) -> ProductCreate {
        ProductCreate {
            code: code.to_string(),
            name: "Chicken burrito".to_string(),
            origin: "Mexico".to_string(),
            price: 9.99,
            limit: 100,
            can_order: true,
        }
    }

    #[tokio::test]
    async fn test_create_then_get_round_trips_fields() {
        let service = ProductService::new(InMemoryStore::new());

        let result = service.create(create_params("bc01")).await.unwrap();
        assert_eq!(result.inserted_id, "bc01");

        let product = service.get("bc01").await.unwrap();
        assert_eq!(product.info, ProductInfo::from(create_params("bc01")));
        assert!(product.can_view);
        assert_eq!(product.stats.rating(), 0.0);
    }

    #[tokio::test]
    async fn test_duplicate_code_fails() {
        let service = ProductService::new(InMemoryStore::new());
        service.create(create_params("bc01")).await.unwrap();

        let err = service.create(create_params("bc01")).await.unwrap_err();
        assert!(matches!(
            err,
            DomainError::Store(StoreError::DuplicateKey { .. })
        ));
    }

    #[tokio::test]
    async fn test_delete_hides_from_visible_listing() {
        let service = ProductService::new(InMemoryStore::new());
        service.create(create_params("bc01")).await.unwrap();
        service.create(create_params("bc02")).await.unwrap();

        service.delete("bc01").await.unwrap();

        let product = service.get("bc01").await.unwrap();
        assert!(!product.can_view);

        let visible = service.list_visible(ProductSort::Code).await.unwrap();
        assert_eq!(visible.len(), 1);
        assert_eq!(visible[0].code(), "bc02");

        let all = service.list_all(ProductSort::Code).await.unwrap();
        assert_eq!(all.len(), 2);
    }

    #[tokio::test]
    async fn test_update_missing_product_is_not_found() {
        let service = ProductService::new(InMemoryStore::new());
        let update = ProductUpdate {
            name: "Taco".to_string(),
            origin: "Mexico".to_string(),
            price: 3.0,
            limit: 5,
            can_order: true,
            can_view: true,
        };

        let err = service.update("zz99", update).await.unwrap_err();
        assert!(err.is_not_found());
        assert!(service.delete("zz99").await.unwrap_err().is_not_found());
    }

    #[tokio::test]
    async fn test_invalid_payload_never_reaches_store() {
        let store = InMemoryStore::new();
        let service = ProductService::new(store.clone());

        let mut params = create_params("bc01");
        params.price = -5.0;
        let err = service.create(params).await.unwrap_err();

        assert!(matches!(err, DomainError::Validation(_)));
        assert_eq!(store.product_count().await, 0);
    }
}
