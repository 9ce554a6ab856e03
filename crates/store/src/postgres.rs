use std::collections::BTreeMap;
use std::time::Duration;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use common::{Order, OrderId, OrderStatus, Product, Review};
use serde_json::json;
use sqlx::PgPool;
use sqlx::postgres::PgPoolOptions;
use sqlx::types::Json;

use crate::{
    OrderPhase, OrderQuery, ProductQuery, ProductSort, Result, StoreError, Visibility,
    store::{
        InsertResult, OrderStore, ProductPatch, ProductStore, ReviewStore, ReviewTally,
        UpdateResult,
    },
};

/// PostgreSQL-backed document store.
///
/// Each collection is a table holding the record as a JSONB `doc` plus a few
/// extracted columns used for keys, filters and ordering.
#[derive(Clone)]
pub struct PostgresStore {
    pool: PgPool,
}

impl PostgresStore {
    /// Creates a new store over an existing pool.
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Connects to `url`, failing if the server cannot be reached within
    /// ten seconds.
    pub async fn connect(url: &str, max_connections: u32) -> Result<Self> {
        let pool = PgPoolOptions::new()
            .max_connections(max_connections)
            .acquire_timeout(Duration::from_secs(10))
            .connect(url)
            .await?;
        tracing::debug!(max_connections, "postgres pool ready");
        Ok(Self::new(pool))
    }

    /// Gets a reference to the underlying connection pool.
    pub fn pool(&self) -> &PgPool {
        &self.pool
    }

    /// Creates the collections and the unique index on product codes.
    pub async fn run_migrations(&self) -> Result<()> {
        sqlx::migrate!("../../migrations").run(&self.pool).await?;
        tracing::info!("store migrations applied");
        Ok(())
    }

    fn product_order_by(sort: ProductSort) -> &'static str {
        match sort {
            ProductSort::Code => r#"code COLLATE "C" ASC"#,
            ProductSort::Rating => {
                r#"CASE WHEN (doc->'stats'->>'reviewCount')::bigint = 0 THEN 0.0::float8
                   ELSE (doc->'stats'->>'ratingSum')::float8 / (doc->'stats'->>'reviewCount')::bigint
                   END DESC, code COLLATE "C" ASC"#
            }
            ProductSort::Reorders => {
                r#"(SELECT COALESCE(SUM(GREATEST(value::bigint - 1, 0)), 0)
                    FROM jsonb_each_text(doc->'stats'->'userOrders')) DESC, code COLLATE "C" ASC"#
            }
            ProductSort::Likes => {
                r#"(doc->'stats'->>'likeCount')::bigint DESC, code COLLATE "C" ASC"#
            }
            ProductSort::Recent => r#"created_at DESC, code COLLATE "C" ASC"#,
        }
    }
}

/// Turns a unique-constraint violation into `DuplicateKey`.
fn map_insert_error(e: sqlx::Error, collection: &'static str, key: String) -> StoreError {
    if let sqlx::Error::Database(ref db_err) = e
        && db_err.is_unique_violation()
    {
        return StoreError::DuplicateKey { collection, key };
    }
    StoreError::Database(e)
}

#[async_trait]
impl ProductStore for PostgresStore {
    async fn insert_product(&self, product: &Product) -> Result<InsertResult> {
        sqlx::query("INSERT INTO products (code, created_at, doc) VALUES ($1, $2, $3)")
            .bind(product.code())
            .bind(product.created_at)
            .bind(Json(product))
            .execute(&self.pool)
            .await
            .map_err(|e| map_insert_error(e, "products", product.code().to_string()))?;

        Ok(InsertResult::new(product.code()))
    }

    async fn find_product(&self, code: &str) -> Result<Option<Product>> {
        let doc: Option<Json<Product>> =
            sqlx::query_scalar("SELECT doc FROM products WHERE code = $1")
                .bind(code)
                .fetch_optional(&self.pool)
                .await?;

        Ok(doc.map(|Json(product)| product))
    }

    async fn list_products(&self, query: &ProductQuery) -> Result<Vec<Product>> {
        let filter = match query.visibility {
            Visibility::All => "",
            Visibility::Visible => "WHERE (doc->>'canView')::boolean",
        };
        let sql = format!(
            "SELECT doc FROM products {filter} ORDER BY {}",
            Self::product_order_by(query.sort)
        );

        let docs: Vec<Json<Product>> = sqlx::query_scalar(&sql).fetch_all(&self.pool).await?;
        Ok(docs.into_iter().map(|Json(product)| product).collect())
    }

    async fn update_product(
        &self,
        code: &str,
        patch: &ProductPatch,
        at: DateTime<Utc>,
    ) -> Result<UpdateResult> {
        let info = json!({
            "name": patch.name,
            "origin": patch.origin,
            "price": patch.price,
            "limit": patch.limit,
            "canOrder": patch.can_order,
        });
        let top = json!({ "canView": patch.can_view, "updatedAt": at });

        let result = sqlx::query(
            r#"
            UPDATE products
            SET doc = jsonb_set(doc, '{info}', (doc->'info') || $2) || $3
            WHERE code = $1
            "#,
        )
        .bind(code)
        .bind(Json(info))
        .bind(Json(top))
        .execute(&self.pool)
        .await?;

        Ok(UpdateResult::matched(result.rows_affected()))
    }

    async fn hide_product(&self, code: &str, at: DateTime<Utc>) -> Result<UpdateResult> {
        let result = sqlx::query("UPDATE products SET doc = doc || $2 WHERE code = $1")
            .bind(code)
            .bind(Json(json!({ "canView": false, "updatedAt": at })))
            .execute(&self.pool)
            .await?;

        Ok(UpdateResult::matched(result.rows_affected()))
    }

    async fn apply_review_tally(&self, code: &str, tally: &ReviewTally) -> Result<UpdateResult> {
        let result = sqlx::query(
            r#"
            UPDATE products
            SET doc = jsonb_set(doc, '{stats}', (doc->'stats') || jsonb_build_object(
                'reviewCount', (doc->'stats'->>'reviewCount')::bigint + 1,
                'ratingSum', (doc->'stats'->>'ratingSum')::float8 + $2,
                'likeCount', (doc->'stats'->>'likeCount')::bigint + $3,
                'userOrders', COALESCE(doc->'stats'->'userOrders', '{}'::jsonb)
                    || jsonb_build_object(
                        $4::text,
                        COALESCE((doc->'stats'->'userOrders'->>$4::text)::bigint, 0) + 1
                    )
            ))
            WHERE code = $1
            "#,
        )
        .bind(code)
        .bind(tally.rating)
        .bind(tally.like_increment() as i64)
        .bind(&tally.username)
        .execute(&self.pool)
        .await?;

        Ok(UpdateResult::matched(result.rows_affected()))
    }
}

#[async_trait]
impl OrderStore for PostgresStore {
    async fn insert_order(&self, order: &Order) -> Result<InsertResult> {
        sqlx::query(
            r#"
            INSERT INTO orders (id, username, status_rank, created_at, doc)
            VALUES ($1, $2, $3, $4, $5)
            "#,
        )
        .bind(order.id.as_uuid())
        .bind(order.username())
        .bind(order.status.rank())
        .bind(order.created_at)
        .bind(Json(order))
        .execute(&self.pool)
        .await
        .map_err(|e| map_insert_error(e, "orders", order.id.to_string()))?;

        Ok(InsertResult::new(order.id.to_string()))
    }

    async fn find_order(&self, id: OrderId) -> Result<Option<Order>> {
        let doc: Option<Json<Order>> = sqlx::query_scalar("SELECT doc FROM orders WHERE id = $1")
            .bind(id.as_uuid())
            .fetch_optional(&self.pool)
            .await?;

        Ok(doc.map(|Json(order)| order))
    }

    async fn list_orders(&self, query: &OrderQuery) -> Result<Vec<Order>> {
        let mut sql = String::from("SELECT doc FROM orders WHERE 1=1");
        let mut param_count = 0;

        if query.username.is_some() {
            param_count += 1;
            sql.push_str(&format!(" AND username = ${param_count}"));
        }
        match query.phase {
            OrderPhase::All => {}
            OrderPhase::Active => {
                param_count += 1;
                sql.push_str(&format!(" AND status_rank < ${param_count}"));
            }
            OrderPhase::History => {
                param_count += 1;
                sql.push_str(&format!(" AND status_rank >= ${param_count}"));
            }
        }
        sql.push_str(" ORDER BY created_at ASC, id ASC");

        let mut sqlx_query = sqlx::query_scalar::<_, Json<Order>>(&sql);
        if let Some(ref username) = query.username {
            sqlx_query = sqlx_query.bind(username);
        }
        if query.phase != OrderPhase::All {
            sqlx_query = sqlx_query.bind(OrderStatus::Delivered.rank());
        }

        let docs = sqlx_query.fetch_all(&self.pool).await?;
        Ok(docs.into_iter().map(|Json(order)| order).collect())
    }

    async fn set_order_status(
        &self,
        id: OrderId,
        status: OrderStatus,
        at: DateTime<Utc>,
    ) -> Result<UpdateResult> {
        let result =
            sqlx::query("UPDATE orders SET status_rank = $2, doc = doc || $3 WHERE id = $1")
                .bind(id.as_uuid())
                .bind(status.rank())
                .bind(Json(json!({ "status": status, "updatedAt": at })))
                .execute(&self.pool)
                .await?;

        Ok(UpdateResult::matched(result.rows_affected()))
    }

    async fn merge_cart_items(
        &self,
        id: OrderId,
        items: &BTreeMap<String, u32>,
        at: DateTime<Utc>,
    ) -> Result<UpdateResult> {
        let result = sqlx::query(
            r#"
            UPDATE orders
            SET doc = jsonb_set(doc, '{cart}', COALESCE(doc->'cart', '{}'::jsonb) || $2) || $3
            WHERE id = $1
            "#,
        )
        .bind(id.as_uuid())
        .bind(Json(items))
        .bind(Json(json!({ "updatedAt": at })))
        .execute(&self.pool)
        .await?;

        Ok(UpdateResult::matched(result.rows_affected()))
    }

    async fn remove_cart_items(
        &self,
        id: OrderId,
        codes: &[String],
        at: DateTime<Utc>,
    ) -> Result<UpdateResult> {
        let result = sqlx::query(
            r#"
            UPDATE orders
            SET doc = jsonb_set(doc, '{cart}', COALESCE(doc->'cart', '{}'::jsonb) - $2::text[]) || $3
            WHERE id = $1
            "#,
        )
        .bind(id.as_uuid())
        .bind(codes.to_vec())
        .bind(Json(json!({ "updatedAt": at })))
        .execute(&self.pool)
        .await?;

        Ok(UpdateResult::matched(result.rows_affected()))
    }
}

#[async_trait]
impl ReviewStore for PostgresStore {
    async fn insert_review(&self, review: &Review) -> Result<InsertResult> {
        sqlx::query("INSERT INTO reviews (order_id, doc) VALUES ($1, $2)")
            .bind(review.order_id.as_uuid())
            .bind(Json(review))
            .execute(&self.pool)
            .await
            .map_err(|e| map_insert_error(e, "reviews", review.order_id.to_string()))?;

        Ok(InsertResult::new(review.order_id.to_string()))
    }

    async fn find_review(&self, order_id: OrderId) -> Result<Option<Review>> {
        let doc: Option<Json<Review>> =
            sqlx::query_scalar("SELECT doc FROM reviews WHERE order_id = $1")
                .bind(order_id.as_uuid())
                .fetch_optional(&self.pool)
                .await?;

        Ok(doc.map(|Json(review)| review))
    }

    async fn list_reviews(&self) -> Result<Vec<Review>> {
        let docs: Vec<Json<Review>> =
            sqlx::query_scalar("SELECT doc FROM reviews ORDER BY order_id ASC")
                .fetch_all(&self.pool)
                .await?;

        Ok(docs.into_iter().map(|Json(review)| review).collect())
    }
}
