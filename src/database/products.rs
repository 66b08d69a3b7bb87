// ABOUTME: Product cache database operations
// ABOUTME: Stores products keyed by barcode with their nutriments serialized as JSON

use super::{format_timestamp, parse_timestamp, Database};
use crate::errors::{AppError, AppResult};
use crate::models::{Nutriments, Product};
use chrono::{DateTime, Utc};
use sqlx::{sqlite::SqliteRow, QueryBuilder, Row, Sqlite};

impl Database {
    pub(super) async fn migrate_products(&self) -> AppResult<()> {
        sqlx::query(
            r"
            CREATE TABLE IF NOT EXISTS products (
                code TEXT PRIMARY KEY,
                product_name TEXT NOT NULL,
                brands TEXT,
                image_url TEXT,
                image_small_url TEXT,
                serving_size TEXT,
                nutriments TEXT NOT NULL DEFAULT '{}',
                source TEXT NOT NULL,
                created_at TEXT NOT NULL,
                last_updated TEXT NOT NULL
            )
            ",
        )
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    /// Get a cached product
    ///
    /// # Errors
    ///
    /// Returns an error if the query fails or the stored nutriments are not valid JSON
    pub async fn get_product(&self, code: &str) -> AppResult<Option<Product>> {
        let row = sqlx::query(
            r"
            SELECT code, product_name, brands, image_url, image_small_url, serving_size,
                   nutriments, source, created_at, last_updated
            FROM products WHERE code = $1
            ",
        )
        .bind(code)
        .fetch_optional(&self.pool)
        .await?;

        row.as_ref().map(Self::row_to_product).transpose()
    }

    /// Get every cached product among `codes`
    ///
    /// # Errors
    ///
    /// Returns an error if the query fails
    pub async fn get_products(&self, codes: &[String]) -> AppResult<Vec<Product>> {
        if codes.is_empty() {
            return Ok(Vec::new());
        }

        let mut builder: QueryBuilder<Sqlite> = QueryBuilder::new(
            r"
            SELECT code, product_name, brands, image_url, image_small_url, serving_size,
                   nutriments, source, created_at, last_updated
            FROM products WHERE code IN (",
        );
        let mut separated = builder.separated(", ");
        for code in codes {
            separated.push_bind(code);
        }
        separated.push_unseparated(")");

        let rows = builder.build().fetch_all(&self.pool).await?;
        rows.iter().map(Self::row_to_product).collect()
    }

    /// Insert a product
    ///
    /// # Errors
    ///
    /// Returns an error if a product with the same code exists or the insert fails
    pub async fn create_product(&self, product: &Product) -> AppResult<()> {
        self.insert_product(product, "").await?;
        Ok(())
    }

    /// Insert a product unless one with the same code is already stored
    ///
    /// Returns `false` when the code was taken.
    ///
    /// # Errors
    ///
    /// Returns an error if the insert fails
    pub async fn create_product_if_absent(&self, product: &Product) -> AppResult<bool> {
        let inserted = self
            .insert_product(product, "ON CONFLICT(code) DO NOTHING")
            .await?;
        Ok(inserted > 0)
    }

    async fn insert_product(&self, product: &Product, on_conflict: &str) -> AppResult<u64> {
        let sql = format!(
            r"
            INSERT INTO products (
                code, product_name, brands, image_url, image_small_url, serving_size,
                nutriments, source, created_at, last_updated
            )
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10)
            {on_conflict}
            "
        );
        let result = sqlx::query(&sql)
            .bind(&product.code)
            .bind(&product.product_name)
            .bind(&product.brands)
            .bind(&product.image_url)
            .bind(&product.image_small_url)
            .bind(&product.serving_size)
            .bind(serde_json::to_string(&product.nutriments)?)
            .bind(&product.source)
            .bind(format_timestamp(&product.created_at))
            .bind(format_timestamp(&product.last_updated))
            .execute(&self.pool)
            .await
            .map_err(|e| {
                AppError::database(format!("Failed to store product {}: {e}", product.code))
            })?;

        Ok(result.rows_affected())
    }

    /// Update the administrator-editable fields of a product
    ///
    /// Returns `false` when no product has this code.
    ///
    /// # Errors
    ///
    /// Returns an error if the update fails
    pub async fn update_product(
        &self,
        code: &str,
        product_name: &str,
        brands: Option<&str>,
        nutriments: &Nutriments,
        last_updated: DateTime<Utc>,
    ) -> AppResult<bool> {
        let result = sqlx::query(
            r"
            UPDATE products
            SET product_name = $1, brands = $2, nutriments = $3, last_updated = $4
            WHERE code = $5
            ",
        )
        .bind(product_name)
        .bind(brands)
        .bind(serde_json::to_string(nutriments)?)
        .bind(format_timestamp(&last_updated))
        .bind(code)
        .execute(&self.pool)
        .await?;

        Ok(result.rows_affected() > 0)
    }

    /// Delete a product
    ///
    /// # Errors
    ///
    /// Returns an error if the delete fails
    pub async fn delete_product(&self, code: &str) -> AppResult<bool> {
        let result = sqlx::query("DELETE FROM products WHERE code = $1")
            .bind(code)
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }

    /// Number of cached products
    ///
    /// # Errors
    ///
    /// Returns an error if the query fails
    pub async fn count_products(&self) -> AppResult<i64> {
        let count = sqlx::query_scalar("SELECT COUNT(*) FROM products")
            .fetch_one(&self.pool)
            .await?;
        Ok(count)
    }

    fn row_to_product(row: &SqliteRow) -> AppResult<Product> {
        let nutriments: String = row.get("nutriments");
        let created_at: String = row.get("created_at");
        let last_updated: String = row.get("last_updated");

        Ok(Product {
            code: row.get("code"),
            product_name: row.get("product_name"),
            brands: row.get("brands"),
            image_url: row.get("image_url"),
            image_small_url: row.get("image_small_url"),
            serving_size: row.get("serving_size"),
            nutriments: serde_json::from_str(&nutriments)?,
            source: row.get("source"),
            created_at: parse_timestamp(&created_at)?,
            last_updated: parse_timestamp(&last_updated)?,
        })
    }
}
