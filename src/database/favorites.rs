// ABOUTME: Favorite products database operations
// ABOUTME: One row per user and product code, listed newest first

use super::{format_timestamp, parse_timestamp, parse_uuid, Database};
use crate::errors::AppResult;
use crate::models::Favorite;
use sqlx::{sqlite::SqliteRow, Row};
use uuid::Uuid;

impl Database {
    pub(super) async fn migrate_favorites(&self) -> AppResult<()> {
        sqlx::query(
            r"
            CREATE TABLE IF NOT EXISTS favorites (
                id TEXT PRIMARY KEY,
                user_id TEXT NOT NULL REFERENCES users(id) ON DELETE CASCADE,
                product_code TEXT NOT NULL,
                added_at TEXT NOT NULL,
                UNIQUE(user_id, product_code)
            )
            ",
        )
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    /// Find a user's favorite for a product
    ///
    /// # Errors
    ///
    /// Returns an error if the query fails
    pub async fn find_favorite(
        &self,
        user_id: Uuid,
        product_code: &str,
    ) -> AppResult<Option<Favorite>> {
        let row = sqlx::query(
            r"
            SELECT id, user_id, product_code, added_at
            FROM favorites WHERE user_id = $1 AND product_code = $2
            ",
        )
        .bind(user_id.to_string())
        .bind(product_code)
        .fetch_optional(&self.pool)
        .await?;

        row.as_ref().map(Self::row_to_favorite).transpose()
    }

    /// Flip a favorite: insert it when the pair is absent, remove it otherwise
    ///
    /// The insert relies on the `(user_id, product_code)` constraint, so two
    /// concurrent toggles never collide. Returns whether the pair is now a
    /// favorite.
    ///
    /// # Errors
    ///
    /// Returns an error if the insert or delete fails
    pub async fn toggle_favorite(&self, favorite: &Favorite) -> AppResult<bool> {
        let inserted = sqlx::query(
            r"
            INSERT INTO favorites (id, user_id, product_code, added_at)
            VALUES ($1, $2, $3, $4)
            ON CONFLICT(user_id, product_code) DO NOTHING
            ",
        )
        .bind(favorite.id.to_string())
        .bind(favorite.user_id.to_string())
        .bind(&favorite.product_code)
        .bind(format_timestamp(&favorite.added_at))
        .execute(&self.pool)
        .await?
        .rows_affected();

        if inserted > 0 {
            return Ok(true);
        }

        sqlx::query("DELETE FROM favorites WHERE user_id = $1 AND product_code = $2")
            .bind(favorite.user_id.to_string())
            .bind(&favorite.product_code)
            .execute(&self.pool)
            .await?;
        Ok(false)
    }

    /// A user's favorites, newest first
    ///
    /// # Errors
    ///
    /// Returns an error if the query fails
    pub async fn list_favorites(&self, user_id: Uuid) -> AppResult<Vec<Favorite>> {
        let rows = sqlx::query(
            r"
            SELECT id, user_id, product_code, added_at
            FROM favorites WHERE user_id = $1
            ORDER BY added_at DESC
            ",
        )
        .bind(user_id.to_string())
        .fetch_all(&self.pool)
        .await?;

        rows.iter().map(Self::row_to_favorite).collect()
    }

    fn row_to_favorite(row: &SqliteRow) -> AppResult<Favorite> {
        let id: String = row.get("id");
        let user_id: String = row.get("user_id");
        let added_at: String = row.get("added_at");

        Ok(Favorite {
            id: parse_uuid(&id)?,
            user_id: parse_uuid(&user_id)?,
            product_code: row.get("product_code"),
            added_at: parse_timestamp(&added_at)?,
        })
    }
}
