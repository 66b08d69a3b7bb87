// ABOUTME: Food journal database operations
// ABOUTME: Stores journal entries and answers per-user time range queries and nutrient totals

use super::{format_timestamp, parse_timestamp, parse_uuid, Database};
use crate::errors::{AppError, AppResult};
use crate::models::{FoodEntry, NutrientTotals};
use chrono::{DateTime, Utc};
use sqlx::{sqlite::SqliteRow, Row};
use uuid::Uuid;

impl Database {
    pub(super) async fn migrate_foods(&self) -> AppResult<()> {
        sqlx::query(
            r"
            CREATE TABLE IF NOT EXISTS food_entries (
                id TEXT PRIMARY KEY,
                user_id TEXT NOT NULL REFERENCES users(id) ON DELETE CASCADE,
                product_name TEXT NOT NULL,
                calories REAL NOT NULL,
                protein REAL NOT NULL DEFAULT 0,
                carbs REAL NOT NULL DEFAULT 0,
                fat REAL NOT NULL DEFAULT 0,
                sugar REAL NOT NULL DEFAULT 0,
                salt REAL NOT NULL DEFAULT 0,
                barcode TEXT,
                image_url TEXT,
                date TEXT NOT NULL
            )
            ",
        )
        .execute(&self.pool)
        .await?;

        sqlx::query(
            "CREATE INDEX IF NOT EXISTS idx_food_entries_user_date ON food_entries(user_id, date)",
        )
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    /// Insert a journal entry
    ///
    /// # Errors
    ///
    /// Returns an error if the insert fails
    pub async fn create_food_entry(&self, entry: &FoodEntry) -> AppResult<()> {
        sqlx::query(
            r"
            INSERT INTO food_entries (
                id, user_id, product_name, calories, protein, carbs, fat, sugar, salt,
                barcode, image_url, date
            )
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12)
            ",
        )
        .bind(entry.id.to_string())
        .bind(entry.user_id.to_string())
        .bind(&entry.product_name)
        .bind(entry.calories)
        .bind(entry.protein)
        .bind(entry.carbs)
        .bind(entry.fat)
        .bind(entry.sugar)
        .bind(entry.salt)
        .bind(&entry.barcode)
        .bind(&entry.image_url)
        .bind(format_timestamp(&entry.date))
        .execute(&self.pool)
        .await
        .map_err(|e| AppError::database(format!("Failed to create food entry: {e}")))?;

        Ok(())
    }

    /// Entries of a user with `from <= date < to`, newest first
    ///
    /// # Errors
    ///
    /// Returns an error if the database query fails
    pub async fn list_food_entries(
        &self,
        user_id: Uuid,
        from: DateTime<Utc>,
        to: DateTime<Utc>,
    ) -> AppResult<Vec<FoodEntry>> {
        let rows = sqlx::query(
            r"
            SELECT id, user_id, product_name, calories, protein, carbs, fat, sugar, salt,
                   barcode, image_url, date
            FROM food_entries
            WHERE user_id = $1 AND date >= $2 AND date < $3
            ORDER BY date DESC
            ",
        )
        .bind(user_id.to_string())
        .bind(format_timestamp(&from))
        .bind(format_timestamp(&to))
        .fetch_all(&self.pool)
        .await?;

        rows.iter().map(Self::row_to_food_entry).collect()
    }

    /// Get a single entry regardless of owner
    ///
    /// # Errors
    ///
    /// Returns an error if the database query fails
    pub async fn get_food_entry(&self, id: Uuid) -> AppResult<Option<FoodEntry>> {
        let row = sqlx::query(
            r"
            SELECT id, user_id, product_name, calories, protein, carbs, fat, sugar, salt,
                   barcode, image_url, date
            FROM food_entries WHERE id = $1
            ",
        )
        .bind(id.to_string())
        .fetch_optional(&self.pool)
        .await?;

        row.as_ref().map(Self::row_to_food_entry).transpose()
    }

    /// Delete an entry
    ///
    /// # Errors
    ///
    /// Returns an error if the database query fails
    pub async fn delete_food_entry(&self, id: Uuid) -> AppResult<bool> {
        let result = sqlx::query("DELETE FROM food_entries WHERE id = $1")
            .bind(id.to_string())
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }

    /// Sum of nutrients for a user with `from <= date < to`
    ///
    /// # Errors
    ///
    /// Returns an error if the database query fails
    pub async fn sum_food_nutrients(
        &self,
        user_id: Uuid,
        from: DateTime<Utc>,
        to: DateTime<Utc>,
    ) -> AppResult<NutrientTotals> {
        let row = sqlx::query(
            r"
            SELECT COALESCE(SUM(calories), 0.0) AS calories,
                   COALESCE(SUM(protein), 0.0) AS protein,
                   COALESCE(SUM(carbs), 0.0) AS carbs,
                   COALESCE(SUM(fat), 0.0) AS fat,
                   COALESCE(SUM(sugar), 0.0) AS sugar,
                   COALESCE(SUM(salt), 0.0) AS salt
            FROM food_entries
            WHERE user_id = $1 AND date >= $2 AND date < $3
            ",
        )
        .bind(user_id.to_string())
        .bind(format_timestamp(&from))
        .bind(format_timestamp(&to))
        .fetch_one(&self.pool)
        .await?;

        Ok(NutrientTotals {
            calories: row.get("calories"),
            protein: row.get("protein"),
            carbs: row.get("carbs"),
            fat: row.get("fat"),
            sugar: row.get("sugar"),
            salt: row.get("salt"),
        })
    }

    /// Mean of per-day nutrient totals for a user from `from` onwards
    ///
    /// Days are grouped in local time, `utc_offset_minutes` east of UTC.
    /// Days without entries do not count toward the mean.
    ///
    /// # Errors
    ///
    /// Returns an error if the database query fails
    pub async fn average_daily_food_nutrients(
        &self,
        user_id: Uuid,
        from: DateTime<Utc>,
        utc_offset_minutes: i32,
    ) -> AppResult<NutrientTotals> {
        let row = sqlx::query(
            r"
            SELECT COALESCE(AVG(calories), 0.0) AS calories,
                   COALESCE(AVG(protein), 0.0) AS protein,
                   COALESCE(AVG(carbs), 0.0) AS carbs,
                   COALESCE(AVG(fat), 0.0) AS fat,
                   COALESCE(AVG(sugar), 0.0) AS sugar,
                   COALESCE(AVG(salt), 0.0) AS salt
            FROM (
                SELECT date(date, $3) AS day,
                       SUM(calories) AS calories,
                       SUM(protein) AS protein,
                       SUM(carbs) AS carbs,
                       SUM(fat) AS fat,
                       SUM(sugar) AS sugar,
                       SUM(salt) AS salt
                FROM food_entries
                WHERE user_id = $1 AND date >= $2
                GROUP BY day
            )
            ",
        )
        .bind(user_id.to_string())
        .bind(format_timestamp(&from))
        .bind(format!("{utc_offset_minutes:+} minutes"))
        .fetch_one(&self.pool)
        .await?;

        Ok(NutrientTotals {
            calories: row.get("calories"),
            protein: row.get("protein"),
            carbs: row.get("carbs"),
            fat: row.get("fat"),
            sugar: row.get("sugar"),
            salt: row.get("salt"),
        })
    }

    fn row_to_food_entry(row: &SqliteRow) -> AppResult<FoodEntry> {
        let id: String = row.get("id");
        let user_id: String = row.get("user_id");
        let date: String = row.get("date");

        Ok(FoodEntry {
            id: parse_uuid(&id)?,
            user_id: parse_uuid(&user_id)?,
            product_name: row.get("product_name"),
            calories: row.get("calories"),
            protein: row.get("protein"),
            carbs: row.get("carbs"),
            fat: row.get("fat"),
            sugar: row.get("sugar"),
            salt: row.get("salt"),
            barcode: row.get("barcode"),
            image_url: row.get("image_url"),
            date: parse_timestamp(&date)?,
        })
    }
}
