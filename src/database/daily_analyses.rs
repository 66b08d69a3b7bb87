// ABOUTME: Daily analysis database operations
// ABOUTME: Keeps one stored AI analysis per user and calendar day

use super::{format_timestamp, parse_timestamp, parse_uuid, Database};
use crate::errors::{AppError, AppResult};
use crate::models::DailyAnalysis;
use chrono::{DateTime, NaiveDate, Utc};
use sqlx::Row;
use uuid::Uuid;

impl Database {
    pub(super) async fn migrate_daily_analyses(&self) -> AppResult<()> {
        sqlx::query(
            r"
            CREATE TABLE IF NOT EXISTS daily_analyses (
                user_id TEXT NOT NULL REFERENCES users(id) ON DELETE CASCADE,
                date TEXT NOT NULL,
                analysis_text TEXT NOT NULL,
                created_at TEXT NOT NULL,
                updated_at TEXT NOT NULL,
                PRIMARY KEY (user_id, date)
            )
            ",
        )
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    /// Store or replace the analysis for a user and day
    ///
    /// # Errors
    ///
    /// Returns an error if the upsert fails
    pub async fn upsert_daily_analysis(
        &self,
        user_id: Uuid,
        date: NaiveDate,
        analysis_text: &str,
        at: DateTime<Utc>,
    ) -> AppResult<()> {
        let now = format_timestamp(&at);
        sqlx::query(
            r"
            INSERT INTO daily_analyses (user_id, date, analysis_text, created_at, updated_at)
            VALUES ($1, $2, $3, $4, $4)
            ON CONFLICT(user_id, date) DO UPDATE SET
                analysis_text = excluded.analysis_text,
                updated_at = excluded.updated_at
            ",
        )
        .bind(user_id.to_string())
        .bind(date.to_string())
        .bind(analysis_text)
        .bind(now)
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    /// Get the analysis stored for a user and day
    ///
    /// # Errors
    ///
    /// Returns an error if the query fails
    pub async fn get_daily_analysis(
        &self,
        user_id: Uuid,
        date: NaiveDate,
    ) -> AppResult<Option<DailyAnalysis>> {
        let row = sqlx::query(
            r"
            SELECT user_id, date, analysis_text, created_at, updated_at
            FROM daily_analyses WHERE user_id = $1 AND date = $2
            ",
        )
        .bind(user_id.to_string())
        .bind(date.to_string())
        .fetch_optional(&self.pool)
        .await?;

        let Some(row) = row else {
            return Ok(None);
        };

        let user_id: String = row.get("user_id");
        let date: String = row.get("date");
        let created_at: String = row.get("created_at");
        let updated_at: String = row.get("updated_at");

        Ok(Some(DailyAnalysis {
            user_id: parse_uuid(&user_id)?,
            date: date
                .parse()
                .map_err(|e| AppError::database(format!("Invalid analysis date '{date}': {e}")))?,
            analysis_text: row.get("analysis_text"),
            created_at: parse_timestamp(&created_at)?,
            updated_at: parse_timestamp(&updated_at)?,
        }))
    }
}
