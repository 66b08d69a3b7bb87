// ABOUTME: Health article cache database operations
// ABOUTME: Upserts fetched news articles by URL and drops the ones past the retention window

use super::{format_timestamp, Database};
use crate::constants::limits;
use crate::errors::AppResult;
use crate::models::Article;
use chrono::{DateTime, Duration, Utc};
use sqlx::Row;

impl Database {
    pub(super) async fn migrate_articles(&self) -> AppResult<()> {
        sqlx::query(
            r"
            CREATE TABLE IF NOT EXISTS articles (
                url TEXT PRIMARY KEY,
                title TEXT NOT NULL,
                description TEXT NOT NULL,
                image_url TEXT,
                published_at TEXT,
                source TEXT,
                fetched_at TEXT NOT NULL
            )
            ",
        )
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    /// Store articles, refreshing the ones already known by URL
    ///
    /// Articles last fetched before the retention window are removed in the
    /// same transaction. Returns the number of removed rows.
    ///
    /// # Errors
    ///
    /// Returns an error if the transaction fails
    pub async fn upsert_articles(&self, articles: &[Article], at: DateTime<Utc>) -> AppResult<u64> {
        let fetched_at = format_timestamp(&at);
        let cutoff = format_timestamp(&(at - Duration::days(limits::ARTICLE_CACHE_RETENTION_DAYS)));
        let mut tx = self.pool.begin().await?;

        for article in articles {
            sqlx::query(
                r"
                INSERT INTO articles (url, title, description, image_url, published_at, source, fetched_at)
                VALUES ($1, $2, $3, $4, $5, $6, $7)
                ON CONFLICT(url) DO UPDATE SET
                    title = excluded.title,
                    description = excluded.description,
                    image_url = excluded.image_url,
                    published_at = excluded.published_at,
                    source = excluded.source,
                    fetched_at = excluded.fetched_at
                ",
            )
            .bind(&article.url)
            .bind(&article.title)
            .bind(&article.description)
            .bind(&article.image_url)
            .bind(&article.published_at)
            .bind(&article.source)
            .bind(&fetched_at)
            .execute(&mut *tx)
            .await?;
        }

        let pruned = sqlx::query("DELETE FROM articles WHERE fetched_at < $1")
            .bind(&cutoff)
            .execute(&mut *tx)
            .await?
            .rows_affected();

        tx.commit().await?;
        Ok(pruned)
    }

    /// Number of cached articles
    ///
    /// # Errors
    ///
    /// Returns an error if the query fails
    pub async fn count_articles(&self) -> AppResult<i64> {
        let count = sqlx::query_scalar("SELECT COUNT(*) FROM articles")
            .fetch_one(&self.pool)
            .await?;
        Ok(count)
    }

    /// Most recently fetched articles
    ///
    /// # Errors
    ///
    /// Returns an error if the query fails
    pub async fn list_recent_articles(&self, limit: i64) -> AppResult<Vec<Article>> {
        let rows = sqlx::query(
            r"
            SELECT url, title, description, image_url, published_at, source
            FROM articles
            ORDER BY fetched_at DESC, published_at DESC
            LIMIT $1
            ",
        )
        .bind(limit)
        .fetch_all(&self.pool)
        .await?;

        Ok(rows
            .iter()
            .map(|row| Article {
                title: row.get("title"),
                description: row.get("description"),
                url: row.get("url"),
                image_url: row.get("image_url"),
                published_at: row.get("published_at"),
                source: row.get("source"),
            })
            .collect())
    }
}
