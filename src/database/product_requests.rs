// ABOUTME: Product request queue database operations
// ABOUTME: Tracks unresolved barcodes, attempt counts and administrator resolution

use super::{format_timestamp, parse_optional_timestamp, parse_timestamp, parse_uuid, Database};
use crate::constants::limits;
use crate::errors::AppResult;
use crate::models::{ProductRequest, RequestStatus};
use chrono::{DateTime, Utc};
use sqlx::{sqlite::SqliteRow, Row};
use uuid::Uuid;

const REQUEST_COLUMNS: &str = r"
    id, barcode, requested_by, requested_by_name, requested_by_email, status,
    attempt_count, last_attempt_date, admin_notes, created_at, resolved_at, resolved_by
";

impl Database {
    pub(super) async fn migrate_product_requests(&self) -> AppResult<()> {
        sqlx::query(
            r"
            CREATE TABLE IF NOT EXISTS product_requests (
                id TEXT PRIMARY KEY,
                barcode TEXT NOT NULL,
                requested_by TEXT NOT NULL,
                requested_by_name TEXT NOT NULL,
                requested_by_email TEXT NOT NULL,
                status TEXT NOT NULL DEFAULT 'pending'
                    CHECK (status IN ('pending', 'processing', 'completed', 'rejected')),
                attempt_count INTEGER NOT NULL DEFAULT 1,
                last_attempt_date TEXT NOT NULL,
                admin_notes TEXT,
                created_at TEXT NOT NULL,
                resolved_at TEXT,
                resolved_by TEXT
            )
            ",
        )
        .execute(&self.pool)
        .await?;

        sqlx::query(
            "CREATE INDEX IF NOT EXISTS idx_product_requests_barcode_status ON product_requests(barcode, status)",
        )
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    /// The pending request for a barcode, if any
    ///
    /// # Errors
    ///
    /// Returns an error if the query fails
    pub async fn find_pending_product_request(
        &self,
        barcode: &str,
    ) -> AppResult<Option<ProductRequest>> {
        let query = format!(
            "SELECT {REQUEST_COLUMNS} FROM product_requests WHERE barcode = $1 AND status = 'pending' ORDER BY created_at LIMIT 1"
        );
        let row = sqlx::query(&query)
            .bind(barcode)
            .fetch_optional(&self.pool)
            .await?;

        row.as_ref().map(Self::row_to_product_request).transpose()
    }

    /// Get a request by ID
    ///
    /// # Errors
    ///
    /// Returns an error if the query fails
    pub async fn get_product_request(&self, id: Uuid) -> AppResult<Option<ProductRequest>> {
        let query = format!("SELECT {REQUEST_COLUMNS} FROM product_requests WHERE id = $1");
        let row = sqlx::query(&query)
            .bind(id.to_string())
            .fetch_optional(&self.pool)
            .await?;

        row.as_ref().map(Self::row_to_product_request).transpose()
    }

    /// Insert a request
    ///
    /// # Errors
    ///
    /// Returns an error if the insert fails
    pub async fn create_product_request(&self, request: &ProductRequest) -> AppResult<()> {
        sqlx::query(
            r"
            INSERT INTO product_requests (
                id, barcode, requested_by, requested_by_name, requested_by_email, status,
                attempt_count, last_attempt_date, admin_notes, created_at, resolved_at, resolved_by
            )
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12)
            ",
        )
        .bind(request.id.to_string())
        .bind(&request.barcode)
        .bind(request.requested_by.to_string())
        .bind(&request.requested_by_name)
        .bind(&request.requested_by_email)
        .bind(request.status.as_str())
        .bind(request.attempt_count)
        .bind(format_timestamp(&request.last_attempt_date))
        .bind(&request.admin_notes)
        .bind(format_timestamp(&request.created_at))
        .bind(request.resolved_at.as_ref().map(format_timestamp))
        .bind(request.resolved_by.map(|id| id.to_string()))
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    /// Count another failed lookup against an existing request
    ///
    /// # Errors
    ///
    /// Returns an error if the update fails
    pub async fn bump_product_request_attempt(
        &self,
        id: Uuid,
        at: DateTime<Utc>,
    ) -> AppResult<()> {
        sqlx::query(
            r"
            UPDATE product_requests
            SET attempt_count = attempt_count + 1, last_attempt_date = $1
            WHERE id = $2
            ",
        )
        .bind(format_timestamp(&at))
        .bind(id.to_string())
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    /// Requests, optionally filtered by status, most recently attempted first
    ///
    /// # Errors
    ///
    /// Returns an error if the query fails
    pub async fn list_product_requests(
        &self,
        status: Option<RequestStatus>,
    ) -> AppResult<Vec<ProductRequest>> {
        let query = format!(
            r"
            SELECT {REQUEST_COLUMNS} FROM product_requests
            WHERE ($1 IS NULL OR status = $1)
            ORDER BY last_attempt_date DESC, created_at DESC
            LIMIT $2
            "
        );
        let rows = sqlx::query(&query)
            .bind(status.map(RequestStatus::as_str))
            .bind(limits::PRODUCT_REQUEST_LIST_LIMIT)
            .fetch_all(&self.pool)
            .await?;

        rows.iter().map(Self::row_to_product_request).collect()
    }

    /// Number of pending requests
    ///
    /// # Errors
    ///
    /// Returns an error if the query fails
    pub async fn count_pending_product_requests(&self) -> AppResult<i64> {
        let count =
            sqlx::query_scalar("SELECT COUNT(*) FROM product_requests WHERE status = 'pending'")
                .fetch_one(&self.pool)
                .await?;
        Ok(count)
    }

    /// Change the status of a request
    ///
    /// Resolution fields are set when the status closes the request.
    /// Returns `false` when the request does not exist.
    ///
    /// # Errors
    ///
    /// Returns an error if the update fails
    pub async fn update_product_request_status(
        &self,
        id: Uuid,
        status: RequestStatus,
        admin_notes: &str,
        resolved_by: Uuid,
        at: DateTime<Utc>,
    ) -> AppResult<bool> {
        let (resolved_at, resolver) = if status.is_resolution() {
            (Some(format_timestamp(&at)), Some(resolved_by.to_string()))
        } else {
            (None, None)
        };

        let result = sqlx::query(
            r"
            UPDATE product_requests
            SET status = $1,
                admin_notes = $2,
                resolved_at = COALESCE($3, resolved_at),
                resolved_by = COALESCE($4, resolved_by)
            WHERE id = $5
            ",
        )
        .bind(status.as_str())
        .bind(admin_notes)
        .bind(resolved_at)
        .bind(resolver)
        .bind(id.to_string())
        .execute(&self.pool)
        .await?;

        Ok(result.rows_affected() > 0)
    }

    /// Resolve every pending request for a barcode, returning how many changed
    ///
    /// # Errors
    ///
    /// Returns an error if the update fails
    pub async fn resolve_pending_product_requests(
        &self,
        barcode: &str,
        status: RequestStatus,
        admin_notes: &str,
        resolved_by: Uuid,
        at: DateTime<Utc>,
    ) -> AppResult<u64> {
        let result = sqlx::query(
            r"
            UPDATE product_requests
            SET status = $1, admin_notes = $2, resolved_at = $3, resolved_by = $4
            WHERE barcode = $5 AND status = 'pending'
            ",
        )
        .bind(status.as_str())
        .bind(admin_notes)
        .bind(format_timestamp(&at))
        .bind(resolved_by.to_string())
        .bind(barcode)
        .execute(&self.pool)
        .await?;

        Ok(result.rows_affected())
    }

    /// Delete a request
    ///
    /// # Errors
    ///
    /// Returns an error if the delete fails
    pub async fn delete_product_request(&self, id: Uuid) -> AppResult<bool> {
        let result = sqlx::query("DELETE FROM product_requests WHERE id = $1")
            .bind(id.to_string())
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }

    fn row_to_product_request(row: &SqliteRow) -> AppResult<ProductRequest> {
        let id: String = row.get("id");
        let requested_by: String = row.get("requested_by");
        let status: String = row.get("status");
        let last_attempt_date: String = row.get("last_attempt_date");
        let created_at: String = row.get("created_at");
        let resolved_by: Option<String> = row.get("resolved_by");

        Ok(ProductRequest {
            id: parse_uuid(&id)?,
            barcode: row.get("barcode"),
            requested_by: parse_uuid(&requested_by)?,
            requested_by_name: row.get("requested_by_name"),
            requested_by_email: row.get("requested_by_email"),
            status: status.parse()?,
            attempt_count: row.get("attempt_count"),
            last_attempt_date: parse_timestamp(&last_attempt_date)?,
            admin_notes: row.get("admin_notes"),
            created_at: parse_timestamp(&created_at)?,
            resolved_at: parse_optional_timestamp(row.get("resolved_at"))?,
            resolved_by: resolved_by.as_deref().map(parse_uuid).transpose()?,
        })
    }
}
