// ABOUTME: User management database operations
// ABOUTME: Handles registration, verification, password reset, profile updates and soft deletion

use super::{format_timestamp, parse_optional_timestamp, parse_timestamp, parse_uuid, Database};
use crate::errors::{AppError, AppResult};
use crate::models::{NutritionGoals, User, UserRole};
use chrono::{DateTime, Utc};
use sqlx::{sqlite::SqliteRow, Row};
use uuid::Uuid;

const USER_COLUMNS: &str = r"
    id, name, email, password_hash, is_verified, verification_token_hash,
    reset_token, reset_expires_at, age, weight, height,
    goal_calories, goal_protein, goal_carbs, goal_fat, goal_sugar, goal_salt,
    role, created_at, deleted_at
";

/// Partial profile update; `None` leaves the stored value untouched
#[derive(Debug, Clone, Default)]
pub struct ProfileUpdate {
    /// Display name
    pub name: Option<String>,
    /// Age in years
    pub age: Option<u32>,
    /// Weight in kg
    pub weight: Option<f64>,
    /// Height in cm
    pub height: Option<f64>,
    /// Calorie goal
    pub goal_calories: Option<f64>,
    /// Protein goal
    pub goal_protein: Option<f64>,
    /// Carbohydrate goal
    pub goal_carbs: Option<f64>,
    /// Fat goal
    pub goal_fat: Option<f64>,
    /// Sugar goal
    pub goal_sugar: Option<f64>,
    /// Salt goal
    pub goal_salt: Option<f64>,
}

impl Database {
    /// Create the users table
    ///
    /// # Errors
    ///
    /// Returns an error if table or index creation fails
    pub(super) async fn migrate_users(&self) -> AppResult<()> {
        sqlx::query(
            r"
            CREATE TABLE IF NOT EXISTS users (
                id TEXT PRIMARY KEY,
                name TEXT NOT NULL,
                email TEXT NOT NULL UNIQUE,
                password_hash TEXT NOT NULL,
                is_verified INTEGER NOT NULL DEFAULT 0,
                verification_token_hash TEXT,
                reset_token TEXT,
                reset_expires_at TEXT,
                age INTEGER,
                weight REAL,
                height REAL,
                goal_calories REAL NOT NULL DEFAULT 0,
                goal_protein REAL NOT NULL DEFAULT 0,
                goal_carbs REAL NOT NULL DEFAULT 0,
                goal_fat REAL NOT NULL DEFAULT 0,
                goal_sugar REAL NOT NULL DEFAULT 0,
                goal_salt REAL NOT NULL DEFAULT 0,
                role TEXT NOT NULL DEFAULT 'user',
                created_at TEXT NOT NULL,
                deleted_at TEXT
            )
            ",
        )
        .execute(&self.pool)
        .await?;

        sqlx::query(
            "CREATE INDEX IF NOT EXISTS idx_users_verification ON users(verification_token_hash)",
        )
        .execute(&self.pool)
        .await?;

        sqlx::query("CREATE INDEX IF NOT EXISTS idx_users_reset ON users(reset_token)")
            .execute(&self.pool)
            .await?;

        Ok(())
    }

    /// Insert a new user
    ///
    /// # Errors
    ///
    /// Returns an error if the email is already registered or the insert fails
    pub async fn create_user(&self, user: &User) -> AppResult<()> {
        sqlx::query(
            r"
            INSERT INTO users (
                id, name, email, password_hash, is_verified, verification_token_hash,
                reset_token, reset_expires_at, age, weight, height,
                goal_calories, goal_protein, goal_carbs, goal_fat, goal_sugar, goal_salt,
                role, created_at, deleted_at
            )
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13, $14, $15, $16, $17, $18, $19, $20)
            ",
        )
        .bind(user.id.to_string())
        .bind(&user.name)
        .bind(&user.email)
        .bind(&user.password_hash)
        .bind(user.is_verified)
        .bind(&user.verification_token_hash)
        .bind(&user.reset_token)
        .bind(user.reset_expires_at.as_ref().map(format_timestamp))
        .bind(user.age.map(i64::from))
        .bind(user.weight)
        .bind(user.height)
        .bind(user.goals.calories)
        .bind(user.goals.protein)
        .bind(user.goals.carbs)
        .bind(user.goals.fat)
        .bind(user.goals.sugar)
        .bind(user.goals.salt)
        .bind(user.role.as_str())
        .bind(format_timestamp(&user.created_at))
        .bind(user.deleted_at.as_ref().map(format_timestamp))
        .execute(&self.pool)
        .await
        .map_err(|e| AppError::database(format!("Failed to create user: {e}")))?;

        Ok(())
    }

    /// Get a user by ID, including soft-deleted users
    ///
    /// # Errors
    ///
    /// Returns an error if the database query fails
    pub async fn get_user(&self, user_id: Uuid) -> AppResult<Option<User>> {
        self.get_user_impl("id", &user_id.to_string()).await
    }

    /// Get a user by email
    ///
    /// # Errors
    ///
    /// Returns an error if the database query fails
    pub async fn get_user_by_email(&self, email: &str) -> AppResult<Option<User>> {
        self.get_user_impl("email", email).await
    }

    /// Get the user holding a verification token hash
    ///
    /// # Errors
    ///
    /// Returns an error if the database query fails
    pub async fn get_user_by_verification_hash(&self, hash: &str) -> AppResult<Option<User>> {
        self.get_user_impl("verification_token_hash", hash).await
    }

    /// Get the user holding a reset token that has not expired at `now`
    ///
    /// # Errors
    ///
    /// Returns an error if the database query fails
    pub async fn get_user_by_reset_token(
        &self,
        token: &str,
        now: DateTime<Utc>,
    ) -> AppResult<Option<User>> {
        let query =
            format!("SELECT {USER_COLUMNS} FROM users WHERE reset_token = $1 AND reset_expires_at > $2");
        let row = sqlx::query(&query)
            .bind(token)
            .bind(format_timestamp(&now))
            .fetch_optional(&self.pool)
            .await?;

        row.as_ref().map(Self::row_to_user).transpose()
    }

    /// Internal implementation for getting a user by a unique column
    async fn get_user_impl(&self, field: &str, value: &str) -> AppResult<Option<User>> {
        let query = format!("SELECT {USER_COLUMNS} FROM users WHERE {field} = $1");
        let row = sqlx::query(&query)
            .bind(value)
            .fetch_optional(&self.pool)
            .await?;

        row.as_ref().map(Self::row_to_user).transpose()
    }

    /// Convert a database row to a User struct
    fn row_to_user(row: &SqliteRow) -> AppResult<User> {
        let id: String = row.get("id");
        let role: String = row.get("role");
        let created_at: String = row.get("created_at");
        let age: Option<i64> = row.get("age");

        Ok(User {
            id: parse_uuid(&id)?,
            name: row.get("name"),
            email: row.get("email"),
            password_hash: row.get("password_hash"),
            is_verified: row.get("is_verified"),
            verification_token_hash: row.get("verification_token_hash"),
            reset_token: row.get("reset_token"),
            reset_expires_at: parse_optional_timestamp(row.get("reset_expires_at"))?,
            age: age.and_then(|a| u32::try_from(a).ok()),
            weight: row.get("weight"),
            height: row.get("height"),
            goals: NutritionGoals {
                calories: row.get("goal_calories"),
                protein: row.get("goal_protein"),
                carbs: row.get("goal_carbs"),
                fat: row.get("goal_fat"),
                sugar: row.get("goal_sugar"),
                salt: row.get("goal_salt"),
            },
            role: UserRole::from_str_or_default(&role),
            created_at: parse_timestamp(&created_at)?,
            deleted_at: parse_optional_timestamp(row.get("deleted_at"))?,
        })
    }

    /// Mark a user as verified and consume the verification token
    ///
    /// # Errors
    ///
    /// Returns an error if the database query fails
    pub async fn mark_user_verified(&self, user_id: Uuid) -> AppResult<()> {
        sqlx::query(
            "UPDATE users SET is_verified = 1, verification_token_hash = NULL WHERE id = $1",
        )
        .bind(user_id.to_string())
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    /// Store a password reset token
    ///
    /// # Errors
    ///
    /// Returns an error if the database query fails
    pub async fn set_reset_token(
        &self,
        user_id: Uuid,
        token: &str,
        expires_at: DateTime<Utc>,
    ) -> AppResult<()> {
        sqlx::query("UPDATE users SET reset_token = $1, reset_expires_at = $2 WHERE id = $3")
            .bind(token)
            .bind(format_timestamp(&expires_at))
            .bind(user_id.to_string())
            .execute(&self.pool)
            .await?;
        Ok(())
    }

    /// Replace the password hash and clear any reset token
    ///
    /// # Errors
    ///
    /// Returns an error if the database query fails
    pub async fn reset_password(&self, user_id: Uuid, password_hash: &str) -> AppResult<()> {
        sqlx::query(
            r"
            UPDATE users
            SET password_hash = $1, reset_token = NULL, reset_expires_at = NULL
            WHERE id = $2
            ",
        )
        .bind(password_hash)
        .bind(user_id.to_string())
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    /// Apply a partial profile update
    ///
    /// Returns `false` when the user does not exist.
    ///
    /// # Errors
    ///
    /// Returns an error if the database query fails
    pub async fn update_user_profile(
        &self,
        user_id: Uuid,
        update: &ProfileUpdate,
    ) -> AppResult<bool> {
        let result = sqlx::query(
            r"
            UPDATE users SET
                name = COALESCE($1, name),
                age = COALESCE($2, age),
                weight = COALESCE($3, weight),
                height = COALESCE($4, height),
                goal_calories = COALESCE($5, goal_calories),
                goal_protein = COALESCE($6, goal_protein),
                goal_carbs = COALESCE($7, goal_carbs),
                goal_fat = COALESCE($8, goal_fat),
                goal_sugar = COALESCE($9, goal_sugar),
                goal_salt = COALESCE($10, goal_salt)
            WHERE id = $11
            ",
        )
        .bind(&update.name)
        .bind(update.age.map(i64::from))
        .bind(update.weight)
        .bind(update.height)
        .bind(update.goal_calories)
        .bind(update.goal_protein)
        .bind(update.goal_carbs)
        .bind(update.goal_fat)
        .bind(update.goal_sugar)
        .bind(update.goal_salt)
        .bind(user_id.to_string())
        .execute(&self.pool)
        .await?;

        Ok(result.rows_affected() > 0)
    }

    /// Change a user's role
    ///
    /// # Errors
    ///
    /// Returns an error if the database query fails
    pub async fn set_user_role(&self, user_id: Uuid, role: UserRole) -> AppResult<bool> {
        let result = sqlx::query("UPDATE users SET role = $1 WHERE id = $2")
            .bind(role.as_str())
            .bind(user_id.to_string())
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }

    /// Users that are not soft deleted, newest first
    ///
    /// # Errors
    ///
    /// Returns an error if the database query fails
    pub async fn list_active_users(&self) -> AppResult<Vec<User>> {
        let query = format!(
            "SELECT {USER_COLUMNS} FROM users WHERE deleted_at IS NULL ORDER BY created_at DESC"
        );
        let rows = sqlx::query(&query).fetch_all(&self.pool).await?;
        rows.iter().map(Self::row_to_user).collect()
    }

    /// Soft-deleted users, most recently deleted first
    ///
    /// # Errors
    ///
    /// Returns an error if the database query fails
    pub async fn list_deleted_users(&self) -> AppResult<Vec<User>> {
        let query = format!(
            "SELECT {USER_COLUMNS} FROM users WHERE deleted_at IS NOT NULL ORDER BY deleted_at DESC"
        );
        let rows = sqlx::query(&query).fetch_all(&self.pool).await?;
        rows.iter().map(Self::row_to_user).collect()
    }

    /// Set the soft delete marker
    ///
    /// # Errors
    ///
    /// Returns an error if the database query fails
    pub async fn soft_delete_user(&self, user_id: Uuid, at: DateTime<Utc>) -> AppResult<bool> {
        let result = sqlx::query("UPDATE users SET deleted_at = $1 WHERE id = $2")
            .bind(format_timestamp(&at))
            .bind(user_id.to_string())
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }

    /// Clear the soft delete marker
    ///
    /// # Errors
    ///
    /// Returns an error if the database query fails
    pub async fn restore_user(&self, user_id: Uuid) -> AppResult<bool> {
        let result = sqlx::query("UPDATE users SET deleted_at = NULL WHERE id = $1")
            .bind(user_id.to_string())
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }

    /// Permanently remove a user; journal, favorites and analyses cascade
    ///
    /// # Errors
    ///
    /// Returns an error if the database query fails
    pub async fn delete_user(&self, user_id: Uuid) -> AppResult<bool> {
        let result = sqlx::query("DELETE FROM users WHERE id = $1")
            .bind(user_id.to_string())
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }

    /// Number of users that are not soft deleted
    ///
    /// # Errors
    ///
    /// Returns an error if the database query fails
    pub async fn count_active_users(&self) -> AppResult<i64> {
        let count = sqlx::query_scalar("SELECT COUNT(*) FROM users WHERE deleted_at IS NULL")
            .fetch_one(&self.pool)
            .await?;
        Ok(count)
    }
}
