// ABOUTME: Core data models for the ScanBar nutrition tracker
// ABOUTME: Defines users, food journal entries, cached products, product requests, favorites and articles
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Pierre Fitness Intelligence

//! # Data Models
//!
//! This module contains the core data structures stored by the server and
//! passed between the database layer, services and routes.
//!
//! ## Core Models
//!
//! - `User`: account, profile, nutrition goals and role
//! - `FoodEntry`: one item in a user's food journal
//! - `Product`: a cached product keyed by barcode
//! - `ProductRequest`: a barcode nobody could resolve, queued for administrators
//! - `Favorite`: a user's bookmarked product
//! - `DailyAnalysis`: the stored AI analysis for a user and day
//! - `Article`: a cached health news article

use crate::errors::AppError;
use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::fmt::{self, Display};
use std::str::FromStr;
use uuid::Uuid;

/// Role attached to a user profile
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum UserRole {
    /// Regular account
    #[default]
    User,
    /// Administrator with access to product and user management
    Admin,
}

impl UserRole {
    /// Database and API representation
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::User => "user",
            Self::Admin => "admin",
        }
    }

    /// Parse a stored role; anything other than `admin` is a regular user
    #[must_use]
    pub fn from_str_or_default(s: &str) -> Self {
        if s.eq_ignore_ascii_case("admin") {
            Self::Admin
        } else {
            Self::User
        }
    }

    /// Whether this role grants administrator access
    #[must_use]
    pub const fn is_admin(self) -> bool {
        matches!(self, Self::Admin)
    }
}

impl Display for UserRole {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Daily nutrition goals; every goal defaults to 0
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize, Default)]
pub struct NutritionGoals {
    /// Calories (kcal)
    pub calories: f64,
    /// Protein (g)
    pub protein: f64,
    /// Carbohydrates (g)
    pub carbs: f64,
    /// Fat (g)
    pub fat: f64,
    /// Sugar (g)
    pub sugar: f64,
    /// Salt (g)
    pub salt: f64,
}

/// A registered user together with the profile fields the admin views need
#[derive(Debug, Clone)]
pub struct User {
    /// Identifier
    pub id: Uuid,
    /// Display name
    pub name: String,
    /// Unique email address
    pub email: String,
    /// bcrypt password hash
    pub password_hash: String,
    /// Whether the email address was confirmed
    pub is_verified: bool,
    /// SHA-256 of the pending verification token
    pub verification_token_hash: Option<String>,
    /// Pending password reset token
    pub reset_token: Option<String>,
    /// Expiry of the pending reset token
    pub reset_expires_at: Option<DateTime<Utc>>,
    /// Age in years
    pub age: Option<u32>,
    /// Weight in kg
    pub weight: Option<f64>,
    /// Height in cm
    pub height: Option<f64>,
    /// Daily goals
    pub goals: NutritionGoals,
    /// Profile role
    pub role: UserRole,
    /// Registration time
    pub created_at: DateTime<Utc>,
    /// Soft delete marker
    pub deleted_at: Option<DateTime<Utc>>,
}

impl User {
    /// Build a new, unverified regular user
    #[must_use]
    pub fn new(name: String, email: String, password_hash: String) -> Self {
        Self {
            id: Uuid::new_v4(),
            name,
            email,
            password_hash,
            is_verified: false,
            verification_token_hash: None,
            reset_token: None,
            reset_expires_at: None,
            age: None,
            weight: None,
            height: None,
            goals: NutritionGoals::default(),
            role: UserRole::User,
            created_at: Utc::now(),
            deleted_at: None,
        }
    }

    /// Whether the account was soft deleted
    #[must_use]
    pub const fn is_deleted(&self) -> bool {
        self.deleted_at.is_some()
    }
}

/// A single food journal entry
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FoodEntry {
    /// Identifier
    pub id: Uuid,
    /// Owner
    pub user_id: Uuid,
    /// Product or dish name
    pub product_name: String,
    /// Calories (kcal)
    pub calories: f64,
    /// Protein (g)
    pub protein: f64,
    /// Carbohydrates (g)
    pub carbs: f64,
    /// Fat (g)
    pub fat: f64,
    /// Sugar (g)
    pub sugar: f64,
    /// Salt (g)
    pub salt: f64,
    /// Barcode when the entry came from a scan
    pub barcode: Option<String>,
    /// Picture of the product
    pub image_url: Option<String>,
    /// When the food was eaten
    pub date: DateTime<Utc>,
}

/// Nutrient totals for a set of journal entries
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize, Default)]
pub struct NutrientTotals {
    /// Calories (kcal)
    pub calories: f64,
    /// Protein (g)
    pub protein: f64,
    /// Carbohydrates (g)
    pub carbs: f64,
    /// Fat (g)
    pub fat: f64,
    /// Sugar (g)
    pub sugar: f64,
    /// Salt (g)
    pub salt: f64,
}

/// Nutrition facts of a product, an open map keyed the way Open Food Facts names them
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
#[serde(transparent)]
pub struct Nutriments(pub Map<String, Value>);

/// Normalized nutrient keys, their accepted source keys and their mirrored plain key
const NORMALIZED_KEYS: &[(&str, &[&str], &str)] = &[
    (
        "energy-kcal_100g",
        &["energy-kcal_100g", "energy_100g", "energy-kcal", "energy", "calories"],
        "calories",
    ),
    (
        "proteins_100g",
        &["proteins_100g", "proteins", "protein"],
        "proteins",
    ),
    (
        "carbohydrates_100g",
        &["carbohydrates_100g", "carbohydrates", "carbs", "carbohydrate"],
        "carbohydrates",
    ),
    ("fat_100g", &["fat_100g", "fat", "fats"], "fat"),
    ("sugars_100g", &["sugars_100g", "sugars", "sugar"], "sugars"),
    (
        "salt_100g",
        &["salt_100g", "salt", "sodium_100g", "sodium"],
        "salt",
    ),
];

impl Nutriments {
    /// Empty nutriments
    #[must_use]
    pub fn new() -> Self {
        Self(Map::new())
    }

    /// Set a numeric value
    pub fn set(&mut self, key: &str, value: f64) {
        self.0.insert(key.to_owned(), number(value));
    }

    /// Numeric value of a key, `None` when absent, null or an empty string
    #[must_use]
    pub fn number(&self, key: &str) -> Option<f64> {
        match self.0.get(key)? {
            Value::Null => None,
            Value::String(s) if s.trim().is_empty() => None,
            other => Some(coerce_number(other)),
        }
    }

    /// First key whose numeric value is non-zero
    #[must_use]
    pub fn first_non_zero(&self, keys: &[&str]) -> Option<f64> {
        keys.iter()
            .filter_map(|key| self.number(key))
            .find(|value| value.abs() > f64::EPSILON)
    }

    /// Copy of these nutriments with the canonical `_100g` keys and their plain
    /// mirrors filled in from whichever alias is present, defaulting to 0
    #[must_use]
    pub fn normalized(&self) -> Self {
        let mut out = self.clone();
        for (canonical, aliases, mirror) in NORMALIZED_KEYS {
            let value = aliases
                .iter()
                .find_map(|alias| self.number(alias))
                .unwrap_or(0.0);
            out.set(canonical, value);
            out.set(mirror, value);
        }
        out
    }
}

/// Coerce a JSON value to a number; anything non-numeric becomes 0
fn coerce_number(value: &Value) -> f64 {
    let parsed = match value {
        Value::Number(n) => n.as_f64().unwrap_or(0.0),
        Value::String(s) => s.trim().parse().unwrap_or(0.0),
        Value::Bool(b) => f64::from(u8::from(*b)),
        _ => 0.0,
    };
    if parsed.is_finite() {
        parsed
    } else {
        0.0
    }
}

/// Encode an `f64` as JSON, storing whole numbers as integers
fn number(value: f64) -> Value {
    if value.fract().abs() < f64::EPSILON && value.abs() < 9.0e15 {
        Value::from(value as i64)
    } else {
        serde_json::Number::from_f64(value).map_or(Value::Null, Value::Number)
    }
}

/// A product cached from Open Food Facts or entered by an administrator
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Product {
    /// Normalized barcode
    pub code: String,
    /// Product name
    pub product_name: String,
    /// Brands
    pub brands: Option<String>,
    /// Main picture
    pub image_url: Option<String>,
    /// Thumbnail
    pub image_small_url: Option<String>,
    /// Serving size text
    pub serving_size: Option<String>,
    /// Nutrition facts
    pub nutriments: Nutriments,
    /// Where the product came from
    pub source: String,
    /// First stored
    pub created_at: DateTime<Utc>,
    /// Last changed
    pub last_updated: DateTime<Utc>,
}

/// Processing state of a product request
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum RequestStatus {
    /// Waiting for an administrator
    #[default]
    Pending,
    /// Being handled
    Processing,
    /// Product added
    Completed,
    /// Will not be added
    Rejected,
}

impl RequestStatus {
    /// Database and API representation
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Pending => "pending",
            Self::Processing => "processing",
            Self::Completed => "completed",
            Self::Rejected => "rejected",
        }
    }

    /// Whether this status closes the request
    #[must_use]
    pub const fn is_resolution(self) -> bool {
        matches!(self, Self::Completed | Self::Rejected)
    }
}

impl Display for RequestStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for RequestStatus {
    type Err = AppError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "pending" => Ok(Self::Pending),
            "processing" => Ok(Self::Processing),
            "completed" => Ok(Self::Completed),
            "rejected" => Ok(Self::Rejected),
            _ => Err(AppError::invalid_input(format!(
                "Invalid product request status: {s}"
            ))),
        }
    }
}

/// A barcode that could not be resolved, queued for manual entry
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProductRequest {
    /// Identifier
    pub id: Uuid,
    /// Normalized barcode
    pub barcode: String,
    /// User who scanned it
    pub requested_by: Uuid,
    /// Name of that user
    pub requested_by_name: String,
    /// Email of that user
    pub requested_by_email: String,
    /// Processing state
    pub status: RequestStatus,
    /// Number of failed lookups for this barcode while pending
    pub attempt_count: i64,
    /// Most recent failed lookup
    pub last_attempt_date: DateTime<Utc>,
    /// Notes written by an administrator
    pub admin_notes: Option<String>,
    /// First failed lookup
    pub created_at: DateTime<Utc>,
    /// When the request was closed
    pub resolved_at: Option<DateTime<Utc>>,
    /// Administrator who closed it
    pub resolved_by: Option<Uuid>,
}

/// Who triggered a product lookup
#[derive(Debug, Clone)]
pub struct Requester {
    /// User id
    pub user_id: Uuid,
    /// Display name, falling back to email then "Unknown User"
    pub name: String,
    /// Email, falling back to "unknown@example.com"
    pub email: String,
}

impl Requester {
    /// Build a requester from the optional identity fields of a token
    #[must_use]
    pub fn new(user_id: Uuid, name: Option<&str>, email: Option<&str>) -> Self {
        let email = email.filter(|e| !e.is_empty());
        Self {
            user_id,
            name: name
                .filter(|n| !n.is_empty())
                .or(email)
                .unwrap_or("Unknown User")
                .to_owned(),
            email: email.unwrap_or("unknown@example.com").to_owned(),
        }
    }
}

/// A product bookmarked by a user
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Favorite {
    /// Identifier
    pub id: Uuid,
    /// Owner
    pub user_id: Uuid,
    /// Barcode of the product
    pub product_code: String,
    /// When it was bookmarked
    pub added_at: DateTime<Utc>,
}

/// AI analysis stored for a user and day
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DailyAnalysis {
    /// Owner
    pub user_id: Uuid,
    /// Calendar day
    pub date: NaiveDate,
    /// Serialized analysis
    pub analysis_text: String,
    /// First stored
    pub created_at: DateTime<Utc>,
    /// Last changed
    pub updated_at: DateTime<Utc>,
}

/// A health news article
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Article {
    /// Headline
    pub title: String,
    /// Teaser
    pub description: String,
    /// Link to the article
    pub url: String,
    /// Picture
    pub image_url: Option<String>,
    /// Publication time as reported by the source
    pub published_at: Option<String>,
    /// Publisher name
    pub source: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn nutriments(value: Value) -> Nutriments {
        serde_json::from_value(value).unwrap()
    }

    #[test]
    fn test_normalized_picks_first_present_alias() {
        let n = nutriments(json!({
            "energy_100g": "",
            "energy-kcal": 120,
            "protein": "3.5",
            "sodium": 0.4,
            "brand_note": "kept"
        }))
        .normalized();

        assert_eq!(n.number("energy-kcal_100g"), Some(120.0));
        assert_eq!(n.number("calories"), Some(120.0));
        assert_eq!(n.number("proteins"), Some(3.5));
        assert_eq!(n.number("salt_100g"), Some(0.4));
        assert_eq!(n.number("fat"), Some(0.0));
        assert_eq!(n.0.get("brand_note"), Some(&json!("kept")));
    }

    #[test]
    fn test_non_numeric_values_become_zero() {
        let n = nutriments(json!({ "sugars": "lots" })).normalized();
        assert_eq!(n.number("sugars_100g"), Some(0.0));
    }

    #[test]
    fn test_first_non_zero_skips_zero() {
        let n = nutriments(json!({ "energy-kcal": 0, "energy-kcal_100g": 250 }));
        assert_eq!(
            n.first_non_zero(&["energy-kcal", "energy-kcal_100g"]),
            Some(250.0)
        );
        assert_eq!(n.first_non_zero(&["fat"]), None);
    }

    #[test]
    fn test_requester_fallbacks() {
        let id = Uuid::new_v4();
        let anonymous = Requester::new(id, None, None);
        assert_eq!(anonymous.name, "Unknown User");
        assert_eq!(anonymous.email, "unknown@example.com");

        let email_only = Requester::new(id, Some(""), Some("a@b.test"));
        assert_eq!(email_only.name, "a@b.test");
    }

    #[test]
    fn test_request_status_parsing() {
        assert_eq!(
            "completed".parse::<RequestStatus>().unwrap(),
            RequestStatus::Completed
        );
        assert!("done".parse::<RequestStatus>().is_err());
        assert!(RequestStatus::Rejected.is_resolution());
        assert!(!RequestStatus::Processing.is_resolution());
    }

    #[test]
    fn test_role_parsing() {
        assert!(UserRole::from_str_or_default("ADMIN").is_admin());
        assert!(!UserRole::from_str_or_default("editor").is_admin());
    }
}
