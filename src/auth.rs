// ABOUTME: JWT session tokens, identity provider token validation and credential helpers
// ABOUTME: Issues HS256 session tokens, hashes passwords with bcrypt and mints random tokens
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Pierre Fitness Intelligence

//! # Authentication and Session Management
//!
//! Two token families are accepted:
//!
//! - session tokens minted by [`AuthManager::generate_token`], carrying
//!   `{user: {id, name}, iat, exp}`;
//! - tokens from the external identity provider, recognised by an `iss` claim
//!   containing the configured hint and verified with their own secret.

use std::error::Error as StdError;
use std::fmt;

use base64::{engine::general_purpose::URL_SAFE_NO_PAD, Engine};
use chrono::{DateTime, Duration, Utc};
use jsonwebtoken::errors::{Error as JwtError, ErrorKind};
use jsonwebtoken::{decode, encode, Algorithm, DecodingKey, EncodingKey, Header, Validation};
use rand::RngCore;
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use tokio::task;
use uuid::Uuid;

use crate::config::AuthConfig;
use crate::constants::limits::TOKEN_BYTES;
use crate::errors::{AppError, AppResult};
use crate::models::{User, UserRole};

/// bcrypt cost for stored passwords
const PASSWORD_HASH_COST: u32 = 10;

/// Convert a duration to a human-readable format
fn humanize_duration(duration: Duration) -> String {
    let total_secs = duration.num_seconds().abs();
    let hours = total_secs / 3600;
    let minutes = (total_secs % 3600) / 60;

    if hours > 0 {
        format!("{hours} hours")
    } else if minutes > 0 {
        format!("{minutes} minutes")
    } else {
        format!("{total_secs} seconds")
    }
}

/// `JWT` validation error with detailed information
#[derive(Debug, Clone)]
pub enum JwtValidationError {
    /// Token has expired
    TokenExpired {
        /// When the token expired, when known
        expired_at: Option<DateTime<Utc>>,
    },
    /// Token signature or claims are invalid
    TokenInvalid {
        /// Reason for invalidity
        reason: String,
    },
    /// Token is malformed (not proper `JWT` format)
    TokenMalformed {
        /// Details about malformation
        details: String,
    },
    /// Token comes from the identity provider but no secret is configured
    ProviderNotConfigured,
}

impl fmt::Display for JwtValidationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::TokenExpired {
                expired_at: Some(at),
            } => write!(
                f,
                "JWT token expired {} ago at {}",
                humanize_duration(Utc::now().signed_duration_since(*at)),
                at.format("%Y-%m-%d %H:%M:%S UTC")
            ),
            Self::TokenExpired { expired_at: None } => f.write_str("JWT token expired"),
            Self::TokenInvalid { reason } => write!(f, "JWT token is invalid: {reason}"),
            Self::TokenMalformed { details } => write!(f, "JWT token is malformed: {details}"),
            Self::ProviderNotConfigured => {
                f.write_str("Identity provider token received but no provider secret is set")
            }
        }
    }
}

impl StdError for JwtValidationError {}

/// User part of session claims
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SessionUser {
    /// User id
    pub id: String,
    /// Display name
    pub name: String,
}

/// `JWT` claims of a session token
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Claims {
    /// Authenticated user
    pub user: SessionUser,
    /// Issued at timestamp
    pub iat: i64,
    /// Expiration timestamp
    pub exp: i64,
}

/// `JWT` claims of an identity provider token
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct IdentityProviderClaims {
    /// User id
    pub sub: String,
    /// User email
    #[serde(default)]
    pub email: Option<String>,
    /// Issuer
    pub iss: String,
    /// Expiration timestamp
    pub exp: i64,
    /// Role asserted by the provider
    #[serde(default)]
    pub role: Option<String>,
}

/// Identity carried by a verified token, before any profile lookup
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TokenIdentity {
    /// User id
    pub user_id: Uuid,
    /// Display name from session claims
    pub name: Option<String>,
    /// Email from identity provider claims
    pub email: Option<String>,
}

/// Authenticated caller
#[derive(Debug, Clone)]
pub struct AuthResult {
    /// Authenticated user `ID`
    pub user_id: Uuid,
    /// Display name, when known
    pub name: Option<String>,
    /// Email, when known
    pub email: Option<String>,
    /// Profile role
    pub role: UserRole,
}

/// Authentication manager for `JWT` tokens
#[derive(Clone)]
pub struct AuthManager {
    session_secret: Vec<u8>,
    token_expiry_days: i64,
    provider_secret: Option<Vec<u8>>,
    issuer_hint: String,
}

impl AuthManager {
    /// Create a new authentication manager
    #[must_use]
    pub fn new(config: &AuthConfig) -> Self {
        Self {
            session_secret: config.jwt_secret.as_bytes().to_vec(),
            token_expiry_days: config.jwt_expiry_days,
            provider_secret: config
                .identity_provider_secret
                .as_ref()
                .map(|s| s.as_bytes().to_vec()),
            issuer_hint: config.identity_provider_issuer_hint.clone(),
        }
    }

    /// Generate an HS256 session token for a user
    ///
    /// # Errors
    ///
    /// Returns an error if JWT encoding fails
    pub fn generate_token(&self, user: &User) -> AppResult<String> {
        let now = Utc::now();
        let claims = Claims {
            user: SessionUser {
                id: user.id.to_string(),
                name: user.name.clone(),
            },
            iat: now.timestamp(),
            exp: (now + Duration::days(self.token_expiry_days)).timestamp(),
        };

        encode(
            &Header::new(Algorithm::HS256),
            &claims,
            &EncodingKey::from_secret(&self.session_secret),
        )
        .map_err(|e| AppError::internal(format!("Failed to sign session token: {e}")))
    }

    /// Validate a session token
    ///
    /// # Errors
    ///
    /// Returns a [`JwtValidationError`] when the signature, expiry or format is wrong
    pub fn validate_token(&self, token: &str) -> Result<Claims, JwtValidationError> {
        let validation = Validation::new(Algorithm::HS256);
        decode::<Claims>(
            token,
            &DecodingKey::from_secret(&self.session_secret),
            &validation,
        )
        .map(|data| data.claims)
        .map_err(|e| Self::convert_jwt_error(&e, token))
    }

    /// Validate a token minted by the identity provider
    ///
    /// # Errors
    ///
    /// Returns a [`JwtValidationError`] when no provider secret is configured or
    /// the token does not verify
    pub fn validate_identity_provider_token(
        &self,
        token: &str,
    ) -> Result<IdentityProviderClaims, JwtValidationError> {
        let secret = self
            .provider_secret
            .as_ref()
            .ok_or(JwtValidationError::ProviderNotConfigured)?;

        let mut validation = Validation::new(Algorithm::HS256);
        validation.validate_aud = false;
        validation.set_required_spec_claims(&["exp", "sub", "iss"]);

        let claims = decode::<IdentityProviderClaims>(
            token,
            &DecodingKey::from_secret(secret),
            &validation,
        )
        .map(|data| data.claims)
        .map_err(|e| Self::convert_jwt_error(&e, token))?;

        if !claims.iss.contains(&self.issuer_hint) {
            return Err(JwtValidationError::TokenInvalid {
                reason: format!("Unexpected issuer {}", claims.iss),
            });
        }
        Ok(claims)
    }

    /// Verify either kind of token, dispatching on the unverified issuer
    ///
    /// # Errors
    ///
    /// Returns a [`JwtValidationError`] when the token does not verify or its
    /// subject is not a UUID
    pub fn verify(&self, token: &str) -> Result<TokenIdentity, JwtValidationError> {
        if self.is_identity_provider_token(token) {
            let claims = self.validate_identity_provider_token(token)?;
            return Ok(TokenIdentity {
                user_id: parse_subject(&claims.sub)?,
                name: None,
                email: claims.email,
            });
        }

        let claims = self.validate_token(token)?;
        Ok(TokenIdentity {
            user_id: parse_subject(&claims.user.id)?,
            name: Some(claims.user.name),
            email: None,
        })
    }

    /// Whether the unverified `iss` claim names the identity provider
    fn is_identity_provider_token(&self, token: &str) -> bool {
        #[derive(Deserialize)]
        struct Issuer {
            iss: Option<String>,
        }

        token
            .split('.')
            .nth(1)
            .and_then(|payload| URL_SAFE_NO_PAD.decode(payload).ok())
            .and_then(|bytes| serde_json::from_slice::<Issuer>(&bytes).ok())
            .and_then(|claims| claims.iss)
            .is_some_and(|iss| iss.contains(&self.issuer_hint))
    }

    /// Convert JWT library errors to detailed validation errors
    fn convert_jwt_error(e: &JwtError, token: &str) -> JwtValidationError {
        match e.kind() {
            ErrorKind::ExpiredSignature => {
                let expired_at = unverified_expiry(token);
                tracing::warn!(?expired_at, "JWT token expired");
                JwtValidationError::TokenExpired { expired_at }
            }
            ErrorKind::InvalidSignature => JwtValidationError::TokenInvalid {
                reason: "Token signature verification failed".into(),
            },
            ErrorKind::InvalidToken => JwtValidationError::TokenMalformed {
                details: "Token format is invalid".into(),
            },
            ErrorKind::Base64(base64_err) => JwtValidationError::TokenMalformed {
                details: format!("Token contains invalid base64: {base64_err}"),
            },
            ErrorKind::Json(json_err) => JwtValidationError::TokenMalformed {
                details: format!("Token contains invalid JSON: {json_err}"),
            },
            _ => JwtValidationError::TokenInvalid {
                reason: format!("Token validation failed: {e}"),
            },
        }
    }
}

fn parse_subject(raw: &str) -> Result<Uuid, JwtValidationError> {
    Uuid::parse_str(raw).map_err(|_| JwtValidationError::TokenInvalid {
        reason: format!("Subject {raw} is not a user id"),
    })
}

fn unverified_expiry(token: &str) -> Option<DateTime<Utc>> {
    #[derive(Deserialize)]
    struct Expiry {
        exp: i64,
    }

    let payload = token.split('.').nth(1)?;
    let bytes = URL_SAFE_NO_PAD.decode(payload).ok()?;
    let claims: Expiry = serde_json::from_slice(&bytes).ok()?;
    DateTime::from_timestamp(claims.exp, 0)
}

/// Hash a password with bcrypt on the blocking pool
///
/// # Errors
///
/// Returns an error if hashing fails or the blocking task panics
pub async fn hash_password(password: String) -> AppResult<String> {
    task::spawn_blocking(move || bcrypt::hash(password, PASSWORD_HASH_COST))
        .await
        .map_err(|e| AppError::internal(format!("Password hashing task failed: {e}")))?
        .map_err(|e| AppError::internal(format!("Password hashing failed: {e}")))
}

/// Check a password against a bcrypt hash; malformed hashes never match
pub async fn verify_password(password: String, hash: String) -> bool {
    task::spawn_blocking(move || bcrypt::verify(password, &hash).unwrap_or(false))
        .await
        .unwrap_or(false)
}

/// Random token of [`TOKEN_BYTES`] bytes encoded as lowercase hex
#[must_use]
pub fn generate_token_hex() -> String {
    let mut bytes = [0_u8; TOKEN_BYTES];
    rand::thread_rng().fill_bytes(&mut bytes);
    hex::encode(bytes)
}

/// SHA-256 of a string as lowercase hex
#[must_use]
pub fn sha256_hex(value: &str) -> String {
    hex::encode(Sha256::digest(value.as_bytes()))
}
