// ABOUTME: Environment configuration management for deployment-specific settings
// ABOUTME: Parses environment variables into typed server, auth, database and external API settings
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Pierre Fitness Intelligence

//! Environment-based configuration management for production deployment

use crate::constants::{defaults, ports};
use anyhow::{anyhow, Result};
use chrono::FixedOffset;
use rand::{distributions::Alphanumeric, Rng};
use serde::{Deserialize, Serialize};
use std::env;
use std::fmt;
use std::path::PathBuf;
use std::str::FromStr;
use tracing::{info, warn};

/// Environment type for security and other configurations
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "lowercase")]
pub enum Environment {
    /// Local development
    #[default]
    Development,
    /// Production deployment
    Production,
    /// Automated tests
    Testing,
}

impl Environment {
    /// Parse from string with fallback
    #[must_use]
    pub fn from_str_or_default(s: &str) -> Self {
        match s.to_lowercase().as_str() {
            "production" | "prod" => Self::Production,
            "testing" | "test" => Self::Testing,
            _ => Self::Development,
        }
    }

    /// Check if this is a production environment
    #[must_use]
    pub const fn is_production(self) -> bool {
        matches!(self, Self::Production)
    }
}

impl fmt::Display for Environment {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Development => write!(f, "development"),
            Self::Production => write!(f, "production"),
            Self::Testing => write!(f, "testing"),
        }
    }
}

/// Type-safe database configuration
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub enum DatabaseUrl {
    /// `SQLite` database with file path
    SQLite {
        /// Database file location
        path: PathBuf,
    },
    /// In-memory `SQLite` (for testing)
    Memory,
}

impl DatabaseUrl {
    /// Parse from string with validation
    ///
    /// # Errors
    ///
    /// Returns an error for non-SQLite schemes
    pub fn parse_url(s: &str) -> Result<Self> {
        if let Some(path_str) = s.strip_prefix("sqlite:") {
            if path_str == ":memory:" {
                Ok(Self::Memory)
            } else if path_str.is_empty() {
                Err(anyhow!("DATABASE_URL has an empty SQLite path"))
            } else {
                Ok(Self::SQLite {
                    path: PathBuf::from(path_str),
                })
            }
        } else if s.contains("://") {
            Err(anyhow!("Unsupported database scheme in DATABASE_URL: {s}"))
        } else {
            Ok(Self::SQLite {
                path: PathBuf::from(s),
            })
        }
    }

    /// Convert to connection string
    #[must_use]
    pub fn to_connection_string(&self) -> String {
        match self {
            Self::SQLite { path } => format!("sqlite:{}", path.display()),
            Self::Memory => "sqlite::memory:".to_owned(),
        }
    }

    /// Check if this is an in-memory database
    #[must_use]
    pub const fn is_memory(&self) -> bool {
        matches!(self, Self::Memory)
    }
}

impl Default for DatabaseUrl {
    fn default() -> Self {
        Self::SQLite {
            path: PathBuf::from("./data/scanbar.db"),
        }
    }
}

impl fmt::Display for DatabaseUrl {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.to_connection_string())
    }
}

/// Session and identity provider token settings
#[derive(Clone)]
pub struct AuthConfig {
    /// HS256 secret for session tokens issued by this server
    pub jwt_secret: String,
    /// Session token lifetime in days
    pub jwt_expiry_days: i64,
    /// HS256 secret for tokens issued by the external identity provider
    pub identity_provider_secret: Option<String>,
    /// Substring of the `iss` claim that marks identity provider tokens
    pub identity_provider_issuer_hint: String,
}

impl fmt::Debug for AuthConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AuthConfig")
            .field("jwt_secret", &"[REDACTED]")
            .field("jwt_expiry_days", &self.jwt_expiry_days)
            .field(
                "identity_provider_secret",
                &self.identity_provider_secret.as_ref().map(|_| "[REDACTED]"),
            )
            .field(
                "identity_provider_issuer_hint",
                &self.identity_provider_issuer_hint,
            )
            .finish()
    }
}

impl Default for AuthConfig {
    fn default() -> Self {
        Self {
            jwt_secret: String::new(),
            jwt_expiry_days: defaults::JWT_EXPIRY_DAYS,
            identity_provider_secret: None,
            identity_provider_issuer_hint: defaults::IDENTITY_PROVIDER_ISSUER_HINT.to_owned(),
        }
    }
}

/// Generative model settings
#[derive(Clone, Default)]
pub struct GenerativeModelConfig {
    /// Gemini API key, `None` disables the model and enables heuristic fallback
    pub api_key: Option<String>,
    /// Model for food analysis and image recognition
    pub analysis_model: String,
    /// Model for the chatbot
    pub chatbot_model: String,
}

impl fmt::Debug for GenerativeModelConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("GenerativeModelConfig")
            .field("api_key", &self.api_key.as_ref().map(|_| "[REDACTED]"))
            .field("analysis_model", &self.analysis_model)
            .field("chatbot_model", &self.chatbot_model)
            .finish()
    }
}

/// Open Food Facts settings
#[derive(Debug, Clone)]
pub struct ProductCatalogConfig {
    /// API root
    pub base_url: String,
    /// Lookup timeout
    pub timeout_secs: u64,
}

/// `NewsAPI` settings
#[derive(Clone)]
pub struct NewsConfig {
    /// API key, `None` makes the articles route report a configuration error
    pub api_key: Option<String>,
    /// API root
    pub base_url: String,
}

impl fmt::Debug for NewsConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("NewsConfig")
            .field("api_key", &self.api_key.as_ref().map(|_| "[REDACTED]"))
            .field("base_url", &self.base_url)
            .finish()
    }
}

/// External service configuration
#[derive(Debug, Clone)]
pub struct ExternalServicesConfig {
    /// Generative model
    pub generative: GenerativeModelConfig,
    /// Product catalog
    pub product_catalog: ProductCatalogConfig,
    /// News aggregator
    pub news: NewsConfig,
}

/// HTTP layer settings
#[derive(Debug, Clone)]
pub struct HttpConfig {
    /// CORS allowed origins, `*` allows any
    pub cors_origins: Vec<String>,
    /// Whole-request timeout
    pub request_timeout_secs: u64,
    /// Request body limit
    pub max_body_bytes: usize,
}

/// URLs used when building links for verification and password reset
#[derive(Debug, Clone)]
pub struct LinkConfig {
    /// Public URL of this API
    pub public_base_url: String,
    /// URL of the web frontend
    pub frontend_base_url: String,
}

/// Complete server configuration
#[derive(Debug, Clone)]
pub struct ServerConfig {
    /// HTTP API port
    pub http_port: u16,
    /// Bind host
    pub host: String,
    /// Deployment environment
    pub environment: Environment,
    /// `RUST_LOG` filter, reported in the startup summary
    pub log_filter: String,
    /// Database location
    pub database_url: DatabaseUrl,
    /// Token settings
    pub auth: AuthConfig,
    /// External APIs
    pub external_services: ExternalServicesConfig,
    /// HTTP layer
    pub http: HttpConfig,
    /// Link building
    pub links: LinkConfig,
    /// Offset used to decide where a calendar day starts, in minutes east of UTC
    pub utc_offset_minutes: i32,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            http_port: ports::DEFAULT_HTTP_PORT,
            host: ports::DEFAULT_HOST.to_owned(),
            environment: Environment::Development,
            log_filter: "info".to_owned(),
            database_url: DatabaseUrl::default(),
            auth: AuthConfig::default(),
            external_services: ExternalServicesConfig {
                generative: GenerativeModelConfig {
                    api_key: None,
                    analysis_model: defaults::GENERATIVE_MODEL.to_owned(),
                    chatbot_model: defaults::CHATBOT_MODEL.to_owned(),
                },
                product_catalog: ProductCatalogConfig {
                    base_url: defaults::OPEN_FOOD_FACTS_BASE_URL.to_owned(),
                    timeout_secs: defaults::OPEN_FOOD_FACTS_TIMEOUT_SECS,
                },
                news: NewsConfig {
                    api_key: None,
                    base_url: defaults::NEWS_API_BASE_URL.to_owned(),
                },
            },
            http: HttpConfig {
                cors_origins: vec!["*".to_owned()],
                request_timeout_secs: defaults::REQUEST_TIMEOUT_SECS,
                max_body_bytes: defaults::MAX_REQUEST_BODY_BYTES,
            },
            links: LinkConfig {
                public_base_url: defaults::PUBLIC_BASE_URL.to_owned(),
                frontend_base_url: defaults::FRONTEND_BASE_URL.to_owned(),
            },
            utc_offset_minutes: 0,
        }
    }
}

impl ServerConfig {
    /// Load configuration from environment variables
    ///
    /// # Errors
    ///
    /// Returns an error if a numeric variable does not parse, the database URL
    /// is unsupported, or validation fails
    pub fn from_env() -> Result<Self> {
        let environment =
            Environment::from_str_or_default(&env_var_or("ENVIRONMENT", "development"));

        let port_raw = env::var("HTTP_PORT")
            .or_else(|_| env::var("PORT"))
            .unwrap_or_else(|_| ports::DEFAULT_HTTP_PORT.to_string());

        let jwt_secret = match non_empty_var("JWT_SECRET") {
            Some(secret) => secret,
            None if environment.is_production() => String::new(),
            None => {
                warn!("JWT_SECRET not set, generating an ephemeral secret for this process");
                generate_ephemeral_secret()
            }
        };

        let config = Self {
            http_port: port_raw
                .parse()
                .map_err(|e| anyhow!("Invalid HTTP_PORT value '{port_raw}': {e}"))?,
            host: env_var_or("HOST", ports::DEFAULT_HOST),
            environment,
            log_filter: env_var_or("RUST_LOG", "info"),
            database_url: DatabaseUrl::parse_url(&env_var_or(
                "DATABASE_URL",
                defaults::DATABASE_URL,
            ))?,
            auth: AuthConfig {
                jwt_secret,
                jwt_expiry_days: parse_env("JWT_EXPIRY_DAYS", defaults::JWT_EXPIRY_DAYS)?,
                identity_provider_secret: non_empty_var("IDENTITY_PROVIDER_JWT_SECRET"),
                identity_provider_issuer_hint: env_var_or(
                    "IDENTITY_PROVIDER_ISSUER_HINT",
                    defaults::IDENTITY_PROVIDER_ISSUER_HINT,
                ),
            },
            external_services: ExternalServicesConfig {
                generative: GenerativeModelConfig {
                    api_key: non_empty_var("GEMINI_API_KEY"),
                    analysis_model: env_var_or("GENERATIVE_MODEL", defaults::GENERATIVE_MODEL),
                    chatbot_model: env_var_or("CHATBOT_MODEL", defaults::CHATBOT_MODEL),
                },
                product_catalog: ProductCatalogConfig {
                    base_url: env_var_or(
                        "OPEN_FOOD_FACTS_BASE_URL",
                        defaults::OPEN_FOOD_FACTS_BASE_URL,
                    ),
                    timeout_secs: parse_env(
                        "OPEN_FOOD_FACTS_TIMEOUT_SECS",
                        defaults::OPEN_FOOD_FACTS_TIMEOUT_SECS,
                    )?,
                },
                news: NewsConfig {
                    api_key: non_empty_var("NEWS_API_KEY"),
                    base_url: env_var_or("NEWS_API_BASE_URL", defaults::NEWS_API_BASE_URL),
                },
            },
            http: HttpConfig {
                cors_origins: parse_origins(&env_var_or("CORS_ALLOWED_ORIGINS", "*")),
                request_timeout_secs: parse_env(
                    "REQUEST_TIMEOUT_SECS",
                    defaults::REQUEST_TIMEOUT_SECS,
                )?,
                max_body_bytes: parse_env(
                    "MAX_REQUEST_BODY_BYTES",
                    defaults::MAX_REQUEST_BODY_BYTES,
                )?,
            },
            links: LinkConfig {
                public_base_url: env_var_or("PUBLIC_BASE_URL", defaults::PUBLIC_BASE_URL),
                frontend_base_url: env_var_or("FRONTEND_BASE_URL", defaults::FRONTEND_BASE_URL),
            },
            utc_offset_minutes: parse_env("APP_UTC_OFFSET_MINUTES", 0)?,
        };

        config.validate()?;
        info!("Configuration loaded successfully");
        Ok(config)
    }

    /// Validate configuration values
    ///
    /// # Errors
    ///
    /// Returns an error when a required secret is missing in production or a
    /// value is outside its allowed range
    pub fn validate(&self) -> Result<()> {
        if self.auth.jwt_secret.is_empty() {
            return Err(anyhow!("JWT_SECRET must be set"));
        }

        if self.auth.jwt_expiry_days <= 0 {
            return Err(anyhow!("JWT_EXPIRY_DAYS must be positive"));
        }

        if self.utc_offset().is_none() {
            return Err(anyhow!("APP_UTC_OFFSET_MINUTES must be within +/- 1440 minutes"));
        }

        if self.environment.is_production() && self.database_url.is_memory() {
            warn!("Production environment is running on an in-memory database");
        }

        if self.external_services.generative.api_key.is_none() {
            warn!("GEMINI_API_KEY not set, food analysis will use the heuristic fallback");
        }

        if self.external_services.news.api_key.is_none() {
            warn!("NEWS_API_KEY not set, health articles are unavailable");
        }

        Ok(())
    }

    /// Offset applied when computing calendar day boundaries
    #[must_use]
    pub fn utc_offset(&self) -> Option<FixedOffset> {
        FixedOffset::east_opt(self.utc_offset_minutes.checked_mul(60)?)
    }

    /// Get a summary of the configuration for logging (without secrets)
    #[must_use]
    pub fn summary(&self) -> String {
        let enabled = |flag: bool| if flag { "Enabled" } else { "Disabled" };
        format!(
            "ScanBar Server Configuration:\n\
             - Environment: {}\n\
             - HTTP: {}:{}\n\
             - Log Filter: {}\n\
             - Database: {}\n\
             - Identity Provider Tokens: {}\n\
             - Generative Model: {} ({})\n\
             - Open Food Facts: {}\n\
             - News API: {}\n\
             - CORS Origins: {}",
            self.environment,
            self.host,
            self.http_port,
            self.log_filter,
            if self.database_url.is_memory() {
                "SQLite (memory)"
            } else {
                "SQLite"
            },
            enabled(self.auth.identity_provider_secret.is_some()),
            enabled(self.external_services.generative.api_key.is_some()),
            self.external_services.generative.analysis_model,
            self.external_services.product_catalog.base_url,
            enabled(self.external_services.news.api_key.is_some()),
            self.http.cors_origins.join(", "),
        )
    }
}

/// Get environment variable or default value
fn env_var_or(key: &str, default: &str) -> String {
    env::var(key).unwrap_or_else(|_| default.to_owned())
}

/// Get a trimmed, non-empty environment variable
fn non_empty_var(key: &str) -> Option<String> {
    env::var(key)
        .ok()
        .map(|v| v.trim().to_owned())
        .filter(|v| !v.is_empty())
}

/// Parse an environment variable, falling back to `default` when unset
fn parse_env<T>(key: &str, default: T) -> Result<T>
where
    T: FromStr,
    T::Err: fmt::Display,
{
    match env::var(key) {
        Ok(raw) => raw
            .trim()
            .parse()
            .map_err(|e| anyhow!("Invalid {key} value '{raw}': {e}")),
        Err(_) => Ok(default),
    }
}

/// Parse comma-separated CORS origins
fn parse_origins(origins_str: &str) -> Vec<String> {
    if origins_str.trim() == "*" {
        vec!["*".to_owned()]
    } else {
        origins_str
            .split(',')
            .map(|s| s.trim().to_owned())
            .filter(|s| !s.is_empty())
            .collect()
    }
}

fn generate_ephemeral_secret() -> String {
    rand::thread_rng()
        .sample_iter(&Alphanumeric)
        .take(64)
        .map(char::from)
        .collect()
}
