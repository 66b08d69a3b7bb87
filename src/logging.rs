// ABOUTME: Tracing subscriber setup driven by RUST_LOG and LOG_FORMAT
// ABOUTME: Structured event helpers for sign-in, upstream calls, outbound email and security
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Pierre Fitness Intelligence

//! Logging
//!
//! `LOG_FORMAT=json` emits one JSON object per event for log shippers; the
//! default is human-readable output. Dependency crates are capped at `warn`
//! unless `RUST_LOG` names them explicitly.

use std::env;
use std::io;

use anyhow::{anyhow, Result};
use tracing::{info, warn};
use tracing_subscriber::{
    filter::Directive,
    fmt::{self, format::FmtSpan},
    layer::SubscriberExt,
    util::SubscriberInitExt,
    EnvFilter,
};

use crate::constants::service;

/// Dependency targets capped unless `RUST_LOG` overrides them
const QUIET_TARGETS: &[&str] = &["hyper=warn", "reqwest=warn", "sqlx=warn", "tower_http=info"];

/// Event output format
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum LogFormat {
    /// One JSON object per line
    Json,
    /// Multi-field human output
    #[default]
    Pretty,
    /// Single-line output without targets
    Compact,
}

impl LogFormat {
    /// Parse `LOG_FORMAT`, unknown values give pretty output
    #[must_use]
    pub fn parse(value: &str) -> Self {
        match value.trim().to_ascii_lowercase().as_str() {
            "json" => Self::Json,
            "compact" => Self::Compact,
            _ => Self::Pretty,
        }
    }
}

/// Subscriber settings
#[derive(Debug, Clone)]
pub struct LoggingConfig {
    /// `EnvFilter` directives, e.g. `info` or `scanbar_server=debug`
    pub filter: String,
    pub format: LogFormat,
    /// Add file and line to each event
    pub with_location: bool,
    /// Emit span open and close events
    pub with_spans: bool,
    /// Deployment name reported at startup
    pub environment: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            filter: "info".to_owned(),
            format: LogFormat::default(),
            with_location: false,
            with_spans: false,
            environment: "development".to_owned(),
        }
    }
}

impl LoggingConfig {
    /// Read `RUST_LOG`, `LOG_FORMAT`, `LOG_INCLUDE_LOCATION`, `LOG_INCLUDE_SPANS`
    /// and `ENVIRONMENT`
    #[must_use]
    pub fn from_env() -> Self {
        let environment = env::var("ENVIRONMENT").unwrap_or_else(|_| "development".to_owned());
        Self {
            filter: env::var("RUST_LOG").unwrap_or_else(|_| "info".to_owned()),
            format: LogFormat::parse(&env::var("LOG_FORMAT").unwrap_or_default()),
            with_location: environment == "production"
                || env::var("LOG_INCLUDE_LOCATION").is_ok(),
            with_spans: env::var("LOG_INCLUDE_SPANS").is_ok(),
            environment,
        }
    }

    /// Filter with quiet dependency targets; explicit `RUST_LOG` directives win
    fn env_filter(&self) -> EnvFilter {
        let base = EnvFilter::try_new(&self.filter).unwrap_or_else(|_| EnvFilter::new("info"));
        QUIET_TARGETS
            .iter()
            .filter(|directive| {
                let target = directive.split('=').next().unwrap_or_default();
                !self.filter.contains(target)
            })
            .filter_map(|directive| directive.parse::<Directive>().ok())
            .fold(base, EnvFilter::add_directive)
    }

    /// Install the global subscriber
    ///
    /// # Errors
    ///
    /// Returns an error if a global subscriber is already installed
    pub fn init(&self) -> Result<()> {
        let spans = if self.with_spans {
            FmtSpan::NEW | FmtSpan::CLOSE
        } else {
            FmtSpan::NONE
        };

        let json = (self.format == LogFormat::Json).then(|| {
            fmt::layer()
                .json()
                .with_current_span(true)
                .with_file(self.with_location)
                .with_line_number(self.with_location)
                .with_span_events(spans.clone())
                .with_writer(io::stdout)
        });
        let pretty = (self.format == LogFormat::Pretty).then(|| {
            fmt::layer()
                .with_file(self.with_location)
                .with_line_number(self.with_location)
                .with_span_events(spans)
                .with_writer(io::stdout)
        });
        let compact = (self.format == LogFormat::Compact)
            .then(|| fmt::layer().compact().with_target(false).with_writer(io::stdout));

        tracing_subscriber::registry()
            .with(self.env_filter())
            .with(json)
            .with(pretty)
            .with(compact)
            .try_init()
            .map_err(|e| anyhow!("Failed to initialize logging: {e}"))?;

        info!(
            service.name = service::SERVICE_NAME,
            service.version = service::SERVICE_VERSION,
            environment = %self.environment,
            log.filter = %self.filter,
            log.format = ?self.format,
            "Logging initialized"
        );
        Ok(())
    }
}

/// Install the subscriber described by the environment
///
/// # Errors
///
/// Returns an error if logging initialization fails
pub fn init_from_env() -> Result<()> {
    LoggingConfig::from_env().init()
}

/// Structured events shared by several handlers
pub struct AppLogger;

impl AppLogger {
    /// Sign-in, verification and password reset outcomes
    pub fn log_auth_event(user_id: &str, event: &str, success: bool, details: Option<&str>) {
        info!(
            user.id = %user_id,
            auth.event = %event,
            auth.success = success,
            auth.details = details.unwrap_or_default(),
            "Authentication event"
        );
    }

    /// A call to Open Food Facts, NewsAPI or the generative model
    pub fn log_external_call(service: &str, operation: &str, success: bool, duration_ms: u64) {
        if success {
            info!(
                external.service = %service,
                external.operation = %operation,
                external.duration_ms = duration_ms,
                "External call succeeded"
            );
        } else {
            warn!(
                external.service = %service,
                external.operation = %operation,
                external.duration_ms = duration_ms,
                "External call failed"
            );
        }
    }

    /// A message that would be emailed to a user
    ///
    /// Mail delivery lives outside this service; the link is logged for an
    /// operator or a mail relay to pick up.
    pub fn log_outbound_email(kind: &str, recipient: &str, link: &str) {
        info!(
            email.kind = %kind,
            email.recipient = %recipient,
            email.link = %link,
            "Outbound email queued"
        );
    }

    /// An administrator changed another account
    pub fn log_admin_action(action: &str, target_user_id: &str, admin_id: &str) {
        info!(
            admin.action = %action,
            admin.id = %admin_id,
            target.user_id = %target_user_id,
            "Admin action"
        );
    }

    /// Rejected access to a protected resource
    pub fn log_security_event(event: &str, details: &str, user_id: Option<&str>) {
        warn!(
            security.event = %event,
            security.details = %details,
            user.id = user_id.unwrap_or("unknown"),
            "Security event"
        );
    }
}
