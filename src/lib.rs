// ABOUTME: Main library entry point for the ScanBar nutrition tracking API
// ABOUTME: Provides barcode lookup, food journal, nutrition analysis and admin REST endpoints
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Pierre Fitness Intelligence

// Crate-level attributes:
// - deny(unsafe_code): Zero-tolerance unsafe policy
#![deny(unsafe_code)]

//! # ScanBar Server
//!
//! Backend for the ScanBar app: scan a product barcode or photograph a meal,
//! log it in a daily food journal and compare the totals with personal
//! nutrition goals.
//!
//! ## Features
//!
//! - **Barcode lookup**: local product cache backed by Open Food Facts, with
//!   manual-entry requests for administrators when a product is unknown
//! - **Food journal**: daily entries, today totals and weekly/monthly averages
//! - **AI analysis**: per-product analysis and meal photo estimates through
//!   Gemini, with a rule-based fallback
//! - **Assistant and news**: an in-app chatbot and cached health articles
//!
//! ## Architecture
//!
//! - **Routes**: thin axum handlers, one `XRoutes` struct per domain
//! - **Services**: flows combining the database with external clients
//! - **Database**: `SQLite` through sqlx
//! - **External**: Open Food Facts, NewsAPI and LLM providers behind traits
//!
//! ## Example Usage
//!
//! ```rust,no_run
//! use scanbar_server::config::ServerConfig;
//!
//! fn main() -> anyhow::Result<()> {
//!     let config = ServerConfig::from_env()?;
//!     println!("ScanBar configured with port: HTTP={}", config.http_port);
//!     Ok(())
//! }
//! ```

// ── Public API ──────────────────────────────────────────────────────────
// These modules are used by the binary (src/bin/) and integration tests (tests/).

/// Token issuing and verification, password hashing
pub mod auth;

/// Environment-driven configuration
pub mod config;

/// Application constants and user-facing messages
pub mod constants;

/// `SQLite` persistence
pub mod database;

/// Unified error handling
pub mod errors;

/// Open Food Facts and NewsAPI clients
pub mod external;

/// Generative model providers and prompts
pub mod llm;

/// Logging configuration and structured event helpers
pub mod logging;

/// HTTP middleware: authentication, admin guard, CORS and request tracing
pub mod middleware;

/// Domain models
pub mod models;

/// Barcode handling, journal summaries and analysis parsing
pub mod nutrition;

/// HTTP route handlers
pub mod routes;

/// Router assembly and HTTP serving
pub mod server;

/// Domain service layer
pub mod services;
