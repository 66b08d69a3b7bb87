// ABOUTME: Domain service layer for business logic extracted from route handlers
// ABOUTME: Provides barcode resolution, product request bookkeeping, food analysis and health news
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Pierre Fitness Intelligence

//! Domain service layer
//!
//! This module contains the flows that combine the database with external
//! collaborators. Route handlers stay thin and map service outcomes to HTTP.

/// Food analysis with a generative model and a rule-based fallback
pub mod food_analysis;

/// Health news with a NewsAPI fallback chain
pub mod health_news;

/// Barcode resolution: local cache, then Open Food Facts, then a manual-entry request
pub mod product_lookup;

/// Manual-entry requests for barcodes nobody could resolve
pub mod product_requests;

pub use food_analysis::{analyze, AnalysisOutcome};
pub use health_news::fetch_health_articles;
pub use product_lookup::{LookupOutcome, ProductLookupService};
pub use product_requests::record_request;
