// ABOUTME: External API client modules (Open Food Facts, NewsAPI)
// ABOUTME: Each client sits behind a trait with a reqwest implementation and a test mock
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Pierre Fitness Intelligence

//! External API Clients
//!
//! This module contains clients for the external APIs used by the server.
//! The generative model client lives in [`crate::llm`].

pub mod news_api;
pub mod open_food_facts;

// Re-export commonly used types
pub use news_api::{
    MockNewsSource, NewsApiClient, NewsApiConfig, NewsError, NewsQuery, NewsSource, RawArticle,
};
pub use open_food_facts::{
    MockProductCatalog, OffLookup, OffProduct, OpenFoodFactsClient, OpenFoodFactsConfig,
    ProductCatalog,
};
