// ABOUTME: Centralized resource container shared by every route handler
// ABOUTME: Holds configuration, the database, the auth manager and the external service clients
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Pierre Fitness Intelligence

//! # Server Resources
//!
//! Expensive objects are created once at startup and shared through an
//! `Arc<ServerResources>` handed to every router as axum state.
//!
//! External clients are trait objects so tests can swap in
//! [`MockProductCatalog`](crate::external::MockProductCatalog),
//! [`MockNewsSource`](crate::external::MockNewsSource) and
//! [`ScriptedLlmProvider`](crate::llm::ScriptedLlmProvider).

use std::sync::Arc;

use anyhow::Result;
use tracing::{info, warn};

use crate::auth::AuthManager;
use crate::config::ServerConfig;
use crate::database::Database;
use crate::external::{
    NewsApiClient, NewsApiConfig, NewsSource, OpenFoodFactsClient, OpenFoodFactsConfig,
    ProductCatalog,
};
use crate::llm::{GeminiConfig, GeminiProvider, LlmProvider};
use crate::nutrition::JournalCalendar;
use crate::services::ProductLookupService;

/// Shared server state
#[derive(Clone)]
pub struct ServerResources {
    pub config: Arc<ServerConfig>,
    pub database: Arc<Database>,
    pub auth_manager: AuthManager,
    pub product_catalog: Arc<dyn ProductCatalog>,
    pub news_source: Arc<dyn NewsSource>,
    /// `None` when no generative model key is configured
    pub llm: Option<Arc<dyn LlmProvider>>,
}

impl ServerResources {
    /// Assemble resources from already-built parts
    #[must_use]
    pub fn new(
        config: Arc<ServerConfig>,
        database: Arc<Database>,
        product_catalog: Arc<dyn ProductCatalog>,
        news_source: Arc<dyn NewsSource>,
        llm: Option<Arc<dyn LlmProvider>>,
    ) -> Self {
        let auth_manager = AuthManager::new(&config.auth);
        Self {
            config,
            database,
            auth_manager,
            product_catalog,
            news_source,
            llm,
        }
    }

    /// Build the production HTTP clients from configuration
    ///
    /// Gemini is only wired in when an API key is present; without one the
    /// analysis endpoints fall back to the heuristic.
    ///
    /// # Errors
    ///
    /// Returns an error if an HTTP client cannot be constructed
    pub fn from_config(config: Arc<ServerConfig>, database: Arc<Database>) -> Result<Self> {
        let services = &config.external_services;

        let product_catalog = OpenFoodFactsClient::new(OpenFoodFactsConfig {
            base_url: services.product_catalog.base_url.clone(),
            timeout_secs: services.product_catalog.timeout_secs,
            ..OpenFoodFactsConfig::default()
        })?;

        let news_source = NewsApiClient::new(NewsApiConfig {
            api_key: services.news.api_key.clone(),
            base_url: services.news.base_url.clone(),
            ..NewsApiConfig::default()
        })?;

        let llm: Option<Arc<dyn LlmProvider>> = match &services.generative.api_key {
            Some(key) => {
                let mut gemini = GeminiConfig::new(key.clone());
                gemini.model.clone_from(&services.generative.analysis_model);
                let provider = GeminiProvider::new(gemini)?;
                info!(
                    model = %services.generative.analysis_model,
                    "Generative model enabled"
                );
                Some(Arc::new(provider))
            }
            None => {
                warn!("GEMINI_API_KEY not set, AI analysis will use the heuristic fallback");
                None
            }
        };

        Ok(Self::new(
            config,
            database,
            Arc::new(product_catalog),
            Arc::new(news_source),
            llm,
        ))
    }

    /// Calendar used for "today", "this week" and "this month"
    #[must_use]
    pub fn calendar(&self) -> JournalCalendar {
        self.config
            .utc_offset()
            .map_or_else(JournalCalendar::utc, JournalCalendar::new)
    }

    /// Barcode resolution service over the shared database and catalog
    #[must_use]
    pub fn lookup_service(&self) -> ProductLookupService {
        ProductLookupService::new(self.database.clone(), self.product_catalog.clone())
    }

    /// Generative model, if configured
    #[must_use]
    pub fn llm(&self) -> Option<&dyn LlmProvider> {
        self.llm.as_deref()
    }
}
