// ABOUTME: Shared test utilities and setup functions for integration tests
// ABOUTME: Provides database, server resource, user and token helpers
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Pierre Fitness Intelligence
#![allow(
    dead_code,
    clippy::missing_errors_doc,
    clippy::missing_panics_doc,
    clippy::must_use_candidate
)]
//! Shared test utilities for `scanbar_server`
//!
//! Every test gets its own in-memory database and mock upstream services, so
//! tests never touch the network.

use std::env;
use std::sync::{Arc, Once};

use anyhow::Result;
use axum::Router;
use scanbar_server::{
    config::ServerConfig,
    database::Database,
    external::{MockNewsSource, MockProductCatalog, NewsSource, ProductCatalog},
    llm::LlmProvider,
    models::{User, UserRole},
    server::{build_router, ServerResources},
};
use tracing::Level;

static INIT_LOGGER: Once = Once::new();

/// Secret used to sign session tokens in tests
pub const TEST_JWT_SECRET: &str = "scanbar-test-secret-with-enough-entropy";

/// Placeholder hash for users that never log in with a password
const UNUSED_PASSWORD_HASH: &str = "not-a-bcrypt-hash";

/// Initialize quiet logging for tests (call once per test process)
pub fn init_test_logging() {
    INIT_LOGGER.call_once(|| {
        let log_level = match env::var("TEST_LOG").as_deref() {
            Ok("TRACE") => Level::TRACE,
            Ok("DEBUG") => Level::DEBUG,
            Ok("INFO") => Level::INFO,
            _ => Level::WARN,
        };

        tracing_subscriber::fmt()
            .with_max_level(log_level)
            .with_test_writer()
            .init();
    });
}

/// Standard test database setup
pub async fn create_test_database() -> Result<Arc<Database>> {
    init_test_logging();
    Ok(Arc::new(Database::new("sqlite::memory:").await?))
}

/// Default configuration with a fixed signing secret
pub fn test_config() -> ServerConfig {
    let mut config = ServerConfig::default();
    config.auth.jwt_secret = TEST_JWT_SECRET.to_owned();
    config
}

/// Server resources over a fresh database and the given upstream doubles
pub async fn create_test_resources(
    catalog: Arc<dyn ProductCatalog>,
    news: Arc<dyn NewsSource>,
    llm: Option<Arc<dyn LlmProvider>>,
) -> Result<Arc<ServerResources>> {
    let database = create_test_database().await?;
    Ok(Arc::new(ServerResources::new(
        Arc::new(test_config()),
        database,
        catalog,
        news,
        llm,
    )))
}

/// Server resources with an empty catalog, no news and no generative model
pub async fn create_default_resources() -> Result<Arc<ServerResources>> {
    create_test_resources(
        Arc::new(MockProductCatalog::new()),
        Arc::new(MockNewsSource::new()),
        None,
    )
    .await
}

/// Full application router, middleware included
pub fn create_test_router(resources: &Arc<ServerResources>) -> Router {
    build_router(resources.clone())
}

/// `Authorization` header value for a user
pub fn bearer_for(resources: &ServerResources, user: &User) -> Result<String> {
    let token = resources.auth_manager.generate_token(user)?;
    Ok(format!("Bearer {token}"))
}

/// Create a verified regular user and return it with its bearer header
pub async fn create_verified_user(
    resources: &ServerResources,
    email: &str,
) -> Result<(User, String)> {
    let name = email.split('@').next().unwrap_or(email).to_owned();
    let mut user = User::new(name, email.to_owned(), UNUSED_PASSWORD_HASH.to_owned());
    user.is_verified = true;
    resources.database.create_user(&user).await?;

    let bearer = bearer_for(resources, &user)?;
    Ok((user, bearer))
}

/// Create a verified administrator and return it with its bearer header
pub async fn create_admin_user(resources: &ServerResources, email: &str) -> Result<(User, String)> {
    let (mut user, _) = create_verified_user(resources, email).await?;
    resources.database.set_user_role(user.id, UserRole::Admin).await?;
    user.role = UserRole::Admin;

    let bearer = bearer_for(resources, &user)?;
    Ok((user, bearer))
}
