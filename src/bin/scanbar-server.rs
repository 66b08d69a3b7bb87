// ABOUTME: ScanBar API server binary
// ABOUTME: Loads configuration, opens the database, wires external clients and serves the HTTP API
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Pierre Fitness Intelligence

//! # ScanBar Server Binary
//!
//! Starts the nutrition tracking API with the `SQLite` store, Open Food Facts,
//! NewsAPI and (when a key is configured) Gemini.

use std::fs;
use std::net::{IpAddr, SocketAddr};
use std::sync::Arc;

use anyhow::{anyhow, Result};
use clap::Parser;
use scanbar_server::{
    config::{DatabaseUrl, ServerConfig},
    database::Database,
    logging,
    models::UserRole,
    server::{self, ServerResources},
};
use tracing::{error, info, warn};

#[derive(Parser)]
#[command(name = "scanbar-server")]
#[command(about = "ScanBar API - barcode scanning, food journal and nutrition analysis")]
pub struct Args {
    /// Override HTTP port
    #[arg(long)]
    http_port: Option<u16>,

    /// Override database URL
    #[arg(long)]
    database_url: Option<String>,

    /// Give the admin role to the account with this email before serving
    #[arg(long)]
    promote_admin: Option<String>,
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    let mut config = ServerConfig::from_env()?;
    if let Some(http_port) = args.http_port {
        config.http_port = http_port;
    }
    if let Some(url) = args.database_url.as_deref() {
        config.database_url = DatabaseUrl::parse_url(url)?;
    }

    logging::init_from_env()?;

    info!("Starting ScanBar API");
    info!("{}", config.summary());

    if let DatabaseUrl::SQLite { path } = &config.database_url {
        if let Some(dir) = path.parent().filter(|dir| !dir.as_os_str().is_empty()) {
            fs::create_dir_all(dir)
                .map_err(|e| anyhow!("Failed to create database directory {}: {e}", dir.display()))?;
        }
    }

    let database = Database::new(&config.database_url.to_connection_string()).await?;
    info!("Database initialized: {}", config.database_url);

    if let Some(email) = args.promote_admin.as_deref() {
        promote_admin(&database, email).await?;
    }

    let config = Arc::new(config);
    let resources = Arc::new(ServerResources::from_config(
        config.clone(),
        Arc::new(database),
    )?);

    let host: IpAddr = config
        .host
        .parse()
        .map_err(|e| anyhow!("Invalid HOST {}: {e}", config.host))?;
    let addr = SocketAddr::new(host, config.http_port);

    display_available_endpoints(&config);

    if let Err(e) = server::run(resources, addr).await {
        error!("Server error: {e:#}");
        return Err(e);
    }

    Ok(())
}

async fn promote_admin(database: &Database, email: &str) -> Result<()> {
    let Some(user) = database.get_user_by_email(email).await? else {
        warn!("Cannot promote {email}: no such user");
        return Ok(());
    };

    database.set_user_role(user.id, UserRole::Admin).await?;
    info!(user_id = %user.id, "Promoted {email} to admin");
    Ok(())
}

/// Log every endpoint so operators can see what the server exposes
fn display_available_endpoints(config: &ServerConfig) {
    let base = format!("http://{}:{}", config.host, config.http_port);

    info!("=== Available API Endpoints ===");
    display_user_endpoints(&base);
    display_food_endpoints(&base);
    display_product_endpoints(&base);
    display_admin_endpoints(&base);
    display_assistant_endpoints(&base);
    info!("=== End of Endpoint List ===");
}

#[allow(clippy::cognitive_complexity)]
fn display_user_endpoints(base: &str) {
    info!("Accounts:");
    info!("   Register:          POST {base}/api/users/register");
    info!("   Verify Email:      GET  {base}/api/users/verifyemail/{{token}}");
    info!("   Login:             POST {base}/api/users/login");
    info!("   Forgot Password:   POST {base}/api/users/forgotpassword");
    info!("   Reset Password:    PUT  {base}/api/users/resetpassword/{{token}}");
    info!("   Profile:           GET|PUT {base}/api/users/profile");
    info!("   Goals:             PUT  {base}/api/users/goals");
}

#[allow(clippy::cognitive_complexity)]
fn display_food_endpoints(base: &str) {
    info!("Food Journal:");
    info!("   Entries:           GET|POST {base}/api/foods");
    info!("   Delete Entry:      DELETE {base}/api/foods/{{id}}");
    info!("   Summary:           GET  {base}/api/foods/summary");
    info!("   Analyze:           POST {base}/api/foods/analyze");
    info!("   Daily Analysis:    GET  {base}/api/foods/daily-analysis");
    info!("   Barcode (v2):      GET  {base}/api/foods/barcode/{{barcode}}");
}

#[allow(clippy::cognitive_complexity)]
fn display_product_endpoints(base: &str) {
    info!("Products & Favorites:");
    info!("   Lookup:            GET  {base}/api/products/{{code}}");
    info!("   Add (admin):       POST {base}/api/products");
    info!("   Favorites:         GET|POST {base}/api/favorites");
    info!("   Favorite Check:    GET  {base}/api/favorites/check/{{code}}");
}

#[allow(clippy::cognitive_complexity)]
fn display_admin_endpoints(base: &str) {
    info!("Admin:");
    info!("   Product Requests:  GET  {base}/api/admin/product-requests");
    info!("   Stats:             GET  {base}/api/admin/stats");
    info!("   Users:             GET  {base}/api/admin/users");
    info!("   Trash:             GET  {base}/api/admin/users/trash");
}

#[allow(clippy::cognitive_complexity)]
fn display_assistant_endpoints(base: &str) {
    info!("AI & Content:");
    info!("   Photo Analysis:    POST {base}/api/ai/analyze-image");
    info!("   Chatbot:           POST {base}/api/chatbot/chat");
    info!("   Health Articles:   GET  {base}/api/articles/health");
    info!("   Health Check:      GET  {base}/health");
}
