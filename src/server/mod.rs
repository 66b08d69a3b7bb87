// ABOUTME: HTTP server assembly for the ScanBar API
// ABOUTME: Merges every route set, applies the tower-http middleware stack and serves with graceful shutdown
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Pierre Fitness Intelligence

//! # Server
//!
//! [`build_router`] produces the complete application so integration tests
//! can drive it with `tower::ServiceExt::oneshot`, and [`run`] binds it to a
//! socket.

mod resources;

pub use resources::ServerResources;

#[cfg(not(unix))]
use std::future;
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use anyhow::{anyhow, Result};
use axum::extract::DefaultBodyLimit;
use axum::http::HeaderName;
use axum::Router;
use tokio::net::TcpListener;
use tokio::signal;
#[cfg(unix)]
use tokio::signal::unix::{signal as unix_signal, SignalKind};
use tower_http::limit::RequestBodyLimitLayer;
use tower_http::request_id::{MakeRequestUuid, PropagateRequestIdLayer, SetRequestIdLayer};
use tower_http::timeout::TimeoutLayer;
use tower_http::trace::TraceLayer;
use tracing::{info, warn};

use crate::middleware::{create_request_span, setup_cors, REQUEST_ID_HEADER};
use crate::routes::{
    AdminRoutes, AiRoutes, ArticleRoutes, ChatbotRoutes, FavoriteRoutes, FoodRoutes,
    HealthRoutes, ProductRoutes, UserRoutes,
};

/// Build the application router with all routes and middleware
pub fn build_router(resources: Arc<ServerResources>) -> Router {
    let http = &resources.config.http;
    let request_id = HeaderName::from_static(REQUEST_ID_HEADER);

    Router::new()
        .merge(HealthRoutes::routes())
        .merge(UserRoutes::routes(resources.clone()))
        .merge(FoodRoutes::routes(resources.clone()))
        .merge(ProductRoutes::routes(resources.clone()))
        .merge(FavoriteRoutes::routes(resources.clone()))
        .merge(AdminRoutes::routes(resources.clone()))
        .merge(AiRoutes::routes(resources.clone()))
        .merge(ChatbotRoutes::routes(resources.clone()))
        .merge(ArticleRoutes::routes(resources.clone()))
        .layer(DefaultBodyLimit::max(http.max_body_bytes))
        .layer(RequestBodyLimitLayer::new(http.max_body_bytes))
        .layer(TimeoutLayer::new(Duration::from_secs(
            http.request_timeout_secs,
        )))
        .layer(PropagateRequestIdLayer::new(request_id.clone()))
        .layer(TraceLayer::new_for_http().make_span_with(create_request_span))
        .layer(SetRequestIdLayer::new(request_id, MakeRequestUuid))
        .layer(setup_cors(http))
}

/// Serve the application until Ctrl-C or SIGTERM
///
/// # Errors
///
/// Returns an error if the address cannot be bound or the server fails
pub async fn run(resources: Arc<ServerResources>, addr: SocketAddr) -> Result<()> {
    let app = build_router(resources);

    let listener = TcpListener::bind(addr)
        .await
        .map_err(|e| anyhow!("Failed to bind HTTP listener on {addr}: {e}"))?;
    info!("HTTP server listening on http://{addr}");

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .map_err(|e| anyhow!("HTTP server error: {e}"))?;

    info!("HTTP server stopped");
    Ok(())
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = signal::ctrl_c().await {
            warn!("Failed to listen for Ctrl-C: {e}");
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match unix_signal(SignalKind::terminate()) {
            Ok(mut stream) => {
                stream.recv().await;
            }
            Err(e) => warn!("Failed to install SIGTERM handler: {e}"),
        }
    };

    #[cfg(not(unix))]
    let terminate = future::pending::<()>();

    tokio::select! {
        () = ctrl_c => info!("Received Ctrl-C, shutting down gracefully"),
        () = terminate => info!("Received SIGTERM, shutting down gracefully"),
    }
}
