// SPDX-FileCopyrightText: 2026 Wicket Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Gateway HTTP server built on axum.
//!
//! Sets up routes, middleware, and shared state for the gateway.

use std::sync::Arc;

use axum::{
    Router, middleware as axum_middleware,
    routing::{get, post, put},
};
use tokio_util::sync::CancellationToken;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;

use wicket_core::WicketError;
use wicket_queue::QueueCoordinator;

use crate::auth::{AuthConfig, auth_middleware};
use crate::handlers;

/// Health state for unauthenticated health/metrics endpoints.
#[derive(Clone)]
pub struct HealthState {
    /// Process start time for uptime calculation.
    pub start_time: std::time::Instant,
    /// Optional Prometheus metrics render function.
    pub prometheus_render: Option<Arc<dyn Fn() -> String + Send + Sync>>,
}

/// Shared state for axum request handlers.
#[derive(Clone)]
pub struct GatewayState {
    pub coordinator: Arc<QueueCoordinator>,
    pub auth: AuthConfig,
    pub health: HealthState,
}

/// Gateway server configuration (mirrors GatewayConfig from wicket-config).
#[derive(Debug, Clone)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
}

/// Builds the full route table.
///
/// - GET /health, GET /metrics (public)
/// - /api/tickets/* (public)
/// - /api/admin/* (bearer token)
pub fn router(state: GatewayState) -> Router {
    let public_routes = Router::new()
        .route("/health", get(handlers::get_public_health))
        .route("/metrics", get(handlers::get_public_metrics))
        .route("/api/tickets", post(handlers::post_ticket))
        .route(
            "/api/tickets/{number}/position",
            get(handlers::get_position),
        )
        .route(
            "/api/tickets/reference/{code}",
            get(handlers::get_by_reference),
        )
        .with_state(state.clone());

    let admin_routes = Router::new()
        .route("/api/admin/dashboard", get(handlers::get_dashboard))
        .route(
            "/api/admin/tickets/{id}/complete",
            post(handlers::complete_ticket),
        )
        .route(
            "/api/admin/tickets/{id}/cancel",
            post(handlers::cancel_ticket),
        )
        .route(
            "/api/admin/tickets/{id}/no-show",
            post(handlers::no_show_ticket),
        )
        .route("/api/admin/advisors", get(handlers::list_advisors))
        .route(
            "/api/admin/advisors/{id}/status",
            put(handlers::put_advisor_status),
        )
        .route_layer(axum_middleware::from_fn_with_state(
            state.auth.clone(),
            auth_middleware,
        ))
        .with_state(state);

    Router::new()
        .merge(public_routes)
        .merge(admin_routes)
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
}

/// Serves the API until `cancel` fires, then drains in-flight requests.
pub async fn start_server(
    config: &ServerConfig,
    state: GatewayState,
    cancel: CancellationToken,
) -> Result<(), WicketError> {
    let app = router(state);

    let addr = format!("{}:{}", config.host, config.port);
    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .map_err(|e| WicketError::Internal(format!("failed to bind gateway to {addr}: {e}")))?;

    tracing::info!("gateway listening on {addr}");

    axum::serve(listener, app)
        .with_graceful_shutdown(async move { cancel.cancelled().await })
        .await
        .map_err(|e| WicketError::Internal(format!("gateway server error: {e}")))?;

    tracing::info!("gateway stopped");
    Ok(())
}
