// SPDX-FileCopyrightText: 2026 Pitstop Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Gateway HTTP server built on axum.
//!
//! Sets up routes, middleware, and shared state for the gateway.

use std::sync::Arc;
use std::time::Instant;

use axum::{
    Router, middleware as axum_middleware,
    routing::{get, patch, post},
};
use pitstop_config::model::GatewayConfig;
use pitstop_core::{PitstopError, StorageAdapter};
use pitstop_survey::SurveyService;
use tokio_util::sync::CancellationToken;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;

use crate::auth::{AuthConfig, auth_middleware};
use crate::handlers;
use crate::webhooks::{self, WebhookAuth};

/// Shared state for axum request handlers.
#[derive(Clone)]
pub struct GatewayState {
    /// Survey workflow the webhooks drive.
    pub service: Arc<SurveyService>,
    /// Bearer auth for the dashboard API.
    pub auth: AuthConfig,
    /// Twilio signature verification settings.
    pub webhook: WebhookAuth,
    /// Process start time for uptime calculation.
    pub start_time: Instant,
}

impl GatewayState {
    pub fn new(service: Arc<SurveyService>, auth: AuthConfig, webhook: WebhookAuth) -> Self {
        Self {
            service,
            auth,
            webhook,
            start_time: Instant::now(),
        }
    }

    pub fn storage(&self) -> &Arc<dyn StorageAdapter> {
        self.service.storage()
    }
}

/// Builds the full router.
///
/// - `GET /health` and the Twilio webhooks are public; webhooks verify
///   `X-Twilio-Signature` themselves.
/// - Everything else under `/api` requires a bearer token.
pub fn build_router(state: GatewayState) -> Router {
    let public_routes = Router::new()
        .route("/health", get(handlers::get_public_health))
        .route(
            "/api/webhooks/twilio/message",
            post(webhooks::post_twilio_message),
        )
        .route(
            "/api/webhooks/twilio/status",
            post(webhooks::post_twilio_status),
        )
        .with_state(state.clone());

    let api_routes = Router::new()
        .route("/api/surveys", get(handlers::list_surveys))
        .route("/api/surveys/stats/summary", get(handlers::get_survey_stats))
        .route(
            "/api/surveys/follow-up-items/{id}",
            patch(handlers::patch_follow_up_item),
        )
        .route("/api/surveys/{id}", get(handlers::get_survey))
        .route(
            "/api/surveys/{id}/callback",
            patch(handlers::patch_survey_callback),
        )
        .route(
            "/api/surveys/{id}/follow-up-items",
            get(handlers::list_follow_up_items),
        )
        .route("/api/customers", post(handlers::post_customer))
        .route("/api/customers/{id}", get(handlers::get_customer))
        .route("/api/services", post(handlers::post_service_visit))
        .route("/api/services/{id}", get(handlers::get_service_visit))
        .route(
            "/api/services/{id}/messages",
            get(handlers::list_service_messages),
        )
        .route("/api/admin/status", get(handlers::get_admin_status))
        .route_layer(axum_middleware::from_fn_with_state(
            state.auth.clone(),
            auth_middleware,
        ))
        .with_state(state);

    Router::new()
        .merge(public_routes)
        .merge(api_routes)
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
}

/// Binds `host:port` and serves until `cancel` fires.
pub async fn start_server(
    config: &GatewayConfig,
    state: GatewayState,
    cancel: CancellationToken,
) -> Result<(), PitstopError> {
    let app = build_router(state);

    let addr = format!("{}:{}", config.host, config.port);
    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .map_err(|e| PitstopError::Channel {
            message: format!("failed to bind gateway to {addr}: {e}"),
            source: Some(Box::new(e)),
        })?;

    tracing::info!("Gateway server listening on {addr}");

    axum::serve(listener, app)
        .with_graceful_shutdown(async move { cancel.cancelled().await })
        .await
        .map_err(|e| PitstopError::Channel {
            message: format!("gateway server error: {e}"),
            source: Some(Box::new(e)),
        })?;

    tracing::info!("Gateway server stopped");
    Ok(())
}
