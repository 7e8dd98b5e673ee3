//! Webhook endpoint handlers.
//!
//! Two operations share the `/webhook` route, dispatched by HTTP method:
//! - GET: the platform's verification handshake. Stateless, no side
//!   effects beyond the response.
//! - POST: event ingestion. Every messaging event is published to the
//!   relay topic; the first publish failure aborts the rest of the batch.
//!
//! The router answers 405 for any other method on the route.

use std::sync::Arc;

use axum::{
    body::Bytes,
    extract::{Query, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::{Deserialize, Serialize};
use tracing::{error, info, warn};

use crate::config::Config;
use crate::messenger::Event;
use crate::queue::{RelayMessage, RelayPublisher};

/// Shared application state.
#[derive(Clone)]
pub struct AppState {
    pub config: Arc<Config>,
    pub publisher: Arc<dyn RelayPublisher>,
}

impl AppState {
    pub fn new(config: Config, publisher: Arc<dyn RelayPublisher>) -> Self {
        Self {
            config: Arc::new(config),
            publisher,
        }
    }
}

// =============================================================================
// Health Check
// =============================================================================

/// Health check response.
#[derive(Serialize)]
pub struct HealthResponse {
    pub status: &'static str,
}

/// Health check endpoint.
pub async fn health() -> Json<HealthResponse> {
    Json(HealthResponse { status: "ok" })
}

// =============================================================================
// Verification Handshake
// =============================================================================

/// Query parameters of the verification handshake.
///
/// Reference: https://developers.facebook.com/docs/messenger-platform/webhooks#verification-requests
#[derive(Debug, Default, Deserialize)]
pub struct VerifyParams {
    #[serde(default, rename = "hub.mode")]
    pub mode: String,
    #[serde(default, rename = "hub.verify_token")]
    pub verify_token: String,
    #[serde(default, rename = "hub.challenge")]
    pub challenge: String,
}

/// Verification handshake endpoint.
///
/// A token mismatch answers 403 regardless of mode; an unconfigured
/// verify token refuses every attempt. A matching token echoes the
/// challenge verbatim for mode `subscribe` and answers 400 otherwise.
pub async fn verify_webhook(
    State(state): State<AppState>,
    Query(params): Query<VerifyParams>,
) -> Response {
    let expected = state.config.verify_token.as_deref();

    if expected.is_none() || expected != Some(params.verify_token.as_str()) {
        warn!(mode = %params.mode, "webhook_verify_token_mismatch");
        return StatusCode::FORBIDDEN.into_response();
    }

    if params.mode == "subscribe" {
        info!("webhook_verified");
        (StatusCode::OK, params.challenge).into_response()
    } else {
        warn!(mode = %params.mode, "webhook_verify_unsupported_mode");
        StatusCode::BAD_REQUEST.into_response()
    }
}

// =============================================================================
// Event Ingestion
// =============================================================================

/// Webhook response for the ingestion endpoint.
#[derive(Serialize)]
pub struct WebhookResponse {
    pub status: &'static str,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub relayed: Option<usize>,
}

impl WebhookResponse {
    fn error() -> Self {
        Self {
            status: "error",
            relayed: None,
        }
    }
}

/// Event ingestion endpoint.
///
/// Messaging events are visited in array order and published one at a
/// time; duplicates are not suppressed. A publish failure answers 500
/// immediately - earlier publishes in the same batch stand.
pub async fn ingest_webhook(State(state): State<AppState>, body: Bytes) -> Response {
    let event: Event = match serde_json::from_slice(&body) {
        Ok(event) => event,
        Err(e) => {
            error!(error = %e, "webhook_event_parse_failed");
            return (StatusCode::BAD_REQUEST, Json(WebhookResponse::error())).into_response();
        }
    };

    if event.object != "page" {
        warn!(object = %event.object, "webhook_object_unsupported");
        return (StatusCode::BAD_REQUEST, Json(WebhookResponse::error())).into_response();
    }

    let mut relayed = 0usize;

    for entry in &event.entry {
        for messaging in &entry.messaging {
            info!(
                entry = %entry.id,
                sender = %messaging.sender.id,
                "webhook_message_received"
            );

            let message = RelayMessage {
                recipient_id: messaging.sender.id.clone(),
                body: messaging.text().to_string(),
            };

            if let Err(e) = state.publisher.publish(&message).await {
                error!(
                    error = %e,
                    recipient = %message.recipient_id,
                    "relay_publish_failed"
                );
                return (e.status(), Json(WebhookResponse::error())).into_response();
            }

            relayed += 1;
        }
    }

    info!(relayed = relayed, "webhook_batch_relayed");

    (
        StatusCode::OK,
        Json(WebhookResponse {
            status: "relayed",
            relayed: Some(relayed),
        }),
    )
        .into_response()
}
