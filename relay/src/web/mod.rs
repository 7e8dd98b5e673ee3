//! Web server module for the Messenger webhook.
//!
//! This module provides the webhook surface of the relay:
//! - Answers the platform's one-time verification handshake (GET)
//! - Ingests event notifications and publishes each message to the relay
//!   topic (POST)
//! - Exposes a health check

pub mod handlers;

pub use handlers::{health, ingest_webhook, verify_webhook, AppState, HealthResponse, WebhookResponse};
