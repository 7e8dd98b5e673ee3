//! Async AMQP publisher for the relay topic.
//!
//! This module provides a connection-managed publisher that can be shared
//! across async tasks, plus the [`RelayPublisher`] trait the web handlers
//! consume so tests can substitute a double.

use std::sync::Arc;

use anyhow::{Context, Result};
use async_trait::async_trait;
use lapin::{
    options::{BasicPublishOptions, QueueDeclareOptions},
    types::FieldTable,
    BasicProperties, Channel, Connection, ConnectionProperties,
};
use tokio::sync::RwLock;
use tracing::{info, warn};

use super::types::{Envelope, RelayMessage};
use crate::error::RelayError;

/// Publishing seam for relay messages.
///
/// The web handlers depend on this trait rather than on the broker client
/// directly.
#[async_trait]
pub trait RelayPublisher: Send + Sync {
    /// Publish one relay message to the topic.
    async fn publish(&self, message: &RelayMessage) -> Result<(), RelayError>;
}

/// Async AMQP publisher with connection management.
///
/// The publisher maintains a persistent connection and channel to the
/// broker, reconnecting on failure.
#[derive(Clone)]
pub struct Publisher {
    inner: Arc<PublisherInner>,
}

struct PublisherInner {
    url: String,
    topic: String,
    connection: RwLock<Option<Connection>>,
    channel: RwLock<Option<Channel>>,
}

impl Publisher {
    /// Create a new publisher for the given broker URL and topic.
    pub fn new(url: String, topic: String) -> Self {
        Self {
            inner: Arc::new(PublisherInner {
                url,
                topic,
                connection: RwLock::new(None),
                channel: RwLock::new(None),
            }),
        }
    }

    /// Ensure we have a valid connection and channel.
    async fn ensure_connected(&self) -> Result<Channel> {
        // Check if we have a valid channel
        {
            let channel = self.inner.channel.read().await;
            if let Some(ch) = channel.as_ref() {
                if ch.status().connected() {
                    return Ok(ch.clone());
                }
            }
        }

        // Need to reconnect
        let mut connection = self.inner.connection.write().await;
        let mut channel = self.inner.channel.write().await;

        // Double-check after acquiring write lock
        if let Some(ch) = channel.as_ref() {
            if ch.status().connected() {
                return Ok(ch.clone());
            }
        }

        info!("amqp_publisher_connecting");

        // Create new connection
        let conn = Connection::connect(&self.inner.url, ConnectionProperties::default())
            .await
            .context("Failed to connect to broker")?;

        info!("amqp_publisher_connected");

        // Create new channel
        let ch = conn
            .create_channel()
            .await
            .context("Failed to create channel")?;

        // Declare the topic queue (idempotent operation)
        ch.queue_declare(
            &self.inner.topic,
            QueueDeclareOptions {
                durable: true,
                ..Default::default()
            },
            FieldTable::default(),
        )
        .await
        .context("Failed to declare topic queue")?;

        info!(topic = %self.inner.topic, "amqp_topic_declared");

        *connection = Some(conn);
        *channel = Some(ch.clone());

        Ok(ch)
    }

    async fn publish_inner(&self, message: &RelayMessage) -> Result<()> {
        let channel = self.ensure_connected().await?;

        let message_json =
            serde_json::to_string(message).context("Failed to serialize relay message")?;
        let envelope = Envelope::single(message_json);
        let body = serde_json::to_vec(&envelope).context("Failed to serialize envelope")?;

        channel
            .basic_publish(
                "",
                &self.inner.topic,
                BasicPublishOptions::default(),
                &body,
                BasicProperties::default()
                    .with_delivery_mode(2) // Persistent
                    .with_content_type("application/json".into())
                    .with_message_id(message.recipient_id.clone().into()),
            )
            .await
            .context("Failed to publish to topic")?
            .await
            .context("Failed to confirm publish")?;

        info!(
            topic = %self.inner.topic,
            recipient = %message.recipient_id,
            body_length = body.len(),
            "relay_message_published"
        );

        Ok(())
    }

    /// Close the connection gracefully.
    pub async fn close(&self) {
        let mut connection = self.inner.connection.write().await;
        let mut channel = self.inner.channel.write().await;

        if let Some(ch) = channel.take() {
            if let Err(e) = ch.close(200, "Normal shutdown").await {
                warn!(error = %e, "amqp_channel_close_error");
            }
        }

        if let Some(conn) = connection.take() {
            if let Err(e) = conn.close(200, "Normal shutdown").await {
                warn!(error = %e, "amqp_connection_close_error");
            }
        }

        info!("amqp_publisher_closed");
    }
}

#[async_trait]
impl RelayPublisher for Publisher {
    async fn publish(&self, message: &RelayMessage) -> Result<(), RelayError> {
        self.publish_inner(message)
            .await
            .map_err(|e| RelayError::Publish(e.into()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_publisher_creation() {
        let publisher = Publisher::new(
            "amqp://localhost:5672".to_string(),
            "messenger_relay".to_string(),
        );
        // Just verify it can be created
        assert!(Arc::strong_count(&publisher.inner) == 1);
    }
}
