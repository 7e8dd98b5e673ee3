//! Topic consumer module using lapin.
//!
//! This module handles connecting to the broker, consuming delivery
//! envelopes from the relay topic, and spawning an async task per
//! delivery. Each delivery is classified before handling; anything that
//! is not a pub/sub envelope is rejected without requeue. Failed
//! deliveries are not retried.

use std::sync::Arc;

use anyhow::{Context, Result};
use futures::StreamExt;
use lapin::{
    options::{BasicAckOptions, BasicConsumeOptions, BasicNackOptions, BasicQosOptions, QueueDeclareOptions},
    types::FieldTable,
    Connection, ConnectionProperties,
};
use tokio::signal;
use tracing::{error, info, warn};

use relay::{classify, pubsub, Config, SendClient, TriggerEvent};

/// Run the topic consumer.
///
/// This function:
/// 1. Connects to the broker using the configured URL
/// 2. Sets up QoS prefetch for concurrent processing
/// 3. Declares the topic queue (idempotent operation)
/// 4. Starts consuming deliveries, spawning a task for each
/// 5. Handles graceful shutdown on SIGINT/SIGTERM
pub async fn run(config: Config) -> Result<()> {
    let config = Arc::new(config);

    // Connect to the broker
    info!(url_length = config.amqp_url.len(), "amqp_connecting");

    let conn = Connection::connect(
        &config.amqp_url,
        ConnectionProperties::default(),
    )
    .await
    .context("Failed to connect to broker")?;

    info!("amqp_connected");

    // Create a channel
    let channel = conn.create_channel().await.context("Failed to create channel")?;

    info!("amqp_channel_created");

    // Set QoS prefetch for concurrent processing
    let prefetch_count = config.worker_concurrency as u16;
    channel
        .basic_qos(prefetch_count, BasicQosOptions::default())
        .await
        .context("Failed to set QoS")?;

    info!(prefetch_count = prefetch_count, "amqp_qos_set");

    // Declare the topic queue (durable to match the publisher)
    channel
        .queue_declare(
            &config.topic,
            QueueDeclareOptions {
                durable: true,
                ..Default::default()
            },
            FieldTable::default(),
        )
        .await
        .context("Failed to declare topic queue")?;

    info!(topic = %config.topic, "amqp_topic_declared");

    // Create a shared send API client
    let sender = Arc::new(SendClient::new(&config).context("Failed to create send client")?);

    // Start consuming deliveries
    let mut consumer = channel
        .basic_consume(
            &config.topic,
            "relay-worker",
            BasicConsumeOptions::default(),
            FieldTable::default(),
        )
        .await
        .context("Failed to start consumer")?;

    info!(topic = %config.topic, "amqp_consumer_started");
    info!("worker_ready");

    // Clone channel for use in delivery handlers
    let channel = Arc::new(channel);

    // Create shutdown signal future
    let shutdown = async {
        let ctrl_c = async {
            signal::ctrl_c()
                .await
                .expect("Failed to install Ctrl+C handler");
        };

        #[cfg(unix)]
        let terminate = async {
            signal::unix::signal(signal::unix::SignalKind::terminate())
                .expect("Failed to install SIGTERM handler")
                .recv()
                .await;
        };

        #[cfg(not(unix))]
        let terminate = std::future::pending::<()>();

        tokio::select! {
            _ = ctrl_c => info!("Received SIGINT"),
            _ = terminate => info!("Received SIGTERM"),
        }
    };

    // Pin the shutdown future
    tokio::pin!(shutdown);

    // Process deliveries until shutdown
    loop {
        tokio::select! {
            // Check for shutdown signal
            _ = &mut shutdown => {
                info!("worker_stopping");
                break;
            }
            // Process next delivery
            delivery = consumer.next() => {
                match delivery {
                    Some(Ok(delivery)) => {
                        let delivery_tag = delivery.delivery_tag;
                        let message_id = delivery
                            .properties
                            .message_id()
                            .as_ref()
                            .map(|s| s.to_string())
                            .unwrap_or_else(|| "unknown".to_string());

                        info!(
                            topic = %config.topic,
                            message_id = %message_id,
                            delivery_tag = delivery_tag,
                            "amqp_delivery_received"
                        );

                        // Clone resources for the spawned task
                        let sender = Arc::clone(&sender);
                        let channel = Arc::clone(&channel);

                        // Spawn a task to handle this delivery
                        tokio::spawn(async move {
                            let outcome = match classify(&delivery.data) {
                                TriggerEvent::PubSub(envelope) => {
                                    pubsub::handle_envelope(&sender, &envelope).await
                                }
                                TriggerEvent::Webhook { method } => {
                                    Err(relay::RelayError::Validation(format!(
                                        "webhook trigger ({method}) is not deliverable via the topic"
                                    )))
                                }
                                TriggerEvent::Unrecognized => Err(relay::RelayError::Validation(
                                    "unclassifiable delivery payload".to_string(),
                                )),
                            };

                            match outcome {
                                Ok(()) => {
                                    if let Err(e) = channel
                                        .basic_ack(delivery_tag, BasicAckOptions::default())
                                        .await
                                    {
                                        error!(
                                            delivery_tag = delivery_tag,
                                            error = %e,
                                            "amqp_ack_failed"
                                        );
                                    } else {
                                        info!(
                                            message_id = %message_id,
                                            "relay_reply_delivered"
                                        );
                                    }
                                }
                                Err(e) => {
                                    error!(
                                        message_id = %message_id,
                                        error = %e,
                                        "relay_reply_failed"
                                    );

                                    // No retry policy: reject without requeue
                                    if let Err(nack_err) = channel
                                        .basic_nack(
                                            delivery_tag,
                                            BasicNackOptions {
                                                requeue: false,
                                                ..Default::default()
                                            },
                                        )
                                        .await
                                    {
                                        error!(
                                            delivery_tag = delivery_tag,
                                            error = %nack_err,
                                            "amqp_nack_failed"
                                        );
                                    }
                                }
                            }
                        });
                    }
                    Some(Err(e)) => {
                        error!(error = %e, "amqp_delivery_error");
                    }
                    None => {
                        warn!("amqp_consumer_closed");
                        break;
                    }
                }
            }
        }
    }

    info!("worker_shutdown_complete");
    Ok(())
}
