//! Outbound send API client.
//!
//! Reference: https://developers.facebook.com/docs/messenger-platform/reference/send-api

use std::time::Duration;

use reqwest::{Client, StatusCode};
use serde::Serialize;
use tracing::{error, info};
use url::Url;

use crate::config::Config;
use crate::error::RelayError;

/// Messaging type sent with every outbound message.
pub const MESSAGING_TYPE: &str = "RESPONSE";

/// Message payload, serialized to JSON as its own form field.
#[derive(Debug, Serialize)]
struct OutboundMessage {
    text: String,
}

/// Recipient payload, serialized to JSON as its own form field.
#[derive(Debug, Serialize)]
struct OutboundRecipient {
    id: String,
}

/// Client for the Graph send API.
///
/// Holds a shared HTTP client plus the page credentials; the credentials
/// are validated at send time so the web binary can run without them.
#[derive(Debug)]
pub struct SendClient {
    client: Client,
    base: Url,
    page_id: Option<String>,
    access_token: Option<String>,
}

impl SendClient {
    /// Build a send client from the application configuration.
    pub fn new(config: &Config) -> Result<Self, RelayError> {
        let base = Url::parse(&config.graph_api_base)
            .map_err(|_| RelayError::Configuration("GRAPH_API_BASE"))?;

        let client = Client::builder()
            .timeout(Duration::from_millis(config.request_timeout_ms))
            .build()?;

        Ok(Self {
            client,
            base,
            page_id: config.page_id.clone(),
            access_token: config.page_access_token.clone(),
        })
    }

    /// Send one text message to a chat user.
    ///
    /// Fails with [`RelayError::Configuration`] before any HTTP activity
    /// when the page credentials are absent.
    pub async fn send(&self, recipient_id: &str, text: &str) -> Result<(), RelayError> {
        let page_id = self
            .page_id
            .as_deref()
            .ok_or(RelayError::Configuration("PAGE_ID"))?;
        let access_token = self
            .access_token
            .as_deref()
            .ok_or(RelayError::Configuration("PAGE_ACCESS_TOKEN"))?;

        let message = serde_json::to_string(&OutboundMessage {
            text: text.to_string(),
        })?;
        let recipient = serde_json::to_string(&OutboundRecipient {
            id: recipient_id.to_string(),
        })?;

        let url = send_endpoint(&self.base, page_id)?;

        let form = [
            ("access_token", access_token),
            ("message", message.as_str()),
            ("messaging_type", MESSAGING_TYPE),
            ("recipient", recipient.as_str()),
        ];

        let response = self.client.post(url).form(&form).send().await?;

        let status = response.status();
        if status != StatusCode::OK {
            let body = response.text().await.unwrap_or_default();
            error!(status = %status, body = %body, "messenger_send_rejected");
            return Err(RelayError::Send {
                status: status.as_u16(),
                body,
            });
        }

        info!(recipient = %recipient_id, "messenger_message_sent");
        Ok(())
    }
}

/// Build `<base>/<page-id>/messages` regardless of a trailing slash on the
/// configured base.
fn send_endpoint(base: &Url, page_id: &str) -> Result<Url, RelayError> {
    let mut url = base.clone();
    url.path_segments_mut()
        .map_err(|_| RelayError::Configuration("GRAPH_API_BASE"))?
        .pop_if_empty()
        .extend([page_id, "messages"]);
    Ok(url)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn config_without_credentials() -> Config {
        Config {
            amqp_url: "amqp://localhost:5672".to_string(),
            topic: "messenger_relay".to_string(),
            verify_token: None,
            page_id: None,
            page_access_token: None,
            graph_api_base: "https://graph.facebook.com/v15.0".to_string(),
            port: 8080,
            request_timeout_ms: 8000,
            worker_concurrency: 16,
        }
    }

    #[tokio::test]
    async fn test_send_requires_page_id() {
        let client = SendClient::new(&config_without_credentials()).unwrap();

        let err = client.send("U1", "hello").await.unwrap_err();
        assert!(matches!(err, RelayError::Configuration("PAGE_ID")));
    }

    #[tokio::test]
    async fn test_send_requires_access_token() {
        let mut config = config_without_credentials();
        config.page_id = Some("P1".to_string());
        let client = SendClient::new(&config).unwrap();

        let err = client.send("U1", "hello").await.unwrap_err();
        assert!(matches!(err, RelayError::Configuration("PAGE_ACCESS_TOKEN")));
    }

    #[test]
    fn test_send_endpoint_path() {
        let base = Url::parse("https://graph.facebook.com/v15.0").unwrap();
        let url = send_endpoint(&base, "12345").unwrap();
        assert_eq!(
            url.as_str(),
            "https://graph.facebook.com/v15.0/12345/messages"
        );
    }

    #[test]
    fn test_send_endpoint_trailing_slash() {
        let base = Url::parse("https://graph.facebook.com/v15.0/").unwrap();
        let url = send_endpoint(&base, "12345").unwrap();
        assert_eq!(
            url.as_str(),
            "https://graph.facebook.com/v15.0/12345/messages"
        );
    }

    #[test]
    fn test_form_field_payloads() {
        let message = serde_json::to_string(&OutboundMessage {
            text: "hi".to_string(),
        })
        .unwrap();
        assert_eq!(message, r#"{"text":"hi"}"#);

        let recipient = serde_json::to_string(&OutboundRecipient {
            id: "U1".to_string(),
        })
        .unwrap();
        assert_eq!(recipient, r#"{"id":"U1"}"#);
    }

    #[test]
    fn test_invalid_base_url_is_a_configuration_error() {
        let mut config = config_without_credentials();
        config.graph_api_base = "not a url".to_string();

        let err = SendClient::new(&config).unwrap_err();
        assert!(matches!(err, RelayError::Configuration("GRAPH_API_BASE")));
    }
}
