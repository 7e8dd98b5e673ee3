//! Inbound Messenger webhook event shapes.
//!
//! Reference: https://developers.facebook.com/docs/messenger-platform/webhooks#event-notifications

use serde::Deserialize;

/// Page-level event notification delivered to the webhook.
///
/// Only `object == "page"` notifications are processed.
#[derive(Debug, Clone, Deserialize)]
pub struct Event {
    #[serde(default)]
    pub object: String,
    #[serde(default)]
    pub entry: Vec<Entry>,
}

/// One page entry inside an [`Event`], in delivery order.
#[derive(Debug, Clone, Deserialize)]
pub struct Entry {
    #[serde(default)]
    pub id: String,
    #[serde(default)]
    pub time: i64,
    #[serde(default)]
    pub messaging: Vec<MessagingEvent>,
}

/// A single messaging event between a user and the page.
///
/// `message` is absent for non-message events such as delivery receipts;
/// those are still relayed, with an empty body.
#[derive(Debug, Clone, Deserialize)]
pub struct MessagingEvent {
    pub sender: Party,
    pub recipient: Party,
    #[serde(default)]
    pub timestamp: i64,
    #[serde(default)]
    pub message: Option<MessageContent>,
}

/// Sender or recipient reference.
#[derive(Debug, Clone, Deserialize)]
pub struct Party {
    pub id: String,
}

/// Message payload of a [`MessagingEvent`].
#[derive(Debug, Clone, Deserialize)]
pub struct MessageContent {
    #[serde(default)]
    pub mid: String,
    #[serde(default)]
    pub text: String,
}

impl MessagingEvent {
    /// Message text, or the empty string for message-less events.
    pub fn text(&self) -> &str {
        self.message.as_ref().map(|m| m.text.as_str()).unwrap_or("")
    }
}
