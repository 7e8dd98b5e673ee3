//! Wire types carried over the relay topic.
//!
//! This module defines:
//! - [`RelayMessage`]: the normalized unit of chat traffic
//! - [`Envelope`]: the delivery framing wrapping relay messages

use serde::{Deserialize, Serialize};

use crate::error::RelayError;

// =============================================================================
// Relay Message
// =============================================================================

/// Normalized chat message carried over the relay topic.
///
/// Field names are fixed on the wire; producers and consumers in other
/// deployments rely on them verbatim.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RelayMessage {
    /// Chat user the reply should be delivered to
    #[serde(rename = "RecipientId")]
    pub recipient_id: String,

    /// Message text
    #[serde(rename = "Body")]
    pub body: String,
}

// =============================================================================
// Delivery Envelope
// =============================================================================

/// Delivery framing carried on the relay topic.
///
/// The publisher emits one record per publish; foreign producers may batch
/// several records into a single delivery.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Envelope {
    #[serde(default)]
    pub records: Vec<EnvelopeRecord>,
}

/// A single record inside an [`Envelope`].
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EnvelopeRecord {
    /// JSON-encoded [`RelayMessage`]
    pub message: String,
}

impl Envelope {
    /// Wrap one JSON-encoded relay message as a single-record envelope.
    pub fn single(message: String) -> Self {
        Self {
            records: vec![EnvelopeRecord { message }],
        }
    }

    /// Decode the relay message embedded in the first record.
    ///
    /// Only the first record is consulted; additional records in the same
    /// envelope are ignored by the relay.
    pub fn first_message(&self) -> Result<RelayMessage, RelayError> {
        let record = self
            .records
            .first()
            .ok_or_else(|| RelayError::Validation("envelope has no records".to_string()))?;
        let message = serde_json::from_str(&record.message)?;
        Ok(message)
    }
}
