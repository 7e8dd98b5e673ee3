//! Topic delivery handling.
//!
//! The second half of the relay: a delivery envelope from the topic is
//! decoded and its message forwarded to the chat platform.

use tracing::{info, warn};

use crate::error::RelayError;
use crate::messenger::SendClient;
use crate::queue::Envelope;

/// Relay the first record of a delivery envelope to the chat platform.
///
/// Only the first record is relayed; any additional records in the same
/// envelope are ignored. The relay publishes one record per envelope, so
/// extra records only appear with foreign producers.
pub async fn handle_envelope(sender: &SendClient, envelope: &Envelope) -> Result<(), RelayError> {
    if envelope.records.len() > 1 {
        warn!(
            ignored = envelope.records.len() - 1,
            "envelope_extra_records_ignored"
        );
    }

    let message = envelope.first_message()?;

    info!(
        recipient = %message.recipient_id,
        body_length = message.body.len(),
        "relay_reply_received"
    );

    sender.send(&message.recipient_id, &message.body).await
}
