//! Trigger classification for opaque payloads.
//!
//! The two transports mostly know what they are handing over: the web
//! server routes by HTTP method, and queue deliveries are expected to be
//! topic envelopes. [`classify`] is the entry point for any payload that
//! arrives without that knowledge — the worker runs every delivery through
//! it, and ingress layers that forward raw trigger payloads can use it
//! directly.

use serde::Deserialize;

use crate::queue::Envelope;

/// A classified inbound trigger.
#[derive(Debug)]
pub enum TriggerEvent {
    /// A topic delivery envelope with at least one record.
    PubSub(Envelope),

    /// An HTTP-originated trigger payload and the method it carried.
    Webhook { method: String },

    /// Neither shape matched; callers answer 400 or reject the delivery.
    Unrecognized,
}

/// Shallow probe for the HTTP trigger payload shape.
#[derive(Debug, Default, Deserialize)]
struct HttpTrigger {
    #[serde(default, rename = "requestContext")]
    request_context: RequestContext,
}

#[derive(Debug, Default, Deserialize)]
struct RequestContext {
    #[serde(default)]
    http: HttpDescriptor,
}

#[derive(Debug, Default, Deserialize)]
struct HttpDescriptor {
    #[serde(default)]
    method: String,
}

/// Classify an opaque trigger payload.
///
/// The envelope shape is probed first: a payload that parses as an
/// [`Envelope`] with at least one record is a pub/sub trigger even when
/// HTTP-shape fields are also present. A payload carrying a non-empty
/// HTTP method is a webhook trigger. Everything else - including JSON
/// that parses but has neither records nor a method - is unrecognized.
pub fn classify(raw: &[u8]) -> TriggerEvent {
    if let Ok(envelope) = serde_json::from_slice::<Envelope>(raw) {
        if !envelope.records.is_empty() {
            return TriggerEvent::PubSub(envelope);
        }
    }

    if let Ok(trigger) = serde_json::from_slice::<HttpTrigger>(raw) {
        let method = trigger.request_context.http.method;
        if !method.is_empty() {
            return TriggerEvent::Webhook { method };
        }
    }

    TriggerEvent::Unrecognized
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_classify_envelope() {
        let raw = br#"{"records":[{"message":"{\"RecipientId\":\"U1\",\"Body\":\"hi\"}"}]}"#;
        match classify(raw) {
            TriggerEvent::PubSub(envelope) => assert_eq!(envelope.records.len(), 1),
            other => panic!("expected PubSub, got {:?}", other),
        }
    }

    #[test]
    fn test_classify_prefers_envelope_over_http_shape() {
        // Carries both a record and an HTTP method; envelope wins.
        let raw = br#"{"records":[{"message":"{}"}],"requestContext":{"http":{"method":"POST"}}}"#;
        assert!(matches!(classify(raw), TriggerEvent::PubSub(_)));
    }

    #[test]
    fn test_classify_http_trigger() {
        let raw = br#"{"requestContext":{"http":{"method":"GET"}}}"#;
        match classify(raw) {
            TriggerEvent::Webhook { method } => assert_eq!(method, "GET"),
            other => panic!("expected Webhook, got {:?}", other),
        }
    }

    #[test]
    fn test_classify_empty_envelope_falls_through() {
        // Zero records is not a pub/sub trigger; the method decides.
        let raw = br#"{"records":[],"requestContext":{"http":{"method":"POST"}}}"#;
        assert!(matches!(
            classify(raw),
            TriggerEvent::Webhook { method } if method == "POST"
        ));
    }

    #[test]
    fn test_classify_empty_object() {
        assert!(matches!(classify(b"{}"), TriggerEvent::Unrecognized));
    }

    #[test]
    fn test_classify_invalid_json() {
        assert!(matches!(classify(b"not json"), TriggerEvent::Unrecognized));
    }

    #[test]
    fn test_classify_empty_method() {
        let raw = br#"{"requestContext":{"http":{"method":""}}}"#;
        assert!(matches!(classify(raw), TriggerEvent::Unrecognized));
    }
}
