//! Error types for the relay.
//!
//! Errors are logged with context at the point of detection and, where an
//! HTTP caller exists, converted to a status code via [`RelayError::status`].
//! There is no retry or local recovery; each invocation is isolated.

use axum::http::StatusCode;
use thiserror::Error;

/// Error type covering every failure mode of a relay pass.
#[derive(Debug, Error)]
pub enum RelayError {
    /// A payload could not be parsed as JSON of the expected shape.
    #[error("malformed payload: {0}")]
    Parse(#[from] serde_json::Error),

    /// A payload parsed but is not something the relay handles.
    #[error("unsupported payload: {0}")]
    Validation(String),

    /// A required configuration value is absent.
    ///
    /// Carries the environment variable name that was not set.
    #[error("missing required configuration: {0}")]
    Configuration(&'static str),

    /// The broker refused a publish, or the connection to it failed.
    #[error("publish failed: {0}")]
    Publish(#[source] Box<dyn std::error::Error + Send + Sync>),

    /// The send API answered with a non-200 status.
    ///
    /// The response body is kept verbatim for diagnostics.
    #[error("send rejected: status {status}: {body}")]
    Send { status: u16, body: String },

    /// The send API could not be reached at all.
    #[error("send transport failure: {0}")]
    SendTransport(#[from] reqwest::Error),
}

impl RelayError {
    /// HTTP status reported to the caller for this error.
    pub fn status(&self) -> StatusCode {
        match self {
            RelayError::Parse(_) | RelayError::Validation(_) | RelayError::Configuration(_) => {
                StatusCode::BAD_REQUEST
            }
            RelayError::Publish(_) | RelayError::Send { .. } | RelayError::SendTransport(_) => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_client_errors_map_to_400() {
        let parse = serde_json::from_str::<serde_json::Value>("{").unwrap_err();
        assert_eq!(RelayError::Parse(parse).status(), StatusCode::BAD_REQUEST);
        assert_eq!(
            RelayError::Validation("unsupported".into()).status(),
            StatusCode::BAD_REQUEST
        );
        assert_eq!(
            RelayError::Configuration("PAGE_ID").status(),
            StatusCode::BAD_REQUEST
        );
    }

    #[test]
    fn test_downstream_errors_map_to_500() {
        let publish = RelayError::Publish("broker unreachable".into());
        assert_eq!(publish.status(), StatusCode::INTERNAL_SERVER_ERROR);
        let send = RelayError::Send {
            status: 401,
            body: "bad token".into(),
        };
        assert_eq!(send.status(), StatusCode::INTERNAL_SERVER_ERROR);
    }

    #[test]
    fn test_send_error_keeps_body() {
        let err = RelayError::Send {
            status: 400,
            body: "(#100) invalid recipient".into(),
        };
        let rendered = err.to_string();
        assert!(rendered.contains("400"));
        assert!(rendered.contains("invalid recipient"));
    }
}
