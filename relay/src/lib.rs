//! Messenger relay - webhook ingestion and topic-driven replies.
//!
//! This library provides shared modules for the two relay binaries:
//! - `relay-web`: Thin web server for the Messenger webhook (verification
//!   handshake and message ingestion)
//! - `relay-worker`: Topic consumer that forwards replies to the Messenger
//!   send API
//!
//! ## Architecture
//!
//! ```text
//! Messenger → Web Server → relay topic → Worker → Graph send API
//! ```
//!
//! Inbound chat messages are normalized to [`RelayMessage`] values and
//! published onto the configured topic; deliveries from that topic are
//! decoded and forwarded back to the originating chat.

pub mod config;
pub mod dispatch;
pub mod error;
pub mod messenger;
pub mod pubsub;
pub mod queue;
pub mod web;

// Re-export commonly used types
pub use config::Config;
pub use dispatch::{classify, TriggerEvent};
pub use error::RelayError;
pub use messenger::SendClient;
pub use queue::{Envelope, Publisher, RelayMessage, RelayPublisher};
pub use web::AppState;
