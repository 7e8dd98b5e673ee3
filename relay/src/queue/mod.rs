//! Queue module for the relay topic.
//!
//! This module provides:
//! - The wire types carried over the topic
//! - An async publisher for enqueueing relay messages
//!
//! ## Architecture
//!
//! ```text
//! Web Server → relay topic → Worker
//! ```

pub mod publisher;
pub mod types;

pub use publisher::{Publisher, RelayPublisher};
pub use types::{Envelope, EnvelopeRecord, RelayMessage};
