//! Messenger platform integration.
//!
//! This module provides:
//! - The inbound webhook event shapes
//! - The outbound send API client

pub mod send;
pub mod types;

pub use send::{SendClient, MESSAGING_TYPE};
pub use types::{Entry, Event, MessageContent, MessagingEvent, Party};
