//! Minimal client for the Pusher channels WebSocket API.
//!
//! Subscribes to public and private channels, answers keepalive pings and
//! reconnects with exponential backoff. Events are handed to a single handler
//! sequentially, in the order the server sent them.

pub mod backoff;
pub mod client;
pub mod error;
pub mod protocol;

pub use backoff::Backoff;
pub use client::{PusherClient, PusherEvent, PusherOptions, DEFAULT_HOST};
pub use error::{PusherError, Result};
