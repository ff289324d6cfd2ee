pub mod bridge;
pub mod broadcast;
pub mod config;
pub mod error;
pub mod notifier;

pub use bridge::{Bridge, Subscription, STARTUP_MESSAGE};
pub use broadcast::{compose_message, parse_content, parse_name, Broadcast, BroadcastPayload};
pub use config::{BridgeConfig, PusherCredentials};
pub use error::{BridgeError, BroadcastError, NotifyError, Result};
pub use notifier::{Notifier, ZulipNotifier};
