use thiserror::Error;

pub type Result<T> = std::result::Result<T, BridgeError>;

#[derive(Error, Debug)]
pub enum BridgeError {
    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Payload error: {0}")]
    Payload(#[from] serde_json::Error),

    #[error(transparent)]
    Broadcast(#[from] BroadcastError),

    #[error(transparent)]
    Notify(#[from] NotifyError),

    #[error(transparent)]
    Pusher(#[from] pusher_client::PusherError),
}

/// The broadcast markup did not have the expected layout.
#[derive(Error, Debug, PartialEq, Eq)]
pub enum BroadcastError {
    #[error("Broadcast has {anchors} anchor(s); the author link is the second")]
    MissingName { anchors: usize },

    #[error("Broadcast has no element with class \"text\"")]
    MissingContent,
}

#[derive(Error, Debug)]
pub enum NotifyError {
    #[error(transparent)]
    Zulip(#[from] zulip_client::ZulipError),
}
