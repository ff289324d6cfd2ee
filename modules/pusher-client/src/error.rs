use thiserror::Error;

pub type Result<T> = std::result::Result<T, PusherError>;

#[derive(Debug, Error)]
pub enum PusherError {
    #[error("Invalid socket URL: {0}")]
    InvalidUrl(String),

    #[error("Channel {0} requires an app secret to authenticate")]
    MissingSecret(String),

    #[error("Presence channel {0} is not supported")]
    UnsupportedChannel(String),

    /// Pusher error codes 4000-4099: the connection must not be retried.
    #[error("Pusher refused the connection (code {code}): {message}")]
    Refused { code: u16, message: String },
}

impl From<url::ParseError> for PusherError {
    fn from(err: url::ParseError) -> Self {
        PusherError::InvalidUrl(err.to_string())
    }
}
