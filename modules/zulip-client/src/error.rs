use thiserror::Error;

pub type Result<T> = std::result::Result<T, ZulipError>;

#[derive(Debug, Error)]
pub enum ZulipError {
    #[error("Network error: {0}")]
    Network(String),

    #[error("API error (status {status}): {message}")]
    Api { status: u16, message: String },

    #[error("Client setup error: {0}")]
    Setup(String),
}

impl From<reqwest::Error> for ZulipError {
    fn from(err: reqwest::Error) -> Self {
        ZulipError::Network(err.to_string())
    }
}
