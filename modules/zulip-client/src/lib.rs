pub mod error;

pub use error::{Result, ZulipError};

use std::time::Duration;

use serde::Deserialize;

/// Hosted Zulip API root. Self-hosted realms use `https://<realm>/api/v1`.
pub const DEFAULT_BASE_URL: &str = "https://api.zulip.com/v1";

const DEFAULT_TIMEOUT: Duration = Duration::from_secs(10);

#[derive(Debug, Clone)]
pub struct ZulipOptions {
    pub base_url: String,
    pub email: String,
    pub api_key: String,
    pub timeout: Duration,
}

impl ZulipOptions {
    pub fn new(email: impl Into<String>, api_key: impl Into<String>) -> Self {
        Self {
            base_url: DEFAULT_BASE_URL.to_string(),
            email: email.into(),
            api_key: api_key.into(),
            timeout: DEFAULT_TIMEOUT,
        }
    }
}

/// A message addressed to a stream topic.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StreamMessage {
    pub stream: String,
    pub topic: String,
    pub content: String,
}

/// Zulip wraps every response in `{"result": "success"|"error", "msg": ...}`.
#[derive(Debug, Deserialize)]
struct ApiEnvelope {
    result: String,
    #[serde(default)]
    msg: String,
    id: Option<u64>,
}

pub struct ZulipClient {
    client: reqwest::Client,
    endpoint: String,
    email: String,
    api_key: String,
}

impl ZulipClient {
    pub fn new(options: ZulipOptions) -> Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(options.timeout)
            .build()
            .map_err(|e| ZulipError::Setup(e.to_string()))?;

        Ok(Self {
            client,
            endpoint: format!("{}/messages", options.base_url.trim_end_matches('/')),
            email: options.email,
            api_key: options.api_key,
        })
    }

    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }

    /// Post a message to a stream. Returns the new message id when Zulip reports one.
    pub async fn send_stream_message(&self, message: &StreamMessage) -> Result<Option<u64>> {
        let form = [
            ("type", "stream"),
            ("to", message.stream.as_str()),
            ("subject", message.topic.as_str()),
            ("content", message.content.as_str()),
        ];

        let resp = self
            .client
            .post(&self.endpoint)
            .basic_auth(&self.email, Some(&self.api_key))
            .form(&form)
            .send()
            .await?;

        let status = resp.status();
        let body = match resp.text().await {
            Ok(body) => body,
            Err(e) => {
                tracing::debug!(error = %e, status = status.as_u16(), "Could not read Zulip response body");
                String::new()
            }
        };
        if !status.is_success() {
            return Err(ZulipError::Api {
                status: status.as_u16(),
                message: body,
            });
        }

        // Older servers answer with an empty body; only an explicit error envelope counts.
        match serde_json::from_str::<ApiEnvelope>(&body) {
            Ok(envelope) if envelope.result == "error" => Err(ZulipError::Api {
                status: status.as_u16(),
                message: envelope.msg,
            }),
            Ok(envelope) => {
                tracing::debug!(
                    stream = %message.stream,
                    topic = %message.topic,
                    id = ?envelope.id,
                    "Zulip message sent"
                );
                Ok(envelope.id)
            }
            Err(_) => Ok(None),
        }
    }
}
