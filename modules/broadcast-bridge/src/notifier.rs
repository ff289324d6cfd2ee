use async_trait::async_trait;
use zulip_client::{StreamMessage, ZulipClient};

use crate::error::NotifyError;

/// Delivers a finished chat line somewhere people will read it.
#[async_trait]
pub trait Notifier: Send + Sync {
    async fn notify(&self, message: &str) -> Result<(), NotifyError>;
}

/// Posts each message to one Zulip stream topic.
pub struct ZulipNotifier {
    client: ZulipClient,
    stream: String,
    topic: String,
}

impl ZulipNotifier {
    pub fn new(client: ZulipClient, stream: impl Into<String>, topic: impl Into<String>) -> Self {
        Self {
            client,
            stream: stream.into(),
            topic: topic.into(),
        }
    }
}

#[async_trait]
impl Notifier for ZulipNotifier {
    async fn notify(&self, message: &str) -> Result<(), NotifyError> {
        let message = StreamMessage {
            stream: self.stream.clone(),
            topic: self.topic.clone(),
            content: message.to_string(),
        };
        self.client.send_stream_message(&message).await?;
        Ok(())
    }
}
