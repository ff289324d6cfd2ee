use std::future::Future;

use pusher_client::{PusherClient, PusherEvent};

use crate::broadcast::Broadcast;
use crate::error::{BridgeError, Result};
use crate::notifier::Notifier;

/// Posted once before listening so the stream shows the bridge is alive.
pub const STARTUP_MESSAGE: &str = "starting to listen for broadcasts...";

/// Which channel to join and which event on it carries broadcasts.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Subscription {
    pub channel: String,
    pub event: String,
}

pub struct Bridge<N> {
    notifier: N,
}

impl<N: Notifier> Bridge<N> {
    pub fn new(notifier: N) -> Self {
        Self { notifier }
    }

    pub fn notifier(&self) -> &N {
        &self.notifier
    }

    /// Send [`STARTUP_MESSAGE`]. A failed delivery is logged; listening still starts.
    pub async fn announce(&self) -> bool {
        match self.notifier.notify(STARTUP_MESSAGE).await {
            Ok(()) => {
                tracing::info!("Startup message delivered");
                true
            }
            Err(e) => {
                tracing::error!(error = %e, "Startup message not delivered");
                false
            }
        }
    }

    /// Turn one raw event payload into a chat line and deliver it.
    /// Returns the delivered line.
    pub async fn handle_event(&self, data: &str) -> Result<String> {
        let message = format_event(data)?;
        self.notifier.notify(&message).await?;
        Ok(message)
    }

    /// [`Bridge::handle_event`], with failures logged and swallowed so one bad
    /// event never stops the listener.
    pub async fn on_event(&self, data: &str) {
        match self.handle_event(data).await {
            Ok(message) => tracing::info!(%message, "Broadcast forwarded"),
            Err(e @ (BridgeError::Payload(_) | BridgeError::Broadcast(_))) => {
                tracing::warn!(error = %e, payload_len = data.len(), "Dropping unreadable broadcast");
            }
            Err(e) => tracing::error!(error = %e, "Broadcast not delivered"),
        }
    }

    /// Announce, then forward every broadcast until `shutdown` resolves.
    pub async fn run<S>(&self, mut client: PusherClient, subscription: &Subscription, shutdown: S) -> Result<()>
    where
        S: Future<Output = ()>,
    {
        client.subscribe(subscription.channel.clone())?;
        self.announce().await;

        tracing::info!(
            channel = %subscription.channel,
            event = %subscription.event,
            "Listening for broadcasts"
        );
        client
            .listen_until(
                &subscription.event,
                move |event: PusherEvent| async move { self.on_event(&event.data).await },
                shutdown,
            )
            .await?;
        Ok(())
    }
}

/// Parse a raw payload into its chat line. Kept synchronous so the parsed
/// document never lives across an await point.
fn format_event(data: &str) -> Result<String> {
    let broadcast = Broadcast::from_json(data)?;
    let message = broadcast.message()?;
    tracing::debug!(
        id = ?broadcast.id,
        person_id = ?broadcast.person_id,
        client_id = ?broadcast.client_id,
        "Parsed broadcast"
    );
    Ok(message)
}
