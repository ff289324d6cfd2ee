use std::future::Future;
use std::time::Duration;

use futures::stream::SplitSink;
use futures::{SinkExt, StreamExt};
use tokio::net::TcpStream;
use tokio_tungstenite::tungstenite::Message;
use tokio_tungstenite::{connect_async, MaybeTlsStream, WebSocketStream};
use url::Url;

use crate::backoff::Backoff;
use crate::error::{PusherError, Result};
use crate::protocol::{self, ConnectionEstablished, ErrorAction, ErrorData, Frame};

pub const DEFAULT_HOST: &str = "ws.pusherapp.com";

const CLIENT_NAME: &str = "rust-pusher-client";

type Writer = SplitSink<WebSocketStream<MaybeTlsStream<TcpStream>>, Message>;

#[derive(Debug, Clone)]
pub struct PusherOptions {
    /// Application key (the user part of a `PUSHER_URL`).
    pub key: String,
    /// Application secret; required for `private-` channels.
    pub secret: Option<String>,
    pub host: String,
    pub port: Option<u16>,
    pub secure: bool,
    pub backoff: Backoff,
    /// Upper bound on silence before pinging; the server may ask for less.
    pub activity_timeout: Duration,
    pub pong_timeout: Duration,
}

impl PusherOptions {
    pub fn new(key: impl Into<String>) -> Self {
        Self {
            key: key.into(),
            secret: None,
            host: DEFAULT_HOST.to_string(),
            port: None,
            secure: true,
            backoff: Backoff::default(),
            activity_timeout: Duration::from_secs(120),
            pong_timeout: Duration::from_secs(30),
        }
    }

    pub fn with_secret(mut self, secret: impl Into<String>) -> Self {
        self.secret = Some(secret.into());
        self
    }

    pub fn socket_url(&self) -> Result<Url> {
        let scheme = if self.secure { "wss" } else { "ws" };
        let port = self.port.map(|p| format!(":{p}")).unwrap_or_default();
        let url = Url::parse(&format!(
            "{scheme}://{host}{port}/app/{key}?protocol={protocol}&client={CLIENT_NAME}&version={version}",
            host = self.host,
            key = self.key,
            protocol = protocol::PROTOCOL_VERSION,
            version = env!("CARGO_PKG_VERSION"),
        ))?;
        Ok(url)
    }
}

/// An application event received on a subscribed channel.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PusherEvent {
    pub event: String,
    pub channel: Option<String>,
    /// Raw payload text, usually JSON.
    pub data: String,
}

/// Why a session ended without a fatal error.
#[derive(Debug)]
enum Disconnect {
    Backoff(String),
    Immediate(String),
}

pub struct PusherClient {
    options: PusherOptions,
    channels: Vec<String>,
}

impl PusherClient {
    pub fn new(options: PusherOptions) -> Self {
        Self {
            options,
            channels: Vec::new(),
        }
    }

    /// Register a channel to join on every (re)connect.
    pub fn subscribe(&mut self, channel: impl Into<String>) -> Result<()> {
        let channel = channel.into();
        if protocol::is_presence(&channel) {
            return Err(PusherError::UnsupportedChannel(channel));
        }
        if protocol::is_private(&channel) && self.options.secret.is_none() {
            return Err(PusherError::MissingSecret(channel));
        }
        if !self.channels.contains(&channel) {
            self.channels.push(channel);
        }
        Ok(())
    }

    pub fn channels(&self) -> &[String] {
        &self.channels
    }

    /// Deliver every `event` to `handler`, one at a time and in arrival order,
    /// reconnecting as needed until `shutdown` resolves.
    ///
    /// The handler is awaited before the next frame is read. Returns an error
    /// only when Pusher refuses the connection outright (codes 4000-4099).
    pub async fn listen_until<H, Fut, S>(&self, event: &str, mut handler: H, shutdown: S) -> Result<()>
    where
        H: FnMut(PusherEvent) -> Fut,
        Fut: Future<Output = ()>,
        S: Future<Output = ()>,
    {
        let url = self.options.socket_url()?;
        tokio::pin!(shutdown);
        let mut attempt: u32 = 0;

        loop {
            let outcome = tokio::select! {
                _ = &mut shutdown => {
                    tracing::info!("Pusher listener shutting down");
                    return Ok(());
                }
                outcome = self.session(&url, event, &mut handler, &mut attempt) => outcome,
            };

            let delay = match outcome? {
                Disconnect::Immediate(reason) => {
                    tracing::warn!(%reason, "Pusher connection dropped, reconnecting now");
                    Duration::ZERO
                }
                Disconnect::Backoff(reason) => {
                    let delay = self.options.backoff.delay(attempt);
                    attempt = attempt.saturating_add(1);
                    tracing::warn!(%reason, delay_ms = delay.as_millis() as u64, "Pusher connection lost, reconnecting");
                    delay
                }
            };

            tokio::select! {
                _ = &mut shutdown => {
                    tracing::info!("Pusher listener shutting down");
                    return Ok(());
                }
                _ = tokio::time::sleep(delay) => {}
            }
        }
    }

    async fn session<H, Fut>(
        &self,
        url: &Url,
        event: &str,
        handler: &mut H,
        attempt: &mut u32,
    ) -> Result<Disconnect>
    where
        H: FnMut(PusherEvent) -> Fut,
        Fut: Future<Output = ()>,
    {
        tracing::info!(host = %self.options.host, "Connecting to Pusher");
        let (stream, _resp) = match connect_async(url.as_str()).await {
            Ok(conn) => conn,
            Err(e) => return Ok(Disconnect::Backoff(format!("connect failed: {e}"))),
        };
        let (mut write, mut read) = stream.split();

        let mut activity_timeout = self.options.activity_timeout;
        let mut awaiting_pong = false;

        loop {
            let wait = if awaiting_pong {
                self.options.pong_timeout
            } else {
                activity_timeout
            };

            let message = match tokio::time::timeout(wait, read.next()).await {
                Err(_) if awaiting_pong => {
                    return Ok(Disconnect::Backoff("no pong before timeout".to_string()))
                }
                Err(_) => {
                    if let Err(reason) = send(&mut write, &Frame::ping()).await {
                        return Ok(Disconnect::Backoff(reason));
                    }
                    awaiting_pong = true;
                    continue;
                }
                Ok(None) => return Ok(Disconnect::Backoff("stream ended".to_string())),
                Ok(Some(Err(e))) => return Ok(Disconnect::Backoff(e.to_string())),
                Ok(Some(Ok(message))) => message,
            };
            awaiting_pong = false;

            let text = match message {
                Message::Text(text) => text,
                Message::Close(frame) => {
                    let code = frame.as_ref().map(|f| u16::from(f.code)).unwrap_or(1000);
                    let reason = frame.map(|f| f.reason.to_string()).unwrap_or_default();
                    return on_error_code(code, reason);
                }
                _ => continue,
            };

            let frame: Frame = match serde_json::from_str(&text) {
                Ok(frame) => frame,
                Err(e) => {
                    tracing::warn!(error = %e, "Ignoring undecodable Pusher frame");
                    continue;
                }
            };

            match frame.event.as_str() {
                protocol::CONNECTION_ESTABLISHED => {
                    let established: ConnectionEstablished =
                        match serde_json::from_str(&frame.data_text()) {
                            Ok(established) => established,
                            Err(e) => {
                                return Ok(Disconnect::Backoff(format!(
                                    "bad connection_established payload: {e}"
                                )))
                            }
                        };
                    if let Some(secs) = established.activity_timeout {
                        activity_timeout = activity_timeout.min(Duration::from_secs(secs.max(1)));
                    }
                    tracing::info!(socket_id = %established.socket_id, "Pusher connection established");

                    for channel in &self.channels {
                        let auth = self
                            .options
                            .secret
                            .as_deref()
                            .filter(|_| protocol::is_private(channel))
                            .map(|secret| {
                                protocol::auth_signature(
                                    &self.options.key,
                                    secret,
                                    &established.socket_id,
                                    channel,
                                )
                            });
                        if let Err(reason) = send(&mut write, &Frame::subscribe(channel, auth)).await {
                            return Ok(Disconnect::Backoff(reason));
                        }
                    }
                }
                protocol::PING => {
                    if let Err(reason) = send(&mut write, &Frame::pong()).await {
                        return Ok(Disconnect::Backoff(reason));
                    }
                }
                protocol::PONG => {}
                protocol::SUBSCRIPTION_SUCCEEDED => {
                    tracing::info!(channel = ?frame.channel, "Subscribed");
                    // Only a confirmed subscription resets the backoff.
                    *attempt = 0;
                }
                protocol::ERROR => {
                    let error: ErrorData = serde_json::from_str(&frame.data_text())
                        .unwrap_or_else(|_| ErrorData {
                            message: frame.data_text(),
                            code: None,
                        });
                    tracing::warn!(code = ?error.code, message = %error.message, "Pusher error");
                    if let Some(code) = error
                        .code
                        .filter(|code| protocol::classify(*code) != ErrorAction::Ignore)
                    {
                        return on_error_code(code, error.message);
                    }
                }
                name if name == event => {
                    handler(PusherEvent {
                        event: frame.event.clone(),
                        channel: frame.channel.clone(),
                        data: frame.data_text(),
                    })
                    .await;
                }
                other => {
                    tracing::debug!(event = other, "Ignoring unbound Pusher event");
                }
            }
        }
    }
}

/// Map a Pusher error or close code to how the session ends.
fn on_error_code(code: u16, message: String) -> Result<Disconnect> {
    match protocol::classify(code) {
        ErrorAction::Fatal => Err(PusherError::Refused { code, message }),
        ErrorAction::Immediate => Ok(Disconnect::Immediate(format!("{code}: {message}"))),
        ErrorAction::Backoff | ErrorAction::Ignore => {
            Ok(Disconnect::Backoff(format!("{code}: {message}")))
        }
    }
}

async fn send(write: &mut Writer, frame: &Frame) -> std::result::Result<(), String> {
    write
        .send(Message::Text(frame.to_json()))
        .await
        .map_err(|e| e.to_string())
}
