//! Pusher channels wire protocol (version 7).
//!
//! Every frame is a JSON object `{"event", "channel"?, "data"?}`. Servers
//! usually send `data` as a JSON-encoded string; some system events carry an
//! object instead, so [`Frame::data_text`] normalizes both to text.

use hmac::{Hmac, Mac};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use sha2::Sha256;

type HmacSha256 = Hmac<Sha256>;

pub const PROTOCOL_VERSION: u8 = 7;

pub const CONNECTION_ESTABLISHED: &str = "pusher:connection_established";
pub const ERROR: &str = "pusher:error";
pub const PING: &str = "pusher:ping";
pub const PONG: &str = "pusher:pong";
pub const SUBSCRIBE: &str = "pusher:subscribe";
pub const SUBSCRIPTION_SUCCEEDED: &str = "pusher_internal:subscription_succeeded";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Frame {
    pub event: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub channel: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub data: Option<Value>,
}

impl Frame {
    pub fn ping() -> Self {
        Self {
            event: PING.to_string(),
            channel: None,
            data: Some(Value::Object(Default::default())),
        }
    }

    pub fn pong() -> Self {
        Self {
            event: PONG.to_string(),
            channel: None,
            data: Some(Value::Object(Default::default())),
        }
    }

    pub fn subscribe(channel: &str, auth: Option<String>) -> Self {
        let mut data = serde_json::json!({ "channel": channel });
        if let Some(auth) = auth {
            data["auth"] = Value::String(auth);
        }
        Self {
            event: SUBSCRIBE.to_string(),
            channel: None,
            data: Some(data),
        }
    }

    /// The payload as text: string data verbatim, anything else re-encoded.
    pub fn data_text(&self) -> String {
        match &self.data {
            Some(Value::String(s)) => s.clone(),
            Some(other) => other.to_string(),
            None => String::new(),
        }
    }

    pub fn to_json(&self) -> String {
        // Frame only holds strings and JSON values.
        serde_json::to_string(self).unwrap_or_default()
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct ConnectionEstablished {
    pub socket_id: String,
    /// Seconds of silence after which the client should ping.
    pub activity_timeout: Option<u64>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ErrorData {
    #[serde(default)]
    pub message: String,
    pub code: Option<u16>,
}

/// What a Pusher error or close code asks the client to do.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorAction {
    /// 4000-4099: do not reconnect.
    Fatal,
    /// 4100-4199: reconnect after backing off.
    Backoff,
    /// 4200-4299: reconnect immediately.
    Immediate,
    /// Anything else is informational.
    Ignore,
}

pub fn classify(code: u16) -> ErrorAction {
    match code {
        4000..=4099 => ErrorAction::Fatal,
        4100..=4199 => ErrorAction::Backoff,
        4200..=4299 => ErrorAction::Immediate,
        _ => ErrorAction::Ignore,
    }
}

pub fn is_private(channel: &str) -> bool {
    channel.starts_with("private-")
}

pub fn is_presence(channel: &str) -> bool {
    channel.starts_with("presence-")
}

/// Private channel auth token: `key:hex(HMAC-SHA256(secret, "socket_id:channel"))`.
pub fn auth_signature(key: &str, secret: &str, socket_id: &str, channel: &str) -> String {
    let mut mac = HmacSha256::new_from_slice(secret.as_bytes())
        .expect("HMAC can take key of any size");
    mac.update(format!("{socket_id}:{channel}").as_bytes());
    format!("{key}:{}", hex::encode(mac.finalize().into_bytes()))
}
