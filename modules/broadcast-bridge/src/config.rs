use std::sync::LazyLock;
use std::time::Duration;

use pusher_client::PusherOptions;
use regex::Regex;
use zulip_client::ZulipOptions;

use crate::error::{BridgeError, Result};

pub const ZULIP_EMAIL_VAR: &str = "FACULTY_ZULIP_BOT_EMAIL";
pub const ZULIP_API_KEY_VAR: &str = "FACULTY_ZULIP_BOT_API_KEY";
pub const PUSHER_URL_VAR: &str = "TEST_PUSHER_URL";

pub const DEFAULT_STREAM: &str = "bot-test";
pub const DEFAULT_TOPIC: &str = "broadcasts";
pub const DEFAULT_CHANNEL: &str = "private-latest-broadcasts";
pub const DEFAULT_EVENT: &str = "new-broadcast";
const DEFAULT_NOTIFY_TIMEOUT_SECS: u64 = 10;

/// `http://<key>:<secret>@api.<host>/apps/<id>`, as issued by the Pusher dashboard.
static RE_PUSHER_URL: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^https?://([A-Za-z0-9]+):([A-Za-z0-9]+)@api\.([A-Za-z0-9.-]+)/apps/([0-9]+)/?$")
        .expect("valid regex")
});

/// Pusher app credentials packed into a single connection string.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PusherCredentials {
    pub key: String,
    pub secret: String,
    /// API host without the `api.` prefix, e.g. `pusherapp.com`.
    pub host: String,
    pub app_id: u64,
}

impl PusherCredentials {
    pub fn parse(url: &str) -> Result<Self> {
        let caps = RE_PUSHER_URL.captures(url.trim()).ok_or_else(|| {
            BridgeError::Config(format!(
                "{PUSHER_URL_VAR} must look like http://<key>:<secret>@api.<host>/apps/<id>"
            ))
        })?;

        let app_id = caps[4]
            .parse()
            .map_err(|_| BridgeError::Config(format!("{PUSHER_URL_VAR} app id is out of range")))?;

        Ok(Self {
            key: caps[1].to_string(),
            secret: caps[2].to_string(),
            host: caps[3].to_string(),
            app_id,
        })
    }

    /// WebSocket host paired with the API host (`api.X` serves REST, `ws.X` sockets).
    pub fn ws_host(&self) -> String {
        format!("ws.{}", self.host)
    }
}

/// Everything the bridge needs, read once at startup.
#[derive(Debug, Clone)]
pub struct BridgeConfig {
    // Zulip
    pub zulip_email: String,
    pub zulip_api_key: String,
    pub zulip_base_url: String,
    pub stream: String,
    pub topic: String,
    pub notify_timeout: Duration,

    // Pusher
    pub pusher: PusherCredentials,
    pub pusher_ws_host: String,
    pub channel: String,
    pub event: String,
}

impl BridgeConfig {
    /// Load configuration from the process environment (and `.env` if present).
    pub fn from_env() -> Result<Self> {
        dotenvy::dotenv().ok();
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Load configuration from any key lookup. Empty values count as unset.
    pub fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let optional = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());
        let required = |key: &str| {
            optional(key)
                .ok_or_else(|| BridgeError::Config(format!("{key} environment variable is required")))
        };
        let or_default = |key: &str, default: &str| optional(key).unwrap_or_else(|| default.to_string());

        let pusher = PusherCredentials::parse(&required(PUSHER_URL_VAR)?)?;
        let notify_timeout = match optional("NOTIFY_TIMEOUT_SECS") {
            Some(raw) => raw.trim().parse().map_err(|_| {
                BridgeError::Config("NOTIFY_TIMEOUT_SECS must be a whole number of seconds".to_string())
            })?,
            None => DEFAULT_NOTIFY_TIMEOUT_SECS,
        };

        Ok(Self {
            zulip_email: required(ZULIP_EMAIL_VAR)?,
            zulip_api_key: required(ZULIP_API_KEY_VAR)?,
            zulip_base_url: or_default("ZULIP_API_URL", zulip_client::DEFAULT_BASE_URL),
            stream: or_default("ZULIP_STREAM", DEFAULT_STREAM),
            topic: or_default("ZULIP_TOPIC", DEFAULT_TOPIC),
            notify_timeout: Duration::from_secs(notify_timeout),
            pusher_ws_host: optional("PUSHER_WS_HOST").unwrap_or_else(|| pusher.ws_host()),
            pusher,
            channel: or_default("PUSHER_CHANNEL", DEFAULT_CHANNEL),
            event: or_default("PUSHER_EVENT", DEFAULT_EVENT),
        })
    }

    pub fn zulip_options(&self) -> ZulipOptions {
        ZulipOptions {
            base_url: self.zulip_base_url.clone(),
            email: self.zulip_email.clone(),
            api_key: self.zulip_api_key.clone(),
            timeout: self.notify_timeout,
        }
    }

    pub fn pusher_options(&self) -> PusherOptions {
        let mut options =
            PusherOptions::new(self.pusher.key.clone()).with_secret(self.pusher.secret.clone());
        options.host = self.pusher_ws_host.clone();
        options
    }

    pub fn log_summary(&self) {
        fn preview(val: &str) -> String {
            let n: usize = val.chars().take(5).map(char::len_utf8).sum();
            format!("{}...({} chars)", &val[..n], val.chars().count())
        }

        tracing::info!("Config loaded:");
        tracing::info!("  {ZULIP_EMAIL_VAR}: {}", self.zulip_email);
        tracing::info!("  {ZULIP_API_KEY_VAR}: {}", preview(&self.zulip_api_key));
        tracing::info!("  ZULIP_API_URL: {}", self.zulip_base_url);
        tracing::info!("  destination: {} > {}", self.stream, self.topic);
        tracing::info!("  pusher app {} key {}", self.pusher.app_id, self.pusher.key);
        tracing::info!("  pusher secret: {}", preview(&self.pusher.secret));
        tracing::info!("  listening: {} / {} via {}", self.channel, self.event, self.pusher_ws_host);
    }
}
