//! Client configuration
//!
//! # Environment variables
//!
//! | Variable | Default | Meaning |
//! |----------|---------|---------|
//! | HARVEST_API_URL | http://localhost:8001/api | REST base URL |
//! | HARVEST_SOCKET_URL | derived from the API host | realtime endpoint |
//! | HARVEST_REQUEST_TIMEOUT_SECS | 30 | HTTP timeout |
//! | HARVEST_TOKEN_PATH | unset (memory store) | durable token file |
//! | HARVEST_RECONNECT_DELAY_MS | 1000 | fixed reconnect delay |
//! | HARVEST_RECONNECT_ATTEMPTS | 5 | reconnect attempts after a drop |
//! | HARVEST_ORDER_IDEMPOTENCY | false | send `Idempotency-Key` on order creation |

use std::path::PathBuf;
use std::str::FromStr;
use std::time::Duration;

use crate::session::{FileTokenStore, MemoryTokenStore, SessionContext, TokenStore};
use crate::{ClientError, ClientResult, HttpClient};

const DEFAULT_API_URL: &str = "http://localhost:8001/api";

/// Realtime channel reconnection policy
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NotificationConfig {
    /// Fixed delay between reconnection attempts
    pub reconnect_delay: Duration,
    /// Attempts after a dropped or failed connection before giving up
    pub max_reconnect_attempts: u32,
}

impl Default for NotificationConfig {
    fn default() -> Self {
        Self {
            reconnect_delay: Duration::from_millis(1000),
            max_reconnect_attempts: 5,
        }
    }
}

/// Checkout behaviour
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CheckoutConfig {
    /// Attach the payment transaction id as `Idempotency-Key` on order creation
    pub idempotency_key: bool,
}

/// Client configuration for connecting to the marketplace service
#[derive(Debug, Clone)]
pub struct ClientConfig {
    /// REST base URL, including the `/api` prefix
    pub base_url: String,

    /// Realtime endpoint; derived from `base_url` when unset
    pub socket_url: Option<String>,

    /// Request timeout in seconds
    pub timeout: u64,

    /// Durable token location; memory only when unset
    pub token_path: Option<PathBuf>,

    pub notification: NotificationConfig,

    pub checkout: CheckoutConfig,
}

impl ClientConfig {
    /// Create a new client configuration
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into(),
            socket_url: None,
            timeout: 30,
            token_path: None,
            notification: NotificationConfig::default(),
            checkout: CheckoutConfig::default(),
        }
    }

    /// Load configuration from environment variables (and `.env` if present)
    pub fn from_env() -> Self {
        let _ = dotenv::dotenv();

        let defaults = NotificationConfig::default();
        Self {
            base_url: std::env::var("HARVEST_API_URL").unwrap_or_else(|_| DEFAULT_API_URL.into()),
            socket_url: std::env::var("HARVEST_SOCKET_URL").ok(),
            timeout: env_parse("HARVEST_REQUEST_TIMEOUT_SECS").unwrap_or(30),
            token_path: std::env::var("HARVEST_TOKEN_PATH").ok().map(PathBuf::from),
            notification: NotificationConfig {
                reconnect_delay: env_parse("HARVEST_RECONNECT_DELAY_MS")
                    .map(Duration::from_millis)
                    .unwrap_or(defaults.reconnect_delay),
                max_reconnect_attempts: env_parse("HARVEST_RECONNECT_ATTEMPTS")
                    .unwrap_or(defaults.max_reconnect_attempts),
            },
            checkout: CheckoutConfig {
                idempotency_key: env_parse("HARVEST_ORDER_IDEMPOTENCY").unwrap_or(false),
            },
        }
    }

    /// Set the realtime endpoint
    pub fn with_socket_url(mut self, url: impl Into<String>) -> Self {
        self.socket_url = Some(url.into());
        self
    }

    /// Set the request timeout
    pub fn with_timeout(mut self, seconds: u64) -> Self {
        self.timeout = seconds;
        self
    }

    /// Persist the bearer token at `path`
    pub fn with_token_path(mut self, path: impl Into<PathBuf>) -> Self {
        self.token_path = Some(path.into());
        self
    }

    /// Set the reconnection policy
    pub fn with_reconnect(mut self, delay: Duration, max_attempts: u32) -> Self {
        self.notification = NotificationConfig {
            reconnect_delay: delay,
            max_reconnect_attempts: max_attempts,
        };
        self
    }

    /// Enable or disable the order idempotency key
    pub fn with_idempotency_key(mut self, enabled: bool) -> Self {
        self.checkout.idempotency_key = enabled;
        self
    }

    /// WebSocket endpoint of the realtime channel
    ///
    /// `http://host:8001/api` becomes `ws://host:8001/socket.io/?EIO=4&transport=websocket`.
    pub fn resolved_socket_url(&self) -> ClientResult<String> {
        if let Some(url) = &self.socket_url {
            return Ok(url.clone());
        }
        let base = self.base_url.trim_end_matches('/');
        let (scheme, rest) = if let Some(rest) = base.strip_prefix("https://") {
            ("wss", rest)
        } else if let Some(rest) = base.strip_prefix("http://") {
            ("ws", rest)
        } else {
            return Err(ClientError::Config(format!(
                "Cannot derive socket URL from '{}'",
                self.base_url
            )));
        };
        let host = rest.split('/').next().unwrap_or(rest);
        if host.is_empty() {
            return Err(ClientError::Config(format!(
                "Missing host in '{}'",
                self.base_url
            )));
        }
        Ok(format!(
            "{}://{}/socket.io/?EIO=4&transport=websocket",
            scheme, host
        ))
    }

    /// Token store selected by `token_path`
    pub fn token_store(&self) -> Box<dyn TokenStore> {
        match &self.token_path {
            Some(path) => Box::new(FileTokenStore::new(path.clone())),
            None => Box::new(MemoryTokenStore::default()),
        }
    }

    /// Create a session backed by the configured token store
    pub fn build_session(&self) -> SessionContext {
        SessionContext::new(self.token_store())
    }

    /// Create an HTTP client from this configuration
    pub fn build_http_client(&self, session: SessionContext) -> ClientResult<HttpClient> {
        HttpClient::new(self, session)
    }
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self::new(DEFAULT_API_URL)
    }
}

fn env_parse<T: FromStr>(key: &str) -> Option<T> {
    std::env::var(key).ok().and_then(|v| v.trim().parse().ok())
}
