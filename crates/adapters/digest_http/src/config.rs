//! Relay strip configuration.

use std::time::Duration;

use labrack_domain::channel::ChannelRange;
use serde::Deserialize;

/// Settings shared by every digest-authenticated relay strip.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct DigestHttpConfig {
    /// User for endpoints that carry no credentials.
    pub default_user: String,
    /// Password for endpoints that carry no credentials.
    pub default_password: String,
    /// Timeout of every HTTP request, in milliseconds.
    pub request_timeout_ms: u64,
    /// Relay indices exposed by the strip.
    pub relays: ChannelRange,
}

impl DigestHttpConfig {
    #[must_use]
    pub fn request_timeout(&self) -> Duration {
        Duration::from_millis(self.request_timeout_ms)
    }
}

impl Default for DigestHttpConfig {
    fn default() -> Self {
        Self {
            default_user: "admin".to_string(),
            default_password: "admin".to_string(),
            request_timeout_ms: 10_000,
            relays: ChannelRange::fixed(0, 1),
        }
    }
}
