//! Scraped-HTML strip configuration.

use std::time::Duration;

use serde::Deserialize;

/// Settings shared by every scraped-HTML strip.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ScrapeHttpConfig {
    /// Password sent to the login form when the endpoint carries no
    /// credentials. The factory default of these strips is `1`.
    pub default_password: String,
    /// Timeout of every HTTP request, in milliseconds.
    pub request_timeout_ms: u64,
}

impl ScrapeHttpConfig {
    #[must_use]
    pub fn request_timeout(&self) -> Duration {
        Duration::from_millis(self.request_timeout_ms)
    }
}

impl Default for ScrapeHttpConfig {
    fn default() -> Self {
        Self {
            default_password: "1".to_string(),
            request_timeout_ms: 3000,
        }
    }
}
