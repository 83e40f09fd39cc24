//! Bench supply configuration.

use std::time::Duration;

use serde::Deserialize;

/// Settings shared by every line-protocol bench supply.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct LineTcpConfig {
    /// Bound on connecting, sending a command and waiting for its reply, in
    /// milliseconds.
    pub timeout_ms: u64,
    /// Pause after every set command, in milliseconds. The instrument sends
    /// no acknowledgement and needs time to apply the change.
    pub settle_ms: u64,
}

impl LineTcpConfig {
    #[must_use]
    pub fn timeout(&self) -> Duration {
        Duration::from_millis(self.timeout_ms)
    }

    #[must_use]
    pub fn settle(&self) -> Duration {
        Duration::from_millis(self.settle_ms)
    }
}

impl Default for LineTcpConfig {
    fn default() -> Self {
        Self {
            timeout_ms: 3000,
            settle_ms: 1000,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn should_have_sensible_defaults() {
        let config = LineTcpConfig::default();
        assert_eq!(config.timeout(), Duration::from_secs(3));
        assert_eq!(config.settle(), Duration::from_secs(1));
    }

    #[test]
    fn should_use_defaults_for_missing_fields() {
        let config: LineTcpConfig = toml::from_str("settle_ms = 0").unwrap();
        assert_eq!(config.settle(), Duration::ZERO);
        assert_eq!(config.timeout_ms, 3000);
    }
}
