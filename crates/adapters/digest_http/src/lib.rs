//! # labrack-adapter-digest-http
//!
//! Relay strip adapter for Brennenstuhl Premium-Web-Line style strips.
//!
//! The strip exposes one CGI endpoint per command, all behind HTTP digest
//! authentication:
//!
//! | Request | Response |
//! |---------|----------|
//! | `GET /cgi/relaySt?Rel=<n>` | `on` or `off` |
//! | `GET /cgi/toggleRelay?Rel=<n>` | relay flipped |
//!
//! There is no absolute "set" command, so a relay is only toggled after
//! reading that it differs from the desired state.
//!
//! ## Dependency rule
//! Depends on `labrack-app` and `labrack-domain`.

pub mod config;
pub mod error;

mod digest;
#[cfg(test)]
mod testing;

use labrack_app::ports::ChannelAdapter;
use labrack_domain::channel::{ChannelRange, ChannelState, PowerState};
use labrack_domain::endpoint::{Credentials, DeviceEndpoint};
use labrack_domain::error::{LabRackError, ParseError};

pub use config::DigestHttpConfig;
pub use error::DigestHttpError;

use crate::digest::DigestClient;

/// One digest-authenticated relay strip.
pub struct WebLine {
    endpoint: DeviceEndpoint,
    relays: ChannelRange,
    client: DigestClient,
}

impl WebLine {
    /// # Errors
    ///
    /// Returns [`DigestHttpError::Http`] when the HTTP client cannot be built.
    pub fn new(endpoint: DeviceEndpoint, config: &DigestHttpConfig) -> Result<Self, DigestHttpError> {
        let credentials = endpoint.credentials().cloned().unwrap_or_else(|| {
            Credentials::new(
                config.default_user.clone(),
                config.default_password.clone(),
            )
        });
        let http = reqwest::Client::builder()
            .timeout(config.request_timeout())
            .build()?;

        Ok(Self {
            client: DigestClient::new(http, endpoint.base_url(), credentials),
            relays: config.relays,
            endpoint,
        })
    }

    #[must_use]
    pub fn endpoint(&self) -> &DeviceEndpoint {
        &self.endpoint
    }

    /// Read one relay.
    ///
    /// # Errors
    ///
    /// Returns [`DigestHttpError::Response`] when the body is neither `on`
    /// nor `off`, or a transport error when the strip is unreachable.
    #[tracing::instrument(skip(self), fields(device = %self.endpoint.name()))]
    pub async fn relay_state(&mut self, relay: u8) -> Result<ChannelState, DigestHttpError> {
        self.relays.check(relay)?;
        let body = self.client.get(&format!("/cgi/relaySt?Rel={relay}")).await?;
        match body.trim() {
            "on" => Ok(ChannelState::On),
            "off" => Ok(ChannelState::Off),
            other => {
                tracing::error!(relay, %body, "unexpected relay state");
                Err(ParseError::UnexpectedToken {
                    token: other.to_string(),
                }
                .into())
            }
        }
    }

    /// Flip one relay, whatever its current state.
    ///
    /// # Errors
    ///
    /// Returns a transport error when the strip is unreachable.
    #[tracing::instrument(skip(self), fields(device = %self.endpoint.name()))]
    pub async fn toggle(&mut self, relay: u8) -> Result<(), DigestHttpError> {
        self.relays.check(relay)?;
        self.client
            .get(&format!("/cgi/toggleRelay?Rel={relay}"))
            .await?;
        Ok(())
    }

    /// Move one relay to `desired`, toggling only if it is not there yet.
    ///
    /// Returns whether a toggle was sent.
    ///
    /// # Errors
    ///
    /// Same as [`relay_state`](Self::relay_state).
    pub async fn set_relay(
        &mut self,
        relay: u8,
        desired: PowerState,
    ) -> Result<bool, DigestHttpError> {
        if self.relay_state(relay).await?.matches(desired) {
            tracing::info!(
                device = self.endpoint.name(),
                relay,
                "relay already in that state ({desired})"
            );
            return Ok(false);
        }
        tracing::info!(device = self.endpoint.name(), relay, "turning relay {desired}");
        self.toggle(relay).await?;
        Ok(true)
    }
}

impl ChannelAdapter for WebLine {
    fn device_name(&self) -> &str {
        self.endpoint.name()
    }

    fn channels(&self) -> ChannelRange {
        self.relays
    }

    async fn read_state(&mut self, channel: u8) -> Result<ChannelState, LabRackError> {
        Ok(self.relay_state(channel).await?)
    }

    async fn write_state(&mut self, channel: u8, desired: PowerState) -> Result<(), LabRackError> {
        self.set_relay(channel, desired).await?;
        Ok(())
    }
}
