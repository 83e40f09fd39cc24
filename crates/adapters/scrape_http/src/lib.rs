//! # labrack-adapter-scrape-http
//!
//! Scraped-HTML socket strip adapter (Energenie EGPM2 family).
//!
//! The strip has no API: its state is scraped from the page it serves on
//! `/`, and sockets are switched by submitting the same form a browser
//! would. A session is opened by posting the password to `/login.html`.
//!
//! ## Responsibilities
//! - Log in lazily, and again after any failed or unreadable request
//! - Scrape socket states and the MAC address from the status page
//! - Keep the last good status; an unreadable page never overwrites it
//! - Implement [`ChannelAdapter`] for sockets `1..=4`
//!
//! ## Dependency rule
//! Depends on `labrack-app` and `labrack-domain`.

pub mod config;
pub mod error;
pub mod page;

#[cfg(test)]
mod testing;

use labrack_app::ports::ChannelAdapter;
use labrack_domain::channel::{ChannelRange, ChannelState, PowerState};
use labrack_domain::endpoint::DeviceEndpoint;
use labrack_domain::error::LabRackError;

pub use config::ScrapeHttpConfig;
pub use error::ScrapeHttpError;
pub use page::StripStatus;

/// Sockets of an EGPM2 strip.
pub const CHANNELS: ChannelRange = ChannelRange::fixed(1, 4);

const LOGIN_PATH: &str = "/login.html";
const STATUS_PATH: &str = "/";

/// One scraped-HTML socket strip.
pub struct Egpm2 {
    endpoint: DeviceEndpoint,
    password: String,
    client: reqwest::Client,
    logged_in: bool,
    last_status: Option<StripStatus>,
}

impl Egpm2 {
    /// Build the adapter. No request is made until the strip is first used.
    ///
    /// # Errors
    ///
    /// Returns [`ScrapeHttpError::Http`] when the HTTP client cannot be built.
    pub fn new(endpoint: DeviceEndpoint, config: &ScrapeHttpConfig) -> Result<Self, ScrapeHttpError> {
        let password = endpoint.credentials().map_or_else(
            || config.default_password.clone(),
            |credentials| credentials.password.clone(),
        );
        let client = reqwest::Client::builder()
            .timeout(config.request_timeout())
            .build()?;

        Ok(Self {
            endpoint,
            password,
            client,
            logged_in: false,
            last_status: None,
        })
    }

    #[must_use]
    pub fn endpoint(&self) -> &DeviceEndpoint {
        &self.endpoint
    }

    /// Status from the last readable page, if any.
    #[must_use]
    pub fn last_status(&self) -> Option<&StripStatus> {
        self.last_status.as_ref()
    }

    /// Open a session by posting the password to the login form.
    ///
    /// # Errors
    ///
    /// Returns [`ScrapeHttpError::Http`] or [`ScrapeHttpError::Status`] when
    /// the strip cannot be reached.
    #[tracing::instrument(skip(self), fields(device = %self.endpoint.name()))]
    pub async fn login(&mut self) -> Result<(), ScrapeHttpError> {
        self.logged_in = false;
        self.post(LOGIN_PATH, &[("pw", self.password.as_str())])
            .await?;
        self.logged_in = true;
        tracing::debug!("session opened");
        Ok(())
    }

    /// Fetch and scrape the status page.
    ///
    /// # Errors
    ///
    /// Returns [`ScrapeHttpError::Page`] when a marker is missing (the raw
    /// page is logged), or a transport error when the strip is unreachable.
    #[tracing::instrument(skip(self), fields(device = %self.endpoint.name()))]
    pub async fn status(&mut self) -> Result<StripStatus, ScrapeHttpError> {
        self.ensure_session().await?;
        let body = match self.get(STATUS_PATH).await {
            Ok(body) => body,
            Err(err) => {
                self.logged_in = false;
                return Err(err);
            }
        };

        match page::parse_status(&body) {
            Ok(status) => {
                self.last_status = Some(status.clone());
                Ok(status)
            }
            Err(err) => {
                tracing::error!(error = %err, %body, "status page unreadable");
                self.logged_in = false;
                Err(err.into())
            }
        }
    }

    /// Submit the switch form for one socket. The strip does not confirm.
    ///
    /// # Errors
    ///
    /// Returns [`ScrapeHttpError::Validation`] for a socket outside `1..=4`
    /// and a transport error when the strip is unreachable.
    #[tracing::instrument(skip(self), fields(device = %self.endpoint.name()))]
    pub async fn set_socket(
        &mut self,
        channel: u8,
        desired: PowerState,
    ) -> Result<(), ScrapeHttpError> {
        CHANNELS.check(channel)?;
        self.ensure_session().await?;

        let field = format!("cte{channel}");
        let value = desired.as_flag().to_string();
        if let Err(err) = self
            .post(STATUS_PATH, &[(field.as_str(), value.as_str())])
            .await
        {
            self.logged_in = false;
            return Err(err);
        }
        tracing::debug!(channel, "socket {desired} requested");
        Ok(())
    }

    async fn ensure_session(&mut self) -> Result<(), ScrapeHttpError> {
        if !self.logged_in {
            self.login().await?;
        }
        Ok(())
    }

    async fn get(&self, path: &'static str) -> Result<String, ScrapeHttpError> {
        let response = self
            .client
            .get(format!("{}{path}", self.endpoint.base_url()))
            .send()
            .await?;
        Ok(success(path, response)?.text().await?)
    }

    async fn post(
        &self,
        path: &'static str,
        form: &[(&str, &str)],
    ) -> Result<String, ScrapeHttpError> {
        let response = self
            .client
            .post(format!("{}{path}", self.endpoint.base_url()))
            .form(form)
            .send()
            .await?;
        Ok(success(path, response)?.text().await?)
    }
}

fn success(
    path: &'static str,
    response: reqwest::Response,
) -> Result<reqwest::Response, ScrapeHttpError> {
    let status = response.status();
    if status.is_success() {
        Ok(response)
    } else {
        tracing::warn!(path, status = status.as_u16(), "request rejected");
        Err(ScrapeHttpError::Status {
            path,
            status: status.as_u16(),
        })
    }
}

impl ChannelAdapter for Egpm2 {
    fn device_name(&self) -> &str {
        self.endpoint.name()
    }

    fn channels(&self) -> ChannelRange {
        CHANNELS
    }

    async fn read_state(&mut self, channel: u8) -> Result<ChannelState, LabRackError> {
        CHANNELS.check(channel)?;
        let status = self.status().await?;
        Ok(CHANNELS
            .offset(channel)
            .and_then(|offset| status.sockets.get(offset).copied())
            .unwrap_or_default())
    }

    async fn write_state(&mut self, channel: u8, desired: PowerState) -> Result<(), LabRackError> {
        Ok(self.set_socket(channel, desired).await?)
    }
}
