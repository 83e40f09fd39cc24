//! Device endpoint: where a device lives on the network and how to talk to it.
//!
//! Endpoints are built once from static configuration and never change for
//! the lifetime of the process.

use serde::{Deserialize, Serialize};

use crate::error::ValidationError;

/// Wire protocol family of a device.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum ProtocolKind {
    /// HTML status page plus form submissions (Energenie EGPM2 family).
    ScrapeHttp,
    /// Digest-authenticated CGI toggles (Brennenstuhl Web-Line family).
    DigestHttp,
    /// Line-oriented ASCII commands over a persistent TCP socket (TTi MX family).
    LineTcp,
}

impl ProtocolKind {
    /// Conventional port for the protocol family.
    #[must_use]
    pub fn default_port(self) -> u16 {
        match self {
            Self::ScrapeHttp | Self::DigestHttp => 80,
            Self::LineTcp => 9221,
        }
    }
}

impl std::fmt::Display for ProtocolKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::ScrapeHttp => f.write_str("scrape-http"),
            Self::DigestHttp => f.write_str("digest-http"),
            Self::LineTcp => f.write_str("line-tcp"),
        }
    }
}

/// User/password pair for devices that require authentication.
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Credentials {
    pub user: String,
    pub password: String,
}

impl Credentials {
    #[must_use]
    pub fn new(user: impl Into<String>, password: impl Into<String>) -> Self {
        Self {
            user: user.into(),
            password: password.into(),
        }
    }
}

impl std::fmt::Debug for Credentials {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Credentials")
            .field("user", &self.user)
            .field("password", &"***")
            .finish()
    }
}

/// Network address, protocol family and credentials of one device.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DeviceEndpoint {
    name: String,
    host: String,
    port: u16,
    protocol: ProtocolKind,
    credentials: Option<Credentials>,
}

impl DeviceEndpoint {
    /// Build an endpoint after validating its invariants.
    ///
    /// # Errors
    ///
    /// Returns [`ValidationError`] if the name or host is empty or the port
    /// is zero.
    pub fn new(
        name: impl Into<String>,
        host: impl Into<String>,
        port: u16,
        protocol: ProtocolKind,
        credentials: Option<Credentials>,
    ) -> Result<Self, ValidationError> {
        let name = name.into();
        let host = host.into();
        if name.trim().is_empty() {
            return Err(ValidationError::EmptyName);
        }
        if host.trim().is_empty() {
            return Err(ValidationError::EmptyHost);
        }
        if port == 0 {
            return Err(ValidationError::ZeroPort);
        }
        Ok(Self {
            name,
            host,
            port,
            protocol,
            credentials,
        })
    }

    /// Operator-facing name used in plans and logs.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    #[must_use]
    pub fn host(&self) -> &str {
        &self.host
    }

    #[must_use]
    pub fn port(&self) -> u16 {
        self.port
    }

    #[must_use]
    pub fn protocol(&self) -> ProtocolKind {
        self.protocol
    }

    #[must_use]
    pub fn credentials(&self) -> Option<&Credentials> {
        self.credentials.as_ref()
    }

    /// `http://host:port` for the HTTP-based families.
    #[must_use]
    pub fn base_url(&self) -> String {
        format!("http://{}:{}", self.host, self.port)
    }

    /// `host:port` for socket connections.
    #[must_use]
    pub fn socket_addr(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

impl std::fmt::Display for DeviceEndpoint {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{} ({} @ {})", self.name, self.protocol, self.socket_addr())
    }
}
