//! Common error types used across the workspace.
//!
//! Each layer defines its own typed errors and converts into [`LabRackError`]
//! via `From`. Adapters map transport failures to
//! [`LabRackError::Connectivity`] and malformed device payloads to
//! [`LabRackError::Parse`].

/// Top-level error crossing port boundaries.
#[derive(Debug, thiserror::Error)]
pub enum LabRackError {
    /// Input rejected before any network call was made.
    #[error("validation error")]
    Validation(#[from] ValidationError),

    /// The device could not be reached (socket, HTTP or timeout failure).
    #[error("device unreachable")]
    Connectivity(#[source] Box<dyn std::error::Error + Send + Sync>),

    /// The device answered, but not in the expected format.
    #[error("unexpected device response")]
    Parse(#[from] ParseError),
}

impl LabRackError {
    /// Whether this error means the device itself is unreachable, as opposed
    /// to a problem with one request.
    #[must_use]
    pub fn is_connectivity(&self) -> bool {
        matches!(self, Self::Connectivity(_))
    }
}

/// Domain invariant violations.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ValidationError {
    #[error("name must not be empty")]
    EmptyName,

    #[error("host must not be empty")]
    EmptyHost,

    #[error("port must be non-zero")]
    ZeroPort,

    #[error("channel {channel} is outside the supported range {first}..={last}")]
    ChannelOutOfRange { channel: u8, first: u8, last: u8 },

    #[error("channel range {first}..={last} is empty")]
    InvalidRange { first: u8, last: u8 },

    #[error("unknown device `{0}`")]
    UnknownDevice(String),

    #[error("at least one workday is required")]
    EmptyWorkdays,

    #[error("invalid time of day `{0}`, expected HH:MM")]
    InvalidTime(String),

    #[error("setpoint `{0}` must be a finite, non-negative number")]
    InvalidSetpoint(String),
}

/// A device payload that could not be interpreted.
///
/// The raw payload is not carried here; adapters log it at the point of
/// failure so it is available for diagnosis without bloating the error.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ParseError {
    #[error("marker `{marker}` not found in response")]
    MissingMarker { marker: &'static str },

    #[error("unexpected token `{token}` in response")]
    UnexpectedToken { token: String },
}
