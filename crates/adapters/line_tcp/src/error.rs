//! Bench supply error types.

use labrack_domain::error::{LabRackError, ParseError, ValidationError};

/// Errors specific to the line-protocol bench supply adapter.
#[derive(Debug, thiserror::Error)]
pub enum LineTcpError {
    /// The instrument refused or did not accept the connection in time.
    #[error("could not connect to {addr}")]
    Connect {
        addr: String,
        #[source]
        source: std::io::Error,
    },

    /// The established connection failed.
    #[error("connection lost")]
    Io(#[from] std::io::Error),

    /// No reply (or no write progress) within the configured timeout.
    #[error("`{command}` timed out")]
    Timeout { command: String },

    /// The instrument closed the connection.
    #[error("connection closed by instrument")]
    Closed,

    #[error("unexpected reply")]
    Reply(#[from] ParseError),

    #[error("invalid command")]
    Validation(#[from] ValidationError),
}

impl LineTcpError {
    #[must_use]
    pub fn is_timeout(&self) -> bool {
        matches!(self, Self::Timeout { .. })
    }
}

impl From<LineTcpError> for LabRackError {
    fn from(err: LineTcpError) -> Self {
        match err {
            LineTcpError::Reply(err) => LabRackError::Parse(err),
            LineTcpError::Validation(err) => LabRackError::Validation(err),
            other => LabRackError::Connectivity(Box::new(other)),
        }
    }
}
