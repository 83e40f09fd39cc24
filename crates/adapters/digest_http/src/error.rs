//! Relay strip error types.

use labrack_domain::error::{LabRackError, ParseError, ValidationError};

/// Errors specific to the digest-authenticated relay strip adapter.
#[derive(Debug, thiserror::Error)]
pub enum DigestHttpError {
    #[error("HTTP request failed")]
    Http(#[from] reqwest::Error),

    #[error("{path} answered HTTP {status}")]
    Status { path: String, status: u16 },

    /// A 401 without a usable `WWW-Authenticate` digest challenge.
    #[error("digest challenge rejected: {0}")]
    Challenge(String),

    #[error("unexpected relay response")]
    Response(#[from] ParseError),

    #[error("invalid request")]
    Validation(#[from] ValidationError),
}

impl From<DigestHttpError> for LabRackError {
    fn from(err: DigestHttpError) -> Self {
        match err {
            DigestHttpError::Response(err) => LabRackError::Parse(err),
            DigestHttpError::Validation(err) => LabRackError::Validation(err),
            other => LabRackError::Connectivity(Box::new(other)),
        }
    }
}
