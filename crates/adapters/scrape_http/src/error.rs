//! Scraped-HTML strip error types.

use labrack_domain::error::{LabRackError, ParseError, ValidationError};

/// Errors specific to the scraped-HTML strip adapter.
#[derive(Debug, thiserror::Error)]
pub enum ScrapeHttpError {
    /// The HTTP client could not be built or the request failed in transit.
    #[error("HTTP request failed")]
    Http(#[from] reqwest::Error),

    /// The strip answered with a non-success status.
    #[error("{path} answered HTTP {status}")]
    Status { path: &'static str, status: u16 },

    /// The status page did not contain the expected markers.
    #[error("unreadable status page")]
    Page(#[from] ParseError),

    /// The request was rejected before reaching the strip.
    #[error("invalid request")]
    Validation(#[from] ValidationError),
}

impl From<ScrapeHttpError> for LabRackError {
    fn from(err: ScrapeHttpError) -> Self {
        match err {
            ScrapeHttpError::Page(err) => LabRackError::Parse(err),
            ScrapeHttpError::Validation(err) => LabRackError::Validation(err),
            other => LabRackError::Connectivity(Box::new(other)),
        }
    }
}
