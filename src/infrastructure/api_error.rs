//! Error taxonomy for remote catalog access
//!
//! Classifies failures into retryable (transient network, unexpected
//! status) and terminal (absent resource, malformed payload) so the retry
//! executor can decide without string matching.

use thiserror::Error;

#[derive(Error, Debug)]
pub enum ApiError {
    /// The resource does not exist (HTTP 404). Terminal for that ID only.
    #[error("resource not found: {url}")]
    NotFound { url: String },

    /// Unexpected HTTP status other than 404.
    #[error("HTTP {status} from {url}")]
    Status { status: u16, url: String },

    /// Timeout, connection failure, or body read failure.
    #[error("request to {url} failed: {source}")]
    Network {
        url: String,
        #[source]
        source: reqwest::Error,
    },

    /// Response parsed but the expected structure is missing.
    #[error("malformed payload from {url}: {reason}")]
    Malformed { url: String, reason: String },
}

impl ApiError {
    /// Whether the retry executor should attempt this operation again.
    pub fn is_retryable(&self) -> bool {
        match self {
            Self::NotFound { .. } | Self::Malformed { .. } => false,
            Self::Status { .. } | Self::Network { .. } => true,
        }
    }

    pub fn malformed(url: &str, reason: &str) -> Self {
        Self::Malformed {
            url: url.to_string(),
            reason: reason.to_string(),
        }
    }
}

pub type ApiResult<T> = Result<T, ApiError>;
