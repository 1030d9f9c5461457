//! Error types for the navigation engine

use thiserror::Error;

/// Errors raised while fetching a resource
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum FetchError {
    /// The path could not be resolved into a request URL
    #[error("invalid url: {0}")]
    InvalidUrl(String),
    /// The request never produced a response
    #[error("request for {url} failed: {reason}")]
    Transport { url: String, reason: String },
    /// The server answered with a non-success status
    #[error("unexpected status {status} for {url}")]
    Status { status: u16, url: String },
}

/// Errors raised while loading a hinted resource
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum HintError {
    /// The hinted resource failed to load
    #[error("failed to load hinted resource {url}: {reason}")]
    Load { url: String, reason: String },
}

/// Main error type for navigation operations
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum NavError {
    /// Fetching the target page failed
    #[error("navigation fetch failed: {0}")]
    Fetch(#[from] FetchError),
    /// The fetched body could not be parsed into a document
    #[error("could not parse fetched page: {0}")]
    Parse(String),
}

/// Convenience Result type for navigation operations
pub type Result<T, E = NavError> = std::result::Result<T, E>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fetch_error_display() {
        let err = FetchError::Status {
            status: 404,
            url: "/missing.html".to_string(),
        };
        assert_eq!(err.to_string(), "unexpected status 404 for /missing.html");
    }

    #[test]
    fn test_fetch_error_converts_to_nav_error() {
        let err: NavError = FetchError::InvalidUrl("::bad::".to_string()).into();
        assert!(matches!(err, NavError::Fetch(FetchError::InvalidUrl(_))));
    }

    #[test]
    fn test_hint_error_display() {
        let err = HintError::Load {
            url: "https://cdn.jsdelivr.net/lib.js".to_string(),
            reason: "timed out".to_string(),
        };
        assert!(err.to_string().contains("cdn.jsdelivr.net"));
        assert!(err.to_string().contains("timed out"));
    }
}
