use thiserror::Error;

/// Convenience alias used across all `ngon` crates.
pub type NgonResult<T> = Result<T, NgonError>;

/// Error taxonomy shared by every component.
///
/// The first five variants map 1:1 to the failure classes callers are
/// expected to handle differently: reject, 404, retry-later, degrade, and
/// refuse-to-start.
#[derive(Error, Debug)]
pub enum NgonError {
    /// Malformed or out-of-range request data. Never retried.
    #[error("invalid input: {0}")]
    InvalidInput(String),

    /// Unknown city or item identifier.
    #[error("not found: {0}")]
    NotFound(String),

    /// A per-city index or store is not loaded, or a dependency is down.
    #[error("service unavailable: {0}")]
    ServiceUnavailable(String),

    /// An external embedding/generative call exceeded its time budget.
    #[error("upstream timeout: {0}")]
    UpstreamTimeout(String),

    /// A required per-city artifact is missing or corrupt at load time.
    #[error("startup failure: {0}")]
    Startup(String),

    /// JSON (de)serialization error.
    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// Filesystem error.
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    /// HTTP transport error talking to an external service.
    #[error("http error: {0}")]
    Http(String),
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;

    #[test]
    fn test_display_includes_class() {
        let err = NgonError::NotFound("city xyz".to_string());
        assert_eq!(err.to_string(), "not found: city xyz");

        let err = NgonError::UpstreamTimeout("embed call".to_string());
        assert!(err.to_string().starts_with("upstream timeout"));
    }

    #[test]
    fn test_io_conversion() {
        let io = std::io::Error::new(std::io::ErrorKind::NotFound, "gone");
        let err: NgonError = io.into();
        assert!(matches!(err, NgonError::Io(_)));
    }
}
