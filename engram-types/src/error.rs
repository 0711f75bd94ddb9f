//! Error types for all engram crates.
//!
//! Pure computations (view derivation, property enforcement, index
//! arithmetic) never fail; only the summarizer call, log backends, and
//! deserialization can produce errors.

use std::time::Duration;

/// Errors from LLM handle operations.
#[non_exhaustive]
#[derive(Debug, thiserror::Error)]
pub enum ProviderError {
    /// HTTP or network request failed.
    #[error("request failed: {0}")]
    RequestFailed(String),

    /// Provider rate-limited the request.
    #[error("rate limited")]
    RateLimited,

    /// Request timed out.
    #[error("timeout after {0:?}")]
    Timeout(Duration),

    /// Authentication/authorization failed.
    #[error("auth failed: {0}")]
    AuthFailed(String),

    /// Could not parse the provider's response.
    #[error("invalid response: {0}")]
    InvalidResponse(String),

    /// Catch-all for other errors.
    #[error("{0}")]
    Other(#[from] Box<dyn std::error::Error + Send + Sync>),
}

impl ProviderError {
    /// Whether retrying this request might succeed.
    #[must_use]
    pub fn is_retryable(&self) -> bool {
        matches!(
            self,
            ProviderError::RequestFailed(_)
                | ProviderError::RateLimited
                | ProviderError::Timeout(_)
        )
    }
}

/// Errors from condenser construction and summarization.
#[derive(Debug, thiserror::Error)]
pub enum CondenserError {
    /// Condenser configuration rejected at construction time.
    #[error("invalid condenser configuration: {0}")]
    InvalidConfig(String),

    /// The summarizer LLM failed or timed out. No condensation was
    /// produced; the triggering condition persists and the caller may
    /// retry.
    #[error("summarizer unavailable: {0}")]
    SummarizerUnavailable(#[source] ProviderError),
}

/// Errors from the event deserialization boundary.
#[derive(Debug, thiserror::Error)]
pub enum EventError {
    /// The input did not parse as a known event.
    #[error("malformed event: {0}")]
    Malformed(String),
}

/// Errors from event log backends.
#[non_exhaustive]
#[derive(Debug, thiserror::Error)]
pub enum LogError {
    /// I/O error from a persistent backend.
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    /// Serialization failed while writing an event.
    #[error("serialization error: {0}")]
    Serialization(String),

    /// Any other log backend error.
    #[error(transparent)]
    Other(Box<dyn std::error::Error + Send + Sync>),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn retryable_classification() {
        assert!(ProviderError::RateLimited.is_retryable());
        assert!(ProviderError::Timeout(Duration::from_secs(30)).is_retryable());
        assert!(!ProviderError::AuthFailed("bad key".into()).is_retryable());
    }

    #[test]
    fn condenser_error_display() {
        let err = CondenserError::InvalidConfig("keep_first too large".into());
        assert_eq!(
            err.to_string(),
            "invalid condenser configuration: keep_first too large"
        );
    }
}
