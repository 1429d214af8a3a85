//! Backend error taxonomy
//!
//! Every failure from the hosted platform surfaces through [`BackendError`].
//! No automatic retry happens at this layer; callers decide whether a failure
//! aborts the operation or falls back.

/// Errors from the hosted platform
#[derive(Debug, thiserror::Error)]
pub enum BackendError {
    /// Transport-level failure (connect, TLS, timeout)
    #[error("transport error: {0}")]
    Transport(#[from] reqwest::Error),

    /// Non-success response from the platform
    #[error("backend returned status {status}: {message}")]
    Status {
        /// HTTP status code
        status: u16,
        /// Response body or reason phrase
        message: String,
    },

    /// Record does not exist
    #[error("record not found: {0}")]
    NotFound(String),

    /// Sign-in rejected by the auth provider
    #[error("invalid credentials")]
    InvalidCredentials,

    /// Response body did not decode
    #[error("decode error: {0}")]
    Decode(#[from] serde_json::Error),

    /// Object-storage failure
    #[error("storage error: {0}")]
    Storage(String),

    /// The event-store query is unavailable (e.g. missing index)
    ///
    /// Callers with a local fallback are expected to survive this.
    #[error("query unavailable: {0}")]
    QueryUnavailable(String),
}

impl BackendError {
    /// Whether this error means the record was already gone
    ///
    /// Cascade steps treat this as success so a retried delete converges.
    #[inline]
    #[must_use]
    pub fn is_not_found(&self) -> bool {
        matches!(self, Self::NotFound(_))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn display_is_lowercase_and_contextual() {
        let err = BackendError::Status {
            status: 500,
            message: "boom".to_string(),
        };
        assert_eq!(err.to_string(), "backend returned status 500: boom");
        assert!(BackendError::NotFound("courses/x".to_string()).is_not_found());
        assert!(!BackendError::InvalidCredentials.is_not_found());
    }
}
