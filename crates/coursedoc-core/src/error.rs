//! Console error taxonomy
//!
//! Four failure classes surface to the operator:
//! - authentication failure (bad credentials) — inline message, no retry
//! - authorization failure (authenticated but not staff) — forced sign-out
//! - backend read/write failure — operation aborted, message surfaced
//! - partial cascade failure — the aborted plan converges when rerun

use coursedoc_backend::BackendError;
use coursedoc_model::{DocumentId, ModelError};

/// Main console error type
#[derive(Debug, thiserror::Error)]
pub enum ConsoleError {
    /// Sign-in rejected by the auth provider
    #[error("invalid email or password")]
    InvalidCredentials,

    /// Authenticated, but the directory role does not permit console access
    ///
    /// The platform session has already been signed back out when this is
    /// returned.
    #[error("access denied: only teachers and admins may operate the console")]
    NotAuthorized,

    /// Authenticated, but no directory record matches the identity
    ///
    /// The platform session has already been signed back out.
    #[error("no directory record for {0}")]
    UnknownUser(String),

    /// Backend failure, surfaced with the underlying message
    #[error("backend error: {0}")]
    Backend(#[from] BackendError),

    /// Draft validation failure
    #[error(transparent)]
    Validation(#[from] ModelError),

    /// A cascade delete stopped partway
    ///
    /// The completed prefix stays deleted; rerunning the delete converges
    /// because every step treats an already-absent record as success.
    #[error("cascade delete aborted at {step} after {completed} steps; rerun to converge")]
    Cascade {
        /// Human-readable description of the failed step
        step: String,
        /// Steps completed before the failure
        completed: usize,
        /// Underlying backend failure
        #[source]
        source: BackendError,
    },

    /// Document is not in the lesson's embedded array
    #[error("document not found: {0}")]
    DocumentNotFound(DocumentId),

    /// Import failure
    #[error(transparent)]
    Import(#[from] ImportError),
}

impl ConsoleError {
    /// Whether retrying the same operation can converge
    ///
    /// Only cascade deletes are safe to rerun; everything else aborts.
    #[inline]
    #[must_use]
    pub fn is_retryable(&self) -> bool {
        matches!(self, Self::Cascade { .. })
    }
}

/// Legacy-import errors
#[derive(Debug, thiserror::Error)]
pub enum ImportError {
    /// The legacy collection is empty
    #[error("no legacy classes found")]
    NoClasses,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn cascade_is_the_only_retryable_error() {
        let cascade = ConsoleError::Cascade {
            step: "lesson courses/c/levels/l/lessons/s".to_string(),
            completed: 2,
            source: BackendError::Status {
                status: 503,
                message: "unavailable".to_string(),
            },
        };
        assert!(cascade.is_retryable());
        assert!(!ConsoleError::InvalidCredentials.is_retryable());
        assert!(!ConsoleError::NotAuthorized.is_retryable());
    }

    #[test]
    fn cascade_message_names_step_and_progress() {
        let err = ConsoleError::Cascade {
            step: "level courses/c/levels/l".to_string(),
            completed: 3,
            source: BackendError::Status {
                status: 500,
                message: "boom".to_string(),
            },
        };
        let msg = err.to_string();
        assert!(msg.contains("level courses/c/levels/l"));
        assert!(msg.contains("3 steps"));
    }
}
