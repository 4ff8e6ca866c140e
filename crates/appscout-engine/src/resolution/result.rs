use thiserror::Error;

use crate::session::SessionError;

/// Errors surfaced to callers of the resolver.
#[derive(Debug, Clone, Error)]
pub enum ResolutionError {
    /// The element never became available.
    #[error("Failed to resolve '{description}' after {attempts} attempt(s): {last_error}")]
    ResolutionFailure {
        description: String,
        attempts: u32,
        last_error: String,
    },

    /// A derived wait condition never held.
    #[error("Condition not satisfied after {attempts} attempt(s)")]
    ConditionTimeout { attempts: u32 },

    #[error("Invalid argument: {0}")]
    InvalidArgument(String),

    /// The element resolved but acting on it failed.
    #[error("Interaction with '{description}' failed: {source}")]
    Interaction {
        description: String,
        #[source]
        source: SessionError,
    },
}

impl ResolutionError {
    pub fn code(&self) -> &'static str {
        match self {
            ResolutionError::ResolutionFailure { .. } => "RESOLUTION_FAILURE",
            ResolutionError::ConditionTimeout { .. } => "CONDITION_TIMEOUT",
            ResolutionError::InvalidArgument(_) => "INVALID_ARGUMENT",
            ResolutionError::Interaction { .. } => "INTERACTION_FAILED",
        }
    }
}

/// Outcome of a single failed resolution attempt.
#[derive(Debug, Clone, Error)]
pub enum AttemptError {
    #[error("element not found")]
    NotFound,

    #[error("element located but not visible")]
    NotVisible,

    #[error("timed out after {0} ms")]
    TimedOut(u64),

    #[error(transparent)]
    Session(#[from] SessionError),
}

impl AttemptError {
    /// Whether the retry driver should try again after this failure.
    pub fn is_retryable(&self) -> bool {
        match self {
            AttemptError::NotFound | AttemptError::NotVisible | AttemptError::TimedOut(_) => true,
            AttemptError::Session(e) => e.is_transient(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_failure_message_carries_description_and_cause() {
        let err = ResolutionError::ResolutionFailure {
            description: "Search box".into(),
            attempts: 3,
            last_error: AttemptError::NotFound.to_string(),
        };
        let msg = err.to_string();
        assert!(msg.contains("Search box"));
        assert!(msg.contains("element not found"));
        assert_eq!(err.code(), "RESOLUTION_FAILURE");
    }

    #[test]
    fn test_retryable_attempts() {
        assert!(AttemptError::NotFound.is_retryable());
        assert!(AttemptError::TimedOut(15000).is_retryable());
        assert!(AttemptError::Session(SessionError::Transport("eof".into())).is_retryable());
        assert!(!AttemptError::Session(SessionError::NotSupported("uiautomator".into())).is_retryable());
    }
}
