use thiserror::Error;

#[derive(Error, Debug)]
pub enum DomainError {
    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Validation error: {0}")]
    Validation(String),

    #[error("Internal error: {0}")]
    Internal(String),

    #[error("External service error: {0}")]
    ExternalService(String),

    #[error("Timeout: {0}")]
    Timeout(String),

    /// The critic still had objections when the round cap was hit.
    #[error("Did not converge after {rounds} critique rounds: {critique}")]
    NotConverged {
        rounds: usize,
        critique: String,
        artifact: String,
    },
}

impl DomainError {
    pub fn not_found(msg: impl Into<String>) -> Self {
        Self::NotFound(msg.into())
    }

    pub fn validation(msg: impl Into<String>) -> Self {
        Self::Validation(msg.into())
    }

    pub fn internal(msg: impl Into<String>) -> Self {
        Self::Internal(msg.into())
    }

    pub fn external(msg: impl Into<String>) -> Self {
        Self::ExternalService(msg.into())
    }

    pub fn timeout(msg: impl Into<String>) -> Self {
        Self::Timeout(msg.into())
    }

    /// Upstream failures are worth another attempt; bad model output and
    /// local errors are not.
    pub fn is_retryable(&self) -> bool {
        matches!(self, Self::ExternalService(_) | Self::Timeout(_))
    }
}

pub type Result<T> = std::result::Result<T, DomainError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_only_upstream_errors_are_retryable() {
        assert!(DomainError::external("503").is_retryable());
        assert!(DomainError::timeout("slow").is_retryable());
        assert!(!DomainError::validation("missing field").is_retryable());
        assert!(!DomainError::internal("poisoned").is_retryable());
    }

    #[test]
    fn test_not_converged_message() {
        let err = DomainError::NotConverged {
            rounds: 3,
            critique: "too long".into(),
            artifact: "draft".into(),
        };
        assert_eq!(
            err.to_string(),
            "Did not converge after 3 critique rounds: too long"
        );
    }
}
