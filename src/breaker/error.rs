//! Errors returned by [`Breaker::execute`](super::Breaker::execute).

use thiserror::Error;

/// Message carried by [`BreakerError::Recovering`].
pub const RECOVERING_MESSAGE: &str = "circuit half open. trying to recover";

/// Outcome of a rejected or failed call.
#[derive(Debug, Error)]
pub enum BreakerError<E> {
    /// The wrapped operation ran and failed; its error is passed through untouched.
    #[error(transparent)]
    Operation(E),

    /// The breaker is half open and a recovery probe owns the operation.
    #[error("circuit half open. trying to recover")]
    Recovering { name: String },

    /// Recovery was exhausted. Only `reset()` lets calls through again.
    #[error("{name} circuit breaker open")]
    Open { name: String },
}

impl<E> BreakerError<E> {
    /// True when the breaker refused to run the operation.
    pub fn is_rejected(&self) -> bool {
        !matches!(self, BreakerError::Operation(_))
    }

    /// Borrow the operation error, if this is one.
    pub fn operation(&self) -> Option<&E> {
        match self {
            BreakerError::Operation(e) => Some(e),
            _ => None,
        }
    }

    /// Take the operation error, if this is one.
    pub fn into_operation(self) -> Option<E> {
        match self {
            BreakerError::Operation(e) => Some(e),
            _ => None,
        }
    }

    /// Name of the breaker that rejected the call.
    pub fn breaker_name(&self) -> Option<&str> {
        match self {
            BreakerError::Recovering { name } | BreakerError::Open { name } => Some(name),
            BreakerError::Operation(_) => None,
        }
    }
}

/// Result type for breaker-protected calls.
pub type BreakerResult<T, E> = Result<T, BreakerError<E>>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err: BreakerError<std::io::Error> = BreakerError::Open { name: "test".into() };
        assert_eq!(err.to_string(), "test circuit breaker open");

        let err: BreakerError<std::io::Error> = BreakerError::Recovering { name: "test".into() };
        assert_eq!(err.to_string(), RECOVERING_MESSAGE);
        assert_eq!(err.breaker_name(), Some("test"));
    }

    #[test]
    fn test_operation_error_is_transparent() {
        let err: BreakerError<std::io::Error> =
            BreakerError::Operation(std::io::Error::other("i like to fail"));
        assert_eq!(err.to_string(), "i like to fail");
        assert!(!err.is_rejected());
        assert_eq!(err.into_operation().map(|e| e.to_string()).as_deref(), Some("i like to fail"));
    }
}
