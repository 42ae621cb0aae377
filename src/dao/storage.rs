use std::error::Error;
use thiserror::Error;

/// Result alias for storage operations.
pub type StorageResult<T> = Result<T, StorageError>;

/// Error raised by storage backends regardless of the underlying database.
///
/// Backends classify their own failures; only [`StorageError::Transient`] is retried.
#[derive(Debug, Error)]
pub enum StorageError {
    /// Network hiccup, timeout, rate limit or similar: worth retrying.
    #[error("storage temporarily unavailable: {message}")]
    Transient {
        /// What was being attempted.
        message: String,
        /// Backend error.
        #[source]
        source: Box<dyn Error + Send + Sync>,
    },
    /// Rejected request, undecodable payload, misconfiguration: retrying will not help.
    #[error("storage rejected the operation: {message}")]
    Permanent {
        /// What was being attempted.
        message: String,
        /// Backend error.
        #[source]
        source: Box<dyn Error + Send + Sync>,
    },
    /// The addressed record does not exist.
    #[error("{kind} `{id}` not found in storage")]
    NotFound {
        /// Kind of record looked up.
        kind: &'static str,
        /// Identifier that matched nothing.
        id: String,
    },
}

impl StorageError {
    /// Construct a transient error from any backend failure.
    pub fn transient(message: String, source: impl Error + Send + Sync + 'static) -> Self {
        StorageError::Transient {
            message,
            source: Box::new(source),
        }
    }

    /// Construct a permanent error from any backend failure.
    pub fn permanent(message: String, source: impl Error + Send + Sync + 'static) -> Self {
        StorageError::Permanent {
            message,
            source: Box::new(source),
        }
    }

    /// Whether the failure may succeed on a later attempt.
    pub fn is_transient(&self) -> bool {
        matches!(self, StorageError::Transient { .. })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io;

    #[test]
    fn only_transient_errors_are_retryable() {
        let transient = StorageError::transient(
            "timeout".into(),
            io::Error::new(io::ErrorKind::TimedOut, "timed out"),
        );
        let permanent = StorageError::permanent(
            "bad request".into(),
            io::Error::new(io::ErrorKind::InvalidData, "bad"),
        );
        let missing = StorageError::NotFound {
            kind: "fixture",
            id: "F1".into(),
        };

        assert!(transient.is_transient());
        assert!(!permanent.is_transient());
        assert!(!missing.is_transient());
        assert_eq!(missing.to_string(), "fixture `F1` not found in storage");
    }
}
