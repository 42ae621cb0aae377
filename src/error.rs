use axum::{Json, http::StatusCode, response::IntoResponse};
use serde::Serialize;
use thiserror::Error;
use validator::ValidationErrors;

use crate::{
    dao::{availability::AvailabilityError, fixtures::FixtureRepositoryError, storage::StorageError},
    state::lifecycle::InvalidTransition,
};

/// Errors that can occur in service layer operations.
#[derive(Debug, Error)]
pub enum ServiceError {
    /// Storage backend is unavailable.
    #[error("storage unavailable")]
    Unavailable(#[source] StorageError),
    /// Application is running in degraded mode without storage.
    #[error("storage unavailable (degraded mode)")]
    Degraded,
    /// Unauthorized access attempt.
    #[error("unauthorized: {0}")]
    Unauthorized(String),
    /// Invalid input provided by the client.
    #[error("invalid input: {0}")]
    InvalidInput(String),
    /// Operation cannot be performed in the current state.
    #[error("invalid state: {0}")]
    InvalidState(String),
    /// Requested resource was not found.
    #[error("not found: {0}")]
    NotFound(String),
    /// Concurrent writers kept changing the resource.
    #[error("conflict: {0}")]
    Conflict(String),
}

impl From<StorageError> for ServiceError {
    fn from(err: StorageError) -> Self {
        match err {
            StorageError::NotFound { kind, id } => ServiceError::NotFound(format!("{kind} `{id}`")),
            other => ServiceError::Unavailable(other),
        }
    }
}

impl From<InvalidTransition> for ServiceError {
    fn from(err: InvalidTransition) -> Self {
        ServiceError::InvalidState(err.to_string())
    }
}

impl From<FixtureRepositoryError> for ServiceError {
    fn from(err: FixtureRepositoryError) -> Self {
        match err {
            FixtureRepositoryError::Storage(source) => source.into(),
            FixtureRepositoryError::InvalidTransition(invalid) => invalid.into(),
            conflict @ FixtureRepositoryError::Conflict { .. } => {
                ServiceError::Conflict(conflict.to_string())
            }
        }
    }
}

impl From<AvailabilityError> for ServiceError {
    fn from(err: AvailabilityError) -> Self {
        match err {
            AvailabilityError::Storage(source) => source.into(),
            invalid => ServiceError::InvalidInput(invalid.to_string()),
        }
    }
}

impl From<ValidationErrors> for AppError {
    fn from(err: ValidationErrors) -> Self {
        AppError::BadRequest(format!("validation failed: {}", err))
    }
}

/// Application-level errors that are converted to HTTP responses.
#[derive(Debug, Error)]
pub enum AppError {
    /// Bad request with invalid input.
    #[error("bad request: {0}")]
    BadRequest(String),
    /// Unauthorized access attempt.
    #[error("unauthorized: {0}")]
    Unauthorized(String),
    /// Requested resource not found.
    #[error("not found: {0}")]
    NotFound(String),
    /// Conflict with current state.
    #[error("conflict: {0}")]
    Conflict(String),
    /// Service unavailable or degraded.
    #[error("service unavailable: {0}")]
    ServiceUnavailable(String),
    /// Internal server error.
    #[error("internal error: {0}")]
    Internal(String),
}

impl From<ServiceError> for AppError {
    fn from(err: ServiceError) -> Self {
        match err {
            ServiceError::Unavailable(StorageError::Permanent { message, .. }) => {
                AppError::Internal(message)
            }
            ServiceError::Unavailable(source) => {
                AppError::ServiceUnavailable(format!("{source}; retry in a moment"))
            }
            ServiceError::Degraded => {
                AppError::ServiceUnavailable("degraded mode; retry in a moment".into())
            }
            ServiceError::Unauthorized(message) => AppError::Unauthorized(message),
            ServiceError::InvalidInput(message) => AppError::BadRequest(message),
            ServiceError::InvalidState(message) => AppError::Conflict(message),
            ServiceError::NotFound(message) => AppError::NotFound(message),
            ServiceError::Conflict(message) => AppError::Conflict(message),
        }
    }
}

#[derive(Serialize)]
struct ErrorBody {
    message: String,
}

impl IntoResponse for AppError {
    fn into_response(self) -> axum::response::Response {
        let status = match &self {
            AppError::BadRequest(_) => StatusCode::BAD_REQUEST,
            AppError::Unauthorized(_) => StatusCode::UNAUTHORIZED,
            AppError::NotFound(_) => StatusCode::NOT_FOUND,
            AppError::Conflict(_) => StatusCode::CONFLICT,
            AppError::ServiceUnavailable(_) => StatusCode::SERVICE_UNAVAILABLE,
            AppError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        };

        let payload = Json(ErrorBody {
            message: self.to_string(),
        });

        (status, payload).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::state::{league::FixtureState, lifecycle::FixtureEvent};
    use std::io;

    fn status_of(err: ServiceError) -> StatusCode {
        AppError::from(err).into_response().status()
    }

    #[test]
    fn service_errors_map_to_statuses() {
        let transient = StorageError::transient(
            "timeout".into(),
            io::Error::new(io::ErrorKind::TimedOut, "timed out"),
        );
        let permanent = StorageError::permanent(
            "bad document".into(),
            io::Error::new(io::ErrorKind::InvalidData, "bad"),
        );
        let invalid = InvalidTransition {
            from: FixtureState::Pending,
            event: FixtureEvent::Cancel,
        };

        assert_eq!(status_of(transient.into()), StatusCode::SERVICE_UNAVAILABLE);
        assert_eq!(status_of(permanent.into()), StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(status_of(ServiceError::Degraded), StatusCode::SERVICE_UNAVAILABLE);
        assert_eq!(status_of(invalid.into()), StatusCode::CONFLICT);
        assert_eq!(
            status_of(ServiceError::InvalidInput("bad".into())),
            StatusCode::BAD_REQUEST
        );
        assert_eq!(
            status_of(ServiceError::Unauthorized("nope".into())),
            StatusCode::UNAUTHORIZED
        );
        assert_eq!(
            status_of(
                StorageError::NotFound {
                    kind: "fixture",
                    id: "F1".into()
                }
                .into()
            ),
            StatusCode::NOT_FOUND
        );
    }
}
