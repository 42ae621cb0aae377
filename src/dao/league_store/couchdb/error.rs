//! Error types of the CouchDB league store.

use reqwest::StatusCode;
use thiserror::Error;

/// Convenient result alias returning [`CouchDaoError`] failures.
pub type CouchResult<T> = Result<T, CouchDaoError>;

/// Failures that can occur while interacting with CouchDB.
#[derive(Debug, Error)]
pub enum CouchDaoError {
    /// Required environment variable is missing.
    #[error("missing CouchDB environment variable `{var}`")]
    MissingEnvVar {
        /// Variable name.
        var: &'static str,
    },
    /// Connection settings are present but unusable.
    #[error("invalid CouchDB configuration: {reason}")]
    InvalidConfig {
        /// What is wrong with the settings.
        reason: String,
    },
    /// Building the HTTP client failed (invalid TLS setup, etc).
    #[error("failed to build CouchDB client")]
    ClientBuilder {
        /// Underlying HTTP client error.
        #[source]
        source: reqwest::Error,
    },
    /// CouchDB returned an unexpected status code for a database operation.
    #[error("unexpected CouchDB database response status {status} for `{database}`")]
    DatabaseStatus {
        /// Database name.
        database: String,
        /// Status returned by CouchDB.
        status: StatusCode,
    },
    /// A request could not be sent or its response was cut short.
    #[error("failed to send CouchDB request to `{path}`")]
    RequestSend {
        /// Document path relative to the database.
        path: String,
        /// Underlying HTTP client error.
        #[source]
        source: reqwest::Error,
    },
    /// CouchDB returned an unexpected status code for a document endpoint.
    #[error("unexpected CouchDB response status {status} for `{path}`")]
    RequestStatus {
        /// Document path relative to the database.
        path: String,
        /// Status returned by CouchDB.
        status: StatusCode,
    },
    /// Response payload could not be parsed into JSON.
    #[error("failed to decode CouchDB response for `{path}`")]
    DecodeResponse {
        /// Document path relative to the database.
        path: String,
        /// Underlying HTTP client error.
        #[source]
        source: reqwest::Error,
    },
    /// Decoding a JSON value into the expected model failed.
    #[error("failed to deserialize CouchDB value for `{path}`")]
    DeserializeValue {
        /// Document path relative to the database.
        path: String,
        /// Underlying JSON error.
        #[source]
        source: serde_json::Error,
    },
    /// A document kept changing under concurrent writers.
    #[error("CouchDB document `{path}` kept conflicting after {attempts} attempt(s)")]
    PersistentConflict {
        /// Document path relative to the database.
        path: String,
        /// Writes attempted before giving up.
        attempts: u32,
    },
}

impl CouchDaoError {
    /// Connection problems, timeouts, rate limits and server errors.
    pub fn is_transient(&self) -> bool {
        match self {
            CouchDaoError::RequestSend { source, .. } => {
                source.is_connect() || source.is_timeout() || source.is_request()
            }
            CouchDaoError::DecodeResponse { source, .. } => source.is_body() || source.is_timeout(),
            CouchDaoError::RequestStatus { status, .. }
            | CouchDaoError::DatabaseStatus { status, .. } => is_transient_status(*status),
            CouchDaoError::PersistentConflict { .. } => true,
            CouchDaoError::MissingEnvVar { .. }
            | CouchDaoError::InvalidConfig { .. }
            | CouchDaoError::ClientBuilder { .. }
            | CouchDaoError::DeserializeValue { .. } => false,
        }
    }
}

fn is_transient_status(status: StatusCode) -> bool {
    status == StatusCode::TOO_MANY_REQUESTS
        || status == StatusCode::REQUEST_TIMEOUT
        || status.is_server_error()
}
