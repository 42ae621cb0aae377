use mongodb::error::{
    Error as MongoError, ErrorKind, RETRYABLE_WRITE_ERROR, TRANSIENT_TRANSACTION_ERROR,
};
use thiserror::Error;

/// Result alias of the MongoDB backend.
pub type MongoResult<T> = std::result::Result<T, MongoDaoError>;

/// Failures of the MongoDB league store.
#[derive(Debug, Error)]
pub enum MongoDaoError {
    /// Required environment variable is missing.
    #[error("missing MongoDB environment variable `{var}`")]
    MissingEnvVar {
        /// Variable name.
        var: &'static str,
    },
    /// The connection URI could not be parsed.
    #[error("failed to parse MongoDB connection URI `{uri}`")]
    InvalidUri {
        /// URI as configured.
        uri: String,
        /// Underlying driver error.
        #[source]
        source: MongoError,
    },
    /// The driver rejected the client options.
    #[error("failed to build MongoDB client from options")]
    ClientConstruction {
        /// Underlying driver error.
        #[source]
        source: MongoError,
    },
    /// The server never answered while connecting.
    #[error("MongoDB ping failed during initial connection after {attempts} attempt(s)")]
    InitialPing {
        /// Pings attempted.
        attempts: u32,
        /// Underlying driver error.
        #[source]
        source: MongoError,
    },
    /// A health ping failed.
    #[error("MongoDB ping health check failed")]
    HealthPing {
        /// Underlying driver error.
        #[source]
        source: MongoError,
    },
    /// Creating a unique index failed.
    #[error("failed to ensure index `{index}` on collection `{collection}`")]
    EnsureIndex {
        /// Collection involved.
        collection: &'static str,
        /// Index name.
        index: &'static str,
        /// Underlying driver error.
        #[source]
        source: MongoError,
    },
    /// A query failed.
    #[error("failed to read collection `{collection}`")]
    Read {
        /// Collection involved.
        collection: &'static str,
        /// Underlying driver error.
        #[source]
        source: MongoError,
    },
    /// A write failed.
    #[error("failed to write to collection `{collection}`")]
    Write {
        /// Collection involved.
        collection: &'static str,
        /// Underlying driver error.
        #[source]
        source: MongoError,
    },
}

impl MongoDaoError {
    /// Network failures, server selection timeouts and errors the driver labels retryable.
    pub fn is_transient(&self) -> bool {
        match self {
            MongoDaoError::MissingEnvVar { .. }
            | MongoDaoError::InvalidUri { .. }
            | MongoDaoError::ClientConstruction { .. } => false,
            MongoDaoError::InitialPing { source, .. }
            | MongoDaoError::HealthPing { source }
            | MongoDaoError::EnsureIndex { source, .. }
            | MongoDaoError::Read { source, .. }
            | MongoDaoError::Write { source, .. } => is_transient_driver_error(source),
        }
    }
}

fn is_transient_driver_error(err: &MongoError) -> bool {
    matches!(
        *err.kind,
        ErrorKind::Io(_) | ErrorKind::ServerSelection { .. } | ErrorKind::ConnectionPoolCleared { .. }
    ) || err.contains_label(RETRYABLE_WRITE_ERROR)
        || err.contains_label(TRANSIENT_TRANSACTION_ERROR)
}
