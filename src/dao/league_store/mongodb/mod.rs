mod config;
mod connection;
mod error;
mod models;
mod store;

pub use config::MongoConfig;
pub use error::MongoDaoError;
pub use store::MongoLeagueStore;

use crate::dao::storage::StorageError;

impl From<MongoDaoError> for StorageError {
    fn from(err: MongoDaoError) -> Self {
        if err.is_transient() {
            StorageError::transient(err.to_string(), err)
        } else {
            StorageError::permanent(err.to_string(), err)
        }
    }
}
