mod config;
mod error;
mod models;
mod store;

pub use config::CouchConfig;
pub use error::CouchDaoError;
pub use store::CouchLeagueStore;

use crate::dao::storage::StorageError;

impl From<CouchDaoError> for StorageError {
    fn from(err: CouchDaoError) -> Self {
        if err.is_transient() {
            StorageError::transient(err.to_string(), err)
        } else {
            StorageError::permanent(err.to_string(), err)
        }
    }
}
