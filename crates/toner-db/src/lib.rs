//! Toner DB - redb implementation of storage traits.

pub mod consumable_store;
pub mod ledger;
pub mod reference_store;
pub mod tables;

pub use consumable_store::RedbConsumableStore;
pub use ledger::RedbOperationLedger;
pub use reference_store::RedbReferenceStore;

use std::path::Path;
use std::sync::Arc;

use redb::Database;
use serde::{de::DeserializeOwned, Serialize};

use toner_core::StorageError;

/// Initialize a database with all required tables.
pub fn init_database(path: impl AsRef<Path>) -> Result<Arc<Database>, StorageError> {
    let db = Database::create(path).map_err(db_err)?;

    RedbReferenceStore::init_tables(&db)?;
    RedbConsumableStore::init_tables(&db)?;

    Ok(Arc::new(db))
}

pub(crate) fn db_err(e: impl std::fmt::Display) -> StorageError {
    StorageError::Database(e.to_string())
}

pub(crate) fn encode<T: Serialize>(value: &T) -> Result<Vec<u8>, StorageError> {
    serde_json::to_vec(value).map_err(db_err)
}

pub(crate) fn decode<T: DeserializeOwned>(bytes: &[u8]) -> Result<T, StorageError> {
    serde_json::from_slice(bytes).map_err(db_err)
}
