use std::sync::Arc;

use redb::{Database, ReadableTable};

use toner_core::{ConsumableId, Operation, OperationLedger, StorageError};

use crate::tables::{encode_history_key, HISTORY_TABLE, OPERATIONS_TABLE};
use crate::{db_err, decode};

/// redb implementation of OperationLedger.
///
/// Entries are written by `RedbConsumableStore`; this type only reads.
pub struct RedbOperationLedger {
    db: Arc<Database>,
}

impl RedbOperationLedger {
    pub fn new(db: Arc<Database>) -> Self {
        Self { db }
    }
}

impl OperationLedger for RedbOperationLedger {
    fn operations_for(&self, consumable: ConsumableId) -> Result<Vec<Operation>, StorageError> {
        let read_txn = self.db.begin_read().map_err(db_err)?;
        let history = read_txn.open_table(HISTORY_TABLE).map_err(db_err)?;
        let operations = read_txn.open_table(OPERATIONS_TABLE).map_err(db_err)?;

        let start = encode_history_key(consumable.as_bytes(), 0);
        let end = encode_history_key(consumable.as_bytes(), u64::MAX);

        let mut result = Vec::new();
        for entry in history
            .range(start.as_slice()..=end.as_slice())
            .map_err(db_err)?
        {
            let (_, sequence) = entry.map_err(db_err)?;
            if let Some(value) = operations.get(sequence.value()).map_err(db_err)? {
                result.push(decode(value.value())?);
            }
        }
        Ok(result)
    }

    fn recent(&self, limit: usize) -> Result<Vec<Operation>, StorageError> {
        let read_txn = self.db.begin_read().map_err(db_err)?;
        let table = read_txn.open_table(OPERATIONS_TABLE).map_err(db_err)?;

        let mut result = Vec::new();
        for entry in table.iter().map_err(db_err)?.rev().take(limit) {
            let (_, value) = entry.map_err(db_err)?;
            result.push(decode(value.value())?);
        }
        Ok(result)
    }

    fn all_operations(&self) -> Result<Vec<Operation>, StorageError> {
        let read_txn = self.db.begin_read().map_err(db_err)?;
        let table = read_txn.open_table(OPERATIONS_TABLE).map_err(db_err)?;

        let mut result = Vec::new();
        for entry in table.iter().map_err(db_err)? {
            let (_, value) = entry.map_err(db_err)?;
            result.push(decode(value.value())?);
        }
        Ok(result)
    }
}
