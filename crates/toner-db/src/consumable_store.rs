use std::sync::Arc;

use redb::{Database, ReadableTable, WriteTransaction};

use toner_core::{
    ConflictError, Consumable, ConsumableId, ConsumableStore, NotFoundError, Operation,
    StorageError,
};

use crate::tables::{
    encode_history_key, CONSUMABLES_TABLE, CONSUMABLE_SERIALS_TABLE, COUNTERS_TABLE,
    HISTORY_TABLE, LEDGER_SEQUENCE, OPERATIONS_TABLE,
};
use crate::{db_err, decode, encode};

/// redb implementation of ConsumableStore.
///
/// Consumable rows and ledger entries share one database, so every write
/// runs in a single redb write transaction.
pub struct RedbConsumableStore {
    db: Arc<Database>,
}

impl RedbConsumableStore {
    pub fn new(db: Arc<Database>) -> Self {
        Self { db }
    }

    /// Initialize the database tables.
    pub fn init_tables(db: &Database) -> Result<(), StorageError> {
        let write_txn = db.begin_write().map_err(db_err)?;
        {
            let _ = write_txn.open_table(CONSUMABLES_TABLE).map_err(db_err)?;
            let _ = write_txn.open_table(CONSUMABLE_SERIALS_TABLE).map_err(db_err)?;
            let _ = write_txn.open_table(OPERATIONS_TABLE).map_err(db_err)?;
            let _ = write_txn.open_table(HISTORY_TABLE).map_err(db_err)?;
            let _ = write_txn.open_table(COUNTERS_TABLE).map_err(db_err)?;
        }
        write_txn.commit().map_err(db_err)?;
        Ok(())
    }

    /// Stored version of a consumable inside an open write transaction.
    fn stored_version(
        txn: &WriteTransaction,
        id: ConsumableId,
    ) -> Result<Option<u64>, StorageError> {
        let table = txn.open_table(CONSUMABLES_TABLE).map_err(db_err)?;
        let bytes = table
            .get(id.as_bytes().as_slice())
            .map_err(db_err)?
            .map(|v| v.value().to_vec());
        match bytes {
            Some(bytes) => Ok(Some(decode::<Consumable>(&bytes)?.version)),
            None => Ok(None),
        }
    }

    /// Write the consumable row and append its ledger entry.
    fn write_pair(
        txn: &WriteTransaction,
        consumable: &Consumable,
        mut operation: Operation,
    ) -> Result<Operation, StorageError> {
        let key = consumable.id.as_bytes();

        let sequence = {
            let mut counters = txn.open_table(COUNTERS_TABLE).map_err(db_err)?;
            let last = counters
                .get(LEDGER_SEQUENCE)
                .map_err(db_err)?
                .map(|v| v.value())
                .unwrap_or(0);
            counters.insert(LEDGER_SEQUENCE, last + 1).map_err(db_err)?;
            last + 1
        };
        operation.sequence = sequence;

        let op_bytes = encode(&operation)?;
        let row_bytes = encode(consumable)?;

        {
            let mut operations = txn.open_table(OPERATIONS_TABLE).map_err(db_err)?;
            operations
                .insert(sequence, op_bytes.as_slice())
                .map_err(db_err)?;
        }
        {
            let mut history = txn.open_table(HISTORY_TABLE).map_err(db_err)?;
            let history_key = encode_history_key(key, sequence);
            history
                .insert(history_key.as_slice(), sequence)
                .map_err(db_err)?;
        }
        {
            let mut consumables = txn.open_table(CONSUMABLES_TABLE).map_err(db_err)?;
            consumables
                .insert(key.as_slice(), row_bytes.as_slice())
                .map_err(db_err)?;
        }

        Ok(operation)
    }
}

impl ConsumableStore for RedbConsumableStore {
    fn get(&self, id: ConsumableId) -> Result<Option<Consumable>, StorageError> {
        let read_txn = self.db.begin_read().map_err(db_err)?;
        let table = read_txn.open_table(CONSUMABLES_TABLE).map_err(db_err)?;

        match table.get(id.as_bytes().as_slice()).map_err(db_err)? {
            Some(value) => Ok(Some(decode(value.value())?)),
            None => Ok(None),
        }
    }

    fn get_by_serial(&self, serial_number: &str) -> Result<Option<Consumable>, StorageError> {
        let read_txn = self.db.begin_read().map_err(db_err)?;
        let serials = read_txn
            .open_table(CONSUMABLE_SERIALS_TABLE)
            .map_err(db_err)?;
        let consumables = read_txn.open_table(CONSUMABLES_TABLE).map_err(db_err)?;

        let Some(id) = serials.get(serial_number).map_err(db_err)? else {
            return Ok(None);
        };
        match consumables.get(id.value()).map_err(db_err)? {
            Some(value) => Ok(Some(decode(value.value())?)),
            None => Ok(None),
        }
    }

    fn list(&self) -> Result<Vec<Consumable>, StorageError> {
        let read_txn = self.db.begin_read().map_err(db_err)?;
        let table = read_txn.open_table(CONSUMABLES_TABLE).map_err(db_err)?;

        let mut all: Vec<Consumable> = Vec::new();
        for entry in table.iter().map_err(db_err)? {
            let (_, value) = entry.map_err(db_err)?;
            all.push(decode(value.value())?);
        }
        all.sort_by(|a, b| {
            b.created_at
                .cmp(&a.created_at)
                .then_with(|| a.serial_number.cmp(&b.serial_number))
        });
        Ok(all)
    }

    fn create(
        &self,
        consumable: Consumable,
        receipt: Operation,
    ) -> Result<Operation, StorageError> {
        let write_txn = self.db.begin_write().map_err(db_err)?;

        let taken = {
            let serials = write_txn
                .open_table(CONSUMABLE_SERIALS_TABLE)
                .map_err(db_err)?;
            let found = serials
                .get(consumable.serial_number.as_str())
                .map_err(db_err)?;
            found.is_some()
        };
        if taken {
            write_txn.abort().map_err(db_err)?;
            return Err(StorageError::DuplicateSerial(consumable.serial_number));
        }

        {
            let mut serials = write_txn
                .open_table(CONSUMABLE_SERIALS_TABLE)
                .map_err(db_err)?;
            serials
                .insert(
                    consumable.serial_number.as_str(),
                    consumable.id.as_bytes().as_slice(),
                )
                .map_err(db_err)?;
        }
        let stored = Self::write_pair(&write_txn, &consumable, receipt)?;

        write_txn.commit().map_err(db_err)?;
        Ok(stored)
    }

    fn commit(
        &self,
        expected_version: u64,
        consumable: Consumable,
        operation: Operation,
    ) -> Result<Operation, StorageError> {
        let write_txn = self.db.begin_write().map_err(db_err)?;

        // Compare-and-swap on the version, nothing is written on mismatch
        let found = match Self::stored_version(&write_txn, consumable.id)? {
            Some(found) => found,
            None => {
                write_txn.abort().map_err(db_err)?;
                return Err(NotFoundError::Consumable(consumable.id).into());
            }
        };
        if found != expected_version {
            write_txn.abort().map_err(db_err)?;
            return Err(ConflictError {
                consumable: consumable.id,
                expected: expected_version,
                found,
            }
            .into());
        }

        let stored = Self::write_pair(&write_txn, &consumable, operation)?;
        write_txn.commit().map_err(db_err)?;
        Ok(stored)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::create_test_db;
    use crate::RedbOperationLedger;
    use chrono::{TimeZone, Utc};
    use toner_core::{
        ConsumableKind, LocationId, ModelId, NewConsumable, OperationLedger, OperationType,
        UserId,
    };

    fn make_consumable(serial: &str, location: LocationId) -> (Consumable, Operation) {
        let now = Utc.with_ymd_and_hms(2026, 3, 1, 9, 0, 0).unwrap();
        let new = NewConsumable::new(serial, ConsumableKind::Cartridge, ModelId::new(), location);
        let consumable = Consumable::from_new(new, now);
        let receipt = Operation::new(
            OperationType::Receipt,
            consumable.id,
            location,
            location,
            UserId::new("admin"),
            now,
        );
        (consumable, receipt)
    }

    #[test]
    fn test_create_and_lookup() {
        let (_dir, db) = create_test_db();
        let store = RedbConsumableStore::new(db);
        let (consumable, receipt) = make_consumable("CRT-001", LocationId::new());

        let stored = store.create(consumable.clone(), receipt).unwrap();
        assert_eq!(stored.sequence, 1);
        assert_eq!(store.get(consumable.id).unwrap(), Some(consumable.clone()));
        assert_eq!(
            store.get_by_serial("CRT-001").unwrap(),
            Some(consumable)
        );
        assert_eq!(store.get_by_serial("CRT-404").unwrap(), None);
    }

    #[test]
    fn test_create_rejects_duplicate_serial() {
        let (_dir, db) = create_test_db();
        let store = RedbConsumableStore::new(db.clone());
        let ledger = RedbOperationLedger::new(db);
        let loc = LocationId::new();

        let (first, receipt) = make_consumable("CRT-001", loc);
        store.create(first, receipt).unwrap();

        let (second, receipt) = make_consumable("CRT-001", loc);
        assert_eq!(
            store.create(second.clone(), receipt),
            Err(StorageError::DuplicateSerial("CRT-001".to_string()))
        );
        assert!(store.get(second.id).unwrap().is_none());
        assert_eq!(ledger.all_operations().unwrap().len(), 1);
    }

    #[test]
    fn test_commit_checks_version() {
        let (_dir, db) = create_test_db();
        let store = RedbConsumableStore::new(db.clone());
        let ledger = RedbOperationLedger::new(db);
        let loc = LocationId::new();
        let (consumable, receipt) = make_consumable("CRT-001", loc);
        store.create(consumable.clone(), receipt.clone()).unwrap();

        let mut next = consumable.clone();
        next.version = 1;
        let op = Operation::new(
            OperationType::Transfer,
            consumable.id,
            loc,
            LocationId::new(),
            UserId::new("admin"),
            receipt.timestamp,
        );

        let stale = store.commit(5, next.clone(), op.clone());
        assert_eq!(
            stale,
            Err(StorageError::Conflict(ConflictError {
                consumable: consumable.id,
                expected: 5,
                found: 0,
            }))
        );
        assert_eq!(store.get(consumable.id).unwrap().unwrap().version, 0);
        assert_eq!(ledger.all_operations().unwrap().len(), 1);

        let stored = store.commit(0, next, op).unwrap();
        assert_eq!(stored.sequence, 2);
        assert_eq!(store.get(consumable.id).unwrap().unwrap().version, 1);
    }

    #[test]
    fn test_commit_unknown_consumable() {
        let (_dir, db) = create_test_db();
        let store = RedbConsumableStore::new(db);
        let (consumable, receipt) = make_consumable("CRT-001", LocationId::new());

        assert_eq!(
            store.commit(0, consumable.clone(), receipt),
            Err(StorageError::NotFound(NotFoundError::Consumable(
                consumable.id
            )))
        );
    }

    #[test]
    fn test_list_newest_first() {
        let (_dir, db) = create_test_db();
        let store = RedbConsumableStore::new(db);
        let loc = LocationId::new();

        let (mut older, receipt) = make_consumable("CRT-001", loc);
        older.created_at = older.created_at - chrono::Duration::days(1);
        store.create(older, receipt).unwrap();
        let (newer, receipt) = make_consumable("CRT-002", loc);
        store.create(newer, receipt).unwrap();

        let serials: Vec<_> = store
            .list()
            .unwrap()
            .into_iter()
            .map(|c| c.serial_number)
            .collect();
        assert_eq!(serials, vec!["CRT-002", "CRT-001"]);
    }

    #[test]
    fn test_persists_across_reopen() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("toner.redb");
        let (consumable, receipt) = make_consumable("CRT-001", LocationId::new());

        {
            let db = crate::init_database(&path).unwrap();
            RedbConsumableStore::new(db)
                .create(consumable.clone(), receipt)
                .unwrap();
        }

        let db = crate::init_database(&path).unwrap();
        let store = RedbConsumableStore::new(db.clone());
        assert_eq!(store.get(consumable.id).unwrap(), Some(consumable.clone()));

        // Sequence keeps counting from the stored counter
        let mut next = consumable.clone();
        next.version = 1;
        let op = Operation::new(
            OperationType::Transfer,
            consumable.id,
            consumable.current_location,
            LocationId::new(),
            UserId::new("admin"),
            consumable.created_at,
        );
        assert_eq!(store.commit(0, next, op).unwrap().sequence, 2);
        assert_eq!(
            RedbOperationLedger::new(db)
                .operations_for(consumable.id)
                .unwrap()
                .len(),
            2
        );
    }
}
