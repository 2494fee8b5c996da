use std::sync::Arc;

use redb::{Database, ReadableTable, TableDefinition};
use serde::de::DeserializeOwned;

use toner_core::{
    ConsumableModel, Location, LocationId, ModelId, Printer, PrinterId, ReferenceResolver,
    ReferenceStore, StorageError,
};

use crate::tables::{LOCATIONS_TABLE, MODELS_TABLE, PRINTERS_TABLE, PRINTER_SERIALS_TABLE};
use crate::{db_err, decode, encode};

type RowTable = TableDefinition<'static, &'static [u8], &'static [u8]>;

/// redb implementation of ReferenceStore and ReferenceResolver.
pub struct RedbReferenceStore {
    db: Arc<Database>,
}

impl RedbReferenceStore {
    pub fn new(db: Arc<Database>) -> Self {
        Self { db }
    }

    /// Initialize the database tables.
    pub fn init_tables(db: &Database) -> Result<(), StorageError> {
        let write_txn = db.begin_write().map_err(db_err)?;
        {
            // Create tables if they don't exist
            let _ = write_txn.open_table(LOCATIONS_TABLE).map_err(db_err)?;
            let _ = write_txn.open_table(PRINTERS_TABLE).map_err(db_err)?;
            let _ = write_txn.open_table(PRINTER_SERIALS_TABLE).map_err(db_err)?;
            let _ = write_txn.open_table(MODELS_TABLE).map_err(db_err)?;
        }
        write_txn.commit().map_err(db_err)?;
        Ok(())
    }

    fn put_row<T: serde::Serialize>(
        &self,
        definition: RowTable,
        key: &[u8],
        value: &T,
    ) -> Result<(), StorageError> {
        let value = encode(value)?;
        let write_txn = self.db.begin_write().map_err(db_err)?;
        {
            let mut table = write_txn.open_table(definition).map_err(db_err)?;
            table.insert(key, value.as_slice()).map_err(db_err)?;
        }
        write_txn.commit().map_err(db_err)?;
        Ok(())
    }

    fn get_row<T: DeserializeOwned>(
        &self,
        definition: RowTable,
        key: &[u8],
    ) -> Result<Option<T>, StorageError> {
        let read_txn = self.db.begin_read().map_err(db_err)?;
        let table = read_txn.open_table(definition).map_err(db_err)?;

        match table.get(key).map_err(db_err)? {
            Some(value) => Ok(Some(decode(value.value())?)),
            None => Ok(None),
        }
    }

    fn list_rows<T: DeserializeOwned>(&self, definition: RowTable) -> Result<Vec<T>, StorageError> {
        let read_txn = self.db.begin_read().map_err(db_err)?;
        let table = read_txn.open_table(definition).map_err(db_err)?;

        let mut rows = Vec::new();
        for entry in table.iter().map_err(db_err)? {
            let (_, value) = entry.map_err(db_err)?;
            rows.push(decode(value.value())?);
        }
        Ok(rows)
    }
}

impl ReferenceStore for RedbReferenceStore {
    fn put_location(&self, location: Location) -> Result<(), StorageError> {
        self.put_row(LOCATIONS_TABLE, location.id.as_bytes(), &location)
    }

    fn get_location(&self, id: LocationId) -> Result<Option<Location>, StorageError> {
        self.get_row(LOCATIONS_TABLE, id.as_bytes())
    }

    fn list_locations(&self) -> Result<Vec<Location>, StorageError> {
        let mut all: Vec<Location> = self.list_rows(LOCATIONS_TABLE)?;
        all.sort_by(|a, b| a.name.cmp(&b.name));
        Ok(all)
    }

    fn put_printer(&self, printer: Printer) -> Result<(), StorageError> {
        let value = encode(&printer)?;
        let key = printer.id.as_bytes().as_slice();

        let write_txn = self.db.begin_write().map_err(db_err)?;
        {
            let mut serials = write_txn.open_table(PRINTER_SERIALS_TABLE).map_err(db_err)?;
            let mut printers = write_txn.open_table(PRINTERS_TABLE).map_err(db_err)?;

            // Serial must be free or already ours
            let owner = serials
                .get(printer.serial_number.as_str())
                .map_err(db_err)?
                .map(|v| v.value().to_vec());
            if owner.as_deref().is_some_and(|owner| owner != key) {
                return Err(StorageError::DuplicateSerial(printer.serial_number));
            }

            // Release the old serial if this printer was renumbered
            let previous: Option<Printer> = match printers.get(key).map_err(db_err)? {
                Some(v) => Some(decode(v.value())?),
                None => None,
            };
            if let Some(previous) = previous {
                if previous.serial_number != printer.serial_number {
                    serials
                        .remove(previous.serial_number.as_str())
                        .map_err(db_err)?;
                }
            }

            serials
                .insert(printer.serial_number.as_str(), key)
                .map_err(db_err)?;
            printers.insert(key, value.as_slice()).map_err(db_err)?;
        }
        write_txn.commit().map_err(db_err)?;
        Ok(())
    }

    fn get_printer(&self, id: PrinterId) -> Result<Option<Printer>, StorageError> {
        self.get_row(PRINTERS_TABLE, id.as_bytes())
    }

    fn list_printers(&self) -> Result<Vec<Printer>, StorageError> {
        let mut all: Vec<Printer> = self.list_rows(PRINTERS_TABLE)?;
        all.sort_by(|a, b| a.name.cmp(&b.name));
        Ok(all)
    }

    fn put_model(&self, model: ConsumableModel) -> Result<(), StorageError> {
        self.put_row(MODELS_TABLE, model.id.as_bytes(), &model)
    }

    fn get_model(&self, id: ModelId) -> Result<Option<ConsumableModel>, StorageError> {
        self.get_row(MODELS_TABLE, id.as_bytes())
    }

    fn list_models(&self) -> Result<Vec<ConsumableModel>, StorageError> {
        let mut all: Vec<ConsumableModel> = self.list_rows(MODELS_TABLE)?;
        all.sort_by(|a, b| {
            a.manufacturer
                .cmp(&b.manufacturer)
                .then_with(|| a.name.cmp(&b.name))
        });
        Ok(all)
    }
}

impl ReferenceResolver for RedbReferenceStore {
    fn active_service_centers(&self) -> Result<Vec<Location>, StorageError> {
        Ok(self
            .list_locations()?
            .into_iter()
            .filter(Location::is_active_service_center)
            .collect())
    }

    fn find_active_printers_by_location(
        &self,
        location: LocationId,
    ) -> Result<Vec<Printer>, StorageError> {
        Ok(self
            .list_printers()?
            .into_iter()
            .filter(|p| p.is_active && p.location == location)
            .collect())
    }
}
