use crate::consumable::Consumable;
use crate::error::StorageError;
use crate::ids::{ConsumableId, LocationId, ModelId, PrinterId};
use crate::operation::Operation;
use crate::reference::{ConsumableModel, Location, Printer};

/// Trait for storing reference data.
pub trait ReferenceStore: Send + Sync {
    /// Insert or replace a location.
    fn put_location(&self, location: Location) -> Result<(), StorageError>;

    fn get_location(&self, id: LocationId) -> Result<Option<Location>, StorageError>;

    /// All locations, ordered by name.
    fn list_locations(&self) -> Result<Vec<Location>, StorageError>;

    /// Insert or replace a printer. Fails with `DuplicateSerial` if another
    /// printer already uses the serial number.
    fn put_printer(&self, printer: Printer) -> Result<(), StorageError>;

    fn get_printer(&self, id: PrinterId) -> Result<Option<Printer>, StorageError>;

    /// All printers, ordered by name.
    fn list_printers(&self) -> Result<Vec<Printer>, StorageError>;

    /// Insert or replace a consumable model.
    fn put_model(&self, model: ConsumableModel) -> Result<(), StorageError>;

    fn get_model(&self, id: ModelId) -> Result<Option<ConsumableModel>, StorageError>;

    /// All models, ordered by manufacturer then name.
    fn list_models(&self) -> Result<Vec<ConsumableModel>, StorageError>;
}

/// Lookups the lifecycle services need from reference data.
///
/// Passed explicitly so batch jobs and tests can substitute fixed fixtures.
pub trait ReferenceResolver: Send + Sync {
    /// Every active location of type `service`.
    fn active_service_centers(&self) -> Result<Vec<Location>, StorageError>;

    /// Active printers at a location, ordered by name.
    fn find_active_printers_by_location(
        &self,
        location: LocationId,
    ) -> Result<Vec<Printer>, StorageError>;

    /// The first active service center, if any.
    fn find_active_service_center(&self) -> Result<Option<Location>, StorageError> {
        Ok(self.active_service_centers()?.into_iter().next())
    }
}

/// Trait for storing consumables together with their ledger.
///
/// Every write pairs a consumable row with exactly one ledger entry and
/// must be applied as a single unit: either both become visible or neither
/// does.
pub trait ConsumableStore: Send + Sync {
    fn get(&self, id: ConsumableId) -> Result<Option<Consumable>, StorageError>;

    fn get_by_serial(&self, serial_number: &str) -> Result<Option<Consumable>, StorageError>;

    /// All consumables, newest first.
    fn list(&self) -> Result<Vec<Consumable>, StorageError>;

    /// Insert a new consumable with its initial receipt entry.
    /// Fails with `DuplicateSerial` if the serial number is taken.
    /// Returns the stored entry with its ledger sequence assigned.
    fn create(&self, consumable: Consumable, receipt: Operation)
        -> Result<Operation, StorageError>;

    /// Replace a consumable and append the entry that produced it.
    ///
    /// The stored consumable's version must equal `expected_version`,
    /// otherwise nothing is written and `Conflict` is returned.
    fn commit(
        &self,
        expected_version: u64,
        consumable: Consumable,
        operation: Operation,
    ) -> Result<Operation, StorageError>;
}

/// Read access to the append-only operation ledger.
pub trait OperationLedger: Send + Sync {
    /// Entries for one consumable, oldest first.
    fn operations_for(&self, consumable: ConsumableId) -> Result<Vec<Operation>, StorageError>;

    /// The most recent entries across all consumables, newest first.
    fn recent(&self, limit: usize) -> Result<Vec<Operation>, StorageError>;

    /// Every entry, oldest first.
    fn all_operations(&self) -> Result<Vec<Operation>, StorageError>;
}

// In-memory implementations for testing
#[cfg(any(test, feature = "test-utils"))]
pub mod memory {
    use super::*;
    use crate::error::{ConflictError, NotFoundError};
    use std::collections::HashMap;
    use std::sync::RwLock;

    /// In-memory reference data store for testing.
    #[derive(Default)]
    pub struct InMemoryReferenceStore {
        locations: RwLock<HashMap<LocationId, Location>>,
        printers: RwLock<HashMap<PrinterId, Printer>>,
        models: RwLock<HashMap<ModelId, ConsumableModel>>,
    }

    impl InMemoryReferenceStore {
        pub fn new() -> Self {
            Self::default()
        }
    }

    impl ReferenceStore for InMemoryReferenceStore {
        fn put_location(&self, location: Location) -> Result<(), StorageError> {
            self.locations.write().unwrap().insert(location.id, location);
            Ok(())
        }

        fn get_location(&self, id: LocationId) -> Result<Option<Location>, StorageError> {
            Ok(self.locations.read().unwrap().get(&id).cloned())
        }

        fn list_locations(&self) -> Result<Vec<Location>, StorageError> {
            let mut all: Vec<_> = self.locations.read().unwrap().values().cloned().collect();
            all.sort_by(|a, b| a.name.cmp(&b.name));
            Ok(all)
        }

        fn put_printer(&self, printer: Printer) -> Result<(), StorageError> {
            let mut printers = self.printers.write().unwrap();
            if printers
                .values()
                .any(|p| p.serial_number == printer.serial_number && p.id != printer.id)
            {
                return Err(StorageError::DuplicateSerial(printer.serial_number));
            }
            printers.insert(printer.id, printer);
            Ok(())
        }

        fn get_printer(&self, id: PrinterId) -> Result<Option<Printer>, StorageError> {
            Ok(self.printers.read().unwrap().get(&id).cloned())
        }

        fn list_printers(&self) -> Result<Vec<Printer>, StorageError> {
            let mut all: Vec<_> = self.printers.read().unwrap().values().cloned().collect();
            all.sort_by(|a, b| a.name.cmp(&b.name));
            Ok(all)
        }

        fn put_model(&self, model: ConsumableModel) -> Result<(), StorageError> {
            self.models.write().unwrap().insert(model.id, model);
            Ok(())
        }

        fn get_model(&self, id: ModelId) -> Result<Option<ConsumableModel>, StorageError> {
            Ok(self.models.read().unwrap().get(&id).cloned())
        }

        fn list_models(&self) -> Result<Vec<ConsumableModel>, StorageError> {
            let mut all: Vec<_> = self.models.read().unwrap().values().cloned().collect();
            all.sort_by(|a, b| {
                a.manufacturer
                    .cmp(&b.manufacturer)
                    .then_with(|| a.name.cmp(&b.name))
            });
            Ok(all)
        }
    }

    impl ReferenceResolver for InMemoryReferenceStore {
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

    #[derive(Default)]
    struct LifecycleState {
        consumables: HashMap<ConsumableId, Consumable>,
        serials: HashMap<String, ConsumableId>,
        operations: Vec<Operation>,
        faults: HashMap<ConsumableId, StorageError>,
    }

    /// In-memory consumable store and ledger for testing.
    ///
    /// Both live behind one lock so a commit is observed all at once.
    #[derive(Default)]
    pub struct InMemoryLifecycleStore {
        state: RwLock<LifecycleState>,
    }

    impl InMemoryLifecycleStore {
        pub fn new() -> Self {
            Self::default()
        }

        /// Make the next `commit` for `consumable` fail with `error`
        /// without writing anything.
        pub fn fail_next_commit(&self, consumable: ConsumableId, error: StorageError) {
            self.state.write().unwrap().faults.insert(consumable, error);
        }

        /// Overwrite a stored consumable without a ledger entry, as a
        /// concurrent writer would. Bumps the version.
        pub fn tamper(&self, consumable: ConsumableId, f: impl FnOnce(&mut Consumable)) {
            let mut state = self.state.write().unwrap();
            if let Some(c) = state.consumables.get_mut(&consumable) {
                f(c);
                c.version += 1;
            }
        }
    }

    impl ConsumableStore for InMemoryLifecycleStore {
        fn get(&self, id: ConsumableId) -> Result<Option<Consumable>, StorageError> {
            Ok(self.state.read().unwrap().consumables.get(&id).cloned())
        }

        fn get_by_serial(&self, serial_number: &str) -> Result<Option<Consumable>, StorageError> {
            let state = self.state.read().unwrap();
            Ok(state
                .serials
                .get(serial_number)
                .and_then(|id| state.consumables.get(id))
                .cloned())
        }

        fn list(&self) -> Result<Vec<Consumable>, StorageError> {
            let mut all: Vec<_> = self
                .state
                .read()
                .unwrap()
                .consumables
                .values()
                .cloned()
                .collect();
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
            mut receipt: Operation,
        ) -> Result<Operation, StorageError> {
            let mut state = self.state.write().unwrap();

            if state.serials.contains_key(&consumable.serial_number) {
                return Err(StorageError::DuplicateSerial(consumable.serial_number));
            }

            receipt.sequence = state.operations.len() as u64 + 1;
            state
                .serials
                .insert(consumable.serial_number.clone(), consumable.id);
            state.consumables.insert(consumable.id, consumable);
            state.operations.push(receipt.clone());
            Ok(receipt)
        }

        fn commit(
            &self,
            expected_version: u64,
            consumable: Consumable,
            mut operation: Operation,
        ) -> Result<Operation, StorageError> {
            let mut state = self.state.write().unwrap();

            if let Some(fault) = state.faults.remove(&consumable.id) {
                return Err(fault);
            }

            let found = state
                .consumables
                .get(&consumable.id)
                .map(|c| c.version)
                .ok_or(NotFoundError::Consumable(consumable.id))?;
            if found != expected_version {
                return Err(ConflictError {
                    consumable: consumable.id,
                    expected: expected_version,
                    found,
                }
                .into());
            }

            operation.sequence = state.operations.len() as u64 + 1;
            state.consumables.insert(consumable.id, consumable);
            state.operations.push(operation.clone());
            Ok(operation)
        }
    }

    impl OperationLedger for InMemoryLifecycleStore {
        fn operations_for(
            &self,
            consumable: ConsumableId,
        ) -> Result<Vec<Operation>, StorageError> {
            Ok(self
                .state
                .read()
                .unwrap()
                .operations
                .iter()
                .filter(|op| op.consumable == consumable)
                .cloned()
                .collect())
        }

        fn recent(&self, limit: usize) -> Result<Vec<Operation>, StorageError> {
            Ok(self
                .state
                .read()
                .unwrap()
                .operations
                .iter()
                .rev()
                .take(limit)
                .cloned()
                .collect())
        }

        fn all_operations(&self) -> Result<Vec<Operation>, StorageError> {
            Ok(self.state.read().unwrap().operations.clone())
        }
    }

}
