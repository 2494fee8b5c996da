//! Validate-then-apply service over the stores.
//!
//! Every state change goes through [`Tracker::apply`]: the engine computes
//! the next state, then the store writes consumable and ledger entry as one
//! unit guarded by the consumable's version.

use std::collections::HashMap;
use std::sync::Arc;

use serde::Serialize;

use crate::attention::AttentionQuery;
use crate::clock::Clock;
use crate::consumable::{Consumable, NewConsumable};
use crate::engine::{TransitionEngine, TransitionPolicy};
use crate::error::{CoreError, NotFoundError};
use crate::filter::ConsumableFilter;
use crate::ids::{ConsumableId, LocationId, ModelId, PrinterId, UserId};
use crate::operation::{Operation, OperationRequest, OperationType};
use crate::reference::{ConsumableModel, Location, Printer};
use crate::storage::{ConsumableStore, OperationLedger, ReferenceStore};
use crate::validation::Validator;

pub const INITIAL_RECEIPT_REASON: &str = "initial receipt";

/// Result of a successfully applied operation.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Applied {
    pub consumable: Consumable,
    pub operation: Operation,
}

/// A consumable with its model and history, newest entry first.
#[derive(Debug, Clone, Serialize)]
pub struct ConsumableDetail {
    pub consumable: Consumable,
    pub model: ConsumableModel,
    pub location: Option<Location>,
    pub printer: Option<Printer>,
    pub operations: Vec<Operation>,
}

pub struct Tracker {
    consumables: Arc<dyn ConsumableStore>,
    ledger: Arc<dyn OperationLedger>,
    references: Arc<dyn ReferenceStore>,
    clock: Arc<dyn Clock>,
    engine: TransitionEngine,
}

impl Tracker {
    pub fn new(
        consumables: Arc<dyn ConsumableStore>,
        ledger: Arc<dyn OperationLedger>,
        references: Arc<dyn ReferenceStore>,
        clock: Arc<dyn Clock>,
        policy: TransitionPolicy,
    ) -> Self {
        Self {
            consumables,
            ledger,
            references,
            clock,
            engine: TransitionEngine::new(policy),
        }
    }

    pub fn clock(&self) -> &dyn Clock {
        self.clock.as_ref()
    }

    /// Register a new consumable together with its initial receipt.
    pub fn register(&self, user: &UserId, new: NewConsumable) -> Result<Applied, CoreError> {
        Validator::validate_new_consumable(&new)?;
        let model = self.model(new.model)?;
        self.location(new.location)?;

        let now = self.clock.now();
        let location = new.location;
        let fresh = Consumable::from_new(new, now);
        let receipt = Operation::new(
            OperationType::Receipt,
            fresh.id,
            location,
            location,
            user.clone(),
            now,
        )
        .with_reason(INITIAL_RECEIPT_REASON);

        let consumable = self.engine.apply(&fresh, &model, &receipt)?;
        let operation = self.consumables.create(consumable.clone(), receipt)?;

        tracing::info!(
            serial = %consumable.serial_number,
            kind = %consumable.kind,
            location = %location,
            "consumable registered"
        );

        Ok(Applied {
            consumable,
            operation,
        })
    }

    /// Resolve a request against current data and apply it.
    pub fn submit(&self, user: &UserId, request: OperationRequest) -> Result<Applied, CoreError> {
        let consumable = self.get(request.consumable)?;

        let from_location = request.from_location.unwrap_or(consumable.current_location);
        self.location(from_location)?;
        self.location(request.to_location)?;
        if let Some(printer) = request.printer {
            let printer = self.printer(printer)?;
            if request.operation_type == OperationType::Install {
                Validator::validate_install_target(&printer, request.to_location)?;
            }
        }

        let mut operation = Operation::new(
            request.operation_type,
            consumable.id,
            from_location,
            request.to_location,
            user.clone(),
            self.clock.now(),
        );
        operation.printer = request.printer;
        operation.reason = request.reason;
        operation.notes = request.notes;

        self.apply(&consumable, operation)
    }

    /// Validate `operation` against `consumable` and persist the transition.
    ///
    /// `consumable` is the state the caller read; if the store holds a newer
    /// version the write is rejected with a conflict.
    pub fn apply(&self, consumable: &Consumable, operation: Operation) -> Result<Applied, CoreError> {
        let model = self.model(consumable.model)?;
        let next = self.engine.apply(consumable, &model, &operation)?;
        let operation = self
            .consumables
            .commit(consumable.version, next.clone(), operation)?;

        tracing::info!(
            serial = %next.serial_number,
            operation = %operation.operation_type,
            status = %next.status,
            sequence = operation.sequence,
            "operation applied"
        );

        Ok(Applied {
            consumable: next,
            operation,
        })
    }

    pub fn get(&self, id: ConsumableId) -> Result<Consumable, CoreError> {
        self.consumables
            .get(id)?
            .ok_or_else(|| NotFoundError::Consumable(id).into())
    }

    pub fn get_by_serial(&self, serial_number: &str) -> Result<Consumable, CoreError> {
        self.consumables
            .get_by_serial(serial_number)?
            .ok_or_else(|| NotFoundError::ConsumableSerial(serial_number.to_string()).into())
    }

    pub fn detail(&self, id: ConsumableId) -> Result<ConsumableDetail, CoreError> {
        let consumable = self.get(id)?;
        let model = self.model(consumable.model)?;
        let location = self.references.get_location(consumable.current_location)?;
        let printer = match consumable.installed_in_printer {
            Some(p) => self.references.get_printer(p)?,
            None => None,
        };
        let mut operations = self.ledger.operations_for(id)?;
        operations.reverse();

        Ok(ConsumableDetail {
            consumable,
            model,
            location,
            printer,
            operations,
        })
    }

    /// Consumables matching `filter`, newest first.
    pub fn list(&self, filter: &ConsumableFilter) -> Result<Vec<Consumable>, CoreError> {
        Ok(self
            .consumables
            .list()?
            .into_iter()
            .filter(|c| filter.matches(c))
            .collect())
    }

    pub fn recent_operations(&self, limit: usize) -> Result<Vec<Operation>, CoreError> {
        Ok(self.ledger.recent(limit)?)
    }

    pub fn all_operations(&self) -> Result<Vec<Operation>, CoreError> {
        Ok(self.ledger.all_operations()?)
    }

    /// Consumables currently installed in `printer`.
    pub fn installed_in(&self, printer: PrinterId) -> Result<Vec<Consumable>, CoreError> {
        Ok(self
            .consumables
            .list()?
            .into_iter()
            .filter(|c| c.installed_in_printer == Some(printer))
            .collect())
    }

    /// Consumables dashboards should flag, evaluated against current data.
    pub fn needing_attention(&self, limit: Option<usize>) -> Result<Vec<Consumable>, CoreError> {
        let models = self.models_by_id()?;
        let consumables = self.consumables.list()?;
        Ok(AttentionQuery::select(consumables, &models, limit))
    }

    pub fn models_by_id(&self) -> Result<HashMap<ModelId, ConsumableModel>, CoreError> {
        Ok(self
            .references
            .list_models()?
            .into_iter()
            .map(|m| (m.id, m))
            .collect())
    }

    fn model(&self, id: ModelId) -> Result<ConsumableModel, CoreError> {
        self.references
            .get_model(id)?
            .ok_or_else(|| NotFoundError::Model(id).into())
    }

    fn location(&self, id: LocationId) -> Result<Location, CoreError> {
        self.references
            .get_location(id)?
            .ok_or_else(|| NotFoundError::Location(id).into())
    }

    fn printer(&self, id: PrinterId) -> Result<Printer, CoreError> {
        self.references
            .get_printer(id)?
            .ok_or_else(|| NotFoundError::Printer(id).into())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::clock::ManualClock;
    use crate::consumable::{Condition, ConsumableKind, ConsumableStatus};
    use crate::error::{StorageError, ValidationError};
    use crate::reference::{LocationType, PrinterType};
    use crate::storage::memory::{InMemoryLifecycleStore, InMemoryReferenceStore};
    use chrono::{Duration, TimeZone, Utc};

    struct Harness {
        tracker: Tracker,
        store: Arc<InMemoryLifecycleStore>,
        clock: Arc<ManualClock>,
        refs: Arc<InMemoryReferenceStore>,
        user: UserId,
        model: ConsumableModel,
        warehouse: Location,
        service: Location,
        office: Location,
        printer: Printer,
    }

    fn harness(max_refills: u32) -> Harness {
        let store = Arc::new(InMemoryLifecycleStore::new());
        let refs = Arc::new(InMemoryReferenceStore::new());
        let clock = Arc::new(ManualClock::new(
            Utc.with_ymd_and_hms(2024, 5, 1, 8, 0, 0).unwrap(),
        ));

        let model = ConsumableModel::new("CF259A", "HP", max_refills);
        let warehouse = Location::new("Warehouse-A", LocationType::Warehouse);
        let service = Location::new("Service-Center", LocationType::Service);
        let office = Location::new("Office-1", LocationType::Office);
        let printer = Printer::new("Hall", "HP M404", "PR-1", PrinterType::Laser, office.id);
        refs.put_model(model.clone()).unwrap();
        refs.put_location(warehouse.clone()).unwrap();
        refs.put_location(service.clone()).unwrap();
        refs.put_location(office.clone()).unwrap();
        refs.put_printer(printer.clone()).unwrap();

        let tracker = Tracker::new(
            store.clone(),
            store.clone(),
            refs.clone(),
            clock.clone(),
            TransitionPolicy::default(),
        );

        Harness {
            tracker,
            store,
            clock,
            refs,
            user: UserId::new("operator"),
            model,
            warehouse,
            service,
            office,
            printer,
        }
    }

    impl Harness {
        fn register(&self, serial: &str) -> Consumable {
            self.tracker
                .register(
                    &self.user,
                    NewConsumable::new(serial, ConsumableKind::Cartridge, self.model.id, self.warehouse.id),
                )
                .unwrap()
                .consumable
        }

        fn submit(&self, id: ConsumableId, kind: OperationType, to: LocationId) -> Result<Applied, CoreError> {
            self.tracker
                .submit(&self.user, OperationRequest::new(id, kind, to))
        }
    }

    #[test]
    fn test_register_appends_receipt() {
        let h = harness(2);
        let c = h.register("C-001");

        assert_eq!(c.status, ConsumableStatus::InStock);
        assert_eq!(c.refill_count, 0);
        assert_eq!(c.current_location, h.warehouse.id);
        assert_eq!(c.version, 1);

        let ops = h.store.operations_for(c.id).unwrap();
        assert_eq!(ops.len(), 1);
        assert_eq!(ops[0].operation_type, OperationType::Receipt);
        assert_eq!(ops[0].from_location, h.warehouse.id);
        assert_eq!(ops[0].to_location, h.warehouse.id);
        assert_eq!(ops[0].reason, INITIAL_RECEIPT_REASON);
        assert_eq!(c.last_operation, Some(ops[0].id));
    }

    #[test]
    fn test_register_unknown_model() {
        let h = harness(2);
        let err = h
            .tracker
            .register(
                &h.user,
                NewConsumable::new("C-001", ConsumableKind::Drum, ModelId::new(), h.warehouse.id),
            )
            .unwrap_err();
        assert!(matches!(err, CoreError::NotFound(NotFoundError::Model(_))));
    }

    #[test]
    fn test_register_duplicate_serial() {
        let h = harness(2);
        h.register("C-001");
        let err = h
            .tracker
            .register(
                &h.user,
                NewConsumable::new("C-001", ConsumableKind::Cartridge, h.model.id, h.warehouse.id),
            )
            .unwrap_err();
        assert!(matches!(
            err,
            CoreError::Validation(ValidationError::DuplicateSerial(_))
        ));
    }

    #[test]
    fn test_refill_scenario() {
        let h = harness(2);
        let c = h.register("C-001");

        for expected in 1..=3u32 {
            let at_service = h
                .submit(c.id, OperationType::IssueService, h.service.id)
                .unwrap();
            assert_eq!(at_service.consumable.status, ConsumableStatus::AtService);
            assert_eq!(at_service.consumable.current_location, h.service.id);

            let back = h
                .submit(c.id, OperationType::ReceiveService, h.warehouse.id)
                .unwrap();
            assert_eq!(back.consumable.status, ConsumableStatus::InStock);
            assert_eq!(back.consumable.refill_count, expected);
            let expected_condition = if expected <= 2 {
                Condition::Refilled
            } else {
                Condition::NeedsRepair
            };
            assert_eq!(back.consumable.condition, expected_condition);
        }

        let stored = h.tracker.get(c.id).unwrap();
        assert_eq!(stored.refill_count, 3);
        assert_eq!(stored.condition, Condition::NeedsRepair);
        assert_eq!(h.store.operations_for(c.id).unwrap().len(), 7);
    }

    #[test]
    fn test_install_at_service_rejected_without_side_effects() {
        let h = harness(2);
        let c = h.register("C-001");
        h.submit(c.id, OperationType::IssueService, h.service.id)
            .unwrap();
        let before = h.tracker.get(c.id).unwrap();

        let err = h
            .tracker
            .submit(
                &h.user,
                OperationRequest::new(c.id, OperationType::Install, h.office.id)
                    .with_printer(h.printer.id),
            )
            .unwrap_err();

        assert!(matches!(
            err,
            CoreError::Validation(ValidationError::NotInstallable { .. })
        ));
        assert_eq!(h.tracker.get(c.id).unwrap(), before);
        assert_eq!(h.store.operations_for(c.id).unwrap().len(), 2);
    }

    #[test]
    fn test_install_and_remove_through_tracker() {
        let h = harness(2);
        let c = h.register("C-001");

        let installed = h
            .tracker
            .submit(
                &h.user,
                OperationRequest::new(c.id, OperationType::Install, h.office.id)
                    .with_printer(h.printer.id),
            )
            .unwrap();
        assert_eq!(installed.consumable.installed_in_printer, Some(h.printer.id));
        assert_eq!(h.tracker.installed_in(h.printer.id).unwrap().len(), 1);

        let removed = h.submit(c.id, OperationType::Remove, h.warehouse.id).unwrap();
        assert_eq!(removed.consumable.installed_in_printer, None);
        assert_eq!(removed.operation.from_location, h.office.id);
        assert!(h.tracker.installed_in(h.printer.id).unwrap().is_empty());
    }

    #[test]
    fn test_install_needs_active_printer_at_destination() {
        let h = harness(2);
        let c = h.register("C-001");
        let mut retired = Printer::new("Annex", "HP M404", "PR-2", PrinterType::Laser, h.office.id);
        retired.is_active = false;
        h.refs.put_printer(retired.clone()).unwrap();
        let before = h.tracker.get(c.id).unwrap();

        let err = h
            .tracker
            .submit(
                &h.user,
                OperationRequest::new(c.id, OperationType::Install, h.office.id)
                    .with_printer(retired.id),
            )
            .unwrap_err();
        assert!(matches!(
            err,
            CoreError::Validation(ValidationError::PrinterInactive(id)) if id == retired.id
        ));

        let err = h
            .tracker
            .submit(
                &h.user,
                OperationRequest::new(c.id, OperationType::Install, h.warehouse.id)
                    .with_printer(h.printer.id),
            )
            .unwrap_err();
        assert!(matches!(
            err,
            CoreError::Validation(ValidationError::PrinterNotAtDestination { .. })
        ));

        assert_eq!(h.tracker.get(c.id).unwrap(), before);
        assert_eq!(h.store.operations_for(c.id).unwrap().len(), 1);
        assert!(h.tracker.installed_in(h.printer.id).unwrap().is_empty());
    }

    #[test]
    fn test_apply_rejects_operation_for_other_consumable() {
        let h = harness(2);
        let a = h.register("C-001");
        let b = h.register("C-002");

        let op = Operation::new(
            OperationType::Dispose,
            b.id,
            b.current_location,
            h.warehouse.id,
            h.user.clone(),
            h.clock.now(),
        );
        let err = h.tracker.apply(&a, op).unwrap_err();
        assert!(matches!(
            err,
            CoreError::Validation(ValidationError::OperationSubjectMismatch { .. })
        ));

        assert_eq!(h.tracker.get(a.id).unwrap(), a);
        assert_eq!(h.tracker.get(b.id).unwrap(), b);
        assert_eq!(h.store.operations_for(a.id).unwrap().len(), 1);
        assert_eq!(h.store.operations_for(b.id).unwrap().len(), 1);
    }

    #[test]
    fn test_unknown_references() {
        let h = harness(2);
        let c = h.register("C-001");

        let err = h
            .submit(ConsumableId::new(), OperationType::Transfer, h.office.id)
            .unwrap_err();
        assert!(matches!(err, CoreError::NotFound(NotFoundError::Consumable(_))));

        let err = h
            .submit(c.id, OperationType::Transfer, LocationId::new())
            .unwrap_err();
        assert!(matches!(err, CoreError::NotFound(NotFoundError::Location(_))));

        let err = h
            .tracker
            .submit(
                &h.user,
                OperationRequest::new(c.id, OperationType::Install, h.office.id)
                    .with_printer(PrinterId::new()),
            )
            .unwrap_err();
        assert!(matches!(err, CoreError::NotFound(NotFoundError::Printer(_))));
    }

    #[test]
    fn test_disposed_rejects_everything() {
        let h = harness(2);
        let c = h.register("C-001");
        h.submit(c.id, OperationType::Dispose, h.warehouse.id)
            .unwrap();

        for kind in OperationType::ALL {
            let mut req = OperationRequest::new(c.id, kind, h.office.id);
            if kind == OperationType::Install {
                req = req.with_printer(h.printer.id);
            }
            let err = h.tracker.submit(&h.user, req).unwrap_err();
            assert!(
                matches!(err, CoreError::Validation(ValidationError::ConsumableDisposed(_))),
                "{kind}"
            );
        }
        assert_eq!(h.store.operations_for(c.id).unwrap().len(), 2);
    }

    #[test]
    fn test_stale_read_conflicts() {
        let h = harness(2);
        let c = h.register("C-001");
        let stale = h.tracker.get(c.id).unwrap();

        h.submit(c.id, OperationType::Transfer, h.office.id).unwrap();

        let op = Operation::new(
            OperationType::Transfer,
            stale.id,
            stale.current_location,
            h.warehouse.id,
            h.user.clone(),
            h.clock.now(),
        );
        let err = h.tracker.apply(&stale, op).unwrap_err();
        assert!(matches!(err, CoreError::Conflict(_)));
        assert_eq!(h.tracker.get(c.id).unwrap().current_location, h.office.id);
    }

    #[test]
    fn test_storage_failure_is_all_or_nothing() {
        let h = harness(2);
        let c = h.register("C-001");
        let before = h.tracker.get(c.id).unwrap();

        h.store
            .fail_next_commit(c.id, StorageError::Database("disk full".to_string()));
        let err = h
            .submit(c.id, OperationType::IssueService, h.service.id)
            .unwrap_err();

        assert!(matches!(err, CoreError::Storage(_)));
        assert_eq!(h.tracker.get(c.id).unwrap(), before);
        assert_eq!(h.store.operations_for(c.id).unwrap().len(), 1);
    }

    #[test]
    fn test_detail_lists_newest_first() {
        let h = harness(2);
        let c = h.register("C-001");
        h.clock.advance(Duration::minutes(5));
        h.submit(c.id, OperationType::Transfer, h.office.id).unwrap();

        let detail = h.tracker.detail(c.id).unwrap();
        assert_eq!(detail.operations.len(), 2);
        assert_eq!(detail.operations[0].operation_type, OperationType::Transfer);
        assert_eq!(detail.operations[1].operation_type, OperationType::Receipt);
        assert_eq!(detail.location.map(|l| l.id), Some(h.office.id));
        assert!(detail.printer.is_none());
        assert_eq!(detail.consumable.updated_at, h.clock.now());
    }

    #[test]
    fn test_lookup_by_serial() {
        let h = harness(2);
        let c = h.register("C-042");
        assert_eq!(h.tracker.get_by_serial("C-042").unwrap().id, c.id);
        assert!(matches!(
            h.tracker.get_by_serial("nope"),
            Err(CoreError::NotFound(NotFoundError::ConsumableSerial(_)))
        ));
    }
}
