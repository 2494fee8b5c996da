//! The transition engine: a pure mapping from (consumable, operation) to the
//! consumable's next state.
//!
//! Validation always runs before any field is touched, so a rejected
//! operation leaves the input untouched. The engine never performs I/O; the
//! tracker is responsible for persisting the result together with the ledger
//! entry.

use serde::{Deserialize, Serialize};

use crate::consumable::{Condition, Consumable, ConsumableStatus};
use crate::error::ValidationError;
use crate::operation::{Operation, OperationType};
use crate::reference::ConsumableModel;

/// Optional rules layered on top of the base transition table.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TransitionPolicy {
    /// Reject `receive_service` unless the consumable is `at_service`.
    #[serde(default)]
    pub strict_service_cycle: bool,
}

impl TransitionPolicy {
    pub fn strict() -> Self {
        Self {
            strict_service_cycle: true,
        }
    }
}

#[derive(Debug, Clone, Copy, Default)]
pub struct TransitionEngine {
    policy: TransitionPolicy,
}

impl TransitionEngine {
    pub fn new(policy: TransitionPolicy) -> Self {
        Self { policy }
    }

    /// Check that `operation` may be applied to `consumable` in its current
    /// state.
    pub fn validate(
        &self,
        consumable: &Consumable,
        operation: &Operation,
    ) -> Result<(), ValidationError> {
        let kind = operation.operation_type;

        if operation.consumable != consumable.id {
            return Err(ValidationError::OperationSubjectMismatch {
                operation: operation.consumable,
                consumable: consumable.id,
            });
        }

        if consumable.status.is_terminal() {
            return Err(ValidationError::ConsumableDisposed(
                consumable.serial_number.clone(),
            ));
        }

        match (kind.requires_printer(), operation.printer.is_some()) {
            (true, false) => return Err(ValidationError::PrinterRequired),
            (false, true) => return Err(ValidationError::PrinterNotAllowed(kind)),
            _ => {}
        }

        if kind == OperationType::Install && consumable.status == ConsumableStatus::AtService {
            return Err(ValidationError::NotInstallable {
                serial: consumable.serial_number.clone(),
                status: consumable.status,
            });
        }

        if self.policy.strict_service_cycle
            && kind == OperationType::ReceiveService
            && consumable.status != ConsumableStatus::AtService
        {
            return Err(ValidationError::NotAtService {
                serial: consumable.serial_number.clone(),
                status: consumable.status,
            });
        }

        Ok(())
    }

    /// Validate and compute the consumable's next state.
    ///
    /// The returned consumable has its `version` bumped and `last_operation`
    /// pointing at `operation`.
    pub fn apply(
        &self,
        consumable: &Consumable,
        model: &ConsumableModel,
        operation: &Operation,
    ) -> Result<Consumable, ValidationError> {
        self.validate(consumable, operation)?;

        let mut next = consumable.clone();
        next.status = operation.operation_type.resulting_status();
        next.current_location = operation.to_location;

        match operation.operation_type {
            OperationType::Install => next.installed_in_printer = operation.printer,
            OperationType::Remove => next.installed_in_printer = None,
            OperationType::ReceiveService => {
                next.refill_count = next.refill_count.saturating_add(1);
                next.condition = Condition::Refilled;
            }
            _ => {}
        }

        // A consumable that leaves `installed` by any route is no longer in a printer.
        if next.status != ConsumableStatus::Installed {
            next.installed_in_printer = None;
        }

        next.enforce_refill_ceiling(model.max_refills);

        next.updated_at = operation.timestamp;
        next.version += 1;
        next.last_operation = Some(operation.id);

        debug_assert!(next.printer_matches_status());
        Ok(next)
    }
}
