//! Best-effort batch transitions.
//!
//! Each matching consumable is transitioned independently through the
//! tracker. A failing item is recorded in the report and the batch moves
//! on; there is no rollback across items.

use serde::Serialize;

use crate::clock::Clock;
use crate::consumable::Consumable;
use crate::error::{ConfigurationError, CoreError};
use crate::filter::ConsumableFilter;
use crate::ids::{ConsumableId, UserId};
use crate::operation::{Operation, OperationType};
use crate::reference::Location;
use crate::storage::ReferenceResolver;
use crate::tracker::Tracker;

pub const SEND_TO_SERVICE_REASON: &str = "bulk send to service";

/// Per-item failure, keyed by serial number.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct BulkItemError {
    pub consumable: ConsumableId,
    pub serial_number: String,
    pub kind: &'static str,
    pub message: String,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct BulkReport {
    pub succeeded: usize,
    pub transitioned: Vec<ConsumableId>,
    pub errors: Vec<BulkItemError>,
}

impl BulkReport {
    pub fn failed(&self) -> usize {
        self.errors.len()
    }
}

/// Resolve the single active service center.
pub fn resolve_service_center(resolver: &dyn ReferenceResolver) -> Result<Location, CoreError> {
    let mut centers = resolver.active_service_centers()?;
    match centers.len() {
        0 => Err(ConfigurationError::NoServiceCenter.into()),
        1 => Ok(centers.remove(0)),
        n => Err(ConfigurationError::AmbiguousServiceCenter(n).into()),
    }
}

pub struct BulkTransition<'a> {
    tracker: &'a Tracker,
    resolver: &'a dyn ReferenceResolver,
}

impl<'a> BulkTransition<'a> {
    pub fn new(tracker: &'a Tracker, resolver: &'a dyn ReferenceResolver) -> Self {
        Self { tracker, resolver }
    }

    /// Issue every consumable matching `filter` to the service center.
    ///
    /// Fails before touching anything if the service center cannot be
    /// resolved.
    pub fn send_to_service(
        &self,
        user: &UserId,
        filter: &ConsumableFilter,
        reason: Option<&str>,
    ) -> Result<BulkReport, CoreError> {
        let service = resolve_service_center(self.resolver)?;
        let reason = reason.unwrap_or(SEND_TO_SERVICE_REASON);

        let report = self.run(user, filter, |tracker, consumable| {
            Operation::new(
                OperationType::IssueService,
                consumable.id,
                consumable.current_location,
                service.id,
                user.clone(),
                tracker.clock().now(),
            )
            .with_reason(reason)
        })?;

        tracing::info!(
            service_center = %service.name,
            succeeded = report.succeeded,
            failed = report.failed(),
            "bulk send to service finished"
        );
        Ok(report)
    }

    /// Apply the operation built by `template` to each consumable matching
    /// `filter`, in listing order.
    pub fn run<F>(
        &self,
        user: &UserId,
        filter: &ConsumableFilter,
        template: F,
    ) -> Result<BulkReport, CoreError>
    where
        F: Fn(&Tracker, &Consumable) -> Operation,
    {
        let candidates = self.tracker.list(filter)?;
        let mut report = BulkReport::default();

        for consumable in candidates {
            let operation = template(self.tracker, &consumable);
            match self.tracker.apply(&consumable, operation) {
                Ok(applied) => {
                    report.succeeded += 1;
                    report.transitioned.push(applied.consumable.id);
                }
                Err(e) => {
                    tracing::warn!(
                        serial = %consumable.serial_number,
                        user = %user,
                        error = %e,
                        "bulk item failed"
                    );
                    report.errors.push(BulkItemError {
                        consumable: consumable.id,
                        serial_number: consumable.serial_number.clone(),
                        kind: e.kind(),
                        message: e.to_string(),
                    });
                }
            }
        }

        Ok(report)
    }
}
