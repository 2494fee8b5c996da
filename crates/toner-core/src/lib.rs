//! Toner Core - Domain model and lifecycle engine for printer consumables.
//!
//! Cartridges and drums move between locations, printers and service
//! centers. Each move is recorded as an immutable operation in a ledger and
//! the consumable's state is derived from it by the transition engine. This
//! crate has no dependencies on other Toner crates.

pub mod attention;
pub mod bulk;
pub mod catalog;
pub mod clock;
pub mod consumable;
pub mod engine;
pub mod error;
pub mod filter;
pub mod ids;
pub mod operation;
pub mod reference;
pub mod reports;
pub mod storage;
pub mod tracker;
pub mod validation;

// Re-exports for convenience
pub use attention::AttentionQuery;
pub use bulk::{resolve_service_center, BulkItemError, BulkReport, BulkTransition};
pub use catalog::Catalog;
pub use clock::{Clock, SystemClock};
pub use consumable::{Condition, Consumable, ConsumableKind, ConsumableStatus, NewConsumable};
pub use engine::{TransitionEngine, TransitionPolicy};
pub use error::{
    ConfigurationError, ConflictError, CoreError, NotFoundError, StorageError, ValidationError,
};
pub use filter::{ConsumableFilter, PrinterFilter};
pub use ids::{ConsumableId, LocationId, ModelId, OperationId, PrinterId, UserId};
pub use operation::{Operation, OperationRequest, OperationType};
pub use reference::{ConsumableModel, Location, LocationType, Printer, PrinterType};
pub use reports::Reports;
pub use storage::{ConsumableStore, OperationLedger, ReferenceResolver, ReferenceStore};
pub use tracker::{Applied, ConsumableDetail, Tracker};
pub use validation::Validator;

#[cfg(any(test, feature = "test-utils"))]
pub use clock::ManualClock;
#[cfg(any(test, feature = "test-utils"))]
pub use storage::memory::{InMemoryLifecycleStore, InMemoryReferenceStore};
