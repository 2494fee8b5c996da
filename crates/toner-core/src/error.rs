use thiserror::Error;

use crate::consumable::ConsumableStatus;
use crate::ids::{ConsumableId, LocationId, ModelId, PrinterId};
use crate::operation::OperationType;

#[derive(Error, Debug)]
pub enum CoreError {
    #[error("Validation error: {0}")]
    Validation(#[from] ValidationError),

    #[error("Not found: {0}")]
    NotFound(#[from] NotFoundError),

    #[error("Configuration error: {0}")]
    Configuration(#[from] ConfigurationError),

    #[error("Conflict: {0}")]
    Conflict(#[from] ConflictError),

    #[error("Storage error: {0}")]
    Storage(StorageError),
}

impl From<StorageError> for CoreError {
    fn from(err: StorageError) -> Self {
        match err {
            StorageError::NotFound(e) => CoreError::NotFound(e),
            StorageError::Conflict(e) => CoreError::Conflict(e),
            StorageError::DuplicateSerial(serial) => {
                CoreError::Validation(ValidationError::DuplicateSerial(serial))
            }
            other => CoreError::Storage(other),
        }
    }
}

impl CoreError {
    /// Short machine-readable category, used in reports and API bodies.
    pub fn kind(&self) -> &'static str {
        match self {
            CoreError::Validation(_) => "validation",
            CoreError::NotFound(_) => "not_found",
            CoreError::Configuration(_) => "configuration",
            CoreError::Conflict(_) => "conflict",
            CoreError::Storage(_) => "storage",
        }
    }
}

#[derive(Error, Debug, Clone, PartialEq)]
pub enum ValidationError {
    #[error("Operation is for consumable {operation} but was applied to {consumable}")]
    OperationSubjectMismatch {
        operation: ConsumableId,
        consumable: ConsumableId,
    },

    #[error("Consumable {0} is disposed; no further operations are allowed")]
    ConsumableDisposed(String),

    #[error("Consumable {serial} cannot be installed while {status}")]
    NotInstallable {
        serial: String,
        status: ConsumableStatus,
    },

    #[error("A printer is required for install")]
    PrinterRequired,

    #[error("A printer may only be given for install, not {0}")]
    PrinterNotAllowed(OperationType),

    #[error("Printer {0} is not active")]
    PrinterInactive(PrinterId),

    #[error("Printer {printer} is at {printer_location}, not {destination}")]
    PrinterNotAtDestination {
        printer: PrinterId,
        printer_location: LocationId,
        destination: LocationId,
    },

    #[error("Consumable {serial} is {status}; receive_service requires at_service")]
    NotAtService {
        serial: String,
        status: ConsumableStatus,
    },

    #[error("Serial number already in use: {0}")]
    DuplicateSerial(String),

    #[error("Invalid serial number: {0}")]
    InvalidSerialNumber(String),

    #[error("{0} cannot be empty")]
    EmptyField(&'static str),

    #[error("{field} too long: {len} characters (max {max})")]
    FieldTooLong {
        field: &'static str,
        len: usize,
        max: usize,
    },

    #[error("max_refills must be positive, got {0}")]
    InvalidMaxRefills(u32),
}

#[derive(Error, Debug, Clone, PartialEq)]
pub enum NotFoundError {
    #[error("Consumable not found: {0}")]
    Consumable(ConsumableId),

    #[error("Consumable with serial number not found: {0}")]
    ConsumableSerial(String),

    #[error("Printer not found: {0}")]
    Printer(PrinterId),

    #[error("Location not found: {0}")]
    Location(LocationId),

    #[error("Consumable model not found: {0}")]
    Model(ModelId),
}

#[derive(Error, Debug, Clone, PartialEq)]
pub enum ConfigurationError {
    #[error("No active service center is configured")]
    NoServiceCenter,

    #[error("Expected exactly one active service center, found {0}")]
    AmbiguousServiceCenter(usize),
}

/// A write was attempted from a stale read of the consumable.
#[derive(Error, Debug, Clone, PartialEq)]
#[error("Consumable {consumable} was modified concurrently (expected version {expected}, found {found})")]
pub struct ConflictError {
    pub consumable: ConsumableId,
    pub expected: u64,
    pub found: u64,
}

#[derive(Error, Debug, Clone, PartialEq)]
pub enum StorageError {
    #[error("{0}")]
    NotFound(#[from] NotFoundError),

    #[error("{0}")]
    Conflict(#[from] ConflictError),

    #[error("Serial number already in use: {0}")]
    DuplicateSerial(String),

    #[error("Database error: {0}")]
    Database(String),
}
