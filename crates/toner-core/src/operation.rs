use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::consumable::ConsumableStatus;
use crate::ids::{ConsumableId, LocationId, OperationId, PrinterId, UserId};

/// Kind of a discrete lifecycle event.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OperationType {
    Receipt,
    IssueService,
    ReceiveService,
    Install,
    Remove,
    Transfer,
    Dispose,
}

impl OperationType {
    pub const ALL: [OperationType; 7] = [
        OperationType::Receipt,
        OperationType::IssueService,
        OperationType::ReceiveService,
        OperationType::Install,
        OperationType::Remove,
        OperationType::Transfer,
        OperationType::Dispose,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            OperationType::Receipt => "receipt",
            OperationType::IssueService => "issue_service",
            OperationType::ReceiveService => "receive_service",
            OperationType::Install => "install",
            OperationType::Remove => "remove",
            OperationType::Transfer => "transfer",
            OperationType::Dispose => "dispose",
        }
    }

    /// Status a consumable ends up in after this operation.
    pub fn resulting_status(&self) -> ConsumableStatus {
        match self {
            OperationType::Receipt => ConsumableStatus::InStock,
            OperationType::IssueService => ConsumableStatus::AtService,
            OperationType::ReceiveService => ConsumableStatus::InStock,
            OperationType::Install => ConsumableStatus::Installed,
            OperationType::Remove => ConsumableStatus::InStock,
            OperationType::Transfer => ConsumableStatus::InTransit,
            OperationType::Dispose => ConsumableStatus::Disposed,
        }
    }

    pub fn requires_printer(&self) -> bool {
        matches!(self, OperationType::Install)
    }
}

impl std::fmt::Display for OperationType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for OperationType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        OperationType::ALL
            .into_iter()
            .find(|t| t.as_str() == s)
            .ok_or_else(|| format!("unknown operation type: {}", s))
    }
}

/// An immutable ledger entry. Corrections are new entries, never edits.
///
/// `sequence` is assigned by the ledger when the entry is committed and
/// orders all entries globally.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Operation {
    pub id: OperationId,
    #[serde(default)]
    pub sequence: u64,
    pub operation_type: OperationType,
    pub consumable: ConsumableId,
    pub from_location: LocationId,
    pub to_location: LocationId,
    pub printer: Option<PrinterId>,
    pub user: UserId,
    pub timestamp: DateTime<Utc>,
    #[serde(default)]
    pub reason: String,
    #[serde(default)]
    pub notes: String,
}

impl Operation {
    pub fn new(
        operation_type: OperationType,
        consumable: ConsumableId,
        from_location: LocationId,
        to_location: LocationId,
        user: UserId,
        timestamp: DateTime<Utc>,
    ) -> Self {
        Self {
            id: OperationId::new(),
            sequence: 0,
            operation_type,
            consumable,
            from_location,
            to_location,
            printer: None,
            user,
            timestamp,
            reason: String::new(),
            notes: String::new(),
        }
    }

    pub fn with_printer(mut self, printer: PrinterId) -> Self {
        self.printer = Some(printer);
        self
    }

    pub fn with_reason(mut self, reason: impl Into<String>) -> Self {
        self.reason = reason.into();
        self
    }
}

/// A caller's request to record an operation against a consumable.
///
/// `from_location` defaults to the consumable's current location.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OperationRequest {
    pub consumable: ConsumableId,
    pub operation_type: OperationType,
    #[serde(default)]
    pub from_location: Option<LocationId>,
    pub to_location: LocationId,
    #[serde(default)]
    pub printer: Option<PrinterId>,
    #[serde(default)]
    pub reason: String,
    #[serde(default)]
    pub notes: String,
}

impl OperationRequest {
    pub fn new(
        consumable: ConsumableId,
        operation_type: OperationType,
        to_location: LocationId,
    ) -> Self {
        Self {
            consumable,
            operation_type,
            from_location: None,
            to_location,
            printer: None,
            reason: String::new(),
            notes: String::new(),
        }
    }

    pub fn with_printer(mut self, printer: PrinterId) -> Self {
        self.printer = Some(printer);
        self
    }

    pub fn with_reason(mut self, reason: impl Into<String>) -> Self {
        self.reason = reason.into();
        self
    }
}
