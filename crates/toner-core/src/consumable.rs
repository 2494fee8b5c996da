use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

use crate::ids::{ConsumableId, LocationId, ModelId, OperationId, PrinterId};
use crate::reference::ConsumableModel;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ConsumableKind {
    Cartridge,
    Drum,
}

impl ConsumableKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            ConsumableKind::Cartridge => "cartridge",
            ConsumableKind::Drum => "drum",
        }
    }
}

impl std::fmt::Display for ConsumableKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ConsumableStatus {
    InStock,
    InTransit,
    AtService,
    InReserve,
    Installed,
    Disposed,
}

impl ConsumableStatus {
    pub const ALL: [ConsumableStatus; 6] = [
        ConsumableStatus::InStock,
        ConsumableStatus::InTransit,
        ConsumableStatus::AtService,
        ConsumableStatus::InReserve,
        ConsumableStatus::Installed,
        ConsumableStatus::Disposed,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            ConsumableStatus::InStock => "in_stock",
            ConsumableStatus::InTransit => "in_transit",
            ConsumableStatus::AtService => "at_service",
            ConsumableStatus::InReserve => "in_reserve",
            ConsumableStatus::Installed => "installed",
            ConsumableStatus::Disposed => "disposed",
        }
    }

    /// Disposed is terminal: nothing may change it afterwards.
    pub fn is_terminal(&self) -> bool {
        matches!(self, ConsumableStatus::Disposed)
    }
}

impl std::fmt::Display for ConsumableStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Condition {
    #[default]
    New,
    Working,
    NeedsRepair,
    Refilled,
}

impl Condition {
    pub fn as_str(&self) -> &'static str {
        match self {
            Condition::New => "new",
            Condition::Working => "working",
            Condition::NeedsRepair => "needs_repair",
            Condition::Refilled => "refilled",
        }
    }
}

impl std::fmt::Display for Condition {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A tracked cartridge or drum.
///
/// Lifecycle fields (`status`, `current_location`, `installed_in_printer`,
/// `refill_count`, `condition`) only change through the transition engine.
/// `version` is bumped on every applied operation and is what stores compare
/// against to reject stale writes.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Consumable {
    pub id: ConsumableId,
    pub serial_number: String,
    pub kind: ConsumableKind,
    pub model: ModelId,
    pub status: ConsumableStatus,
    pub current_location: LocationId,
    pub installed_in_printer: Option<PrinterId>,
    pub refill_count: u32,
    pub condition: Condition,
    pub date_of_introduction: NaiveDate,
    #[serde(default)]
    pub notes: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub version: u64,
    pub last_operation: Option<OperationId>,
}

impl Consumable {
    /// Build the initial in-stock record for a newly received consumable.
    pub fn from_new(new: NewConsumable, now: DateTime<Utc>) -> Self {
        Self {
            id: ConsumableId::new(),
            serial_number: new.serial_number,
            kind: new.kind,
            model: new.model,
            status: ConsumableStatus::InStock,
            current_location: new.location,
            installed_in_printer: None,
            refill_count: 0,
            condition: new.condition,
            date_of_introduction: new.date_of_introduction.unwrap_or_else(|| now.date_naive()),
            notes: new.notes,
            created_at: now,
            updated_at: now,
            version: 0,
            last_operation: None,
        }
    }

    /// Force `needs_repair` once the refill ceiling is exceeded. Never clears it.
    pub fn enforce_refill_ceiling(&mut self, max_refills: u32) {
        if self.refill_count > max_refills {
            self.condition = Condition::NeedsRepair;
        }
    }

    /// Whether the printer reference agrees with the status.
    pub fn printer_matches_status(&self) -> bool {
        (self.status == ConsumableStatus::Installed) == self.installed_in_printer.is_some()
    }

    /// Whether dashboards should flag this consumable: it needs repair, or it
    /// has reached its model's refill ceiling.
    pub fn needs_attention(&self, model: &ConsumableModel) -> bool {
        self.condition == Condition::NeedsRepair || self.refill_count >= model.max_refills
    }
}

impl std::fmt::Display for Consumable {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{} {}", self.kind, self.serial_number)
    }
}

/// Input for registering a consumable with its initial receipt.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NewConsumable {
    pub serial_number: String,
    #[serde(default = "default_kind")]
    pub kind: ConsumableKind,
    pub model: ModelId,
    pub location: LocationId,
    #[serde(default)]
    pub condition: Condition,
    #[serde(default)]
    pub date_of_introduction: Option<NaiveDate>,
    #[serde(default)]
    pub notes: String,
}

fn default_kind() -> ConsumableKind {
    ConsumableKind::Cartridge
}

impl NewConsumable {
    pub fn new(
        serial_number: impl Into<String>,
        kind: ConsumableKind,
        model: ModelId,
        location: LocationId,
    ) -> Self {
        Self {
            serial_number: serial_number.into(),
            kind,
            model,
            location,
            condition: Condition::New,
            date_of_introduction: None,
            notes: String::new(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn make_consumable(refill_count: u32, condition: Condition) -> Consumable {
        let new = NewConsumable {
            condition,
            ..NewConsumable::new("C-001", ConsumableKind::Cartridge, ModelId::new(), LocationId::new())
        };
        let mut c = Consumable::from_new(new, Utc::now());
        c.refill_count = refill_count;
        c
    }

    #[test]
    fn test_from_new_starts_in_stock() {
        let c = make_consumable(0, Condition::New);

        assert_eq!(c.status, ConsumableStatus::InStock);
        assert_eq!(c.refill_count, 0);
        assert_eq!(c.installed_in_printer, None);
        assert_eq!(c.version, 0);
        assert!(c.printer_matches_status());
    }

    #[test]
    fn test_refill_ceiling_forces_needs_repair() {
        let mut c = make_consumable(3, Condition::Refilled);
        c.enforce_refill_ceiling(2);
        assert_eq!(c.condition, Condition::NeedsRepair);
    }

    #[test]
    fn test_refill_ceiling_at_limit_leaves_condition() {
        let mut c = make_consumable(2, Condition::Refilled);
        c.enforce_refill_ceiling(2);
        assert_eq!(c.condition, Condition::Refilled);
    }

    #[test]
    fn test_refill_ceiling_never_clears_needs_repair() {
        let mut c = make_consumable(0, Condition::NeedsRepair);
        c.enforce_refill_ceiling(5);
        assert_eq!(c.condition, Condition::NeedsRepair);
    }

    #[test]
    fn test_needs_attention() {
        let model = ConsumableModel::new("CF259A", "HP", 2);

        assert!(!make_consumable(1, Condition::Working).needs_attention(&model));
        assert!(make_consumable(2, Condition::Refilled).needs_attention(&model));
        assert!(make_consumable(0, Condition::NeedsRepair).needs_attention(&model));
    }

    #[test]
    fn test_status_wire_names() {
        let json = serde_json::to_string(&ConsumableStatus::AtService).unwrap();
        assert_eq!(json, "\"at_service\"");
        assert_eq!(ConsumableStatus::InStock.to_string(), "in_stock");
    }
}
