use serde::{Deserialize, Serialize};

use crate::consumable::{Condition, Consumable, ConsumableKind, ConsumableStatus};
use crate::ids::{LocationId, ModelId};
use crate::reference::{Printer, PrinterType};

/// Predicate over consumables. Empty fields match everything.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ConsumableFilter {
    #[serde(default)]
    pub kind: Option<ConsumableKind>,
    #[serde(default)]
    pub statuses: Vec<ConsumableStatus>,
    #[serde(default)]
    pub conditions: Vec<Condition>,
    #[serde(default)]
    pub model: Option<ModelId>,
    #[serde(default)]
    pub location: Option<LocationId>,
}

impl ConsumableFilter {
    pub fn new() -> Self {
        Self::default()
    }

    /// Consumables needing repair that are in stock or installed: the
    /// default selection for a send-to-service batch.
    pub fn needs_repair_in_use() -> Self {
        Self::new()
            .with_conditions([Condition::NeedsRepair])
            .with_statuses([ConsumableStatus::InStock, ConsumableStatus::Installed])
    }

    pub fn with_kind(mut self, kind: ConsumableKind) -> Self {
        self.kind = Some(kind);
        self
    }

    pub fn with_statuses(mut self, statuses: impl IntoIterator<Item = ConsumableStatus>) -> Self {
        self.statuses = statuses.into_iter().collect();
        self
    }

    pub fn with_conditions(mut self, conditions: impl IntoIterator<Item = Condition>) -> Self {
        self.conditions = conditions.into_iter().collect();
        self
    }

    pub fn with_model(mut self, model: ModelId) -> Self {
        self.model = Some(model);
        self
    }

    pub fn with_location(mut self, location: LocationId) -> Self {
        self.location = Some(location);
        self
    }

    pub fn matches(&self, c: &Consumable) -> bool {
        self.kind.map_or(true, |k| c.kind == k)
            && (self.statuses.is_empty() || self.statuses.contains(&c.status))
            && (self.conditions.is_empty() || self.conditions.contains(&c.condition))
            && self.model.map_or(true, |m| c.model == m)
            && self.location.map_or(true, |l| c.current_location == l)
    }
}

/// Predicate over printers for list queries.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PrinterFilter {
    #[serde(default)]
    pub printer_type: Option<PrinterType>,
    #[serde(default)]
    pub is_inkjet: Option<bool>,
    #[serde(default)]
    pub location: Option<LocationId>,
    #[serde(default)]
    pub active_only: bool,
}

impl PrinterFilter {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_type(mut self, printer_type: PrinterType) -> Self {
        self.printer_type = Some(printer_type);
        self
    }

    pub fn with_inkjet(mut self, is_inkjet: bool) -> Self {
        self.is_inkjet = Some(is_inkjet);
        self
    }

    /// Restrict to active printers at `location`.
    pub fn active_at(mut self, location: LocationId) -> Self {
        self.location = Some(location);
        self.active_only = true;
        self
    }

    pub fn matches(&self, p: &Printer) -> bool {
        self.printer_type.map_or(true, |t| p.printer_type == t)
            && self.is_inkjet.map_or(true, |i| p.is_inkjet == i)
            && self.location.map_or(true, |l| p.location == l)
            && (!self.active_only || p.is_active)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::consumable::NewConsumable;
    use chrono::Utc;

    fn make(kind: ConsumableKind, status: ConsumableStatus, condition: Condition) -> Consumable {
        let mut c = Consumable::from_new(
            NewConsumable::new("X", kind, ModelId::new(), LocationId::new()),
            Utc::now(),
        );
        c.status = status;
        c.condition = condition;
        c
    }

    #[test]
    fn test_empty_filter_matches_all() {
        let c = make(ConsumableKind::Drum, ConsumableStatus::Disposed, Condition::Working);
        assert!(ConsumableFilter::new().matches(&c));
    }

    #[test]
    fn test_needs_repair_in_use() {
        let filter = ConsumableFilter::needs_repair_in_use();

        assert!(filter.matches(&make(
            ConsumableKind::Cartridge,
            ConsumableStatus::InStock,
            Condition::NeedsRepair
        )));
        assert!(filter.matches(&make(
            ConsumableKind::Drum,
            ConsumableStatus::Installed,
            Condition::NeedsRepair
        )));
        assert!(!filter.matches(&make(
            ConsumableKind::Cartridge,
            ConsumableStatus::AtService,
            Condition::NeedsRepair
        )));
        assert!(!filter.matches(&make(
            ConsumableKind::Cartridge,
            ConsumableStatus::InStock,
            Condition::Working
        )));
    }

    #[test]
    fn test_kind_and_location() {
        let c = make(ConsumableKind::Drum, ConsumableStatus::InStock, Condition::New);

        assert!(ConsumableFilter::new()
            .with_kind(ConsumableKind::Drum)
            .with_location(c.current_location)
            .matches(&c));
        assert!(!ConsumableFilter::new()
            .with_kind(ConsumableKind::Cartridge)
            .matches(&c));
        assert!(!ConsumableFilter::new()
            .with_location(LocationId::new())
            .matches(&c));
    }

    #[test]
    fn test_printer_filter_by_type_and_inkjet() {
        let office = LocationId::new();
        let laser = Printer::new("Hall", "HP M404", "PR-1", PrinterType::Laser, office);
        let inkjet = Printer::new("Desk", "Epson L3150", "PR-2", PrinterType::Inkjet, office);
        let mut mfp = Printer::new("Copy", "Canon MF443", "PR-3", PrinterType::Multifunction, office);
        mfp.is_inkjet = true;
        mfp.is_active = false;

        let all = PrinterFilter::new();
        assert!(all.matches(&laser) && all.matches(&inkjet) && all.matches(&mfp));

        let lasers = PrinterFilter::new().with_type(PrinterType::Laser);
        assert!(lasers.matches(&laser));
        assert!(!lasers.matches(&inkjet));

        let ink = PrinterFilter::new().with_inkjet(true);
        assert!(!ink.matches(&laser));
        assert!(ink.matches(&inkjet));
        assert!(ink.matches(&mfp));

        let active_here = PrinterFilter::new().with_inkjet(true).active_at(office);
        assert!(active_here.matches(&inkjet));
        assert!(!active_here.matches(&mfp));
        assert!(!PrinterFilter::new().active_at(LocationId::new()).matches(&laser));
    }
}
