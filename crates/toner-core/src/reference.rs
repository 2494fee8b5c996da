//! Reference data: locations, printers and consumable models.
//!
//! These entities carry identity and attributes only. They are edited by
//! administrators and referenced by consumables and ledger entries.

use chrono::{NaiveDate, Utc};
use serde::{Deserialize, Serialize};

use crate::ids::{LocationId, ModelId, PrinterId};

/// Refill ceiling used when a model does not specify one.
pub const DEFAULT_MAX_REFILLS: u32 = 5;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LocationType {
    Warehouse,
    Office,
    Service,
}

impl LocationType {
    pub fn as_str(&self) -> &'static str {
        match self {
            LocationType::Warehouse => "warehouse",
            LocationType::Office => "office",
            LocationType::Service => "service",
        }
    }
}

impl std::fmt::Display for LocationType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Location {
    pub id: LocationId,
    pub name: String,
    #[serde(rename = "type")]
    pub location_type: LocationType,
    #[serde(default)]
    pub contact_person: String,
    #[serde(default)]
    pub phone: String,
    pub is_active: bool,
}

impl Location {
    pub fn new(name: impl Into<String>, location_type: LocationType) -> Self {
        Self {
            id: LocationId::new(),
            name: name.into(),
            location_type,
            contact_person: String::new(),
            phone: String::new(),
            is_active: true,
        }
    }

    pub fn with_contact(mut self, person: impl Into<String>, phone: impl Into<String>) -> Self {
        self.contact_person = person.into();
        self.phone = phone.into();
        self
    }

    pub fn is_active_service_center(&self) -> bool {
        self.is_active && self.location_type == LocationType::Service
    }
}

impl std::fmt::Display for Location {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{} ({})", self.name, self.location_type)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PrinterType {
    Laser,
    Inkjet,
    Multifunction,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Printer {
    pub id: PrinterId,
    pub name: String,
    pub model: String,
    pub serial_number: String,
    pub printer_type: PrinterType,
    pub is_inkjet: bool,
    pub location: LocationId,
    pub installation_date: NaiveDate,
    pub is_active: bool,
    #[serde(default)]
    pub notes: String,
}

impl Printer {
    /// Create an active printer installed today. Inkjet printers get the
    /// ink flag set.
    pub fn new(
        name: impl Into<String>,
        model: impl Into<String>,
        serial_number: impl Into<String>,
        printer_type: PrinterType,
        location: LocationId,
    ) -> Self {
        Self {
            id: PrinterId::new(),
            name: name.into(),
            model: model.into(),
            serial_number: serial_number.into(),
            printer_type,
            is_inkjet: printer_type == PrinterType::Inkjet,
            location,
            installation_date: Utc::now().date_naive(),
            is_active: true,
            notes: String::new(),
        }
    }
}

impl std::fmt::Display for Printer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{} ({})", self.model, self.serial_number)
    }
}

/// A cartridge or drum model. `max_refills` is the refill ceiling the
/// transition engine enforces.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ConsumableModel {
    pub id: ModelId,
    pub name: String,
    pub manufacturer: String,
    #[serde(default)]
    pub compatible_printers: String,
    pub max_refills: u32,
    #[serde(default)]
    pub refill_instructions: String,
}

impl ConsumableModel {
    pub fn new(name: impl Into<String>, manufacturer: impl Into<String>, max_refills: u32) -> Self {
        Self {
            id: ModelId::new(),
            name: name.into(),
            manufacturer: manufacturer.into(),
            compatible_printers: String::new(),
            max_refills,
            refill_instructions: String::new(),
        }
    }
}

impl std::fmt::Display for ConsumableModel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{} {}", self.manufacturer, self.name)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_inkjet_flag_follows_type() {
        let loc = LocationId::new();
        let inkjet = Printer::new("Front desk", "Epson L3150", "EP-1", PrinterType::Inkjet, loc);
        let laser = Printer::new("Accounting", "HP M404", "HP-1", PrinterType::Laser, loc);

        assert!(inkjet.is_inkjet);
        assert!(!laser.is_inkjet);
        assert!(inkjet.is_active);
    }

    #[test]
    fn test_active_service_center() {
        let mut service = Location::new("Service-Center", LocationType::Service);
        let warehouse = Location::new("Warehouse-A", LocationType::Warehouse);

        assert!(service.is_active_service_center());
        assert!(!warehouse.is_active_service_center());

        service.is_active = false;
        assert!(!service.is_active_service_center());
    }

    #[test]
    fn test_display() {
        let model = ConsumableModel::new("CF259A", "HP", 3);
        assert_eq!(model.to_string(), "HP CF259A");

        let loc = Location::new("Warehouse-A", LocationType::Warehouse);
        assert_eq!(loc.to_string(), "Warehouse-A (warehouse)");
    }

    #[test]
    fn test_location_type_wire_name() {
        let loc = Location::new("Service-Center", LocationType::Service);
        let json = serde_json::to_value(&loc).unwrap();
        assert_eq!(json["type"], "service");
    }
}
