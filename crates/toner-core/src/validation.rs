use crate::consumable::NewConsumable;
use crate::error::ValidationError;
use crate::ids::LocationId;
use crate::reference::{ConsumableModel, Location, Printer};

pub const MAX_SERIAL_LEN: usize = 100;
pub const MAX_NAME_LEN: usize = 200;
pub const MAX_MANUFACTURER_LEN: usize = 100;
pub const MAX_CONTACT_LEN: usize = 100;
pub const MAX_PHONE_LEN: usize = 20;

/// Field-level validation for records entering the system.
pub struct Validator;

impl Validator {
    /// Serial numbers must be non-empty, at most 100 chars and free of
    /// whitespace and control characters.
    pub fn validate_serial_number(serial: &str) -> Result<(), ValidationError> {
        if serial.is_empty() {
            return Err(ValidationError::EmptyField("serial_number"));
        }
        if serial.chars().count() > MAX_SERIAL_LEN {
            return Err(ValidationError::FieldTooLong {
                field: "serial_number",
                len: serial.chars().count(),
                max: MAX_SERIAL_LEN,
            });
        }
        if serial
            .chars()
            .any(|c| c.is_whitespace() || c.is_control())
        {
            return Err(ValidationError::InvalidSerialNumber(format!(
                "serial number contains whitespace or control characters: {:?}",
                serial
            )));
        }
        Ok(())
    }

    fn validate_required(
        field: &'static str,
        value: &str,
        max: usize,
    ) -> Result<(), ValidationError> {
        if value.trim().is_empty() {
            return Err(ValidationError::EmptyField(field));
        }
        Self::validate_optional(field, value, max)
    }

    fn validate_optional(
        field: &'static str,
        value: &str,
        max: usize,
    ) -> Result<(), ValidationError> {
        let len = value.chars().count();
        if len > max {
            return Err(ValidationError::FieldTooLong { field, len, max });
        }
        Ok(())
    }

    pub fn validate_location(location: &Location) -> Result<(), ValidationError> {
        Self::validate_required("name", &location.name, MAX_NAME_LEN)?;
        Self::validate_optional("contact_person", &location.contact_person, MAX_CONTACT_LEN)?;
        Self::validate_optional("phone", &location.phone, MAX_PHONE_LEN)?;
        Ok(())
    }

    pub fn validate_printer(printer: &Printer) -> Result<(), ValidationError> {
        Self::validate_required("name", &printer.name, MAX_NAME_LEN)?;
        Self::validate_required("model", &printer.model, MAX_MANUFACTURER_LEN)?;
        Self::validate_serial_number(&printer.serial_number)?;
        Ok(())
    }

    pub fn validate_model(model: &ConsumableModel) -> Result<(), ValidationError> {
        Self::validate_required("name", &model.name, MAX_NAME_LEN)?;
        Self::validate_required("manufacturer", &model.manufacturer, MAX_MANUFACTURER_LEN)?;
        if model.max_refills == 0 {
            return Err(ValidationError::InvalidMaxRefills(model.max_refills));
        }
        Ok(())
    }

    pub fn validate_new_consumable(new: &NewConsumable) -> Result<(), ValidationError> {
        Self::validate_serial_number(&new.serial_number)
    }

    /// An install target must be an active printer standing at the
    /// destination location.
    pub fn validate_install_target(
        printer: &Printer,
        destination: LocationId,
    ) -> Result<(), ValidationError> {
        if !printer.is_active {
            return Err(ValidationError::PrinterInactive(printer.id));
        }
        if printer.location != destination {
            return Err(ValidationError::PrinterNotAtDestination {
                printer: printer.id,
                printer_location: printer.location,
                destination,
            });
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::reference::{LocationType, PrinterType};

    #[test]
    fn test_valid_serial_numbers() {
        assert!(Validator::validate_serial_number("C-001").is_ok());
        assert!(Validator::validate_serial_number("CF259A/2024#17").is_ok());
        assert!(Validator::validate_serial_number(&"A".repeat(100)).is_ok());
    }

    #[test]
    fn test_invalid_serial_numbers() {
        assert_eq!(
            Validator::validate_serial_number(""),
            Err(ValidationError::EmptyField("serial_number"))
        );
        assert!(Validator::validate_serial_number("C 001").is_err());
        assert!(Validator::validate_serial_number("C-001\n").is_err());
        assert!(Validator::validate_serial_number(&"A".repeat(101)).is_err());
    }

    #[test]
    fn test_model_requires_positive_max_refills() {
        let mut model = ConsumableModel::new("CF259A", "HP", 3);
        assert!(Validator::validate_model(&model).is_ok());

        model.max_refills = 0;
        assert_eq!(
            Validator::validate_model(&model),
            Err(ValidationError::InvalidMaxRefills(0))
        );
    }

    #[test]
    fn test_location_field_lengths() {
        let loc = Location::new("Warehouse-A", LocationType::Warehouse);
        assert!(Validator::validate_location(&loc).is_ok());

        let long_phone = loc.clone().with_contact("Anna", "1".repeat(21));
        assert!(matches!(
            Validator::validate_location(&long_phone),
            Err(ValidationError::FieldTooLong { field: "phone", .. })
        ));

        let blank = Location::new("   ", LocationType::Office);
        assert_eq!(
            Validator::validate_location(&blank),
            Err(ValidationError::EmptyField("name"))
        );
    }

    #[test]
    fn test_printer_serial_is_checked() {
        let printer = Printer::new("Hall", "HP M404", "bad serial", PrinterType::Laser, LocationId::new());
        assert!(matches!(
            Validator::validate_printer(&printer),
            Err(ValidationError::InvalidSerialNumber(_))
        ));
    }

    #[test]
    fn test_install_target_must_be_active_and_local() {
        let office = LocationId::new();
        let warehouse = LocationId::new();
        let mut printer = Printer::new("Hall", "HP M404", "PR-1", PrinterType::Laser, office);

        assert!(Validator::validate_install_target(&printer, office).is_ok());
        assert_eq!(
            Validator::validate_install_target(&printer, warehouse),
            Err(ValidationError::PrinterNotAtDestination {
                printer: printer.id,
                printer_location: office,
                destination: warehouse,
            })
        );

        printer.is_active = false;
        assert_eq!(
            Validator::validate_install_target(&printer, office),
            Err(ValidationError::PrinterInactive(printer.id))
        );
    }
}
