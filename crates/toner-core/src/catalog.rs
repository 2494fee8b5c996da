use std::sync::Arc;

use crate::error::{CoreError, NotFoundError};
use crate::filter::PrinterFilter;
use crate::ids::{LocationId, PrinterId};
use crate::operation::OperationType;
use crate::reference::{ConsumableModel, Location, Printer};
use crate::storage::{ReferenceResolver, ReferenceStore};
use crate::validation::Validator;

/// Administrative access to reference data.
pub struct Catalog {
    store: Arc<dyn ReferenceStore>,
    resolver: Arc<dyn ReferenceResolver>,
}

impl Catalog {
    pub fn new(store: Arc<dyn ReferenceStore>, resolver: Arc<dyn ReferenceResolver>) -> Self {
        Self { store, resolver }
    }

    pub fn resolver(&self) -> &dyn ReferenceResolver {
        self.resolver.as_ref()
    }

    pub fn save_location(&self, location: Location) -> Result<Location, CoreError> {
        Validator::validate_location(&location)?;
        self.store.put_location(location.clone())?;
        Ok(location)
    }

    pub fn save_printer(&self, printer: Printer) -> Result<Printer, CoreError> {
        Validator::validate_printer(&printer)?;
        self.location(printer.location)?;
        self.store.put_printer(printer.clone())?;
        Ok(printer)
    }

    pub fn save_model(&self, model: ConsumableModel) -> Result<ConsumableModel, CoreError> {
        Validator::validate_model(&model)?;
        self.store.put_model(model.clone())?;
        Ok(model)
    }

    pub fn location(&self, id: LocationId) -> Result<Location, CoreError> {
        self.store
            .get_location(id)?
            .ok_or_else(|| NotFoundError::Location(id).into())
    }

    pub fn printer(&self, id: PrinterId) -> Result<Printer, CoreError> {
        self.store
            .get_printer(id)?
            .ok_or_else(|| NotFoundError::Printer(id).into())
    }

    pub fn locations(&self) -> Result<Vec<Location>, CoreError> {
        Ok(self.store.list_locations()?)
    }

    pub fn models(&self) -> Result<Vec<ConsumableModel>, CoreError> {
        Ok(self.store.list_models()?)
    }

    pub fn printers_matching(&self, filter: &PrinterFilter) -> Result<Vec<Printer>, CoreError> {
        let printers = match filter.location {
            Some(location) if filter.active_only => {
                self.resolver.find_active_printers_by_location(location)?
            }
            _ => self.store.list_printers()?,
        };
        Ok(printers.into_iter().filter(|p| filter.matches(p)).collect())
    }

    /// Candidate destinations for an operation: installs can only target
    /// active locations that have an active printer.
    pub fn locations_for(&self, operation_type: OperationType) -> Result<Vec<Location>, CoreError> {
        let active = self.store.list_locations()?.into_iter().filter(|l| l.is_active);

        if operation_type != OperationType::Install {
            return Ok(active.collect());
        }

        let mut with_printers = Vec::new();
        for location in active {
            if !self
                .resolver
                .find_active_printers_by_location(location.id)?
                .is_empty()
            {
                with_printers.push(location);
            }
        }
        Ok(with_printers)
    }
}
