use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use serde::Deserialize;
use tracing::info;

use crate::workflows::events::{EventError, EventSink, MaterialEvent};
use crate::workflows::visits::domain::VisitId;
use crate::workflows::visits::repository::{Clock, RepositoryError};

use super::material::{Material, MaterialCategory, MaterialId};
use super::quantity::{MaterialQuantity, StockError};
use super::repository::MaterialRepository;

/// Service composing the material store and event sink. Operations against
/// the same material are expected to be serialized by the repository.
pub struct MaterialLedgerService<M, E> {
    materials: Arc<M>,
    events: Arc<E>,
    clock: Arc<dyn Clock>,
}

static MATERIAL_SEQUENCE: AtomicU64 = AtomicU64::new(1);

fn next_material_id() -> MaterialId {
    let id = MATERIAL_SEQUENCE.fetch_add(1, Ordering::Relaxed);
    MaterialId(format!("mat-{id:06}"))
}

/// Input for registering a material in the ledger.
#[derive(Debug, Clone, Deserialize)]
pub struct RegisterMaterialRequest {
    pub code: String,
    pub name: String,
    pub category: MaterialCategory,
    pub initial_stock: MaterialQuantity,
    pub minimum_stock: MaterialQuantity,
    pub unit_cost: f64,
    #[serde(default)]
    pub supplier: Option<String>,
}

impl<M, E> MaterialLedgerService<M, E>
where
    M: MaterialRepository + 'static,
    E: EventSink + 'static,
{
    pub fn new(materials: Arc<M>, events: Arc<E>, clock: Arc<dyn Clock>) -> Self {
        Self {
            materials,
            events,
            clock,
        }
    }

    pub fn register(
        &self,
        request: RegisterMaterialRequest,
    ) -> Result<MaterialId, MaterialServiceError> {
        let id = next_material_id();
        let mut material = Material::new(
            id.clone(),
            &request.code,
            &request.name,
            request.category,
            request.initial_stock,
            request.minimum_stock,
            request.unit_cost,
        )?;
        if let Some(supplier) = &request.supplier {
            material.set_supplier(supplier);
        }
        self.materials.insert(&material)?;
        info!(material = %id.0, code = %material.code(), "material registered");
        Ok(id)
    }

    pub fn restock(
        &self,
        id: &MaterialId,
        quantity: MaterialQuantity,
        performed_by: &str,
    ) -> Result<(), MaterialServiceError> {
        let now = self.clock.now();
        self.with_material(id, |material| {
            Ok(material.add_stock(quantity, performed_by, now)?)
        })
    }

    /// Place a provisional claim for a visit; stock stays untouched until
    /// the claim is consumed.
    pub fn reserve(
        &self,
        id: &MaterialId,
        visit_id: VisitId,
        quantity: MaterialQuantity,
    ) -> Result<(), MaterialServiceError> {
        let now = self.clock.now();
        self.with_material(id, |material| {
            Ok(material.reserve(quantity, visit_id, now)?)
        })
    }

    pub fn consume_for_visit(
        &self,
        id: &MaterialId,
        visit_id: &VisitId,
        performed_by: &str,
    ) -> Result<(), MaterialServiceError> {
        let now = self.clock.now();
        self.with_material(id, |material| {
            Ok(material.consume_for_visit(visit_id, performed_by, now)?)
        })
    }

    pub fn adjust(
        &self,
        id: &MaterialId,
        new_level: MaterialQuantity,
        reason: &str,
        performed_by: &str,
    ) -> Result<(), MaterialServiceError> {
        let now = self.clock.now();
        self.with_material(id, |material| {
            Ok(material.adjust_stock(new_level, reason, performed_by, now)?)
        })
    }

    pub fn return_stock(
        &self,
        id: &MaterialId,
        quantity: MaterialQuantity,
        reason: &str,
        performed_by: &str,
    ) -> Result<(), MaterialServiceError> {
        let now = self.clock.now();
        self.with_material(id, |material| {
            Ok(material.return_stock(quantity, reason, performed_by, now)?)
        })
    }

    pub fn get(&self, id: &MaterialId) -> Result<Material, MaterialServiceError> {
        Ok(self.materials.fetch(id)?)
    }

    fn with_material<T>(
        &self,
        id: &MaterialId,
        mutate: impl FnOnce(&mut Material) -> Result<T, MaterialServiceError>,
    ) -> Result<T, MaterialServiceError> {
        let mut material = self.materials.fetch(id)?;
        let value = mutate(&mut material)?;
        self.materials.update(&material)?;
        self.dispatch(material.take_events())?;
        Ok(value)
    }

    fn dispatch(&self, events: Vec<MaterialEvent>) -> Result<(), MaterialServiceError> {
        for event in events {
            self.events.publish(event.into())?;
        }
        Ok(())
    }
}

/// Error raised by the material ledger service.
#[derive(Debug, thiserror::Error)]
pub enum MaterialServiceError {
    #[error(transparent)]
    Stock(#[from] StockError),
    #[error(transparent)]
    Repository(#[from] RepositoryError),
    #[error(transparent)]
    Event(#[from] EventError),
}
