use std::cmp::Ordering;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::workflows::events::MaterialEvent;
use crate::workflows::visits::domain::VisitId;

use super::quantity::{MaterialQuantity, StockError};

/// Identifier wrapper for materials held in the shared stock ledger.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct MaterialId(pub String);

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MaterialCategory {
    Cable,
    Connector,
    Battery,
    Breaker,
    Filter,
    Consumable,
    Other,
}

/// Kind of stock-affecting operation recorded in the journal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TransactionKind {
    Purchase,
    Usage,
    Adjustment,
    Transfer,
    Return,
}

/// Journal entry capturing a before/after stock snapshot for one operation.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct StockTransaction {
    pub kind: TransactionKind,
    pub quantity: MaterialQuantity,
    pub stock_before: MaterialQuantity,
    pub stock_after: MaterialQuantity,
    pub reason: String,
    pub performed_by: String,
    pub visit_id: Option<VisitId>,
    pub recorded_at: DateTime<Utc>,
}

/// Provisional claim on stock for a specific visit. Consumption is
/// irreversible: once `consumed` flips, the reservation is spent.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MaterialReservation {
    pub visit_id: VisitId,
    pub quantity: MaterialQuantity,
    pub reserved_at: DateTime<Utc>,
    pub consumed: bool,
}

/// Material aggregate owning current stock, the minimum-stock threshold,
/// the transaction journal, and per-visit reservations.
///
/// Reservation and consumption against the same material must be
/// serialized per material identifier by the caller; the aggregate performs
/// the check-then-act itself and assumes single-writer semantics.
#[derive(Debug, Clone)]
pub struct Material {
    id: MaterialId,
    code: String,
    name: String,
    category: MaterialCategory,
    current_stock: MaterialQuantity,
    minimum_stock: MaterialQuantity,
    unit_cost: f64,
    supplier: Option<String>,
    last_restock_at: Option<DateTime<Utc>>,
    is_active: bool,
    transactions: Vec<StockTransaction>,
    reservations: Vec<MaterialReservation>,
    pending_events: Vec<MaterialEvent>,
}

impl Material {
    pub fn new(
        id: MaterialId,
        code: &str,
        name: &str,
        category: MaterialCategory,
        initial_stock: MaterialQuantity,
        minimum_stock: MaterialQuantity,
        unit_cost: f64,
    ) -> Result<Self, StockError> {
        // Threshold comparisons only make sense in the stock's own unit.
        initial_stock.try_cmp(&minimum_stock)?;
        Ok(Self {
            id,
            code: code.to_uppercase(),
            name: name.to_string(),
            category,
            current_stock: initial_stock,
            minimum_stock,
            unit_cost,
            supplier: None,
            last_restock_at: None,
            is_active: true,
            transactions: Vec::new(),
            reservations: Vec::new(),
            pending_events: Vec::new(),
        })
    }

    pub fn id(&self) -> &MaterialId {
        &self.id
    }

    pub fn code(&self) -> &str {
        &self.code
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn category(&self) -> MaterialCategory {
        self.category
    }

    pub fn current_stock(&self) -> &MaterialQuantity {
        &self.current_stock
    }

    pub fn minimum_stock(&self) -> &MaterialQuantity {
        &self.minimum_stock
    }

    pub fn unit_cost(&self) -> f64 {
        self.unit_cost
    }

    pub fn supplier(&self) -> Option<&str> {
        self.supplier.as_deref()
    }

    pub fn last_restock_at(&self) -> Option<DateTime<Utc>> {
        self.last_restock_at
    }

    pub fn is_active(&self) -> bool {
        self.is_active
    }

    pub fn transactions(&self) -> &[StockTransaction] {
        &self.transactions
    }

    pub fn reservations(&self) -> &[MaterialReservation] {
        &self.reservations
    }

    /// Drain events accumulated since the last call. The caller dispatches
    /// them after the aggregate has been durably stored.
    pub fn take_events(&mut self) -> Vec<MaterialEvent> {
        std::mem::take(&mut self.pending_events)
    }

    pub fn set_supplier(&mut self, supplier: &str) {
        self.supplier = Some(supplier.to_string());
    }

    pub fn set_unit_cost(&mut self, unit_cost: f64) {
        self.unit_cost = unit_cost;
    }

    pub fn update_minimum_stock(&mut self, minimum: MaterialQuantity) -> Result<(), StockError> {
        self.current_stock.try_cmp(&minimum)?;
        self.minimum_stock = minimum;
        Ok(())
    }

    pub fn activate(&mut self) {
        self.is_active = true;
    }

    pub fn deactivate(&mut self) {
        self.is_active = false;
    }

    pub fn is_stock_low(&self) -> bool {
        matches!(
            self.current_stock.try_cmp(&self.minimum_stock),
            Ok(Ordering::Less | Ordering::Equal)
        )
    }

    /// Sufficient unreserved-equivalent stock exists: current stock covers
    /// the requested amount and the units match.
    pub fn is_stock_available(&self, requested: &MaterialQuantity) -> bool {
        matches!(
            self.current_stock.try_cmp(requested),
            Ok(Ordering::Greater | Ordering::Equal)
        )
    }

    pub fn add_stock(
        &mut self,
        quantity: MaterialQuantity,
        performed_by: &str,
        now: DateTime<Utc>,
    ) -> Result<(), StockError> {
        let before = self.current_stock.clone();
        self.current_stock = self.current_stock.add(&quantity)?;
        self.last_restock_at = Some(now);
        self.journal(
            TransactionKind::Purchase,
            quantity.clone(),
            before,
            "stock added",
            performed_by,
            None,
            now,
        );
        self.pending_events.push(MaterialEvent::Restocked {
            material_id: self.id.clone(),
            quantity,
            stock_after: self.current_stock.clone(),
            performed_by: performed_by.to_string(),
            recorded_at: now,
        });
        Ok(())
    }

    pub fn deduct_stock(
        &mut self,
        quantity: MaterialQuantity,
        performed_by: &str,
        now: DateTime<Utc>,
    ) -> Result<(), StockError> {
        self.deduct(quantity, "stock deducted", performed_by, None, now)
    }

    /// Replace the current stock level outright, journaling the correction.
    pub fn adjust_stock(
        &mut self,
        new_level: MaterialQuantity,
        reason: &str,
        performed_by: &str,
        now: DateTime<Utc>,
    ) -> Result<(), StockError> {
        self.current_stock.try_cmp(&new_level)?;
        let before = self.current_stock.clone();
        self.current_stock = new_level.clone();
        self.journal(
            TransactionKind::Adjustment,
            new_level,
            before,
            reason,
            performed_by,
            None,
            now,
        );
        Ok(())
    }

    pub fn transfer_stock(
        &mut self,
        quantity: MaterialQuantity,
        reason: &str,
        performed_by: &str,
        now: DateTime<Utc>,
    ) -> Result<(), StockError> {
        let before = self.current_stock.clone();
        self.current_stock = self.current_stock.subtract(&quantity)?;
        self.journal(
            TransactionKind::Transfer,
            quantity,
            before,
            reason,
            performed_by,
            None,
            now,
        );
        self.alert_if_low();
        Ok(())
    }

    pub fn return_stock(
        &mut self,
        quantity: MaterialQuantity,
        reason: &str,
        performed_by: &str,
        now: DateTime<Utc>,
    ) -> Result<(), StockError> {
        let before = self.current_stock.clone();
        self.current_stock = self.current_stock.add(&quantity)?;
        self.journal(
            TransactionKind::Return,
            quantity,
            before,
            reason,
            performed_by,
            None,
            now,
        );
        Ok(())
    }

    /// Record a provisional claim for a visit. Stock is not decremented
    /// until the reservation is consumed.
    pub fn reserve(
        &mut self,
        quantity: MaterialQuantity,
        visit_id: VisitId,
        now: DateTime<Utc>,
    ) -> Result<(), StockError> {
        self.current_stock.try_cmp(&quantity)?;
        if !self.is_stock_available(&quantity) {
            return Err(StockError::Insufficient {
                requested: quantity.amount(),
                available: self.current_stock.amount(),
            });
        }
        self.reservations.push(MaterialReservation {
            visit_id,
            quantity,
            reserved_at: now,
            consumed: false,
        });
        Ok(())
    }

    /// Consume every reservation held for the given visit that has not yet
    /// been consumed: decrement stock, journal a usage transaction, mark the
    /// reservation spent. Already-consumed reservations are skipped, so a
    /// second call for the same visit is a no-op.
    pub fn consume_for_visit(
        &mut self,
        visit_id: &VisitId,
        performed_by: &str,
        now: DateTime<Utc>,
    ) -> Result<(), StockError> {
        let pending: Vec<usize> = self
            .reservations
            .iter()
            .enumerate()
            .filter(|(_, r)| r.visit_id == *visit_id && !r.consumed)
            .map(|(index, _)| index)
            .collect();

        for index in pending {
            let quantity = self.reservations[index].quantity.clone();
            self.deduct(
                quantity.clone(),
                "reserved stock consumed",
                performed_by,
                Some(visit_id.clone()),
                now,
            )?;
            self.reservations[index].consumed = true;
            self.pending_events.push(MaterialEvent::Consumed {
                material_id: self.id.clone(),
                visit_id: visit_id.clone(),
                quantity,
                performed_by: performed_by.to_string(),
                recorded_at: now,
            });
        }
        Ok(())
    }

    fn deduct(
        &mut self,
        quantity: MaterialQuantity,
        reason: &str,
        performed_by: &str,
        visit_id: Option<VisitId>,
        now: DateTime<Utc>,
    ) -> Result<(), StockError> {
        let before = self.current_stock.clone();
        self.current_stock = self.current_stock.subtract(&quantity)?;
        self.journal(
            TransactionKind::Usage,
            quantity,
            before,
            reason,
            performed_by,
            visit_id,
            now,
        );
        self.alert_if_low();
        Ok(())
    }

    fn alert_if_low(&mut self) {
        if self.is_stock_low() {
            self.pending_events.push(MaterialEvent::LowStock {
                material_id: self.id.clone(),
                current_stock: self.current_stock.clone(),
                minimum_stock: self.minimum_stock.clone(),
            });
        }
    }

    #[allow(clippy::too_many_arguments)]
    fn journal(
        &mut self,
        kind: TransactionKind,
        quantity: MaterialQuantity,
        stock_before: MaterialQuantity,
        reason: &str,
        performed_by: &str,
        visit_id: Option<VisitId>,
        now: DateTime<Utc>,
    ) {
        self.transactions.push(StockTransaction {
            kind,
            quantity,
            stock_before,
            stock_after: self.current_stock.clone(),
            reason: reason.to_string(),
            performed_by: performed_by.to_string(),
            visit_id,
            recorded_at: now,
        });
    }
}
