//! Shared material stock ledger: unit-checked quantities, a transaction
//! journal per stock-affecting operation, and per-visit reservations.

pub mod material;
pub mod quantity;
pub mod repository;
pub mod service;

pub use material::{
    Material, MaterialCategory, MaterialId, MaterialReservation, StockTransaction, TransactionKind,
};
pub use quantity::{MaterialQuantity, MaterialUnit, StockError};
pub use repository::MaterialRepository;
pub use service::{MaterialLedgerService, MaterialServiceError, RegisterMaterialRequest};
