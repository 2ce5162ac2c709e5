use crate::workflows::visits::repository::RepositoryError;

use super::material::{Material, MaterialId};

/// Storage abstraction for material aggregates. Implementations must
/// serialize access per material identifier; the ledger's check-then-act
/// is only correct under single-writer semantics.
pub trait MaterialRepository: Send + Sync {
    fn insert(&self, material: &Material) -> Result<(), RepositoryError>;
    fn update(&self, material: &Material) -> Result<(), RepositoryError>;
    fn fetch(&self, id: &MaterialId) -> Result<Material, RepositoryError>;
}
