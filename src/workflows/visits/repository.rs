use chrono::{DateTime, Utc};

use super::domain::{SiteId, VisitId, VisitKind};
use super::geo::GeoPoint;
use super::scoring::EvidencePolicy;
use super::visit::Visit;

/// Storage-layer failure shared by every persistence trait in the crate.
#[derive(Debug, thiserror::Error)]
pub enum RepositoryError {
    #[error("record already exists: {0}")]
    Conflict(String),
    #[error("record not found: {0}")]
    NotFound(String),
    #[error("store unavailable: {0}")]
    Unavailable(String),
}

/// Persistence boundary for visit aggregates. Implementations decide the
/// backing store; the service only requires whole-aggregate reads and writes.
pub trait VisitRepository: Send + Sync {
    fn insert(&self, visit: &Visit) -> Result<(), RepositoryError>;
    fn update(&self, visit: &Visit) -> Result<(), RepositoryError>;
    fn fetch(&self, id: &VisitId) -> Result<Visit, RepositoryError>;
}

/// Registered site facts the core reads during check-in. Site state itself
/// is owned elsewhere and never mutated here.
#[derive(Debug, Clone)]
pub struct SiteInfo {
    pub id: SiteId,
    pub code: String,
    pub name: String,
    pub position: GeoPoint,
    pub allowed_radius_m: f64,
    pub required_photo_count: u32,
}

pub trait SiteProvider: Send + Sync {
    fn fetch(&self, id: &SiteId) -> Result<SiteInfo, RepositoryError>;
}

/// Lookup for office-configured evidence thresholds. `Ok(None)` means no
/// policy is configured and the baseline computation stands.
pub trait EvidencePolicySource: Send + Sync {
    fn policy_for(
        &self,
        site_id: &SiteId,
        kind: VisitKind,
    ) -> Result<Option<EvidencePolicy>, RepositoryError>;
}

/// Time source injected into the service layer so tests can pin the clock.
pub trait Clock: Send + Sync {
    fn now(&self) -> DateTime<Utc>;
}

pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> DateTime<Utc> {
        Utc::now()
    }
}
