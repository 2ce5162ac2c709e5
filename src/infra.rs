use std::collections::HashMap;
use std::sync::Mutex;

use tracing::info;

use fieldops::workflows::events::{DomainEvent, EventError, EventSink};
use fieldops::workflows::materials::{Material, MaterialId, MaterialRepository};
use fieldops::workflows::visits::{
    EvidencePolicy, EvidencePolicySource, GeoPoint, RepositoryError, SiteId, SiteInfo,
    SiteProvider, Visit, VisitId, VisitKind, VisitRepository,
};

#[derive(Default)]
pub(crate) struct InMemoryVisitRepository {
    visits: Mutex<HashMap<VisitId, Visit>>,
}

impl VisitRepository for InMemoryVisitRepository {
    fn insert(&self, visit: &Visit) -> Result<(), RepositoryError> {
        let mut guard = self.visits.lock().expect("repository mutex poisoned");
        if guard.contains_key(visit.id()) {
            return Err(RepositoryError::Conflict(visit.id().0.clone()));
        }
        guard.insert(visit.id().clone(), visit.clone());
        Ok(())
    }

    fn update(&self, visit: &Visit) -> Result<(), RepositoryError> {
        let mut guard = self.visits.lock().expect("repository mutex poisoned");
        if !guard.contains_key(visit.id()) {
            return Err(RepositoryError::NotFound(visit.id().0.clone()));
        }
        guard.insert(visit.id().clone(), visit.clone());
        Ok(())
    }

    fn fetch(&self, id: &VisitId) -> Result<Visit, RepositoryError> {
        let guard = self.visits.lock().expect("repository mutex poisoned");
        guard
            .get(id)
            .cloned()
            .ok_or_else(|| RepositoryError::NotFound(id.0.clone()))
    }
}

#[derive(Default)]
pub(crate) struct InMemoryMaterialRepository {
    materials: Mutex<HashMap<MaterialId, Material>>,
}

impl MaterialRepository for InMemoryMaterialRepository {
    fn insert(&self, material: &Material) -> Result<(), RepositoryError> {
        let mut guard = self.materials.lock().expect("ledger mutex poisoned");
        if guard.contains_key(material.id()) {
            return Err(RepositoryError::Conflict(material.id().0.clone()));
        }
        guard.insert(material.id().clone(), material.clone());
        Ok(())
    }

    fn update(&self, material: &Material) -> Result<(), RepositoryError> {
        let mut guard = self.materials.lock().expect("ledger mutex poisoned");
        if !guard.contains_key(material.id()) {
            return Err(RepositoryError::NotFound(material.id().0.clone()));
        }
        guard.insert(material.id().clone(), material.clone());
        Ok(())
    }

    fn fetch(&self, id: &MaterialId) -> Result<Material, RepositoryError> {
        let guard = self.materials.lock().expect("ledger mutex poisoned");
        guard
            .get(id)
            .cloned()
            .ok_or_else(|| RepositoryError::NotFound(id.0.clone()))
    }
}

/// Fixed directory of registered sites, seeded at startup.
pub(crate) struct StaticSiteDirectory {
    sites: HashMap<SiteId, SiteInfo>,
}

impl StaticSiteDirectory {
    pub(crate) fn seeded() -> Self {
        let mut sites = HashMap::new();
        for site in seed_sites() {
            sites.insert(site.id.clone(), site);
        }
        Self { sites }
    }
}

impl SiteProvider for StaticSiteDirectory {
    fn fetch(&self, id: &SiteId) -> Result<SiteInfo, RepositoryError> {
        self.sites
            .get(id)
            .cloned()
            .ok_or_else(|| RepositoryError::NotFound(id.0.clone()))
    }
}

fn seed_sites() -> Vec<SiteInfo> {
    vec![
        SiteInfo {
            id: SiteId("site-cai-001".to_string()),
            code: "CAI001".to_string(),
            name: "Cairo North Tower".to_string(),
            position: GeoPoint::new(30.0444, 31.2357).expect("seeded coordinates are valid"),
            allowed_radius_m: 100.0,
            required_photo_count: 3,
        },
        SiteInfo {
            id: SiteId("site-alx-007".to_string()),
            code: "ALX007".to_string(),
            name: "Alexandria Corniche Rooftop".to_string(),
            position: GeoPoint::new(31.2001, 29.9187).expect("seeded coordinates are valid"),
            allowed_radius_m: 150.0,
            required_photo_count: 3,
        },
    ]
}

/// Policy source with no configured thresholds; the baseline computation
/// governs every submission.
#[derive(Default)]
pub(crate) struct NoConfiguredPolicies;

impl EvidencePolicySource for NoConfiguredPolicies {
    fn policy_for(
        &self,
        _site_id: &SiteId,
        _kind: VisitKind,
    ) -> Result<Option<EvidencePolicy>, RepositoryError> {
        Ok(None)
    }
}

/// Sink that writes every event to the structured log.
#[derive(Default)]
pub(crate) struct LoggingEventSink;

impl EventSink for LoggingEventSink {
    fn publish(&self, event: DomainEvent) -> Result<(), EventError> {
        let payload = serde_json::to_string(&event)
            .map_err(|err| EventError::Transport(err.to_string()))?;
        info!(event = %payload, "domain event");
        Ok(())
    }
}

/// Sink that buffers events so a command can print them afterwards.
#[derive(Default)]
pub(crate) struct CollectingEventSink {
    events: Mutex<Vec<DomainEvent>>,
}

impl CollectingEventSink {
    pub(crate) fn drain(&self) -> Vec<DomainEvent> {
        std::mem::take(&mut *self.events.lock().expect("sink mutex poisoned"))
    }
}

impl EventSink for CollectingEventSink {
    fn publish(&self, event: DomainEvent) -> Result<(), EventError> {
        self.events
            .lock()
            .expect("sink mutex poisoned")
            .push(event);
        Ok(())
    }
}
