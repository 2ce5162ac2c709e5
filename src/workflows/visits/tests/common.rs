use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use axum::response::Response;
use chrono::{DateTime, NaiveDate, TimeZone, Utc};
use serde_json::Value;

use crate::workflows::events::{DomainEvent, EventError, EventSink, VisitEvent};
use crate::workflows::visits::domain::{
    CheckStatus, ChecklistCategory, PhotoCategory, PhotoKind, SiteId, VisitId, VisitKind,
};
use crate::workflows::visits::evidence::{NewChecklistItem, NewPhoto, NewReading};
use crate::workflows::visits::geo::GeoPoint;
use crate::workflows::visits::repository::{
    Clock, EvidencePolicySource, RepositoryError, SiteInfo, SiteProvider, VisitRepository,
};
use crate::workflows::visits::scoring::EvidencePolicy;
use crate::workflows::visits::service::{ScheduleVisitRequest, VisitService};
use crate::workflows::visits::visit::Visit;

pub(super) const SITE_ID: &str = "site-cai-001";
pub(super) const ENGINEER_ID: &str = "eng-omar";

pub(super) fn nine_am() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2026, 5, 11, 9, 0, 0).unwrap()
}

pub(super) fn visit_date() -> NaiveDate {
    NaiveDate::from_ymd_opt(2026, 5, 11).expect("valid date")
}

pub(super) fn site_position() -> GeoPoint {
    GeoPoint::new(30.0444, 31.2357).expect("valid position")
}

/// Roughly 1.1 km north of the site, well outside a 100 m radius.
pub(super) fn off_site_position() -> GeoPoint {
    GeoPoint::new(30.0544, 31.2357).expect("valid position")
}

pub(super) fn site() -> SiteInfo {
    SiteInfo {
        id: SiteId(SITE_ID.to_string()),
        code: "CAI001".to_string(),
        name: "Cairo North Tower".to_string(),
        position: site_position(),
        allowed_radius_m: 100.0,
        required_photo_count: 3,
    }
}

pub(super) fn scheduled_visit() -> Visit {
    let mut visit = Visit::create(
        VisitId("vst-test-001".to_string()),
        "V0000001",
        SiteId(SITE_ID.to_string()),
        "CAI001",
        "Cairo North Tower",
        ENGINEER_ID,
        "Omar Fathy",
        visit_date(),
        VisitKind::Preventive,
    );
    visit.take_events();
    visit
}

pub(super) fn photo(kind: PhotoKind) -> NewPhoto {
    NewPhoto {
        kind,
        category: PhotoCategory::ShelterInside,
        file_name: "shelter.jpg".to_string(),
        file_reference: "blob://visits/shelter.jpg".to_string(),
        description: None,
    }
}

pub(super) fn reading() -> NewReading {
    NewReading {
        reading_type: "battery_voltage".to_string(),
        category: "power".to_string(),
        value: 53.4,
        unit: "V".to_string(),
        min_acceptable: Some(48.0),
        max_acceptable: Some(56.0),
    }
}

pub(super) fn checklist_item() -> NewChecklistItem {
    NewChecklistItem {
        name: "Rectifier inspection".to_string(),
        category: ChecklistCategory::Power,
    }
}

/// One before/after photo pair, one in-range reading, one addressed
/// checklist item: baseline score 100 with every flag set.
pub(super) fn fill_evidence(visit: &mut Visit, now: DateTime<Utc>) {
    visit.add_photo(photo(PhotoKind::Before), now).expect("photo");
    visit.add_photo(photo(PhotoKind::After), now).expect("photo");
    visit.add_reading(reading(), now).expect("reading");
    let item = visit.add_checklist_item(checklist_item()).expect("item");
    visit
        .update_checklist_item(item, CheckStatus::Ok, None)
        .expect("item addressed");
}

pub(super) fn schedule_request() -> ScheduleVisitRequest {
    ScheduleVisitRequest {
        site_id: SiteId(SITE_ID.to_string()),
        engineer_id: ENGINEER_ID.to_string(),
        engineer_name: "Omar Fathy".to_string(),
        scheduled_date: visit_date(),
        kind: VisitKind::Preventive,
        supervisor: None,
        technician_names: Vec::new(),
        contact_person: None,
        planned_order: None,
    }
}

pub(super) struct FixedClock {
    now: Mutex<DateTime<Utc>>,
}

impl FixedClock {
    pub(super) fn at(now: DateTime<Utc>) -> Arc<Self> {
        Arc::new(Self {
            now: Mutex::new(now),
        })
    }

    pub(super) fn advance_minutes(&self, minutes: i64) {
        let mut guard = self.now.lock().expect("clock mutex poisoned");
        *guard += chrono::Duration::minutes(minutes);
    }
}

impl Clock for FixedClock {
    fn now(&self) -> DateTime<Utc> {
        *self.now.lock().expect("clock mutex poisoned")
    }
}

#[derive(Default)]
pub(super) struct MemoryVisitRepository {
    visits: Mutex<HashMap<VisitId, Visit>>,
}

impl VisitRepository for MemoryVisitRepository {
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
pub(super) struct MemorySites {
    sites: Mutex<HashMap<SiteId, SiteInfo>>,
}

impl MemorySites {
    pub(super) fn with(site: SiteInfo) -> Arc<Self> {
        let provider = Self::default();
        provider
            .sites
            .lock()
            .expect("site mutex poisoned")
            .insert(site.id.clone(), site);
        Arc::new(provider)
    }
}

impl SiteProvider for MemorySites {
    fn fetch(&self, id: &SiteId) -> Result<SiteInfo, RepositoryError> {
        let guard = self.sites.lock().expect("site mutex poisoned");
        guard
            .get(id)
            .cloned()
            .ok_or_else(|| RepositoryError::NotFound(id.0.clone()))
    }
}

#[derive(Default)]
pub(super) struct MemoryPolicies {
    policy: Mutex<Option<EvidencePolicy>>,
}

impl MemoryPolicies {
    pub(super) fn configure(&self, policy: EvidencePolicy) {
        *self.policy.lock().expect("policy mutex poisoned") = Some(policy);
    }
}

impl EvidencePolicySource for MemoryPolicies {
    fn policy_for(
        &self,
        _site_id: &SiteId,
        _kind: VisitKind,
    ) -> Result<Option<EvidencePolicy>, RepositoryError> {
        Ok(self.policy.lock().expect("policy mutex poisoned").clone())
    }
}

#[derive(Default)]
pub(super) struct MemorySink {
    events: Mutex<Vec<DomainEvent>>,
}

impl MemorySink {
    pub(super) fn events(&self) -> Vec<DomainEvent> {
        self.events.lock().expect("sink mutex poisoned").clone()
    }

    pub(super) fn visit_events(&self) -> Vec<VisitEvent> {
        self.events()
            .into_iter()
            .filter_map(|event| match event {
                DomainEvent::Visit(event) => Some(event),
                DomainEvent::Material(_) => None,
            })
            .collect()
    }
}

impl EventSink for MemorySink {
    fn publish(&self, event: DomainEvent) -> Result<(), EventError> {
        self.events
            .lock()
            .expect("sink mutex poisoned")
            .push(event);
        Ok(())
    }
}

/// Drive the full baseline evidence set through the service layer.
pub(super) fn with_full_evidence(h: &Harness, id: &VisitId) {
    h.service
        .add_photo(id, photo(PhotoKind::Before))
        .expect("photo");
    h.service
        .add_photo(id, photo(PhotoKind::After))
        .expect("photo");
    h.service.add_reading(id, reading()).expect("reading");
    let item = h
        .service
        .add_checklist_item(id, checklist_item())
        .expect("item");
    h.service
        .update_checklist_item(id, item, CheckStatus::Ok, None)
        .expect("item addressed");
}

pub(super) struct Harness {
    pub(super) service:
        VisitService<MemoryVisitRepository, MemorySites, MemoryPolicies, MemorySink>,
    pub(super) visits: Arc<MemoryVisitRepository>,
    pub(super) policies: Arc<MemoryPolicies>,
    pub(super) sink: Arc<MemorySink>,
    pub(super) clock: Arc<FixedClock>,
}

pub(super) fn harness() -> Harness {
    let visits = Arc::new(MemoryVisitRepository::default());
    let sites = MemorySites::with(site());
    let policies = Arc::new(MemoryPolicies::default());
    let sink = Arc::new(MemorySink::default());
    let clock = FixedClock::at(nine_am());
    let service = VisitService::new(
        visits.clone(),
        sites,
        policies.clone(),
        sink.clone(),
        clock.clone(),
    );
    Harness {
        service,
        visits,
        policies,
        sink,
        clock,
    }
}

pub(super) async fn read_json_body(response: Response) -> Value {
    let body = axum::body::to_bytes(response.into_body(), 64 * 1024)
        .await
        .expect("read body");
    serde_json::from_slice(&body).expect("json payload")
}
