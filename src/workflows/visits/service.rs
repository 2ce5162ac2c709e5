use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use chrono::NaiveDate;
use serde::Deserialize;
use tracing::info;

use crate::workflows::events::{EventError, EventSink, VisitEvent};

use super::checkin::{CheckInError, CheckInOutcome, GeoCheckInCoordinator};
use super::domain::{CheckStatus, RecordId, SiteId, VisitId, VisitKind};
use super::error::VisitError;
use super::evidence::{NewChecklistItem, NewIssue, NewMaterialUsage, NewPhoto, NewReading};
use super::geo::GeoPoint;
use super::repository::{
    Clock, EvidencePolicySource, RepositoryError, SiteProvider, VisitRepository,
};
use super::visit::{Visit, VisitStatusView};

/// Service composing the visit store, site registry, policy source, and
/// event sink. All timestamps come from the injected clock.
pub struct VisitService<R, S, P, E> {
    visits: Arc<R>,
    checkin: GeoCheckInCoordinator<S>,
    sites: Arc<S>,
    policies: Arc<P>,
    events: Arc<E>,
    clock: Arc<dyn Clock>,
}

static VISIT_SEQUENCE: AtomicU64 = AtomicU64::new(1);

fn next_visit_id() -> (VisitId, String) {
    let id = VISIT_SEQUENCE.fetch_add(1, Ordering::Relaxed);
    (VisitId(format!("vst-{id:06}")), format!("V{id:07}"))
}

/// Input for scheduling a new visit.
#[derive(Debug, Clone, Deserialize)]
pub struct ScheduleVisitRequest {
    pub site_id: SiteId,
    pub engineer_id: String,
    pub engineer_name: String,
    pub scheduled_date: NaiveDate,
    pub kind: VisitKind,
    #[serde(default)]
    pub supervisor: Option<TeamMember>,
    #[serde(default)]
    pub technician_names: Vec<String>,
    #[serde(default)]
    pub contact_person: Option<String>,
    #[serde(default)]
    pub planned_order: Option<u32>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct TeamMember {
    pub id: String,
    pub name: String,
}

impl<R, S, P, E> VisitService<R, S, P, E>
where
    R: VisitRepository + 'static,
    S: SiteProvider + 'static,
    P: EvidencePolicySource + 'static,
    E: EventSink + 'static,
{
    pub fn new(
        visits: Arc<R>,
        sites: Arc<S>,
        policies: Arc<P>,
        events: Arc<E>,
        clock: Arc<dyn Clock>,
    ) -> Self {
        Self {
            visits,
            checkin: GeoCheckInCoordinator::new(Arc::clone(&sites)),
            sites,
            policies,
            events,
            clock,
        }
    }

    /// Schedule a visit against a registered site.
    pub fn schedule(
        &self,
        request: ScheduleVisitRequest,
    ) -> Result<VisitStatusView, VisitServiceError> {
        let site = self.sites.fetch(&request.site_id)?;
        let (id, visit_number) = next_visit_id();

        let mut visit = Visit::create(
            id,
            &visit_number,
            site.id,
            &site.code,
            &site.name,
            &request.engineer_id,
            &request.engineer_name,
            request.scheduled_date,
            request.kind,
        );
        if let Some(supervisor) = &request.supervisor {
            visit.assign_supervisor(&supervisor.id, &supervisor.name);
        }
        for technician in &request.technician_names {
            visit.add_technician(technician);
        }
        visit.set_contact_person(request.contact_person.as_deref());
        visit.set_planned_order(request.planned_order)?;

        self.visits.insert(&visit)?;
        self.dispatch(visit.take_events())?;
        info!(visit = %visit.id().0, site = %visit.site_code(), "visit scheduled");
        Ok(visit.status_view())
    }

    pub fn start(
        &self,
        id: &VisitId,
        position: GeoPoint,
    ) -> Result<VisitStatusView, VisitServiceError> {
        let now = self.clock.now();
        self.with_visit(id, |visit| {
            visit.start(position, now)?;
            Ok(visit.status_view())
        })
    }

    /// Verify the reported position against the site geofence and record
    /// the check-in, flagged when outside the allowed radius.
    pub fn check_in(
        &self,
        id: &VisitId,
        reported: GeoPoint,
    ) -> Result<CheckInOutcome, VisitServiceError> {
        let now = self.clock.now();
        let mut visit = self.visits.fetch(id)?;
        let outcome = self.checkin.check_in(&mut visit, reported, now)?;
        self.visits.update(&visit)?;
        self.dispatch(visit.take_events())?;
        Ok(outcome)
    }

    pub fn check_out(
        &self,
        id: &VisitId,
        position: GeoPoint,
    ) -> Result<VisitStatusView, VisitServiceError> {
        let now = self.clock.now();
        self.with_visit(id, |visit| {
            visit.record_check_out(position, now)?;
            Ok(visit.status_view())
        })
    }

    pub fn complete(&self, id: &VisitId) -> Result<VisitStatusView, VisitServiceError> {
        let now = self.clock.now();
        self.with_visit(id, |visit| {
            visit.complete(now)?;
            Ok(visit.status_view())
        })
    }

    /// Submit for review. When a policy is configured for the site and visit
    /// kind it overrides the baseline flags before the submission gate runs.
    pub fn submit(&self, id: &VisitId) -> Result<VisitStatusView, VisitServiceError> {
        let mut visit = self.visits.fetch(id)?;
        if let Some(policy) = self.policies.policy_for(visit.site_id(), visit.kind())? {
            visit.apply_evidence_policy(&policy);
        }
        visit.submit()?;
        self.visits.update(&visit)?;
        self.dispatch(visit.take_events())?;
        Ok(visit.status_view())
    }

    pub fn start_review(&self, id: &VisitId) -> Result<VisitStatusView, VisitServiceError> {
        self.with_visit(id, |visit| {
            visit.start_review()?;
            Ok(visit.status_view())
        })
    }

    pub fn approve(
        &self,
        id: &VisitId,
        reviewer_id: &str,
        reviewer_name: &str,
        notes: Option<&str>,
    ) -> Result<VisitStatusView, VisitServiceError> {
        let now = self.clock.now();
        self.with_visit(id, |visit| {
            visit.approve(reviewer_id, reviewer_name, notes, now)?;
            Ok(visit.status_view())
        })
    }

    pub fn reject(
        &self,
        id: &VisitId,
        reviewer_id: &str,
        reviewer_name: &str,
        reason: &str,
    ) -> Result<VisitStatusView, VisitServiceError> {
        let now = self.clock.now();
        self.with_visit(id, |visit| {
            visit.reject(reviewer_id, reviewer_name, reason, now)?;
            Ok(visit.status_view())
        })
    }

    pub fn request_correction(
        &self,
        id: &VisitId,
        reviewer_id: &str,
        reviewer_name: &str,
        notes: &str,
    ) -> Result<VisitStatusView, VisitServiceError> {
        let now = self.clock.now();
        self.with_visit(id, |visit| {
            visit.request_correction(reviewer_id, reviewer_name, notes, now)?;
            Ok(visit.status_view())
        })
    }

    pub fn hold(
        &self,
        id: &VisitId,
        reviewer_id: &str,
        reviewer_name: &str,
        notes: Option<&str>,
    ) -> Result<VisitStatusView, VisitServiceError> {
        let now = self.clock.now();
        self.with_visit(id, |visit| {
            visit.hold(reviewer_id, reviewer_name, notes, now)?;
            Ok(visit.status_view())
        })
    }

    pub fn cancel(&self, id: &VisitId, reason: &str) -> Result<VisitStatusView, VisitServiceError> {
        self.with_visit(id, |visit| {
            visit.cancel(reason)?;
            Ok(visit.status_view())
        })
    }

    pub fn reschedule(
        &self,
        id: &VisitId,
        new_date: NaiveDate,
        reason: Option<&str>,
    ) -> Result<VisitStatusView, VisitServiceError> {
        let today = self.clock.now().date_naive();
        self.with_visit(id, |visit| {
            visit.reschedule(new_date, reason, today)?;
            Ok(visit.status_view())
        })
    }

    // ---- evidence ------------------------------------------------------

    pub fn add_photo(&self, id: &VisitId, photo: NewPhoto) -> Result<RecordId, VisitServiceError> {
        let now = self.clock.now();
        self.with_visit(id, |visit| Ok(visit.add_photo(photo, now)?))
    }

    pub fn remove_photo(&self, id: &VisitId, photo_id: RecordId) -> Result<(), VisitServiceError> {
        self.with_visit(id, |visit| Ok(visit.remove_photo(photo_id)?))
    }

    pub fn add_reading(
        &self,
        id: &VisitId,
        reading: NewReading,
    ) -> Result<RecordId, VisitServiceError> {
        let now = self.clock.now();
        self.with_visit(id, |visit| Ok(visit.add_reading(reading, now)?))
    }

    pub fn update_reading(
        &self,
        id: &VisitId,
        reading_id: RecordId,
        value: f64,
    ) -> Result<(), VisitServiceError> {
        let now = self.clock.now();
        self.with_visit(id, |visit| Ok(visit.update_reading(reading_id, value, now)?))
    }

    pub fn add_checklist_item(
        &self,
        id: &VisitId,
        item: NewChecklistItem,
    ) -> Result<RecordId, VisitServiceError> {
        self.with_visit(id, |visit| Ok(visit.add_checklist_item(item)?))
    }

    pub fn update_checklist_item(
        &self,
        id: &VisitId,
        item_id: RecordId,
        status: CheckStatus,
        notes: Option<&str>,
    ) -> Result<(), VisitServiceError> {
        self.with_visit(id, |visit| {
            Ok(visit.update_checklist_item(item_id, status, notes)?)
        })
    }

    pub fn log_material_usage(
        &self,
        id: &VisitId,
        usage: NewMaterialUsage,
    ) -> Result<RecordId, VisitServiceError> {
        let now = self.clock.now();
        self.with_visit(id, |visit| Ok(visit.log_material_usage(usage, now)?))
    }

    pub fn report_issue(
        &self,
        id: &VisitId,
        issue: NewIssue,
    ) -> Result<RecordId, VisitServiceError> {
        let now = self.clock.now();
        self.with_visit(id, |visit| Ok(visit.report_issue(issue, now)))
    }

    pub fn resolve_issue(
        &self,
        id: &VisitId,
        issue_id: RecordId,
        resolution: &str,
    ) -> Result<(), VisitServiceError> {
        self.with_visit(id, |visit| Ok(visit.resolve_issue(issue_id, resolution)?))
    }

    pub fn set_engineer_notes(&self, id: &VisitId, notes: &str) -> Result<(), VisitServiceError> {
        self.with_visit(id, |visit| {
            visit.set_engineer_notes(notes);
            Ok(())
        })
    }

    pub fn set_supervisor_notes(
        &self,
        id: &VisitId,
        notes: &str,
    ) -> Result<(), VisitServiceError> {
        self.with_visit(id, |visit| Ok(visit.set_supervisor_notes(notes)?))
    }

    // ---- queries -------------------------------------------------------

    pub fn status(&self, id: &VisitId) -> Result<VisitStatusView, VisitServiceError> {
        let visit = self.visits.fetch(id)?;
        Ok(visit.status_view())
    }

    pub fn get(&self, id: &VisitId) -> Result<Visit, VisitServiceError> {
        Ok(self.visits.fetch(id)?)
    }

    // ---- internals -----------------------------------------------------

    /// Fetch, mutate, persist, then dispatch the drained events. Nothing is
    /// published for a mutation that failed or was never stored.
    fn with_visit<T>(
        &self,
        id: &VisitId,
        mutate: impl FnOnce(&mut Visit) -> Result<T, VisitServiceError>,
    ) -> Result<T, VisitServiceError> {
        let mut visit = self.visits.fetch(id)?;
        let value = mutate(&mut visit)?;
        self.visits.update(&visit)?;
        self.dispatch(visit.take_events())?;
        Ok(value)
    }

    fn dispatch(&self, events: Vec<VisitEvent>) -> Result<(), VisitServiceError> {
        for event in events {
            self.events.publish(event.into())?;
        }
        Ok(())
    }
}

/// Error raised by the visit service.
#[derive(Debug, thiserror::Error)]
pub enum VisitServiceError {
    #[error(transparent)]
    Visit(#[from] VisitError),
    #[error(transparent)]
    Repository(#[from] RepositoryError),
    #[error(transparent)]
    Event(#[from] EventError),
}

impl From<CheckInError> for VisitServiceError {
    fn from(value: CheckInError) -> Self {
        match value {
            CheckInError::Visit(err) => Self::Visit(err),
            CheckInError::Repository(err) => Self::Repository(err),
        }
    }
}
