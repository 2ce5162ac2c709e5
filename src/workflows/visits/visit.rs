use chrono::{DateTime, Duration, NaiveDate, Utc};
use serde::Serialize;

use crate::workflows::events::VisitEvent;

use super::approval::{ApprovalAction, ApprovalRecord};
use super::domain::{
    CheckStatus, IssueSeverity, IssueStatus, PhotoKind, RecordId, SiteId, VisitId, VisitKind,
    VisitStatus,
};
use super::error::{EvidenceKind, VisitError};
use super::evidence::{
    NewChecklistItem, NewIssue, NewMaterialUsage, NewPhoto, NewReading, VisitChecklistItem,
    VisitIssue, VisitMaterialUsage, VisitPhoto, VisitReading,
};
use super::geo::GeoPoint;
use super::scoring::{self, EvidenceCounts, EvidencePolicy, EvidenceSnapshot};

const MIN_VISIT_DURATION: i64 = 30; // minutes
const MAX_VISIT_DURATION: i64 = 8 * 60;

/// Aggregate root for a single maintenance engagement at a site.
///
/// The visit owns its evidence collections exclusively and exposes them as
/// read-only slices; all mutation goes through the methods below. The status
/// and the three completion flags are recomputed on every evidence mutation,
/// so no stale flag survives a collection change. The aggregate is not
/// internally thread-safe: concurrent mutations on the same visit must be
/// serialized by the caller.
///
/// Every failed guard is total — either the whole operation applies or the
/// aggregate is left untouched.
#[derive(Debug, Clone)]
pub struct Visit {
    id: VisitId,
    visit_number: String,
    site_id: SiteId,
    site_code: String,
    site_name: String,
    engineer_id: String,
    engineer_name: String,
    supervisor_id: Option<String>,
    supervisor_name: Option<String>,
    technician_names: Vec<String>,
    contact_person: Option<String>,
    scheduled_date: NaiveDate,
    planned_order: Option<u32>,
    kind: VisitKind,
    status: VisitStatus,

    check_in_position: Option<GeoPoint>,
    check_in_at: Option<DateTime<Utc>>,
    distance_from_site_m: Option<f64>,
    is_within_site_radius: bool,
    check_out_position: Option<GeoPoint>,
    check_out_at: Option<DateTime<Utc>>,

    actual_start: Option<DateTime<Utc>>,
    actual_end: Option<DateTime<Utc>>,
    duration_minutes: Option<i64>,

    photos: Vec<VisitPhoto>,
    readings: Vec<VisitReading>,
    checklist: Vec<VisitChecklistItem>,
    materials_used: Vec<VisitMaterialUsage>,
    issues: Vec<VisitIssue>,
    approval_history: Vec<ApprovalRecord>,
    evidence: EvidenceSnapshot,

    engineer_notes: Option<String>,
    supervisor_notes: Option<String>,
    reviewer_notes: Option<String>,

    next_record_id: u32,
    pending_events: Vec<VisitEvent>,
}

impl Visit {
    #[allow(clippy::too_many_arguments)]
    pub fn create(
        id: VisitId,
        visit_number: &str,
        site_id: SiteId,
        site_code: &str,
        site_name: &str,
        engineer_id: &str,
        engineer_name: &str,
        scheduled_date: NaiveDate,
        kind: VisitKind,
    ) -> Self {
        let mut visit = Self {
            id: id.clone(),
            visit_number: visit_number.to_string(),
            site_id: site_id.clone(),
            site_code: site_code.to_string(),
            site_name: site_name.to_string(),
            engineer_id: engineer_id.to_string(),
            engineer_name: engineer_name.to_string(),
            supervisor_id: None,
            supervisor_name: None,
            technician_names: Vec::new(),
            contact_person: None,
            scheduled_date,
            planned_order: None,
            kind,
            status: VisitStatus::Scheduled,
            check_in_position: None,
            check_in_at: None,
            distance_from_site_m: None,
            is_within_site_radius: false,
            check_out_position: None,
            check_out_at: None,
            actual_start: None,
            actual_end: None,
            duration_minutes: None,
            photos: Vec::new(),
            readings: Vec::new(),
            checklist: Vec::new(),
            materials_used: Vec::new(),
            issues: Vec::new(),
            approval_history: Vec::new(),
            evidence: EvidenceSnapshot::default(),
            engineer_notes: None,
            supervisor_notes: None,
            reviewer_notes: None,
            next_record_id: 1,
            pending_events: Vec::new(),
        };
        visit.pending_events.push(VisitEvent::Created {
            visit_id: id,
            site_id,
            engineer_id: engineer_id.to_string(),
            scheduled_date,
        });
        visit
    }

    // ---- lifecycle -----------------------------------------------------

    pub fn start(&mut self, position: GeoPoint, now: DateTime<Utc>) -> Result<(), VisitError> {
        self.require_status(VisitStatus::Scheduled, "start")?;
        self.check_in_position = Some(position);
        self.check_in_at = Some(now);
        self.actual_start = Some(now);
        self.status = VisitStatus::InProgress;
        self.pending_events.push(VisitEvent::Started {
            visit_id: self.id.clone(),
            site_id: self.site_id.clone(),
        });
        Ok(())
    }

    /// Record a geofence-verified check-in. The outcome is written even when
    /// the position is outside the allowed radius — that is a recorded
    /// anomaly, not a failure. Only a visit past review (or cancelled) can no
    /// longer check in.
    pub fn record_check_in(
        &mut self,
        position: GeoPoint,
        distance_from_site_m: f64,
        within_radius: bool,
        now: DateTime<Utc>,
    ) -> Result<(), VisitError> {
        if self.status.is_terminal() {
            return Err(VisitError::InvalidStateTransition {
                action: "check in",
                current: self.status,
            });
        }
        self.check_in_position = Some(position);
        self.check_in_at = Some(now);
        self.distance_from_site_m = Some(distance_from_site_m);
        self.is_within_site_radius = within_radius;

        self.pending_events.push(VisitEvent::CheckedIn {
            visit_id: self.id.clone(),
            site_id: self.site_id.clone(),
            distance_from_site_m,
            within_radius,
        });
        if !within_radius {
            self.pending_events.push(VisitEvent::SuspiciousCheckIn {
                visit_id: self.id.clone(),
                site_id: self.site_id.clone(),
                distance_from_site_m,
            });
        }
        Ok(())
    }

    pub fn record_check_out(
        &mut self,
        position: GeoPoint,
        now: DateTime<Utc>,
    ) -> Result<(), VisitError> {
        if self.check_in_at.is_none() {
            return Err(VisitError::MissingPrecondition { what: "check-in" });
        }
        self.check_out_position = Some(position);
        self.check_out_at = Some(now);
        self.pending_events.push(VisitEvent::CheckedOut {
            visit_id: self.id.clone(),
            site_id: self.site_id.clone(),
        });
        Ok(())
    }

    pub fn complete(&mut self, now: DateTime<Utc>) -> Result<(), VisitError> {
        self.require_status(VisitStatus::InProgress, "complete")?;
        let started = self.actual_start.ok_or(VisitError::MissingPrecondition {
            what: "visit start time",
        })?;

        let elapsed = now - started;
        if elapsed < Duration::minutes(MIN_VISIT_DURATION)
            || elapsed > Duration::minutes(MAX_VISIT_DURATION)
        {
            return Err(VisitError::ValueConstraint {
                constraint: "visit duration must be between 30 minutes and 8 hours",
            });
        }

        self.actual_end = Some(now);
        self.duration_minutes = Some(elapsed.num_minutes());
        self.recalculate();
        self.status = VisitStatus::Completed;
        self.pending_events.push(VisitEvent::Completed {
            visit_id: self.id.clone(),
            site_id: self.site_id.clone(),
            duration_minutes: elapsed.num_minutes(),
        });
        Ok(())
    }

    /// Gate submission on the three completion flags as last computed —
    /// baseline by default, policy-driven when a policy has been applied.
    pub fn submit(&mut self) -> Result<(), VisitError> {
        if self.status != VisitStatus::Completed && self.status != VisitStatus::NeedsCorrection {
            return Err(VisitError::InvalidStateTransition {
                action: "submit",
                current: self.status,
            });
        }

        let mut missing = Vec::new();
        if !self.evidence.photos_complete {
            missing.push(EvidenceKind::Photos);
        }
        if !self.evidence.readings_complete {
            missing.push(EvidenceKind::Readings);
        }
        if !self.evidence.checklist_complete {
            missing.push(EvidenceKind::Checklist);
        }
        if !missing.is_empty() {
            return Err(VisitError::EvidenceIncomplete { missing });
        }

        self.status = VisitStatus::Submitted;
        self.pending_events.push(VisitEvent::Submitted {
            visit_id: self.id.clone(),
            site_id: self.site_id.clone(),
        });
        Ok(())
    }

    pub fn start_review(&mut self) -> Result<(), VisitError> {
        self.require_status(VisitStatus::Submitted, "start review of")?;
        self.status = VisitStatus::UnderReview;
        Ok(())
    }

    pub fn approve(
        &mut self,
        reviewer_id: &str,
        reviewer_name: &str,
        notes: Option<&str>,
        now: DateTime<Utc>,
    ) -> Result<(), VisitError> {
        self.require_status(VisitStatus::UnderReview, "approve")?;
        self.append_approval(reviewer_id, reviewer_name, ApprovalAction::Approved, notes, now);
        self.reviewer_notes = notes.map(str::to_string);
        self.status = VisitStatus::Approved;
        self.pending_events.push(VisitEvent::Approved {
            visit_id: self.id.clone(),
            reviewer_id: reviewer_id.to_string(),
        });
        Ok(())
    }

    pub fn reject(
        &mut self,
        reviewer_id: &str,
        reviewer_name: &str,
        reason: &str,
        now: DateTime<Utc>,
    ) -> Result<(), VisitError> {
        self.require_status(VisitStatus::UnderReview, "reject")?;
        if reason.trim().is_empty() {
            return Err(VisitError::RequiredFieldMissing {
                field: "rejection reason",
            });
        }
        self.append_approval(
            reviewer_id,
            reviewer_name,
            ApprovalAction::Rejected,
            Some(reason),
            now,
        );
        self.reviewer_notes = Some(reason.to_string());
        self.status = VisitStatus::Rejected;
        self.pending_events.push(VisitEvent::Rejected {
            visit_id: self.id.clone(),
            reviewer_id: reviewer_id.to_string(),
            reason: reason.to_string(),
        });
        Ok(())
    }

    pub fn request_correction(
        &mut self,
        reviewer_id: &str,
        reviewer_name: &str,
        notes: &str,
        now: DateTime<Utc>,
    ) -> Result<(), VisitError> {
        self.require_status(VisitStatus::UnderReview, "request correction of")?;
        if notes.trim().is_empty() {
            return Err(VisitError::RequiredFieldMissing {
                field: "correction notes",
            });
        }
        self.append_approval(
            reviewer_id,
            reviewer_name,
            ApprovalAction::RequestCorrection,
            Some(notes),
            now,
        );
        self.reviewer_notes = Some(notes.to_string());
        self.status = VisitStatus::NeedsCorrection;
        self.pending_events.push(VisitEvent::CorrectionRequested {
            visit_id: self.id.clone(),
            reviewer_id: reviewer_id.to_string(),
            notes: notes.to_string(),
        });
        Ok(())
    }

    /// Park the review without a verdict; the visit stays under review and
    /// the decision is recorded in the audit trail.
    pub fn hold(
        &mut self,
        reviewer_id: &str,
        reviewer_name: &str,
        notes: Option<&str>,
        now: DateTime<Utc>,
    ) -> Result<(), VisitError> {
        self.require_status(VisitStatus::UnderReview, "hold")?;
        self.append_approval(reviewer_id, reviewer_name, ApprovalAction::OnHold, notes, now);
        Ok(())
    }

    pub fn cancel(&mut self, reason: &str) -> Result<(), VisitError> {
        if self.status == VisitStatus::Approved || self.status == VisitStatus::Rejected {
            return Err(VisitError::InvalidStateTransition {
                action: "cancel",
                current: self.status,
            });
        }
        self.status = VisitStatus::Cancelled;
        self.engineer_notes = Some(reason.to_string());
        Ok(())
    }

    pub fn reschedule(
        &mut self,
        new_date: NaiveDate,
        reason: Option<&str>,
        today: NaiveDate,
    ) -> Result<(), VisitError> {
        self.require_status(VisitStatus::Scheduled, "reschedule")?;
        if new_date < today {
            return Err(VisitError::ValueConstraint {
                constraint: "new scheduled date must be today or later",
            });
        }
        let old_date = self.scheduled_date;
        self.scheduled_date = new_date;
        self.engineer_notes = Some(match reason {
            Some(reason) => format!("Rescheduled from {old_date} to {new_date}. Reason: {reason}"),
            None => format!("Rescheduled from {old_date} to {new_date}"),
        });
        self.pending_events.push(VisitEvent::Rescheduled {
            visit_id: self.id.clone(),
            scheduled_date: new_date,
        });
        Ok(())
    }

    // ---- team & planning ----------------------------------------------

    pub fn assign_supervisor(&mut self, supervisor_id: &str, supervisor_name: &str) {
        self.supervisor_id = Some(supervisor_id.to_string());
        self.supervisor_name = Some(supervisor_name.to_string());
    }

    pub fn add_technician(&mut self, technician_name: &str) {
        if !self.technician_names.iter().any(|n| n == technician_name) {
            self.technician_names.push(technician_name.to_string());
        }
    }

    pub fn set_contact_person(&mut self, contact_person: Option<&str>) {
        self.contact_person = contact_person
            .map(str::trim)
            .filter(|name| !name.is_empty())
            .map(str::to_string);
    }

    pub fn set_planned_order(&mut self, planned_order: Option<u32>) -> Result<(), VisitError> {
        if planned_order == Some(0) {
            return Err(VisitError::ValueConstraint {
                constraint: "planned order must be greater than zero",
            });
        }
        self.planned_order = planned_order;
        Ok(())
    }

    // ---- evidence ------------------------------------------------------

    pub fn add_photo(&mut self, photo: NewPhoto, now: DateTime<Utc>) -> Result<RecordId, VisitError> {
        self.refuse_after_review("add photos to")?;
        let id = self.allocate_record_id();
        self.photos.push(VisitPhoto {
            id,
            kind: photo.kind,
            category: photo.category,
            file_name: photo.file_name,
            file_reference: photo.file_reference,
            description: photo.description,
            captured_at: now,
        });
        self.recalculate();
        Ok(id)
    }

    /// Removing an id that is not present is a no-op, not a failure.
    pub fn remove_photo(&mut self, photo_id: RecordId) -> Result<(), VisitError> {
        self.refuse_after_review("remove photos from")?;
        let before = self.photos.len();
        self.photos.retain(|photo| photo.id != photo_id);
        if self.photos.len() != before {
            self.recalculate();
        }
        Ok(())
    }

    pub fn add_reading(
        &mut self,
        reading: NewReading,
        now: DateTime<Utc>,
    ) -> Result<RecordId, VisitError> {
        self.refuse_after_review("add readings to")?;
        let id = self.allocate_record_id();
        let mut record = VisitReading {
            id,
            reading_type: reading.reading_type,
            category: reading.category,
            value: reading.value,
            unit: reading.unit,
            min_acceptable: reading.min_acceptable,
            max_acceptable: reading.max_acceptable,
            is_within_range: true,
            measured_at: now,
            notes: None,
        };
        record.revalidate_range();
        self.readings.push(record);
        self.recalculate();
        Ok(id)
    }

    pub fn update_reading(
        &mut self,
        reading_id: RecordId,
        value: f64,
        now: DateTime<Utc>,
    ) -> Result<(), VisitError> {
        self.refuse_after_review("update readings of")?;
        let reading = self
            .readings
            .iter_mut()
            .find(|reading| reading.id == reading_id)
            .ok_or(VisitError::MissingPrecondition {
                what: "the reading to update",
            })?;
        reading.value = value;
        reading.measured_at = now;
        reading.revalidate_range();
        self.recalculate();
        Ok(())
    }

    /// New items start unaddressed (`NotApplicable`) until the engineer
    /// records an outcome.
    pub fn add_checklist_item(&mut self, item: NewChecklistItem) -> Result<RecordId, VisitError> {
        self.refuse_after_review("add checklist items to")?;
        let id = self.allocate_record_id();
        self.checklist.push(VisitChecklistItem {
            id,
            name: item.name,
            category: item.category,
            status: CheckStatus::NotApplicable,
            notes: None,
        });
        self.recalculate();
        Ok(id)
    }

    pub fn update_checklist_item(
        &mut self,
        item_id: RecordId,
        status: CheckStatus,
        notes: Option<&str>,
    ) -> Result<(), VisitError> {
        self.refuse_after_review("update checklist items of")?;
        let item = self
            .checklist
            .iter_mut()
            .find(|item| item.id == item_id)
            .ok_or(VisitError::MissingPrecondition {
                what: "the checklist item to update",
            })?;
        item.status = status;
        if let Some(notes) = notes {
            item.notes = Some(notes.to_string());
        }
        self.recalculate();
        Ok(())
    }

    pub fn log_material_usage(
        &mut self,
        usage: NewMaterialUsage,
        now: DateTime<Utc>,
    ) -> Result<RecordId, VisitError> {
        self.refuse_after_review("log material usage on")?;
        let id = self.allocate_record_id();
        let total_cost = usage.unit_cost * usage.quantity.amount();
        self.materials_used.push(VisitMaterialUsage {
            id,
            material_id: usage.material_id,
            material_code: usage.material_code,
            material_name: usage.material_name,
            quantity: usage.quantity,
            unit_cost: usage.unit_cost,
            total_cost,
            reason: usage.reason,
            before_photo: usage.before_photo,
            after_photo: usage.after_photo,
            status: super::domain::MaterialUsageStatus::Logged,
            used_at: now,
        });
        self.recalculate();
        Ok(id)
    }

    pub fn report_issue(&mut self, issue: NewIssue, now: DateTime<Utc>) -> RecordId {
        let id = self.allocate_record_id();
        let critical = issue.severity == IssueSeverity::Critical;
        let description = issue.description.clone();
        self.issues.push(VisitIssue {
            id,
            severity: issue.severity,
            category: issue.category,
            description: issue.description,
            status: IssueStatus::Open,
            resolution: None,
            reported_at: now,
        });
        if critical {
            self.pending_events.push(VisitEvent::CriticalIssueReported {
                visit_id: self.id.clone(),
                site_id: self.site_id.clone(),
                description,
            });
        }
        id
    }

    pub fn resolve_issue(&mut self, issue_id: RecordId, resolution: &str) -> Result<(), VisitError> {
        let issue = self
            .issues
            .iter_mut()
            .find(|issue| issue.id == issue_id)
            .ok_or(VisitError::MissingPrecondition {
                what: "the issue to resolve",
            })?;
        issue.status = IssueStatus::Resolved;
        issue.resolution = Some(resolution.to_string());
        Ok(())
    }

    // ---- completion ----------------------------------------------------

    /// Override the baseline flags and score with the policy-driven
    /// computation. The baseline remains available and takes over again on
    /// the next evidence mutation.
    pub fn apply_evidence_policy(&mut self, policy: &EvidencePolicy) {
        self.evidence = scoring::policy_snapshot(self.counts(), policy);
    }

    fn recalculate(&mut self) {
        self.evidence = scoring::baseline_snapshot(self.counts());
    }

    fn counts(&self) -> EvidenceCounts {
        EvidenceCounts::tally(&self.photos, &self.readings, &self.checklist)
    }

    // ---- notes ---------------------------------------------------------

    pub fn set_engineer_notes(&mut self, notes: &str) {
        self.engineer_notes = Some(notes.to_string());
    }

    pub fn set_supervisor_notes(&mut self, notes: &str) -> Result<(), VisitError> {
        if self.supervisor_id.is_none() {
            return Err(VisitError::MissingPrecondition {
                what: "an assigned supervisor",
            });
        }
        self.supervisor_notes = Some(notes.to_string());
        Ok(())
    }

    // ---- queries -------------------------------------------------------

    pub fn id(&self) -> &VisitId {
        &self.id
    }

    pub fn visit_number(&self) -> &str {
        &self.visit_number
    }

    pub fn site_id(&self) -> &SiteId {
        &self.site_id
    }

    pub fn site_code(&self) -> &str {
        &self.site_code
    }

    pub fn site_name(&self) -> &str {
        &self.site_name
    }

    pub fn engineer_id(&self) -> &str {
        &self.engineer_id
    }

    pub fn engineer_name(&self) -> &str {
        &self.engineer_name
    }

    pub fn supervisor_id(&self) -> Option<&str> {
        self.supervisor_id.as_deref()
    }

    pub fn technician_names(&self) -> &[String] {
        &self.technician_names
    }

    pub fn contact_person(&self) -> Option<&str> {
        self.contact_person.as_deref()
    }

    pub fn scheduled_date(&self) -> NaiveDate {
        self.scheduled_date
    }

    pub fn planned_order(&self) -> Option<u32> {
        self.planned_order
    }

    pub fn kind(&self) -> VisitKind {
        self.kind
    }

    pub fn status(&self) -> VisitStatus {
        self.status
    }

    pub fn check_in_position(&self) -> Option<GeoPoint> {
        self.check_in_position
    }

    pub fn check_in_at(&self) -> Option<DateTime<Utc>> {
        self.check_in_at
    }

    pub fn check_out_at(&self) -> Option<DateTime<Utc>> {
        self.check_out_at
    }

    pub fn distance_from_site_m(&self) -> Option<f64> {
        self.distance_from_site_m
    }

    pub fn is_within_site_radius(&self) -> bool {
        self.is_within_site_radius
    }

    pub fn actual_start(&self) -> Option<DateTime<Utc>> {
        self.actual_start
    }

    pub fn actual_end(&self) -> Option<DateTime<Utc>> {
        self.actual_end
    }

    pub fn duration_minutes(&self) -> Option<i64> {
        self.duration_minutes
    }

    pub fn photos(&self) -> &[VisitPhoto] {
        &self.photos
    }

    pub fn photos_by_kind(&self, kind: PhotoKind) -> Vec<&VisitPhoto> {
        self.photos.iter().filter(|p| p.kind == kind).collect()
    }

    pub fn readings(&self) -> &[VisitReading] {
        &self.readings
    }

    pub fn checklist(&self) -> &[VisitChecklistItem] {
        &self.checklist
    }

    pub fn materials_used(&self) -> &[VisitMaterialUsage] {
        &self.materials_used
    }

    pub fn issues(&self) -> &[VisitIssue] {
        &self.issues
    }

    pub fn approval_history(&self) -> &[ApprovalRecord] {
        &self.approval_history
    }

    pub fn evidence(&self) -> EvidenceSnapshot {
        self.evidence
    }

    pub fn engineer_notes(&self) -> Option<&str> {
        self.engineer_notes.as_deref()
    }

    pub fn supervisor_notes(&self) -> Option<&str> {
        self.supervisor_notes.as_deref()
    }

    pub fn reviewer_notes(&self) -> Option<&str> {
        self.reviewer_notes.as_deref()
    }

    pub fn total_material_cost(&self) -> f64 {
        self.materials_used.iter().map(|usage| usage.total_cost).sum()
    }

    pub fn can_be_submitted(&self) -> bool {
        (self.status == VisitStatus::Completed || self.status == VisitStatus::NeedsCorrection)
            && self.evidence.photos_complete
            && self.evidence.readings_complete
            && self.evidence.checklist_complete
    }

    pub fn can_be_edited(&self) -> bool {
        matches!(
            self.status,
            VisitStatus::Scheduled
                | VisitStatus::InProgress
                | VisitStatus::Completed
                | VisitStatus::NeedsCorrection
        )
    }

    pub fn status_view(&self) -> VisitStatusView {
        VisitStatusView {
            visit_id: self.id.clone(),
            visit_number: self.visit_number.clone(),
            site_code: self.site_code.clone(),
            status: self.status.label(),
            kind: self.kind.label(),
            completion_score: self.evidence.completion_score,
            photos_complete: self.evidence.photos_complete,
            readings_complete: self.evidence.readings_complete,
            checklist_complete: self.evidence.checklist_complete,
            distance_from_site_m: self.distance_from_site_m,
            within_site_radius: self.is_within_site_radius,
        }
    }

    /// Drain events accumulated since the last call. The caller dispatches
    /// them only after the mutation has been durably stored.
    pub fn take_events(&mut self) -> Vec<VisitEvent> {
        std::mem::take(&mut self.pending_events)
    }

    // ---- internals -----------------------------------------------------

    fn allocate_record_id(&mut self) -> RecordId {
        let id = RecordId(self.next_record_id);
        self.next_record_id += 1;
        id
    }

    fn require_status(
        &self,
        required: VisitStatus,
        action: &'static str,
    ) -> Result<(), VisitError> {
        if self.status != required {
            return Err(VisitError::InvalidStateTransition {
                action,
                current: self.status,
            });
        }
        Ok(())
    }

    fn refuse_after_review(&self, action: &'static str) -> Result<(), VisitError> {
        if self.status == VisitStatus::Approved || self.status == VisitStatus::Rejected {
            return Err(VisitError::InvalidStateTransition {
                action,
                current: self.status,
            });
        }
        Ok(())
    }

    fn append_approval(
        &mut self,
        reviewer_id: &str,
        reviewer_name: &str,
        action: ApprovalAction,
        notes: Option<&str>,
        now: DateTime<Utc>,
    ) {
        self.approval_history.push(ApprovalRecord {
            reviewer_id: reviewer_id.to_string(),
            reviewer_name: reviewer_name.to_string(),
            action,
            notes: notes.map(str::to_string),
            recorded_at: now,
        });
    }
}

/// Sanitized representation of a visit's exposed status.
#[derive(Debug, Clone, Serialize)]
pub struct VisitStatusView {
    pub visit_id: VisitId,
    pub visit_number: String,
    pub site_code: String,
    pub status: &'static str,
    pub kind: &'static str,
    pub completion_score: u32,
    pub photos_complete: bool,
    pub readings_complete: bool,
    pub checklist_complete: bool,
    pub distance_from_site_m: Option<f64>,
    pub within_site_radius: bool,
}
