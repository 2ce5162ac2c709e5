use crate::workflows::events::VisitEvent;
use crate::workflows::visits::domain::{PhotoKind, VisitId, VisitStatus};
use crate::workflows::visits::error::{EvidenceKind, VisitError};
use crate::workflows::visits::repository::{RepositoryError, VisitRepository};
use crate::workflows::visits::scoring::EvidencePolicy;
use crate::workflows::visits::service::VisitServiceError;

use super::common::{
    harness, off_site_position, photo, schedule_request, site_position, with_full_evidence, Harness,
};

fn scheduled(h: &Harness) -> VisitId {
    let view = h.service.schedule(schedule_request()).expect("schedule");
    view.visit_id
}

#[test]
fn schedule_persists_and_announces_the_visit() {
    let h = harness();
    let id = scheduled(&h);

    let stored = h.visits.fetch(&id).expect("persisted");
    assert_eq!(stored.status(), VisitStatus::Scheduled);
    assert_eq!(stored.site_code(), "CAI001");
    assert!(stored.visit_number().starts_with('V'));

    let events = h.sink.visit_events();
    assert!(matches!(events.as_slice(), [VisitEvent::Created { .. }]));
}

#[test]
fn full_lifecycle_reaches_approved_with_one_audit_record() {
    let h = harness();
    let id = scheduled(&h);

    h.service.start(&id, site_position()).expect("start");
    with_full_evidence(&h, &id);

    h.clock.advance_minutes(45);
    let view = h.service.complete(&id).expect("complete");
    assert_eq!(view.status, "completed");
    assert_eq!(view.completion_score, 100);

    h.service.submit(&id).expect("submit");
    h.service.start_review(&id).expect("review");
    let view = h
        .service
        .approve(&id, "sup-01", "Nadia Hassan", Some("Clean visit"))
        .expect("approve");
    assert_eq!(view.status, "approved");

    let stored = h.visits.fetch(&id).expect("persisted");
    assert_eq!(stored.duration_minutes(), Some(45));
    assert_eq!(stored.approval_history().len(), 1);
    assert_eq!(stored.reviewer_notes(), Some("Clean visit"));

    let kinds: Vec<&'static str> = h
        .sink
        .visit_events()
        .iter()
        .map(|event| match event {
            VisitEvent::Created { .. } => "created",
            VisitEvent::Started { .. } => "started",
            VisitEvent::Completed { .. } => "completed",
            VisitEvent::Submitted { .. } => "submitted",
            VisitEvent::Approved { .. } => "approved",
            _ => "other",
        })
        .collect();
    assert_eq!(
        kinds,
        vec!["created", "started", "completed", "submitted", "approved"]
    );
}

#[test]
fn configured_policy_overrides_the_baseline_gate() {
    let h = harness();
    let id = scheduled(&h);
    h.service.start(&id, site_position()).expect("start");
    with_full_evidence(&h, &id);
    h.clock.advance_minutes(60);
    h.service.complete(&id).expect("complete");

    // Stricter than the evidence on file: five photos required.
    h.policies
        .configure(EvidencePolicy::new(5, true, true, 80).expect("valid policy"));
    let err = h.service.submit(&id).expect_err("two photos are not five");
    match err {
        VisitServiceError::Visit(VisitError::EvidenceIncomplete { missing }) => {
            assert_eq!(missing, vec![EvidenceKind::Photos]);
        }
        other => panic!("unexpected error: {other}"),
    }

    let stored = h.visits.fetch(&id).expect("persisted");
    assert_eq!(stored.status(), VisitStatus::Completed, "gate refused, nothing stored");
}

#[test]
fn relaxed_policy_admits_evidence_the_baseline_would_refuse() {
    let h = harness();
    let id = scheduled(&h);
    h.service.start(&id, site_position()).expect("start");
    // A single photo fails the baseline pair rule.
    h.service
        .add_photo(&id, photo(PhotoKind::During))
        .expect("photo");
    h.clock.advance_minutes(40);
    h.service.complete(&id).expect("complete");

    h.policies
        .configure(EvidencePolicy::new(1, false, false, 0).expect("valid policy"));
    let view = h.service.submit(&id).expect("relaxed gate");
    assert_eq!(view.status, "submitted");
    assert_eq!(view.completion_score, 100);
}

#[test]
fn off_site_check_in_is_recorded_and_flagged() {
    let h = harness();
    let id = scheduled(&h);
    h.service.start(&id, site_position()).expect("start");

    let outcome = h
        .service
        .check_in(&id, off_site_position())
        .expect("recorded despite the anomaly");
    assert!(!outcome.within_radius);

    let stored = h.visits.fetch(&id).expect("persisted");
    assert_eq!(stored.distance_from_site_m(), Some(outcome.distance_from_site_m));
    assert!(!stored.is_within_site_radius());

    assert!(h
        .sink
        .visit_events()
        .iter()
        .any(|event| matches!(event, VisitEvent::SuspiciousCheckIn { .. })));
}

#[test]
fn refused_mutation_publishes_nothing() {
    let h = harness();
    let id = scheduled(&h);
    h.service.start(&id, site_position()).expect("start");
    let published = h.sink.events().len();

    h.clock.advance_minutes(45);
    h.service.complete(&id).expect("complete");
    h.service.submit(&id).expect_err("no evidence on file");

    let events = h.sink.visit_events();
    assert_eq!(h.sink.events().len(), published + 1, "only the completion");
    assert!(matches!(events.last(), Some(VisitEvent::Completed { .. })));
}

#[test]
fn unknown_visit_surfaces_not_found() {
    let h = harness();
    let missing = VisitId("vst-does-not-exist".to_string());
    let err = h.service.status(&missing).expect_err("unknown id");
    assert!(matches!(
        err,
        VisitServiceError::Repository(RepositoryError::NotFound(_))
    ));
}
