use crate::workflows::events::VisitEvent;
use crate::workflows::visits::checkin::{CheckInError, GeoCheckInCoordinator};
use crate::workflows::visits::error::VisitError;
use crate::workflows::visits::geo::GeoPoint;
use crate::workflows::visits::repository::RepositoryError;

use super::common::{
    nine_am, off_site_position, scheduled_visit, site, site_position, MemorySites,
};

#[test]
fn check_in_inside_the_radius_is_clean() {
    let coordinator = GeoCheckInCoordinator::new(MemorySites::with(site()));
    let mut visit = scheduled_visit();

    // ~20 m east of the registered position.
    let nearby = GeoPoint::new(30.0444, 31.2359).expect("valid");
    let outcome = coordinator
        .check_in(&mut visit, nearby, nine_am())
        .expect("check-in");

    assert!(outcome.within_radius);
    assert!(outcome.distance_from_site_m < 100.0);
    assert!(visit.is_within_site_radius());
    assert_eq!(visit.distance_from_site_m(), Some(outcome.distance_from_site_m));
    assert_eq!(visit.check_in_at(), Some(nine_am()));

    let events = visit.take_events();
    assert!(events
        .iter()
        .any(|event| matches!(event, VisitEvent::CheckedIn { within_radius: true, .. })));
    assert!(!events
        .iter()
        .any(|event| matches!(event, VisitEvent::SuspiciousCheckIn { .. })));
}

#[test]
fn check_in_outside_the_radius_is_recorded_and_flagged() {
    let coordinator = GeoCheckInCoordinator::new(MemorySites::with(site()));
    let mut visit = scheduled_visit();

    let outcome = coordinator
        .check_in(&mut visit, off_site_position(), nine_am())
        .expect("recorded despite the anomaly");

    assert!(!outcome.within_radius);
    assert!(outcome.distance_from_site_m > 1_000.0);
    assert!(!visit.is_within_site_radius());
    assert_eq!(visit.check_in_at(), Some(nine_am()));

    let events = visit.take_events();
    assert!(matches!(
        events.as_slice(),
        [
            VisitEvent::CheckedIn { within_radius: false, .. },
            VisitEvent::SuspiciousCheckIn { .. },
        ]
    ));
}

#[test]
fn negative_radius_is_refused_before_measuring() {
    let mut bad_site = site();
    bad_site.allowed_radius_m = -5.0;
    let coordinator = GeoCheckInCoordinator::new(MemorySites::with(bad_site));
    let mut visit = scheduled_visit();

    let err = coordinator
        .check_in(&mut visit, site_position(), nine_am())
        .expect_err("invalid geofence");
    assert!(matches!(
        err,
        CheckInError::Visit(VisitError::ValueConstraint { .. })
    ));
    assert!(visit.check_in_at().is_none());
    assert!(visit.take_events().is_empty());
}

#[test]
fn unknown_site_surfaces_not_found() {
    let coordinator =
        GeoCheckInCoordinator::new(std::sync::Arc::new(MemorySites::default()));
    let mut visit = scheduled_visit();

    let err = coordinator
        .check_in(&mut visit, site_position(), nine_am())
        .expect_err("no such site");
    assert!(matches!(
        err,
        CheckInError::Repository(RepositoryError::NotFound(_))
    ));
}

#[test]
fn terminal_visit_refuses_check_in() {
    let coordinator = GeoCheckInCoordinator::new(MemorySites::with(site()));
    let mut visit = scheduled_visit();
    visit.cancel("storm warning").expect("cancellable");

    let err = coordinator
        .check_in(&mut visit, site_position(), nine_am())
        .expect_err("cancelled");
    assert!(matches!(
        err,
        CheckInError::Visit(VisitError::InvalidStateTransition { .. })
    ));
}
