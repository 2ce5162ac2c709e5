//! Visit execution workflow: the visit lifecycle state machine, geofenced
//! check-in, evidence-completion scoring, and the review/approval trail.

pub mod approval;
pub mod checkin;
pub mod domain;
pub mod error;
pub mod evidence;
pub mod geo;
pub mod repository;
pub mod router;
pub mod scoring;
pub mod service;
pub mod visit;

pub use approval::{ApprovalAction, ApprovalRecord};
pub use checkin::{CheckInError, CheckInOutcome, GeoCheckInCoordinator};
pub use domain::{
    CheckStatus, ChecklistCategory, IssueSeverity, IssueStatus, PhotoCategory, PhotoKind, RecordId,
    SiteId, VisitId, VisitKind, VisitStatus,
};
pub use error::{EvidenceKind, VisitError};
pub use evidence::{
    NewChecklistItem, NewIssue, NewMaterialUsage, NewPhoto, NewReading, VisitChecklistItem,
    VisitIssue, VisitMaterialUsage, VisitPhoto, VisitReading,
};
pub use geo::GeoPoint;
pub use repository::{
    Clock, EvidencePolicySource, RepositoryError, SiteInfo, SiteProvider, SystemClock,
    VisitRepository,
};
pub use router::visit_router;
pub use scoring::{EvidencePolicy, EvidenceSnapshot};
pub use service::{ScheduleVisitRequest, TeamMember, VisitService, VisitServiceError};
pub use visit::{Visit, VisitStatusView};

#[cfg(test)]
mod tests;
