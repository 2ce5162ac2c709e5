use serde::Serialize;

use super::domain::VisitStatus;

/// Evidence category referenced by submission gating.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum EvidenceKind {
    Photos,
    Readings,
    Checklist,
}

impl EvidenceKind {
    pub const fn label(self) -> &'static str {
        match self {
            Self::Photos => "photos",
            Self::Readings => "readings",
            Self::Checklist => "checklist",
        }
    }
}

fn missing_labels(missing: &[EvidenceKind]) -> String {
    missing
        .iter()
        .map(|kind| kind.label())
        .collect::<Vec<_>>()
        .join(", ")
}

/// Domain-rule violations raised by the visit aggregate. All fail fast:
/// a refused call leaves the aggregate exactly as it was.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum VisitError {
    #[error("cannot {action} a visit in {} status", current.label())]
    InvalidStateTransition {
        action: &'static str,
        current: VisitStatus,
    },
    #[error("{what} must be recorded first")]
    MissingPrecondition { what: &'static str },
    #[error("evidence incomplete: {}", missing_labels(missing))]
    EvidenceIncomplete { missing: Vec<EvidenceKind> },
    #[error("{constraint}")]
    ValueConstraint { constraint: &'static str },
    #[error("{field} is required")]
    RequiredFieldMissing { field: &'static str },
}

impl VisitError {
    /// Stable reason code suitable for mapping to an external protocol's
    /// error representation.
    pub const fn code(&self) -> &'static str {
        match self {
            Self::InvalidStateTransition { .. } => "visit.invalid_state_transition",
            Self::MissingPrecondition { .. } => "visit.missing_precondition",
            Self::EvidenceIncomplete { .. } => "visit.evidence_incomplete",
            Self::ValueConstraint { .. } => "visit.value_constraint",
            Self::RequiredFieldMissing { .. } => "visit.required_field_missing",
        }
    }
}
