use serde::{Deserialize, Serialize};

/// Identifier wrapper for visits.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct VisitId(pub String);

/// Identifier wrapper for sites. Sites are external: the core reads their
/// registered position and radius but never mutates site state.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct SiteId(pub String);

/// Identifier for records owned by a single visit (photos, readings,
/// checklist items, issues, material-usage lines). Assigned sequentially by
/// the owning aggregate; never unique across visits.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct RecordId(pub u32);

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum VisitStatus {
    Scheduled,
    InProgress,
    Completed,
    Submitted,
    UnderReview,
    NeedsCorrection,
    Approved,
    Rejected,
    Cancelled,
}

impl VisitStatus {
    pub const fn label(self) -> &'static str {
        match self {
            Self::Scheduled => "scheduled",
            Self::InProgress => "in_progress",
            Self::Completed => "completed",
            Self::Submitted => "submitted",
            Self::UnderReview => "under_review",
            Self::NeedsCorrection => "needs_correction",
            Self::Approved => "approved",
            Self::Rejected => "rejected",
            Self::Cancelled => "cancelled",
        }
    }

    /// Approved, Rejected, and Cancelled accept no further transitions.
    pub const fn is_terminal(self) -> bool {
        matches!(self, Self::Approved | Self::Rejected | Self::Cancelled)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum VisitKind {
    Preventive,
    Corrective,
    Emergency,
    Installation,
    Inspection,
    Audit,
}

impl VisitKind {
    pub const fn label(self) -> &'static str {
        match self {
            Self::Preventive => "preventive",
            Self::Corrective => "corrective",
            Self::Emergency => "emergency",
            Self::Installation => "installation",
            Self::Inspection => "inspection",
            Self::Audit => "audit",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PhotoKind {
    Before,
    After,
    During,
    Material,
    Issue,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PhotoCategory {
    ShelterInside,
    ShelterOutside,
    Tower,
    Fence,
    Rectifier,
    Batteries,
    PowerMeter,
    AirConditioner,
    FireExtinguisher,
    Antenna,
    Generator,
    EarthBar,
    Logbook,
    Other,
}

/// Outcome recorded against a checklist item. An item counts as addressed
/// once its status is anything other than `NotApplicable`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CheckStatus {
    Ok,
    NotOk,
    NotApplicable,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ChecklistCategory {
    General,
    Power,
    Radio,
    Transmission,
    Tower,
    Generator,
    Fence,
    EarthBar,
    FireSafety,
    Cooling,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum IssueSeverity {
    Low,
    Medium,
    High,
    Critical,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum IssueStatus {
    Open,
    Resolved,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MaterialUsageStatus {
    Logged,
    Reconciled,
}
