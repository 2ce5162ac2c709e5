use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Reviewer decision kind recorded in the approval history.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ApprovalAction {
    Approved,
    Rejected,
    RequestCorrection,
    OnHold,
}

impl ApprovalAction {
    pub const fn label(self) -> &'static str {
        match self {
            Self::Approved => "approved",
            Self::Rejected => "rejected",
            Self::RequestCorrection => "request_correction",
            Self::OnHold => "on_hold",
        }
    }
}

/// One entry of the append-only review audit trail. The history is never
/// rewritten or reordered; insertion order is the compliance record.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ApprovalRecord {
    pub reviewer_id: String,
    pub reviewer_name: String,
    pub action: ApprovalAction,
    pub notes: Option<String>,
    pub recorded_at: DateTime<Utc>,
}
