use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::workflows::materials::{MaterialId, MaterialQuantity};

use super::domain::{
    CheckStatus, ChecklistCategory, IssueSeverity, IssueStatus, MaterialUsageStatus, PhotoCategory,
    PhotoKind, RecordId,
};

/// Photo evidence owned by a single visit.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct VisitPhoto {
    pub id: RecordId,
    pub kind: PhotoKind,
    pub category: PhotoCategory,
    pub file_name: String,
    pub file_reference: String,
    pub description: Option<String>,
    pub captured_at: DateTime<Utc>,
}

/// Input for `Visit::add_photo`; the aggregate assigns id and timestamp.
#[derive(Debug, Clone, Deserialize)]
pub struct NewPhoto {
    pub kind: PhotoKind,
    pub category: PhotoCategory,
    pub file_name: String,
    pub file_reference: String,
    pub description: Option<String>,
}

/// Measurement captured on site, with an optional acceptable range.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct VisitReading {
    pub id: RecordId,
    pub reading_type: String,
    pub category: String,
    pub value: f64,
    pub unit: String,
    pub min_acceptable: Option<f64>,
    pub max_acceptable: Option<f64>,
    pub is_within_range: bool,
    pub measured_at: DateTime<Utc>,
    pub notes: Option<String>,
}

impl VisitReading {
    /// An out-of-range value is an anomaly recorded on the reading, never
    /// a failure.
    pub(super) fn revalidate_range(&mut self) {
        self.is_within_range = match (self.min_acceptable, self.max_acceptable) {
            (Some(min), Some(max)) => self.value >= min && self.value <= max,
            _ => true,
        };
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct NewReading {
    pub reading_type: String,
    pub category: String,
    pub value: f64,
    pub unit: String,
    pub min_acceptable: Option<f64>,
    pub max_acceptable: Option<f64>,
}

/// One line of the site checklist.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct VisitChecklistItem {
    pub id: RecordId,
    pub name: String,
    pub category: ChecklistCategory,
    pub status: CheckStatus,
    pub notes: Option<String>,
}

impl VisitChecklistItem {
    pub fn is_addressed(&self) -> bool {
        self.status != CheckStatus::NotApplicable
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct NewChecklistItem {
    pub name: String,
    pub category: ChecklistCategory,
}

/// Problem found on site during the visit.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct VisitIssue {
    pub id: RecordId,
    pub severity: IssueSeverity,
    pub category: String,
    pub description: String,
    pub status: IssueStatus,
    pub resolution: Option<String>,
    pub reported_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct NewIssue {
    pub severity: IssueSeverity,
    pub category: String,
    pub description: String,
}

/// Material drawn for this visit, held by material identifier only; stock
/// mutation goes through the material aggregate, never through the visit.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct VisitMaterialUsage {
    pub id: RecordId,
    pub material_id: MaterialId,
    pub material_code: String,
    pub material_name: String,
    pub quantity: MaterialQuantity,
    pub unit_cost: f64,
    pub total_cost: f64,
    pub reason: String,
    pub before_photo: Option<RecordId>,
    pub after_photo: Option<RecordId>,
    pub status: MaterialUsageStatus,
    pub used_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct NewMaterialUsage {
    pub material_id: MaterialId,
    pub material_code: String,
    pub material_name: String,
    pub quantity: MaterialQuantity,
    pub unit_cost: f64,
    pub reason: String,
    pub before_photo: Option<RecordId>,
    pub after_photo: Option<RecordId>,
}
