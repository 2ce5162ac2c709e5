//! Evidence-completion scoring.
//!
//! Two computations coexist on purpose: the baseline snapshot recomputed on
//! every evidence mutation, and the policy-driven snapshot applied when an
//! office has configured thresholds for the site or visit kind. Neither
//! supersedes the other; the caller selects explicitly. All partial products
//! truncate toward zero exactly once per term before summing, so boundary
//! scores are reproducible.

use serde::{Deserialize, Serialize};

use super::domain::{PhotoKind, VisitKind};
use super::error::VisitError;
use super::evidence::{VisitChecklistItem, VisitPhoto, VisitReading};

const PHOTOS_WEIGHT: u32 = 40;
const READINGS_WEIGHT: u32 = 30;
const CHECKLIST_WEIGHT: u32 = 30;

/// Externally configured evidence thresholds. Deserialization funnels
/// through the same validation as `new`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "PolicyThresholds")]
pub struct EvidencePolicy {
    min_photos_required: u32,
    readings_required: bool,
    checklist_required: bool,
    min_checklist_completion_percent: u32,
}

#[derive(Debug, Deserialize)]
struct PolicyThresholds {
    min_photos_required: u32,
    readings_required: bool,
    checklist_required: bool,
    min_checklist_completion_percent: u32,
}

impl TryFrom<PolicyThresholds> for EvidencePolicy {
    type Error = VisitError;

    fn try_from(raw: PolicyThresholds) -> Result<Self, Self::Error> {
        Self::new(
            raw.min_photos_required,
            raw.readings_required,
            raw.checklist_required,
            raw.min_checklist_completion_percent,
        )
    }
}

impl EvidencePolicy {
    pub fn new(
        min_photos_required: u32,
        readings_required: bool,
        checklist_required: bool,
        min_checklist_completion_percent: u32,
    ) -> Result<Self, VisitError> {
        if min_checklist_completion_percent > 100 {
            return Err(VisitError::ValueConstraint {
                constraint: "minimum checklist completion percent must be between 0 and 100",
            });
        }
        Ok(Self {
            min_photos_required,
            readings_required,
            checklist_required,
            min_checklist_completion_percent,
        })
    }

    /// Office defaults per visit kind: corrective work demands a fully
    /// addressed checklist, everything else follows the preventive profile.
    pub fn default_for(kind: VisitKind) -> Self {
        match kind {
            VisitKind::Corrective => Self {
                min_photos_required: 2,
                readings_required: true,
                checklist_required: true,
                min_checklist_completion_percent: 100,
            },
            _ => Self {
                min_photos_required: 3,
                readings_required: true,
                checklist_required: true,
                min_checklist_completion_percent: 80,
            },
        }
    }

    pub fn min_photos_required(&self) -> u32 {
        self.min_photos_required
    }

    pub fn readings_required(&self) -> bool {
        self.readings_required
    }

    pub fn checklist_required(&self) -> bool {
        self.checklist_required
    }

    pub fn min_checklist_completion_percent(&self) -> u32 {
        self.min_checklist_completion_percent
    }
}

/// Completion flags plus the 0-100 weighted score as of one recalculation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct EvidenceSnapshot {
    pub photos_complete: bool,
    pub readings_complete: bool,
    pub checklist_complete: bool,
    pub completion_score: u32,
}

impl Default for EvidenceSnapshot {
    fn default() -> Self {
        Self {
            photos_complete: false,
            readings_complete: false,
            checklist_complete: false,
            completion_score: 0,
        }
    }
}

/// Tallies extracted from the evidence collections once per recalculation.
#[derive(Debug, Clone, Copy, Default)]
pub(super) struct EvidenceCounts {
    pub before_photos: u32,
    pub after_photos: u32,
    pub total_photos: u32,
    pub readings: u32,
    pub checklist_total: u32,
    pub checklist_addressed: u32,
}

impl EvidenceCounts {
    pub(super) fn tally(
        photos: &[VisitPhoto],
        readings: &[VisitReading],
        checklist: &[VisitChecklistItem],
    ) -> Self {
        Self {
            before_photos: photos.iter().filter(|p| p.kind == PhotoKind::Before).count() as u32,
            after_photos: photos.iter().filter(|p| p.kind == PhotoKind::After).count() as u32,
            total_photos: photos.len() as u32,
            readings: readings.len() as u32,
            checklist_total: checklist.len() as u32,
            checklist_addressed: checklist.iter().filter(|i| i.is_addressed()).count() as u32,
        }
    }
}

/// Snapshot recomputed on every evidence mutation, independent of any
/// configured policy. Photos contribute 0, 20, or 40 depending on which of
/// the before/after parts exist.
pub(super) fn baseline_snapshot(counts: EvidenceCounts) -> EvidenceSnapshot {
    let photo_parts =
        u32::from(counts.before_photos > 0) + u32::from(counts.after_photos > 0);
    let photos_score = photo_parts * 50;
    let readings_score = if counts.readings > 0 { 100 } else { 0 };

    let mut achieved = PHOTOS_WEIGHT * photos_score / 100;
    achieved += READINGS_WEIGHT * readings_score / 100;
    if counts.checklist_total > 0 {
        let checklist_score = counts.checklist_addressed * 100 / counts.checklist_total;
        achieved += CHECKLIST_WEIGHT * checklist_score / 100;
    }

    EvidenceSnapshot {
        photos_complete: counts.before_photos > 0 && counts.after_photos > 0,
        readings_complete: counts.readings > 0,
        checklist_complete: counts.checklist_total > 0
            && counts.checklist_addressed == counts.checklist_total,
        completion_score: achieved,
    }
}

/// Snapshot under an office-configured policy, overriding the baseline
/// flags and score when applied.
pub(super) fn policy_snapshot(counts: EvidenceCounts, policy: &EvidencePolicy) -> EvidenceSnapshot {
    let addressed_percent = if counts.checklist_total == 0 {
        0
    } else {
        counts.checklist_addressed * 100 / counts.checklist_total
    };

    let photos_score = if policy.min_photos_required == 0 {
        100
    } else {
        (counts.total_photos * 100 / policy.min_photos_required).min(100)
    };
    let readings_score = if !policy.readings_required || counts.readings > 0 {
        100
    } else {
        0
    };

    let mut achieved = PHOTOS_WEIGHT * photos_score / 100;
    achieved += READINGS_WEIGHT * readings_score / 100;
    if !policy.checklist_required {
        achieved += CHECKLIST_WEIGHT;
    } else {
        achieved += CHECKLIST_WEIGHT * addressed_percent / 100;
    }

    EvidenceSnapshot {
        photos_complete: counts.total_photos >= policy.min_photos_required,
        readings_complete: !policy.readings_required || counts.readings > 0,
        checklist_complete: !policy.checklist_required
            || addressed_percent >= policy.min_checklist_completion_percent,
        completion_score: achieved,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn counts(
        before: u32,
        after: u32,
        other: u32,
        readings: u32,
        checklist_total: u32,
        checklist_addressed: u32,
    ) -> EvidenceCounts {
        EvidenceCounts {
            before_photos: before,
            after_photos: after,
            total_photos: before + after + other,
            readings,
            checklist_total,
            checklist_addressed,
        }
    }

    #[test]
    fn baseline_photo_pair_alone_scores_forty() {
        let snapshot = baseline_snapshot(counts(1, 1, 0, 0, 0, 0));
        assert_eq!(snapshot.completion_score, 40);
        assert!(snapshot.photos_complete);
        assert!(!snapshot.readings_complete);
        assert!(!snapshot.checklist_complete);
    }

    #[test]
    fn baseline_single_photo_part_scores_twenty() {
        assert_eq!(baseline_snapshot(counts(1, 0, 0, 0, 0, 0)).completion_score, 20);
        assert_eq!(baseline_snapshot(counts(0, 3, 0, 0, 0, 0)).completion_score, 20);
    }

    #[test]
    fn baseline_checklist_truncates_per_term() {
        // 2 of 3 addressed: 2*100/3 = 66, then 30*66/100 = 19.
        let snapshot = baseline_snapshot(counts(0, 0, 0, 0, 3, 2));
        assert_eq!(snapshot.completion_score, 19);
        assert!(!snapshot.checklist_complete);
    }

    #[test]
    fn baseline_full_evidence_scores_hundred() {
        let snapshot = baseline_snapshot(counts(1, 1, 0, 2, 2, 2));
        assert_eq!(snapshot.completion_score, 100);
        assert!(snapshot.photos_complete);
        assert!(snapshot.readings_complete);
        assert!(snapshot.checklist_complete);
    }

    #[test]
    fn baseline_checklist_needs_every_item_addressed() {
        let snapshot = baseline_snapshot(counts(1, 1, 0, 1, 4, 3));
        assert!(!snapshot.checklist_complete);
        let snapshot = baseline_snapshot(counts(1, 1, 0, 1, 0, 0));
        assert!(!snapshot.checklist_complete, "empty checklist is incomplete");
    }

    #[test]
    fn policy_partial_photos_scale_proportionally() {
        let policy = EvidencePolicy::new(10, false, false, 0).expect("valid policy");
        let snapshot = policy_snapshot(counts(5, 0, 0, 0, 0, 0), &policy);
        // 40*50/100 + 30 + 30 = 80.
        assert_eq!(snapshot.completion_score, 80);
        assert!(!snapshot.photos_complete);
        assert!(snapshot.readings_complete);
        assert!(snapshot.checklist_complete);
    }

    #[test]
    fn policy_zero_minimum_grants_full_photo_score() {
        let policy = EvidencePolicy::new(0, true, true, 50).expect("valid policy");
        let snapshot = policy_snapshot(counts(0, 0, 0, 0, 0, 0), &policy);
        assert_eq!(snapshot.completion_score, 40);
        assert!(snapshot.photos_complete);
    }

    #[test]
    fn policy_photo_score_caps_at_hundred() {
        let policy = EvidencePolicy::new(2, false, false, 0).expect("valid policy");
        let snapshot = policy_snapshot(counts(3, 3, 1, 0, 0, 0), &policy);
        assert_eq!(snapshot.completion_score, 100);
    }

    #[test]
    fn policy_checklist_threshold_gates_flag() {
        let policy = EvidencePolicy::new(0, false, true, 80).expect("valid policy");
        let below = policy_snapshot(counts(0, 0, 0, 0, 5, 3), &policy);
        assert!(!below.checklist_complete, "60% is below the 80% threshold");
        let at = policy_snapshot(counts(0, 0, 0, 0, 5, 4), &policy);
        assert!(at.checklist_complete, "80% meets the threshold");
    }

    #[test]
    fn policy_empty_checklist_counts_as_zero_percent() {
        let policy = EvidencePolicy::new(0, false, true, 50).expect("valid policy");
        let snapshot = policy_snapshot(counts(0, 0, 0, 0, 0, 0), &policy);
        assert!(!snapshot.checklist_complete);
        assert_eq!(snapshot.completion_score, 40 + 30);
    }

    #[test]
    fn policy_rejects_percent_above_hundred() {
        let err = EvidencePolicy::new(0, false, false, 101).expect_err("invalid percent");
        assert_eq!(err.code(), "visit.value_constraint");
    }

    #[test]
    fn policy_deserialization_enforces_the_percent_bound() {
        let payload = serde_json::json!({
            "min_photos_required": 2,
            "readings_required": true,
            "checklist_required": true,
            "min_checklist_completion_percent": 101,
        });
        let err = serde_json::from_value::<EvidencePolicy>(payload).expect_err("invalid percent");
        assert!(err.to_string().contains("between 0 and 100"), "{err}");

        let payload = serde_json::json!({
            "min_photos_required": 2,
            "readings_required": true,
            "checklist_required": true,
            "min_checklist_completion_percent": 80,
        });
        let policy = serde_json::from_value::<EvidencePolicy>(payload).expect("valid thresholds");
        assert_eq!(policy.min_checklist_completion_percent(), 80);
    }
}
