use std::sync::Arc;

use chrono::{DateTime, Utc};
use serde::Serialize;
use tracing::warn;

use super::error::VisitError;
use super::geo::GeoPoint;
use super::repository::{RepositoryError, SiteProvider};
use super::visit::Visit;

/// Resolves the registered site position and radius, measures the reported
/// position against them and records the outcome on the visit.
pub struct GeoCheckInCoordinator<S> {
    sites: Arc<S>,
}

/// What a check-in measured. Returned to the caller verbatim; the same
/// values are recorded on the visit.
#[derive(Debug, Clone, Copy, Serialize)]
pub struct CheckInOutcome {
    pub distance_from_site_m: f64,
    pub within_radius: bool,
}

#[derive(Debug, thiserror::Error)]
pub enum CheckInError {
    #[error(transparent)]
    Visit(#[from] VisitError),
    #[error(transparent)]
    Repository(#[from] RepositoryError),
}

impl<S: SiteProvider> GeoCheckInCoordinator<S> {
    pub fn new(sites: Arc<S>) -> Self {
        Self { sites }
    }

    /// An out-of-radius position is not an error: the check-in is recorded
    /// with the anomaly flagged on the visit and in the emitted events.
    pub fn check_in(
        &self,
        visit: &mut Visit,
        reported: GeoPoint,
        now: DateTime<Utc>,
    ) -> Result<CheckInOutcome, CheckInError> {
        let site = self.sites.fetch(visit.site_id())?;
        if site.allowed_radius_m < 0.0 {
            return Err(VisitError::ValueConstraint {
                constraint: "allowed radius must not be negative",
            }
            .into());
        }

        let distance_from_site_m = reported.distance_to(&site.position);
        let within_radius = distance_from_site_m <= site.allowed_radius_m;
        if !within_radius {
            warn!(
                visit = %visit.id().0,
                site = %site.code,
                distance_m = distance_from_site_m,
                radius_m = site.allowed_radius_m,
                "check-in outside allowed radius"
            );
        }

        visit.record_check_in(reported, distance_from_site_m, within_radius, now)?;
        Ok(CheckInOutcome {
            distance_from_site_m,
            within_radius,
        })
    }
}
