use chrono::{DateTime, NaiveDate, Utc};
use serde::Serialize;

use super::materials::{MaterialId, MaterialQuantity};
use super::visits::domain::{SiteId, VisitId};

/// Lifecycle events accumulated by the visit aggregate during a mutation.
///
/// The aggregate never dispatches anything itself: the caller drains the
/// pending list with `Visit::take_events` after the mutation is durably
/// stored and hands each event to the configured [`EventSink`].
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "event", rename_all = "snake_case")]
pub enum VisitEvent {
    Created {
        visit_id: VisitId,
        site_id: SiteId,
        engineer_id: String,
        scheduled_date: NaiveDate,
    },
    Started {
        visit_id: VisitId,
        site_id: SiteId,
    },
    CheckedIn {
        visit_id: VisitId,
        site_id: SiteId,
        distance_from_site_m: f64,
        within_radius: bool,
    },
    /// Raised alongside `CheckedIn` whenever the reported position falls
    /// outside the site's allowed radius. An anomaly, not a failure.
    SuspiciousCheckIn {
        visit_id: VisitId,
        site_id: SiteId,
        distance_from_site_m: f64,
    },
    CheckedOut {
        visit_id: VisitId,
        site_id: SiteId,
    },
    Completed {
        visit_id: VisitId,
        site_id: SiteId,
        duration_minutes: i64,
    },
    Submitted {
        visit_id: VisitId,
        site_id: SiteId,
    },
    Approved {
        visit_id: VisitId,
        reviewer_id: String,
    },
    Rejected {
        visit_id: VisitId,
        reviewer_id: String,
        reason: String,
    },
    CorrectionRequested {
        visit_id: VisitId,
        reviewer_id: String,
        notes: String,
    },
    Rescheduled {
        visit_id: VisitId,
        scheduled_date: NaiveDate,
    },
    CriticalIssueReported {
        visit_id: VisitId,
        site_id: SiteId,
        description: String,
    },
}

/// Stock events accumulated by the material aggregate.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "event", rename_all = "snake_case")]
pub enum MaterialEvent {
    Restocked {
        material_id: MaterialId,
        quantity: MaterialQuantity,
        stock_after: MaterialQuantity,
        performed_by: String,
        recorded_at: DateTime<Utc>,
    },
    Consumed {
        material_id: MaterialId,
        visit_id: VisitId,
        quantity: MaterialQuantity,
        performed_by: String,
        recorded_at: DateTime<Utc>,
    },
    /// Re-emitted on every stock decrement that lands at or below the
    /// configured minimum, not only on the first crossing.
    LowStock {
        material_id: MaterialId,
        current_stock: MaterialQuantity,
        minimum_stock: MaterialQuantity,
    },
}

/// Envelope handed to the event sink once a mutation has been stored.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum DomainEvent {
    Visit(VisitEvent),
    Material(MaterialEvent),
}

impl From<VisitEvent> for DomainEvent {
    fn from(value: VisitEvent) -> Self {
        Self::Visit(value)
    }
}

impl From<MaterialEvent> for DomainEvent {
    fn from(value: MaterialEvent) -> Self {
        Self::Material(value)
    }
}

/// Trait describing outbound event hooks (notification adapters, audit log).
///
/// Delivery and ordering across events are the sink's responsibility.
pub trait EventSink: Send + Sync {
    fn publish(&self, event: DomainEvent) -> Result<(), EventError>;
}

/// Event dispatch error.
#[derive(Debug, thiserror::Error)]
pub enum EventError {
    #[error("event transport unavailable: {0}")]
    Transport(String),
}
