use std::sync::Arc;

use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{get, post},
    Router,
};
use chrono::NaiveDate;
use serde::Deserialize;
use serde_json::json;

use crate::workflows::events::EventSink;

use super::domain::VisitId;
use super::geo::GeoPoint;
use super::repository::{
    EvidencePolicySource, RepositoryError, SiteProvider, VisitRepository,
};
use super::service::{ScheduleVisitRequest, VisitService, VisitServiceError};

/// Router builder exposing HTTP endpoints for the visit lifecycle.
pub fn visit_router<R, S, P, E>(service: Arc<VisitService<R, S, P, E>>) -> Router
where
    R: VisitRepository + 'static,
    S: SiteProvider + 'static,
    P: EvidencePolicySource + 'static,
    E: EventSink + 'static,
{
    Router::new()
        .route("/api/v1/visits", post(schedule_handler::<R, S, P, E>))
        .route(
            "/api/v1/visits/:visit_id",
            get(status_handler::<R, S, P, E>),
        )
        .route(
            "/api/v1/visits/:visit_id/check-in",
            post(check_in_handler::<R, S, P, E>),
        )
        .route(
            "/api/v1/visits/:visit_id/submit",
            post(submit_handler::<R, S, P, E>),
        )
        .route(
            "/api/v1/visits/:visit_id/review",
            post(review_handler::<R, S, P, E>),
        )
        .route(
            "/api/v1/visits/:visit_id/reschedule",
            post(reschedule_handler::<R, S, P, E>),
        )
        .with_state(service)
}

#[derive(Debug, Deserialize)]
struct PositionBody {
    latitude: f64,
    longitude: f64,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "snake_case", tag = "decision")]
enum ReviewBody {
    Approve {
        reviewer_id: String,
        reviewer_name: String,
        #[serde(default)]
        notes: Option<String>,
    },
    Reject {
        reviewer_id: String,
        reviewer_name: String,
        reason: String,
    },
    RequestCorrection {
        reviewer_id: String,
        reviewer_name: String,
        notes: String,
    },
}

#[derive(Debug, Deserialize)]
struct RescheduleBody {
    new_date: NaiveDate,
    #[serde(default)]
    reason: Option<String>,
}

pub(crate) async fn schedule_handler<R, S, P, E>(
    State(service): State<Arc<VisitService<R, S, P, E>>>,
    axum::Json(request): axum::Json<ScheduleVisitRequest>,
) -> Response
where
    R: VisitRepository + 'static,
    S: SiteProvider + 'static,
    P: EvidencePolicySource + 'static,
    E: EventSink + 'static,
{
    match service.schedule(request) {
        Ok(view) => (StatusCode::CREATED, axum::Json(view)).into_response(),
        Err(error) => error_response(error),
    }
}

pub(crate) async fn status_handler<R, S, P, E>(
    State(service): State<Arc<VisitService<R, S, P, E>>>,
    Path(visit_id): Path<String>,
) -> Response
where
    R: VisitRepository + 'static,
    S: SiteProvider + 'static,
    P: EvidencePolicySource + 'static,
    E: EventSink + 'static,
{
    match service.status(&VisitId(visit_id)) {
        Ok(view) => (StatusCode::OK, axum::Json(view)).into_response(),
        Err(error) => error_response(error),
    }
}

pub(crate) async fn check_in_handler<R, S, P, E>(
    State(service): State<Arc<VisitService<R, S, P, E>>>,
    Path(visit_id): Path<String>,
    axum::Json(body): axum::Json<PositionBody>,
) -> Response
where
    R: VisitRepository + 'static,
    S: SiteProvider + 'static,
    P: EvidencePolicySource + 'static,
    E: EventSink + 'static,
{
    let reported = match GeoPoint::new(body.latitude, body.longitude) {
        Ok(point) => point,
        Err(error) => {
            let payload = json!({ "error": error.to_string(), "code": error.code() });
            return (StatusCode::UNPROCESSABLE_ENTITY, axum::Json(payload)).into_response();
        }
    };
    match service.check_in(&VisitId(visit_id), reported) {
        Ok(outcome) => (StatusCode::OK, axum::Json(outcome)).into_response(),
        Err(error) => error_response(error),
    }
}

pub(crate) async fn submit_handler<R, S, P, E>(
    State(service): State<Arc<VisitService<R, S, P, E>>>,
    Path(visit_id): Path<String>,
) -> Response
where
    R: VisitRepository + 'static,
    S: SiteProvider + 'static,
    P: EvidencePolicySource + 'static,
    E: EventSink + 'static,
{
    match service.submit(&VisitId(visit_id)) {
        Ok(view) => (StatusCode::OK, axum::Json(view)).into_response(),
        Err(error) => error_response(error),
    }
}

pub(crate) async fn review_handler<R, S, P, E>(
    State(service): State<Arc<VisitService<R, S, P, E>>>,
    Path(visit_id): Path<String>,
    axum::Json(body): axum::Json<ReviewBody>,
) -> Response
where
    R: VisitRepository + 'static,
    S: SiteProvider + 'static,
    P: EvidencePolicySource + 'static,
    E: EventSink + 'static,
{
    let id = VisitId(visit_id);
    let result = match body {
        ReviewBody::Approve {
            reviewer_id,
            reviewer_name,
            notes,
        } => service.approve(&id, &reviewer_id, &reviewer_name, notes.as_deref()),
        ReviewBody::Reject {
            reviewer_id,
            reviewer_name,
            reason,
        } => service.reject(&id, &reviewer_id, &reviewer_name, &reason),
        ReviewBody::RequestCorrection {
            reviewer_id,
            reviewer_name,
            notes,
        } => service.request_correction(&id, &reviewer_id, &reviewer_name, &notes),
    };
    match result {
        Ok(view) => (StatusCode::OK, axum::Json(view)).into_response(),
        Err(error) => error_response(error),
    }
}

pub(crate) async fn reschedule_handler<R, S, P, E>(
    State(service): State<Arc<VisitService<R, S, P, E>>>,
    Path(visit_id): Path<String>,
    axum::Json(body): axum::Json<RescheduleBody>,
) -> Response
where
    R: VisitRepository + 'static,
    S: SiteProvider + 'static,
    P: EvidencePolicySource + 'static,
    E: EventSink + 'static,
{
    match service.reschedule(&VisitId(visit_id), body.new_date, body.reason.as_deref()) {
        Ok(view) => (StatusCode::OK, axum::Json(view)).into_response(),
        Err(error) => error_response(error),
    }
}

fn error_response(error: VisitServiceError) -> Response {
    match error {
        VisitServiceError::Visit(error) => {
            let payload = json!({
                "error": error.to_string(),
                "code": error.code(),
            });
            (StatusCode::UNPROCESSABLE_ENTITY, axum::Json(payload)).into_response()
        }
        VisitServiceError::Repository(RepositoryError::NotFound(id)) => {
            let payload = json!({ "error": format!("record not found: {id}") });
            (StatusCode::NOT_FOUND, axum::Json(payload)).into_response()
        }
        VisitServiceError::Repository(RepositoryError::Conflict(id)) => {
            let payload = json!({ "error": format!("record already exists: {id}") });
            (StatusCode::CONFLICT, axum::Json(payload)).into_response()
        }
        other => {
            let payload = json!({ "error": other.to_string() });
            (StatusCode::INTERNAL_SERVER_ERROR, axum::Json(payload)).into_response()
        }
    }
}
