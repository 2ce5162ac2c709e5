use std::sync::atomic::AtomicBool;
use std::sync::Arc;

use axum::http::StatusCode;
use axum::response::IntoResponse;
use axum::{Extension, Json};
use serde_json::json;

use fieldops::workflows::events::EventSink;
use fieldops::workflows::visits::repository::{
    EvidencePolicySource, SiteProvider, VisitRepository,
};
use fieldops::workflows::visits::{visit_router, VisitService};

#[derive(Clone)]
pub(crate) struct AppState {
    pub(crate) readiness: Arc<AtomicBool>,
}

pub(crate) fn with_visit_routes<R, S, P, E>(
    service: Arc<VisitService<R, S, P, E>>,
) -> axum::Router
where
    R: VisitRepository + 'static,
    S: SiteProvider + 'static,
    P: EvidencePolicySource + 'static,
    E: EventSink + 'static,
{
    visit_router(service)
        .route("/health", axum::routing::get(healthcheck))
        .route("/ready", axum::routing::get(readiness_endpoint))
}

pub(crate) async fn healthcheck() -> Json<serde_json::Value> {
    Json(json!({ "status": "ok" }))
}

pub(crate) async fn readiness_endpoint(Extension(state): Extension<AppState>) -> impl IntoResponse {
    let ready = state.readiness.load(std::sync::atomic::Ordering::Relaxed);
    let status = if ready {
        StatusCode::OK
    } else {
        StatusCode::SERVICE_UNAVAILABLE
    };

    let payload = if ready {
        json!({ "status": "ready" })
    } else {
        json!({ "status": "initializing" })
    };

    (status, Json(payload))
}
