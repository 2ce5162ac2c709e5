use std::sync::atomic::Ordering;
use std::sync::Arc;

use axum::Extension;
use tracing::info;

use fieldops::config::AppConfig;
use fieldops::error::AppError;
use fieldops::telemetry;
use fieldops::workflows::visits::{SystemClock, VisitService};

use crate::cli::ServeArgs;
use crate::infra::{
    InMemoryVisitRepository, LoggingEventSink, NoConfiguredPolicies, StaticSiteDirectory,
};
use crate::routes::{with_visit_routes, AppState};

pub(crate) async fn run(mut args: ServeArgs) -> Result<(), AppError> {
    let mut config = AppConfig::load()?;

    if let Some(host) = args.host.take() {
        config.server.host = host;
    }
    if let Some(port) = args.port.take() {
        config.server.port = port;
    }

    telemetry::init(&config.telemetry)?;

    let readiness_flag = Arc::new(std::sync::atomic::AtomicBool::new(false));
    let app_state = AppState {
        readiness: readiness_flag.clone(),
    };

    let visits = Arc::new(InMemoryVisitRepository::default());
    let sites = Arc::new(StaticSiteDirectory::seeded());
    let policies = Arc::new(NoConfiguredPolicies);
    let events = Arc::new(LoggingEventSink);
    let service = Arc::new(VisitService::new(
        visits,
        sites,
        policies,
        events,
        Arc::new(SystemClock),
    ));

    let app = with_visit_routes(service).layer(Extension(app_state));

    let addr = config.server.socket_addr()?;
    let listener = tokio::net::TcpListener::bind(addr).await?;
    readiness_flag.store(true, Ordering::Release);

    info!(?config.environment, %addr, "visit coordination service ready");

    axum::serve(listener, app).await?;
    Ok(())
}
