use crate::cli::ServeArgs;
use crate::infra::{
    AppState, InMemoryActivityLog, InMemoryApplicationRepository, InMemoryStoreDirectory,
};
use crate::routes::with_portal_routes;
use axum::Extension;
use axum_prometheus::PrometheusMetricLayer;
use std::sync::atomic::Ordering;
use std::sync::Arc;

use emi_portal::config::AppConfig;
use emi_portal::error::AppError;
use emi_portal::portal::service::PortalService;
use emi_portal::telemetry;
use tracing::info;

pub(crate) async fn run(mut args: ServeArgs) -> Result<(), AppError> {
    let mut config = AppConfig::load()?;

    if let Some(host) = args.host.take() {
        config.server.host = host;
    }
    if let Some(port) = args.port.take() {
        config.server.port = port;
    }

    telemetry::init(&config.telemetry)?;

    let (prometheus_layer, prometheus_handle) = PrometheusMetricLayer::pair();
    let readiness_flag = Arc::new(std::sync::atomic::AtomicBool::new(false));
    let app_state = AppState {
        readiness: readiness_flag.clone(),
        metrics: Arc::new(prometheus_handle),
    };

    let repository = Arc::new(InMemoryApplicationRepository::default());
    let activity_log = Arc::new(InMemoryActivityLog::default());
    let store_directory = Arc::new(InMemoryStoreDirectory::default());
    let portal_service = Arc::new(PortalService::new(
        repository,
        activity_log,
        store_directory,
        config.loan.clone(),
        config.lifecycle,
    ));

    let app = with_portal_routes(portal_service)
        .layer(Extension(app_state))
        .layer(prometheus_layer);

    let addr = config.server.socket_addr()?;
    let listener = tokio::net::TcpListener::bind(addr).await?;
    readiness_flag.store(true, Ordering::Release);

    info!(?config.environment, %addr, "emi portal service ready");

    axum::serve(listener, app).await?;
    Ok(())
}
