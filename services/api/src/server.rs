use crate::cli::ServeArgs;
use crate::infra::AppState;
use crate::routes::with_certificate_routes;
use axum::Extension;
use axum_prometheus::PrometheusMetricLayer;
use certdesk::certificates::CertificateLookupService;
use certdesk::config::AppConfig;
use certdesk::error::AppError;
use certdesk::store::open_store;
use certdesk::telemetry::{self, TelemetryMode};
use std::sync::atomic::Ordering;
use std::sync::Arc;
use tracing::info;

pub(crate) async fn run(mut args: ServeArgs) -> Result<(), AppError> {
    let mut config = AppConfig::load()?;

    if let Some(host) = args.host.take() {
        config.server.host = host;
    }
    if let Some(port) = args.port.take() {
        config.server.port = port;
    }

    telemetry::init(&config.telemetry, TelemetryMode::Server)?;

    let (prometheus_layer, prometheus_handle) = PrometheusMetricLayer::pair();
    let readiness_flag = Arc::new(std::sync::atomic::AtomicBool::new(false));
    let app_state = AppState {
        readiness: readiness_flag.clone(),
        metrics: Arc::new(prometheus_handle),
    };

    let store = open_store(&config.store.connection_string)?;
    let lookup_service = Arc::new(CertificateLookupService::new(store));

    let app = with_certificate_routes(lookup_service)
        .layer(Extension(app_state))
        .layer(prometheus_layer);

    let addr = config.server.socket_addr()?;
    let listener = tokio::net::TcpListener::bind(addr).await?;
    readiness_flag.store(true, Ordering::Release);

    info!(
        ?config.environment,
        %addr,
        store = %config.store.connection_string,
        "certificate service ready"
    );

    axum::serve(listener, app).await?;
    Ok(())
}
