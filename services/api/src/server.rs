use crate::cli::ServeArgs;
use crate::infra::{
    AppState, InMemoryRegistrantRepository, JsonFileRegistrantRepository, LoggingNotifier,
};
use crate::routes::with_registration_routes;
use axum::Extension;
use axum_prometheus::PrometheusMetricLayer;
use enrollment::config::AppConfig;
use enrollment::error::AppError;
use enrollment::registration::{EnrollmentLedger, RegistrantRepository, RegistrationService};
use enrollment::telemetry;
use std::sync::atomic::{AtomicBool, Ordering};
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

    telemetry::init(&config.telemetry)?;

    match config.enrollment.ledger_path.clone() {
        Some(path) => {
            let repository = JsonFileRegistrantRepository::open(&path)?;
            info!(path = %path.display(), "ledger snapshot loaded");
            serve(config, Arc::new(repository)).await
        }
        None => serve(config, Arc::new(InMemoryRegistrantRepository::default())).await,
    }
}

async fn serve<R>(config: AppConfig, repository: Arc<R>) -> Result<(), AppError>
where
    R: RegistrantRepository + 'static,
{
    let (prometheus_layer, prometheus_handle) = PrometheusMetricLayer::pair();
    let readiness_flag = Arc::new(AtomicBool::new(false));
    let app_state = AppState {
        readiness: readiness_flag.clone(),
        metrics: Arc::new(prometheus_handle),
    };

    let ledger = EnrollmentLedger::new(repository, config.enrollment.catalog.clone())?;
    let notifier = Arc::new(LoggingNotifier::default());
    let service = Arc::new(RegistrationService::new(Arc::new(ledger), notifier));

    let app = with_registration_routes(service)
        .layer(Extension(app_state))
        .layer(prometheus_layer);

    let addr = config.server.socket_addr()?;
    let listener = tokio::net::TcpListener::bind(addr).await?;
    readiness_flag.store(true, Ordering::Release);

    info!(
        ?config.environment,
        %addr,
        programs = config.enrollment.catalog.programs().count(),
        "enrollment ledger ready"
    );

    axum::serve(listener, app).await?;
    Ok(())
}
