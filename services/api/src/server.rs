use crate::cli::ServeArgs;
use crate::infra::{build_service, resolve_now, AppState};
use crate::routes::with_onboarding_routes;
use axum::Extension;
use axum_prometheus::PrometheusMetricLayer;
use semaforo::config::AppConfig;
use semaforo::error::AppError;
use semaforo::telemetry;
use semaforo::workflows::onboarding::{OnboardingApi, OperatorDirectory};
use std::sync::atomic::Ordering;
use std::sync::Arc;
use tracing::{info, warn};

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

    let operator_names: Vec<&str> = config
        .access
        .operators
        .iter()
        .map(|operator| operator.username())
        .collect();
    if operator_names.is_empty() {
        warn!("no operators configured (APP_OPERATORS); every API request will be rejected");
    } else {
        info!(operators = ?operator_names, "operator directory loaded");
    }
    let operators = Arc::new(OperatorDirectory::new(config.access.operators.clone()));

    let service = Arc::new(build_service(&config));
    let mut api = OnboardingApi::new(service, operators);
    if let Some(today) = args.today {
        info!(%today, "service clock pinned");
        api = api.with_clock(move || resolve_now(Some(today)));
    }

    let app = with_onboarding_routes(api)
        .layer(Extension(app_state))
        .layer(prometheus_layer);

    let addr = config.server.socket_addr()?;
    let listener = tokio::net::TcpListener::bind(addr).await?;
    readiness_flag.store(true, Ordering::Release);

    info!(
        ?config.environment,
        %addr,
        store = %config.store.path.display(),
        archive = %config.archive.directory.display(),
        "semaforo onboarding service ready"
    );

    axum::serve(listener, app).await?;
    Ok(())
}
