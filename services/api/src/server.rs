use crate::cli::ServeArgs;
use crate::infra::{AppState, InMemoryLawyerRepository};
use crate::routes::with_roster_routes;
use axum::Extension;
use axum_prometheus::PrometheusMetricLayer;
use lawyer_score::config::AppConfig;
use lawyer_score::error::AppError;
use lawyer_score::roster::{HttpRemoteProcessor, LawyerIngestService};
use lawyer_score::telemetry;
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

    let (prometheus_layer, prometheus_handle) = PrometheusMetricLayer::pair();
    let readiness_flag = Arc::new(AtomicBool::new(false));
    let app_state = AppState {
        readiness: readiness_flag.clone(),
        metrics: Arc::new(prometheus_handle),
    };

    let repository = Arc::new(InMemoryLawyerRepository::default());
    let mut service = LawyerIngestService::from_config(&config.pipeline, repository);
    if let Some(remote) = &config.remote {
        let processor = HttpRemoteProcessor::new(remote)?;
        info!(url = processor.url(), "remote processor enabled");
        service = service.with_remote(Arc::new(processor));
    }

    let app = with_roster_routes(Arc::new(service))
        .layer(Extension(app_state))
        .layer(prometheus_layer);

    let addr = config.server.socket_addr()?;
    let listener = tokio::net::TcpListener::bind(addr).await?;
    readiness_flag.store(true, Ordering::Release);

    info!(
        ?config.environment,
        %addr,
        score_profile = %config.pipeline.score_profile,
        "lawyer scoring service ready"
    );

    axum::serve(listener, app).await?;
    Ok(())
}
