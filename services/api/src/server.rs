use crate::cli::ServeArgs;
use crate::infra::{AppState, InMemoryJobStore, InMemoryNotificationLedger, StubEmailTransport};
use crate::routes::with_renewal_routes;
use axum::Extension;
use axum_prometheus::PrometheusMetricLayer;
use std::sync::atomic::Ordering;
use std::sync::Arc;
use sweepline::config::AppConfig;
use sweepline::error::AppError;
use sweepline::telemetry;
use sweepline::workflows::renewal::{RenewalScanService, SnapshotCsvImporter};
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

    let store = match args.jobs_csv.take() {
        Some(path) => {
            let jobs = SnapshotCsvImporter::from_path(&path)?;
            info!(jobs = jobs.len(), path = %path.display(), "seeded job store from export");
            Arc::new(InMemoryJobStore::with_jobs(jobs))
        }
        None => Arc::new(InMemoryJobStore::default()),
    };
    let ledger = Arc::new(InMemoryNotificationLedger::default());
    let transport = Arc::new(StubEmailTransport::default());
    let renewal_service = Arc::new(RenewalScanService::new(
        store,
        ledger,
        transport,
        config.renewal.email_from.clone(),
    ));

    let app = with_renewal_routes(renewal_service, config.renewal.cron_secret.clone())
        .layer(Extension(app_state))
        .layer(prometheus_layer);

    let addr = config.server.socket_addr()?;
    let listener = tokio::net::TcpListener::bind(addr).await?;
    readiness_flag.store(true, Ordering::Release);

    info!(?config.environment, %addr, "field-service renewal API ready");

    axum::serve(listener, app).await?;
    Ok(())
}
