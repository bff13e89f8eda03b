use crate::cli::ServeArgs;
use crate::infra::{AnonymousIdentity, AppState, RelayStore, TracingAlertSink};
use crate::routes::with_coordination_routes;
use axum::Extension;
use axum_prometheus::PrometheusMetricLayer;
use reliefnet::config::AppConfig;
use reliefnet::error::AppError;
use reliefnet::gateway::{RequestGateway, ShelterGateway};
use reliefnet::profiles::ProfileService;
use reliefnet::requests::LifecycleEngine;
use reliefnet::shelters::seed::{sample_shelters, upload_shelters};
use reliefnet::telemetry;
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

    telemetry::init(&config.telemetry)?;

    let (prometheus_layer, prometheus_handle) = PrometheusMetricLayer::pair();
    let readiness_flag = Arc::new(std::sync::atomic::AtomicBool::new(false));
    let app_state = AppState {
        readiness: readiness_flag.clone(),
        metrics: Arc::new(prometheus_handle),
    };

    let store = Arc::new(RelayStore::default());
    let identity = Arc::new(AnonymousIdentity::default());
    let engine = Arc::new(LifecycleEngine::new(
        store.clone(),
        store.clone(),
        identity.clone(),
        Arc::new(TracingAlertSink),
        config.coordination.clone(),
    ));
    let profiles = Arc::new(ProfileService::new(store.clone(), identity));

    // Fresh in-memory store each start; seed it so the shelter map has data.
    upload_shelters(store.as_ref(), sample_shelters()).await?;

    let request_sub = store.subscribe_requests();
    let shelter_sub = store.subscribe_shelters();
    let ingest_engine = engine.clone();
    tokio::spawn(async move {
        ingest_engine.run_ingest_loop(request_sub, shelter_sub).await;
    });

    let app = with_coordination_routes(engine, profiles)
        .layer(Extension(app_state))
        .layer(prometheus_layer);

    let addr = config.server.socket_addr()?;
    let listener = tokio::net::TcpListener::bind(addr).await?;
    readiness_flag.store(true, Ordering::Release);

    info!(?config.environment, %addr, "relief coordination service ready");

    axum::serve(listener, app).await?;
    Ok(())
}
