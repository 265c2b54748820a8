use std::sync::atomic::Ordering;
use std::sync::Arc;

use axum::Extension;
use axum_prometheus::PrometheusMetricLayer;
use guild_recruit::config::AppConfig;
use guild_recruit::error::AppError;
use guild_recruit::storage::MemoryStore;
use guild_recruit::telemetry;
use guild_recruit::workflows::recruitment::Dispatcher;
use tracing::info;

use crate::cli::ServeArgs;
use crate::infra::{AppState, InProcessDirectory, LoggingMessenger};
use crate::routes::with_interaction_routes;

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

    let store = Arc::new(MemoryStore::default());
    let directory = Arc::new(InProcessDirectory);
    let messenger = Arc::new(LoggingMessenger::default());
    let dispatcher = Arc::new(Dispatcher::new(
        store,
        directory,
        messenger,
        config.recruitment.clone(),
    ));

    let app = with_interaction_routes(dispatcher)
        .layer(Extension(app_state))
        .layer(prometheus_layer);

    let addr = config.server.socket_addr()?;
    let listener = tokio::net::TcpListener::bind(addr).await?;
    readiness_flag.store(true, Ordering::Release);

    info!(?config.environment, %addr, "recruitment service ready");

    axum::serve(listener, app).await?;
    Ok(())
}
