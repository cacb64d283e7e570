// Main entry point - Dependency injection and server setup
mod application;
mod domain;
mod infrastructure;
mod presentation;

use std::{net::SocketAddr, sync::Arc};
use tokio::sync::watch;
use tower_http::trace::TraceLayer;
use tracing_subscriber::EnvFilter;

use crate::application::collaborators::HistoryProvider;
use crate::application::hourly_service::HourlyForecastService;
use crate::application::prediction_pipeline::{spawn_reactive, ForecastPipeline};
use crate::domain::chart::ChartGeometry;
use crate::infrastructure::backend_client::BackendClient;
use crate::infrastructure::config::load_app_config;
use crate::infrastructure::ml_client::MlClient;
use crate::presentation::app_state::AppState;
use crate::presentation::handlers::routes;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize tracing
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    // Load configuration
    let config = load_app_config()?;
    let defaults = config.defaults.to_inputs()?;
    let timeout = config.upstream.request_timeout();

    // Upstream clients (infrastructure layer)
    let history: Arc<dyn HistoryProvider> =
        Arc::new(BackendClient::new(config.upstream.backend_url.clone(), timeout)?);
    let predictor = Arc::new(MlClient::new(config.upstream.ml_api_url.clone(), timeout)?);

    // Services (application layer)
    let pipeline = Arc::new(ForecastPipeline::new(
        history.clone(),
        predictor,
        config.pipeline.clone(),
    ));
    let hourly_service = HourlyForecastService::new(history);

    // The first cycle runs immediately for the configured defaults
    let (inputs_tx, inputs_rx) = watch::channel(defaults.clone());
    spawn_reactive(pipeline.clone(), inputs_rx);

    let state = Arc::new(AppState {
        pipeline,
        inputs: inputs_tx,
        hourly_service,
        forecast_geometry: ChartGeometry::forecast(),
        defaults,
    });

    // Build router (presentation layer)
    let router = routes(state).layer(TraceLayer::new_for_http());

    // Start server
    let addr: SocketAddr = config.server.bind_addr.parse()?;
    tracing::info!("Starting aqi-forecast service on {}", addr);

    axum::serve(tokio::net::TcpListener::bind(addr).await?, router).await?;

    Ok(())
}
