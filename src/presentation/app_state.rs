// Application state for HTTP handlers
use crate::application::hourly_service::HourlyForecastService;
use crate::application::prediction_pipeline::ForecastPipeline;
use crate::domain::chart::ChartGeometry;
use crate::domain::forecast::ForecastInputs;
use std::sync::Arc;
use tokio::sync::watch;

pub struct AppState {
    pub pipeline: Arc<ForecastPipeline>,
    pub inputs: watch::Sender<ForecastInputs>,
    pub hourly_service: HourlyForecastService,
    pub forecast_geometry: ChartGeometry,
    pub defaults: ForecastInputs,
}
