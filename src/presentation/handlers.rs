// HTTP request handlers
use crate::application::prediction_pipeline::update_inputs;
use crate::domain::air_quality::PollutantKind;
use crate::domain::forecast::ForecastInputs;
use crate::domain::locale::Language;
use crate::presentation::app_state::AppState;
use crate::presentation::views::{forecast_view, hover_view, AqiView, ForecastView, HoverView};
use axum::{
    extract::{Query, State},
    http::{header, HeaderMap, StatusCode},
    response::{IntoResponse, Response},
    routing::{get, post, put},
    Json, Router,
};
use serde::Deserialize;
use serde_json::json;
use std::sync::Arc;

#[derive(Deserialize)]
pub struct AqiQuery {
    pub concentration: f64,
    pub pollutant: Option<String>,
    pub lang: Option<String>,
}

#[derive(Deserialize)]
pub struct HoverQuery {
    pub fraction: f64,
}

#[derive(Deserialize)]
pub struct HourlyQuery {
    pub city: Option<String>,
    pub lang: Option<String>,
}

pub fn routes(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/healthz", get(health_check))
        .route("/aqi", get(aqi_index))
        .route("/forecast", get(get_forecast))
        .route("/forecast/inputs", put(put_forecast_inputs))
        .route("/forecast/refresh", post(refresh_forecast))
        .route("/forecast/hover", get(forecast_hover))
        .route("/weather/hourly", get(hourly_weather))
        .with_state(state)
}

/// Health check endpoint
pub async fn health_check() -> &'static str {
    "ok"
}

/// Index and category for one concentration
pub async fn aqi_index(Query(query): Query<AqiQuery>) -> Result<Json<AqiView>, (StatusCode, String)> {
    let pollutant = match query.pollutant.as_deref() {
        Some(raw) => raw
            .parse::<PollutantKind>()
            .map_err(|e| (StatusCode::BAD_REQUEST, e))?,
        None => PollutantKind::default(),
    };
    if !query.concentration.is_finite() || query.concentration < 0.0 {
        return Err((
            StatusCode::BAD_REQUEST,
            "concentration must be a non-negative number".to_string(),
        ));
    }
    let language = query.lang.as_deref().map(Language::from_code).unwrap_or_default();

    Ok(Json(AqiView::new(query.concentration, pollutant, language)))
}

/// Current pipeline state with its chart projection
pub async fn get_forecast(State(state): State<Arc<AppState>>) -> Json<ForecastView> {
    Json(forecast_view(&state.pipeline.snapshot(), &state.forecast_geometry))
}

/// Replace the forecast inputs; a change starts a new cycle
pub async fn put_forecast_inputs(
    State(state): State<Arc<AppState>>,
    Json(inputs): Json<ForecastInputs>,
) -> impl IntoResponse {
    let changed = update_inputs(&state.inputs, inputs);
    tracing::debug!("Forecast inputs updated (changed: {})", changed);
    (StatusCode::ACCEPTED, Json(json!({ "changed": changed })))
}

/// Re-run the current inputs, e.g. after a failed cycle
pub async fn refresh_forecast(State(state): State<Arc<AppState>>) -> StatusCode {
    let inputs = state.inputs.borrow().clone();
    let pipeline = state.pipeline.clone();
    tokio::spawn(async move {
        pipeline.trigger(inputs).await;
    });
    StatusCode::ACCEPTED
}

/// Prediction nearest to a pointer fraction
pub async fn forecast_hover(
    State(state): State<Arc<AppState>>,
    Query(query): Query<HoverQuery>,
) -> Result<Json<HoverView>, StatusCode> {
    hover_view(&state.pipeline.snapshot(), &state.forecast_geometry, query.fraction)
        .map(Json)
        .ok_or(StatusCode::NOT_FOUND)
}

/// 24 hour weather trend
pub async fn hourly_weather(
    State(state): State<Arc<AppState>>,
    Query(query): Query<HourlyQuery>,
    headers: HeaderMap,
) -> Response {
    let city = query.city.unwrap_or_else(|| state.defaults.city.clone());
    let language = query
        .lang
        .as_deref()
        .map(Language::from_code)
        .unwrap_or(state.defaults.language);

    // Forward the caller's bearer token, else use the configured one
    let token = headers
        .get(header::AUTHORIZATION)
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.strip_prefix("Bearer "))
        .map(str::to_string)
        .or_else(|| state.defaults.token.clone());

    match state.hourly_service.outlook(&city, token.as_deref()).await {
        Ok(outlook) => Json(outlook).into_response(),
        Err(e) => {
            tracing::error!("Hourly forecast for {} failed: {}", city, e);
            (
                StatusCode::BAD_GATEWAY,
                Json(json!({ "message": e.user_message(language) })),
            )
                .into_response()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::application::collaborators::{
        HistoryProvider, PredictionProvider, PredictionRequest, UpstreamError,
    };
    use crate::application::hourly_service::HourlyForecastService;
    use crate::application::prediction_pipeline::{spawn_reactive, ForecastPipeline};
    use crate::domain::chart::ChartGeometry;
    use crate::domain::readings::{HourlyRecord, PredictionPoint};
    use crate::infrastructure::config::PipelineSettings;
    use async_trait::async_trait;
    use chrono::{Duration, TimeZone, Utc};
    use serde_json::Value;
    use tokio::sync::watch;

    /// 72 records for any city except "nowhere", which the backend rejects.
    struct StubHistory;

    #[async_trait]
    impl HistoryProvider for StubHistory {
        async fn hourly(
            &self,
            city: &str,
            hours: u32,
            _token: Option<&str>,
        ) -> Result<Vec<HourlyRecord>, UpstreamError> {
            if city == "nowhere" {
                return Err(UpstreamError::Status { status: 404, detail: None });
            }
            let start = Utc.with_ymd_and_hms(2025, 3, 1, 0, 0, 0).unwrap();
            Ok((0..hours)
                .map(|i| HourlyRecord {
                    timestamp: Some(start + Duration::hours(i64::from(i))),
                    pm25_density: Some(25.0),
                    temperature: Some(24.0 + f64::from(i % 5)),
                    ..Default::default()
                })
                .collect())
        }
    }

    struct StubPredictor;

    #[async_trait]
    impl PredictionProvider for StubPredictor {
        async fn predict(&self, request: &PredictionRequest) -> Result<Vec<PredictionPoint>, UpstreamError> {
            Ok(request
                .history
                .iter()
                .take(48)
                .enumerate()
                .map(|(i, s)| PredictionPoint {
                    timestamp: s.timestamp + Duration::hours(72),
                    predicted_aqi: 40.0 + i as f64,
                    pm25_density: None,
                    pm10_density: None,
                })
                .collect())
        }
    }

    fn defaults() -> ForecastInputs {
        ForecastInputs {
            city: "Bandung".into(),
            token: None,
            pollutant: PollutantKind::Pm25,
            language: Language::En,
        }
    }

    async fn serve() -> String {
        let history: Arc<dyn HistoryProvider> = Arc::new(StubHistory);
        let pipeline = Arc::new(ForecastPipeline::new(
            history.clone(),
            Arc::new(StubPredictor),
            PipelineSettings::default(),
        ));
        let (tx, rx) = watch::channel(defaults());
        spawn_reactive(pipeline.clone(), rx);

        let state = Arc::new(AppState {
            pipeline,
            inputs: tx,
            hourly_service: HourlyForecastService::new(history),
            forecast_geometry: ChartGeometry::forecast(),
            defaults: defaults(),
        });

        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move { axum::serve(listener, routes(state)).await.unwrap() });
        format!("http://{}", addr)
    }

    async fn get_json(url: &str) -> (u16, Value) {
        let response = reqwest::get(url).await.unwrap();
        let status = response.status().as_u16();
        (status, response.json().await.unwrap_or(Value::Null))
    }

    async fn wait_for_ready(base: &str, generation: u64) -> Value {
        for _ in 0..400 {
            let (_, body) = get_json(&format!("{}/forecast", base)).await;
            if body["generation"] == generation && body["status"] != "loading" {
                return body;
            }
            tokio::time::sleep(std::time::Duration::from_millis(5)).await;
        }
        panic!("forecast never settled");
    }

    #[tokio::test]
    async fn test_aqi_endpoint() {
        let base = serve().await;

        let (status, body) = get_json(&format!("{}/aqi?concentration=80&pollutant=pm25&lang=en", base)).await;
        assert_eq!(status, 200);
        assert_eq!(body["category"], "unhealthy_sensitive");
        assert_eq!(body["label"], "Unhealthy (Sensitive)");

        let (status, _) = get_json(&format!("{}/aqi?concentration=80&pollutant=so2", base)).await;
        assert_eq!(status, 400);
        let (status, _) = get_json(&format!("{}/aqi?concentration=-1", base)).await;
        assert_eq!(status, 400);
    }

    #[tokio::test]
    async fn test_forecast_flow() {
        let base = serve().await;

        let body = wait_for_ready(&base, 1).await;
        assert_eq!(body["status"], "ready");
        assert_eq!(body["predictions"].as_array().unwrap().len(), 48);
        assert_eq!(body["chart"][0]["x"], 0.0);
        assert_eq!(body["chart"][47]["x"], 100.0);
        assert_eq!(body["summary"]["peak"], 87.0);
        assert_eq!(body["insights"].as_array().unwrap().len(), 6);
        assert_eq!(body["current_reading"]["pm25_density"], 25.0);

        let (status, hover) = get_json(&format!("{}/forecast/hover?fraction=1", base)).await;
        assert_eq!(status, 200);
        assert_eq!(hover["index"], 47);

        let client = reqwest::Client::new();
        let response = client
            .put(format!("{}/forecast/inputs", base))
            .json(&json!({ "city": "nowhere", "pollutant": "pm10", "language": "id" }))
            .send()
            .await
            .unwrap();
        assert_eq!(response.status().as_u16(), 202);

        let body = wait_for_ready(&base, 2).await;
        assert_eq!(body["status"], "error");
        assert_eq!(body["error_kind"], "history_fetch_failed");
        assert_eq!(body["message"], "Gagal memuat prediksi");

        let (status, _) = get_json(&format!("{}/forecast/hover?fraction=0.5", base)).await;
        assert_eq!(status, 404);

        let response = client
            .post(format!("{}/forecast/refresh", base))
            .send()
            .await
            .unwrap();
        assert_eq!(response.status().as_u16(), 202);

        let body = wait_for_ready(&base, 3).await;
        assert_eq!(body["inputs"]["city"], "nowhere");
        assert_eq!(body["error_kind"], "history_fetch_failed");
    }

    #[tokio::test]
    async fn test_hourly_endpoint() {
        let base = serve().await;

        let (status, body) = get_json(&format!("{}/weather/hourly?city=Garut", base)).await;
        assert_eq!(status, 200);
        assert_eq!(body["city"], "Garut");
        assert_eq!(body["hours"].as_array().unwrap().len(), 12);

        let (status, body) = get_json(&format!("{}/weather/hourly?city=nowhere&lang=en", base)).await;
        assert_eq!(status, 502);
        assert_eq!(body["message"], "HTTP 404");
    }
}
