// Prediction service client - POST /predict
use crate::application::collaborators::{PredictionProvider, PredictionRequest, UpstreamError};
use crate::domain::readings::PredictionPoint;
use async_trait::async_trait;
use serde::Deserialize;
use serde_json::Value;
use std::time::Duration;

#[derive(Debug, Clone)]
pub struct MlClient {
    base_url: String,
    client: reqwest::Client,
}

#[derive(Debug, Deserialize)]
struct PredictionResponse {
    #[serde(default)]
    predictions: Option<Vec<Value>>,
}

impl MlClient {
    pub fn new(base_url: String, timeout: Duration) -> Result<Self, UpstreamError> {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| UpstreamError::Transport(e.to_string()))?;

        Ok(Self {
            base_url: base_url.trim_end_matches('/').to_string(),
            client,
        })
    }
}

/// Pull a readable `detail` out of an error body. Structured details (such as
/// validation error lists) are returned as their JSON text.
fn extract_detail(body: &str) -> Option<String> {
    let value: Value = serde_json::from_str(body).ok()?;
    match value.get("detail")? {
        Value::Null => None,
        Value::String(s) if s.trim().is_empty() => None,
        Value::String(s) => Some(s.clone()),
        other => Some(other.to_string()),
    }
}

/// A success body without a usable `predictions` array means "nothing to show".
/// Malformed entries are skipped one by one; the well-formed ones are kept.
fn parse_predictions(body: &str) -> Vec<PredictionPoint> {
    let entries = match serde_json::from_str::<PredictionResponse>(body) {
        Ok(parsed) => parsed.predictions.unwrap_or_default(),
        Err(e) => {
            tracing::warn!("Unreadable prediction response, treating as empty: {}", e);
            return Vec::new();
        }
    };

    entries
        .into_iter()
        .enumerate()
        .filter_map(|(i, entry)| match serde_json::from_value::<PredictionPoint>(entry) {
            Ok(point) => Some(point),
            Err(e) => {
                tracing::warn!("Skipping malformed prediction #{}: {}", i, e);
                None
            }
        })
        .collect()
}

#[async_trait]
impl PredictionProvider for MlClient {
    async fn predict(&self, request: &PredictionRequest) -> Result<Vec<PredictionPoint>, UpstreamError> {
        let url = format!("{}/predict", self.base_url);
        tracing::debug!(
            "Sending {} {} samples to {}",
            request.history.len(),
            request.pollutant,
            url
        );

        let response = self
            .client
            .post(&url)
            .json(request)
            .send()
            .await
            .map_err(|e| UpstreamError::Transport(e.to_string()))?;

        let status = response.status();
        let body = response
            .text()
            .await
            .map_err(|e| UpstreamError::Transport(e.to_string()))?;

        if !status.is_success() {
            return Err(UpstreamError::Status {
                status: status.as_u16(),
                detail: extract_detail(&body),
            });
        }

        Ok(parse_predictions(&body))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::air_quality::PollutantKind;
    use crate::domain::readings::PollutantSample;
    use axum::http::StatusCode;
    use axum::routing::post;
    use axum::{Json, Router};
    use chrono::{TimeZone, Utc};
    use serde_json::json;

    async fn serve(router: Router) -> MlClient {
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move { axum::serve(listener, router).await.unwrap() });
        MlClient::new(format!("http://{}", addr), Duration::from_secs(5)).unwrap()
    }

    fn request() -> PredictionRequest {
        PredictionRequest {
            pollutant: PollutantKind::Pm10,
            history: vec![PollutantSample {
                timestamp: Utc.with_ymd_and_hms(2025, 3, 1, 0, 0, 0).unwrap(),
                pm25_density: 20.0,
                pm10_density: 41.0,
            }],
        }
    }

    #[tokio::test]
    async fn test_posts_pollutant_and_history() {
        let client = serve(Router::new().route(
            "/predict",
            post(|Json(body): Json<Value>| async move {
                let pollutant_flag = if body["pollutant"] == "pm10" { 1.0 } else { 0.0 };
                Json(json!({
                    "predictions": [{
                        "timestamp": body["history"][0]["timestamp"],
                        "predicted_aqi": body["history"][0]["pm10_density"],
                        "pm10_density": pollutant_flag
                    }]
                }))
            }),
        ))
        .await;

        let predictions = client.predict(&request()).await.unwrap();

        assert_eq!(predictions.len(), 1);
        assert_eq!(predictions[0].predicted_aqi, 41.0);
        assert_eq!(predictions[0].pm10_density, Some(1.0));
        assert_eq!(predictions[0].timestamp, request().history[0].timestamp);
    }

    #[tokio::test]
    async fn test_missing_predictions_is_empty() {
        let client = serve(Router::new().route("/predict", post(|| async { Json(json!({})) }))).await;
        assert!(client.predict(&request()).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_error_detail_is_extracted() {
        let client = serve(Router::new().route(
            "/predict",
            post(|| async {
                (
                    StatusCode::UNPROCESSABLE_ENTITY,
                    Json(json!({ "detail": "need at least 49 hours" })),
                )
            }),
        ))
        .await;

        let err = client.predict(&request()).await.unwrap_err();
        assert_eq!(
            err,
            UpstreamError::Status {
                status: 422,
                detail: Some("need at least 49 hours".to_string())
            }
        );
    }

    #[tokio::test]
    async fn test_error_without_detail() {
        let client = serve(Router::new().route(
            "/predict",
            post(|| async { (StatusCode::BAD_GATEWAY, "upstream down") }),
        ))
        .await;

        let err = client.predict(&request()).await.unwrap_err();
        assert_eq!(err.detail(), None);
    }

    #[test]
    fn test_extract_detail_variants() {
        assert_eq!(extract_detail(r#"{"detail":"boom"}"#), Some("boom".to_string()));
        assert_eq!(
            extract_detail(r#"{"detail":[{"msg":"field required"}]}"#),
            Some(r#"[{"msg":"field required"}]"#.to_string())
        );
        assert_eq!(extract_detail(r#"{"detail":null}"#), None);
        assert_eq!(extract_detail(r#"{"detail":"  "}"#), None);
        assert_eq!(extract_detail("not json"), None);
    }

    #[test]
    fn test_parse_predictions_tolerates_garbage() {
        assert!(parse_predictions("<html>").is_empty());
        assert!(parse_predictions(r#"{"predictions": null}"#).is_empty());
        assert_eq!(
            parse_predictions(r#"{"predictions":[{"timestamp":"2025-03-01T00:00:00Z","predicted_aqi":55}]}"#)
                .len(),
            1
        );
    }

    #[test]
    fn test_malformed_prediction_keeps_the_rest() {
        let body = json!({
            "predictions": [
                { "timestamp": "2025-03-01T00:00:00Z", "predicted_aqi": 55 },
                { "timestamp": "2025-03-01T01:00:00Z", "predicted_aqi": 60 },
                { "timestamp": "2025-03-01T02:00:00Z", "predicted_aqi": null },
                { "timestamp": "yesterday", "predicted_aqi": 70 },
                "garbage"
            ]
        });

        let predictions = parse_predictions(&body.to_string());

        assert_eq!(predictions.len(), 2);
        assert_eq!(predictions[0].predicted_aqi, 55.0);
        assert_eq!(predictions[1].predicted_aqi, 60.0);
    }

    #[tokio::test]
    async fn test_predict_skips_malformed_entries() {
        let client = serve(Router::new().route(
            "/predict",
            post(|| async {
                Json(json!({
                    "predictions": [
                        { "timestamp": "2025-03-01T00:00:00Z", "predicted_aqi": 42.5 },
                        { "predicted_aqi": 99 }
                    ]
                }))
            }),
        ))
        .await;

        let predictions = client.predict(&request()).await.unwrap();
        assert_eq!(predictions.len(), 1);
        assert_eq!(predictions[0].predicted_aqi, 42.5);
    }
}
