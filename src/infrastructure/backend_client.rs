// Weather backend client - Hourly analytics history
use crate::application::collaborators::{HistoryProvider, UpstreamError};
use crate::domain::readings::HourlyRecord;
use async_trait::async_trait;
use serde::Deserialize;
use std::time::Duration;

#[derive(Debug, Clone)]
pub struct BackendClient {
    base_url: String,
    client: reqwest::Client,
}

#[derive(Debug, Deserialize)]
struct HourlyAnalyticsResponse {
    #[serde(default)]
    data: Option<HourlyAnalyticsData>,
}

#[derive(Debug, Deserialize)]
struct HourlyAnalyticsData {
    #[serde(default)]
    hourly: Option<Vec<HourlyRecord>>,
}

impl BackendClient {
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

    fn build_hourly_url(&self, city: &str, hours: u32) -> String {
        format!(
            "{}/weather/analytics/hourly?city={}&hours={}",
            self.base_url,
            urlencoding::encode(city),
            hours
        )
    }
}

#[async_trait]
impl HistoryProvider for BackendClient {
    async fn hourly(
        &self,
        city: &str,
        hours: u32,
        token: Option<&str>,
    ) -> Result<Vec<HourlyRecord>, UpstreamError> {
        let url = self.build_hourly_url(city, hours);
        tracing::debug!("Fetching hourly history: {}", url);

        let mut request = self.client.get(&url).header("Accept", "application/json");
        if let Some(token) = token {
            request = request.bearer_auth(token);
        }

        let response = request
            .send()
            .await
            .map_err(|e| UpstreamError::Transport(e.to_string()))?;

        if !response.status().is_success() {
            let status = response.status().as_u16();
            let body = response.text().await.unwrap_or_default();
            tracing::warn!("Weather backend returned {}: {}", status, body);
            return Err(UpstreamError::Status { status, detail: None });
        }

        let parsed = response
            .json::<HourlyAnalyticsResponse>()
            .await
            .map_err(|e| UpstreamError::Decode(e.to_string()))?;

        Ok(parsed.data.and_then(|d| d.hourly).unwrap_or_default())
    }
}
