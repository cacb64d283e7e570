// Ports for the upstream weather backend and prediction service
use crate::domain::air_quality::PollutantKind;
use crate::domain::readings::{HourlyRecord, PollutantSample, PredictionPoint};
use async_trait::async_trait;
use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Error)]
pub enum UpstreamError {
    /// Connection, DNS or timeout failure.
    #[error("request failed: {0}")]
    Transport(String),

    #[error("upstream responded with status {status}")]
    Status { status: u16, detail: Option<String> },

    #[error("malformed response: {0}")]
    Decode(String),
}

impl UpstreamError {
    pub fn detail(&self) -> Option<&str> {
        match self {
            UpstreamError::Status { detail, .. } => detail.as_deref(),
            _ => None,
        }
    }
}

/// Request body of the prediction service.
#[derive(Debug, Clone, PartialEq, serde::Serialize)]
pub struct PredictionRequest {
    pub pollutant: PollutantKind,
    pub history: Vec<PollutantSample>,
}

#[async_trait]
pub trait HistoryProvider: Send + Sync {
    /// Hourly records for the last `hours` hours, oldest first
    async fn hourly(
        &self,
        city: &str,
        hours: u32,
        token: Option<&str>,
    ) -> Result<Vec<HourlyRecord>, UpstreamError>;
}

#[async_trait]
pub trait PredictionProvider: Send + Sync {
    /// An empty vector is a valid answer
    async fn predict(&self, request: &PredictionRequest) -> Result<Vec<PredictionPoint>, UpstreamError>;
}
