// Forecast domain model: pipeline state, failures and summaries
use crate::domain::air_quality::{classify_category, Category, PollutantKind};
use crate::domain::locale::Language;
use crate::domain::readings::PredictionPoint;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Hour offsets shown as summary cards.
pub const INSIGHT_OFFSETS: [usize; 6] = [0, 6, 12, 24, 36, 48];

/// Everything a forecast cycle depends on. A change to any field re-runs it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ForecastInputs {
    pub city: String,
    #[serde(default, skip_serializing)]
    pub token: Option<String>,
    #[serde(default)]
    pub pollutant: PollutantKind,
    #[serde(default)]
    pub language: Language,
}

#[derive(Debug, Clone, PartialEq, Error)]
pub enum PipelineError {
    #[error("failed to fetch historical data: {0}")]
    HistoryFetchFailed(String),

    #[error("insufficient history: got {got} samples, need at least {required}")]
    InsufficientHistory { got: usize, required: usize },

    #[error("prediction request failed: {}", .detail.as_deref().unwrap_or("prediction service did not respond"))]
    PredictionFetchFailed { detail: Option<String> },
}

impl PipelineError {
    /// Short localized message for display.
    pub fn user_message(&self, language: Language) -> &'static str {
        let messages = language.messages();
        match self {
            PipelineError::InsufficientHistory { .. } => messages.insufficient_history,
            PipelineError::HistoryFetchFailed(_) | PipelineError::PredictionFetchFailed { .. } => {
                messages.prediction_error
            }
        }
    }

    pub fn kind(&self) -> &'static str {
        match self {
            PipelineError::HistoryFetchFailed(_) => "history_fetch_failed",
            PipelineError::InsufficientHistory { .. } => "insufficient_history",
            PipelineError::PredictionFetchFailed { .. } => "prediction_fetch_failed",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Default)]
pub enum PipelineState {
    #[default]
    Idle,
    Loading,
    Error(PipelineError),
    /// May be empty: the service had nothing to predict.
    Ready(Vec<PredictionPoint>),
}

impl PipelineState {
    pub fn status(&self) -> &'static str {
        match self {
            PipelineState::Idle => "idle",
            PipelineState::Loading => "loading",
            PipelineState::Error(_) => "error",
            PipelineState::Ready(_) => "ready",
        }
    }

    pub fn predictions(&self) -> &[PredictionPoint] {
        match self {
            PipelineState::Ready(predictions) => predictions,
            _ => &[],
        }
    }
}

/// Headline numbers of a prediction run.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct ForecastSummary {
    pub current: f64,
    pub average: f64,
    pub peak: f64,
    pub minimum: f64,
}

impl ForecastSummary {
    pub fn from_predictions(predictions: &[PredictionPoint]) -> Option<Self> {
        let first = predictions.first()?;
        let values = predictions.iter().map(|p| p.predicted_aqi);
        let (minimum, peak) = values
            .clone()
            .fold((f64::INFINITY, f64::NEG_INFINITY), |(lo, hi), v| (lo.min(v), hi.max(v)));
        let average = values.sum::<f64>() / predictions.len() as f64;

        Some(Self {
            current: first.predicted_aqi,
            average,
            peak,
            minimum,
        })
    }
}

/// Forecast at a fixed hour offset.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Insight {
    pub hour_offset: usize,
    pub timestamp: DateTime<Utc>,
    pub aqi: f64,
    pub category: Category,
}

/// One insight per [`INSIGHT_OFFSETS`] entry; offsets past the end of the
/// run read the last prediction.
pub fn insights(predictions: &[PredictionPoint]) -> Vec<Insight> {
    let Some(last) = predictions.len().checked_sub(1) else {
        return Vec::new();
    };

    INSIGHT_OFFSETS
        .iter()
        .map(|&hour_offset| {
            let point = &predictions[hour_offset.min(last)];
            Insight {
                hour_offset,
                timestamp: point.timestamp,
                aqi: point.predicted_aqi,
                category: classify_category(point.predicted_aqi),
            }
        })
        .collect()
}
