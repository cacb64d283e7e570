// Hourly weather service - 24 hour temperature trend
use crate::application::collaborators::{HistoryProvider, UpstreamError};
use crate::domain::chart::{ChartCoordinate, ChartGeometry};
use crate::domain::locale::Language;
use crate::domain::readings::{HourlyRecord, SeriesSample};
use chrono::{DateTime, Duration, Utc};
use serde::Serialize;
use std::sync::Arc;
use thiserror::Error;

const OUTLOOK_HOURS: u32 = 24;
const DISPLAYED_HOURS: usize = 12;

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct HourlyWeather {
    pub timestamp: DateTime<Utc>,
    pub temperature: f64,
    pub precipitation_probability: f64,
    pub wind_speed: f64,
    pub condition: String,
}

impl HourlyWeather {
    fn from_record(record: &HourlyRecord, fallback_time: DateTime<Utc>) -> Self {
        Self {
            timestamp: record.recorded_at().unwrap_or(fallback_time),
            temperature: record.temperature.unwrap_or(0.0),
            precipitation_probability: record.precipitation_probability.unwrap_or(0.0),
            wind_speed: record.wind_speed.unwrap_or(0.0),
            condition: record.weather_main.clone().unwrap_or_else(|| "Cloudy".to_string()),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct HourlyOutlook {
    pub city: String,
    pub hours: Vec<HourlyWeather>,
    pub temperature_chart: Vec<ChartCoordinate>,
}

#[derive(Debug, Clone, PartialEq, Error)]
pub enum HourlyError {
    #[error("HTTP {0}")]
    Status(u16),

    #[error("hourly forecast unavailable: {0}")]
    Unavailable(String),
}

impl HourlyError {
    pub fn user_message(&self, language: Language) -> String {
        match self {
            HourlyError::Status(_) => self.to_string(),
            HourlyError::Unavailable(_) => language.messages().hourly_error.to_string(),
        }
    }
}

impl From<UpstreamError> for HourlyError {
    fn from(e: UpstreamError) -> Self {
        match e {
            UpstreamError::Status { status, .. } => HourlyError::Status(status),
            other => HourlyError::Unavailable(other.to_string()),
        }
    }
}

#[derive(Clone)]
pub struct HourlyForecastService {
    history: Arc<dyn HistoryProvider>,
    geometry: ChartGeometry,
}

impl HourlyForecastService {
    pub fn new(history: Arc<dyn HistoryProvider>) -> Self {
        Self {
            history,
            geometry: ChartGeometry::hourly(),
        }
    }

    pub async fn outlook(&self, city: &str, token: Option<&str>) -> Result<HourlyOutlook, HourlyError> {
        let records = self.history.hourly(city, OUTLOOK_HOURS, token).await?;
        let fetched_at = Utc::now();

        let hours: Vec<HourlyWeather> = records
            .iter()
            .take(DISPLAYED_HOURS)
            .enumerate()
            .map(|(i, r)| HourlyWeather::from_record(r, fetched_at + Duration::hours(i as i64)))
            .collect();

        let series: Vec<SeriesSample> = hours
            .iter()
            .map(|h| SeriesSample::new(h.timestamp, h.temperature))
            .collect();

        tracing::debug!("Hourly outlook for {}: {} of {} hours", city, hours.len(), records.len());

        Ok(HourlyOutlook {
            city: city.to_string(),
            temperature_chart: self.geometry.project(&series),
            hours,
        })
    }
}
