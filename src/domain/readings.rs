// Pollutant readings, predictions and chart series domain models
use chrono::{DateTime, NaiveDateTime, TimeZone, Utc};
use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;

/// A raw hourly record as returned by the weather backend.
///
/// Every field is optional and malformed scalars read as absent, so one bad
/// field never rejects the whole batch.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct HourlyRecord {
    #[serde(default, deserialize_with = "lenient_timestamp", skip_serializing_if = "Option::is_none")]
    pub timestamp: Option<DateTime<Utc>>,
    #[serde(default, deserialize_with = "lenient_timestamp", skip_serializing_if = "Option::is_none")]
    pub datetime: Option<DateTime<Utc>>,
    #[serde(default, deserialize_with = "lenient_f64", skip_serializing_if = "Option::is_none")]
    pub pm25_density: Option<f64>,
    #[serde(default, deserialize_with = "lenient_f64", skip_serializing_if = "Option::is_none")]
    pub pm25: Option<f64>,
    #[serde(default, deserialize_with = "lenient_f64", skip_serializing_if = "Option::is_none")]
    pub pm10_density: Option<f64>,
    #[serde(default, deserialize_with = "lenient_f64", skip_serializing_if = "Option::is_none")]
    pub pm10: Option<f64>,
    #[serde(default, deserialize_with = "lenient_f64", skip_serializing_if = "Option::is_none")]
    pub temperature: Option<f64>,
    #[serde(default, deserialize_with = "lenient_f64", skip_serializing_if = "Option::is_none")]
    pub precipitation_probability: Option<f64>,
    #[serde(default, deserialize_with = "lenient_f64", skip_serializing_if = "Option::is_none")]
    pub wind_speed: Option<f64>,
    #[serde(
        rename = "weather",
        default,
        deserialize_with = "lenient_weather_main",
        skip_serializing_if = "Option::is_none"
    )]
    pub weather_main: Option<String>,
}

impl HourlyRecord {
    pub fn recorded_at(&self) -> Option<DateTime<Utc>> {
        self.timestamp.or(self.datetime)
    }

    pub fn pm25_reading(&self) -> Option<f64> {
        self.pm25_density.or(self.pm25)
    }

    pub fn pm10_reading(&self) -> Option<f64> {
        self.pm10_density.or(self.pm10)
    }
}

/// A historical sample in the shape the prediction service expects.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PollutantSample {
    pub timestamp: DateTime<Utc>,
    pub pm25_density: f64,
    pub pm10_density: f64,
}

/// One forecast step from the prediction service.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PredictionPoint {
    #[serde(deserialize_with = "required_timestamp")]
    pub timestamp: DateTime<Utc>,
    pub predicted_aqi: f64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub pm25_density: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub pm10_density: Option<f64>,
}

/// A value on a time axis, the input of the chart geometry.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct SeriesSample {
    pub timestamp: DateTime<Utc>,
    pub value: f64,
}

impl SeriesSample {
    pub fn new(timestamp: DateTime<Utc>, value: f64) -> Self {
        Self { timestamp, value }
    }
}

impl From<&PredictionPoint> for SeriesSample {
    fn from(point: &PredictionPoint) -> Self {
        Self::new(point.timestamp, point.predicted_aqi)
    }
}

/// Parse the timestamp formats seen from the backends: RFC 3339, naive
/// ISO-8601 (read as UTC) and epoch seconds.
pub fn parse_timestamp(raw: &str) -> Option<DateTime<Utc>> {
    let raw = raw.trim();
    if let Ok(dt) = DateTime::parse_from_rfc3339(raw) {
        return Some(dt.with_timezone(&Utc));
    }
    for format in ["%Y-%m-%dT%H:%M:%S%.f", "%Y-%m-%d %H:%M:%S%.f"] {
        if let Ok(naive) = NaiveDateTime::parse_from_str(raw, format) {
            return Some(Utc.from_utc_datetime(&naive));
        }
    }
    raw.parse::<i64>()
        .ok()
        .and_then(|secs| Utc.timestamp_opt(secs, 0).single())
}

fn timestamp_from_value(value: &Value) -> Option<DateTime<Utc>> {
    match value {
        Value::String(s) => parse_timestamp(s),
        Value::Number(n) => n.as_i64().and_then(|secs| Utc.timestamp_opt(secs, 0).single()),
        _ => None,
    }
}

fn lenient_f64<'de, D>(deserializer: D) -> Result<Option<f64>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Option::<Value>::deserialize(deserializer)?;
    Ok(value
        .and_then(|v| match v {
            Value::Number(n) => n.as_f64(),
            Value::String(s) => s.trim().parse::<f64>().ok(),
            _ => None,
        })
        .filter(|f| f.is_finite()))
}

fn lenient_timestamp<'de, D>(deserializer: D) -> Result<Option<DateTime<Utc>>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Option::<Value>::deserialize(deserializer)?;
    Ok(value.as_ref().and_then(timestamp_from_value))
}

fn required_timestamp<'de, D>(deserializer: D) -> Result<DateTime<Utc>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Value::deserialize(deserializer)?;
    timestamp_from_value(&value)
        .ok_or_else(|| <D::Error as serde::de::Error>::custom(format!("unrecognised timestamp: {}", value)))
}

fn lenient_weather_main<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Option::<Value>::deserialize(deserializer)?;
    Ok(value.and_then(|v| match v {
        Value::Object(map) => map.get("main").and_then(Value::as_str).map(str::to_string),
        _ => None,
    }))
}
