use crate::domain::air_quality::PollutantKind;
use crate::domain::forecast::ForecastInputs;
use crate::domain::locale::Language;
use serde::Deserialize;
use std::time::Duration;

#[derive(Debug, Deserialize, Clone)]
pub struct AppConfig {
    pub server: ServerSettings,
    pub upstream: UpstreamSettings,
    pub pipeline: PipelineSettings,
    pub defaults: DefaultInputs,
}

#[derive(Debug, Deserialize, Clone)]
pub struct ServerSettings {
    pub bind_addr: String,
}

#[derive(Debug, Deserialize, Clone)]
pub struct UpstreamSettings {
    pub backend_url: String,
    pub ml_api_url: String,
    pub request_timeout_secs: u64,
}

impl UpstreamSettings {
    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }
}

#[derive(Debug, Deserialize, Clone, PartialEq)]
pub struct PipelineSettings {
    /// Hours of history requested per cycle
    pub history_hours: u32,
    /// Fewest records worth sending to the prediction service
    pub min_history: usize,
    /// Stand-in for a missing or malformed concentration
    pub neutral_density: f64,
}

impl Default for PipelineSettings {
    fn default() -> Self {
        Self {
            history_hours: 72,
            min_history: 49,
            neutral_density: 20.0,
        }
    }
}

#[derive(Debug, Deserialize, Clone)]
pub struct DefaultInputs {
    pub city: String,
    pub language: String,
    pub pollutant: String,
    #[serde(default)]
    pub token: Option<String>,
}

impl DefaultInputs {
    pub fn to_inputs(&self) -> anyhow::Result<ForecastInputs> {
        let pollutant = self
            .pollutant
            .parse::<PollutantKind>()
            .map_err(anyhow::Error::msg)?;

        Ok(ForecastInputs {
            city: self.city.clone(),
            token: self.token.clone(),
            pollutant,
            language: Language::from_code(&self.language),
        })
    }
}

/// Load `config/forecast.*` (optional) over built-in defaults, then apply
/// `AQI_FORECAST__SECTION__KEY` environment overrides.
pub fn load_app_config() -> anyhow::Result<AppConfig> {
    load_from(config::File::with_name("config/forecast").required(false))
}

fn load_from<S>(file: S) -> anyhow::Result<AppConfig>
where
    S: config::Source + Send + Sync + 'static,
{
    let defaults = PipelineSettings::default();
    let settings = config::Config::builder()
        .set_default("server.bind_addr", "0.0.0.0:8080")?
        .set_default("upstream.backend_url", "http://localhost:8000")?
        .set_default("upstream.ml_api_url", "http://localhost:8001")?
        .set_default("upstream.request_timeout_secs", 30)?
        .set_default("pipeline.history_hours", defaults.history_hours)?
        .set_default("pipeline.min_history", defaults.min_history as u64)?
        .set_default("pipeline.neutral_density", defaults.neutral_density)?
        .set_default("defaults.city", "Bandung")?
        .set_default("defaults.language", "id")?
        .set_default("defaults.pollutant", "pm25")?
        .add_source(file)
        .add_source(config::Environment::with_prefix("AQI_FORECAST").separator("__"))
        .build()?;

    Ok(settings.try_deserialize()?)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_without_file() {
        let config = load_from(config::File::with_name("config/does-not-exist").required(false)).unwrap();

        assert_eq!(config.server.bind_addr, "0.0.0.0:8080");
        assert_eq!(config.upstream.request_timeout(), Duration::from_secs(30));
        assert_eq!(config.pipeline, PipelineSettings::default());
        assert_eq!(config.defaults.city, "Bandung");
    }

    #[test]
    fn test_file_overrides_defaults() {
        let toml = r#"
            [upstream]
            ml_api_url = "http://ml.internal:9000"
            request_timeout_secs = 5

            [pipeline]
            min_history = 60

            [defaults]
            language = "en"
            pollutant = "pm10"
        "#;
        let config = load_from(config::File::from_str(toml, config::FileFormat::Toml)).unwrap();

        assert_eq!(config.upstream.ml_api_url, "http://ml.internal:9000");
        assert_eq!(config.upstream.backend_url, "http://localhost:8000");
        assert_eq!(config.pipeline.min_history, 60);
        assert_eq!(config.pipeline.history_hours, 72);

        let inputs = config.defaults.to_inputs().unwrap();
        assert_eq!(inputs.pollutant, PollutantKind::Pm10);
        assert_eq!(inputs.language, Language::En);
        assert_eq!(inputs.token, None);
    }

    #[test]
    fn test_unknown_default_pollutant_is_rejected() {
        let defaults = DefaultInputs {
            city: "Bandung".into(),
            language: "id".into(),
            pollutant: "ozone".into(),
            token: None,
        };
        assert!(defaults.to_inputs().is_err());
    }
}
