// Domain layer - Pure air quality, chart and forecast models
pub mod air_quality;
pub mod chart;
pub mod forecast;
pub mod locale;
pub mod readings;
