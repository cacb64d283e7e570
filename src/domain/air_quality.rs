// Air quality index (ISPU) domain model
use crate::domain::locale::Language;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Pollutants the prediction service can forecast.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PollutantKind {
    #[default]
    Pm25,
    Pm10,
}

impl PollutantKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            PollutantKind::Pm25 => "pm25",
            PollutantKind::Pm10 => "pm10",
        }
    }

    pub fn breakpoints(&self) -> &'static [Breakpoint] {
        match self {
            PollutantKind::Pm25 => &PM25_BREAKPOINTS,
            PollutantKind::Pm10 => &PM10_BREAKPOINTS,
        }
    }
}

impl fmt::Display for PollutantKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for PollutantKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "pm25" | "pm2.5" => Ok(PollutantKind::Pm25),
            "pm10" => Ok(PollutantKind::Pm10),
            other => Err(format!("unknown pollutant: {}", other)),
        }
    }
}

/// One band of a breakpoint table.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Breakpoint {
    pub concentration_low: f64,
    pub concentration_high: f64,
    pub index_low: f64,
    pub index_high: f64,
}

const fn band(c_low: f64, c_high: f64, i_low: f64, i_high: f64) -> Breakpoint {
    Breakpoint {
        concentration_low: c_low,
        concentration_high: c_high,
        index_low: i_low,
        index_high: i_high,
    }
}

// PM2.5 in µg/m³
const PM25_BREAKPOINTS: [Breakpoint; 5] = [
    band(0.0, 15.5, 0.0, 50.0),
    band(15.5, 55.4, 50.0, 100.0),
    band(55.4, 150.4, 100.0, 200.0),
    band(150.4, 250.4, 200.0, 300.0),
    band(250.4, 500.0, 300.0, 500.0),
];

// PM10 in µg/m³
const PM10_BREAKPOINTS: [Breakpoint; 5] = [
    band(0.0, 50.0, 0.0, 50.0),
    band(50.0, 150.0, 50.0, 100.0),
    band(150.0, 350.0, 100.0, 200.0),
    band(350.0, 420.0, 200.0, 300.0),
    band(420.0, 10000.0, 300.0, 500.0),
];

/// Convert a pollutant concentration into an index value.
///
/// Concentrations above the last breakpoint clamp to the table's maximum
/// index. Negative or NaN concentrations are treated as zero.
pub fn compute_index(concentration: f64, pollutant: PollutantKind) -> f64 {
    let table = pollutant.breakpoints();
    let c = if concentration.is_nan() { 0.0 } else { concentration.max(0.0) };

    match table
        .iter()
        .find(|b| b.concentration_low <= c && c <= b.concentration_high)
    {
        Some(b) => {
            // Dividing the offsets first keeps both band edges exact.
            let fraction =
                (c - b.concentration_low) / (b.concentration_high - b.concentration_low);
            b.index_low + (b.index_high - b.index_low) * fraction
        }
        None => table
            .iter()
            .map(|b| b.index_high)
            .fold(0.0, f64::max),
    }
}

/// Health category bands, ordered by severity.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Category {
    Good,
    Moderate,
    UnhealthySensitive,
    Unhealthy,
    VeryUnhealthy,
    Hazardous,
}

impl Category {
    /// Severity rank, 0 (good) to 5 (hazardous).
    pub fn severity(&self) -> u8 {
        *self as u8
    }

    /// Palette key used by the front end. Hazardous shares the purple band.
    pub fn color_key(&self) -> &'static str {
        match self {
            Category::Good => "green",
            Category::Moderate => "yellow",
            Category::UnhealthySensitive => "orange",
            Category::Unhealthy => "red",
            Category::VeryUnhealthy | Category::Hazardous => "purple",
        }
    }

    /// Status label. Only Indonesian has its own labels; other languages
    /// read English.
    pub fn label(&self, language: Language) -> &'static str {
        match (language, self) {
            (Language::Id, Category::Good) => "Baik",
            (Language::Id, Category::Moderate) => "Sedang",
            (Language::Id, Category::UnhealthySensitive) => "Tidak Sehat (Sensitif)",
            (Language::Id, Category::Unhealthy) => "Tidak Sehat",
            (Language::Id, Category::VeryUnhealthy) => "Sangat Tidak Sehat",
            (Language::Id, Category::Hazardous) => "Berbahaya",
            (_, Category::Good) => "Good",
            (_, Category::Moderate) => "Moderate",
            (_, Category::UnhealthySensitive) => "Unhealthy (Sensitive)",
            (_, Category::Unhealthy) => "Unhealthy",
            (_, Category::VeryUnhealthy) => "Very Unhealthy",
            (_, Category::Hazardous) => "Hazardous",
        }
    }
}

/// Map an index value to its health category. Upper thresholds are inclusive.
pub fn classify_category(index: f64) -> Category {
    if index <= 50.0 {
        Category::Good
    } else if index <= 100.0 {
        Category::Moderate
    } else if index <= 150.0 {
        Category::UnhealthySensitive
    } else if index <= 200.0 {
        Category::Unhealthy
    } else if index <= 300.0 {
        Category::VeryUnhealthy
    } else {
        Category::Hazardous
    }
}
