// Languages and short user-facing messages
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Language {
    /// Bahasa Indonesia
    #[default]
    Id,
    En,
    /// Basa Sunda
    Su,
}

impl Language {
    /// Parse a language code; unknown codes fall back to Indonesian.
    pub fn from_code(code: &str) -> Self {
        match code.trim().to_ascii_lowercase().as_str() {
            "en" => Language::En,
            "su" => Language::Su,
            _ => Language::Id,
        }
    }

    pub fn messages(&self) -> &'static Messages {
        match self {
            Language::Id => &ID,
            Language::En => &EN,
            Language::Su => &SU,
        }
    }
}

#[derive(Debug)]
pub struct Messages {
    pub loading: &'static str,
    pub prediction_error: &'static str,
    pub insufficient_history: &'static str,
    pub hourly_error: &'static str,
}

const ID: Messages = Messages {
    loading: "Memproses prediksi ML...",
    prediction_error: "Gagal memuat prediksi",
    insufficient_history: "Data historis tidak mencukupi untuk prediksi",
    hourly_error: "Gagal memuat data",
};

const EN: Messages = Messages {
    loading: "Processing ML prediction...",
    prediction_error: "Failed to load prediction",
    insufficient_history: "Insufficient history for prediction",
    hourly_error: "Failed to load data",
};

const SU: Messages = Messages {
    loading: "Ngolah prediksi ML...",
    prediction_error: "Gagal ngamuat prediksi",
    insufficient_history: "Data historis teu cekap",
    hourly_error: "Gagal ngamuat data",
};
