// JSON view models built from domain types
use crate::application::prediction_pipeline::ForecastSnapshot;
use crate::domain::air_quality::{classify_category, compute_index, Category, PollutantKind};
use crate::domain::chart::{ChartCoordinate, ChartGeometry, HoverPoint};
use crate::domain::forecast::{insights, ForecastInputs, ForecastSummary, Insight, PipelineState};
use crate::domain::locale::Language;
use crate::domain::readings::{HourlyRecord, PredictionPoint, SeriesSample};
use chrono::{DateTime, Utc};
use serde::Serialize;

#[derive(Debug, Clone, Serialize)]
pub struct CategoryView {
    pub category: Category,
    pub severity: u8,
    pub label: &'static str,
    pub color: &'static str,
}

impl CategoryView {
    pub fn new(category: Category, language: Language) -> Self {
        Self {
            category,
            severity: category.severity(),
            label: category.label(language),
            color: category.color_key(),
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct AqiView {
    pub pollutant: PollutantKind,
    pub concentration: f64,
    pub index: f64,
    #[serde(flatten)]
    pub category: CategoryView,
}

impl AqiView {
    pub fn new(concentration: f64, pollutant: PollutantKind, language: Language) -> Self {
        let index = compute_index(concentration, pollutant);
        Self {
            pollutant,
            concentration,
            index,
            category: CategoryView::new(classify_category(index), language),
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct InsightView {
    pub hour_offset: usize,
    pub timestamp: DateTime<Utc>,
    pub aqi: f64,
    #[serde(flatten)]
    pub category: CategoryView,
}

fn insight_view(insight: Insight, language: Language) -> InsightView {
    InsightView {
        hour_offset: insight.hour_offset,
        timestamp: insight.timestamp,
        aqi: insight.aqi,
        category: CategoryView::new(insight.category, language),
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct ForecastView {
    pub status: &'static str,
    pub generation: u64,
    pub inputs: Option<ForecastInputs>,
    pub message: Option<&'static str>,
    pub error_kind: Option<&'static str>,
    pub detail: Option<String>,
    pub predictions: Vec<PredictionPoint>,
    pub chart: Vec<ChartCoordinate>,
    pub summary: Option<ForecastSummary>,
    pub insights: Vec<InsightView>,
    pub current_reading: Option<HourlyRecord>,
}

pub fn forecast_view(snapshot: &ForecastSnapshot, geometry: &ChartGeometry) -> ForecastView {
    let language = snapshot
        .inputs
        .as_ref()
        .map(|i| i.language)
        .unwrap_or_default();
    let predictions = snapshot.state.predictions();
    let series: Vec<SeriesSample> = predictions.iter().map(SeriesSample::from).collect();

    let (message, error_kind, detail) = match &snapshot.state {
        PipelineState::Loading => (Some(language.messages().loading), None, None),
        PipelineState::Error(e) => (
            Some(e.user_message(language)),
            Some(e.kind()),
            Some(e.to_string()),
        ),
        PipelineState::Idle | PipelineState::Ready(_) => (None, None, None),
    };

    ForecastView {
        status: snapshot.state.status(),
        generation: snapshot.generation,
        inputs: snapshot.inputs.clone(),
        message,
        error_kind,
        detail,
        predictions: predictions.to_vec(),
        chart: geometry.project(&series),
        summary: ForecastSummary::from_predictions(predictions),
        insights: insights(predictions)
            .into_iter()
            .map(|i| insight_view(i, language))
            .collect(),
        current_reading: snapshot.current_reading.clone(),
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct HoverView {
    pub index: usize,
    pub coordinate: ChartCoordinate,
    pub prediction: PredictionPoint,
    #[serde(flatten)]
    pub category: CategoryView,
}

/// Tooltip for the prediction under the pointer, if there are predictions.
pub fn hover_view(
    snapshot: &ForecastSnapshot,
    geometry: &ChartGeometry,
    pointer_fraction: f64,
) -> Option<HoverView> {
    let language = snapshot.inputs.as_ref().map(|i| i.language).unwrap_or_default();
    let predictions = snapshot.state.predictions();
    let series: Vec<SeriesSample> = predictions.iter().map(SeriesSample::from).collect();
    let HoverPoint { index, coordinate, sample } = geometry.hover(&series, pointer_fraction)?;

    Some(HoverView {
        index,
        coordinate,
        prediction: predictions[index].clone(),
        category: CategoryView::new(classify_category(sample.value), language),
    })
}
