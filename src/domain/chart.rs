//! Chart geometry: maps an ordered series onto a 100 x 100 plotting surface.
//!
//! The x-axis is uniform in sample index, so pointer positions resolve to the
//! nearest sample arithmetically. The y-axis is scaled between the series'
//! extrema and drawn downwards from [`BASELINE_Y`].

use crate::domain::readings::SeriesSample;
use serde::Serialize;

/// y of the series minimum.
pub const BASELINE_Y: f64 = 90.0;

/// Plot height used by the 48 h prediction chart.
pub const FORECAST_PLOT_SPAN: f64 = 80.0;

/// Plot height used by the 24 h weather chart.
pub const HOURLY_PLOT_SPAN: f64 = 70.0;

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct ChartCoordinate {
    pub x: f64,
    pub y: f64,
}

/// The sample under a pointer, with where to anchor its tooltip.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct HoverPoint {
    pub index: usize,
    pub coordinate: ChartCoordinate,
    pub sample: SeriesSample,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ChartGeometry {
    plot_span: f64,
}

impl ChartGeometry {
    pub fn new(plot_span: f64) -> Self {
        Self { plot_span }
    }

    pub fn forecast() -> Self {
        Self::new(FORECAST_PLOT_SPAN)
    }

    pub fn hourly() -> Self {
        Self::new(HOURLY_PLOT_SPAN)
    }

    /// Project every sample, preserving order.
    ///
    /// A single sample sits at `x = 0`. A constant series puts every point on
    /// the baseline. An empty series projects to nothing.
    pub fn project(&self, series: &[SeriesSample]) -> Vec<ChartCoordinate> {
        let Some(scale) = ValueScale::of(series) else {
            return Vec::new();
        };

        series
            .iter()
            .enumerate()
            .map(|(i, sample)| self.coordinate(i, series.len(), sample.value, &scale))
            .collect()
    }

    /// Resolve a pointer position over the series.
    pub fn hover(&self, series: &[SeriesSample], pointer_fraction: f64) -> Option<HoverPoint> {
        let index = nearest_sample(series.len(), pointer_fraction)?;
        let scale = ValueScale::of(series)?;
        let sample = series[index];

        Some(HoverPoint {
            index,
            coordinate: self.coordinate(index, series.len(), sample.value, &scale),
            sample,
        })
    }

    fn coordinate(&self, index: usize, len: usize, value: f64, scale: &ValueScale) -> ChartCoordinate {
        let x = if len > 1 {
            index as f64 / (len - 1) as f64 * 100.0
        } else {
            0.0
        };
        let y = BASELINE_Y - (value - scale.min) / scale.range * self.plot_span;
        ChartCoordinate { x, y }
    }
}

/// Index of the sample closest to a horizontal pointer fraction in `[0, 1]`.
///
/// Returns `None` for an empty series. Fractions outside the unit interval
/// clamp to the first or last sample.
pub fn nearest_sample(len: usize, pointer_fraction: f64) -> Option<usize> {
    if len == 0 {
        return None;
    }
    let fraction = if pointer_fraction.is_nan() {
        0.0
    } else {
        pointer_fraction.clamp(0.0, 1.0)
    };
    let index = (fraction * (len - 1) as f64).round() as usize;
    Some(index.min(len - 1))
}

struct ValueScale {
    min: f64,
    range: f64,
}

impl ValueScale {
    fn of(series: &[SeriesSample]) -> Option<Self> {
        if series.is_empty() {
            return None;
        }
        let (min, max) = series.iter().fold((f64::INFINITY, f64::NEG_INFINITY), |(lo, hi), s| {
            (lo.min(s.value), hi.max(s.value))
        });
        let range = if max > min { max - min } else { 1.0 };
        Some(Self { min, range })
    }
}
