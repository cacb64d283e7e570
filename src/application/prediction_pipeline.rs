// Prediction pipeline - History fetch, sufficiency gate and ML prediction
use crate::application::collaborators::{HistoryProvider, PredictionProvider, PredictionRequest};
use crate::domain::forecast::{ForecastInputs, PipelineError, PipelineState};
use crate::domain::readings::{HourlyRecord, PollutantSample, PredictionPoint};
use crate::infrastructure::config::PipelineSettings;
use chrono::{DateTime, Duration, Utc};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use tokio::sync::watch;
use tokio::task::JoinHandle;

/// Generation token of one fetch cycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CycleTicket(u64);

/// What the presentation layer reads.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct ForecastSnapshot {
    pub generation: u64,
    pub inputs: Option<ForecastInputs>,
    pub state: PipelineState,
    /// Last raw record of the latest committed history fetch.
    pub current_reading: Option<HourlyRecord>,
}

struct CycleOutcome {
    current_reading: Option<HourlyRecord>,
    result: Result<Vec<PredictionPoint>, PipelineError>,
}

pub struct ForecastPipeline {
    history: Arc<dyn HistoryProvider>,
    predictor: Arc<dyn PredictionProvider>,
    settings: PipelineSettings,
    snapshot: Mutex<ForecastSnapshot>,
}

impl ForecastPipeline {
    pub fn new(
        history: Arc<dyn HistoryProvider>,
        predictor: Arc<dyn PredictionProvider>,
        settings: PipelineSettings,
    ) -> Self {
        Self {
            history,
            predictor,
            settings,
            snapshot: Mutex::new(ForecastSnapshot::default()),
        }
    }

    pub fn snapshot(&self) -> ForecastSnapshot {
        self.lock().clone()
    }

    /// Start a new cycle: supersedes every cycle started before it.
    pub fn begin(&self, inputs: &ForecastInputs) -> CycleTicket {
        let mut snapshot = self.lock();
        snapshot.generation += 1;
        snapshot.inputs = Some(inputs.clone());
        snapshot.state = PipelineState::Loading;
        tracing::debug!(
            "Forecast cycle {} started for {} ({})",
            snapshot.generation, inputs.city, inputs.pollutant
        );
        CycleTicket(snapshot.generation)
    }

    /// Run a started cycle. Returns whether its result was committed.
    pub async fn run_cycle(&self, ticket: CycleTicket, inputs: ForecastInputs) -> bool {
        let outcome = self.execute(&inputs).await;
        let state = match outcome.result {
            Ok(predictions) => PipelineState::Ready(predictions),
            Err(e) => PipelineState::Error(e),
        };
        self.commit(ticket, state, outcome.current_reading)
    }

    pub async fn trigger(&self, inputs: ForecastInputs) -> bool {
        let ticket = self.begin(&inputs);
        self.run_cycle(ticket, inputs).await
    }

    async fn execute(&self, inputs: &ForecastInputs) -> CycleOutcome {
        let started_at = Utc::now();

        let records = match self
            .history
            .hourly(&inputs.city, self.settings.history_hours, inputs.token.as_deref())
            .await
        {
            Ok(records) => records,
            Err(e) => {
                tracing::error!("History fetch for {} failed: {}", inputs.city, e);
                return CycleOutcome {
                    current_reading: None,
                    result: Err(PipelineError::HistoryFetchFailed(e.to_string())),
                };
            }
        };

        tracing::debug!("Got {} historical records for {}", records.len(), inputs.city);
        let current_reading = records.last().cloned();

        if records.len() < self.settings.min_history {
            tracing::warn!(
                "Not enough history for {}: {} records, need {}",
                inputs.city,
                records.len(),
                self.settings.min_history
            );
            return CycleOutcome {
                current_reading,
                result: Err(PipelineError::InsufficientHistory {
                    got: records.len(),
                    required: self.settings.min_history,
                }),
            };
        }

        let fallback_start = started_at - Duration::hours(i64::from(self.settings.history_hours));
        let request = PredictionRequest {
            pollutant: inputs.pollutant,
            history: to_samples(&records, self.settings.neutral_density, fallback_start),
        };

        let result = match self.predictor.predict(&request).await {
            Ok(mut predictions) => {
                predictions.sort_by_key(|p| p.timestamp);
                tracing::debug!("Received {} predictions", predictions.len());
                Ok(predictions)
            }
            Err(e) => {
                tracing::error!("Prediction for {} failed: {}", inputs.city, e);
                Err(PipelineError::PredictionFetchFailed {
                    detail: e.detail().map(str::to_string),
                })
            }
        };

        CycleOutcome { current_reading, result }
    }

    fn commit(
        &self,
        ticket: CycleTicket,
        state: PipelineState,
        current_reading: Option<HourlyRecord>,
    ) -> bool {
        let mut snapshot = self.lock();
        if snapshot.generation != ticket.0 {
            tracing::warn!(
                "Discarding stale forecast cycle {} (latest is {})",
                ticket.0, snapshot.generation
            );
            return false;
        }

        tracing::info!("Forecast cycle {} finished: {}", ticket.0, state.status());
        snapshot.state = state;
        snapshot.current_reading = current_reading;
        true
    }

    fn lock(&self) -> MutexGuard<'_, ForecastSnapshot> {
        self.snapshot.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

/// Convert raw records into prediction history.
///
/// Missing or malformed concentrations become `neutral_density`. A missing
/// timestamp is one hour after the previous sample, or `fallback_start` for
/// the first record.
pub fn to_samples(
    records: &[HourlyRecord],
    neutral_density: f64,
    fallback_start: DateTime<Utc>,
) -> Vec<PollutantSample> {
    let mut previous: Option<DateTime<Utc>> = None;
    let mut substituted = 0usize;

    let samples: Vec<PollutantSample> = records
        .iter()
        .map(|record| {
            let mut reading = |value: Option<f64>| match value.filter(|v| *v >= 0.0) {
                Some(v) => v,
                None => {
                    substituted += 1;
                    neutral_density
                }
            };
            let pm25_density = reading(record.pm25_reading());
            let pm10_density = reading(record.pm10_reading());

            let timestamp = record.recorded_at().unwrap_or_else(|| {
                substituted += 1;
                previous.map_or(fallback_start, |t| t + Duration::hours(1))
            });
            previous = Some(timestamp);

            PollutantSample {
                timestamp,
                pm25_density,
                pm10_density,
            }
        })
        .collect();

    if substituted > 0 {
        tracing::warn!("Substituted {} missing fields in {} records", substituted, records.len());
    }
    samples
}

/// Replace the inputs, waking subscribers only when something changed.
pub fn update_inputs(sender: &watch::Sender<ForecastInputs>, next: ForecastInputs) -> bool {
    sender.send_if_modified(|current| {
        if *current == next {
            false
        } else {
            *current = next;
            true
        }
    })
}

/// Run a cycle for the current inputs, then again on every change.
pub fn spawn_reactive(
    pipeline: Arc<ForecastPipeline>,
    mut inputs: watch::Receiver<ForecastInputs>,
) -> JoinHandle<()> {
    tokio::spawn(async move {
        loop {
            let current = inputs.borrow_and_update().clone();
            let ticket = pipeline.begin(&current);
            let cycle = pipeline.clone();
            tokio::spawn(async move {
                cycle.run_cycle(ticket, current).await;
            });

            if inputs.changed().await.is_err() {
                tracing::debug!("Forecast inputs closed, stopping subscription");
                break;
            }
        }
    })
}
