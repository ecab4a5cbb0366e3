//! Matches displayed (trip, stop) pairs against live data.
//!
//! The coarse pass classifies schedule delay from the trip-update snapshot;
//! the fine pass fans out per-pair prediction fetches. Failures are isolated
//! per pair and never abort siblings.

use std::sync::Arc;

use tokio::task::JoinSet;

use crate::api::PredictionSource;
use crate::clock;
use crate::models::Crowding;
use crate::store::LiveDataStore;

/// A (trip, stop) pair the presentation layer currently displays.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct PredictionRequest {
    pub trip_id: String,
    pub stop_id: String,
}

impl PredictionRequest {
    pub fn new(trip_id: impl Into<String>, stop_id: impl Into<String>) -> Self {
        Self {
            trip_id: trip_id.into(),
            stop_id: stop_id.into(),
        }
    }
}

/// Classified schedule adherence for one pair.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DelayStatus {
    /// More than five minutes behind schedule
    Delayed(i64),
    /// More than two minutes ahead of schedule
    Early(i64),
    OnTime,
}

impl std::fmt::Display for DelayStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            DelayStatus::Delayed(minutes) => write!(f, "Delayed by {} min", minutes),
            DelayStatus::Early(minutes) => write!(f, "{} min early", minutes),
            DelayStatus::OnTime => f.write_str("On time"),
        }
    }
}

/// Classify a delay in seconds. Thresholds are strict: exactly five minutes
/// late or two minutes early still counts as on time.
pub fn classify_delay(delay_seconds: i64) -> DelayStatus {
    // Half-minute values round toward positive infinity, so -330 s is
    // 5 minutes early, not 6
    let minutes = (delay_seconds as f64 / 60.0 + 0.5).floor() as i64;
    if minutes > 5 {
        DelayStatus::Delayed(minutes)
    } else if minutes < -2 {
        DelayStatus::Early(-minutes)
    } else {
        DelayStatus::OnTime
    }
}

/// Coarse-pass result for one pair.
#[derive(Debug, Clone, PartialEq)]
pub struct DelayReading {
    pub trip_id: String,
    pub stop_id: String,
    pub status: DelayStatus,
}

/// Fine-pass result for one pair, ready for display.
#[derive(Debug, Clone, PartialEq)]
pub struct PredictionView {
    pub trip_id: String,
    pub stop_id: String,
    /// Predicted arrival, `HH:MM`, when the model produced one
    pub predicted_time: Option<String>,
    pub crowding: Crowding,
}

pub struct Reconciler<P> {
    store: Arc<LiveDataStore>,
    predictions: Arc<P>,
}

impl<P: PredictionSource + Send + Sync + 'static> Reconciler<P> {
    pub fn new(store: Arc<LiveDataStore>, predictions: Arc<P>) -> Self {
        Self { store, predictions }
    }

    /// Classify schedule delay for every requested pair against the current
    /// trip-update snapshot.
    ///
    /// Pairs with no matching stop update are omitted so the presentation
    /// layer leaves its prior display untouched rather than clearing it.
    /// Arrival delay is preferred over departure delay; a stop update with
    /// neither counts as on time.
    pub async fn coarse_pass(&self, requests: &[PredictionRequest]) -> Vec<DelayReading> {
        let snapshot = self.store.trip_updates().await;

        let mut readings = Vec::new();
        for request in requests {
            let Some(update) = snapshot
                .iter()
                .find(|t| t.trip_id == request.trip_id)
                .and_then(|t| t.stop_update(&request.stop_id))
            else {
                continue;
            };

            let delay = update
                .arrival_delay
                .or(update.departure_delay)
                .unwrap_or(0);
            readings.push(DelayReading {
                trip_id: request.trip_id.clone(),
                stop_id: request.stop_id.clone(),
                status: classify_delay(delay),
            });
        }
        readings
    }

    /// Fetch fine-grained predictions for every requested pair concurrently.
    ///
    /// Fan-out is per pair; one failed lookup is logged and skipped without
    /// touching its siblings.
    pub async fn fine_pass(&self, requests: &[PredictionRequest]) -> Vec<PredictionView> {
        let mut lookups = JoinSet::new();
        for request in requests.iter().cloned() {
            let predictions = Arc::clone(&self.predictions);
            lookups.spawn(async move {
                let result = predictions
                    .fetch_detailed_prediction(&request.trip_id, &request.stop_id)
                    .await;
                (request, result)
            });
        }

        let mut views = Vec::new();
        while let Some(joined) = lookups.join_next().await {
            let Ok((request, result)) = joined else {
                continue;
            };
            match result {
                Ok(prediction) => {
                    let crowding = prediction.crowding_level();
                    views.push(PredictionView {
                        trip_id: request.trip_id,
                        stop_id: request.stop_id,
                        predicted_time: prediction
                            .predicted_time
                            .as_deref()
                            .map(clock::format_display),
                        crowding,
                    });
                }
                Err(e) => {
                    tracing::warn!(
                        trip_id = %request.trip_id,
                        stop_id = %request.stop_id,
                        error = %e,
                        "Prediction lookup failed, skipping pair"
                    );
                }
            }
        }
        views
    }
}
