//! HTTP handlers for manual-observation predictions

use axum::{extract::State, Json};
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use validator::Validate;

use crate::error::{AppError, AppResult};
use crate::models::{Observation, StressLevel};
use crate::services::prediction::{AlertLevel, PredictionMetrics, PredictionOutcome};
use crate::services::PredictionService;
use crate::AppState;

/// One raw observation submitted for prediction
#[derive(Debug, Deserialize, Validate)]
pub struct PredictRequest {
    pub date: NaiveDate,
    #[validate(range(min = -1.0, max = 1.0))]
    pub ndvi: f64,
    #[validate(range(min = 0.0, max = 1.0))]
    pub evi: f64,
    pub lst: f64,
    pub tmax: f64,
    pub tmin: f64,
    pub soil_humidity: f64,
}

impl PredictRequest {
    fn into_observation(self) -> Observation {
        Observation {
            date: self.date,
            ndvi: self.ndvi,
            evi: self.evi,
            lst: self.lst,
            tmax: self.tmax,
            tmin: self.tmin,
            soil_humidity: self.soil_humidity,
        }
    }
}

/// Class probabilities by tag
#[derive(Debug, Serialize)]
pub struct ProbabilitySet {
    pub no_stress: f64,
    pub moderate_stress: f64,
    pub severe_stress: f64,
}

/// Prediction response body
#[derive(Debug, Serialize)]
pub struct PredictionResponse {
    pub date: NaiveDate,
    pub prediction: StressLevel,
    pub probabilities: ProbabilitySet,
    pub confidence: f64,
    pub alert_level: AlertLevel,
    pub recommendation: String,
    pub metrics: PredictionMetrics,
}

impl From<PredictionOutcome> for PredictionResponse {
    fn from(outcome: PredictionOutcome) -> Self {
        let [no_stress, moderate_stress, severe_stress] = outcome.probabilities;
        PredictionResponse {
            date: outcome.date,
            prediction: outcome.prediction,
            probabilities: ProbabilitySet {
                no_stress,
                moderate_stress,
                severe_stress,
            },
            confidence: outcome.confidence,
            alert_level: outcome.alert_level,
            recommendation: outcome.recommendation,
            metrics: outcome.metrics,
        }
    }
}

/// Predict the stress level for one manually supplied observation
pub async fn predict(
    State(state): State<AppState>,
    Json(input): Json<PredictRequest>,
) -> AppResult<Json<PredictionResponse>> {
    input
        .validate()
        .map_err(|e| AppError::ValidationError(e.to_string()))?;

    let model = state.current_model().await?;
    let service = PredictionService::new(state.config.features.clone());
    let outcome = service.predict(&model, &input.into_observation())?;

    Ok(Json(outcome.into()))
}
