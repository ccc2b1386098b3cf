//! Online prediction service
//!
//! Reconstructs the training feature schema from a single observation via
//! the single-point approximator, runs the trained model, and attaches the
//! alert level, irrigation recommendation, and qualitative metrics the API
//! reports alongside the class probabilities.

use chrono::NaiveDate;
use serde::Serialize;

use shared::{
    humidity_status, ndvi_status, validate_observation, FeatureConfig, Observation,
    SinglePointApproximator, StressLevel,
};

use crate::error::{AppError, AppResult};
use crate::model::StressModel;

/// Probability of severe stress above which a moderate prediction shortens
/// the recommended irrigation window.
const SEVERE_PROBABILITY_WATCH: f64 = 0.3;

/// Prediction service for single-observation inference
#[derive(Debug, Clone)]
pub struct PredictionService {
    approximator: SinglePointApproximator,
}

/// Alert level reported with each prediction
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum AlertLevel {
    Optimal,
    WaterAlert,
    Critical,
}

impl From<StressLevel> for AlertLevel {
    fn from(level: StressLevel) -> Self {
        match level {
            StressLevel::NoStress => AlertLevel::Optimal,
            StressLevel::ModerateStress => AlertLevel::WaterAlert,
            StressLevel::SevereStress => AlertLevel::Critical,
        }
    }
}

/// Auxiliary metrics reported with each prediction
#[derive(Debug, Clone, Serialize)]
pub struct PredictionMetrics {
    pub ndvi: f64,
    pub soil_humidity: f64,
    pub lst: f64,
    pub deficit_combinado: f64,
    pub humidity_status: &'static str,
    pub ndvi_status: &'static str,
}

/// Complete outcome of one prediction
#[derive(Debug, Clone, Serialize)]
pub struct PredictionOutcome {
    pub date: NaiveDate,
    pub prediction: StressLevel,
    /// Probabilities indexed by ordinal level
    pub probabilities: [f64; 3],
    pub confidence: f64,
    pub alert_level: AlertLevel,
    pub recommendation: String,
    pub metrics: PredictionMetrics,
}

impl PredictionService {
    pub fn new(config: FeatureConfig) -> Self {
        Self {
            approximator: SinglePointApproximator::new(config),
        }
    }

    /// Predict the stress level for one observation.
    pub fn predict(&self, model: &StressModel, obs: &Observation) -> AppResult<PredictionOutcome> {
        validate_observation(obs).map_err(|msg| AppError::ValidationError(msg.to_string()))?;

        let row = self.approximator.approximate(obs);
        let prediction = model.predict(&row)?;

        let p_severe = prediction.probabilities[StressLevel::SevereStress.level() as usize];

        Ok(PredictionOutcome {
            date: obs.date,
            prediction: prediction.level,
            probabilities: prediction.probabilities,
            confidence: prediction.confidence,
            alert_level: AlertLevel::from(prediction.level),
            recommendation: irrigation_recommendation(prediction.level, p_severe),
            metrics: PredictionMetrics {
                ndvi: obs.ndvi,
                soil_humidity: obs.soil_humidity,
                lst: obs.lst,
                deficit_combinado: row.deficit_combinado,
                humidity_status: humidity_status(obs.soil_humidity),
                ndvi_status: ndvi_status(obs.ndvi),
            },
        })
    }
}

/// Irrigation recommendation text for a predicted level.
fn irrigation_recommendation(level: StressLevel, p_severe: f64) -> String {
    match level {
        StressLevel::SevereStress => {
            "Apply irrigation immediately: 25-30 mm | Optimal window: 5-7 am or 6-8 pm".to_string()
        }
        StressLevel::ModerateStress => {
            let days = if p_severe > SEVERE_PROBABILITY_WATCH { 3 } else { 5 };
            format!(
                "Schedule irrigation within {} days | Monitor every 2 days",
                days
            )
        }
        StressLevel::NoStress => "Optimal conditions | Routine weekly monitoring".to_string(),
    }
}
