//! HTTP handlers for coordinate-driven field analysis

use axum::{extract::State, Json};
use chrono::{NaiveDate, Utc};
use rust_decimal::prelude::ToPrimitive;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::error::{AppError, AppResult};
use crate::models::{Observation, StressLevel};
use crate::services::prediction::AlertLevel;
use crate::services::PredictionService;
use crate::AppState;

/// Field coordinates to analyze
#[derive(Debug, Deserialize)]
pub struct AnalyzeRequest {
    pub latitude: Decimal,
    pub longitude: Decimal,
    /// Observation date; defaults to today
    pub date: Option<NaiveDate>,
}

/// Field diagnosis response body
#[derive(Debug, Serialize)]
pub struct AnalysisResponse {
    pub diagnosis: StressLevel,
    /// Probability of the diagnosis, in percent
    pub probability: f64,
    pub alert_level: AlertLevel,
    pub recommendation: String,
    /// The observation resolved from the satellite/weather provider
    pub observation: Observation,
}

/// Resolve satellite data for a coordinate and predict its stress level
pub async fn analyze_field(
    State(state): State<AppState>,
    Json(input): Json<AnalyzeRequest>,
) -> AppResult<Json<AnalysisResponse>> {
    validate_coordinate(input.latitude, "latitude", shared::validate_latitude)?;
    validate_coordinate(input.longitude, "longitude", shared::validate_longitude)?;

    let date = input.date.unwrap_or_else(|| Utc::now().date_naive());

    let observation = state
        .satellite
        .fetch_daily_observation(input.latitude, input.longitude, date)
        .await?;

    let model = state.current_model().await?;
    let service = PredictionService::new(state.config.features.clone());
    let outcome = service.predict(&model, &observation)?;

    Ok(Json(AnalysisResponse {
        diagnosis: outcome.prediction,
        probability: (outcome.confidence * 1000.0).round() / 10.0,
        alert_level: outcome.alert_level,
        recommendation: outcome.recommendation,
        observation,
    }))
}

fn validate_coordinate(
    value: Decimal,
    field: &str,
    check: fn(f64) -> Result<(), &'static str>,
) -> AppResult<()> {
    let as_f64 = value.to_f64().ok_or_else(|| AppError::Validation {
        field: field.to_string(),
        message: format!("{} is not representable as a double", field),
        message_es: format!("{} no es representable como número", field),
    })?;
    check(as_f64).map_err(|message| AppError::Validation {
        field: field.to_string(),
        message: message.to_string(),
        message_es: format!("{} fuera de rango", field),
    })
}
