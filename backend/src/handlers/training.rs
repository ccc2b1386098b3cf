//! HTTP handlers for model training and artifact inspection

use axum::{extract::State, Json};
use chrono::{DateTime, Utc};
use serde::Serialize;

use crate::error::AppResult;
use crate::model::{FeatureImportance, TrainingMetrics};
use crate::services::training::{TrainingReport, TrainingRunRecord};
use crate::services::TrainingService;
use crate::AppState;

/// Train a new model from the stored observation series.
///
/// On success the freshly trained model replaces the served one atomically.
pub async fn train_model(State(state): State<AppState>) -> AppResult<Json<TrainingReport>> {
    let service = TrainingService::new(state.db.clone(), state.config.clone());
    let (model, report) = service.train().await?;

    *state.model.write().await = Some(model);
    tracing::info!("Serving newly trained model (run {})", report.run_id);

    Ok(Json(report))
}

/// List past training runs
pub async fn list_training_runs(
    State(state): State<AppState>,
) -> AppResult<Json<Vec<TrainingRunRecord>>> {
    let service = TrainingService::new(state.db.clone(), state.config.clone());
    let runs = service.list_runs().await?;
    Ok(Json(runs))
}

/// Summary of the currently served model
#[derive(Debug, Serialize)]
pub struct ModelInfo {
    pub trained_at: DateTime<Utc>,
    pub n_features: usize,
    pub n_trees: usize,
    pub metrics: TrainingMetrics,
    pub top_features: Vec<FeatureImportance>,
}

/// Describe the currently served model
pub async fn get_model_info(State(state): State<AppState>) -> AppResult<Json<ModelInfo>> {
    let model = state.current_model().await?;
    Ok(Json(ModelInfo {
        trained_at: model.trained_at,
        n_features: model.feature_names.len(),
        n_trees: model.forest.n_trees(),
        metrics: model.metrics.clone(),
        top_features: model.importances.iter().take(10).cloned().collect(),
    }))
}
