//! Route definitions for the Crop Stress Monitoring Platform

use axum::{
    routing::{get, post},
    Router,
};

use crate::{handlers, AppState};

/// Create API routes
pub fn api_routes() -> Router<AppState> {
    Router::new()
        // Health check
        .route("/health", get(handlers::health_check))
        // Observation ingestion and retrieval
        .nest("/observations", observation_routes())
        // Model training and inspection
        .nest("/training", training_routes())
        // Manual-observation predictions
        .nest("/predictions", prediction_routes())
        // Coordinate-driven analysis
        .nest("/analysis", analysis_routes())
}

/// Observation management routes
fn observation_routes() -> Router<AppState> {
    Router::new()
        .route("/", get(handlers::list_observations))
        .route("/import", post(handlers::import_observations))
}

/// Training management routes
fn training_routes() -> Router<AppState> {
    Router::new()
        .route(
            "/runs",
            get(handlers::list_training_runs).post(handlers::train_model),
        )
        .route("/model", get(handlers::get_model_info))
}

/// Prediction routes
fn prediction_routes() -> Router<AppState> {
    Router::new().route("/", post(handlers::predict))
}

/// Analysis routes
fn analysis_routes() -> Router<AppState> {
    Router::new().route("/", post(handlers::analyze_field))
}
