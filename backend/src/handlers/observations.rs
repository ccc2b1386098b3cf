//! HTTP handlers for observation ingestion and retrieval

use axum::{
    body::Bytes,
    extract::{Query, State},
    Json,
};
use chrono::NaiveDate;
use serde::Deserialize;

use crate::error::AppResult;
use crate::models::Observation;
use crate::services::dataset::CsvImportReport;
use crate::services::DatasetService;
use crate::AppState;

/// Import a raw observation CSV (text/csv request body)
pub async fn import_observations(
    State(state): State<AppState>,
    body: Bytes,
) -> AppResult<Json<CsvImportReport>> {
    let service = DatasetService::new(state.db);
    let report = service.import_csv(&body).await?;
    Ok(Json(report))
}

/// Query parameters for observations by date range
#[derive(Debug, Deserialize)]
pub struct DateRangeQuery {
    pub start_date: NaiveDate,
    pub end_date: NaiveDate,
}

/// Get stored observations for a date range
pub async fn list_observations(
    State(state): State<AppState>,
    Query(query): Query<DateRangeQuery>,
) -> AppResult<Json<Vec<Observation>>> {
    let service = DatasetService::new(state.db);
    let observations = service
        .list_range(query.start_date, query.end_date)
        .await?;
    Ok(Json(observations))
}
