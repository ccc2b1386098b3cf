//! Error handling for the Crop Stress Monitoring Platform
//!
//! Provides consistent error responses in English and Spanish

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use chrono::NaiveDate;
use serde::Serialize;
use thiserror::Error;

use shared::{FeatureError, LabelError, SchemaError};

use crate::model::ModelError;

/// Application error types
#[derive(Error, Debug)]
pub enum AppError {
    // Validation errors
    #[error("Validation error: {message}")]
    Validation {
        field: String,
        message: String,
        message_es: String,
    },

    #[error("Validation error: {0}")]
    ValidationError(String),

    #[error("Resource not found: {0}")]
    NotFound(String),

    // Dataset errors
    #[error("Dataset error: {0}")]
    DatasetError(String),

    #[error("Duplicate observation date: {0}")]
    DuplicateDate(NaiveDate),

    #[error("Training table is empty")]
    EmptyTrainingTable,

    #[error("Insufficient label diversity: {distinct} distinct label(s)")]
    InsufficientLabelDiversity { distinct: usize },

    // Model errors
    #[error("No trained model available")]
    ModelNotTrained,

    /// Feature vector columns do not match the trained artifact's list.
    /// Never coerced: a mismatched vector would produce silently wrong
    /// predictions instead of an error.
    #[error("Feature schema mismatch: {0}")]
    SchemaMismatch(String),

    #[error("Model error: {0}")]
    ModelError(String),

    // External service errors
    #[error("Satellite data service unavailable")]
    SatelliteServiceUnavailable,

    #[error("External service error: {0}")]
    ExternalService(String),

    #[error("Configuration error: {0}")]
    Configuration(String),

    // Database errors
    #[error("Database error: {0}")]
    DatabaseError(#[from] sqlx::Error),

    // Internal errors
    #[error("Internal server error: {0}")]
    Internal(String),

    #[error("Internal server error")]
    InternalError(#[from] anyhow::Error),
}

impl From<FeatureError> for AppError {
    fn from(err: FeatureError) -> Self {
        match err {
            FeatureError::EmptySeries => AppError::EmptyTrainingTable,
            FeatureError::DuplicateDate { date } => AppError::DuplicateDate(date),
        }
    }
}

impl From<LabelError> for AppError {
    fn from(err: LabelError) -> Self {
        match err {
            LabelError::EmptyTable => AppError::EmptyTrainingTable,
            LabelError::InsufficientLabelDiversity { distinct } => {
                AppError::InsufficientLabelDiversity { distinct }
            }
            // Incomplete rows reaching the labeler means the caller skipped
            // the null-dropping step; that is a bug, not a user error.
            other => AppError::Internal(other.to_string()),
        }
    }
}

impl From<SchemaError> for AppError {
    fn from(err: SchemaError) -> Self {
        AppError::SchemaMismatch(err.to_string())
    }
}

impl From<ModelError> for AppError {
    fn from(err: ModelError) -> Self {
        match err {
            ModelError::Schema(e) => AppError::SchemaMismatch(e.to_string()),
            other => AppError::ModelError(other.to_string()),
        }
    }
}

/// Error response structure
#[derive(Serialize)]
pub struct ErrorResponse {
    pub error: ErrorDetail,
}

#[derive(Serialize)]
pub struct ErrorDetail {
    pub code: String,
    pub message_en: String,
    pub message_es: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub field: Option<String>,
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, error_detail) = match &self {
            AppError::Validation {
                field,
                message,
                message_es,
            } => (
                StatusCode::BAD_REQUEST,
                ErrorDetail {
                    code: "VALIDATION_ERROR".to_string(),
                    message_en: message.clone(),
                    message_es: message_es.clone(),
                    field: Some(field.clone()),
                },
            ),
            AppError::ValidationError(msg) => (
                StatusCode::BAD_REQUEST,
                ErrorDetail {
                    code: "VALIDATION_ERROR".to_string(),
                    message_en: msg.clone(),
                    message_es: format!("Datos no válidos: {}", msg),
                    field: None,
                },
            ),
            AppError::NotFound(resource) => (
                StatusCode::NOT_FOUND,
                ErrorDetail {
                    code: "NOT_FOUND".to_string(),
                    message_en: format!("{} not found", resource),
                    message_es: format!("No se encontró {}", resource),
                    field: None,
                },
            ),
            AppError::DatasetError(msg) => (
                StatusCode::UNPROCESSABLE_ENTITY,
                ErrorDetail {
                    code: "DATASET_ERROR".to_string(),
                    message_en: msg.clone(),
                    message_es: format!("Error en el conjunto de datos: {}", msg),
                    field: None,
                },
            ),
            AppError::DuplicateDate(date) => (
                StatusCode::UNPROCESSABLE_ENTITY,
                ErrorDetail {
                    code: "DUPLICATE_DATE".to_string(),
                    message_en: format!("Duplicate observation date: {}", date),
                    message_es: format!("Fecha de observación duplicada: {}", date),
                    field: Some("date".to_string()),
                },
            ),
            AppError::EmptyTrainingTable => (
                StatusCode::UNPROCESSABLE_ENTITY,
                ErrorDetail {
                    code: "EMPTY_TRAINING_TABLE".to_string(),
                    message_en: "No observations available for training".to_string(),
                    message_es: "No hay observaciones disponibles para entrenar".to_string(),
                    field: None,
                },
            ),
            AppError::InsufficientLabelDiversity { distinct } => (
                StatusCode::UNPROCESSABLE_ENTITY,
                ErrorDetail {
                    code: "INSUFFICIENT_LABEL_DIVERSITY".to_string(),
                    message_en: format!(
                        "Training data produced only {} distinct stress label(s); at least 2 are required",
                        distinct
                    ),
                    message_es: format!(
                        "Los datos de entrenamiento produjeron solo {} etiqueta(s) distinta(s); se requieren al menos 2",
                        distinct
                    ),
                    field: None,
                },
            ),
            AppError::ModelNotTrained => (
                StatusCode::SERVICE_UNAVAILABLE,
                ErrorDetail {
                    code: "MODEL_NOT_TRAINED".to_string(),
                    message_en: "No trained model is available yet".to_string(),
                    message_es: "Aún no hay un modelo entrenado disponible".to_string(),
                    field: None,
                },
            ),
            AppError::SchemaMismatch(msg) => (
                StatusCode::INTERNAL_SERVER_ERROR,
                ErrorDetail {
                    code: "SCHEMA_MISMATCH".to_string(),
                    message_en: format!("Feature schema mismatch: {}", msg),
                    message_es: format!("Inconsistencia en el esquema de features: {}", msg),
                    field: None,
                },
            ),
            AppError::ModelError(msg) => (
                StatusCode::INTERNAL_SERVER_ERROR,
                ErrorDetail {
                    code: "MODEL_ERROR".to_string(),
                    message_en: format!("Model error: {}", msg),
                    message_es: format!("Error del modelo: {}", msg),
                    field: None,
                },
            ),
            AppError::SatelliteServiceUnavailable => (
                StatusCode::SERVICE_UNAVAILABLE,
                ErrorDetail {
                    code: "SATELLITE_SERVICE_UNAVAILABLE".to_string(),
                    message_en: "Satellite data service is temporarily unavailable".to_string(),
                    message_es: "El servicio de datos satelitales no está disponible temporalmente"
                        .to_string(),
                    field: None,
                },
            ),
            AppError::ExternalService(msg) => (
                StatusCode::BAD_GATEWAY,
                ErrorDetail {
                    code: "EXTERNAL_SERVICE_ERROR".to_string(),
                    message_en: format!("External service error: {}", msg),
                    message_es: format!("Error de servicio externo: {}", msg),
                    field: None,
                },
            ),
            AppError::Configuration(msg) => (
                StatusCode::INTERNAL_SERVER_ERROR,
                ErrorDetail {
                    code: "CONFIGURATION_ERROR".to_string(),
                    message_en: format!("Configuration error: {}", msg),
                    message_es: format!("Error de configuración: {}", msg),
                    field: None,
                },
            ),
            AppError::DatabaseError(_) => (
                StatusCode::INTERNAL_SERVER_ERROR,
                ErrorDetail {
                    code: "DATABASE_ERROR".to_string(),
                    message_en: "A database error occurred".to_string(),
                    message_es: "Ocurrió un error en la base de datos".to_string(),
                    field: None,
                },
            ),
            AppError::Internal(msg) => (
                StatusCode::INTERNAL_SERVER_ERROR,
                ErrorDetail {
                    code: "INTERNAL_ERROR".to_string(),
                    message_en: msg.clone(),
                    message_es: "Error interno del servidor".to_string(),
                    field: None,
                },
            ),
            AppError::InternalError(_) => (
                StatusCode::INTERNAL_SERVER_ERROR,
                ErrorDetail {
                    code: "INTERNAL_ERROR".to_string(),
                    message_en: "An internal server error occurred".to_string(),
                    message_es: "Ocurrió un error interno del servidor".to_string(),
                    field: None,
                },
            ),
        };

        // Log the error for debugging
        tracing::error!("Error: {:?}", self);

        (status, Json(ErrorResponse { error: error_detail })).into_response()
    }
}

/// Result type alias for handlers
pub type AppResult<T> = Result<T, AppError>;
