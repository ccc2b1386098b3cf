//! Business logic services for the Crop Stress Monitoring Platform

pub mod dataset;
pub mod prediction;
pub mod training;

pub use dataset::DatasetService;
pub use prediction::PredictionService;
pub use training::TrainingService;
