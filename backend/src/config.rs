//! Configuration management for the Crop Stress Monitoring Platform
//!
//! Supports hierarchical configuration loading:
//! 1. Default values in code
//! 2. Configuration files (development.toml, production.toml)
//! 3. Environment variable overrides with CSM_ prefix
//!
//! Feature-engineering and labeling constants live here as named
//! configuration; a trained artifact is only valid under the configuration
//! it was trained with.

use config::{ConfigError, Environment, File};
use serde::Deserialize;
use shared::{FeatureConfig, LabelRuleConfig};

/// Main application configuration
#[derive(Debug, Deserialize, Clone)]
pub struct Config {
    /// Current environment (development, production)
    pub environment: String,

    /// Server configuration
    pub server: ServerConfig,

    /// Database configuration
    pub database: DatabaseConfig,

    /// Satellite/weather data provider configuration
    pub satellite: SatelliteConfig,

    /// Classifier training configuration
    pub model: ModelConfig,

    /// Feature derivation constants (windows, epsilon, deficit weights)
    pub features: FeatureConfig,

    /// Stress labeling rule thresholds
    pub labeling: LabelRuleConfig,
}

#[derive(Debug, Deserialize, Clone)]
pub struct ServerConfig {
    /// Server port
    pub port: u16,

    /// Server host
    pub host: String,
}

#[derive(Debug, Deserialize, Clone)]
pub struct DatabaseConfig {
    /// PostgreSQL connection URL
    pub url: String,

    /// Maximum number of connections in the pool
    pub max_connections: u32,

    /// Minimum number of connections in the pool
    pub min_connections: u32,
}

#[derive(Debug, Deserialize, Clone)]
pub struct SatelliteConfig {
    /// NASA POWER daily point endpoint
    pub api_endpoint: String,
}

#[derive(Debug, Deserialize, Clone)]
pub struct ModelConfig {
    /// Path where the trained artifact bundle is persisted
    pub artifact_path: String,

    /// Number of trees in the forest
    pub n_trees: usize,

    /// Maximum tree depth
    pub max_depth: usize,

    /// Minimum samples required to split a node
    pub min_samples_split: usize,

    /// Seed for the train/test shuffle and bootstrap sampling
    pub seed: u64,

    /// Fraction of rows held out for evaluation
    pub test_fraction: f64,
}

impl Config {
    /// Load configuration from files and environment variables
    pub fn load() -> Result<Self, ConfigError> {
        let environment = std::env::var("CSM_ENVIRONMENT").unwrap_or_else(|_| "development".into());

        let config = config::Config::builder()
            // Start with default values
            .set_default("environment", environment.clone())?
            .set_default("server.port", 3000)?
            .set_default("server.host", "0.0.0.0")?
            .set_default("database.max_connections", 10)?
            .set_default("database.min_connections", 2)?
            .set_default(
                "satellite.api_endpoint",
                "https://power.larc.nasa.gov/api/temporal/daily/point",
            )?
            .set_default("model.artifact_path", "models/stress_model.json")?
            .set_default("model.n_trees", 100)?
            .set_default("model.max_depth", 10)?
            .set_default("model.min_samples_split", 10)?
            .set_default("model.seed", 42)?
            .set_default("model.test_fraction", 0.2)?
            // Feature derivation defaults
            .set_default("features.windows", vec![7i64, 14])?
            .set_default("features.ratio_epsilon", 0.001)?
            .set_default("features.deficit.humidity_weight", 0.5)?
            .set_default("features.deficit.temperature_weight", 0.3)?
            .set_default("features.deficit.vegetation_weight", 0.2)?
            .set_default("features.deficit.humidity_saturation", 35.0)?
            .set_default("features.deficit.lst_baseline", 25.0)?
            .set_default("features.deficit.lst_range", 20.0)?
            // Labeling rule defaults
            .set_default("labeling.moderate_deficit", 0.4)?
            .set_default("labeling.moderate_ndvi_trend", -0.03)?
            .set_default("labeling.severe_ndvi_trend", -0.05)?
            .set_default("labeling.short_trend_window", 7)?
            .set_default("labeling.long_trend_window", 14)?
            // Load environment-specific config file
            .add_source(File::with_name(&format!("config/{}", environment)).required(false))
            // Override with environment variables (CSM_ prefix)
            .add_source(
                Environment::with_prefix("CSM")
                    .separator("__")
                    .try_parsing(true),
            )
            .build()?;

        config.try_deserialize()
    }
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            port: 3000,
            host: "0.0.0.0".to_string(),
        }
    }
}
