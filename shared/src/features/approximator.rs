//! Single-point feature approximation for online inference
//!
//! A live prediction request carries one observation and no history, but the
//! trained model expects the full training schema. This module reconstructs a
//! feature row of the same shape by substituting the observation's current
//! values for every rolling aggregate and exactly zero for every trend.
//!
//! Known limitation: trend features are always exactly zero online and never
//! so in training, and rolling means collapse to the current value, so the
//! served feature distribution is biased relative to the training
//! distribution. This is an accepted approximation, not hidden behavior.

use crate::features::config::FeatureConfig;
use crate::features::deriver::TemporalFeatureDeriver;
use crate::models::{FeatureRow, Observation, WindowFeatures};

/// Builds a training-schema feature row from a single observation.
#[derive(Debug, Clone)]
pub struct SinglePointApproximator {
    deriver: TemporalFeatureDeriver,
}

impl SinglePointApproximator {
    pub fn new(config: FeatureConfig) -> Self {
        Self {
            deriver: TemporalFeatureDeriver::new(config),
        }
    }

    pub fn with_defaults() -> Self {
        Self::new(FeatureConfig::default())
    }

    /// Approximate the full feature row for one observation.
    ///
    /// Substitution rules:
    /// - rolling means and maxes take the observation's own current value;
    /// - every trend is 0 (no change known);
    /// - `dias_desde_inicio` is 0 (no series context);
    /// - pointwise and calendar features are computed exactly as in series
    ///   derivation, sharing the same code path.
    pub fn approximate(&self, obs: &Observation) -> FeatureRow {
        let windows = self
            .deriver
            .config()
            .windows
            .iter()
            .map(|&w| WindowFeatures {
                window: w,
                ndvi_promedio: obs.ndvi,
                ndvi_tendencia: Some(0.0),
                humedad_promedio: obs.soil_humidity,
                humedad_tendencia: Some(0.0),
                lst_max: obs.lst,
                tmax_promedio: obs.tmax,
            })
            .collect();

        self.deriver.pointwise_row(obs, windows, 0)
    }
}
