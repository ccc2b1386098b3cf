//! Feature-engineering configuration
//!
//! Every constant the derivation pipeline uses is named here. Changing any
//! of these changes the training schema or the feature values, so a trained
//! artifact is only valid together with the configuration it was trained
//! under.

use serde::{Deserialize, Serialize};

/// Weights and normalization bounds for the composite deficit score.
///
/// The score blends three deficits into one [0, 1] scalar:
/// `humidity_weight * (1 - clip(soil_humidity / humidity_saturation, 0, 1))
///  + temperature_weight * clip((lst - lst_baseline) / lst_range, 0, 1)
///  + vegetation_weight * (1 - ndvi)`, clipped to [0, 1] as a whole.
/// Inputs past the clip bounds saturate: soil humidity above
/// `humidity_saturation` or LST above `lst_baseline + lst_range` move the
/// score no further.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct DeficitConfig {
    /// Weight of the soil-humidity deficit term
    pub humidity_weight: f64,
    /// Weight of the surface-temperature excess term
    pub temperature_weight: f64,
    /// Weight of the vegetation deficit term
    pub vegetation_weight: f64,
    /// Soil humidity at which the humidity term saturates
    pub humidity_saturation: f64,
    /// LST below which the temperature term is zero
    pub lst_baseline: f64,
    /// LST span over which the temperature term ramps from 0 to 1
    pub lst_range: f64,
}

impl Default for DeficitConfig {
    fn default() -> Self {
        Self {
            humidity_weight: 0.5,
            temperature_weight: 0.3,
            vegetation_weight: 0.2,
            humidity_saturation: 35.0,
            lst_baseline: 25.0,
            lst_range: 20.0,
        }
    }
}

/// Configuration for the temporal feature deriver and the single-point
/// approximator.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FeatureConfig {
    /// Rolling window sizes in days, ascending
    pub windows: Vec<usize>,
    /// Epsilon added to NDVI in `evi_ndvi_ratio` to avoid division by zero.
    /// Biases the ratio slightly downward near zero; fixed for numeric
    /// parity with any artifact trained under it.
    pub ratio_epsilon: f64,
    /// Composite deficit score parameters
    pub deficit: DeficitConfig,
}

impl Default for FeatureConfig {
    fn default() -> Self {
        Self {
            windows: vec![7, 14],
            ratio_epsilon: 0.001,
            deficit: DeficitConfig::default(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_constants() {
        let config = FeatureConfig::default();
        assert_eq!(config.windows, vec![7, 14]);
        assert_eq!(config.ratio_epsilon, 0.001);
        assert_eq!(config.deficit.humidity_weight, 0.5);
        assert_eq!(config.deficit.temperature_weight, 0.3);
        assert_eq!(config.deficit.vegetation_weight, 0.2);
        assert_eq!(config.deficit.humidity_saturation, 35.0);
        assert_eq!(config.deficit.lst_baseline, 25.0);
        assert_eq!(config.deficit.lst_range, 20.0);
    }
}
