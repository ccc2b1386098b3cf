//! Temporal feature derivation over daily observation series

use chrono::{Datelike, NaiveDate};
use thiserror::Error;

use crate::features::config::{DeficitConfig, FeatureConfig};
use crate::models::{FeatureRow, Observation, WindowFeatures};

/// Errors from feature derivation.
///
/// Insufficient rolling history is NOT an error: trend features for early
/// rows come back as `None` and the caller decides what to do with them.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum FeatureError {
    #[error("observation series is empty")]
    EmptySeries,

    /// Two observations share a date. Duplicate dates are a data-quality
    /// problem upstream and are surfaced instead of being silently merged.
    #[error("duplicate observation date: {date}")]
    DuplicateDate { date: NaiveDate },
}

/// Derives rolling-window, pointwise, and calendar features for a series.
///
/// The input series is sorted by date if it arrives unsorted. Rolling means
/// and maxes use a trailing window with a minimum of one row: row 0's rolling
/// statistics equal its own raw values, and shorter-than-window prefixes use
/// however many rows exist. Trends are exact lagged differences and stay
/// `None` until a full `window` of history exists.
///
/// Derivation is pure and deterministic: the same series always produces
/// identical feature rows.
#[derive(Debug, Clone)]
pub struct TemporalFeatureDeriver {
    config: FeatureConfig,
}

impl TemporalFeatureDeriver {
    pub fn new(config: FeatureConfig) -> Self {
        Self { config }
    }

    pub fn with_defaults() -> Self {
        Self::new(FeatureConfig::default())
    }

    pub fn config(&self) -> &FeatureConfig {
        &self.config
    }

    /// Derive one feature row per observation, in date order.
    pub fn derive(&self, series: &[Observation]) -> Result<Vec<FeatureRow>, FeatureError> {
        if series.is_empty() {
            return Err(FeatureError::EmptySeries);
        }

        let mut sorted: Vec<Observation> = series.to_vec();
        sorted.sort_by_key(|o| o.date);
        for pair in sorted.windows(2) {
            if pair[0].date == pair[1].date {
                return Err(FeatureError::DuplicateDate { date: pair[0].date });
            }
        }

        let ndvi: Vec<f64> = sorted.iter().map(|o| o.ndvi).collect();
        let humidity: Vec<f64> = sorted.iter().map(|o| o.soil_humidity).collect();
        let lst: Vec<f64> = sorted.iter().map(|o| o.lst).collect();
        let tmax: Vec<f64> = sorted.iter().map(|o| o.tmax).collect();

        let first_date = sorted[0].date;

        let rows = sorted
            .iter()
            .enumerate()
            .map(|(i, obs)| {
                let windows = self
                    .config
                    .windows
                    .iter()
                    .map(|&w| WindowFeatures {
                        window: w,
                        ndvi_promedio: rolling_mean(&ndvi, i, w),
                        ndvi_tendencia: lag_diff(&ndvi, i, w),
                        humedad_promedio: rolling_mean(&humidity, i, w),
                        humedad_tendencia: lag_diff(&humidity, i, w),
                        lst_max: rolling_max(&lst, i, w),
                        tmax_promedio: rolling_mean(&tmax, i, w),
                    })
                    .collect();

                self.pointwise_row(obs, windows, (obs.date - first_date).num_days())
            })
            .collect();

        Ok(rows)
    }

    /// Assemble a feature row from pointwise-computable parts.
    ///
    /// Shared with the single-point approximator so training and serving
    /// compute ratios, temperatures, the deficit score, and calendar fields
    /// identically.
    pub(crate) fn pointwise_row(
        &self,
        obs: &Observation,
        windows: Vec<WindowFeatures>,
        dias_desde_inicio: i64,
    ) -> FeatureRow {
        FeatureRow {
            observation: *obs,
            windows,
            evi_ndvi_ratio: obs.evi / (obs.ndvi + self.config.ratio_epsilon),
            temp_promedio: (obs.tmax + obs.tmin) / 2.0,
            amplitud_termica: obs.tmax - obs.tmin,
            deficit_combinado: deficit_score(obs, &self.config.deficit),
            mes: obs.date.month(),
            dia_ano: obs.date.ordinal(),
            dias_desde_inicio,
        }
    }
}

/// Composite water-deficit score in [0, 1]; 1 is worst.
///
/// The humidity and temperature terms saturate at the clip bounds, so inputs
/// beyond them contribute no further.
pub fn deficit_score(obs: &Observation, config: &DeficitConfig) -> f64 {
    let humidity_norm = clip(obs.soil_humidity / config.humidity_saturation, 0.0, 1.0);
    let temp_norm = clip((obs.lst - config.lst_baseline) / config.lst_range, 0.0, 1.0);

    let score = (1.0 - humidity_norm) * config.humidity_weight
        + temp_norm * config.temperature_weight
        + (1.0 - obs.ndvi) * config.vegetation_weight;

    clip(score, 0.0, 1.0)
}

/// Keep only rows with complete rolling history.
///
/// Label derivation and training require every windowed feature present;
/// this drops the leading rows whose trends are still `None`.
pub fn drop_incomplete_rows(rows: Vec<FeatureRow>) -> Vec<FeatureRow> {
    rows.into_iter().filter(FeatureRow::is_complete).collect()
}

/// Mean of the trailing window ending at `i` (partial window from row 1).
fn rolling_mean(values: &[f64], i: usize, window: usize) -> f64 {
    let start = (i + 1).saturating_sub(window);
    let slice = &values[start..=i];
    slice.iter().sum::<f64>() / slice.len() as f64
}

/// Max of the trailing window ending at `i` (partial window from row 1).
fn rolling_max(values: &[f64], i: usize, window: usize) -> f64 {
    let start = (i + 1).saturating_sub(window);
    values[start..=i].iter().copied().fold(f64::MIN, f64::max)
}

/// Difference against the value exactly `window` rows earlier.
fn lag_diff(values: &[f64], i: usize, window: usize) -> Option<f64> {
    i.checked_sub(window).map(|j| values[i] - values[j])
}

fn clip(value: f64, lo: f64, hi: f64) -> f64 {
    value.max(lo).min(hi)
}
