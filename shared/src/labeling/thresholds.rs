//! Percentile threshold computation
//!
//! Thresholds are computed from the realized distribution of each training
//! table, not from fixed constants: two training runs over different data
//! will, by design, classify identical raw values differently. A threshold
//! set lives only for the labeling pass that computed it and is never
//! persisted or reused.

use serde::Serialize;

use crate::models::FeatureRow;

/// The five distributional cut points used by the labeling rules.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct PercentileThresholds {
    pub p25_humidity: f64,
    pub p50_humidity: f64,
    pub p25_ndvi: f64,
    pub p50_ndvi: f64,
    pub p75_lst: f64,
}

impl PercentileThresholds {
    /// Compute thresholds from a training table's own raw-signal columns.
    ///
    /// Returns `None` for an empty table (the caller rejects that case with
    /// its own error before invoking labeling).
    pub fn from_rows(rows: &[FeatureRow]) -> Option<Self> {
        if rows.is_empty() {
            return None;
        }

        let humidity: Vec<f64> = rows.iter().map(|r| r.observation.soil_humidity).collect();
        let ndvi: Vec<f64> = rows.iter().map(|r| r.observation.ndvi).collect();
        let lst: Vec<f64> = rows.iter().map(|r| r.observation.lst).collect();

        Some(Self {
            p25_humidity: percentile(&humidity, 0.25),
            p50_humidity: percentile(&humidity, 0.50),
            p25_ndvi: percentile(&ndvi, 0.25),
            p50_ndvi: percentile(&ndvi, 0.50),
            p75_lst: percentile(&lst, 0.75),
        })
    }
}

/// Quantile with linear interpolation between order statistics.
///
/// The interpolation is part of the labeling contract: a nearest-rank
/// variant would shift labels on small tables.
///
/// `values` must be non-empty and `q` in [0, 1].
pub fn percentile(values: &[f64], q: f64) -> f64 {
    debug_assert!(!values.is_empty());
    debug_assert!((0.0..=1.0).contains(&q));

    let mut sorted = values.to_vec();
    sorted.sort_by(|a, b| a.partial_cmp(b).expect("percentile input must not contain NaN"));

    let position = (sorted.len() - 1) as f64 * q;
    let lower = position.floor() as usize;
    let fraction = position - lower as f64;

    if fraction == 0.0 || lower + 1 == sorted.len() {
        sorted[lower]
    } else {
        sorted[lower] + fraction * (sorted[lower + 1] - sorted[lower])
    }
}
