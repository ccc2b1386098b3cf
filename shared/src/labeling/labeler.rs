//! Rule-based stress label derivation
//!
//! A data-relative labeling heuristic, not a ground-truth measurement: the
//! contract is deterministic reproducibility given identical input, not
//! agronomic accuracy. Rules compare each row against percentile thresholds
//! computed from the table itself.

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::labeling::thresholds::PercentileThresholds;
use crate::models::{FeatureRow, LabeledFeatureRow, StressLevel};

/// Errors from label derivation.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum LabelError {
    #[error("training table is empty")]
    EmptyTable,

    /// A row with null windowed features reached the labeler. Callers must
    /// drop incomplete rows (see `drop_incomplete_rows`) before this stage.
    #[error("row {index} has incomplete rolling history")]
    IncompleteRow { index: usize },

    /// The labeling rules reference a trend window the rows do not carry.
    #[error("rows carry no rolling window of {window} days")]
    MissingWindow { window: usize },

    /// Fewer than two distinct labels were produced. A single-class table
    /// cannot train a classifier, so the condition is surfaced here instead
    /// of failing deep inside model fitting.
    #[error("insufficient label diversity: {distinct} distinct label(s)")]
    InsufficientLabelDiversity { distinct: usize },
}

/// Thresholds for the labeling rules.
///
/// Percentile points and rule cutoffs are fixed design constants by default;
/// they are configuration so their effect is documented and adjustable, not
/// magic numbers.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct LabelRuleConfig {
    /// Deficit score above which (with dry soil) a row is moderate
    pub moderate_deficit: f64,
    /// Short-window NDVI trend below which (with dry soil) a row is moderate
    pub moderate_ndvi_trend: f64,
    /// Long-window NDVI trend below which (with hot surface) a row is severe
    pub severe_ndvi_trend: f64,
    /// Window whose NDVI trend feeds the moderate rule
    pub short_trend_window: usize,
    /// Window whose NDVI trend feeds the severe rule
    pub long_trend_window: usize,
}

impl Default for LabelRuleConfig {
    fn default() -> Self {
        Self {
            moderate_deficit: 0.4,
            moderate_ndvi_trend: -0.03,
            severe_ndvi_trend: -0.05,
            short_trend_window: 7,
            long_trend_window: 14,
        }
    }
}

/// A labeled training table with the thresholds that produced it.
#[derive(Debug, Clone, PartialEq)]
pub struct LabeledTable {
    pub rows: Vec<LabeledFeatureRow>,
    pub thresholds: PercentileThresholds,
    /// Row counts per ordinal level
    pub distribution: [usize; 3],
}

/// Assigns 3-level ordinal stress labels to complete feature rows.
#[derive(Debug, Clone, Default)]
pub struct StressLabeler {
    config: LabelRuleConfig,
}

impl StressLabeler {
    pub fn new(config: LabelRuleConfig) -> Self {
        Self { config }
    }

    /// Label every row of a training table.
    ///
    /// Rows default to no stress, are promoted to moderate by any moderate
    /// rule, and to severe by any severe rule; severe takes precedence for a
    /// row matching both. Fails if fewer than two distinct labels result.
    pub fn label(&self, rows: &[FeatureRow]) -> Result<LabeledTable, LabelError> {
        let thresholds = PercentileThresholds::from_rows(rows).ok_or(LabelError::EmptyTable)?;

        let mut labeled = Vec::with_capacity(rows.len());
        let mut distribution = [0usize; 3];

        for (index, row) in rows.iter().enumerate() {
            let label = self.label_row(row, &thresholds, index)?;
            distribution[label.level() as usize] += 1;
            labeled.push(LabeledFeatureRow { row: row.clone(), label });
        }

        let distinct = distribution.iter().filter(|&&count| count > 0).count();
        if distinct < 2 {
            return Err(LabelError::InsufficientLabelDiversity { distinct });
        }

        Ok(LabeledTable {
            rows: labeled,
            thresholds,
            distribution,
        })
    }

    fn label_row(
        &self,
        row: &FeatureRow,
        thresholds: &PercentileThresholds,
        index: usize,
    ) -> Result<StressLevel, LabelError> {
        let trend_short = self.ndvi_trend(row, self.config.short_trend_window, index)?;
        let trend_long = self.ndvi_trend(row, self.config.long_trend_window, index)?;

        let obs = &row.observation;
        let dry = obs.soil_humidity < thresholds.p50_humidity;

        let moderate = (dry && obs.ndvi < thresholds.p50_ndvi)
            || (row.deficit_combinado > self.config.moderate_deficit && dry)
            || (trend_short < self.config.moderate_ndvi_trend && dry);

        let severe = obs.soil_humidity < thresholds.p25_humidity
            || (obs.ndvi < thresholds.p25_ndvi && dry)
            || (obs.lst > thresholds.p75_lst && trend_long < self.config.severe_ndvi_trend);

        Ok(if severe {
            StressLevel::SevereStress
        } else if moderate {
            StressLevel::ModerateStress
        } else {
            StressLevel::NoStress
        })
    }

    fn ndvi_trend(&self, row: &FeatureRow, window: usize, index: usize) -> Result<f64, LabelError> {
        let features = row
            .window(window)
            .ok_or(LabelError::MissingWindow { window })?;
        features
            .ndvi_tendencia
            .ok_or(LabelError::IncompleteRow { index })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{Observation, WindowFeatures};
    use chrono::NaiveDate;

    /// Build a complete feature row with explicit rule inputs.
    fn row(
        day: u32,
        humidity: f64,
        ndvi: f64,
        lst: f64,
        deficit: f64,
        trend7: f64,
        trend14: f64,
    ) -> FeatureRow {
        let observation = Observation {
            date: NaiveDate::from_ymd_opt(2024, 5, day).unwrap(),
            ndvi,
            evi: ndvi * 0.8,
            lst,
            tmax: 28.0,
            tmin: 15.0,
            soil_humidity: humidity,
        };
        let window = |w: usize, trend: f64| WindowFeatures {
            window: w,
            ndvi_promedio: ndvi,
            ndvi_tendencia: Some(trend),
            humedad_promedio: humidity,
            humedad_tendencia: Some(0.0),
            lst_max: lst,
            tmax_promedio: 28.0,
        };
        FeatureRow {
            observation,
            windows: vec![window(7, trend7), window(14, trend14)],
            evi_ndvi_ratio: (ndvi * 0.8) / (ndvi + 0.001),
            temp_promedio: 21.5,
            amplitud_termica: 13.0,
            deficit_combinado: deficit,
            mes: 5,
            dia_ano: 120 + day,
            dias_desde_inicio: i64::from(day),
        }
    }

    #[test]
    fn exactly_one_row_below_p25_humidity_is_severe() {
        // humidity [10, 20, 30, 40]: P25 = 17.5, P50 = 25. Only the first
        // row sits below P25. NDVI and LST are uniform so no other severe
        // rule can fire; row 2's deficit makes it moderate via rule (b).
        let rows = vec![
            row(1, 10.0, 0.6, 30.0, 0.3, 0.0, 0.0),
            row(2, 20.0, 0.6, 30.0, 0.5, 0.0, 0.0),
            row(3, 30.0, 0.6, 30.0, 0.2, 0.0, 0.0),
            row(4, 40.0, 0.6, 30.0, 0.2, 0.0, 0.0),
        ];

        let table = StressLabeler::default().label(&rows).unwrap();
        let labels: Vec<StressLevel> = table.rows.iter().map(|r| r.label).collect();
        assert_eq!(
            labels,
            vec![
                StressLevel::SevereStress,
                StressLevel::ModerateStress,
                StressLevel::NoStress,
                StressLevel::NoStress,
            ]
        );
        assert_eq!(table.distribution, [2, 1, 1]);
    }

    #[test]
    fn severe_overrides_moderate() {
        // First row matches moderate rules (dry + low ndvi) AND severe rule
        // (below P25 humidity); severe must win.
        let rows = vec![
            row(1, 5.0, 0.2, 30.0, 0.6, -0.1, 0.0),
            row(2, 20.0, 0.6, 30.0, 0.2, 0.0, 0.0),
            row(3, 30.0, 0.7, 30.0, 0.2, 0.0, 0.0),
            row(4, 40.0, 0.8, 30.0, 0.2, 0.0, 0.0),
        ];
        let table = StressLabeler::default().label(&rows).unwrap();
        assert_eq!(table.rows[0].label, StressLevel::SevereStress);
    }

    #[test]
    fn hot_surface_with_falling_ndvi_is_severe() {
        // Last row: lst above P75 and steep 14d NDVI decline; humidity is
        // high so no other rule fires on it.
        let rows = vec![
            row(1, 10.0, 0.6, 25.0, 0.5, 0.0, 0.0),
            row(2, 25.0, 0.6, 26.0, 0.2, 0.0, 0.0),
            row(3, 30.0, 0.6, 27.0, 0.2, 0.0, 0.0),
            row(4, 40.0, 0.6, 38.0, 0.2, 0.0, -0.08),
        ];
        let table = StressLabeler::default().label(&rows).unwrap();
        assert_eq!(table.rows[3].label, StressLevel::SevereStress);
    }

    #[test]
    fn falling_short_trend_with_dry_soil_is_moderate() {
        let rows = vec![
            row(1, 18.0, 0.8, 30.0, 0.2, -0.04, 0.0),
            row(2, 20.0, 0.7, 30.0, 0.2, -0.04, 0.0),
            row(3, 30.0, 0.6, 30.0, 0.2, 0.0, 0.0),
            row(4, 40.0, 0.5, 30.0, 0.2, 0.0, 0.0),
        ];
        let table = StressLabeler::default().label(&rows).unwrap();
        // row 0 also sits below P25 humidity (19.5), so severe wins there;
        // row 1 (20.0, above P25 but below P50=25) with trend7 -0.04 < -0.03
        // exercises the moderate trend rule on its own.
        assert_eq!(table.rows[0].label, StressLevel::SevereStress);
        assert_eq!(table.rows[1].label, StressLevel::ModerateStress);
        assert_eq!(table.rows[2].label, StressLevel::NoStress);
    }

    #[test]
    fn labels_are_table_relative() {
        // The same observation lands in different classes depending on the
        // company it keeps.
        let target = |day| row(day, 20.0, 0.6, 30.0, 0.2, 0.0, 0.0);

        // Everyone else is much wetter: 20.0 falls below P25 -> severe.
        let wet_table = vec![
            target(1),
            row(2, 32.0, 0.6, 30.0, 0.2, 0.0, 0.0),
            row(3, 34.0, 0.6, 30.0, 0.2, 0.0, 0.0),
            row(4, 36.0, 0.6, 30.0, 0.2, 0.0, 0.0),
        ];
        let wet = StressLabeler::default().label(&wet_table).unwrap();
        assert_eq!(wet.rows[0].label, StressLevel::SevereStress);

        // Everyone else is much drier: 20.0 sits above P50 -> no stress.
        let dry_table = vec![
            target(1),
            row(2, 6.0, 0.6, 30.0, 0.2, 0.0, 0.0),
            row(3, 8.0, 0.6, 30.0, 0.2, 0.0, 0.0),
            row(4, 10.0, 0.6, 30.0, 0.2, 0.0, 0.0),
        ];
        let dry = StressLabeler::default().label(&dry_table).unwrap();
        assert_eq!(dry.rows[0].label, StressLevel::NoStress);

        assert_ne!(wet.thresholds, dry.thresholds);
    }

    #[test]
    fn uniform_table_fails_with_insufficient_diversity() {
        let rows: Vec<FeatureRow> = (1..=5)
            .map(|d| row(d, 25.0, 0.6, 30.0, 0.2, 0.0, 0.0))
            .collect();
        assert_eq!(
            StressLabeler::default().label(&rows),
            Err(LabelError::InsufficientLabelDiversity { distinct: 1 })
        );
    }

    #[test]
    fn empty_table_is_rejected() {
        assert_eq!(
            StressLabeler::default().label(&[]),
            Err(LabelError::EmptyTable)
        );
    }

    #[test]
    fn incomplete_row_is_rejected() {
        let mut bad = row(1, 10.0, 0.6, 30.0, 0.3, 0.0, 0.0);
        bad.windows[1].ndvi_tendencia = None;
        let rows = vec![bad, row(2, 30.0, 0.6, 30.0, 0.2, 0.0, 0.0)];
        assert_eq!(
            StressLabeler::default().label(&rows),
            Err(LabelError::IncompleteRow { index: 0 })
        );
    }

    #[test]
    fn missing_rule_window_is_rejected() {
        let mut narrow = row(1, 10.0, 0.6, 30.0, 0.3, 0.0, 0.0);
        narrow.windows.retain(|w| w.window == 7);
        assert_eq!(
            StressLabeler::default().label(&[narrow]),
            Err(LabelError::MissingWindow { window: 14 })
        );
    }
}
