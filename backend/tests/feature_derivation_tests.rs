//! Feature derivation integration tests
//!
//! Covers the temporal-deriver contracts: partial rolling windows, lagged
//! trends, the clamped composite deficit score, and the single-point
//! approximation used at inference time.

use chrono::NaiveDate;
use proptest::prelude::*;

use shared::{
    deficit_score, drop_incomplete_rows, feature_columns, DeficitConfig, FeatureError,
    Observation, SinglePointApproximator, TemporalFeatureDeriver,
};

fn start_date() -> NaiveDate {
    NaiveDate::from_ymd_opt(2024, 3, 1).unwrap()
}

fn observation(day_offset: i64, ndvi: f64, humidity: f64, lst: f64) -> Observation {
    Observation {
        date: start_date() + chrono::Duration::days(day_offset),
        ndvi,
        evi: (ndvi * 0.8).clamp(0.0, 1.0),
        lst,
        tmax: lst - 2.0,
        tmin: lst - 15.0,
        soil_humidity: humidity,
    }
}

// ============================================================================
// Unit Tests
// ============================================================================

#[test]
fn rolling_mean_at_row_zero_equals_raw_value() {
    let deriver = TemporalFeatureDeriver::with_defaults();
    let series: Vec<Observation> = (0..20)
        .map(|i| observation(i, 0.4 + i as f64 * 0.01, 15.0 + i as f64, 28.0))
        .collect();
    let rows = deriver.derive(&series).unwrap();

    for wf in &rows[0].windows {
        assert_eq!(wf.ndvi_promedio, series[0].ndvi);
        assert_eq!(wf.humedad_promedio, series[0].soil_humidity);
        assert_eq!(wf.lst_max, series[0].lst);
        assert_eq!(wf.tmax_promedio, series[0].tmax);
    }
}

#[test]
fn series_shorter_than_window_has_null_trends_everywhere() {
    let deriver = TemporalFeatureDeriver::with_defaults();
    let series: Vec<Observation> = (0..5)
        .map(|i| observation(i, 0.5, 20.0, 30.0))
        .collect();
    let rows = deriver.derive(&series).unwrap();

    for row in &rows {
        for wf in &row.windows {
            assert_eq!(wf.ndvi_tendencia, None);
            assert_eq!(wf.humedad_tendencia, None);
        }
        assert!(!row.is_complete());
    }
    assert!(drop_incomplete_rows(rows).is_empty());
}

#[test]
fn ratio_at_zero_ndvi_uses_epsilon_not_a_division_error() {
    let deriver = TemporalFeatureDeriver::with_defaults();
    let mut obs = observation(0, 0.0, 20.0, 30.0);
    obs.evi = 0.5;
    let rows = deriver.derive(&[obs]).unwrap();
    assert_eq!(rows[0].evi_ndvi_ratio, 0.5 / 0.001);
    assert_eq!(rows[0].evi_ndvi_ratio, 500.0);
}

#[test]
fn deficit_clamp_saturates_at_boundary() {
    let config = DeficitConfig::default();
    let at_zero = observation(0, 0.5, 0.0, 30.0);
    let far_below = observation(0, 0.5, -100.0, 30.0);
    assert_eq!(
        deficit_score(&at_zero, &config),
        deficit_score(&far_below, &config)
    );
}

#[test]
fn single_point_approximation_substitutes_current_values() {
    let obs = Observation {
        date: NaiveDate::from_ymd_opt(2024, 6, 15).unwrap(),
        ndvi: 0.6,
        evi: 0.5,
        lst: 30.0,
        tmax: 28.0,
        tmin: 15.0,
        soil_humidity: 20.0,
    };
    let row = SinglePointApproximator::with_defaults().approximate(&obs);

    assert_eq!(row.window(7).unwrap().ndvi_promedio, 0.6);
    assert_eq!(row.window(14).unwrap().ndvi_promedio, 0.6);
    assert_eq!(row.window(7).unwrap().ndvi_tendencia, Some(0.0));
    assert_eq!(row.window(14).unwrap().ndvi_tendencia, Some(0.0));
    assert_eq!(row.mes, 6);
    assert_eq!(row.dias_desde_inicio, 0);
}

#[test]
fn duplicate_dates_surface_as_typed_error() {
    let deriver = TemporalFeatureDeriver::with_defaults();
    let series = vec![
        observation(0, 0.5, 20.0, 30.0),
        observation(1, 0.5, 20.0, 30.0),
        observation(1, 0.6, 21.0, 31.0),
    ];
    assert!(matches!(
        deriver.derive(&series),
        Err(FeatureError::DuplicateDate { .. })
    ));
}

#[test]
fn feature_vector_follows_the_artifact_column_order() {
    let obs = observation(0, 0.6, 20.0, 30.0);
    let row = SinglePointApproximator::with_defaults().approximate(&obs);
    let columns = feature_columns(&[7, 14]);
    let vector = row.to_vector(&columns).unwrap();

    assert_eq!(columns.len(), 25);
    assert_eq!(vector.len(), 25);
    assert_eq!(vector[0], obs.ndvi);
    assert_eq!(vector[5], obs.soil_humidity);
    assert_eq!(columns[23], "dia_año");
}

// ============================================================================
// Property-Based Tests
// ============================================================================

/// Strategy for bounded vegetation indices
fn ndvi_strategy() -> impl Strategy<Value = f64> {
    -1.0..=1.0f64
}

/// Strategy for arbitrary (even unphysical) humidity values
fn extreme_humidity_strategy() -> impl Strategy<Value = f64> {
    -500.0..=500.0f64
}

/// Strategy for arbitrary surface temperatures
fn extreme_lst_strategy() -> impl Strategy<Value = f64> {
    -200.0..=200.0f64
}

/// Strategy for a well-formed daily series
fn series_strategy(max_len: usize) -> impl Strategy<Value = Vec<Observation>> {
    prop::collection::vec((ndvi_strategy(), 0.0..=35.0f64, 10.0..=45.0f64), 1..max_len).prop_map(
        |values| {
            values
                .into_iter()
                .enumerate()
                .map(|(i, (ndvi, humidity, lst))| observation(i as i64, ndvi, humidity, lst))
                .collect()
        },
    )
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(200))]

    /// Deficit score stays in [0, 1] no matter how extreme the inputs are
    #[test]
    fn prop_deficit_score_bounded(
        ndvi in ndvi_strategy(),
        humidity in extreme_humidity_strategy(),
        lst in extreme_lst_strategy()
    ) {
        let obs = observation(0, ndvi, humidity, lst);
        let score = deficit_score(&obs, &DeficitConfig::default());
        prop_assert!((0.0..=1.0).contains(&score));
    }

    /// Every row's derived deficit is in [0, 1]
    #[test]
    fn prop_derived_rows_have_bounded_deficit(series in series_strategy(40)) {
        let rows = TemporalFeatureDeriver::with_defaults().derive(&series).unwrap();
        for row in rows {
            prop_assert!((0.0..=1.0).contains(&row.deficit_combinado));
        }
    }

    /// Rolling means stay within the min/max of the raw signal
    #[test]
    fn prop_rolling_mean_bounded_by_signal(series in series_strategy(40)) {
        let rows = TemporalFeatureDeriver::with_defaults().derive(&series).unwrap();
        let min = series.iter().map(|o| o.ndvi).fold(f64::MAX, f64::min);
        let max = series.iter().map(|o| o.ndvi).fold(f64::MIN, f64::max);
        for row in rows {
            for wf in &row.windows {
                prop_assert!(wf.ndvi_promedio >= min - 1e-9);
                prop_assert!(wf.ndvi_promedio <= max + 1e-9);
            }
        }
    }

    /// Trend presence depends only on the row index and window size
    #[test]
    fn prop_trend_presence_matches_history_length(series in series_strategy(40)) {
        let rows = TemporalFeatureDeriver::with_defaults().derive(&series).unwrap();
        for (i, row) in rows.iter().enumerate() {
            for wf in &row.windows {
                prop_assert_eq!(wf.ndvi_tendencia.is_some(), i >= wf.window);
            }
        }
    }

    /// Deriving twice yields identical rows (no hidden randomness)
    #[test]
    fn prop_derivation_is_idempotent(series in series_strategy(30)) {
        let deriver = TemporalFeatureDeriver::with_defaults();
        let first = deriver.derive(&series).unwrap();
        let second = deriver.derive(&series).unwrap();
        prop_assert_eq!(first, second);
    }

    /// Single-point approximation always produces a complete schema row
    #[test]
    fn prop_approximation_is_always_complete(
        ndvi in ndvi_strategy(),
        humidity in 0.0..=35.0f64,
        lst in 10.0..=45.0f64
    ) {
        let obs = observation(0, ndvi, humidity, lst);
        let row = SinglePointApproximator::with_defaults().approximate(&obs);
        prop_assert!(row.is_complete());
        let vector = row.to_vector(&feature_columns(&[7, 14]));
        prop_assert!(vector.is_ok());
        prop_assert_eq!(vector.unwrap().len(), 25);
    }
}
