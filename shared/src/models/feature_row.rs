//! Engineered feature rows and the training-schema column contract

use serde::{Deserialize, Serialize};

use crate::models::{Observation, StressLevel};

/// Rolling statistics for one window size over one observation's trailing
/// history.
///
/// Trends are `None` for the first `window` rows of a series: no row exists
/// exactly `window` days back, and the gap is never back-filled.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct WindowFeatures {
    /// Window size in rows (daily series: days)
    pub window: usize,
    pub ndvi_promedio: f64,
    pub ndvi_tendencia: Option<f64>,
    pub humedad_promedio: f64,
    pub humedad_tendencia: Option<f64>,
    pub lst_max: f64,
    pub tmax_promedio: f64,
}

/// One observation plus every derived feature the training schema carries.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FeatureRow {
    pub observation: Observation,
    /// Rolling features, one entry per configured window, ascending
    pub windows: Vec<WindowFeatures>,
    pub evi_ndvi_ratio: f64,
    pub temp_promedio: f64,
    pub amplitud_termica: f64,
    pub deficit_combinado: f64,
    pub mes: u32,
    #[serde(rename = "dia_año")]
    pub dia_ano: u32,
    pub dias_desde_inicio: i64,
}

/// A feature row with its derived training label.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LabeledFeatureRow {
    pub row: FeatureRow,
    pub label: StressLevel,
}

/// Mismatch between a feature row and an expected column schema.
///
/// At inference time this is fatal: a trained model consuming a vector whose
/// columns do not match its stored list would silently produce wrong
/// predictions, so the mismatch must surface as an error instead.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum SchemaError {
    #[error("unknown feature column: {0}")]
    UnknownColumn(String),
    #[error("feature column {0} has no value (insufficient rolling history)")]
    MissingValue(String),
}

/// The canonical ordered feature-name list for a window set.
///
/// This ordering is the contract consumed by the trained classifier artifact;
/// for the default windows {7, 14} it yields exactly the 25-column training
/// schema, ending with `mes`, `dia_año`, `dias_desde_inicio`.
pub fn feature_columns(windows: &[usize]) -> Vec<String> {
    let mut columns: Vec<String> = Observation::RAW_COLUMNS
        .iter()
        .map(|c| c.to_string())
        .collect();

    for w in windows {
        columns.push(format!("ndvi_promedio_{w}d"));
        columns.push(format!("ndvi_tendencia_{w}d"));
    }
    for w in windows {
        columns.push(format!("humedad_promedio_{w}d"));
        columns.push(format!("humedad_tendencia_{w}d"));
    }
    for w in windows {
        columns.push(format!("lst_max_{w}d"));
    }
    for w in windows {
        columns.push(format!("tmax_promedio_{w}d"));
    }

    columns.extend(
        [
            "evi_ndvi_ratio",
            "temp_promedio",
            "amplitud_termica",
            "deficit_combinado",
            "mes",
            "dia_año",
            "dias_desde_inicio",
        ]
        .into_iter()
        .map(String::from),
    );

    columns
}

impl FeatureRow {
    /// Whether every windowed feature is populated (no `None` trends).
    ///
    /// Only complete rows may enter label derivation or model training.
    pub fn is_complete(&self) -> bool {
        self.windows
            .iter()
            .all(|w| w.ndvi_tendencia.is_some() && w.humedad_tendencia.is_some())
    }

    /// Feature value by column name.
    ///
    /// Returns `Ok(None)` for a known trend column whose history is too short,
    /// and `Err` for a column this row does not carry at all.
    pub fn value(&self, column: &str) -> Result<Option<f64>, SchemaError> {
        if let Some(raw) = self.observation.raw_value(column) {
            return Ok(Some(raw));
        }

        match column {
            "evi_ndvi_ratio" => return Ok(Some(self.evi_ndvi_ratio)),
            "temp_promedio" => return Ok(Some(self.temp_promedio)),
            "amplitud_termica" => return Ok(Some(self.amplitud_termica)),
            "deficit_combinado" => return Ok(Some(self.deficit_combinado)),
            "mes" => return Ok(Some(f64::from(self.mes))),
            "dia_año" => return Ok(Some(f64::from(self.dia_ano))),
            "dias_desde_inicio" => return Ok(Some(self.dias_desde_inicio as f64)),
            _ => {}
        }

        for wf in &self.windows {
            let w = wf.window;
            if column == format!("ndvi_promedio_{w}d") {
                return Ok(Some(wf.ndvi_promedio));
            }
            if column == format!("ndvi_tendencia_{w}d") {
                return Ok(wf.ndvi_tendencia);
            }
            if column == format!("humedad_promedio_{w}d") {
                return Ok(Some(wf.humedad_promedio));
            }
            if column == format!("humedad_tendencia_{w}d") {
                return Ok(wf.humedad_tendencia);
            }
            if column == format!("lst_max_{w}d") {
                return Ok(Some(wf.lst_max));
            }
            if column == format!("tmax_promedio_{w}d") {
                return Ok(Some(wf.tmax_promedio));
            }
        }

        Err(SchemaError::UnknownColumn(column.to_string()))
    }

    /// Project this row into a vector following `columns` exactly.
    ///
    /// Fails on any unknown column or any column whose value is absent; a
    /// partially filled vector is never produced.
    pub fn to_vector(&self, columns: &[String]) -> Result<Vec<f64>, SchemaError> {
        columns
            .iter()
            .map(|c| {
                self.value(c)?
                    .ok_or_else(|| SchemaError::MissingValue(c.clone()))
            })
            .collect()
    }

    /// Windowed features for a specific window size, if configured.
    pub fn window(&self, window: usize) -> Option<&WindowFeatures> {
        self.windows.iter().find(|w| w.window == window)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    fn sample_row() -> FeatureRow {
        let observation = Observation {
            date: NaiveDate::from_ymd_opt(2024, 6, 15).unwrap(),
            ndvi: 0.6,
            evi: 0.5,
            lst: 30.0,
            tmax: 28.0,
            tmin: 15.0,
            soil_humidity: 20.0,
        };
        FeatureRow {
            observation,
            windows: vec![
                WindowFeatures {
                    window: 7,
                    ndvi_promedio: 0.61,
                    ndvi_tendencia: Some(-0.02),
                    humedad_promedio: 19.5,
                    humedad_tendencia: Some(-1.0),
                    lst_max: 31.0,
                    tmax_promedio: 27.5,
                },
                WindowFeatures {
                    window: 14,
                    ndvi_promedio: 0.63,
                    ndvi_tendencia: None,
                    humedad_promedio: 21.0,
                    humedad_tendencia: None,
                    lst_max: 33.0,
                    tmax_promedio: 27.0,
                },
            ],
            evi_ndvi_ratio: 0.5 / 0.601,
            temp_promedio: 21.5,
            amplitud_termica: 13.0,
            deficit_combinado: 0.36,
            mes: 6,
            dia_ano: 167,
            dias_desde_inicio: 10,
        }
    }

    #[test]
    fn canonical_column_order_for_default_windows() {
        let columns = feature_columns(&[7, 14]);
        let expected = [
            "ndvi",
            "evi",
            "lst",
            "tmax",
            "tmin",
            "soil_humidity",
            "ndvi_promedio_7d",
            "ndvi_tendencia_7d",
            "ndvi_promedio_14d",
            "ndvi_tendencia_14d",
            "humedad_promedio_7d",
            "humedad_tendencia_7d",
            "humedad_promedio_14d",
            "humedad_tendencia_14d",
            "lst_max_7d",
            "lst_max_14d",
            "tmax_promedio_7d",
            "tmax_promedio_14d",
            "evi_ndvi_ratio",
            "temp_promedio",
            "amplitud_termica",
            "deficit_combinado",
            "mes",
            "dia_año",
            "dias_desde_inicio",
        ];
        assert_eq!(columns, expected);
    }

    #[test]
    fn value_resolves_windowed_columns() {
        let row = sample_row();
        assert_eq!(row.value("ndvi_promedio_7d").unwrap(), Some(0.61));
        assert_eq!(row.value("ndvi_tendencia_7d").unwrap(), Some(-0.02));
        assert_eq!(row.value("lst_max_14d").unwrap(), Some(33.0));
        assert_eq!(row.value("mes").unwrap(), Some(6.0));
    }

    #[test]
    fn unknown_column_is_an_error() {
        let row = sample_row();
        assert_eq!(
            row.value("precipitacion"),
            Err(SchemaError::UnknownColumn("precipitacion".into()))
        );
    }

    #[test]
    fn to_vector_rejects_missing_trend() {
        let row = sample_row();
        let columns = feature_columns(&[7, 14]);
        // 14d trends are None in the sample
        assert_eq!(
            row.to_vector(&columns),
            Err(SchemaError::MissingValue("ndvi_tendencia_14d".into()))
        );
    }

    #[test]
    fn incomplete_row_is_flagged() {
        let mut row = sample_row();
        assert!(!row.is_complete());
        row.windows[1].ndvi_tendencia = Some(0.01);
        row.windows[1].humedad_tendencia = Some(0.5);
        assert!(row.is_complete());
        assert!(row.to_vector(&feature_columns(&[7, 14])).is_ok());
    }
}
