//! Observation dataset validation, ingestion, and retrieval

use chrono::NaiveDate;
use csv::StringRecord;
use serde::Serialize;
use sqlx::PgPool;

use shared::{is_below_recommended_size, Observation, MIN_RECOMMENDED_RECORDS};

use crate::error::{AppError, AppResult};

/// Columns a raw observation CSV must carry.
const REQUIRED_COLUMNS: [&str; 7] = [
    "date",
    "ndvi",
    "evi",
    "lst",
    "tmax",
    "tmin",
    "soil_humidity",
];

/// Dataset service for CSV ingestion and observation queries
#[derive(Clone)]
pub struct DatasetService {
    db: PgPool,
}

/// Database row for an observation
#[derive(Debug, sqlx::FromRow)]
struct ObservationRow {
    date: NaiveDate,
    ndvi: f64,
    evi: f64,
    lst: f64,
    tmax: f64,
    tmin: f64,
    soil_humidity: f64,
}

impl From<ObservationRow> for Observation {
    fn from(row: ObservationRow) -> Self {
        Observation {
            date: row.date,
            ndvi: row.ndvi,
            evi: row.evi,
            lst: row.lst,
            tmax: row.tmax,
            tmin: row.tmin,
            soil_humidity: row.soil_humidity,
        }
    }
}

/// Result of importing a raw CSV.
///
/// Rows with null or unparseable values are dropped (they would poison the
/// percentile thresholds later); out-of-range values are imported but
/// reported, and a small dataset is an advisory warning rather than an
/// error.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CsvImportReport {
    pub total_rows: usize,
    pub imported: usize,
    pub dropped_rows: usize,
    pub warnings: Vec<String>,
    pub below_recommended_size: bool,
    pub start_date: Option<NaiveDate>,
    pub end_date: Option<NaiveDate>,
}

impl DatasetService {
    /// Create a new DatasetService instance
    pub fn new(db: PgPool) -> Self {
        Self { db }
    }

    /// Validate and import a raw observation CSV.
    pub async fn import_csv(&self, data: &[u8]) -> AppResult<CsvImportReport> {
        let (observations, report) = parse_csv(data)?;

        let mut tx = self.db.begin().await?;
        for obs in &observations {
            sqlx::query(
                r#"
                INSERT INTO observations (date, ndvi, evi, lst, tmax, tmin, soil_humidity)
                VALUES ($1, $2, $3, $4, $5, $6, $7)
                ON CONFLICT (date) DO UPDATE SET
                    ndvi = EXCLUDED.ndvi,
                    evi = EXCLUDED.evi,
                    lst = EXCLUDED.lst,
                    tmax = EXCLUDED.tmax,
                    tmin = EXCLUDED.tmin,
                    soil_humidity = EXCLUDED.soil_humidity,
                    updated_at = NOW()
                "#,
            )
            .bind(obs.date)
            .bind(obs.ndvi)
            .bind(obs.evi)
            .bind(obs.lst)
            .bind(obs.tmax)
            .bind(obs.tmin)
            .bind(obs.soil_humidity)
            .execute(&mut *tx)
            .await?;
        }
        tx.commit().await?;

        tracing::info!(
            "Imported {} observation(s), dropped {}, {} warning(s)",
            report.imported,
            report.dropped_rows,
            report.warnings.len()
        );

        Ok(report)
    }

    /// Load the full observation series, ordered by date.
    pub async fn load_all(&self) -> AppResult<Vec<Observation>> {
        let rows = sqlx::query_as::<_, ObservationRow>(
            r#"
            SELECT date, ndvi, evi, lst, tmax, tmin, soil_humidity
            FROM observations
            ORDER BY date
            "#,
        )
        .fetch_all(&self.db)
        .await?;

        Ok(rows.into_iter().map(|r| r.into()).collect())
    }

    /// Load observations inside a date range, ordered by date.
    pub async fn list_range(
        &self,
        start_date: NaiveDate,
        end_date: NaiveDate,
    ) -> AppResult<Vec<Observation>> {
        let rows = sqlx::query_as::<_, ObservationRow>(
            r#"
            SELECT date, ndvi, evi, lst, tmax, tmin, soil_humidity
            FROM observations
            WHERE date BETWEEN $1 AND $2
            ORDER BY date
            "#,
        )
        .bind(start_date)
        .bind(end_date)
        .fetch_all(&self.db)
        .await?;

        Ok(rows.into_iter().map(|r| r.into()).collect())
    }
}

/// Parse and validate a raw observation CSV.
///
/// Separated from persistence so the validation rules are testable without a
/// database.
pub fn parse_csv(data: &[u8]) -> AppResult<(Vec<Observation>, CsvImportReport)> {
    let mut reader = csv::Reader::from_reader(data);

    let headers = reader
        .headers()
        .map_err(|e| AppError::DatasetError(format!("unreadable CSV header: {}", e)))?
        .clone();

    let missing: Vec<&str> = REQUIRED_COLUMNS
        .iter()
        .filter(|c| !headers.iter().any(|h| h.trim() == **c))
        .copied()
        .collect();
    if !missing.is_empty() {
        return Err(AppError::DatasetError(format!(
            "missing required columns: {}",
            missing.join(", ")
        )));
    }

    let column_index = |name: &str| headers.iter().position(|h| h.trim() == name).unwrap();
    let indices: Vec<usize> = REQUIRED_COLUMNS.iter().map(|c| column_index(c)).collect();

    let mut observations = Vec::new();
    let mut total_rows = 0usize;
    let mut dropped_rows = 0usize;
    let mut ndvi_out_of_range = 0usize;
    let mut evi_out_of_range = 0usize;

    for record in reader.records() {
        let record =
            record.map_err(|e| AppError::DatasetError(format!("unreadable CSV record: {}", e)))?;
        total_rows += 1;

        let Some(obs) = parse_record(&record, &indices) else {
            dropped_rows += 1;
            continue;
        };

        if shared::validate_ndvi(obs.ndvi).is_err() {
            ndvi_out_of_range += 1;
        }
        if shared::validate_evi(obs.evi).is_err() {
            evi_out_of_range += 1;
        }
        observations.push(obs);
    }

    let mut warnings = Vec::new();
    if ndvi_out_of_range > 0 {
        warnings.push(format!(
            "ndvi: {} value(s) outside [-1, 1]",
            ndvi_out_of_range
        ));
    }
    if evi_out_of_range > 0 {
        warnings.push(format!("evi: {} value(s) outside [0, 1]", evi_out_of_range));
    }
    if is_below_recommended_size(observations.len()) {
        warnings.push(format!(
            "only {} valid record(s); at least {} are recommended for training",
            observations.len(),
            MIN_RECOMMENDED_RECORDS
        ));
    }

    let start_date = observations.iter().map(|o| o.date).min();
    let end_date = observations.iter().map(|o| o.date).max();

    let report = CsvImportReport {
        total_rows,
        imported: observations.len(),
        dropped_rows,
        warnings,
        below_recommended_size: is_below_recommended_size(observations.len()),
        start_date,
        end_date,
    };

    Ok((observations, report))
}

/// Parse one CSV record; `None` drops the row (null or unparseable values).
fn parse_record(record: &StringRecord, indices: &[usize]) -> Option<Observation> {
    let field = |i: usize| record.get(indices[i]).map(str::trim).unwrap_or("");

    let date = parse_date(field(0))?;
    let mut values = [0f64; 6];
    for (slot, i) in values.iter_mut().zip(1..=6) {
        let raw = field(i);
        if raw.is_empty() {
            return None;
        }
        *slot = raw.parse().ok().filter(|v: &f64| v.is_finite())?;
    }

    Some(Observation {
        date,
        ndvi: values[0],
        evi: values[1],
        lst: values[2],
        tmax: values[3],
        tmin: values[4],
        soil_humidity: values[5],
    })
}

/// Accept ISO dates as well as the day-first format raw exports use.
fn parse_date(raw: &str) -> Option<NaiveDate> {
    NaiveDate::parse_from_str(raw, "%Y-%m-%d")
        .or_else(|_| NaiveDate::parse_from_str(raw, "%d/%m/%Y"))
        .ok()
}

#[cfg(test)]
mod tests {
    use super::*;

    const HEADER: &str = "date,ndvi,evi,lst,tmax,tmin,soil_humidity";

    fn csv_bytes(rows: &[&str]) -> Vec<u8> {
        let mut text = String::from(HEADER);
        for row in rows {
            text.push('\n');
            text.push_str(row);
        }
        text.into_bytes()
    }

    #[test]
    fn parses_valid_rows() {
        let data = csv_bytes(&[
            "2024-06-01,0.60,0.50,30.0,28.0,15.0,20.0",
            "2024-06-02,0.61,0.51,30.5,28.5,15.5,19.5",
        ]);
        let (observations, report) = parse_csv(&data).unwrap();
        assert_eq!(observations.len(), 2);
        assert_eq!(report.imported, 2);
        assert_eq!(report.dropped_rows, 0);
        assert_eq!(
            report.start_date,
            NaiveDate::from_ymd_opt(2024, 6, 1)
        );
        assert_eq!(
            report.end_date,
            NaiveDate::from_ymd_opt(2024, 6, 2)
        );
    }

    #[test]
    fn accepts_day_first_dates() {
        let data = csv_bytes(&["15/06/2024,0.60,0.50,30.0,28.0,15.0,20.0"]);
        let (observations, _) = parse_csv(&data).unwrap();
        assert_eq!(
            observations[0].date,
            NaiveDate::from_ymd_opt(2024, 6, 15).unwrap()
        );
    }

    #[test]
    fn missing_column_is_rejected() {
        let data = b"date,ndvi,evi,lst,tmax,tmin\n2024-06-01,0.6,0.5,30,28,15".to_vec();
        let err = parse_csv(&data).unwrap_err();
        assert!(matches!(err, AppError::DatasetError(msg) if msg.contains("soil_humidity")));
    }

    #[test]
    fn null_and_unparseable_rows_are_dropped() {
        let data = csv_bytes(&[
            "2024-06-01,0.60,0.50,30.0,28.0,15.0,20.0",
            "2024-06-02,,0.51,30.5,28.5,15.5,19.5",
            "2024-06-03,abc,0.51,30.5,28.5,15.5,19.5",
            "not-a-date,0.60,0.51,30.5,28.5,15.5,19.5",
        ]);
        let (observations, report) = parse_csv(&data).unwrap();
        assert_eq!(observations.len(), 1);
        assert_eq!(report.total_rows, 4);
        assert_eq!(report.dropped_rows, 3);
    }

    #[test]
    fn out_of_range_values_warn_but_import() {
        let data = csv_bytes(&[
            "2024-06-01,1.60,0.50,30.0,28.0,15.0,20.0",
            "2024-06-02,0.60,1.50,30.5,28.5,15.5,19.5",
        ]);
        let (observations, report) = parse_csv(&data).unwrap();
        assert_eq!(observations.len(), 2);
        assert!(report.warnings.iter().any(|w| w.starts_with("ndvi:")));
        assert!(report.warnings.iter().any(|w| w.starts_with("evi:")));
    }

    #[test]
    fn small_dataset_gets_advisory_warning() {
        let data = csv_bytes(&["2024-06-01,0.60,0.50,30.0,28.0,15.0,20.0"]);
        let (_, report) = parse_csv(&data).unwrap();
        assert!(report.below_recommended_size);
        assert!(report.warnings.iter().any(|w| w.contains("recommended")));
    }

    #[test]
    fn column_order_does_not_matter() {
        let data = b"soil_humidity,date,ndvi,evi,lst,tmax,tmin\n20.0,2024-06-01,0.6,0.5,30,28,15"
            .to_vec();
        let (observations, _) = parse_csv(&data).unwrap();
        assert_eq!(observations[0].soil_humidity, 20.0);
        assert_eq!(observations[0].ndvi, 0.6);
    }

    #[test]
    fn parsed_rows_pass_domain_validation() {
        let data = csv_bytes(&["2024-06-01,0.60,0.50,30.0,28.0,15.0,20.0"]);
        let (observations, _) = parse_csv(&data).unwrap();
        assert!(shared::validate_observation(&observations[0]).is_ok());
    }
}
