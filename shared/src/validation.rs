//! Validation utilities for the Crop Stress Monitoring Platform
//!
//! Range checks for raw observation data plus the qualitative status
//! classifications reported alongside predictions.

use chrono::NaiveDate;

use crate::models::Observation;

/// Datasets below this row count still train, but the report carries an
/// advisory warning.
pub const MIN_RECOMMENDED_RECORDS: usize = 100;

/// Soil humidity below this is reported as critical
pub const HUMIDITY_CRITICAL: f64 = 12.0;
/// Soil humidity below this (and above critical) is reported as low
pub const HUMIDITY_LOW: f64 = 18.0;
/// NDVI below this is reported as low
pub const NDVI_LOW: f64 = 0.5;
/// NDVI below this (and above low) is reported as moderate
pub const NDVI_MODERATE: f64 = 0.65;

// ============================================================================
// Observation Validations
// ============================================================================

/// Validate NDVI is inside its physical bounds
pub fn validate_ndvi(ndvi: f64) -> Result<(), &'static str> {
    if !(-1.0..=1.0).contains(&ndvi) {
        return Err("NDVI must be between -1 and 1");
    }
    Ok(())
}

/// Validate EVI is inside its physical bounds
pub fn validate_evi(evi: f64) -> Result<(), &'static str> {
    if !(0.0..=1.0).contains(&evi) {
        return Err("EVI must be between 0 and 1");
    }
    Ok(())
}

/// Validate all numeric fields are finite and bounded indices are in range
pub fn validate_observation(obs: &Observation) -> Result<(), &'static str> {
    let values = [
        obs.ndvi,
        obs.evi,
        obs.lst,
        obs.tmax,
        obs.tmin,
        obs.soil_humidity,
    ];
    if values.iter().any(|v| !v.is_finite()) {
        return Err("observation contains a non-finite value");
    }
    validate_ndvi(obs.ndvi)?;
    validate_evi(obs.evi)?;
    Ok(())
}

/// Check a date sequence for duplicates, returning the first duplicated date
pub fn find_duplicate_date(dates: &[NaiveDate]) -> Option<NaiveDate> {
    let mut sorted = dates.to_vec();
    sorted.sort();
    sorted.windows(2).find(|w| w[0] == w[1]).map(|w| w[0])
}

/// Whether a dataset is smaller than the recommended training size
pub fn is_below_recommended_size(rows: usize) -> bool {
    rows < MIN_RECOMMENDED_RECORDS
}

// ============================================================================
// Coordinate Validations
// ============================================================================

/// Validate a GPS latitude
pub fn validate_latitude(latitude: f64) -> Result<(), &'static str> {
    if !(-90.0..=90.0).contains(&latitude) {
        return Err("Latitude must be between -90 and 90");
    }
    Ok(())
}

/// Validate a GPS longitude
pub fn validate_longitude(longitude: f64) -> Result<(), &'static str> {
    if !(-180.0..=180.0).contains(&longitude) {
        return Err("Longitude must be between -180 and 180");
    }
    Ok(())
}

// ============================================================================
// Qualitative Status Classifications
// ============================================================================

/// Qualitative soil-humidity status reported with predictions
pub fn humidity_status(soil_humidity: f64) -> &'static str {
    if soil_humidity < HUMIDITY_CRITICAL {
        "critical"
    } else if soil_humidity < HUMIDITY_LOW {
        "low"
    } else {
        "adequate"
    }
}

/// Qualitative vegetation status reported with predictions
pub fn ndvi_status(ndvi: f64) -> &'static str {
    if ndvi < NDVI_LOW {
        "low"
    } else if ndvi < NDVI_MODERATE {
        "moderate"
    } else {
        "optimal"
    }
}
