//! Daily field observation models

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use validator::Validate;

/// One calendar day of remote-sensing and weather measurements for a single
/// field or polygon.
///
/// All numeric fields are doubles. `tmax >= tmin` is expected from any sane
/// data source but is not enforced here; range validation for the bounded
/// indices lives on the type so ingestion can report violations per field.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize, Validate)]
pub struct Observation {
    /// Observation date; unique within a series
    pub date: NaiveDate,

    /// Normalized difference vegetation index
    #[validate(range(min = -1.0, max = 1.0))]
    pub ndvi: f64,

    /// Enhanced vegetation index
    #[validate(range(min = 0.0, max = 1.0))]
    pub evi: f64,

    /// Land surface temperature, degrees Celsius
    pub lst: f64,

    /// Daily maximum air temperature, degrees Celsius
    pub tmax: f64,

    /// Daily minimum air temperature, degrees Celsius
    pub tmin: f64,

    /// Volumetric soil moisture proxy, roughly 0-35
    pub soil_humidity: f64,
}

impl Observation {
    /// The raw signal columns, in the order the training schema expects them.
    pub const RAW_COLUMNS: [&'static str; 6] =
        ["ndvi", "evi", "lst", "tmax", "tmin", "soil_humidity"];

    /// Raw signal value by column name.
    pub fn raw_value(&self, column: &str) -> Option<f64> {
        match column {
            "ndvi" => Some(self.ndvi),
            "evi" => Some(self.evi),
            "lst" => Some(self.lst),
            "tmax" => Some(self.tmax),
            "tmin" => Some(self.tmin),
            "soil_humidity" => Some(self.soil_humidity),
            _ => None,
        }
    }
}
