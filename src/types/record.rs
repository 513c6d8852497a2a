use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

/// One finished day of weather in engine units.
///
/// Temperatures are deg C, rain and the evapotranspiration terms are cm/day,
/// irradiation is J/(m2 day), wind is m/s at 2 m, vapour pressure is hPa and
/// snow depth is cm where the source provides it.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct WeatherRecord {
    pub day: NaiveDate,
    pub temp_min: f64,
    pub temp_max: f64,
    pub rain: f64,
    pub irradiation: f64,
    pub wind: f64,
    pub vapour_pressure: f64,
    pub snow_depth: Option<f64>,
    pub e0: f64,
    pub es0: f64,
    pub et0: f64,
}
