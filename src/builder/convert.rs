//! Unit conversions from raw archive fields to engine units.

use crate::archive::gridded::GriddedDay;
use crate::archive::parcel::ParcelDay;
use crate::builder::error::RowError;
use crate::meteo::rh_to_vpress;

/// Tolerance when comparing a value against the no-data sentinel.
pub const NODATA_EPS: f64 = 1e-4;

pub fn k_to_c(x: f64) -> f64 {
    x - 273.15
}

/// Precipitation flux (kg m-2 s-1) to cm/day.
pub fn flux_to_cm(x: f64) -> f64 {
    x * 86_400.0 / 10.0
}

pub fn mm_to_cm(x: f64) -> f64 {
    x / 10.0
}

/// Mean daily flux (W/m2) to a daily total (J/(m2 day)).
pub fn w_to_j(x: f64) -> f64 {
    x * 86_400.0
}

/// A converted day before the evapotranspiration terms are appended.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Observation {
    pub temp_min: f64,
    pub temp_max: f64,
    pub rain: f64,
    pub irradiation: f64,
    pub wind: f64,
    pub vapour_pressure: f64,
    pub snow_depth: Option<f64>,
}

/// Applies the per-source conversion tables and the no-data policy.
///
/// A field is missing when it is absent, non-finite or within [`NODATA_EPS`]
/// of the source's sentinel. Only snow depth tolerates missing values; it is
/// substituted with the configured default or left absent.
#[derive(Debug, Clone, Copy)]
pub struct Converter {
    pub nodata_value: f64,
    pub parcel_nodata_value: f64,
    pub missing_snow_depth: Option<f64>,
}

impl Converter {
    fn require(
        &self,
        sentinel: f64,
        field: &'static str,
        value: Option<f64>,
    ) -> Result<f64, RowError> {
        match value {
            Some(v) if v.is_finite() && (v - sentinel).abs() >= NODATA_EPS => Ok(v),
            _ => Err(RowError::MissingField { field }),
        }
    }

    pub fn convert_gridded(&self, day: &GriddedDay) -> Result<Observation, RowError> {
        let sentinel = self.nodata_value;
        let tas = self.require(sentinel, "tas", day.tas)?;
        let tasmax = self.require(sentinel, "tasmax", day.tasmax)?;
        let tasmin = self.require(sentinel, "tasmin", day.tasmin)?;
        let pr = self.require(sentinel, "pr", day.pr)?;
        let rsds = self.require(sentinel, "rsds", day.rsds)?;
        let sfcwind = self.require(sentinel, "sfcwind", day.sfcwind)?;
        let hurs = self.require(sentinel, "hurs", day.hurs)?;
        Ok(Observation {
            temp_min: k_to_c(tasmin),
            temp_max: k_to_c(tasmax),
            rain: flux_to_cm(pr),
            irradiation: w_to_j(rsds),
            wind: sfcwind,
            vapour_pressure: rh_to_vpress(hurs, k_to_c(tas)),
            snow_depth: self.missing_snow_depth,
        })
    }

    pub fn convert_parcel(&self, day: &ParcelDay) -> Result<Observation, RowError> {
        let sentinel = self.parcel_nodata_value;
        let tasmin = self.require(sentinel, "tasmin", day.tasmin)?;
        let tasmax = self.require(sentinel, "tasmax", day.tasmax)?;
        let pr = self.require(sentinel, "pr", day.pr)?;
        let wspeed = self.require(sentinel, "wspeed", day.wspeed)?;
        let tasmean = self.require(sentinel, "tasmean", day.tasmean)?;
        let swdown = self.require(sentinel, "swdown", day.swdown)?;
        let lwdown = self.require(sentinel, "lwdown", day.lwdown)?;
        let hurs = self.require(sentinel, "hurs", day.hurs)?;
        Ok(Observation {
            temp_min: tasmin,
            temp_max: tasmax,
            rain: mm_to_cm(pr),
            irradiation: w_to_j(swdown + lwdown),
            wind: wspeed,
            vapour_pressure: rh_to_vpress(hurs, tasmean),
            snow_depth: self.missing_snow_depth,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::calendar::Day360;
    use chrono::NaiveDate;
    use is_close::is_close;

    fn converter() -> Converter {
        Converter {
            nodata_value: -999.0,
            parcel_nodata_value: -99.0,
            missing_snow_depth: None,
        }
    }

    fn gridded_day() -> GriddedDay {
        GriddedDay {
            day: Day360::new(2021, 1).unwrap(),
            tas: Some(281.15),
            tasmax: Some(285.15),
            tasmin: Some(278.15),
            pr: Some(2.0e-5),
            rsds: Some(120.0),
            sfcwind: Some(4.2),
            hurs: Some(80.0),
        }
    }

    fn parcel_day() -> ParcelDay {
        ParcelDay {
            date: NaiveDate::from_ymd_opt(2021, 3, 1).unwrap(),
            tasmin: Some(3.0),
            tasmax: Some(11.0),
            pr: Some(1.5),
            wspeed: Some(2.5),
            tasmean: Some(7.0),
            swdown: Some(100.0),
            lwdown: Some(295.0),
            hurs: Some(85.0),
        }
    }

    #[test]
    fn gridded_conversions_match_the_source_units() {
        let obs = converter().convert_gridded(&gridded_day()).unwrap();
        assert!(is_close!(obs.temp_min, 5.0));
        assert!(is_close!(obs.temp_max, 12.0));
        assert!(is_close!(obs.rain, 2.0e-5 * 86_400.0 / 10.0));
        assert!(is_close!(obs.irradiation, 120.0 * 86_400.0));
        assert!(is_close!(obs.wind, 4.2));
        assert!(is_close!(
            obs.vapour_pressure,
            rh_to_vpress(80.0, 281.15 - 273.15)
        ));
        assert_eq!(obs.snow_depth, None);
    }

    #[test]
    fn parcel_conversions_combine_both_radiation_fluxes() {
        let obs = converter().convert_parcel(&parcel_day()).unwrap();
        assert!(is_close!(obs.temp_min, 3.0));
        assert!(is_close!(obs.rain, 0.15));
        assert!(is_close!(obs.irradiation, 395.0 * 86_400.0));
        assert!(is_close!(obs.vapour_pressure, rh_to_vpress(85.0, 7.0)));
    }

    #[test]
    fn sentinel_and_nan_values_are_missing() {
        let converter = converter();
        let mut day = gridded_day();
        day.pr = Some(-999.0);
        assert_eq!(
            converter.convert_gridded(&day).unwrap_err(),
            RowError::MissingField { field: "pr" }
        );
        day.pr = Some(-999.000_05);
        assert!(converter.convert_gridded(&day).is_err());
        day.pr = Some(f64::NAN);
        assert!(converter.convert_gridded(&day).is_err());
        day.pr = None;
        assert!(converter.convert_gridded(&day).is_err());
    }

    #[test]
    fn snow_depth_substitution_is_configurable() {
        let converter = Converter {
            missing_snow_depth: Some(0.0),
            ..converter()
        };
        let obs = converter.convert_gridded(&gridded_day()).unwrap();
        assert_eq!(obs.snow_depth, Some(0.0));
    }
}
