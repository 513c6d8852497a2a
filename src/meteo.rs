//! Meteorological helper quantities and the reference-evapotranspiration seam.

use chrono::NaiveDate;
use thiserror::Error;

/// Latent heat of vaporization (kJ/kg) against temperature (deg C), after
/// Osborne et al. (1930, 1937).
const HVAP_TEMPS: [f64; 13] = [
    0.01, 2.0, 4.0, 10.0, 14.0, 18.0, 20.0, 25.0, 30.0, 34.0, 40.0, 44.0, 50.0,
];
const HVAP_KJ_KG: [f64; 13] = [
    2500.9, 2496.2, 2491.4, 2477.2, 2467.7, 2458.3, 2453.5, 2441.7, 2429.8, 2420.3, 2406.0,
    2396.4, 2381.9,
];

/// Specific gas constant of water vapour, J/(kg K).
const R_WATER_VAPOUR: f64 = 461.0;
const KELVIN_0C: f64 = 273.15;
/// Saturation vapour pressure at the reference temperature, hPa.
const VPS_REFERENCE_HPA: f64 = 6.11;

/// Vapour pressure in hPa from relative humidity (%) and air temperature
/// (deg C), via Clausius-Clapeyron with a temperature-dependent latent heat
/// taken from the nearest table entry.
pub fn rh_to_vpress(rel_humidity: f64, temp: f64) -> f64 {
    let mut nearest = 0;
    for (idx, t) in HVAP_TEMPS.iter().enumerate() {
        if (t - temp).abs() < (HVAP_TEMPS[nearest] - temp).abs() {
            nearest = idx;
        }
    }
    let hvap = HVAP_KJ_KG[nearest] * 1e3;
    let vps = VPS_REFERENCE_HPA
        * ((hvap / R_WATER_VAPOUR) * (1.0 / KELVIN_0C - 1.0 / (temp + KELVIN_0C))).exp();
    vps * (rel_humidity / 100.0)
}

/// Rescales a wind speed (m/s) measured at `measured_height` metres to the
/// 2 m reference height of the Penman equation, using the FAO-56 logarithmic
/// wind profile.
pub fn rescale_windspeed(windspeed: f64, measured_height: f64) -> f64 {
    windspeed * (4.87 / (67.8 * measured_height - 5.42).ln())
}

/// Daily inputs to a reference-evapotranspiration formula.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct EtInput {
    pub day: NaiveDate,
    /// Site latitude in decimal degrees.
    pub latitude: f64,
    /// Site elevation in metres above sea level.
    pub elevation: f64,
    /// Angstrom turbidity coefficients.
    pub angst_a: f64,
    pub angst_b: f64,
    /// Daily minimum and maximum air temperature, deg C.
    pub temp_min: f64,
    pub temp_max: f64,
    /// Daily global radiation, J/(m2 day).
    pub irradiation: f64,
    /// Mean daily vapour pressure, hPa.
    pub vapour_pressure: f64,
    /// Mean daily wind speed at 2 m, m/s.
    pub wind: f64,
}

/// Reference-evapotranspiration terms in mm/day: open water (E0), bare soil
/// (ES0) and reference crop canopy (ET0).
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct EtTerms {
    pub e0: f64,
    pub es0: f64,
    pub et0: f64,
}

#[derive(Debug, Clone, PartialEq, Error)]
#[error("reference evapotranspiration failed for {day}: {reason}")]
pub struct EtError {
    pub day: NaiveDate,
    pub reason: String,
}

/// A reference-evapotranspiration formula, injected into the series builder
/// so the crop engine's own Penman/Penman-Monteith implementation can be
/// plugged in.
pub trait EtFormula: Send + Sync {
    fn reference_et(&self, input: &EtInput) -> Result<EtTerms, EtError>;
}

#[cfg(test)]
mod tests {
    use super::*;
    use is_close::is_close;

    #[test]
    fn saturated_air_at_twenty_degrees() {
        // Saturation vapour pressure at 20 C is ~23.4 hPa.
        let vap = rh_to_vpress(100.0, 20.0);
        assert!((22.0..24.0).contains(&vap), "vap {vap}");
    }

    #[test]
    fn vapour_pressure_is_linear_in_relative_humidity() {
        let full = rh_to_vpress(100.0, 15.0);
        let half = rh_to_vpress(50.0, 15.0);
        assert!(is_close!(half * 2.0, full, rel_tol = 1e-12));
    }

    #[test]
    fn vapour_pressure_increases_with_temperature() {
        assert!(rh_to_vpress(80.0, 25.0) > rh_to_vpress(80.0, 5.0));
    }

    #[test]
    fn windspeed_rescaling_from_ten_metres() {
        // 4.87 / ln(672.58) ~= 0.748.
        let scaled = rescale_windspeed(1.0, 10.0);
        assert!(is_close!(scaled, 0.748, abs_tol = 1e-3), "scaled {scaled}");
        assert!(is_close!(rescale_windspeed(3.5, 10.0), 3.5 * scaled));
    }

    #[test]
    fn rescaling_at_two_metres_is_near_identity() {
        let scaled = rescale_windspeed(1.0, 2.0);
        assert!(is_close!(scaled, 1.0, abs_tol = 2e-3), "scaled {scaled}");
    }
}
