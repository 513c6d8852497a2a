//! Datum transformation and map projection between WGS84 geodetic coordinates
//! and OSGB36 National Grid eastings/northings (EPSG:4326 <-> EPSG:27700).
//!
//! Forward and inverse transverse Mercator follow the series published in the
//! Ordnance Survey's "A guide to coordinate systems in Great Britain"; the
//! datum shift is the standard 7-parameter Helmert transformation.

/// Airy 1830 ellipsoid (OSGB36).
const AIRY_A: f64 = 6_377_563.396;
const AIRY_B: f64 = 6_356_256.909;

/// GRS80/WGS84 ellipsoid.
const WGS84_A: f64 = 6_378_137.000;
const WGS84_B: f64 = 6_356_752.3141;

/// National Grid projection constants.
const SCALE_F0: f64 = 0.999_601_271_7;
const LAT0_DEG: f64 = 49.0;
const LON0_DEG: f64 = -2.0;
const EAST0: f64 = 400_000.0;
const NORTH0: f64 = -100_000.0;

/// WGS84 -> OSGB36 Helmert parameters (metres, ppm, arc-seconds).
const HELMERT_TX: f64 = -446.448;
const HELMERT_TY: f64 = 125.157;
const HELMERT_TZ: f64 = -542.060;
const HELMERT_S: f64 = 20.4894e-6;
const HELMERT_RX_SEC: f64 = -0.1502;
const HELMERT_RY_SEC: f64 = -0.2470;
const HELMERT_RZ_SEC: f64 = -0.8421;

/// Both fixed-point iterations converge within a handful of steps for finite
/// input; the cap keeps non-finite coordinates from spinning.
const MAX_ITERATIONS: usize = 100;

fn arcsec_to_rad(sec: f64) -> f64 {
    sec.to_radians() / 3600.0
}

fn eccentricity_sq(a: f64, b: f64) -> f64 {
    (a * a - b * b) / (a * a)
}

/// Meridional arc, OS series in `n`.
fn meridional_arc(phi: f64, phi0: f64, a: f64, b: f64) -> f64 {
    let n = (a - b) / (a + b);
    let n2 = n * n;
    let n3 = n2 * n;
    let dphi = phi - phi0;
    let sphi = phi + phi0;
    b * SCALE_F0
        * ((1.0 + n + 1.25 * n2 + 1.25 * n3) * dphi
            - (3.0 * n + 3.0 * n2 + 2.625 * n3) * dphi.sin() * sphi.cos()
            + (1.875 * n2 + 1.875 * n3) * (2.0 * dphi).sin() * (2.0 * sphi).cos()
            - (35.0 / 24.0) * n3 * (3.0 * dphi).sin() * (3.0 * sphi).cos())
}

/// Projects OSGB36 geodetic latitude/longitude (radians) to grid easting/northing.
pub(crate) fn project(phi: f64, lambda: f64, a: f64, b: f64) -> (f64, f64) {
    let e2 = eccentricity_sq(a, b);
    let phi0 = LAT0_DEG.to_radians();
    let lambda0 = LON0_DEG.to_radians();

    let sin_phi = phi.sin();
    let cos_phi = phi.cos();
    let tan_phi = phi.tan();
    let nu = a * SCALE_F0 / (1.0 - e2 * sin_phi * sin_phi).sqrt();
    let rho = a * SCALE_F0 * (1.0 - e2) / (1.0 - e2 * sin_phi * sin_phi).powf(1.5);
    let eta2 = nu / rho - 1.0;

    let m = meridional_arc(phi, phi0, a, b);
    let t2 = tan_phi * tan_phi;
    let t4 = t2 * t2;

    let i = m + NORTH0;
    let ii = nu / 2.0 * sin_phi * cos_phi;
    let iii = nu / 24.0 * sin_phi * cos_phi.powi(3) * (5.0 - t2 + 9.0 * eta2);
    let iiia = nu / 720.0 * sin_phi * cos_phi.powi(5) * (61.0 - 58.0 * t2 + t4);
    let iv = nu * cos_phi;
    let v = nu / 6.0 * cos_phi.powi(3) * (nu / rho - t2);
    let vi = nu / 120.0 * cos_phi.powi(5) * (5.0 - 18.0 * t2 + t4 + 14.0 * eta2 - 58.0 * t2 * eta2);

    let dl = lambda - lambda0;
    let north = i + ii * dl.powi(2) + iii * dl.powi(4) + iiia * dl.powi(6);
    let east = EAST0 + iv * dl + v * dl.powi(3) + vi * dl.powi(5);
    (east, north)
}

/// Inverse projection: grid easting/northing to OSGB36 geodetic (radians).
pub(crate) fn unproject(east: f64, north: f64, a: f64, b: f64) -> (f64, f64) {
    let e2 = eccentricity_sq(a, b);
    let phi0 = LAT0_DEG.to_radians();
    let lambda0 = LON0_DEG.to_radians();

    // Iterate the meridional arc to 0.01 mm.
    let mut phi = (north - NORTH0) / (a * SCALE_F0) + phi0;
    for _ in 0..MAX_ITERATIONS {
        let m = meridional_arc(phi, phi0, a, b);
        let delta = north - NORTH0 - m;
        if delta.abs() < 1e-5 || !delta.is_finite() {
            break;
        }
        phi += delta / (a * SCALE_F0);
    }

    let sin_phi = phi.sin();
    let sec_phi = 1.0 / phi.cos();
    let tan_phi = phi.tan();
    let nu = a * SCALE_F0 / (1.0 - e2 * sin_phi * sin_phi).sqrt();
    let rho = a * SCALE_F0 * (1.0 - e2) / (1.0 - e2 * sin_phi * sin_phi).powf(1.5);
    let eta2 = nu / rho - 1.0;
    let t2 = tan_phi * tan_phi;
    let t4 = t2 * t2;
    let t6 = t4 * t2;

    let vii = tan_phi / (2.0 * rho * nu);
    let viii = tan_phi / (24.0 * rho * nu.powi(3)) * (5.0 + 3.0 * t2 + eta2 - 9.0 * t2 * eta2);
    let ix = tan_phi / (720.0 * rho * nu.powi(5)) * (61.0 + 90.0 * t2 + 45.0 * t4);
    let x = sec_phi / nu;
    let xi = sec_phi / (6.0 * nu.powi(3)) * (nu / rho + 2.0 * t2);
    let xii = sec_phi / (120.0 * nu.powi(5)) * (5.0 + 28.0 * t2 + 24.0 * t4);
    let xiia = sec_phi / (5040.0 * nu.powi(7)) * (61.0 + 662.0 * t2 + 1320.0 * t4 + 720.0 * t6);

    let de = east - EAST0;
    let lat = phi - vii * de.powi(2) + viii * de.powi(4) - ix * de.powi(6);
    let lon = lambda0 + x * de - xi * de.powi(3) + xii * de.powi(5) - xiia * de.powi(7);
    (lat, lon)
}

/// Geodetic (radians) to geocentric cartesian on the given ellipsoid.
fn to_cartesian(phi: f64, lambda: f64, a: f64, b: f64) -> (f64, f64, f64) {
    let e2 = eccentricity_sq(a, b);
    let sin_phi = phi.sin();
    let nu = a / (1.0 - e2 * sin_phi * sin_phi).sqrt();
    (
        nu * phi.cos() * lambda.cos(),
        nu * phi.cos() * lambda.sin(),
        (1.0 - e2) * nu * sin_phi,
    )
}

/// Geocentric cartesian to geodetic (radians) on the given ellipsoid.
fn to_geodetic(x: f64, y: f64, z: f64, a: f64, b: f64) -> (f64, f64) {
    let e2 = eccentricity_sq(a, b);
    let lambda = y.atan2(x);
    let p = (x * x + y * y).sqrt();
    let mut phi = z.atan2(p * (1.0 - e2));
    for _ in 0..MAX_ITERATIONS {
        let sin_phi = phi.sin();
        let nu = a / (1.0 - e2 * sin_phi * sin_phi).sqrt();
        let next = (z + e2 * nu * sin_phi).atan2(p);
        let step = (next - phi).abs();
        phi = next;
        if step < 1e-12 || !step.is_finite() {
            break;
        }
    }
    (phi, lambda)
}

/// 7-parameter Helmert transformation; `sign` selects the direction
/// (+1.0 for WGS84 -> OSGB36, -1.0 for the inverse).
fn helmert(x: f64, y: f64, z: f64, sign: f64) -> (f64, f64, f64) {
    let tx = sign * HELMERT_TX;
    let ty = sign * HELMERT_TY;
    let tz = sign * HELMERT_TZ;
    let s1 = 1.0 + sign * HELMERT_S;
    let rx = sign * arcsec_to_rad(HELMERT_RX_SEC);
    let ry = sign * arcsec_to_rad(HELMERT_RY_SEC);
    let rz = sign * arcsec_to_rad(HELMERT_RZ_SEC);
    (
        tx + s1 * x - rz * y + ry * z,
        ty + rz * x + s1 * y - rx * z,
        tz - ry * x + rx * y + s1 * z,
    )
}

/// Converts a WGS84 longitude/latitude pair (degrees) to OSGB36 National Grid
/// easting/northing in metres.
pub fn wgs84_to_osgb36(lon: f64, lat: f64) -> (f64, f64) {
    let (x, y, z) = to_cartesian(lat.to_radians(), lon.to_radians(), WGS84_A, WGS84_B);
    let (x, y, z) = helmert(x, y, z, 1.0);
    let (phi, lambda) = to_geodetic(x, y, z, AIRY_A, AIRY_B);
    project(phi, lambda, AIRY_A, AIRY_B)
}

/// Converts OSGB36 National Grid easting/northing (metres) to a WGS84
/// longitude/latitude pair in degrees.
pub fn osgb36_to_wgs84(east: f64, north: f64) -> (f64, f64) {
    let (phi, lambda) = unproject(east, north, AIRY_A, AIRY_B);
    let (x, y, z) = to_cartesian(phi, lambda, AIRY_A, AIRY_B);
    let (x, y, z) = helmert(x, y, z, -1.0);
    let (phi, lambda) = to_geodetic(x, y, z, WGS84_A, WGS84_B);
    (lambda.to_degrees(), phi.to_degrees())
}

#[cfg(test)]
mod tests {
    use super::*;
    use is_close::is_close;

    #[test]
    fn projects_the_ordnance_survey_worked_example() {
        // OSGB36 geodetic input from the OS guide, appendix C:
        // 52 deg 39' 27.2531" N, 1 deg 43' 4.5177" E.
        let lat = (52.0 + 39.0 / 60.0 + 27.2531 / 3600.0_f64).to_radians();
        let lon = (1.0 + 43.0 / 60.0 + 4.5177 / 3600.0_f64).to_radians();
        let (east, north) = project(lat, lon, AIRY_A, AIRY_B);
        assert!(is_close!(east, 651_409.903, abs_tol = 0.01), "east {east}");
        assert!(is_close!(north, 313_177.270, abs_tol = 0.01), "north {north}");
    }

    #[test]
    fn unproject_inverts_project() {
        let lat = 55.5_f64.to_radians();
        let lon = (-3.2_f64).to_radians();
        let (east, north) = project(lat, lon, AIRY_A, AIRY_B);
        let (lat2, lon2) = unproject(east, north, AIRY_A, AIRY_B);
        assert!(is_close!(lat2, lat, abs_tol = 1e-9));
        assert!(is_close!(lon2, lon, abs_tol = 1e-9));
    }

    #[test]
    fn wgs84_round_trip_is_stable() {
        for &(lon, lat) in &[(-5.21469, 49.96745), (-3.4111, 57.1332), (0.1278, 51.5074)] {
            let (east, north) = wgs84_to_osgb36(lon, lat);
            let (lon2, lat2) = osgb36_to_wgs84(east, north);
            assert!(is_close!(lon2, lon, abs_tol = 1e-7), "{lon} -> {lon2}");
            assert!(is_close!(lat2, lat, abs_tol = 1e-7), "{lat} -> {lat2}");
        }
    }

    #[test]
    fn non_finite_coordinates_terminate_with_nan() {
        let (lon, lat) = osgb36_to_wgs84(f64::NAN, f64::INFINITY);
        assert!(lon.is_nan());
        assert!(lat.is_nan());
        let (east, north) = wgs84_to_osgb36(f64::NAN, f64::NAN);
        assert!(east.is_nan());
        assert!(north.is_nan());
    }

    #[test]
    fn edinburgh_lands_in_the_nt_square() {
        let (east, north) = wgs84_to_osgb36(-3.1883, 55.9533);
        assert!((300_000.0..400_000.0).contains(&east), "east {east}");
        assert!((600_000.0..700_000.0).contains(&north), "north {north}");
    }
}
