//! British National Grid reference codec.
//!
//! A grid reference is a two-letter 100 km region code plus an even number of
//! digits (4, 6, 8 or 10) splitting into equal-length easting and northing
//! offsets within the region. All truncation uses floor semantics, so a
//! coordinate exactly on a cell boundary belongs to the lower cell.
//!
//! Parsing accepts 4/6/8/10-figure payloads everywhere; the 10 km tile codes
//! used to address archive files are derived with [`GridRef::tile_code_10km`],
//! never parsed back.

use crate::grid::error::BngError;
use crate::grid::osgb;
use std::fmt;
use std::str::FromStr;

/// 100 km grid square codes, northernmost row first.
const REGIONS: [[&str; 7]; 13] = [
    ["HL", "HM", "HN", "HO", "HP", "JL", "JM"],
    ["HQ", "HR", "HS", "HT", "HU", "JQ", "JR"],
    ["HV", "HW", "HX", "HY", "HZ", "JV", "JW"],
    ["NA", "NB", "NC", "ND", "NE", "OA", "OB"],
    ["NF", "NG", "NH", "NJ", "NK", "OF", "OG"],
    ["NL", "NM", "NN", "NO", "NP", "OL", "OM"],
    ["NQ", "NR", "NS", "NT", "NU", "OQ", "OR"],
    ["NV", "NW", "NX", "NY", "NZ", "OV", "OW"],
    ["SA", "SB", "SC", "SD", "SE", "TA", "TB"],
    ["SF", "SG", "SH", "SJ", "SK", "TF", "TG"],
    ["SL", "SM", "SN", "SO", "SP", "TL", "TM"],
    ["SQ", "SR", "SS", "ST", "SU", "TQ", "TR"],
    ["SV", "SW", "SX", "SY", "SZ", "TV", "TW"],
];

const REGION_SIZE_M: f64 = 100_000.0;

/// South-west corner offset of a region square, in metres.
fn region_offsets(code: &str) -> Option<(f64, f64)> {
    for (row, codes) in REGIONS.iter().enumerate() {
        for (col, candidate) in codes.iter().enumerate() {
            if *candidate == code {
                let x_off = col as f64 * REGION_SIZE_M;
                let y_off = (12 - row) as f64 * REGION_SIZE_M;
                return Some((x_off, y_off));
            }
        }
    }
    None
}

/// Number of figures in the digit payload of a grid reference, which fixes
/// the size of the cell the reference names (4 figures = 1 km down to
/// 10 figures = 1 m).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Precision {
    Figures4,
    Figures6,
    Figures8,
    Figures10,
}

impl Precision {
    /// Total digit count of the payload.
    pub fn figures(self) -> usize {
        match self {
            Precision::Figures4 => 4,
            Precision::Figures6 => 6,
            Precision::Figures8 => 8,
            Precision::Figures10 => 10,
        }
    }

    /// Cell size in metres at this precision.
    pub fn metres(self) -> f64 {
        match self {
            Precision::Figures4 => 1000.0,
            Precision::Figures6 => 100.0,
            Precision::Figures8 => 10.0,
            Precision::Figures10 => 1.0,
        }
    }

    pub fn from_figures(figures: usize) -> Result<Self, BngError> {
        match figures {
            4 => Ok(Precision::Figures4),
            6 => Ok(Precision::Figures6),
            8 => Ok(Precision::Figures8),
            10 => Ok(Precision::Figures10),
            other => Err(BngError::InvalidPrecision(other)),
        }
    }
}

/// Cell granularities supported by [`GridRef::bounding_box`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CellSize {
    TenKm,
    HundredKm,
}

impl CellSize {
    fn metres(self) -> f64 {
        match self {
            CellSize::TenKm => 10_000.0,
            CellSize::HundredKm => 100_000.0,
        }
    }
}

/// Square extent of a grid cell in OSGB36 metres.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BoundingBox {
    pub x_min: f64,
    pub x_max: f64,
    pub y_min: f64,
    pub y_max: f64,
}

/// A parsed, validated British National Grid reference.
///
/// Immutable once built; construct with [`GridRef::from_lonlat`] or parse
/// from a string.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct GridRef {
    region: String,
    easting: u32,
    northing: u32,
    precision: Precision,
}

impl GridRef {
    /// Encodes a WGS84 longitude/latitude pair as a grid reference at the
    /// requested precision.
    pub fn from_lonlat(lon: f64, lat: f64, precision: Precision) -> Result<Self, BngError> {
        let (x, y) = osgb::wgs84_to_osgb36(lon, lat);
        Self::from_osgb(x, y, precision).map_err(|err| match err {
            // Report the caller's coordinates, not the projected ones.
            BngError::OutOfGrid { .. } => BngError::OutOfRegion { lon, lat },
            other => other,
        })
    }

    /// Encodes projected OSGB36 easting/northing (metres) as a grid reference.
    pub fn from_osgb(x: f64, y: f64, precision: Precision) -> Result<Self, BngError> {
        if x < 0.0 || y < 0.0 {
            return Err(BngError::OutOfGrid { x, y });
        }
        let col = (x / REGION_SIZE_M).floor() as usize;
        let row_from_south = (y / REGION_SIZE_M).floor() as usize;
        if col >= 7 || row_from_south >= 13 {
            return Err(BngError::OutOfGrid { x, y });
        }
        let region = REGIONS[12 - row_from_south][col];
        let x_off = col as f64 * REGION_SIZE_M;
        let y_off = row_from_south as f64 * REGION_SIZE_M;
        Ok(GridRef {
            region: region.to_string(),
            easting: ((x - x_off) / precision.metres()).floor() as u32,
            northing: ((y - y_off) / precision.metres()).floor() as u32,
            precision,
        })
    }

    pub fn region(&self) -> &str {
        &self.region
    }

    pub fn precision(&self) -> Precision {
        self.precision
    }

    /// South-west corner of the referenced cell in OSGB36 metres.
    pub fn to_osgb(&self) -> (f64, f64) {
        // Region codes are validated on construction.
        let (x_off, y_off) = region_offsets(&self.region).unwrap_or((0.0, 0.0));
        let factor = self.precision.metres();
        (
            x_off + self.easting as f64 * factor,
            y_off + self.northing as f64 * factor,
        )
    }

    /// South-west corner of the referenced cell as WGS84 longitude/latitude.
    pub fn to_lonlat(&self) -> (f64, f64) {
        let (x, y) = self.to_osgb();
        osgb::osgb36_to_wgs84(x, y)
    }

    /// Re-expresses the reference at another precision. Coarsening floors to
    /// the enclosing cell; refining names the south-west corner.
    pub fn truncated(&self, precision: Precision) -> GridRef {
        let from = self.precision.figures() / 2;
        let to = precision.figures() / 2;
        let (easting, northing) = if to <= from {
            let scale = 10u32.pow((from - to) as u32);
            (self.easting / scale, self.northing / scale)
        } else {
            let scale = 10u32.pow((to - from) as u32);
            (self.easting * scale, self.northing * scale)
        };
        GridRef {
            region: self.region.clone(),
            easting,
            northing,
            precision,
        }
    }

    /// The 10 km tile code used to address archive files, e.g. `"SX73"`.
    pub fn tile_code_10km(&self) -> String {
        let (x, y) = self.to_osgb();
        let e = ((x % REGION_SIZE_M) / 10_000.0).floor() as u32;
        let n = ((y % REGION_SIZE_M) / 10_000.0).floor() as u32;
        format!("{}{}{}", self.region, e, n)
    }

    /// Extent of the 10 km or 100 km cell containing this reference.
    pub fn bounding_box(&self, cell_size: CellSize) -> BoundingBox {
        let size = cell_size.metres();
        let (x, y) = self.to_osgb();
        let x_min = (x / size).floor() * size;
        let y_min = (y / size).floor() * size;
        BoundingBox {
            x_min,
            x_max: x_min + size,
            y_min,
            y_max: y_min + size,
        }
    }
}

impl FromStr for GridRef {
    type Err = BngError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let trimmed = s.trim().to_uppercase();
        if trimmed.len() < 2 || !trimmed[..2].chars().all(|c| c.is_ascii_alphabetic()) {
            return Err(BngError::Malformed(s.to_string()));
        }
        let (region, digits) = trimmed.split_at(2);
        if !digits.chars().all(|c| c.is_ascii_digit()) {
            return Err(BngError::Malformed(s.to_string()));
        }
        let precision = Precision::from_figures(digits.len())
            .map_err(|_| BngError::Malformed(s.to_string()))?;
        if region_offsets(region).is_none() {
            return Err(BngError::UnknownRegion(region.to_string()));
        }
        let half = digits.len() / 2;
        let easting: u32 = digits[..half]
            .parse()
            .map_err(|_| BngError::Malformed(s.to_string()))?;
        let northing: u32 = digits[half..]
            .parse()
            .map_err(|_| BngError::Malformed(s.to_string()))?;
        Ok(GridRef {
            region: region.to_string(),
            easting,
            northing,
            precision,
        })
    }
}

impl fmt::Display for GridRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let width = self.precision.figures() / 2;
        write!(
            f,
            "{}{:0width$}{:0width$}",
            self.region, self.easting, self.northing
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::grid::osgb;

    #[test]
    fn decodes_a_ten_figure_reference() {
        let gridref: GridRef = "NT2755072950".parse().unwrap();
        assert_eq!(gridref.to_osgb(), (327_550.0, 672_950.0));
        assert_eq!(gridref.to_string(), "NT2755072950");
    }

    #[test]
    fn decoding_is_case_insensitive() {
        let gridref: GridRef = "nt27557295".parse().unwrap();
        assert_eq!(gridref.region(), "NT");
        assert_eq!(gridref.precision(), Precision::Figures8);
    }

    #[test]
    fn rejects_malformed_references() {
        assert!(matches!(
            "NT275".parse::<GridRef>(),
            Err(BngError::Malformed(_))
        ));
        assert!(matches!(
            "1234NT".parse::<GridRef>(),
            Err(BngError::Malformed(_))
        ));
        assert!(matches!(
            "NT27".parse::<GridRef>(),
            Err(BngError::Malformed(_))
        ));
        assert!(matches!(
            "II1234".parse::<GridRef>(),
            Err(BngError::UnknownRegion(_))
        ));
    }

    #[test]
    fn encode_rejects_locations_outside_the_grid() {
        // Paris: projects to a negative northing.
        let err = GridRef::from_lonlat(2.3522, 48.8566, Precision::Figures4).unwrap_err();
        assert!(matches!(err, BngError::OutOfRegion { .. }));
        // Mid-Atlantic: negative easting.
        let err = GridRef::from_lonlat(-12.0, 53.0, Precision::Figures4).unwrap_err();
        assert!(matches!(err, BngError::OutOfRegion { .. }));
    }

    #[test]
    fn projected_coordinates_outside_the_grid_report_metres() {
        let err = GridRef::from_osgb(800_000.0, 500.0, Precision::Figures4).unwrap_err();
        assert_eq!(err, BngError::OutOfGrid { x: 800_000.0, y: 500.0 });
        let err = GridRef::from_osgb(-1.0, 500.0, Precision::Figures4).unwrap_err();
        assert_eq!(err, BngError::OutOfGrid { x: -1.0, y: 500.0 });
    }

    #[test]
    fn rejects_unsupported_precisions() {
        assert_eq!(
            Precision::from_figures(5).unwrap_err(),
            BngError::InvalidPrecision(5)
        );
        assert_eq!(
            Precision::from_figures(12).unwrap_err(),
            BngError::InvalidPrecision(12)
        );
    }

    #[test]
    fn round_trip_error_is_bounded_by_cell_size() {
        let (lon, lat) = osgb::osgb36_to_wgs84(327_550.5, 672_950.5);
        for precision in [
            Precision::Figures4,
            Precision::Figures6,
            Precision::Figures8,
            Precision::Figures10,
        ] {
            let gridref = GridRef::from_lonlat(lon, lat, precision).unwrap();
            let (x, y) = gridref.to_osgb();
            let tol = precision.metres();
            assert!((x - 327_550.5).abs() <= tol, "{precision:?}: x {x}");
            assert!((y - 672_950.5).abs() <= tol, "{precision:?}: y {y}");
        }
    }

    #[test]
    fn encoding_the_cairngorms_site_is_deterministic() {
        let a = GridRef::from_lonlat(-3.4111, 57.1332, Precision::Figures10).unwrap();
        let b = GridRef::from_lonlat(-3.4111, 57.1332, Precision::Figures10).unwrap();
        assert_eq!(a, b);
        assert_eq!(a.region(), "NJ");
        let (lon, lat) = a.to_lonlat();
        // 1 m cell, so the decoded corner sits within ~1 m of the input.
        assert!((lon - -3.4111).abs() < 3e-5, "lon {lon}");
        assert!((lat - 57.1332).abs() < 2e-5, "lat {lat}");
    }

    #[test]
    fn floor_semantics_on_cell_boundaries() {
        // Exactly on a 1 km boundary: belongs to the lower cell.
        let gridref = GridRef::from_osgb(327_000.0, 672_000.0, Precision::Figures4).unwrap();
        assert_eq!(gridref.to_string(), "NT2772");
        assert_eq!(gridref.to_osgb(), (327_000.0, 672_000.0));
    }

    #[test]
    fn bounding_boxes_for_both_cell_sizes() {
        let gridref: GridRef = "NT2755072950".parse().unwrap();
        assert_eq!(
            gridref.bounding_box(CellSize::TenKm),
            BoundingBox {
                x_min: 320_000.0,
                x_max: 330_000.0,
                y_min: 670_000.0,
                y_max: 680_000.0,
            }
        );
        assert_eq!(
            gridref.bounding_box(CellSize::HundredKm),
            BoundingBox {
                x_min: 300_000.0,
                x_max: 400_000.0,
                y_min: 600_000.0,
                y_max: 700_000.0,
            }
        );
        // Six-figure references pick the same 10 km cell.
        let six: GridRef = "NT275729".parse().unwrap();
        assert_eq!(
            six.bounding_box(CellSize::TenKm),
            gridref.bounding_box(CellSize::TenKm)
        );
    }

    #[test]
    fn truncation_and_tile_codes() {
        let gridref: GridRef = "SX73478347".parse().unwrap();
        assert_eq!(gridref.truncated(Precision::Figures4).to_string(), "SX7383");
        assert_eq!(gridref.tile_code_10km(), "SX78");
        // Refining names the south-west corner of the cell.
        let refined = gridref.truncated(Precision::Figures10);
        assert_eq!(refined.to_string(), "SX7347083470");
        assert_eq!(refined.to_osgb(), gridref.to_osgb());
    }
}
