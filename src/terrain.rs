//! Elevation lookup seam.

use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Error)]
pub enum TerrainError {
    #[error("no elevation data covers ({lon}, {lat})")]
    OutOfCoverage { lon: f64, lat: f64 },

    #[error("elevation lookup failed: {0}")]
    Lookup(String),
}

/// Supplies site elevation for the evapotranspiration terms. Implementations
/// typically wrap a local DEM raster.
pub trait TerrainLookup: Send + Sync {
    /// Elevation in metres above sea level at a WGS84 longitude/latitude.
    fn elevation(&self, lon: f64, lat: f64) -> Result<f64, TerrainError>;
}

/// A constant-elevation lookup, useful for flat study areas and tests.
#[derive(Debug, Clone, Copy)]
pub struct FlatTerrain(pub f64);

impl TerrainLookup for FlatTerrain {
    fn elevation(&self, _lon: f64, _lat: f64) -> Result<f64, TerrainError> {
        Ok(self.0)
    }
}
