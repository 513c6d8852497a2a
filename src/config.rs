//! Typed run configuration, loaded from TOML.

use serde::Deserialize;
use std::io;
use std::path::{Path, PathBuf};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("cannot read config file {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("cannot parse config: {0}")]
    Parse(#[from] Box<toml::de::Error>),

    #[error("Angstrom coefficients out of range: A = {a}, B = {b} (need |A| in [0.1, 0.4], |B| in [0.3, 0.7], |A|+|B| in [0.6, 0.9])")]
    InvalidAngstrom { a: f64, b: f64 },

    #[error("min_row_fraction must be in (0, 1], got {0}")]
    InvalidRowFraction(f64),

    #[error("no cache directory configured and no platform default available")]
    NoCacheDir,
}

/// Locations of the local archives and the cache.
#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct DataDirs {
    /// Directory of gridded climate archive files.
    pub climate_dir: PathBuf,
    /// Directory of per-parcel mesoclimate files.
    pub parcel_dir: PathBuf,
    /// Cache directory; the platform cache directory is used when unset.
    #[serde(default)]
    pub cache_dir: Option<PathBuf>,
}

/// Tunables of the weather pipeline.
#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct WeatherConfig {
    /// No-data sentinel of the gridded archives.
    #[serde(default = "default_nodata")]
    pub nodata_value: f64,
    /// No-data sentinel of the parcel archives.
    #[serde(default = "default_parcel_nodata")]
    pub parcel_nodata_value: f64,
    /// Substitute for missing snow depth; rows keep an absent snow depth
    /// when unset.
    #[serde(default)]
    pub missing_snow_depth: Option<f64>,
    #[serde(default = "default_min_row_fraction")]
    pub min_row_fraction: f64,
    #[serde(default = "default_angstrom_a")]
    pub angstrom_a: f64,
    #[serde(default = "default_angstrom_b")]
    pub angstrom_b: f64,
    /// Cache entries older than this are rebuilt.
    #[serde(default = "default_max_cache_age_days")]
    pub max_cache_age_days: i64,
}

fn default_nodata() -> f64 {
    -999.0
}

fn default_parcel_nodata() -> f64 {
    -99.0
}

fn default_min_row_fraction() -> f64 {
    0.9
}

fn default_angstrom_a() -> f64 {
    0.18
}

fn default_angstrom_b() -> f64 {
    0.55
}

fn default_max_cache_age_days() -> i64 {
    90
}

impl Default for WeatherConfig {
    fn default() -> Self {
        WeatherConfig {
            nodata_value: default_nodata(),
            parcel_nodata_value: default_parcel_nodata(),
            missing_snow_depth: None,
            min_row_fraction: default_min_row_fraction(),
            angstrom_a: default_angstrom_a(),
            angstrom_b: default_angstrom_b(),
            max_cache_age_days: default_max_cache_age_days(),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct RunConfig {
    pub data: DataDirs,
    #[serde(default)]
    pub weather: WeatherConfig,
}

impl RunConfig {
    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let text = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_toml_str(&text)
    }

    pub fn from_toml_str(text: &str) -> Result<Self, ConfigError> {
        let config: RunConfig = toml::from_str(text).map_err(Box::new)?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        let (a, b) = self.angstrom_ab();
        let sum = a + b;
        if !(0.1..=0.4).contains(&a) || !(0.3..=0.7).contains(&b) || !(0.6..=0.9).contains(&sum) {
            return Err(ConfigError::InvalidAngstrom {
                a: self.weather.angstrom_a,
                b: self.weather.angstrom_b,
            });
        }
        let fraction = self.weather.min_row_fraction;
        if !(fraction > 0.0 && fraction <= 1.0) {
            return Err(ConfigError::InvalidRowFraction(fraction));
        }
        Ok(())
    }

    /// Angstrom coefficients with the sign convention normalized away.
    pub fn angstrom_ab(&self) -> (f64, f64) {
        (self.weather.angstrom_a.abs(), self.weather.angstrom_b.abs())
    }

    /// Configured cache directory, or the platform default.
    pub fn cache_dir(&self) -> Result<PathBuf, ConfigError> {
        if let Some(dir) = &self.data.cache_dir {
            return Ok(dir.clone());
        }
        dirs::cache_dir()
            .map(|dir| dir.join("chess-scape"))
            .ok_or(ConfigError::NoCacheDir)
    }
}
