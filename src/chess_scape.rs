//! The main entry point for building cached weather series.

use crate::builder::{BuildSettings, WeatherSeriesBuilder};
use crate::archive::gridded::GridArchive;
use crate::archive::parcel::ParcelStore;
use crate::cache::{CacheManager, CacheOutcome};
use crate::config::RunConfig;
use crate::error::ChessScapeError;
use crate::grid::bng::{GridRef, Precision};
use crate::grid::error::BngError;
use crate::meteo::EtFormula;
use crate::terrain::TerrainLookup;
use crate::types::key::{Scenario, SeriesKey};
use crate::types::series::WeatherSeries;
use crate::types::site::SiteInfo;
use bon::bon;
use chrono::Duration;
use log::{debug, warn};

/// A geographical coordinate as longitude (index 0) and latitude (index 1),
/// both in decimal degrees.
///
/// # Examples
///
/// ```
/// use chess_scape::LonLat;
///
/// let aviemore = LonLat(-3.8267, 57.1947);
/// assert_eq!(aviemore.0, -3.8267); // Longitude
/// ```
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LonLat(pub f64, pub f64);

/// Client for turning local CHESS-SCAPE archives into unit-normalized,
/// gap-free daily weather series.
///
/// The client owns the series cache and two injected collaborators: a
/// [`TerrainLookup`] for site elevation and an [`EtFormula`] supplying the
/// crop engine's reference-evapotranspiration implementation. Construct it
/// once and call the builder-style series methods.
pub struct ChessScape {
    config: RunConfig,
    cache: CacheManager,
    terrain: Box<dyn TerrainLookup>,
    et: Box<dyn EtFormula>,
}

#[bon]
impl ChessScape {
    /// Creates a client from a validated [`RunConfig`].
    ///
    /// # Arguments
    ///
    /// * `.config(RunConfig)`: **Required.** Archive locations and pipeline tunables.
    /// * `.terrain(Box<dyn TerrainLookup>)`: **Required.** Elevation source.
    /// * `.et(Box<dyn EtFormula>)`: **Required.** Reference-ET implementation.
    #[builder]
    pub fn new(
        config: RunConfig,
        terrain: Box<dyn TerrainLookup>,
        et: Box<dyn EtFormula>,
    ) -> Result<Self, ChessScapeError> {
        config.validate()?;
        let cache = CacheManager::new(config.cache_dir()?)?;
        Ok(ChessScape {
            config,
            cache,
            terrain,
            et,
        })
    }

    /// Weather series for the 1 km tile containing a grid reference, under a
    /// scenario/ensemble pair.
    ///
    /// # Arguments
    ///
    /// * `.gridref(&str)`: **Required.** OS grid reference, 4 to 10 figures.
    /// * `.scenario(Scenario)`: **Required.** Emission scenario of the archive.
    /// * `.ensemble(u8)`: **Required.** Ensemble member number.
    /// * `.max_age_days(i64)`: Staleness bound override for the cache entry.
    /// * `.force_update(bool)`: Rebuild even when a fresh entry exists.
    #[builder]
    pub fn tile_series(
        &self,
        gridref: &str,
        scenario: Scenario,
        ensemble: u8,
        max_age_days: Option<i64>,
        force_update: Option<bool>,
    ) -> Result<(WeatherSeries, CacheOutcome), ChessScapeError> {
        let parsed: GridRef = gridref.parse().map_err(ChessScapeError::Grid)?;
        let tile = parsed.truncated(Precision::Figures4);
        let key = SeriesKey::Tile {
            tile_1km: tile.to_string(),
            scenario,
            ensemble,
        };

        let (lon, lat) = tile.to_lonlat();
        let site = self.site_info(lon, lat);
        let max_age = self.max_age(max_age_days, force_update);

        let builder = self.series_builder();
        let (series, outcome) = self.cache.get(&key, max_age, || {
            builder.build_tile(&parsed, scenario, ensemble, &site)
        })?;
        debug!("series for {key:?}: {outcome:?}, {} days", series.len());
        Ok((series, outcome))
    }

    /// Weather series for a parcel archive.
    ///
    /// # Arguments
    ///
    /// * `.parcel_id(u64)`: **Required.** Parcel identifier.
    /// * `.location(LonLat)`: **Required.** Parcel centroid.
    /// * `.max_age_days(i64)`: Staleness bound override for the cache entry.
    /// * `.force_update(bool)`: Rebuild even when a fresh entry exists.
    #[builder]
    pub fn parcel_series(
        &self,
        parcel_id: u64,
        location: LonLat,
        max_age_days: Option<i64>,
        force_update: Option<bool>,
    ) -> Result<(WeatherSeries, CacheOutcome), ChessScapeError> {
        let key = SeriesKey::Parcel { id: parcel_id };
        let site = self.site_info(location.0, location.1);
        let max_age = self.max_age(max_age_days, force_update);

        let builder = self.series_builder();
        let (series, outcome) = self.cache.get(&key, max_age, || {
            builder.build_parcel(parcel_id, &site)
        })?;
        debug!("series for {key:?}: {outcome:?}, {} days", series.len());
        Ok((series, outcome))
    }

    /// Grid reference of a coordinate at 8 figures, the resolution parcel
    /// sites are addressed at.
    pub fn gridref_of(&self, location: LonLat) -> Result<GridRef, BngError> {
        GridRef::from_lonlat(location.0, location.1, Precision::Figures8)
    }

    fn series_builder(&self) -> WeatherSeriesBuilder<'_> {
        WeatherSeriesBuilder::new(
            BuildSettings {
                nodata_value: self.config.weather.nodata_value,
                parcel_nodata_value: self.config.weather.parcel_nodata_value,
                missing_snow_depth: self.config.weather.missing_snow_depth,
                min_row_fraction: self.config.weather.min_row_fraction,
            },
            GridArchive::new(&self.config.data.climate_dir),
            ParcelStore::new(&self.config.data.parcel_dir),
            self.et.as_ref(),
        )
    }

    fn site_info(&self, lon: f64, lat: f64) -> SiteInfo {
        let (angst_a, angst_b) = self.config.angstrom_ab();
        SiteInfo {
            longitude: lon,
            latitude: lat,
            elevation: self.elevation_or_default(lon, lat),
            angst_a,
            angst_b,
        }
    }

    fn max_age(&self, max_age_days: Option<i64>, force_update: Option<bool>) -> Duration {
        if force_update.unwrap_or(false) {
            return Duration::zero();
        }
        Duration::days(max_age_days.unwrap_or(self.config.weather.max_cache_age_days))
    }

    /// Sites without elevation coverage fall back to sea level; the series
    /// is still built, with a warning.
    fn elevation_or_default(&self, lon: f64, lat: f64) -> f64 {
        match self.terrain.elevation(lon, lat) {
            Ok(elevation) => elevation,
            Err(err) => {
                warn!("elevation lookup failed for ({lon}, {lat}): {err}, using 0.0");
                0.0
            }
        }
    }
}
