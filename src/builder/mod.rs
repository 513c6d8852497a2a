//! Assembly of finished weather series from the raw archives.

pub mod convert;
pub mod error;

use crate::archive::gridded::GridArchive;
use crate::archive::parcel::ParcelStore;
use crate::builder::convert::{Converter, Observation};
use crate::builder::error::{BuildError, RowDrop, RowError};
use crate::calendar::{fill_date_gaps, normalize_to_gregorian};
use crate::grid::bng::{GridRef, Precision};
use crate::meteo::{EtFormula, EtInput};
use crate::types::key::Scenario;
use crate::types::record::WeatherRecord;
use crate::types::series::WeatherSeries;
use crate::types::site::SiteInfo;
use chrono::NaiveDate;
use log::{debug, warn};
use std::collections::BTreeMap;

/// Tunables of the build pipeline, normally taken from [`crate::config::RunConfig`].
#[derive(Debug, Clone, Copy)]
pub struct BuildSettings {
    pub nodata_value: f64,
    pub parcel_nodata_value: f64,
    pub missing_snow_depth: Option<f64>,
    /// Minimum fraction of source rows that must convert cleanly.
    pub min_row_fraction: f64,
}

/// Builds gap-free, unit-normalized series from the gridded and parcel
/// archives. Locate, extract, normalize, convert and assemble run in order;
/// rows that fail conversion are dropped with a diagnostic and backfilled
/// from their nearest surviving neighbour.
pub struct WeatherSeriesBuilder<'a> {
    settings: BuildSettings,
    grid: GridArchive,
    parcels: ParcelStore,
    et: &'a dyn EtFormula,
}

impl<'a> WeatherSeriesBuilder<'a> {
    pub fn new(
        settings: BuildSettings,
        grid: GridArchive,
        parcels: ParcelStore,
        et: &'a dyn EtFormula,
    ) -> Self {
        WeatherSeriesBuilder {
            settings,
            grid,
            parcels,
            et,
        }
    }

    /// Series for the 1 km tile containing `gridref`, from the gridded
    /// archive of its 10 km tile.
    pub fn build_tile(
        &self,
        gridref: &GridRef,
        scenario: Scenario,
        ensemble: u8,
        site: &SiteInfo,
    ) -> Result<WeatherSeries, BuildError> {
        let tile = gridref.truncated(Precision::Figures4);
        let tile_10km = gridref.tile_code_10km();
        let (x, y) = tile.to_osgb();
        debug!("building series for tile {tile} from archive tile {tile_10km}");

        let cell = self
            .grid
            .extract_nearest(&tile_10km, scenario, ensemble, x, y)?;
        let mapped = normalize_to_gregorian(cell.days.iter().map(|d| (d.day, *d)))?;

        let converter = self.converter();
        let total = mapped.len();
        let mut survivors = BTreeMap::new();
        let mut dropped = Vec::new();
        for (date, raw) in mapped {
            match converter
                .convert_gridded(&raw)
                .and_then(|obs| self.with_et(date, site, obs))
            {
                Ok(record) => {
                    survivors.insert(date, record);
                }
                Err(error) => {
                    warn!("failed reading row for {date}: {error}, skipping");
                    dropped.push(RowDrop { date, error });
                }
            }
        }
        self.finish(survivors, dropped, total)
    }

    /// Series for a parcel archive, already on the Gregorian calendar.
    pub fn build_parcel(
        &self,
        parcel_id: u64,
        site: &SiteInfo,
    ) -> Result<WeatherSeries, BuildError> {
        let days = self.parcels.load(parcel_id)?;
        debug!("building series for parcel {parcel_id} ({} source days)", days.len());

        let mut mapped = BTreeMap::new();
        for day in days {
            mapped.insert(day.date, day);
        }
        fill_date_gaps(&mut mapped);

        let converter = self.converter();
        let total = mapped.len();
        let mut survivors = BTreeMap::new();
        let mut dropped = Vec::new();
        for (date, raw) in mapped {
            match converter
                .convert_parcel(&raw)
                .and_then(|obs| self.with_et(date, site, obs))
            {
                Ok(record) => {
                    survivors.insert(date, record);
                }
                Err(error) => {
                    warn!("failed reading row for {date}: {error}, skipping");
                    dropped.push(RowDrop { date, error });
                }
            }
        }
        self.finish(survivors, dropped, total)
    }

    fn converter(&self) -> Converter {
        Converter {
            nodata_value: self.settings.nodata_value,
            parcel_nodata_value: self.settings.parcel_nodata_value,
            missing_snow_depth: self.settings.missing_snow_depth,
        }
    }

    /// Appends the evapotranspiration terms, rescaled from mm/day to cm/day.
    fn with_et(
        &self,
        date: NaiveDate,
        site: &SiteInfo,
        obs: Observation,
    ) -> Result<WeatherRecord, RowError> {
        let terms = self.et.reference_et(&EtInput {
            day: date,
            latitude: site.latitude,
            elevation: site.elevation,
            angst_a: site.angst_a,
            angst_b: site.angst_b,
            temp_min: obs.temp_min,
            temp_max: obs.temp_max,
            irradiation: obs.irradiation,
            vapour_pressure: obs.vapour_pressure,
            wind: obs.wind,
        })?;
        Ok(WeatherRecord {
            day: date,
            temp_min: obs.temp_min,
            temp_max: obs.temp_max,
            rain: obs.rain,
            irradiation: obs.irradiation,
            wind: obs.wind,
            vapour_pressure: obs.vapour_pressure,
            snow_depth: obs.snow_depth,
            e0: terms.e0 / 10.0,
            es0: terms.es0 / 10.0,
            et0: terms.et0 / 10.0,
        })
    }

    fn finish(
        &self,
        mut survivors: BTreeMap<NaiveDate, WeatherRecord>,
        dropped: Vec<RowDrop>,
        total: usize,
    ) -> Result<WeatherSeries, BuildError> {
        if survivors.is_empty() {
            return Err(BuildError::Empty);
        }
        let survived = survivors.len();
        if (survived as f64) < self.settings.min_row_fraction * total as f64 {
            return Err(BuildError::TooFewRows {
                survived,
                total,
                min_fraction: self.settings.min_row_fraction,
                dropped,
            });
        }
        // Dropped dates are backfilled so the emitted series stays gap-free.
        fill_date_gaps(&mut survivors);
        let records = survivors
            .into_iter()
            .map(|(date, mut record)| {
                record.day = date;
                record
            })
            .collect();
        Ok(WeatherSeries::from_records(records)?)
    }
}
