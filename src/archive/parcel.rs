//! Reader for per-parcel downscaled weather CSVs.
//!
//! Parcel archives are already on the Gregorian calendar and carry the
//! mesoclimate fields the conversion layer combines into engine units.

use crate::archive::error::ArchiveError;
use crate::archive::gridded::f64_column;
use chrono::NaiveDate;
use polars::prelude::*;
use std::path::PathBuf;

const DATE_FORMAT: &str = "%Y-%m-%d";

/// One calendar day of raw parcel fields (temperatures in deg C, rain in mm,
/// radiation fluxes in W/m2, wind in m/s, relative humidity in %).
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ParcelDay {
    pub date: NaiveDate,
    pub tasmin: Option<f64>,
    pub tasmax: Option<f64>,
    pub pr: Option<f64>,
    pub wspeed: Option<f64>,
    pub tasmean: Option<f64>,
    pub swdown: Option<f64>,
    pub lwdown: Option<f64>,
    pub hurs: Option<f64>,
}

/// Directory of parcel archive files, named `parcel_<id>_mesoclim.csv`.
#[derive(Debug, Clone)]
pub struct ParcelStore {
    dir: PathBuf,
}

impl ParcelStore {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        ParcelStore { dir: dir.into() }
    }

    pub fn dataset_path(&self, parcel_id: u64) -> PathBuf {
        self.dir.join(format!("parcel_{parcel_id}_mesoclim.csv"))
    }

    pub fn load(&self, parcel_id: u64) -> Result<Vec<ParcelDay>, ArchiveError> {
        let path = self.dataset_path(parcel_id);
        if !path.exists() {
            return Err(ArchiveError::SourceNotFound(path));
        }
        let df = CsvReadOptions::default()
            .with_has_header(true)
            .try_into_reader_with_file_path(Some(path.clone()))
            .map_err(|e| ArchiveError::Read {
                path: path.clone(),
                source: e,
            })?
            .finish()
            .map_err(|e| ArchiveError::Read {
                path: path.clone(),
                source: e,
            })?;

        let date = df
            .column("date")
            .map_err(|_| ArchiveError::MissingColumn {
                path: path.clone(),
                column: "date".to_string(),
            })?
            .str()
            .map_err(|e| ArchiveError::Read {
                path: path.clone(),
                source: e,
            })?
            .clone();
        let tasmin = f64_column(&df, &path, "tasmin")?;
        let tasmax = f64_column(&df, &path, "tasmax")?;
        let pr = f64_column(&df, &path, "pr")?;
        let wspeed = f64_column(&df, &path, "wspeed")?;
        let tasmean = f64_column(&df, &path, "tasmean")?;
        let swdown = f64_column(&df, &path, "swdown")?;
        let lwdown = f64_column(&df, &path, "lwdown")?;
        let hurs = f64_column(&df, &path, "hurs")?;

        let mut days = Vec::with_capacity(df.height());
        for row in 0..df.height() {
            let parsed = date
                .get(row)
                .and_then(|s| NaiveDate::parse_from_str(s, DATE_FORMAT).ok())
                .ok_or(ArchiveError::BadDate {
                    path: path.clone(),
                    row,
                })?;
            days.push(ParcelDay {
                date: parsed,
                tasmin: tasmin.get(row),
                tasmax: tasmax.get(row),
                pr: pr.get(row),
                wspeed: wspeed.get(row),
                tasmean: tasmean.get(row),
                swdown: swdown.get(row),
                lwdown: lwdown.get(row),
                hurs: hurs.get(row),
            });
        }
        days.sort_by_key(|d| d.date);
        Ok(days)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::TempDir;

    const HEADER: &str = "date,tasmin,tasmax,pr,wspeed,tasmean,swdown,lwdown,hurs";

    #[test]
    fn missing_parcel_file_is_reported() {
        let dir = TempDir::new().unwrap();
        let store = ParcelStore::new(dir.path());
        assert!(matches!(
            store.load(4021).unwrap_err(),
            ArchiveError::SourceNotFound(_)
        ));
    }

    #[test]
    fn loads_and_sorts_parcel_days() {
        let dir = TempDir::new().unwrap();
        let mut file = std::fs::File::create(dir.path().join("parcel_4021_mesoclim.csv")).unwrap();
        writeln!(file, "{HEADER}").unwrap();
        writeln!(file, "2021-03-02,4.0,12.0,1.5,3.0,8.0,110.0,300.0,82.0").unwrap();
        writeln!(file, "2021-03-01,3.0,11.0,0.0,2.5,7.0,100.0,295.0,85.0").unwrap();
        drop(file);

        let store = ParcelStore::new(dir.path());
        let days = store.load(4021).unwrap();
        assert_eq!(days.len(), 2);
        assert_eq!(days[0].date, NaiveDate::from_ymd_opt(2021, 3, 1).unwrap());
        assert_eq!(days[0].tasmin, Some(3.0));
        assert_eq!(days[1].hurs, Some(82.0));
    }

    #[test]
    fn unparseable_dates_are_an_error() {
        let dir = TempDir::new().unwrap();
        let mut file = std::fs::File::create(dir.path().join("parcel_7_mesoclim.csv")).unwrap();
        writeln!(file, "{HEADER}").unwrap();
        writeln!(file, "02/03/2021,4.0,12.0,1.5,3.0,8.0,110.0,300.0,82.0").unwrap();
        drop(file);

        let store = ParcelStore::new(dir.path());
        assert!(matches!(
            store.load(7).unwrap_err(),
            ArchiveError::BadDate { row: 0, .. }
        ));
    }
}
