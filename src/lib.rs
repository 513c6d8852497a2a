mod archive;
mod builder;
mod cache;
mod calendar;
mod chess_scape;
mod config;
mod error;
mod grid;
mod meteo;
mod terrain;
mod types;

pub use chess_scape::*;
pub use error::ChessScapeError;

pub use config::{ConfigError, DataDirs, RunConfig, WeatherConfig};

pub use grid::bng::{BoundingBox, CellSize, GridRef, Precision};
pub use grid::error::BngError;
pub use grid::osgb::{osgb36_to_wgs84, wgs84_to_osgb36};

pub use calendar::{fill_date_gaps, normalize_to_gregorian, CalendarError, Day360};
pub use meteo::{rescale_windspeed, rh_to_vpress, EtError, EtFormula, EtInput, EtTerms};
pub use terrain::{FlatTerrain, TerrainError, TerrainLookup};

pub use types::key::{Scenario, SeriesKey};
pub use types::record::WeatherRecord;
pub use types::series::{SeriesError, WeatherSeries};
pub use types::site::SiteInfo;

pub use builder::error::{BuildError, RowDrop, RowError};
pub use builder::{BuildSettings, WeatherSeriesBuilder};

pub use archive::error::ArchiveError;
pub use archive::gridded::{GridArchive, GridCell, GriddedDay};
pub use archive::parcel::{ParcelDay, ParcelStore};

pub use cache::error::CacheError;
pub use cache::{CacheManager, CacheOutcome};
