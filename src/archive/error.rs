use polars::prelude::PolarsError;
use std::path::PathBuf;
use thiserror::Error;

/// Errors raised while reading the local climate archives.
#[derive(Debug, Error)]
pub enum ArchiveError {
    #[error("cannot find weather file at: {0}")]
    SourceNotFound(PathBuf),

    #[error("failed reading archive {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: PolarsError,
    },

    #[error("archive {path} has no column '{column}'")]
    MissingColumn { path: PathBuf, column: String },

    #[error("archive {path} row {row}: unreadable date")]
    BadDate { path: PathBuf, row: usize },

    #[error("no grid point with data within {radius} m of ({x}, {y})")]
    NoDataNearPoint { x: f64, y: f64, radius: f64 },
}
