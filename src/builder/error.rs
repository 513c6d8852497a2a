use crate::archive::error::ArchiveError;
use crate::calendar::CalendarError;
use crate::grid::error::BngError;
use crate::meteo::EtError;
use crate::types::series::SeriesError;
use chrono::NaiveDate;
use thiserror::Error;

/// Why a single source row could not be turned into a weather record.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum RowError {
    #[error("missing value for '{field}'")]
    MissingField { field: &'static str },

    #[error(transparent)]
    Et(#[from] EtError),
}

/// Diagnostic for a dropped row.
#[derive(Debug, Clone, PartialEq)]
pub struct RowDrop {
    pub date: NaiveDate,
    pub error: RowError,
}

#[derive(Debug, Error)]
pub enum BuildError {
    #[error(transparent)]
    Grid(#[from] BngError),

    #[error(transparent)]
    Archive(#[from] ArchiveError),

    #[error(transparent)]
    Calendar(#[from] CalendarError),

    #[error(transparent)]
    Assemble(#[from] SeriesError),

    #[error("source produced no usable rows")]
    Empty,

    #[error(
        "only {survived} of {total} rows usable, below the minimum fraction {min_fraction}"
    )]
    TooFewRows {
        survived: usize,
        total: usize,
        min_fraction: f64,
        dropped: Vec<RowDrop>,
    },
}
