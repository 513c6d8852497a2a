//! Reader for the gridded CHESS-SCAPE archives.
//!
//! One archive file covers a 10 km tile for a scenario/ensemble pair and
//! holds daily rows for every 1 km grid point in the tile, on the 360-day
//! model calendar. Coastal points may be present with empty data, so the
//! extraction falls back to the nearest populated point within 10 km.

use crate::archive::error::ArchiveError;
use crate::calendar::Day360;
use crate::types::key::Scenario;
use log::debug;
use ordered_float::OrderedFloat;
use polars::prelude::*;
use rstar::{PointDistance, RTree, RTreeObject, AABB};
use std::collections::HashMap;
use std::path::{Path, PathBuf};

/// Points further than this from the query are never substituted.
const FALLBACK_RADIUS_M: f64 = 10_000.0;

/// One model day of raw archive fields, in source units (temperatures in K,
/// precipitation as a flux, radiation and wind as daily means).
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct GriddedDay {
    pub day: Day360,
    pub tas: Option<f64>,
    pub tasmax: Option<f64>,
    pub tasmin: Option<f64>,
    pub pr: Option<f64>,
    pub rsds: Option<f64>,
    pub sfcwind: Option<f64>,
    pub hurs: Option<f64>,
}

impl GriddedDay {
    fn is_complete(&self) -> bool {
        [
            self.tas,
            self.tasmax,
            self.tasmin,
            self.pr,
            self.rsds,
            self.sfcwind,
            self.hurs,
        ]
        .iter()
        .all(|v| matches!(v, Some(x) if x.is_finite()))
    }
}

/// All days of one 1 km grid point.
#[derive(Debug, Clone, PartialEq)]
pub struct GridCell {
    pub x: f64,
    pub y: f64,
    pub days: Vec<GriddedDay>,
}

impl GridCell {
    /// A cell counts as populated only when every day has every field.
    pub fn is_complete(&self) -> bool {
        !self.days.is_empty() && self.days.iter().all(GriddedDay::is_complete)
    }
}

struct CellPoint {
    x: f64,
    y: f64,
    idx: usize,
}

impl RTreeObject for CellPoint {
    type Envelope = AABB<[f64; 2]>;

    fn envelope(&self) -> Self::Envelope {
        AABB::from_point([self.x, self.y])
    }
}

impl PointDistance for CellPoint {
    fn distance_2(&self, point: &[f64; 2]) -> f64 {
        let dx = self.x - point[0];
        let dy = self.y - point[1];
        dx * dx + dy * dy
    }
}

/// Directory of gridded archive files, named
/// `<10 km tile>_<scenario>_<ensemble>.csv`.
#[derive(Debug, Clone)]
pub struct GridArchive {
    dir: PathBuf,
}

impl GridArchive {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        GridArchive { dir: dir.into() }
    }

    pub fn dataset_path(&self, tile_10km: &str, scenario: Scenario, ensemble: u8) -> PathBuf {
        self.dir
            .join(format!("{tile_10km}_{scenario}_{ensemble:02}.csv"))
    }

    /// Reads the archive for a 10 km tile and returns the populated grid
    /// point nearest to projected coordinates `(x, y)`.
    pub fn extract_nearest(
        &self,
        tile_10km: &str,
        scenario: Scenario,
        ensemble: u8,
        x: f64,
        y: f64,
    ) -> Result<GridCell, ArchiveError> {
        let path = self.dataset_path(tile_10km, scenario, ensemble);
        if !path.exists() {
            return Err(ArchiveError::SourceNotFound(path));
        }
        let cells = read_cells(&path)?;

        let points: Vec<CellPoint> = cells
            .iter()
            .enumerate()
            .map(|(idx, cell)| CellPoint {
                x: cell.x,
                y: cell.y,
                idx,
            })
            .collect();
        let rtree = RTree::bulk_load(points);

        let nearest = rtree
            .nearest_neighbor(&[x, y])
            .ok_or(ArchiveError::NoDataNearPoint {
                x,
                y,
                radius: FALLBACK_RADIUS_M,
            })?;
        if cells[nearest.idx].is_complete() {
            return Ok(cells[nearest.idx].clone());
        }

        // The coordinate-nearest point is empty (coastline). Substitute the
        // nearest populated point within the fallback radius.
        debug!(
            "grid point ({}, {}) in {tile_10km} has empty data, searching within {FALLBACK_RADIUS_M} m",
            cells[nearest.idx].x, cells[nearest.idx].y
        );
        let fallback = rtree
            .nearest_neighbor_iter(&[x, y])
            .take_while(|p| p.distance_2(&[x, y]) <= FALLBACK_RADIUS_M * FALLBACK_RADIUS_M)
            .find(|p| cells[p.idx].is_complete())
            .map(|p| cells[p.idx].clone());
        fallback.ok_or(ArchiveError::NoDataNearPoint {
            x,
            y,
            radius: FALLBACK_RADIUS_M,
        })
    }
}

fn read_cells(path: &Path) -> Result<Vec<GridCell>, ArchiveError> {
    let df = CsvReadOptions::default()
        .with_has_header(true)
        .try_into_reader_with_file_path(Some(path.to_path_buf()))
        .map_err(|e| ArchiveError::Read {
            path: path.to_path_buf(),
            source: e,
        })?
        .finish()
        .map_err(|e| ArchiveError::Read {
            path: path.to_path_buf(),
            source: e,
        })?;

    let x = f64_column(&df, path, "x")?;
    let y = f64_column(&df, path, "y")?;
    let year = f64_column(&df, path, "year")?;
    let day = f64_column(&df, path, "day")?;
    let tas = f64_column(&df, path, "tas")?;
    let tasmax = f64_column(&df, path, "tasmax")?;
    let tasmin = f64_column(&df, path, "tasmin")?;
    let pr = f64_column(&df, path, "pr")?;
    let rsds = f64_column(&df, path, "rsds")?;
    let sfcwind = f64_column(&df, path, "sfcwind")?;
    let hurs = f64_column(&df, path, "hurs")?;

    let mut by_point: HashMap<(OrderedFloat<f64>, OrderedFloat<f64>), Vec<GriddedDay>> =
        HashMap::new();
    for row in 0..df.height() {
        let (Some(px), Some(py), Some(row_year), Some(row_day)) =
            (x.get(row), y.get(row), year.get(row), day.get(row))
        else {
            return Err(ArchiveError::BadDate {
                path: path.to_path_buf(),
                row,
            });
        };
        let day360 = Day360::new(row_year as i32, row_day as u32).map_err(|_| {
            ArchiveError::BadDate {
                path: path.to_path_buf(),
                row,
            }
        })?;
        by_point
            .entry((OrderedFloat(px), OrderedFloat(py)))
            .or_default()
            .push(GriddedDay {
                day: day360,
                tas: tas.get(row),
                tasmax: tasmax.get(row),
                tasmin: tasmin.get(row),
                pr: pr.get(row),
                rsds: rsds.get(row),
                sfcwind: sfcwind.get(row),
                hurs: hurs.get(row),
            });
    }

    Ok(by_point
        .into_iter()
        .map(|((px, py), mut days)| {
            days.sort_by_key(|d| d.day);
            GridCell {
                x: px.into_inner(),
                y: py.into_inner(),
                days,
            }
        })
        .collect())
}

pub(crate) fn f64_column(
    df: &DataFrame,
    path: &Path,
    name: &str,
) -> Result<Float64Chunked, ArchiveError> {
    let column = df.column(name).map_err(|_| ArchiveError::MissingColumn {
        path: path.to_path_buf(),
        column: name.to_string(),
    })?;
    let cast = column
        .cast(&DataType::Float64)
        .map_err(|e| ArchiveError::Read {
            path: path.to_path_buf(),
            source: e,
        })?;
    let ca = cast.f64().map_err(|e| ArchiveError::Read {
        path: path.to_path_buf(),
        source: e,
    })?;
    Ok(ca.clone())
}
