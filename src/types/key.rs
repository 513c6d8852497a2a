use serde::{Deserialize, Serialize};
use std::fmt;

/// CHESS-SCAPE emission scenario of a gridded archive.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Scenario {
    Rcp26,
    Rcp45,
    Rcp60,
    Rcp85,
}

impl Scenario {
    /// Identifier used in archive file names and cache keys.
    pub fn as_str(self) -> &'static str {
        match self {
            Scenario::Rcp26 => "rcp26",
            Scenario::Rcp45 => "rcp45",
            Scenario::Rcp60 => "rcp60",
            Scenario::Rcp85 => "rcp85",
        }
    }
}

impl fmt::Display for Scenario {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Identity of a weather series; determines the cache file it lives in.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum SeriesKey {
    /// A 1 km grid tile of a gridded climate archive.
    Tile {
        /// Four-figure grid reference string, e.g. `"NJ0613"`.
        tile_1km: String,
        scenario: Scenario,
        ensemble: u8,
    },
    /// A parcel-scale downscaled archive.
    Parcel { id: u64 },
}

impl SeriesKey {
    /// Deterministic file stem for the cache entry of this key.
    pub fn cache_stem(&self) -> String {
        match self {
            SeriesKey::Tile {
                tile_1km,
                scenario,
                ensemble,
            } => format!("tile_{tile_1km}_{scenario}_{ensemble:02}"),
            SeriesKey::Parcel { id } => format!("parcel_{id}"),
        }
    }
}
