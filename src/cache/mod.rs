//! Staleness-aware persistence of finished weather series.
//!
//! Entries are bincode files keyed by [`SeriesKey`]. A lookup walks
//! missing -> build and persist, fresh -> return as-is, stale -> rebuild and
//! replace; when a rebuild fails the stale entry is served instead of
//! failing the caller. Unreadable or schema-mismatched files count as
//! missing. Writes go through a temp file and an atomic rename.

pub mod error;

use crate::builder::error::BuildError;
use crate::cache::error::CacheError;
use crate::types::key::SeriesKey;
use crate::types::series::WeatherSeries;
use bincode::config::{Configuration, Fixint, LittleEndian};
use chrono::{DateTime, Duration, Utc};
use log::{debug, warn};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::io::Write;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex, PoisonError};
use tempfile::NamedTempFile;

const SCHEMA_VERSION: u32 = 1;
const BINCODE_CONFIG: Configuration<LittleEndian, Fixint> =
    bincode::config::standard().with_fixed_int_encoding();

#[derive(Debug, Clone, Serialize, Deserialize)]
struct CacheEntry {
    schema_version: u32,
    key: SeriesKey,
    built_at: DateTime<Utc>,
    series: WeatherSeries,
}

/// How a lookup was satisfied.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CacheOutcome {
    /// Entry was younger than the staleness bound.
    Fresh,
    /// No usable entry existed; the series was built and persisted.
    Built,
    /// A stale entry was replaced by a successful rebuild.
    Rebuilt,
    /// Rebuilding failed; the stale entry was served instead.
    Degraded,
}

pub struct CacheManager {
    cache_dir: PathBuf,
    locks: Mutex<HashMap<String, Arc<Mutex<()>>>>,
}

impl CacheManager {
    pub fn new(cache_dir: impl Into<PathBuf>) -> Result<Self, CacheError> {
        let cache_dir = cache_dir.into();
        std::fs::create_dir_all(&cache_dir).map_err(|source| CacheError::DirCreation {
            path: cache_dir.clone(),
            source,
        })?;
        Ok(CacheManager {
            cache_dir,
            locks: Mutex::new(HashMap::new()),
        })
    }

    pub fn entry_path(&self, key: &SeriesKey) -> PathBuf {
        self.cache_dir.join(format!("{}.cache", key.cache_stem()))
    }

    /// Returns the series for `key`, rebuilding through `rebuild` when no
    /// entry exists or the entry is older than `max_age`. At most one build
    /// per key runs at a time within the process.
    pub fn get(
        &self,
        key: &SeriesKey,
        max_age: Duration,
        rebuild: impl FnOnce() -> Result<WeatherSeries, BuildError>,
    ) -> Result<(WeatherSeries, CacheOutcome), CacheError> {
        let key_lock = {
            let mut locks = self.locks.lock().unwrap_or_else(PoisonError::into_inner);
            Arc::clone(locks.entry(key.cache_stem()).or_default())
        };
        let _guard = key_lock.lock().unwrap_or_else(PoisonError::into_inner);

        let path = self.entry_path(key);
        match self.load_entry(&path, key) {
            Some(entry) if Utc::now() - entry.built_at < max_age => {
                debug!("serving fresh cache entry {}", path.display());
                Ok((entry.series, CacheOutcome::Fresh))
            }
            Some(entry) => match rebuild() {
                Ok(series) => {
                    self.store_entry(&path, key, &series)?;
                    Ok((series, CacheOutcome::Rebuilt))
                }
                Err(err) => {
                    warn!(
                        "rebuild for '{}' failed ({err}), serving stale entry from {}",
                        key.cache_stem(),
                        entry.built_at
                    );
                    Ok((entry.series, CacheOutcome::Degraded))
                }
            },
            None => {
                let series = rebuild()?;
                self.store_entry(&path, key, &series)?;
                Ok((series, CacheOutcome::Built))
            }
        }
    }

    /// Reads an entry, treating unreadable, undecodable or mismatched files
    /// as missing.
    fn load_entry(&self, path: &Path, key: &SeriesKey) -> Option<CacheEntry> {
        if !path.exists() {
            return None;
        }
        let bytes = match std::fs::read(path) {
            Ok(bytes) => bytes,
            Err(err) => {
                warn!("cannot read cache entry {}: {err}", path.display());
                return None;
            }
        };
        let entry: CacheEntry =
            match bincode::serde::decode_from_slice(&bytes, BINCODE_CONFIG) {
                Ok((entry, _)) => entry,
                Err(err) => {
                    warn!("corrupt cache entry {}: {err}", path.display());
                    return None;
                }
            };
        if entry.schema_version != SCHEMA_VERSION || &entry.key != key {
            warn!(
                "cache entry {} does not match (schema {}, key '{}')",
                path.display(),
                entry.schema_version,
                entry.key.cache_stem()
            );
            return None;
        }
        Some(entry)
    }

    fn store_entry(
        &self,
        path: &Path,
        key: &SeriesKey,
        series: &WeatherSeries,
    ) -> Result<(), CacheError> {
        let entry = CacheEntry {
            schema_version: SCHEMA_VERSION,
            key: key.clone(),
            built_at: Utc::now(),
            series: series.clone(),
        };
        let bytes = bincode::serde::encode_to_vec(&entry, BINCODE_CONFIG)
            .map_err(Box::new)?;
        let mut temp_file =
            NamedTempFile::new_in(&self.cache_dir).map_err(|source| CacheError::Write {
                path: path.to_path_buf(),
                source,
            })?;
        temp_file
            .write_all(&bytes)
            .map_err(|source| CacheError::Write {
                path: path.to_path_buf(),
                source,
            })?;
        temp_file.persist(path)?;
        debug!("persisted cache entry {}", path.display());
        Ok(())
    }
}
