use crate::builder::error::BuildError;
use std::io;
use std::path::PathBuf;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum CacheError {
    #[error("failed to create cache directory {path}: {source}")]
    DirCreation {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("failed to encode cache entry: {0}")]
    Encode(#[from] Box<bincode::error::EncodeError>),

    #[error("failed to write cache entry {path}: {source}")]
    Write {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("failed to persist cache entry: {0}")]
    Persist(#[from] tempfile::PersistError),

    #[error(transparent)]
    Build(#[from] BuildError),
}
