use crate::builder::error::BuildError;
use crate::cache::error::CacheError;
use crate::config::ConfigError;
use crate::grid::error::BngError;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ChessScapeError {
    #[error(transparent)]
    Grid(#[from] BngError),

    #[error(transparent)]
    Build(#[from] BuildError),

    #[error(transparent)]
    Cache(#[from] CacheError),

    #[error(transparent)]
    Config(#[from] ConfigError),
}
