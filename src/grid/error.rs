use thiserror::Error;

/// Errors raised by the OS grid reference codec.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum BngError {
    #[error("coordinate location outside the UK National Grid: ({lon}, {lat})")]
    OutOfRegion { lon: f64, lat: f64 },

    #[error("projected coordinates outside the UK National Grid: ({x} m, {y} m)")]
    OutOfGrid { x: f64, y: f64 },

    #[error("valid precisions are 4, 6, 8 or 10 figures, got {0}")]
    InvalidPrecision(usize),

    #[error("malformed grid reference '{0}': expected two region letters followed by 4, 6, 8 or 10 digits")]
    Malformed(String),

    #[error("unknown 100 km grid square code '{0}'")]
    UnknownRegion(String),
}
