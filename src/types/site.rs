use serde::{Deserialize, Serialize};

/// Static description of the site a series was built for.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SiteInfo {
    pub longitude: f64,
    pub latitude: f64,
    /// Metres above sea level.
    pub elevation: f64,
    pub angst_a: f64,
    pub angst_b: f64,
}
