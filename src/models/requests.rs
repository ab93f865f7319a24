use serde::{Deserialize, Serialize};
use validator::Validate;

/// Request to find nearby warehouses
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct NearbyRequest {
    #[validate(length(min = 1, max = 16))]
    #[serde(alias = "zipCode")]
    pub zip_code: String,
    /// Falls back to the configured default radius when absent
    #[validate(range(min = 0.0))]
    #[serde(default, alias = "radiusMiles")]
    pub radius_miles: Option<f64>,
}
