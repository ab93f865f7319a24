use crate::core::EngineStats;
use serde::{Deserialize, Serialize};

/// Success envelope shared by all data endpoints
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ResponseModel<T> {
    pub status: String,
    pub data: T,
}

impl<T> ResponseModel<T> {
    pub fn success(data: T) -> Self {
        Self {
            status: "success".to_string(),
            data,
        }
    }
}

/// Health check response
#[derive(Debug, Clone, Serialize)]
pub struct HealthResponse {
    pub status: String,
    pub version: String,
    pub timestamp: chrono::DateTime<chrono::Utc>,
    pub stats: EngineStats,
}

/// Error response
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ErrorResponse {
    pub error: String,
    pub message: String,
    pub status_code: u16,
}
