use serde::{Deserialize, Serialize};

// GET /health
#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct HealthResponse {
    pub status: String,
    pub app: String,
}

// GET /time
#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct TimeResponse {
    pub server_time: String, // RFC 3339, second precision
    pub timezone: String,
    pub uptime_sec: u64,
}
