use jiff::Timestamp;
use serde::{Deserialize, Serialize};

#[derive(Debug, Serialize, Deserialize)]
pub struct DeviceCreateRequest {
    pub device_id: String,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct DeviceResponse {
    pub device_id: String,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct HeartbeatRequest {
    pub sent_at: Timestamp,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct StatsRequest {
    pub sent_at: Timestamp,
    /// Nanoseconds. Optional here so a missing value is reported as a
    /// validation error rather than a parse failure.
    #[serde(default)]
    pub upload_time: Option<i64>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct StatsResponse {
    pub uptime: f64,
    /// Duration string such as "5m10s"
    pub avg_upload_time: String,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct ServiceInfo {
    pub message: String,
    pub version: String,
    pub database: String,
}

// Debug views
#[derive(Debug, Serialize, Deserialize)]
pub struct DeviceListResponse {
    pub devices: Vec<String>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct DeviceDebugResponse {
    pub device_id: String,
    pub heartbeat_count: usize,
    pub stats_count: usize,
}
