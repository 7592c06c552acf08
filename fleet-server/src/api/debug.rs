use axum::{
    Json,
    extract::{Path, State},
};

use crate::AppState;
use crate::registry::{DeviceRegistry, HeartbeatRegistry, UploadStatRegistry};

use super::devices::parse_device_id;
use super::error::ApiError;
use super::models::{DeviceDebugResponse, DeviceListResponse};

pub async fn list_devices<D, H, U>(
    State(state): State<AppState<D, H, U>>,
) -> Result<Json<DeviceListResponse>, ApiError>
where
    D: DeviceRegistry,
    H: HeartbeatRegistry,
    U: UploadStatRegistry,
{
    let devices = state.telemetry.devices().await?;

    Ok(Json(DeviceListResponse {
        devices: devices.iter().map(ToString::to_string).collect(),
    }))
}

// Raw record counts, whether or not the device is registered
pub async fn device_counts<D, H, U>(
    Path(device_id): Path<String>,
    State(state): State<AppState<D, H, U>>,
) -> Result<Json<DeviceDebugResponse>, ApiError>
where
    D: DeviceRegistry,
    H: HeartbeatRegistry,
    U: UploadStatRegistry,
{
    let id = parse_device_id(&device_id)?;
    let counts = state.telemetry.device_counts(&id).await?;

    Ok(Json(DeviceDebugResponse {
        device_id: id.to_string(),
        heartbeat_count: counts.heartbeats,
        stats_count: counts.upload_stats,
    }))
}
