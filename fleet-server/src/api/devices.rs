use axum::{
    Json,
    extract::{Path, State, rejection::JsonRejection},
    http::StatusCode,
};
use fleet_core::DeviceId;

use crate::AppState;
use crate::registry::{DeviceRegistry, HeartbeatRegistry, UploadStatRegistry};

use super::error::ApiError;
use super::models::{
    DeviceCreateRequest, DeviceResponse, HeartbeatRequest, StatsRequest, StatsResponse,
};

// A blank path id can never name a registered device.
pub(super) fn parse_device_id(raw: &str) -> Result<DeviceId, ApiError> {
    DeviceId::parse(raw).ok_or_else(|| ApiError::NotFound(format!("Device {raw} not found")))
}

// Register a single device
pub async fn create_device<D, H, U>(
    State(state): State<AppState<D, H, U>>,
    payload: Result<Json<DeviceCreateRequest>, JsonRejection>,
) -> Result<(StatusCode, Json<DeviceResponse>), ApiError>
where
    D: DeviceRegistry,
    H: HeartbeatRegistry,
    U: UploadStatRegistry,
{
    let Json(request) = payload?;
    let id = state.telemetry.register_device(&request.device_id).await?;

    Ok((
        StatusCode::CREATED,
        Json(DeviceResponse {
            device_id: id.to_string(),
        }),
    ))
}

// Receive a heartbeat from a device
pub async fn receive_heartbeat<D, H, U>(
    Path(device_id): Path<String>,
    State(state): State<AppState<D, H, U>>,
    payload: Result<Json<HeartbeatRequest>, JsonRejection>,
) -> Result<StatusCode, ApiError>
where
    D: DeviceRegistry,
    H: HeartbeatRegistry,
    U: UploadStatRegistry,
{
    // An unknown device is reported ahead of a malformed body. The record
    // call below looks the device up again, since it is gated on its own.
    let device_id = parse_device_id(&device_id)?;
    state.telemetry.ensure_device(&device_id).await?;

    let Json(request) = payload?;
    state
        .telemetry
        .record_heartbeat(&device_id, request.sent_at)
        .await?;

    Ok(StatusCode::NO_CONTENT)
}

// Receive an upload stat from a device
pub async fn receive_stats<D, H, U>(
    Path(device_id): Path<String>,
    State(state): State<AppState<D, H, U>>,
    payload: Result<Json<StatsRequest>, JsonRejection>,
) -> Result<StatusCode, ApiError>
where
    D: DeviceRegistry,
    H: HeartbeatRegistry,
    U: UploadStatRegistry,
{
    // Same ordering as heartbeats: 404 before 400.
    let device_id = parse_device_id(&device_id)?;
    state.telemetry.ensure_device(&device_id).await?;

    let Json(request) = payload?;
    state
        .telemetry
        .record_upload_stat(&device_id, request.sent_at, request.upload_time)
        .await?;

    Ok(StatusCode::NO_CONTENT)
}

// Uptime and average upload time of a device
pub async fn get_stats<D, H, U>(
    Path(device_id): Path<String>,
    State(state): State<AppState<D, H, U>>,
) -> Result<Json<StatsResponse>, ApiError>
where
    D: DeviceRegistry,
    H: HeartbeatRegistry,
    U: UploadStatRegistry,
{
    let device_id = parse_device_id(&device_id)?;
    let metrics = state.telemetry.device_stats(&device_id).await?;

    Ok(Json(StatsResponse {
        uptime: metrics.uptime,
        avg_upload_time: metrics.avg_upload_time.to_string(),
    }))
}
