pub mod debug;
pub mod devices;
pub mod error;
pub mod models;

use axum::{
    Json, Router,
    extract::State,
    routing::{get, post},
};

use crate::AppState;
use crate::registry::{DeviceRegistry, HeartbeatRegistry, UploadStatRegistry};
use models::ServiceInfo;

pub fn router<D, H, U>() -> Router<AppState<D, H, U>>
where
    D: DeviceRegistry,
    H: HeartbeatRegistry,
    U: UploadStatRegistry,
{
    Router::new()
        // Device routes
        .route("/api/v1/devices", post(devices::create_device))
        .route(
            "/api/v1/devices/{device_id}/heartbeat",
            post(devices::receive_heartbeat),
        )
        .route(
            "/api/v1/devices/{device_id}/stats",
            get(devices::get_stats).post(devices::receive_stats),
        )
        // Debug routes
        .route("/debug/devices", get(debug::list_devices))
        .route("/debug/stats/{device_id}", get(debug::device_counts))
}

/// The complete HTTP application: API routes plus service info and health.
pub fn app<D, H, U>(state: AppState<D, H, U>) -> Router
where
    D: DeviceRegistry,
    H: HeartbeatRegistry,
    U: UploadStatRegistry,
{
    router()
        .route("/", get(service_info))
        .route("/health", get(health_handler))
        .with_state(state)
}

async fn service_info<D, H, U>(State(state): State<AppState<D, H, U>>) -> Json<ServiceInfo>
where
    D: DeviceRegistry,
    H: HeartbeatRegistry,
    U: UploadStatRegistry,
{
    Json(ServiceInfo {
        message: "Fleet Monitoring API".to_owned(),
        version: env!("CARGO_PKG_VERSION").to_owned(),
        database: state.backend.to_owned(),
    })
}

async fn health_handler() -> &'static str {
    "OK"
}
