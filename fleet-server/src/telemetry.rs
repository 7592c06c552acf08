//! Ingestion and queries, with the registry as gatekeeper: nothing is
//! recorded or reported for a device the registry does not know.

use fleet_core::{
    DeviceId, DeviceMetrics, Heartbeat, HeartbeatId, UploadStat, UploadStatId,
};
use jiff::{SignedDuration, Timestamp};
use tracing::{debug, info};
use ulid::Ulid;

use crate::FleetError;
use crate::metrics::MetricsEngine;
use crate::registry::{DeviceRegistry, HeartbeatRegistry, UploadStatRegistry};

/// Raw event counts for one device.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DeviceCounts {
    pub heartbeats: usize,
    pub upload_stats: usize,
}

#[derive(Clone)]
pub struct Telemetry<D, H, U> {
    devices: D,
    heartbeats: H,
    upload_stats: U,
    metrics: MetricsEngine<H, U>,
}

impl<D, H, U> Telemetry<D, H, U>
where
    D: DeviceRegistry,
    H: HeartbeatRegistry,
    U: UploadStatRegistry,
{
    pub fn new(devices: D, heartbeats: H, upload_stats: U) -> Self {
        Self {
            metrics: MetricsEngine::new(heartbeats.clone(), upload_stats.clone()),
            devices,
            heartbeats,
            upload_stats,
        }
    }

    pub fn device_registry(&self) -> &D {
        &self.devices
    }

    pub fn metrics(&self) -> &MetricsEngine<H, U> {
        &self.metrics
    }

    /// Registers a single device outside of reconciliation.
    pub async fn register_device(&self, raw_id: &str) -> Result<DeviceId, FleetError> {
        let id = DeviceId::parse(raw_id)
            .ok_or_else(|| FleetError::Validation("device_id must not be blank".to_owned()))?;

        let created = self
            .devices
            .register(id.clone())
            .await
            .map_err(FleetError::persistence)?;

        if !created {
            return Err(FleetError::AlreadyExists(id));
        }

        info!(device_id = %id, "device registered");
        Ok(id)
    }

    pub async fn ensure_device(&self, device_id: &DeviceId) -> Result<(), FleetError> {
        let exists = self
            .devices
            .exists(device_id)
            .await
            .map_err(FleetError::persistence)?;

        if !exists {
            return Err(FleetError::NotFound(device_id.clone()));
        }

        Ok(())
    }

    pub async fn record_heartbeat(
        &self,
        device_id: &DeviceId,
        sent_at: Timestamp,
    ) -> Result<(), FleetError> {
        self.ensure_device(device_id).await?;
        check_sent_at(sent_at)?;

        self.heartbeats
            .store(Heartbeat {
                id: HeartbeatId(Ulid::new()),
                device_id: device_id.clone(),
                sent_at,
            })
            .await
            .map_err(FleetError::persistence)?;

        debug!(%device_id, %sent_at, "heartbeat recorded");
        Ok(())
    }

    /// `upload_time` is in nanoseconds and must be present and non-negative.
    pub async fn record_upload_stat(
        &self,
        device_id: &DeviceId,
        sent_at: Timestamp,
        upload_time: Option<i64>,
    ) -> Result<(), FleetError> {
        self.ensure_device(device_id).await?;

        let upload_time = match upload_time {
            None => return Err(FleetError::Validation("upload_time is required".to_owned())),
            Some(nanos) if nanos < 0 => {
                return Err(FleetError::Validation(format!(
                    "upload_time must not be negative, got {nanos}"
                )));
            }
            Some(nanos) => SignedDuration::from_nanos(nanos),
        };
        check_sent_at(sent_at)?;

        self.upload_stats
            .store(UploadStat {
                id: UploadStatId(Ulid::new()),
                device_id: device_id.clone(),
                sent_at,
                upload_time,
            })
            .await
            .map_err(FleetError::persistence)?;

        debug!(%device_id, %sent_at, ?upload_time, "upload stat recorded");
        Ok(())
    }

    pub async fn device_stats(&self, device_id: &DeviceId) -> Result<DeviceMetrics, FleetError> {
        self.ensure_device(device_id).await?;
        self.metrics.device_metrics(device_id).await
    }

    /// All registered devices, sorted.
    pub async fn devices(&self) -> Result<Vec<DeviceId>, FleetError> {
        let mut devices = self.devices.list().await.map_err(FleetError::persistence)?;
        devices.sort();
        Ok(devices)
    }

    /// Raw record counts. Unknown devices simply count zero.
    pub async fn device_counts(&self, device_id: &DeviceId) -> Result<DeviceCounts, FleetError> {
        let heartbeats = self
            .heartbeats
            .count(device_id)
            .await
            .map_err(FleetError::persistence)?;
        let upload_stats = self
            .upload_stats
            .count(device_id)
            .await
            .map_err(FleetError::persistence)?;

        Ok(DeviceCounts {
            heartbeats,
            upload_stats,
        })
    }
}

/// Event times are kept as signed 64-bit nanoseconds since the Unix epoch,
/// roughly the years 1677 to 2262.
fn check_sent_at(sent_at: Timestamp) -> Result<(), FleetError> {
    if i64::try_from(sent_at.as_nanosecond()).is_err() {
        return Err(FleetError::Validation(format!(
            "sent_at {sent_at} is outside the supported range"
        )));
    }

    Ok(())
}
