//! Persistence boundary: the device registry and the per-device event stores.
//!
//! Implementations serialize their own writes. Reads return whatever has been
//! committed at the time of the call.

pub mod memory;
pub mod sqlite;

use async_trait::async_trait;
use fleet_core::{DeviceId, Heartbeat, UploadStat};
use jiff::Timestamp;

/// Set of known device identifiers.
#[async_trait]
pub trait DeviceRegistry: Clone + Send + Sync + 'static {
    type Error: std::error::Error + Send + Sync + 'static;

    async fn exists(&self, id: &DeviceId) -> Result<bool, Self::Error>;

    /// Adds a single device. Returns `false` if it was already registered.
    async fn register(&self, id: DeviceId) -> Result<bool, Self::Error>;

    /// Adds all devices or none of them.
    async fn batch_register(&self, ids: Vec<DeviceId>) -> Result<(), Self::Error>;

    async fn list(&self) -> Result<Vec<DeviceId>, Self::Error>;

    async fn count(&self) -> Result<usize, Self::Error>;
}

/// Append-only heartbeat history.
#[async_trait]
pub trait HeartbeatRegistry: Clone + Send + Sync + 'static {
    type Error: std::error::Error + Send + Sync + 'static;

    async fn store(&self, heartbeat: Heartbeat) -> Result<(), Self::Error>;

    /// Heartbeat times of a device, ascending, with duplicates collapsed.
    async fn distinct_timestamps(&self, device_id: &DeviceId)
    -> Result<Vec<Timestamp>, Self::Error>;

    /// Number of stored heartbeat records, duplicates included.
    async fn count(&self, device_id: &DeviceId) -> Result<usize, Self::Error>;
}

/// Append-only upload time history.
#[async_trait]
pub trait UploadStatRegistry: Clone + Send + Sync + 'static {
    type Error: std::error::Error + Send + Sync + 'static;

    async fn store(&self, stat: UploadStat) -> Result<(), Self::Error>;

    /// Mean upload time in nanoseconds, `None` when the device has no samples.
    async fn average_upload_time(&self, device_id: &DeviceId) -> Result<Option<f64>, Self::Error>;

    async fn count(&self, device_id: &DeviceId) -> Result<usize, Self::Error>;
}
