pub mod duration;
pub mod metrics;

use std::fmt;

use serde::{Deserialize, Serialize};
use ulid::Ulid;

pub use duration::format_duration;
pub use metrics::{DeviceMetrics, UploadAverage, distinct_ascending, uptime_percentage};

// Identifiers never change after creation, so `Box<str>` is enough and keeps
// the allocation tight.
type BoxStr = Box<str>;

/// Opaque identifier of a device in the fleet. Always trimmed and non-blank.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "String")]
pub struct DeviceId(BoxStr);

impl DeviceId {
    /// Trims surrounding whitespace. Blank input is not a device.
    pub fn parse(raw: &str) -> Option<Self> {
        let trimmed = raw.trim();
        if trimmed.is_empty() {
            return None;
        }

        Some(Self(trimmed.into()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl TryFrom<String> for DeviceId {
    type Error = BlankDeviceId;

    fn try_from(raw: String) -> Result<Self, Self::Error> {
        Self::parse(&raw).ok_or(BlankDeviceId)
    }
}

/// Returned when a device identifier is empty or whitespace only.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BlankDeviceId;

impl fmt::Display for BlankDeviceId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("device id must not be blank")
    }
}

impl std::error::Error for BlankDeviceId {}

impl fmt::Display for DeviceId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Unique identifier for a heartbeat event.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct HeartbeatId(pub Ulid);

/// Unique identifier for an upload stat event.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct UploadStatId(pub Ulid);

/// A liveness signal emitted by a device.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Heartbeat {
    pub id: HeartbeatId,
    /// Device that sent the heartbeat.
    pub device_id: DeviceId,
    /// Time the device reports having sent it.
    pub sent_at: jiff::Timestamp,
}

/// How long a device took to complete one upload.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UploadStat {
    pub id: UploadStatId,
    pub device_id: DeviceId,
    pub sent_at: jiff::Timestamp,
    /// Never negative.
    pub upload_time: jiff::SignedDuration,
}
