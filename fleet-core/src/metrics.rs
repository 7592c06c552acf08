//! Per-device statistics derived from raw event streams.
//!
//! Nothing here touches storage: callers read the event history and hand the
//! values in, and every query recomputes from scratch.

use std::collections::BTreeSet;
use std::fmt;

use jiff::{SignedDuration, Timestamp};

use crate::duration::format_duration;

/// Uptime is never reported above this value, however dense the heartbeats.
pub const MAX_UPTIME: f64 = 100.0;

/// Uptime heuristic over a device's heartbeat history.
///
/// `timestamps` must be ascending and distinct, as returned by the event
/// store. Coverage is measured against an ideal of one heartbeat per minute
/// across the observed window:
///
/// - fewer than two heartbeats carry no window and yield `0.0`;
/// - a window that collapses to zero yields `100.0`;
/// - otherwise `count / window_minutes * 100`, clamped to [`MAX_UPTIME`].
pub fn uptime_percentage(timestamps: &[Timestamp]) -> f64 {
    let (Some(first), Some(last)) = (timestamps.first(), timestamps.last()) else {
        return 0.0;
    };

    if timestamps.len() < 2 {
        return 0.0;
    }

    let window_minutes = last.duration_since(*first).as_secs_f64() / 60.0;
    if window_minutes == 0.0 {
        return MAX_UPTIME;
    }

    let uptime = (timestamps.len() as f64 / window_minutes) * 100.0;
    uptime.min(MAX_UPTIME)
}

/// Sorts and deduplicates heartbeat timestamps.
pub fn distinct_ascending(timestamps: impl IntoIterator<Item = Timestamp>) -> Vec<Timestamp> {
    timestamps
        .into_iter()
        .collect::<BTreeSet<_>>()
        .into_iter()
        .collect()
}

/// Mean upload time of a device.
///
/// `NoSamples` and `Mean(SignedDuration::ZERO)` both render as `"0s"` but are
/// different facts: the first means nothing was ever reported.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UploadAverage {
    NoSamples,
    Mean(SignedDuration),
}

impl UploadAverage {
    /// Builds the average from the store's mean in nanoseconds, truncating any
    /// sub-nanosecond remainder.
    pub fn from_mean(mean_nanos: Option<f64>) -> Self {
        match mean_nanos {
            Some(mean) => UploadAverage::Mean(SignedDuration::from_nanos(mean as i64)),
            None => UploadAverage::NoSamples,
        }
    }

    pub fn mean(&self) -> Option<SignedDuration> {
        match self {
            UploadAverage::NoSamples => None,
            UploadAverage::Mean(mean) => Some(*mean),
        }
    }
}

impl fmt::Display for UploadAverage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            UploadAverage::NoSamples => f.write_str("0s"),
            UploadAverage::Mean(mean) => f.write_str(&format_duration(*mean)),
        }
    }
}

/// Statistics reported for one device.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DeviceMetrics {
    /// Heartbeat coverage in percent, 0 to 100.
    pub uptime: f64,
    pub avg_upload_time: UploadAverage,
}
