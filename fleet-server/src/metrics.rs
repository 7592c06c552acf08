use fleet_core::{DeviceId, DeviceMetrics, UploadAverage, uptime_percentage};
use tracing::debug;

use crate::FleetError;
use crate::registry::{HeartbeatRegistry, UploadStatRegistry};

/// Computes per-device statistics from the full event history on every call.
#[derive(Clone)]
pub struct MetricsEngine<H, U> {
    heartbeats: H,
    upload_stats: U,
}

impl<H, U> MetricsEngine<H, U>
where
    H: HeartbeatRegistry,
    U: UploadStatRegistry,
{
    pub fn new(heartbeats: H, upload_stats: U) -> Self {
        Self {
            heartbeats,
            upload_stats,
        }
    }

    pub async fn uptime(&self, device_id: &DeviceId) -> Result<f64, FleetError> {
        let timestamps = self
            .heartbeats
            .distinct_timestamps(device_id)
            .await
            .map_err(FleetError::persistence)?;

        let uptime = uptime_percentage(&timestamps);
        debug!(%device_id, heartbeats = timestamps.len(), uptime, "computed uptime");

        Ok(uptime)
    }

    pub async fn average_upload_time(
        &self,
        device_id: &DeviceId,
    ) -> Result<UploadAverage, FleetError> {
        let mean = self
            .upload_stats
            .average_upload_time(device_id)
            .await
            .map_err(FleetError::persistence)?;

        Ok(UploadAverage::from_mean(mean))
    }

    pub async fn device_metrics(&self, device_id: &DeviceId) -> Result<DeviceMetrics, FleetError> {
        Ok(DeviceMetrics {
            uptime: self.uptime(device_id).await?,
            avg_upload_time: self.average_upload_time(device_id).await?,
        })
    }
}

#[cfg(test)]
mod tests {
    use fleet_core::{
        DeviceId, Heartbeat, HeartbeatId, UploadAverage, UploadStat, UploadStatId,
    };
    use jiff::{SignedDuration, Timestamp};
    use ulid::Ulid;

    use crate::registry::memory::{InMemoryHeartbeatRegistry, InMemoryUploadStatRegistry};
    use crate::registry::{HeartbeatRegistry, UploadStatRegistry};

    use super::MetricsEngine;

    struct Fixture {
        heartbeats: InMemoryHeartbeatRegistry,
        upload_stats: InMemoryUploadStatRegistry,
        engine: MetricsEngine<InMemoryHeartbeatRegistry, InMemoryUploadStatRegistry>,
        device: DeviceId,
    }

    fn fixture() -> Fixture {
        let heartbeats = InMemoryHeartbeatRegistry::new();
        let upload_stats = InMemoryUploadStatRegistry::new();
        Fixture {
            engine: MetricsEngine::new(heartbeats.clone(), upload_stats.clone()),
            heartbeats,
            upload_stats,
            device: DeviceId::parse("60-6b-44-84-dc-64").unwrap(),
        }
    }

    impl Fixture {
        async fn heartbeat_at_minute(&self, minute: i64) {
            self.heartbeats
                .store(Heartbeat {
                    id: HeartbeatId(Ulid::new()),
                    device_id: self.device.clone(),
                    sent_at: Timestamp::from_second(1_700_000_000 + minute * 60).unwrap(),
                })
                .await
                .unwrap();
        }

        async fn upload(&self, nanos: i64) {
            self.upload_stats
                .store(UploadStat {
                    id: UploadStatId(Ulid::new()),
                    device_id: self.device.clone(),
                    sent_at: Timestamp::now(),
                    upload_time: SignedDuration::from_nanos(nanos),
                })
                .await
                .unwrap();
        }
    }

    #[tokio::test]
    async fn test_empty_history() {
        let f = fixture();

        let metrics = f.engine.device_metrics(&f.device).await.unwrap();

        assert_eq!(metrics.uptime, 0.0);
        assert_eq!(metrics.avg_upload_time, UploadAverage::NoSamples);
        assert_eq!(metrics.avg_upload_time.to_string(), "0s");
    }

    #[tokio::test]
    async fn test_duplicate_heartbeats_are_counted_once() {
        let f = fixture();
        f.heartbeat_at_minute(0).await;
        f.heartbeat_at_minute(0).await;

        // a single distinct instant carries no window
        assert_eq!(f.engine.uptime(&f.device).await.unwrap(), 0.0);

        f.heartbeat_at_minute(10).await;
        f.heartbeat_at_minute(10).await;
        assert_eq!(f.engine.uptime(&f.device).await.unwrap(), 20.0);
    }

    #[tokio::test]
    async fn test_dense_heartbeats_are_clamped() {
        let f = fixture();
        for minute in 0..=5 {
            f.heartbeat_at_minute(minute).await;
        }

        assert_eq!(f.engine.uptime(&f.device).await.unwrap(), 100.0);
    }

    #[tokio::test]
    async fn test_average_upload_time() {
        let f = fixture();
        f.upload(1_000_000_000).await;
        f.upload(2_000_000_000).await;

        let average = f.engine.average_upload_time(&f.device).await.unwrap();

        assert_eq!(average, UploadAverage::Mean(SignedDuration::from_millis(1500)));
        assert_eq!(average.to_string(), "1.5s");
    }

    #[tokio::test]
    async fn test_zero_valued_uploads_are_not_missing_data() {
        let f = fixture();
        f.upload(0).await;
        f.upload(0).await;

        let average = f.engine.average_upload_time(&f.device).await.unwrap();

        assert_eq!(average, UploadAverage::Mean(SignedDuration::ZERO));
        assert_ne!(average, UploadAverage::NoSamples);
        assert_eq!(average.to_string(), "0s");
    }
}
