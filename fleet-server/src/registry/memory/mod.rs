mod device;
mod heartbeat;
mod upload_stat;

pub use device::InMemoryDeviceRegistry;
pub use heartbeat::InMemoryHeartbeatRegistry;
pub use upload_stat::InMemoryUploadStatRegistry;

use fleet_core::DeviceId;

#[derive(Debug, thiserror::Error)]
pub enum InMemoryError {
    #[error("device {0} already registered")]
    Duplicate(DeviceId),
}

#[cfg(test)]
mod tests {
    use fleet_core::{DeviceId, Heartbeat, HeartbeatId, UploadStat, UploadStatId};
    use jiff::{SignedDuration, Timestamp};
    use ulid::Ulid;

    use crate::registry::{DeviceRegistry, HeartbeatRegistry, UploadStatRegistry};

    use super::{
        InMemoryDeviceRegistry, InMemoryError, InMemoryHeartbeatRegistry,
        InMemoryUploadStatRegistry,
    };

    fn device(id: &str) -> DeviceId {
        DeviceId::parse(id).unwrap()
    }

    fn heartbeat(device_id: &str, second: i64) -> Heartbeat {
        Heartbeat {
            id: HeartbeatId(Ulid::new()),
            device_id: device(device_id),
            sent_at: Timestamp::from_second(second).unwrap(),
        }
    }

    fn upload_stat(device_id: &str, nanos: i64) -> UploadStat {
        UploadStat {
            id: UploadStatId(Ulid::new()),
            device_id: device(device_id),
            sent_at: Timestamp::now(),
            upload_time: SignedDuration::from_nanos(nanos),
        }
    }

    #[tokio::test]
    async fn test_register_and_exists() {
        let registry = InMemoryDeviceRegistry::new();

        assert!(!registry.exists(&device("a")).await.unwrap());
        assert!(registry.register(device("a")).await.unwrap());
        assert!(registry.exists(&device("a")).await.unwrap());

        // second registration is refused, not overwritten
        assert!(!registry.register(device("a")).await.unwrap());
        assert_eq!(registry.count().await.unwrap(), 1);
    }

    #[tokio::test]
    async fn test_batch_register_is_all_or_nothing() {
        let registry = InMemoryDeviceRegistry::new();
        registry.register(device("b")).await.unwrap();

        let result = registry
            .batch_register(vec![device("a"), device("b"), device("c")])
            .await;

        assert!(matches!(result, Err(InMemoryError::Duplicate(id)) if id == device("b")));
        assert_eq!(registry.count().await.unwrap(), 1);
        assert!(!registry.exists(&device("a")).await.unwrap());
    }

    #[tokio::test]
    async fn test_batch_register_and_list() {
        let registry = InMemoryDeviceRegistry::new();

        registry
            .batch_register(vec![device("a"), device("b")])
            .await
            .unwrap();

        let mut listed = registry.list().await.unwrap();
        listed.sort();
        assert_eq!(listed, vec![device("a"), device("b")]);
    }

    #[tokio::test]
    async fn test_distinct_timestamps_sorted_and_deduplicated() {
        let registry = InMemoryHeartbeatRegistry::new();

        for second in [300, 60, 60, 180] {
            registry.store(heartbeat("a", second)).await.unwrap();
        }
        registry.store(heartbeat("b", 0)).await.unwrap();

        let timestamps = registry.distinct_timestamps(&device("a")).await.unwrap();
        let seconds: Vec<i64> = timestamps.iter().map(|t| t.as_second()).collect();

        assert_eq!(seconds, vec![60, 180, 300]);
        assert_eq!(registry.count(&device("a")).await.unwrap(), 4);
        assert!(registry
            .distinct_timestamps(&device("missing"))
            .await
            .unwrap()
            .is_empty());
    }

    #[tokio::test]
    async fn test_average_upload_time() {
        let registry = InMemoryUploadStatRegistry::new();

        assert_eq!(registry.average_upload_time(&device("a")).await.unwrap(), None);

        registry.store(upload_stat("a", 1_000_000_000)).await.unwrap();
        registry.store(upload_stat("a", 2_000_000_000)).await.unwrap();
        registry.store(upload_stat("b", 7)).await.unwrap();

        assert_eq!(
            registry.average_upload_time(&device("a")).await.unwrap(),
            Some(1_500_000_000.0)
        );
        assert_eq!(registry.count(&device("a")).await.unwrap(), 2);
    }

    #[tokio::test]
    async fn test_average_of_zero_samples_is_present() {
        let registry = InMemoryUploadStatRegistry::new();

        registry.store(upload_stat("a", 0)).await.unwrap();
        registry.store(upload_stat("a", 0)).await.unwrap();

        assert_eq!(
            registry.average_upload_time(&device("a")).await.unwrap(),
            Some(0.0)
        );
    }
}
