use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use fleet_core::{DeviceId, Heartbeat, distinct_ascending};
use jiff::Timestamp;
use tokio::sync::RwLock;

use crate::registry::HeartbeatRegistry;

use super::InMemoryError;

#[derive(Clone, Default)]
pub struct InMemoryHeartbeatRegistry {
    pub(super) heartbeats: Arc<RwLock<HashMap<DeviceId, Vec<Heartbeat>>>>,
}

impl InMemoryHeartbeatRegistry {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl HeartbeatRegistry for InMemoryHeartbeatRegistry {
    type Error = InMemoryError;

    async fn store(&self, heartbeat: Heartbeat) -> Result<(), Self::Error> {
        self.heartbeats
            .write()
            .await
            .entry(heartbeat.device_id.clone())
            .or_default()
            .push(heartbeat);

        Ok(())
    }

    async fn distinct_timestamps(
        &self,
        device_id: &DeviceId,
    ) -> Result<Vec<Timestamp>, Self::Error> {
        let heartbeats = self.heartbeats.read().await;

        let Some(history) = heartbeats.get(device_id) else {
            return Ok(vec![]);
        };

        Ok(distinct_ascending(history.iter().map(|h| h.sent_at)))
    }

    async fn count(&self, device_id: &DeviceId) -> Result<usize, Self::Error> {
        Ok(self
            .heartbeats
            .read()
            .await
            .get(device_id)
            .map_or(0, Vec::len))
    }
}
