use std::collections::HashSet;
use std::sync::Arc;

use async_trait::async_trait;
use fleet_core::DeviceId;
use tokio::sync::RwLock;

use crate::registry::DeviceRegistry;

use super::InMemoryError;

#[derive(Clone, Default)]
pub struct InMemoryDeviceRegistry {
    pub(super) devices: Arc<RwLock<HashSet<DeviceId>>>,
}

impl InMemoryDeviceRegistry {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl DeviceRegistry for InMemoryDeviceRegistry {
    type Error = InMemoryError;

    async fn exists(&self, id: &DeviceId) -> Result<bool, Self::Error> {
        Ok(self.devices.read().await.contains(id))
    }

    async fn register(&self, id: DeviceId) -> Result<bool, Self::Error> {
        Ok(self.devices.write().await.insert(id))
    }

    async fn batch_register(&self, ids: Vec<DeviceId>) -> Result<(), Self::Error> {
        let mut devices = self.devices.write().await;

        // Validate the whole batch before touching the set.
        let mut seen = HashSet::with_capacity(ids.len());
        for id in &ids {
            if devices.contains(id) || !seen.insert(id) {
                return Err(InMemoryError::Duplicate(id.clone()));
            }
        }

        devices.extend(ids);
        Ok(())
    }

    async fn list(&self) -> Result<Vec<DeviceId>, Self::Error> {
        Ok(self.devices.read().await.iter().cloned().collect())
    }

    async fn count(&self) -> Result<usize, Self::Error> {
        Ok(self.devices.read().await.len())
    }
}
