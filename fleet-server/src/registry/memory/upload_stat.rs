use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use fleet_core::{DeviceId, UploadStat};
use tokio::sync::RwLock;

use crate::registry::UploadStatRegistry;

use super::InMemoryError;

#[derive(Clone, Default)]
pub struct InMemoryUploadStatRegistry {
    pub(super) stats: Arc<RwLock<HashMap<DeviceId, Vec<UploadStat>>>>,
}

impl InMemoryUploadStatRegistry {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl UploadStatRegistry for InMemoryUploadStatRegistry {
    type Error = InMemoryError;

    async fn store(&self, stat: UploadStat) -> Result<(), Self::Error> {
        self.stats
            .write()
            .await
            .entry(stat.device_id.clone())
            .or_default()
            .push(stat);

        Ok(())
    }

    async fn average_upload_time(&self, device_id: &DeviceId) -> Result<Option<f64>, Self::Error> {
        let stats = self.stats.read().await;

        let Some(samples) = stats.get(device_id).filter(|s| !s.is_empty()) else {
            return Ok(None);
        };

        let total: i128 = samples.iter().map(|s| s.upload_time.as_nanos()).sum();

        Ok(Some(total as f64 / samples.len() as f64))
    }

    async fn count(&self, device_id: &DeviceId) -> Result<usize, Self::Error> {
        Ok(self.stats.read().await.get(device_id).map_or(0, Vec::len))
    }
}
