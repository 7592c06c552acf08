use async_trait::async_trait;
use fleet_core::{DeviceId, Heartbeat};
use jiff::Timestamp;
use sqlx::{Row, SqlitePool};

use crate::registry::HeartbeatRegistry;

use super::{SqliteRegistryError, nanos_to_timestamp, timestamp_to_nanos};

#[derive(Clone)]
pub struct SqliteHeartbeatRegistry {
    pool: SqlitePool,
}

impl SqliteHeartbeatRegistry {
    pub fn from_pool(pool: SqlitePool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl HeartbeatRegistry for SqliteHeartbeatRegistry {
    type Error = SqliteRegistryError;

    async fn store(&self, heartbeat: Heartbeat) -> Result<(), Self::Error> {
        let sent_at = timestamp_to_nanos(heartbeat.sent_at)?;

        sqlx::query(r#"INSERT INTO heartbeats (id, device_id, sent_at) VALUES (?, ?, ?)"#)
            .bind(heartbeat.id.0.to_string())
            .bind(heartbeat.device_id.as_str())
            .bind(sent_at)
            .execute(&self.pool)
            .await?;

        Ok(())
    }

    async fn distinct_timestamps(
        &self,
        device_id: &DeviceId,
    ) -> Result<Vec<Timestamp>, Self::Error> {
        let rows = sqlx::query(
            r#"
            SELECT DISTINCT sent_at FROM heartbeats
            WHERE device_id = ?
            ORDER BY sent_at ASC
            "#,
        )
        .bind(device_id.as_str())
        .fetch_all(&self.pool)
        .await?;

        rows.iter()
            .map(|r| nanos_to_timestamp(r.try_get::<i64, _>("sent_at")?))
            .collect()
    }

    async fn count(&self, device_id: &DeviceId) -> Result<usize, Self::Error> {
        let count: i64 = sqlx::query(r#"SELECT COUNT(*) FROM heartbeats WHERE device_id = ?"#)
            .bind(device_id.as_str())
            .fetch_one(&self.pool)
            .await?
            .try_get(0)?;

        Ok(count as usize)
    }
}
