use async_trait::async_trait;
use fleet_core::{DeviceId, UploadStat};
use sqlx::{Row, SqlitePool};

use crate::registry::UploadStatRegistry;

use super::{SqliteRegistryError, timestamp_to_nanos};

#[derive(Clone)]
pub struct SqliteUploadStatRegistry {
    pool: SqlitePool,
}

impl SqliteUploadStatRegistry {
    pub fn from_pool(pool: SqlitePool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl UploadStatRegistry for SqliteUploadStatRegistry {
    type Error = SqliteRegistryError;

    async fn store(&self, stat: UploadStat) -> Result<(), Self::Error> {
        let sent_at = timestamp_to_nanos(stat.sent_at)?;
        let upload_time = i64::try_from(stat.upload_time.as_nanos())
            .map_err(|_| SqliteRegistryError::UploadTimeOutOfRange)?;

        sqlx::query(
            r#"
            INSERT INTO upload_stats (id, device_id, sent_at, upload_time)
            VALUES (?, ?, ?, ?)
            "#,
        )
        .bind(stat.id.0.to_string())
        .bind(stat.device_id.as_str())
        .bind(sent_at)
        .bind(upload_time)
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    async fn average_upload_time(&self, device_id: &DeviceId) -> Result<Option<f64>, Self::Error> {
        // AVG over zero rows is NULL, which keeps "no samples" apart from a
        // mean of zero.
        let average: Option<f64> =
            sqlx::query(r#"SELECT AVG(upload_time) FROM upload_stats WHERE device_id = ?"#)
                .bind(device_id.as_str())
                .fetch_one(&self.pool)
                .await?
                .try_get(0)?;

        Ok(average)
    }

    async fn count(&self, device_id: &DeviceId) -> Result<usize, Self::Error> {
        let count: i64 = sqlx::query(r#"SELECT COUNT(*) FROM upload_stats WHERE device_id = ?"#)
            .bind(device_id.as_str())
            .fetch_one(&self.pool)
            .await?
            .try_get(0)?;

        Ok(count as usize)
    }
}
