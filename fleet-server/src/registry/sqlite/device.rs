use async_trait::async_trait;
use fleet_core::DeviceId;
use sqlx::{Row, SqlitePool};

use crate::registry::DeviceRegistry;

use super::{SqliteRegistryError, connect, connect_in_memory};

#[derive(Clone)]
pub struct SqliteDeviceRegistry {
    pool: SqlitePool,
}

impl SqliteDeviceRegistry {
    pub async fn new(
        path: impl AsRef<std::path::Path>,
        max_connections: u32,
    ) -> Result<Self, SqliteRegistryError> {
        Ok(Self::from_pool(connect(path, max_connections).await?))
    }

    pub async fn new_in_memory() -> Result<Self, SqliteRegistryError> {
        Ok(Self::from_pool(connect_in_memory().await?))
    }

    pub fn from_pool(pool: SqlitePool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl DeviceRegistry for SqliteDeviceRegistry {
    type Error = SqliteRegistryError;

    async fn exists(&self, id: &DeviceId) -> Result<bool, Self::Error> {
        let row = sqlx::query(r#"SELECT 1 FROM devices WHERE device_id = ?"#)
            .bind(id.as_str())
            .fetch_optional(&self.pool)
            .await?;

        Ok(row.is_some())
    }

    async fn register(&self, id: DeviceId) -> Result<bool, Self::Error> {
        let result = sqlx::query(r#"INSERT OR IGNORE INTO devices (device_id) VALUES (?)"#)
            .bind(id.as_str())
            .execute(&self.pool)
            .await?;

        Ok(result.rows_affected() == 1)
    }

    async fn batch_register(&self, ids: Vec<DeviceId>) -> Result<(), Self::Error> {
        let mut tx = self.pool.begin().await?;

        // A conflicting id fails the insert and the dropped transaction rolls
        // back the whole batch.
        for id in &ids {
            sqlx::query(r#"INSERT INTO devices (device_id) VALUES (?)"#)
                .bind(id.as_str())
                .execute(&mut *tx)
                .await?;
        }

        tx.commit().await?;
        Ok(())
    }

    async fn list(&self) -> Result<Vec<DeviceId>, Self::Error> {
        let rows = sqlx::query(r#"SELECT device_id FROM devices ORDER BY device_id"#)
            .fetch_all(&self.pool)
            .await?;

        rows.iter()
            .map(|r| -> Result<DeviceId, SqliteRegistryError> {
                let id: String = r.try_get("device_id")?;
                DeviceId::parse(&id).ok_or(SqliteRegistryError::InvalidDeviceId(id))
            })
            .collect()
    }

    async fn count(&self) -> Result<usize, Self::Error> {
        let count: i64 = sqlx::query(r#"SELECT COUNT(*) FROM devices"#)
            .fetch_one(&self.pool)
            .await?
            .try_get(0)?;

        Ok(count as usize)
    }
}

#[cfg(test)]
mod tests {
    use fleet_core::DeviceId;

    use crate::registry::DeviceRegistry;

    use super::SqliteDeviceRegistry;

    fn device(id: &str) -> DeviceId {
        DeviceId::parse(id).unwrap()
    }

    #[tokio::test]
    async fn test_register_and_exists() {
        let registry = SqliteDeviceRegistry::new_in_memory().await.unwrap();

        assert!(!registry.exists(&device("a")).await.unwrap());
        assert!(registry.register(device("a")).await.unwrap());
        assert!(!registry.register(device("a")).await.unwrap());
        assert!(registry.exists(&device("a")).await.unwrap());
        assert_eq!(registry.count().await.unwrap(), 1);
    }

    #[tokio::test]
    async fn test_batch_register_and_list() {
        let registry = SqliteDeviceRegistry::new_in_memory().await.unwrap();

        registry
            .batch_register(vec![device("c"), device("a"), device("b")])
            .await
            .unwrap();

        assert_eq!(
            registry.list().await.unwrap(),
            vec![device("a"), device("b"), device("c")]
        );
    }

    #[tokio::test]
    async fn test_failed_batch_rolls_back() {
        let registry = SqliteDeviceRegistry::new_in_memory().await.unwrap();
        registry.register(device("b")).await.unwrap();

        let result = registry
            .batch_register(vec![device("a"), device("b"), device("c")])
            .await;

        assert!(result.is_err());
        assert_eq!(registry.list().await.unwrap(), vec![device("b")]);
    }
}
