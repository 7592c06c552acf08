mod device;
mod heartbeat;
mod upload_stat;

pub use device::SqliteDeviceRegistry;
pub use heartbeat::SqliteHeartbeatRegistry;
pub use upload_stat::SqliteUploadStatRegistry;

use std::path::Path;
use std::str::FromStr;

use jiff::Timestamp;
use sqlx::{
    SqlitePool,
    migrate::Migrator,
    sqlite::{SqliteConnectOptions, SqliteJournalMode, SqlitePoolOptions, SqliteSynchronous},
};

static MIGRATOR: Migrator = sqlx::migrate!("./migrations");

#[derive(Debug, thiserror::Error)]
pub enum SqliteRegistryError {
    #[error("sqlx error: {0}")]
    Sqlx(#[from] sqlx::Error),
    #[error("migration error: {0}")]
    Migration(#[from] sqlx::migrate::MigrateError),
    #[error("timestamp out of storable range: {0}")]
    TimestampOutOfRange(Timestamp),
    #[error("invalid stored device id: {0:?}")]
    InvalidDeviceId(String),
    #[error("invalid timestamp: {0}")]
    InvalidTimestamp(i64),
    #[error("upload time out of storable range")]
    UploadTimeOutOfRange,
}

/// Opens (creating if needed) the database file and applies migrations.
///
/// WAL lets readers proceed while a write is in flight; SQLite itself keeps
/// writers serialized.
pub async fn connect(
    path: impl AsRef<Path>,
    max_connections: u32,
) -> Result<SqlitePool, SqliteRegistryError> {
    let options = SqliteConnectOptions::new()
        .filename(path)
        .create_if_missing(true)
        .journal_mode(SqliteJournalMode::Wal)
        .synchronous(SqliteSynchronous::Normal);

    let pool = SqlitePoolOptions::new()
        .max_connections(max_connections)
        .connect_with(options)
        .await?;

    MIGRATOR.run(&pool).await?;

    Ok(pool)
}

/// Every connection to `sqlite::memory:` is its own database, so the pool is
/// pinned to one connection that never expires.
pub async fn connect_in_memory() -> Result<SqlitePool, SqliteRegistryError> {
    let options = SqliteConnectOptions::from_str("sqlite::memory:")?;

    let pool = SqlitePoolOptions::new()
        .max_connections(1)
        .idle_timeout(None)
        .max_lifetime(None)
        .connect_with(options)
        .await?;

    MIGRATOR.run(&pool).await?;

    Ok(pool)
}

fn timestamp_to_nanos(timestamp: Timestamp) -> Result<i64, SqliteRegistryError> {
    i64::try_from(timestamp.as_nanosecond())
        .map_err(|_| SqliteRegistryError::TimestampOutOfRange(timestamp))
}

fn nanos_to_timestamp(nanos: i64) -> Result<Timestamp, SqliteRegistryError> {
    Timestamp::from_nanosecond(i128::from(nanos))
        .map_err(|_| SqliteRegistryError::InvalidTimestamp(nanos))
}
