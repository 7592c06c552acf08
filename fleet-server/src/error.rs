use std::path::PathBuf;

use fleet_core::DeviceId;

type BoxError = Box<dyn std::error::Error + Send + Sync + 'static>;

/// Failures surfaced by reconciliation, ingestion and metric queries.
///
/// Nothing here is retried internally; callers decide.
#[derive(Debug, thiserror::Error)]
pub enum FleetError {
    #[error("device {0} not found")]
    NotFound(DeviceId),
    #[error("device {0} already exists")]
    AlreadyExists(DeviceId),
    #[error("invalid input: {0}")]
    Validation(String),
    #[error("persistence error: {0}")]
    Persistence(#[source] BoxError),
    #[error("device list unavailable at {}: {source}", path.display())]
    SourceUnavailable {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

impl FleetError {
    pub fn persistence<E>(err: E) -> Self
    where
        E: std::error::Error + Send + Sync + 'static,
    {
        FleetError::Persistence(Box::new(err))
    }
}
