//! Brings the device registry in line with an external device list.

use std::collections::{BTreeSet, HashSet};

use fleet_core::DeviceId;
use tracing::{error, info};

use crate::FleetError;
use crate::registry::DeviceRegistry;
use crate::source::DeviceSource;

/// Devices inserted per transaction. Keeps each insert statement bounded no
/// matter how long the roster is, while a failure only loses the current batch.
pub const DEVICE_BATCH_SIZE: usize = 100;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReconcileOutcome {
    /// Every listed device was already registered.
    UpToDate,
    Registered { devices: usize, batches: usize },
}

pub struct Reconciler<D> {
    registry: D,
}

impl<D: DeviceRegistry> Reconciler<D> {
    pub fn new(registry: D) -> Self {
        Self { registry }
    }

    /// Reads the source, then reconciles. Nothing is written when the source
    /// cannot be read.
    pub async fn reconcile_from<S>(&self, source: &S) -> Result<ReconcileOutcome, FleetError>
    where
        S: DeviceSource + ?Sized,
    {
        let candidates = source.device_ids().await?;
        self.reconcile(candidates).await
    }

    /// Registers every candidate that is not yet known.
    ///
    /// Candidates are trimmed, blanks dropped and duplicates collapsed. New
    /// devices go in sorted order, [`DEVICE_BATCH_SIZE`] per transaction. A
    /// failing batch stops the run: earlier batches stay committed, the rest
    /// are not attempted, and the store error is returned. Running it again
    /// with the same candidates is a no-op.
    pub async fn reconcile<I, S>(&self, candidates: I) -> Result<ReconcileOutcome, FleetError>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let candidates = candidate_set(candidates);

        let existing: HashSet<DeviceId> = self
            .registry
            .list()
            .await
            .map_err(FleetError::persistence)?
            .into_iter()
            .collect();

        let new: Vec<DeviceId> = candidates
            .into_iter()
            .filter(|id| !existing.contains(id))
            .collect();

        if new.is_empty() {
            info!(known = existing.len(), "no new devices to register");
            return Ok(ReconcileOutcome::UpToDate);
        }

        let mut batches = 0;
        for (index, batch) in new.chunks(DEVICE_BATCH_SIZE).enumerate() {
            if let Err(e) = self.registry.batch_register(batch.to_vec()).await {
                error!(
                    error = %e,
                    batch = index,
                    committed = index * DEVICE_BATCH_SIZE,
                    pending = new.len() - index * DEVICE_BATCH_SIZE,
                    "device batch insert failed"
                );
                return Err(FleetError::persistence(e));
            }
            batches += 1;
        }

        info!(devices = new.len(), batches, "registered new devices");

        Ok(ReconcileOutcome::Registered {
            devices: new.len(),
            batches,
        })
    }
}

fn candidate_set<I, S>(candidates: I) -> BTreeSet<DeviceId>
where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
{
    candidates
        .into_iter()
        .filter_map(|raw| DeviceId::parse(raw.as_ref()))
        .collect()
}
