use std::collections::HashMap;
use std::sync::Arc;

use chrono::NaiveDate;
use tokio::sync::{Mutex, OwnedMutexGuard};
use tracing::debug;
use uuid::Uuid;

/// Serialization unit for scheduling mutations. Every write touching the
/// same clinician-day must hold this key's guard for its whole
/// read-check-commit sequence.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct PartitionKey {
    pub clinician_id: Uuid,
    pub date: NaiveDate,
}

impl PartitionKey {
    pub fn new(clinician_id: Uuid, date: NaiveDate) -> Self {
        Self { clinician_id, date }
    }
}

/// Per-partition lock registry. Guards are owned so callers can hold them
/// across await points while they re-check conflicts and commit.
#[derive(Debug, Default)]
pub struct PartitionLockRegistry {
    locks: Mutex<HashMap<PartitionKey, Arc<Mutex<()>>>>,
}

impl PartitionLockRegistry {
    pub fn new() -> Self {
        Self {
            locks: Mutex::new(HashMap::new()),
        }
    }

    /// Acquire the guard serializing mutations for one clinician-day.
    pub async fn lock(&self, key: PartitionKey) -> OwnedMutexGuard<()> {
        let slot = {
            let mut locks = self.locks.lock().await;
            locks
                .entry(key)
                .or_insert_with(|| Arc::new(Mutex::new(())))
                .clone()
        };

        debug!(
            "Acquiring partition lock for clinician {} on {}",
            key.clinician_id, key.date
        );
        slot.lock_owned().await
    }

    /// Acquire guards for two partitions. Keys are always locked in their
    /// natural order so concurrent pair acquisitions cannot deadlock, and an
    /// identical pair takes a single guard.
    pub async fn lock_pair(
        &self,
        first: PartitionKey,
        second: PartitionKey,
    ) -> (OwnedMutexGuard<()>, Option<OwnedMutexGuard<()>>) {
        if first == second {
            return (self.lock(first).await, None);
        }

        let (lower, upper) = if first < second {
            (first, second)
        } else {
            (second, first)
        };

        let lower_guard = self.lock(lower).await;
        let upper_guard = self.lock(upper).await;
        (lower_guard, Some(upper_guard))
    }
}
