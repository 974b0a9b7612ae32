pub mod idempotency;
pub mod partition;

pub use idempotency::IdempotencyLedger;
pub use partition::{PartitionKey, PartitionLockRegistry};
