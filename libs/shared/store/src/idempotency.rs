use std::collections::HashMap;

use tokio::sync::RwLock;
use tracing::debug;
use uuid::Uuid;

/// Remembers which appointment a client request token produced, so a retried
/// submission returns the original booking instead of creating a second one.
///
/// Lookups and inserts happen while the caller holds the partition guard, so
/// two racing retries of the same token cannot both miss.
#[derive(Debug, Default)]
pub struct IdempotencyLedger {
    tokens: RwLock<HashMap<String, Uuid>>,
}

impl IdempotencyLedger {
    pub fn new() -> Self {
        Self {
            tokens: RwLock::new(HashMap::new()),
        }
    }

    pub async fn recorded_appointment(&self, token: &str) -> Option<Uuid> {
        self.tokens.read().await.get(token).copied()
    }

    pub async fn record(&self, token: &str, appointment_id: Uuid) {
        debug!("Recording request token for appointment {}", appointment_id);
        self.tokens
            .write()
            .await
            .insert(token.to_string(), appointment_id);
    }
}
