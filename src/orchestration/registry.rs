//! Shared record of every instance provisioned during a parallel run.
//!
//! Append-only: entries are never removed, so the emergency sweep sees every instance that
//! ever existed. Terminating an instance twice is harmless.

use chrono::{DateTime, Utc};
use parking_lot::Mutex;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ActiveInstance {
    pub batch_id: usize,
    pub instance_id: String,
    pub registered_at: DateTime<Utc>,
}

#[derive(Debug, Default)]
pub struct ActiveInstanceRegistry {
    entries: Mutex<Vec<ActiveInstance>>,
}

impl ActiveInstanceRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn register(&self, batch_id: usize, instance_id: &str) {
        self.entries.lock().push(ActiveInstance {
            batch_id,
            instance_id: instance_id.to_string(),
            registered_at: Utc::now(),
        });
    }

    pub fn snapshot(&self) -> Vec<ActiveInstance> {
        self.entries.lock().clone()
    }

    /// Entries registered by one partition
    pub fn for_batch(&self, batch_id: usize) -> Vec<ActiveInstance> {
        self.entries
            .lock()
            .iter()
            .filter(|entry| entry.batch_id == batch_id)
            .cloned()
            .collect()
    }

    pub fn len(&self) -> usize {
        self.entries.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.lock().is_empty()
    }
}
