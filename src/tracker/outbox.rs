//! Store adapter: merge-writes queued for the shell's document-store bridge.
//!
//! The worker cannot reach the store itself. Each committed change queues a
//! full-document merge-write here; the bridge drains the queue through
//! `GET /api/store/pending`, performs the writes and reports each result via
//! `POST /api/store/ack`. Failures are logged and surfaced in the sync badge.
//! There is no retry and no rollback: the local state already moved on.

use serde::Serialize;
use serde_json::Value;
use std::collections::BTreeSet;
use tracing::{debug, warn};

use crate::error::{AppError, Result};

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PendingWrite {
    pub id: u64,
    pub collection: String,
    pub key: String,
    pub document: Value,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SyncStatus {
    Synced,
    Pending(usize),
    Failed(String),
}

#[derive(Debug, Default)]
pub struct Outbox {
    next_id: u64,
    queued: Vec<PendingWrite>,
    in_flight: BTreeSet<u64>,
    last_error: Option<String>,
    failed: u64,
}

impl Outbox {
    /// Queue a merge-write. A queued write for the same key that the bridge
    /// has not picked up yet is replaced, since each write carries the whole
    /// document.
    pub fn enqueue(&mut self, collection: &str, key: &str, document: Value) -> u64 {
        self.next_id += 1;
        let id = self.next_id;
        self.queued.retain(|w| w.key != key);
        self.queued.push(PendingWrite {
            id,
            collection: collection.to_string(),
            key: key.to_string(),
            document,
        });
        debug!(id, key, "queued merge-write");
        id
    }

    /// Hand every queued write to the bridge and mark it in flight.
    pub fn drain(&mut self) -> Vec<PendingWrite> {
        let writes = std::mem::take(&mut self.queued);
        self.in_flight.extend(writes.iter().map(|w| w.id));
        writes
    }

    /// Record the bridge's result for an in-flight write.
    pub fn acknowledge(&mut self, id: u64, outcome: std::result::Result<(), String>) -> Result<()> {
        if !self.in_flight.remove(&id) {
            return Err(AppError::UnknownWrite(id));
        }
        match outcome {
            Ok(()) => {
                debug!(id, "merge-write stored");
                self.last_error = None;
            }
            Err(message) => {
                warn!(id, error = %message, "merge-write failed; local state kept");
                self.failed += 1;
                self.last_error = Some(message);
            }
        }
        Ok(())
    }

    pub fn pending(&self) -> usize {
        self.queued.len() + self.in_flight.len()
    }

    pub fn failed_count(&self) -> u64 {
        self.failed
    }

    pub fn status(&self) -> SyncStatus {
        if let Some(err) = &self.last_error {
            return SyncStatus::Failed(err.clone());
        }
        match self.pending() {
            0 => SyncStatus::Synced,
            n => SyncStatus::Pending(n),
        }
    }
}
