//! In-memory materialized job table.
//!
//! The store keeps the latest [`Job`] snapshot per job id in a single logical
//! partition backed by a [`DashMap`], so every `put`/`get` is atomic per key.
//!
//! **Access rules:**
//! - Finalizer stage: read-write (sole writer) via [`StoreWriter`]
//! - Query interface: read-only via [`StoreReader`], freely cloneable
//!
//! Writes are last-write-wins with no merge. A read racing a write to the same
//! key observes either the old or the new snapshot.

use std::fmt;
use std::sync::Arc;

use dashmap::DashMap;
use hotdogjobs_shared::{HotdogError, Job, Result};

type Table = Arc<DashMap<String, Job>>;

/// Write handle for the job table. Not `Clone`: there is exactly one writer.
pub struct StoreWriter {
    table: Table,
}

/// Read-only handle for the job table.
#[derive(Clone)]
pub struct StoreReader {
    table: Table,
}

impl StoreWriter {
    /// Create an empty table and return its only write handle.
    pub fn open_in_memory() -> Self {
        Self {
            table: Arc::new(DashMap::new()),
        }
    }

    /// Hand out a read-only view of the same table.
    pub fn reader(&self) -> StoreReader {
        StoreReader {
            table: Arc::clone(&self.table),
        }
    }

    /// Store `job` under `id`, replacing any previous snapshot.
    /// Returns the replaced snapshot, if there was one.
    pub fn put(&self, id: impl Into<String>, job: Job) -> Option<Job> {
        let id = id.into();
        let previous = self.table.insert(id.clone(), job);
        if previous.is_some() {
            tracing::debug!(%id, "replaced existing job snapshot");
        }
        previous
    }

    /// Store a finished job under its own id.
    pub fn materialize(&self, job: Job) -> Result<()> {
        let id = job
            .id()
            .ok_or(HotdogError::MissingField { field: "id" })?
            .to_owned();
        self.put(id, job);
        Ok(())
    }

    pub fn len(&self) -> usize {
        self.table.len()
    }

    pub fn is_empty(&self) -> bool {
        self.table.is_empty()
    }
}

impl StoreReader {
    /// Latest snapshot for `id`, or `None` when the id was never written.
    pub fn get(&self, id: &str) -> Option<Job> {
        self.table.get(id).map(|entry| entry.value().clone())
    }

    pub fn len(&self) -> usize {
        self.table.len()
    }

    pub fn is_empty(&self) -> bool {
        self.table.is_empty()
    }
}

impl fmt::Debug for StoreWriter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("StoreWriter")
            .field("entries", &self.table.len())
            .finish()
    }
}

impl fmt::Debug for StoreReader {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("StoreReader")
            .field("entries", &self.table.len())
            .finish()
    }
}
