//! Point lookup over the materialized store.

use hotdogjobs_shared::Job;
use hotdogjobs_storage::StoreReader;

/// Read-only query interface. A pass-through over the store: ids are not
/// validated, and an unknown id is simply `None`.
#[derive(Debug, Clone)]
pub struct JobQuery {
    store: StoreReader,
}

impl JobQuery {
    pub fn new(store: StoreReader) -> Self {
        Self { store }
    }

    /// Latest snapshot for `id`.
    pub fn get(&self, id: &str) -> Option<Job> {
        self.store.get(id)
    }
}
