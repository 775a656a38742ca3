//! Test doubles for pipeline and store seams.
//!
//! [`MemoryVoteStore`] stands in for the relational store in unit and
//! integration tests: sequential surrogate keys, a snapshot accessor,
//! and scripted failure injection for storage-unavailability
//! scenarios.

use std::sync::atomic::{AtomicU64, AtomicUsize, Ordering};
use std::sync::Mutex;

use async_trait::async_trait;

use crate::error::{IngestError, IngestResult};
use crate::store::VoteStore;
use crate::vote::VoteRecord;

/// In-memory [`VoteStore`] for tests.
#[derive(Debug, Default)]
pub struct MemoryVoteStore {
    /// Persisted records, in insert order.
    records: Mutex<Vec<VoteRecord>>,
    /// Next surrogate key.
    next_id: AtomicU64,
    /// Number of upcoming inserts that should fail.
    fail_budget: AtomicUsize,
}

impl MemoryVoteStore {
    /// Creates an empty store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Makes the next `n` inserts fail with [`IngestError::Storage`],
    /// simulating storage unavailability.
    pub fn fail_times(&self, n: usize) {
        self.fail_budget.store(n, Ordering::SeqCst);
    }

    /// Returns a copy of all persisted records, in insert order.
    ///
    /// # Panics
    ///
    /// Panics if the internal lock is poisoned.
    #[must_use]
    pub fn records(&self) -> Vec<VoteRecord> {
        self.records.lock().unwrap().clone()
    }
}

#[async_trait]
impl VoteStore for MemoryVoteStore {
    async fn insert(&self, record: &VoteRecord) -> IngestResult<VoteRecord> {
        let remaining = self.fail_budget.load(Ordering::SeqCst);
        if remaining > 0 {
            self.fail_budget.store(remaining - 1, Ordering::SeqCst);
            return Err(IngestError::Storage("storage unavailable".into()));
        }

        #[allow(clippy::cast_possible_wrap)]
        let id = self.next_id.fetch_add(1, Ordering::SeqCst) as i64 + 1;
        let persisted = record.clone().with_id(id);
        self.records.lock().unwrap().push(persisted.clone());
        Ok(persisted)
    }
}
