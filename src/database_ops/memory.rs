//! In-memory `FountainStore` used by importer tests.

use async_trait::async_trait;

use super::schema::{PatchOutcome, PatchReport};
use super::store::{FountainStore, StoreError};
use crate::ingest::record::{FountainRecord, PersistedFountain};

#[derive(Debug, Default)]
pub(crate) struct MemoryStore {
    pub committed: Vec<PersistedFountain>,
    pending: Option<Vec<PersistedFountain>>,
    next_id: i64,
    /// Fail the n-th insert attempt (1-based).
    pub fail_on_insert: Option<usize>,
    pub insert_attempts: usize,
    pub image_updates: usize,
    pub schema_runs: usize,
    pub begins: usize,
    pub commits: usize,
    pub rollbacks: usize,
}

impl MemoryStore {
    pub fn failing_at(n: usize) -> Self {
        Self {
            fail_on_insert: Some(n),
            ..Self::default()
        }
    }

    /// Whether any call reached the store at all.
    pub fn touched(&self) -> bool {
        self.schema_runs + self.begins + self.insert_attempts > 0
    }
}

#[async_trait]
impl FountainStore for MemoryStore {
    async fn reconcile_schema(&mut self) -> Vec<PatchReport> {
        self.schema_runs += 1;
        vec![PatchReport {
            name: "fountains_table",
            outcome: PatchOutcome::AlreadyApplied,
        }]
    }

    async fn begin(&mut self) -> Result<(), StoreError> {
        self.begins += 1;
        self.pending = Some(Vec::new());
        Ok(())
    }

    async fn insert_fountain(
        &mut self,
        record: &FountainRecord,
    ) -> Result<PersistedFountain, StoreError> {
        self.insert_attempts += 1;
        if self.fail_on_insert == Some(self.insert_attempts) {
            return Err(StoreError::Rejected(format!(
                "forced failure on insert {}",
                self.insert_attempts
            )));
        }
        let pending = self.pending.as_mut().ok_or(StoreError::NoTransaction)?;
        // ids are consumed even when the transaction later rolls back, like SERIAL
        self.next_id += 1;
        let row = PersistedFountain {
            id: self.next_id,
            record: record.clone(),
        };
        pending.push(row.clone());
        Ok(row)
    }

    async fn set_images(&mut self, id: i64, images: &[String]) -> Result<(), StoreError> {
        let pending = self.pending.as_mut().ok_or(StoreError::NoTransaction)?;
        let row = pending
            .iter_mut()
            .find(|r| r.id == id)
            .ok_or_else(|| StoreError::Rejected(format!("no row {id}")))?;
        row.record.images = images.to_vec();
        self.image_updates += 1;
        Ok(())
    }

    async fn commit(&mut self) -> Result<(), StoreError> {
        let pending = self.pending.take().ok_or(StoreError::NoTransaction)?;
        self.committed.extend(pending);
        self.commits += 1;
        Ok(())
    }

    async fn rollback(&mut self) -> Result<(), StoreError> {
        self.pending = None;
        self.rollbacks += 1;
        Ok(())
    }
}
