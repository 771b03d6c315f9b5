//! Batch importer: parse -> transform -> filter -> insert -> backfill.
//!
//! A run holds one store transaction. Rows are written strictly in order, in
//! fixed-size batches, and any failing row rolls the whole run back. Dry runs
//! stop after filtering and never reach the store.

use std::path::Path;

use serde::Serialize;
use tracing::{error, info, instrument, warn};

use crate::database_ops::placeholders::placeholder_images;
use crate::database_ops::schema::PatchReport;
use crate::database_ops::store::{FountainStore, StoreError};

use super::error::ImportError;
use super::record::{FountainRecord, RawRecord};
use super::source::read_records;
use super::transform::{transform, AutoNumber};

pub const DEFAULT_BATCH_SIZE: usize = 500;
/// Records shown by a dry run.
pub const DRY_RUN_SAMPLE: usize = 10;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ImportOptions {
    pub dry_run: bool,
    pub batch_size: usize,
    pub sample_size: usize,
}

impl Default for ImportOptions {
    fn default() -> Self {
        Self {
            dry_run: false,
            batch_size: DEFAULT_BATCH_SIZE,
            sample_size: DRY_RUN_SAMPLE,
        }
    }
}

/// Transformed and filtered rows, ready to be written.
#[derive(Debug, Clone, Default)]
pub struct StagedImport {
    pub source_rows: usize,
    pub records: Vec<FountainRecord>,
    /// 1-based data-row numbers of discarded rows.
    pub discarded: Vec<usize>,
    pub synthesized_numbers: u64,
}

/// Map every raw row through the transformer with a fresh number sequence and
/// drop the rows that have neither number nor location.
pub fn stage_records(rows: &[RawRecord]) -> StagedImport {
    let mut numbers = AutoNumber::new();
    let mut records = Vec::with_capacity(rows.len());
    let mut discarded = Vec::new();
    for (idx, row) in rows.iter().enumerate() {
        match transform(row, &mut numbers) {
            Some(record) => records.push(record),
            None => {
                warn!(row = idx + 1, "skipping row with neither number nor location");
                discarded.push(idx + 1);
            }
        }
    }
    StagedImport {
        source_rows: rows.len(),
        records,
        discarded,
        synthesized_numbers: numbers.issued(),
    }
}

#[derive(Debug, Clone, Default, Serialize)]
pub struct ImportReport {
    pub dry_run: bool,
    pub source_rows: usize,
    pub accepted: usize,
    pub discarded: usize,
    pub synthesized_numbers: u64,
    pub batches: usize,
    pub inserted: usize,
    pub backfilled: usize,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub schema: Vec<PatchReport>,
    /// First records of a dry run; empty for real runs.
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub sample: Vec<FountainRecord>,
}

impl ImportReport {
    fn staged(staged: &StagedImport) -> Self {
        Self {
            source_rows: staged.source_rows,
            accepted: staged.records.len(),
            discarded: staged.discarded.len(),
            synthesized_numbers: staged.synthesized_numbers,
            ..Self::default()
        }
    }
}

#[derive(Debug, Default)]
struct Written {
    batches: usize,
    inserted: usize,
    backfilled: usize,
}

#[derive(Debug, Clone)]
pub struct Importer {
    options: ImportOptions,
}

impl Importer {
    pub fn new(options: ImportOptions) -> Result<Self, ImportError> {
        if options.batch_size == 0 {
            return Err(ImportError::InvalidBatchSize);
        }
        Ok(Self { options })
    }

    pub fn options(&self) -> &ImportOptions {
        &self.options
    }

    /// Parse and transform a source file. Touches nothing but the file.
    pub fn stage(&self, path: &Path) -> Result<StagedImport, ImportError> {
        let rows = read_records(path)?;
        let staged = stage_records(&rows);
        info!(
            source_rows = staged.source_rows,
            accepted = staged.records.len(),
            discarded = staged.discarded.len(),
            "staged import"
        );
        Ok(staged)
    }

    /// Report for a dry run: counts plus the first few transformed records.
    pub fn dry_run_report(&self, staged: StagedImport) -> ImportReport {
        let mut report = ImportReport::staged(&staged);
        report.dry_run = true;
        report.sample = staged
            .records
            .into_iter()
            .take(self.options.sample_size)
            .collect();
        info!(sample = report.sample.len(), "dry run; no store changes made");
        report
    }

    /// Write staged records in one transaction, backfilling placeholder images
    /// for rows stored without any. Commits only after every batch succeeds.
    #[instrument(skip(self, store, staged), fields(rows = staged.records.len()))]
    pub async fn persist<S>(
        &self,
        store: &mut S,
        staged: StagedImport,
    ) -> Result<ImportReport, ImportError>
    where
        S: FountainStore + ?Sized,
    {
        let mut report = ImportReport::staged(&staged);
        report.schema = store.reconcile_schema().await;

        store
            .begin()
            .await
            .map_err(|source| ImportError::Transaction {
                action: "begin",
                source,
            })?;

        let written = match write_batches(store, &staged.records, self.options.batch_size).await {
            Ok(written) => written,
            Err(err) => {
                if let Err(rb) = store.rollback().await {
                    error!(error = %rb, "rollback failed");
                }
                warn!(error = %err, "import rolled back");
                return Err(err);
            }
        };

        store
            .commit()
            .await
            .map_err(|source| ImportError::Transaction {
                action: "commit",
                source,
            })?;

        report.batches = written.batches;
        report.inserted = written.inserted;
        report.backfilled = written.backfilled;
        info!(
            inserted = report.inserted,
            backfilled = report.backfilled,
            batches = report.batches,
            "import committed"
        );
        Ok(report)
    }

    /// Full run against `store`. Dry runs return after staging and leave the
    /// store untouched.
    pub async fn run<S>(&self, path: &Path, store: &mut S) -> Result<ImportReport, ImportError>
    where
        S: FountainStore + ?Sized,
    {
        let staged = self.stage(path)?;
        if self.options.dry_run {
            return Ok(self.dry_run_report(staged));
        }
        self.persist(store, staged).await
    }
}

async fn write_batches<S>(
    store: &mut S,
    records: &[FountainRecord],
    batch_size: usize,
) -> Result<Written, ImportError>
where
    S: FountainStore + ?Sized,
{
    let mut written = Written::default();
    for (b, batch) in records.chunks(batch_size).enumerate() {
        for (offset, record) in batch.iter().enumerate() {
            let row = b * batch_size + offset + 1;
            let failed = |source: StoreError| ImportError::Insert {
                row,
                batch: b + 1,
                source,
            };

            let persisted = store.insert_fountain(record).await.map_err(failed)?;
            if persisted.record.images.is_empty() {
                let images = placeholder_images(persisted.id);
                store
                    .set_images(persisted.id, &images)
                    .await
                    .map_err(failed)?;
                written.backfilled += 1;
            }
            written.inserted += 1;
        }
        written.batches += 1;
        info!(batch = b + 1, rows = batch.len(), "inserted batch");
    }
    Ok(written)
}
