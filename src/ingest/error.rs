use std::path::PathBuf;

use thiserror::Error;

use crate::database_ops::store::StoreError;

/// Fatal failures of an import run. Discarded rows and best-effort schema
/// patches are not errors and never surface here.
#[derive(Debug, Error)]
pub enum ImportError {
    #[error("failed to read {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("malformed CSV in {}: {source}", path.display())]
    Csv {
        path: PathBuf,
        #[source]
        source: csv::Error,
    },

    #[error("unreadable workbook {}: {source}", path.display())]
    Workbook {
        path: PathBuf,
        #[source]
        source: calamine::Error,
    },

    #[error("workbook {} contains no sheets", path.display())]
    EmptyWorkbook { path: PathBuf },

    #[error("batch size must be at least 1")]
    InvalidBatchSize,

    #[error("could not {action} import transaction: {source}")]
    Transaction {
        action: &'static str,
        #[source]
        source: StoreError,
    },

    #[error("insert failed at row {row} (batch {batch}); transaction rolled back: {source}")]
    Insert {
        row: usize,
        batch: usize,
        #[source]
        source: StoreError,
    },
}

impl ImportError {
    /// True when the failure happened before any store interaction.
    pub fn is_parse_failure(&self) -> bool {
        matches!(
            self,
            Self::Io { .. } | Self::Csv { .. } | Self::Workbook { .. } | Self::EmptyWorkbook { .. }
        )
    }
}
