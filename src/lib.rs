//! Spreadsheet ingestion for the campus fountain ratings store.
//!
//! Source exports (CSV or a workbook's first sheet) arrive with inconsistent
//! headers. Rows are resolved against header synonyms, normalized into
//! [`ingest::record::FountainRecord`]s and written to Postgres in a single
//! transaction by [`ingest::Importer`].

pub mod database_ops;
pub mod ingest;
pub mod logging;
pub mod normalization;

pub mod util {
    pub mod env;
}
