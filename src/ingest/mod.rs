pub mod error;
pub mod importer;
pub mod record;
pub mod source;
pub mod transform;

pub use error::ImportError;
pub use importer::{ImportOptions, ImportReport, Importer};
