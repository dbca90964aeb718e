pub mod queries;
pub mod snapshot;
pub mod sqlite;

pub use queries::{CatalogSummary, WriteStats};
pub use snapshot::export_catalog_csv;
pub use sqlite::{backup_store, Database};
