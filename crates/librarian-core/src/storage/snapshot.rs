use crate::catalog::CatalogEntry;
use crate::error::Error;
use std::fs;
use std::path::Path;
use tracing::info;

/// Write the catalog as CSV for external tooling. The file is never read
/// back; the store stays authoritative.
pub fn export_catalog_csv(entries: &[CatalogEntry], path: &Path) -> Result<(), Error> {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)?;
    }
    let mut writer = csv::Writer::from_path(path)?;
    for entry in entries {
        writer.serialize(entry)?;
    }
    writer.flush()?;
    info!("Saved catalog snapshot ({} rows) to {}", entries.len(), path.display());
    Ok(())
}
