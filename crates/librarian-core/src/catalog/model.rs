use crate::scanner::ScannedFile;
use serde::Serialize;

/// `relative_path` value of files sitting directly under the root.
pub const ROOT_DIR: &str = ".";

const BYTES_PER_MB: f64 = 1024.0 * 1024.0;

/// Natural key of a catalog row.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct EntryKey {
    pub relative_path: String,
    pub filename: String,
    pub extension: String,
}

/// One cataloged file. Column order matches the `catalog` table.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CatalogEntry {
    pub relative_path: String,
    pub filename: String,
    pub extension: String,
    pub last_modified: String,
    #[serde(rename = "file_size_in_MB")]
    pub file_size_mb: Option<f64>,
    pub textracted: bool,
    pub token_count: Option<i64>,
    pub sha256: String,
}

impl CatalogEntry {
    /// Fresh row for a scanned file; correlation, tokens and hash are filled in later.
    pub fn from_scanned(file: &ScannedFile) -> Self {
        CatalogEntry {
            relative_path: file.relative_dir.clone(),
            filename: file.stem.clone(),
            extension: file.extension.clone(),
            last_modified: file.last_modified.clone(),
            file_size_mb: Some(file.size_mb),
            textracted: false,
            token_count: None,
            sha256: String::new(),
        }
    }

    pub fn key(&self) -> EntryKey {
        EntryKey {
            relative_path: self.relative_path.clone(),
            filename: self.filename.clone(),
            extension: self.extension.clone(),
        }
    }

    pub fn top_level_folder(&self) -> &str {
        top_level_folder(&self.relative_path)
    }
}

/// First segment of a `/`-separated relative directory, `.` for the root.
pub fn top_level_folder(relative_path: &str) -> &str {
    relative_path
        .split('/')
        .find(|s| !s.is_empty())
        .unwrap_or(ROOT_DIR)
}

/// Size in MB, rounded to 3 decimal places.
pub fn round_mb(bytes: u64) -> f64 {
    let mb = bytes as f64 / BYTES_PER_MB;
    (mb * 1000.0).round() / 1000.0
}

/// Sizes compared as integer thousandths of a MB, so grouping never depends
/// on float equality.
pub fn size_key(size_mb: f64) -> i64 {
    (size_mb * 1000.0).round() as i64
}
