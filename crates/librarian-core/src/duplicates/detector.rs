use super::similarity::{classify, Confidence};
use crate::catalog::model::size_key;
use crate::catalog::{CatalogEntry, EntryKey};
use crate::error::Error;
use crate::storage::Database;
use ahash::AHashSet;
use serde::Serialize;
use std::collections::BTreeMap;
use std::fs;
use std::path::Path;
use tracing::{debug, info};

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DuplicateCandidate {
    pub top_level_folder: String,
    pub filename1: String,
    pub filename2: String,
    #[serde(rename = "file_size_MB")]
    pub file_size_mb: Option<f64>,
    pub confidence: Confidence,
}

impl DuplicateCandidate {
    fn from_pair(first: &CatalogEntry, second: &CatalogEntry, confidence: Confidence) -> Self {
        DuplicateCandidate {
            top_level_folder: first.top_level_folder().to_string(),
            filename1: first.filename.clone(),
            filename2: second.filename.clone(),
            file_size_mb: first.file_size_mb,
            confidence,
        }
    }
}

const EXPORT_HEADER: [&str; 5] = [
    "top_level_folder",
    "filename1",
    "filename2",
    "file_size_MB",
    "confidence",
];

fn pair_key(a: &CatalogEntry, b: &CatalogEntry) -> (EntryKey, EntryKey) {
    let (ka, kb) = (a.key(), b.key());
    if ka <= kb {
        (ka, kb)
    } else {
        (kb, ka)
    }
}

fn unordered_pairs<'a>(
    group: &'a [&'a CatalogEntry],
) -> impl Iterator<Item = (&'a CatalogEntry, &'a CatalogEntry)> + 'a {
    group
        .iter()
        .enumerate()
        .flat_map(move |(i, a)| group[i + 1..].iter().map(move |b| (*a, *b)))
}

/// Exact (content hash) and fuzzy (name similarity within a folder and size
/// group) duplicate candidates. Exact pairs are never repeated as fuzzy ones.
pub fn find_duplicates(
    entries: &[CatalogEntry],
    excluded_folders: &[String],
) -> Vec<DuplicateCandidate> {
    let mut considered: Vec<&CatalogEntry> = entries
        .iter()
        .filter(|e| !excluded_folders.iter().any(|f| f == e.top_level_folder()))
        .collect();
    considered.sort_by_key(|e| e.key());

    let mut candidates = Vec::new();
    let mut exact_pairs: AHashSet<(EntryKey, EntryKey)> = AHashSet::new();

    let mut by_hash: BTreeMap<&str, Vec<&CatalogEntry>> = BTreeMap::new();
    for entry in considered.iter().filter(|e| !e.sha256.is_empty()) {
        by_hash.entry(entry.sha256.as_str()).or_default().push(*entry);
    }
    for group in by_hash.values().filter(|g| g.len() > 1) {
        for (a, b) in unordered_pairs(group) {
            exact_pairs.insert(pair_key(a, b));
            candidates.push(DuplicateCandidate::from_pair(a, b, Confidence::Exact));
        }
    }
    let exact_count = candidates.len();

    let mut by_folder_and_size: BTreeMap<(&str, i64), Vec<&CatalogEntry>> = BTreeMap::new();
    for entry in &considered {
        if let Some(size) = entry.file_size_mb {
            by_folder_and_size
                .entry((entry.top_level_folder(), size_key(size)))
                .or_default()
                .push(*entry);
        }
    }
    for group in by_folder_and_size.values().filter(|g| g.len() > 1) {
        for (a, b) in unordered_pairs(group) {
            if exact_pairs.contains(&pair_key(a, b)) {
                continue;
            }
            if let Some(confidence) = classify(&a.filename, &b.filename) {
                candidates.push(DuplicateCandidate::from_pair(a, b, confidence));
            }
        }
    }

    debug!(
        "Duplicate scan over {} entries: {} exact, {} fuzzy",
        considered.len(),
        exact_count,
        candidates.len() - exact_count
    );
    candidates
}

pub fn find_duplicates_in_store(
    db: &Database,
    excluded_folders: &[String],
) -> rusqlite::Result<Vec<DuplicateCandidate>> {
    let entries = db.load_catalog()?;
    Ok(find_duplicates(&entries, excluded_folders))
}

/// Write candidates as CSV. The header is written even when there are none.
pub fn export_duplicates_csv(candidates: &[DuplicateCandidate], path: &Path) -> Result<(), Error> {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)?;
    }
    let mut writer = csv::WriterBuilder::new()
        .has_headers(false)
        .from_path(path)?;
    writer.write_record(EXPORT_HEADER)?;
    for candidate in candidates {
        writer.serialize(candidate)?;
    }
    writer.flush()?;
    info!("Saved {} duplicate candidates to {}", candidates.len(), path.display());
    Ok(())
}
