use crate::scanner::ScannedFile;
use ahash::{AHashMap, AHashSet};
use std::path::{Path, PathBuf};
use tracing::trace;

/// Extensions whose text may live as a `.txt` artifact in an extraction folder.
pub const SOURCE_EXTENSIONS: [&str; 3] = ["pdf", "md", "vtt"];

pub fn is_source_document(file: &ScannedFile) -> bool {
    SOURCE_EXTENSIONS.iter().any(|ext| file.extension_is(ext))
}

/// Scope a source document is correlated in. Files directly under the root
/// pair with the extraction folder that sits directly under the root.
pub fn source_scope<'a>(file: &'a ScannedFile, extraction_folder: &'a str) -> &'a str {
    if file.is_at_root() {
        extraction_folder
    } else {
        &file.top_level_folder
    }
}

/// Lookup of extracted text artifacts keyed by `(top_level_folder, stem)`.
///
/// Lookups never cross top-level folders: `Physics/textracted/intro.txt`
/// does not satisfy `Chemistry/intro.pdf`.
#[derive(Debug, Default)]
pub struct ExtractionIndex {
    artifacts: AHashMap<(String, String), PathBuf>,
}

impl ExtractionIndex {
    pub fn build(artifacts: &[ScannedFile]) -> Self {
        let mut index = ExtractionIndex::default();
        for artifact in artifacts {
            index.register(&artifact.top_level_folder, &artifact.stem, artifact.path.clone());
        }
        index
    }

    pub fn register(&mut self, scope: &str, stem: &str, path: PathBuf) {
        trace!("Registering artifact ({}, {}) -> {}", scope, stem, path.display());
        self.artifacts
            .insert((scope.to_string(), stem.to_string()), path);
    }

    pub fn lookup(&self, scope: &str, stem: &str) -> Option<&Path> {
        self.artifacts
            .get(&(scope.to_string(), stem.to_string()))
            .map(PathBuf::as_path)
    }

    /// Artifact linked to a source document, if any.
    pub fn artifact_for(&self, source: &ScannedFile, extraction_folder: &str) -> Option<&Path> {
        if !is_source_document(source) {
            return None;
        }
        self.lookup(source_scope(source, extraction_folder), &source.stem)
    }

    pub fn is_empty(&self) -> bool {
        self.artifacts.is_empty()
    }
}

/// `(scope, stem)` of every source document in the scan. An artifact whose
/// own `(top_level_folder, stem)` is in this set is attached to a source row.
pub fn source_keys(files: &[ScannedFile], extraction_folder: &str) -> AHashSet<(String, String)> {
    files
        .iter()
        .filter(|f| is_source_document(f))
        .map(|f| (source_scope(f, extraction_folder).to_string(), f.stem.clone()))
        .collect()
}
