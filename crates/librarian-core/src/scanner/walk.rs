use super::exclusion::ExclusionSet;
use crate::catalog::model::{round_mb, top_level_folder, ROOT_DIR};
use crate::progress::ProgressReporter;
use chrono::{DateTime, Utc};
use std::fs;
use std::path::{Component, Path, PathBuf};
use std::time::Instant;
use tracing::{debug, error, trace};
use walkdir::{DirEntry, WalkDir};

const PROGRESS_INTERVAL: usize = 250;

/// Metadata for one file that survived the exclusion rules.
#[derive(Debug, Clone, PartialEq)]
pub struct ScannedFile {
    pub path: PathBuf,
    /// Parent directory relative to the root, `/`-separated, `.` for the root itself.
    pub relative_dir: String,
    pub stem: String,
    pub extension: String,
    pub top_level_folder: String,
    pub size_mb: f64,
    pub last_modified: String,
}

impl ScannedFile {
    /// Stat `path` (which must live under `root`). Stat failures degrade to a
    /// zero size and an empty timestamp.
    pub fn from_path(root: &Path, path: &Path) -> Option<Self> {
        let relative = path.strip_prefix(root).ok()?;
        let file_name = relative.file_name()?;
        let name_path = Path::new(file_name);

        let stem = name_path
            .file_stem()
            .map(|s| s.to_string_lossy().into_owned())
            .unwrap_or_default();
        let extension = name_path
            .extension()
            .map(|e| e.to_string_lossy().into_owned())
            .unwrap_or_default();

        let segments: Vec<String> = relative
            .parent()
            .map(|p| {
                p.components()
                    .filter_map(|c| match c {
                        Component::Normal(s) => Some(s.to_string_lossy().into_owned()),
                        _ => None,
                    })
                    .collect()
            })
            .unwrap_or_default();
        let relative_dir = if segments.is_empty() {
            ROOT_DIR.to_string()
        } else {
            segments.join("/")
        };
        let top_level = top_level_folder(&relative_dir).to_string();

        let (size_mb, last_modified) = match fs::metadata(path) {
            Ok(metadata) => {
                let modified = match metadata.modified() {
                    Ok(t) => DateTime::<Utc>::from(t).format("%Y-%m-%d %H:%M:%S").to_string(),
                    Err(e) => {
                        error!("Could not read modification time of {}: {}", path.display(), e);
                        String::new()
                    }
                };
                (round_mb(metadata.len()), modified)
            }
            Err(e) => {
                error!("Error reading metadata for {}: {}", path.display(), e);
                (0.0, String::new())
            }
        };

        Some(ScannedFile {
            path: path.to_path_buf(),
            relative_dir,
            stem,
            extension,
            top_level_folder: top_level,
            size_mb,
            last_modified,
        })
    }

    pub fn extension_is(&self, ext: &str) -> bool {
        self.extension.eq_ignore_ascii_case(ext)
    }

    pub fn is_at_root(&self) -> bool {
        self.relative_dir == ROOT_DIR
    }
}

/// Result of one walk: ordinary files, plus `.txt` artifacts found under
/// extraction folders.
#[derive(Debug, Default)]
pub struct ScanOutput {
    pub files: Vec<ScannedFile>,
    pub artifacts: Vec<ScannedFile>,
}

impl ScanOutput {
    pub fn total(&self) -> usize {
        self.files.len() + self.artifacts.len()
    }
}

/// Single-pass, read-only walk of a library tree.
pub struct TreeScanner<'a> {
    root: &'a Path,
    extraction_folder: &'a str,
    exclusions: &'a ExclusionSet,
    ignored_dirs: Vec<PathBuf>,
}

impl<'a> TreeScanner<'a> {
    pub fn new(root: &'a Path, extraction_folder: &'a str, exclusions: &'a ExclusionSet) -> Self {
        Self {
            root,
            extraction_folder,
            exclusions,
            ignored_dirs: Vec::new(),
        }
    }

    /// Never descend into `dir` (used for the catalog folder when it sits inside the root).
    pub fn ignore_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.ignored_dirs.push(dir.into());
        self
    }

    fn root_is_extraction_folder(&self) -> bool {
        self.root
            .file_name()
            .map(|n| n.to_string_lossy() == self.extraction_folder)
            .unwrap_or(false)
    }

    fn keep_entry(&self, entry: &DirEntry) -> bool {
        if entry.depth() == 0 || !entry.file_type().is_dir() {
            return true;
        }
        if self.ignored_dirs.iter().any(|d| entry.path() == d.as_path()) {
            trace!("Skipping ignored directory {}", entry.path().display());
            return false;
        }
        let name = entry.file_name().to_string_lossy();
        if self.exclusions.excludes_dir_name(&name) {
            trace!("Skipping excluded directory {}", entry.path().display());
            return false;
        }
        true
    }

    fn in_nested_extraction_folder(&self, relative: &Path) -> bool {
        relative
            .parent()
            .map(|p| {
                p.components().any(|c| match c {
                    Component::Normal(s) => s.to_string_lossy() == self.extraction_folder,
                    _ => false,
                })
            })
            .unwrap_or(false)
    }

    pub fn scan(&self, reporter: &dyn ProgressReporter) -> ScanOutput {
        let start = Instant::now();
        reporter.on_scan_start();

        let root_is_extraction = self.root_is_extraction_folder();
        let mut output = ScanOutput::default();

        let walker = WalkDir::new(self.root)
            .follow_links(false)
            .sort_by_file_name()
            .into_iter()
            .filter_entry(|entry| self.keep_entry(entry));

        for result in walker {
            let entry = match result {
                Ok(entry) => entry,
                Err(err) => {
                    error!("Error walking {}: {}", self.root.display(), err);
                    continue;
                }
            };
            if !entry.file_type().is_file() {
                continue;
            }

            let path = entry.path();
            let relative = match path.strip_prefix(self.root) {
                Ok(r) => r,
                Err(_) => continue,
            };
            if self.exclusions.is_excluded(relative) {
                trace!("File skipped (excluded): {}", path.display());
                continue;
            }

            let Some(file) = ScannedFile::from_path(self.root, path) else {
                continue;
            };

            let nested = self.in_nested_extraction_folder(relative);
            if nested || root_is_extraction {
                if file.extension_is("txt") {
                    trace!("Found extraction artifact {}", path.display());
                    output.artifacts.push(file);
                } else if nested {
                    trace!("Skipping non-text file in extraction folder: {}", path.display());
                } else {
                    output.files.push(file);
                }
            } else {
                output.files.push(file);
            }

            let seen = output.total();
            if seen % PROGRESS_INTERVAL == 0 {
                reporter.on_scan_progress(seen, &path.to_string_lossy());
            }
        }

        let elapsed = start.elapsed().as_secs_f64();
        debug!(
            "Scan of {} completed in {:.2}s: {} files, {} extraction artifacts",
            self.root.display(),
            elapsed,
            output.files.len(),
            output.artifacts.len()
        );
        reporter.on_scan_complete(output.total(), elapsed);
        output
    }
}
