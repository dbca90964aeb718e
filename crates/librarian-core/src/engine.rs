use crate::catalog::{reconcile, CatalogEntry};
use crate::config::Profile;
use crate::error::Error;
use crate::extraction::convert::convert_missing;
use crate::extraction::correlator::source_keys;
use crate::extraction::{default_converters, token_count_or_blank, Converter, ExtractionIndex};
use crate::hasher::content_digest;
use crate::progress::ProgressReporter;
use crate::scanner::{ScanOutput, TreeScanner};
use crate::storage::{backup_store, export_catalog_csv, Database, WriteStats};
use std::fs;
use std::path::PathBuf;
use std::time::Instant;
use tracing::{debug, error, info, info_span};

/// Flags of one catalog run.
#[derive(Debug, Clone, Copy, Default)]
pub struct RunOptions {
    /// Ignore the stored catalog and rewrite the table from scratch.
    pub force_rebuild: bool,
    pub tokenize: bool,
    /// Produce missing `.txt` artifacts before correlating.
    pub convert: bool,
    /// Copy the store aside before writing.
    pub backup: bool,
    pub save_csv: bool,
}

#[derive(Debug, Default)]
pub struct RunReport {
    pub profile: String,
    pub files_scanned: usize,
    pub artifacts_found: usize,
    pub artifacts_converted: usize,
    pub textracted: usize,
    pub files_hashed: usize,
    pub scan_duration_secs: f64,
    pub hash_duration_secs: f64,
    pub write_duration_secs: f64,
    /// `None` when the store could not be opened or written this run.
    pub write: Option<WriteStats>,
    pub backup_path: Option<PathBuf>,
    pub snapshot_path: Option<PathBuf>,
    pub catalog: Vec<CatalogEntry>,
}

pub struct CatalogEngine {
    profile: Profile,
    options: RunOptions,
    converters: Vec<Box<dyn Converter>>,
}

impl CatalogEngine {
    pub fn new(profile: Profile) -> Self {
        Self {
            profile,
            options: RunOptions::default(),
            converters: default_converters(),
        }
    }

    pub fn with_options(mut self, options: RunOptions) -> Self {
        self.options = options;
        self
    }

    pub fn with_converters(mut self, converters: Vec<Box<dyn Converter>>) -> Self {
        self.converters = converters;
        self
    }

    pub fn profile(&self) -> &Profile {
        &self.profile
    }

    /// Back up the store if asked, open it, load the prior catalog and
    /// reconcile it with the tree on disk. Only an invalid profile is fatal;
    /// store problems leave `write` empty.
    pub fn run(&self, reporter: &dyn ProgressReporter) -> Result<RunReport, Error> {
        self.profile.validate()?;
        let span = info_span!("catalog_run", profile = %self.profile.name);
        let _enter = span.enter();

        let store_path = self.profile.store_path();
        // Backup precedes open: opening migrates legacy schemas.
        let backup_path = if self.options.backup {
            backup_store(&store_path)
        } else {
            None
        };

        let db = match fs::create_dir_all(&self.profile.catalog_dir) {
            Err(e) => {
                error!(
                    "Could not create catalog folder {}: {}",
                    self.profile.catalog_dir.display(),
                    e
                );
                None
            }
            Ok(()) => match Database::open(&store_path) {
                Ok(db) => Some(db),
                Err(e) => {
                    error!("Could not open catalog store {}: {}", store_path.display(), e);
                    None
                }
            },
        };

        let prior = match (&db, self.options.force_rebuild) {
            (Some(db), false) => db.load_catalog().unwrap_or_else(|e| {
                error!("Could not load prior catalog, starting empty: {}", e);
                Vec::new()
            }),
            _ => Vec::new(),
        };
        info!(
            "Starting catalog run over {} ({} prior rows)",
            self.profile.root.display(),
            prior.len()
        );

        let mut report = self.reconcile_and_persist(prior, db.as_ref(), reporter);
        report.backup_path = backup_path;
        Ok(report)
    }

    /// Scan, correlate, hash, merge with `prior`, then persist into `db`.
    /// Persistence failures are logged and leave `write` empty. Backups are
    /// taken by [`CatalogEngine::run`] before the store is opened.
    pub fn reconcile_and_persist(
        &self,
        prior: Vec<CatalogEntry>,
        db: Option<&Database>,
        reporter: &dyn ProgressReporter,
    ) -> RunReport {
        let mut report = RunReport {
            profile: self.profile.name.clone(),
            ..RunReport::default()
        };

        let scan_start = Instant::now();
        let mut scan = TreeScanner::new(
            &self.profile.root,
            &self.profile.extraction_folder,
            &self.profile.exclusions,
        )
        .ignore_dir(&self.profile.catalog_dir)
        .scan(reporter);
        report.scan_duration_secs = scan_start.elapsed().as_secs_f64();

        let mut index = ExtractionIndex::build(&scan.artifacts);
        if self.options.convert {
            let produced = convert_missing(
                &self.profile.root,
                &self.profile.extraction_folder,
                &scan.files,
                &mut index,
                &self.converters,
            );
            report.artifacts_converted = produced.len();
            scan.artifacts.extend(produced);
        }
        report.files_scanned = scan.files.len();
        report.artifacts_found = scan.artifacts.len();

        let hash_start = Instant::now();
        let (fresh, hashed) = self.build_entries(&scan, &index, reporter);
        report.hash_duration_secs = hash_start.elapsed().as_secs_f64();
        report.files_hashed = hashed;
        report.textracted = fresh.iter().filter(|e| e.textracted).count();

        let catalog = reconcile(prior, fresh);

        if let Some(db) = db {
            let write_start = Instant::now();
            reporter.on_db_write_start();
            let written = if self.options.force_rebuild {
                db.rebuild_catalog(&catalog)
            } else {
                db.upsert_catalog(&catalog)
            };
            report.write_duration_secs = write_start.elapsed().as_secs_f64();
            match written {
                Ok(stats) => {
                    reporter.on_db_write_complete(stats.rows_written(), report.write_duration_secs);
                    report.write = Some(stats);
                }
                Err(e) => {
                    error!("Catalog not updated this run, store write failed: {}", e);
                    reporter.on_db_write_complete(0, report.write_duration_secs);
                }
            }
        }

        if self.options.save_csv {
            let path = self.profile.snapshot_path();
            match export_catalog_csv(&catalog, &path) {
                Ok(()) => report.snapshot_path = Some(path),
                Err(e) => error!("Could not save catalog snapshot: {}", e),
            }
        }

        info!(
            "Catalog run finished: {} rows, {} textracted",
            catalog.len(),
            report.textracted
        );
        report.catalog = catalog;
        report
    }

    fn build_entries(
        &self,
        scan: &ScanOutput,
        index: &ExtractionIndex,
        reporter: &dyn ProgressReporter,
    ) -> (Vec<CatalogEntry>, usize) {
        let extraction_folder = self.profile.extraction_folder.as_str();
        let tokenize = self.options.tokenize;
        let mut entries = Vec::with_capacity(scan.total());

        let total = scan.files.len();
        reporter.on_hash_start(total);
        let start = Instant::now();
        let mut hashed = 0;
        for (i, file) in scan.files.iter().enumerate() {
            let mut entry = CatalogEntry::from_scanned(file);
            if let Some(artifact) = index.artifact_for(file, extraction_folder) {
                entry.textracted = true;
                if tokenize {
                    entry.token_count = token_count_or_blank(artifact);
                }
            } else if tokenize && file.extension_is("txt") {
                entry.token_count = token_count_or_blank(&file.path);
            }
            entry.sha256 = content_digest(&file.path);
            if !entry.sha256.is_empty() {
                hashed += 1;
            }
            entries.push(entry);
            reporter.on_hash_progress(i + 1, total);
        }
        reporter.on_hash_complete(hashed, start.elapsed().as_secs_f64());

        let sources = source_keys(&scan.files, extraction_folder);
        for artifact in &scan.artifacts {
            let mut entry = CatalogEntry::from_scanned(artifact);
            entry.textracted = true;
            if sources.contains(&(artifact.top_level_folder.clone(), artifact.stem.clone())) {
                entry.file_size_mb = None;
            }
            if tokenize {
                entry.token_count = token_count_or_blank(&artifact.path);
            }
            entries.push(entry);
        }

        debug!(
            "Built {} fresh entries ({} files, {} artifacts)",
            entries.len(),
            scan.files.len(),
            scan.artifacts.len()
        );
        (entries, hashed)
    }
}
