mod commands;
mod logging;
mod progress;

use std::env;
use std::path::Path;
use std::process;

use anyhow::{Context, Result};
use clap::{CommandFactory, Parser};
use colored::*;
use commands::{CatalogArgs, Cli, Commands};
use dotenv::dotenv;
use librarian_core::duplicates::{export_duplicates_csv, find_duplicates_in_store};
use librarian_core::storage::Database;
use librarian_core::{CatalogEngine, Confidence, Profile, RunOptions};
use progress::CliReporter;
use tracing::{error, info, warn};

fn main() -> Result<()> {
    dotenv().ok();

    let filter = env::var("TRACING_LEVEL").unwrap_or_else(|_| "info".to_string());
    let log_file_path =
        env::var("LOG_FILE_PATH").unwrap_or_else(|_| logging::DEFAULT_LOG_FILE.to_string());
    let _guard = logging::init_logger(&filter, Path::new(&log_file_path));

    let args = Cli::parse();
    let Some(command) = args.command else {
        let _ = Cli::command().print_long_help();
        return Ok(());
    };

    let profile = match librarian_core::config::load_profile(args.profile.as_deref()) {
        Ok(profile) => profile,
        Err(err) => {
            error!("Error loading profile: {}", err);
            process::exit(1);
        }
    };

    let outcome = match command {
        Commands::Catalog(catalog_args) => run_catalog(profile, &catalog_args),
        Commands::FindDuplicates => run_find_duplicates(&profile),
        Commands::Search { terms } => run_search(&profile, &terms),
        Commands::Summary => run_summary(&profile),
        Commands::PrintConfig => {
            println!("Profile: {:#?}", profile);
            Ok(())
        }
    };

    if let Err(err) = outcome {
        error!("Error: {:#}", err);
        process::exit(1);
    }
    Ok(())
}

fn open_store(profile: &Profile) -> Result<Database> {
    let path = profile.store_path();
    Database::open(&path).with_context(|| format!("opening catalog store {}", path.display()))
}

fn run_catalog(profile: Profile, args: &CatalogArgs) -> Result<()> {
    let options = RunOptions {
        force_rebuild: args.recatalog,
        tokenize: args.tokenize || args.recatalog,
        convert: args.convert || args.recatalog,
        backup: args.backup_db,
        save_csv: args.save_csv,
    };
    let engine = CatalogEngine::new(profile).with_options(options);
    let reporter = CliReporter::new();
    let report = engine.run(&reporter)?;

    println!();
    info!(
        "Scan: {}, Hash: {}, Store: {}",
        format!("{:.2}s", report.scan_duration_secs).green(),
        format!("{:.2}s", report.hash_duration_secs).green(),
        format!("{:.2}s", report.write_duration_secs).green(),
    );
    info!(
        "{} rows cataloged, {} textracted, {} extraction artifacts ({} converted this run)",
        format!("{}", report.catalog.len()).cyan(),
        format!("{}", report.textracted).cyan(),
        report.artifacts_found,
        report.artifacts_converted,
    );
    match &report.write {
        Some(stats) => info!(
            "Store: {} inserted, {} updated, {} deleted, {} unchanged{}",
            stats.inserted,
            stats.updated,
            stats.deleted,
            stats.unchanged,
            if stats.rebuilt { " (rebuilt)" } else { "" }
        ),
        None => warn!("{}", "Catalog store was not updated this run".red()),
    }
    if let Some(path) = &report.snapshot_path {
        info!("Snapshot: {}", path.display());
    }
    Ok(())
}

fn run_find_duplicates(profile: &Profile) -> Result<()> {
    let db = open_store(profile)?;
    let candidates = find_duplicates_in_store(&db, &profile.duplicate_exclusions)?;

    for candidate in &candidates {
        let label = match candidate.confidence {
            Confidence::Exact => candidate.confidence.to_string().red(),
            Confidence::High => candidate.confidence.to_string().yellow(),
            Confidence::Possible => candidate.confidence.to_string().normal(),
        };
        println!(
            "[{}] {}: {} <-> {} ({} MB)",
            label,
            candidate.top_level_folder,
            candidate.filename1,
            candidate.filename2,
            candidate
                .file_size_mb
                .map(|s| format!("{:.3}", s))
                .unwrap_or_default()
        );
    }

    let path = profile.duplicates_path();
    export_duplicates_csv(&candidates, &path)?;
    info!(
        "{} duplicate candidates saved to {}",
        format!("{}", candidates.len()).red(),
        path.display()
    );
    Ok(())
}

fn run_search(profile: &Profile, terms: &[String]) -> Result<()> {
    let db = open_store(profile)?;
    let terms: Vec<&str> = terms.iter().map(String::as_str).collect();
    let hits = db.search_filenames(&terms)?;

    for entry in &hits {
        let name = if entry.extension.is_empty() {
            entry.filename.clone()
        } else {
            format!("{}.{}", entry.filename, entry.extension)
        };
        let marker = if entry.textracted { "T".green() } else { " ".normal() };
        println!("{} {}/{}", marker, entry.relative_path, name);
    }
    info!("{} matching files", format!("{}", hits.len()).cyan());
    Ok(())
}

fn run_summary(profile: &Profile) -> Result<()> {
    let db = open_store(profile)?;
    let summary = db.catalog_summary()?;
    println!("Profile:     {}", profile.name.cyan());
    println!("Files:       {}", summary.files);
    println!("Textracted:  {}", summary.textracted);
    println!("Tokens:      {}", summary.total_tokens);
    println!("Total size:  {:.3} MB", summary.total_size_mb);
    Ok(())
}
