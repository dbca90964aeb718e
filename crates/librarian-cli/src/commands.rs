use clap::{Args, Parser, Subcommand};

#[derive(Debug, Parser)]
#[command(name = "librarian")]
#[command(about = "Catalog a document library and find duplicate files", long_about = None)]
pub struct Cli {
    /// Library profile to use (defaults to DEFAULT_LIBRARY_PROFILE, then the first profile)
    #[arg(short, long, global = true)]
    pub profile: Option<String>,

    #[command(subcommand)]
    pub command: Option<Commands>,
}

#[derive(Debug, Subcommand)]
pub enum Commands {
    /// Scan the library and bring the catalog up to date
    Catalog(CatalogArgs),
    /// Find duplicate candidates in the catalog and save them to CSV
    FindDuplicates,
    /// Search cataloged filenames (case-insensitive substring match)
    Search {
        #[arg(required = true)]
        terms: Vec<String>,
    },
    /// Print catalog totals
    Summary,
    /// Print the resolved profile
    PrintConfig,
}

#[derive(Debug, Args)]
pub struct CatalogArgs {
    /// Rebuild the catalog from scratch (implies --tokenize and --convert)
    #[arg(long)]
    pub recatalog: bool,
    /// Estimate token counts for extracted text
    #[arg(long)]
    pub tokenize: bool,
    /// Extract text from PDF, Markdown and subtitle files that have none yet
    #[arg(long)]
    pub convert: bool,
    /// Back up the catalog store before writing
    #[arg(long)]
    pub backup_db: bool,
    /// Save a CSV snapshot of the catalog
    #[arg(long)]
    pub save_csv: bool,
}
