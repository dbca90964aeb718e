pub mod catalog;
pub mod config;
pub mod duplicates;
pub mod engine;
pub mod error;
pub mod extraction;
pub mod hasher;
pub mod progress;
pub mod scanner;
pub mod storage;

pub use catalog::{CatalogEntry, EntryKey};
pub use config::{Profile, ProfileConfig};
pub use duplicates::{Confidence, DuplicateCandidate};
pub use engine::{CatalogEngine, RunOptions, RunReport};
pub use error::Error;
pub use progress::{ProgressReporter, SilentReporter};
