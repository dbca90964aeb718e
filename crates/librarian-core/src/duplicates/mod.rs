pub mod detector;
pub mod similarity;

pub use detector::{export_duplicates_csv, find_duplicates, find_duplicates_in_store, DuplicateCandidate};
pub use similarity::{classify, normalized_levenshtein, token_sort_ratio, Confidence};
