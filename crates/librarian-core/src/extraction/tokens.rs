use std::fs;
use std::io;
use std::path::Path;
use tracing::{error, trace};

/// Model-agnostic token estimate: the average of `words × 1.25` and
/// `chars / 4 × 0.75`, truncated.
pub fn estimate_tokens(text: &str) -> i64 {
    let words = text.split_whitespace().count() as f64;
    let chars = text.chars().count() as f64;
    let by_words = words * 1.25;
    let by_chars = (chars / 4.0) * 0.75;
    ((by_words + by_chars) / 2.0) as i64
}

pub fn count_file_tokens(path: &Path) -> io::Result<i64> {
    let text = fs::read_to_string(path)?;
    Ok(estimate_tokens(&text))
}

/// Token count for a text file, or `None` (logged) when it cannot be read as UTF-8.
pub fn token_count_or_blank(path: &Path) -> Option<i64> {
    match count_file_tokens(path) {
        Ok(count) => {
            trace!("Token count for {}: {}", path.display(), count);
            Some(count)
        }
        Err(e) => {
            error!("Token counting failed for {}: {}", path.display(), e);
            None
        }
    }
}
