use serde::Serialize;
use std::fmt;

pub const HIGH_RATIO: f64 = 90.0;
pub const HIGH_LEVENSHTEIN: f64 = 0.85;
pub const POSSIBLE_RATIO: f64 = 80.0;
pub const POSSIBLE_LEVENSHTEIN: f64 = 0.70;

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Confidence {
    Exact,
    High,
    Possible,
}

impl fmt::Display for Confidence {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            Confidence::Exact => "exact",
            Confidence::High => "high",
            Confidence::Possible => "possible",
        };
        f.write_str(label)
    }
}

/// Lowercase, every non-alphanumeric char becomes a separator, tokens sorted
/// and rejoined with single spaces.
fn sorted_tokens(name: &str) -> String {
    let cleaned: String = name
        .chars()
        .map(|c| if c.is_alphanumeric() { c } else { ' ' })
        .collect::<String>()
        .to_lowercase();
    let mut tokens: Vec<&str> = cleaned.split_whitespace().collect();
    tokens.sort_unstable();
    tokens.join(" ")
}

fn longest_common_subsequence(a: &[char], b: &[char]) -> usize {
    let mut prev = vec![0usize; b.len() + 1];
    let mut curr = vec![0usize; b.len() + 1];
    for ca in a {
        for (j, cb) in b.iter().enumerate() {
            curr[j + 1] = if ca == cb {
                prev[j] + 1
            } else {
                curr[j].max(prev[j + 1])
            };
        }
        std::mem::swap(&mut prev, &mut curr);
    }
    prev[b.len()]
}

/// Order-insensitive similarity in `[0, 100]`: both names are normalized
/// and token-sorted, then scored by insert/delete distance.
pub fn token_sort_ratio(name1: &str, name2: &str) -> f64 {
    let a: Vec<char> = sorted_tokens(name1).chars().collect();
    let b: Vec<char> = sorted_tokens(name2).chars().collect();
    if a.is_empty() || b.is_empty() {
        return 0.0;
    }
    let total = a.len() + b.len();
    let indel = total - 2 * longest_common_subsequence(&a, &b);
    100.0 * (1.0 - indel as f64 / total as f64)
}

/// Classic edit distance (insert, delete, substitute), counted in chars.
pub fn levenshtein_distance(s1: &str, s2: &str) -> usize {
    let a: Vec<char> = s1.chars().collect();
    let b: Vec<char> = s2.chars().collect();

    let mut prev: Vec<usize> = (0..=b.len()).collect();
    let mut curr = vec![0usize; b.len() + 1];
    for (i, ca) in a.iter().enumerate() {
        curr[0] = i + 1;
        for (j, cb) in b.iter().enumerate() {
            let cost = usize::from(ca != cb);
            curr[j + 1] = (prev[j + 1] + 1).min(curr[j] + 1).min(prev[j] + cost);
        }
        std::mem::swap(&mut prev, &mut curr);
    }
    prev[b.len()]
}

/// `1 - distance / max_len`; two empty names count as identical.
pub fn normalized_levenshtein(s1: &str, s2: &str) -> f64 {
    let max_len = s1.chars().count().max(s2.chars().count());
    if max_len == 0 {
        return 1.0;
    }
    1.0 - levenshtein_distance(s1, s2) as f64 / max_len as f64
}

/// Fuzzy tier for a same-folder, same-size pair, `None` when below the floor.
pub fn classify(name1: &str, name2: &str) -> Option<Confidence> {
    let ratio = token_sort_ratio(name1, name2);
    let lev = normalized_levenshtein(name1, name2);
    if ratio >= HIGH_RATIO && lev >= HIGH_LEVENSHTEIN {
        Some(Confidence::High)
    } else if ratio >= POSSIBLE_RATIO && lev >= POSSIBLE_LEVENSHTEIN {
        Some(Confidence::Possible)
    } else {
        None
    }
}
