use super::model::{CatalogEntry, EntryKey};
use ahash::AHashSet;
use std::collections::BTreeMap;
use tracing::debug;

/// Merge a fresh scan into the prior catalog.
///
/// Union keyed by `(relative_path, filename, extension)` with the fresh row
/// winning every collision, then restricted to the keys present in `fresh`.
/// Rows whose file vanished from disk fall out here; there is no separate
/// delete pass. Output is sorted by key.
pub fn reconcile(prior: Vec<CatalogEntry>, fresh: Vec<CatalogEntry>) -> Vec<CatalogEntry> {
    let prior_len = prior.len();
    let present: AHashSet<EntryKey> = fresh.iter().map(CatalogEntry::key).collect();

    let mut merged: BTreeMap<EntryKey, CatalogEntry> = BTreeMap::new();
    for entry in prior.into_iter().chain(fresh) {
        merged.insert(entry.key(), entry);
    }

    let before_filter = merged.len();
    merged.retain(|key, _| present.contains(key));

    debug!(
        "Reconciled {} prior rows with {} observed keys: {} kept, {} dropped",
        prior_len,
        present.len(),
        merged.len(),
        before_filter - merged.len()
    );

    merged.into_values().collect()
}
