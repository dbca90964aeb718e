use super::sqlite::Database;
use crate::catalog::{CatalogEntry, EntryKey};
use ahash::{AHashMap, AHashSet};
use rusqlite::{params, params_from_iter, Result, Row};
use tracing::debug;

const SELECT_COLUMNS: &str = "SELECT relative_path, filename, extension, last_modified, \
     file_size_in_MB, textracted, token_count, sha256 FROM catalog";

const INSERT_ENTRY: &str = "INSERT INTO catalog \
     (relative_path, filename, extension, last_modified, file_size_in_MB, \
      textracted, token_count, sha256) \
     VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)";

/// Row counts of one persistence step.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct WriteStats {
    pub inserted: usize,
    pub updated: usize,
    pub deleted: usize,
    pub unchanged: usize,
    pub rebuilt: bool,
}

impl WriteStats {
    pub fn rows_written(&self) -> usize {
        self.inserted + self.updated + self.deleted
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct CatalogSummary {
    pub files: i64,
    pub textracted: i64,
    pub total_tokens: i64,
    pub total_size_mb: f64,
}

fn row_to_entry(row: &Row<'_>) -> Result<CatalogEntry> {
    Ok(CatalogEntry {
        relative_path: row.get(0)?,
        filename: row.get(1)?,
        extension: row.get(2)?,
        last_modified: row.get(3)?,
        file_size_mb: row.get(4)?,
        textracted: row.get(5)?,
        token_count: row.get(6)?,
        sha256: row.get(7)?,
    })
}

impl Database {
    // ── Reads ────────────────────────────────────────────────────

    /// Every row, ordered by natural key.
    pub fn load_catalog(&self) -> Result<Vec<CatalogEntry>> {
        let mut stmt = self.connection().prepare(&format!(
            "{} ORDER BY relative_path, filename, extension",
            SELECT_COLUMNS
        ))?;
        let entries = stmt
            .query_map([], row_to_entry)?
            .collect::<Result<Vec<_>>>()?;
        Ok(entries)
    }

    pub fn count_entries(&self) -> Result<i64> {
        self.connection()
            .query_row("SELECT COUNT(*) FROM catalog", [], |row| row.get(0))
    }

    pub fn get_entry(&self, key: &EntryKey) -> Result<Option<CatalogEntry>> {
        match self.connection().query_row(
            &format!(
                "{} WHERE relative_path = ?1 AND filename = ?2 AND extension = ?3",
                SELECT_COLUMNS
            ),
            params![key.relative_path, key.filename, key.extension],
            row_to_entry,
        ) {
            Ok(entry) => Ok(Some(entry)),
            Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
            Err(e) => Err(e),
        }
    }

    /// Case-insensitive substring match on `filename`; several terms are OR-ed.
    pub fn search_filenames(&self, terms: &[&str]) -> Result<Vec<CatalogEntry>> {
        if terms.is_empty() {
            return Ok(Vec::new());
        }
        let where_clause = (1..=terms.len())
            .map(|i| format!("filename LIKE ?{}", i))
            .collect::<Vec<_>>()
            .join(" OR ");
        let patterns: Vec<String> = terms.iter().map(|t| format!("%{}%", t)).collect();

        let mut stmt = self.connection().prepare(&format!(
            "{} WHERE {} ORDER BY relative_path, filename",
            SELECT_COLUMNS, where_clause
        ))?;
        let entries = stmt
            .query_map(params_from_iter(patterns.iter()), row_to_entry)?
            .collect::<Result<Vec<_>>>()?;
        debug!("Filename search {:?} matched {} rows", terms, entries.len());
        Ok(entries)
    }

    pub fn find_by_sha256(&self, sha256: &str) -> Result<Vec<CatalogEntry>> {
        let mut stmt = self.connection().prepare(&format!(
            "{} WHERE sha256 = ?1 ORDER BY relative_path, filename, extension",
            SELECT_COLUMNS
        ))?;
        let entries = stmt
            .query_map(params![sha256], row_to_entry)?
            .collect::<Result<Vec<_>>>()?;
        Ok(entries)
    }

    pub fn catalog_summary(&self) -> Result<CatalogSummary> {
        self.connection().query_row(
            "SELECT COUNT(*), COALESCE(SUM(textracted), 0), COALESCE(SUM(token_count), 0), \
                    COALESCE(SUM(file_size_in_MB), 0.0) \
             FROM catalog",
            [],
            |row| {
                Ok(CatalogSummary {
                    files: row.get(0)?,
                    textracted: row.get(1)?,
                    total_tokens: row.get(2)?,
                    total_size_mb: row.get(3)?,
                })
            },
        )
    }

    // ── Writes ───────────────────────────────────────────────────

    /// Drop and recreate the schema, then bulk-insert `entries`.
    pub fn rebuild_catalog(&self, entries: &[CatalogEntry]) -> Result<WriteStats> {
        let tx = self.connection().unchecked_transaction()?;
        tx.execute_batch("DROP TABLE IF EXISTS catalog;")?;
        tx.execute_batch(include_str!("schema.sql"))?;
        let mut inserted = 0;
        {
            let mut stmt = tx.prepare_cached(INSERT_ENTRY)?;
            for entry in entries {
                inserted += stmt.execute(params![
                    entry.relative_path,
                    entry.filename,
                    entry.extension,
                    entry.last_modified,
                    entry.file_size_mb,
                    entry.textracted,
                    entry.token_count,
                    entry.sha256,
                ])?;
            }
        }
        tx.commit()?;
        debug!("Rebuilt catalog with {} rows", inserted);
        Ok(WriteStats {
            inserted,
            rebuilt: true,
            ..WriteStats::default()
        })
    }

    /// Bring the table in line with `entries` touching only the difference:
    /// delete vanished keys, update changed rows, insert new keys.
    pub fn upsert_catalog(&self, entries: &[CatalogEntry]) -> Result<WriteStats> {
        let current: AHashMap<EntryKey, CatalogEntry> = self
            .load_catalog()?
            .into_iter()
            .map(|e| (e.key(), e))
            .collect();
        let incoming: AHashSet<EntryKey> = entries.iter().map(CatalogEntry::key).collect();

        let mut stats = WriteStats::default();
        let tx = self.connection().unchecked_transaction()?;
        {
            let mut delete_stmt = tx.prepare_cached(
                "DELETE FROM catalog WHERE relative_path = ?1 AND filename = ?2 AND extension = ?3",
            )?;
            for key in current.keys().filter(|k| !incoming.contains(*k)) {
                stats.deleted +=
                    delete_stmt.execute(params![key.relative_path, key.filename, key.extension])?;
            }

            let mut insert_stmt = tx.prepare_cached(INSERT_ENTRY)?;
            let mut update_stmt = tx.prepare_cached(
                "UPDATE catalog SET last_modified = ?4, file_size_in_MB = ?5, textracted = ?6, \
                     token_count = ?7, sha256 = ?8 \
                 WHERE relative_path = ?1 AND filename = ?2 AND extension = ?3",
            )?;
            let mut written: AHashSet<EntryKey> = AHashSet::new();
            for entry in entries {
                let key = entry.key();
                let values = params![
                    entry.relative_path,
                    entry.filename,
                    entry.extension,
                    entry.last_modified,
                    entry.file_size_mb,
                    entry.textracted,
                    entry.token_count,
                    entry.sha256,
                ];
                match current.get(&key) {
                    _ if written.contains(&key) => {
                        // Later duplicate of a key in the same batch: last one wins.
                        stats.updated += update_stmt.execute(values)?;
                    }
                    None => stats.inserted += insert_stmt.execute(values)?,
                    Some(existing) if existing != entry => {
                        stats.updated += update_stmt.execute(values)?
                    }
                    Some(_) => stats.unchanged += 1,
                }
                written.insert(key);
            }
        }
        tx.commit()?;
        debug!(
            "Upserted catalog: {} inserted, {} updated, {} deleted, {} unchanged",
            stats.inserted, stats.updated, stats.deleted, stats.unchanged
        );
        Ok(stats)
    }
}
