use librarian_core::storage::sqlite::backup_path_for;
use librarian_core::storage::{backup_store, Database};
use librarian_core::{CatalogEntry, EntryKey};
use tempfile::tempdir;

fn make_entry(dir: &str, name: &str, ext: &str, size: Option<f64>, sha: &str) -> CatalogEntry {
    CatalogEntry {
        relative_path: dir.to_string(),
        filename: name.to_string(),
        extension: ext.to_string(),
        last_modified: "2024-05-01 10:00:00".to_string(),
        file_size_mb: size,
        textracted: false,
        token_count: None,
        sha256: sha.to_string(),
    }
}

fn sample_catalog() -> Vec<CatalogEntry> {
    let mut paper = make_entry("A", "paper", "pdf", Some(1.25), "aaa");
    paper.textracted = true;
    paper.token_count = Some(300);
    let mut artifact = make_entry("A/textracted", "paper", "txt", None, "");
    artifact.textracted = true;
    artifact.token_count = Some(300);
    vec![
        paper,
        artifact,
        make_entry("B", "Notes", "md", Some(0.002), "bbb"),
        make_entry(".", "readme", "txt", Some(0.001), "ccc"),
    ]
}

#[test]
fn test_rebuild_then_load_round_trip() {
    let db = Database::open_in_memory().unwrap();
    let catalog = sample_catalog();
    let stats = db.rebuild_catalog(&catalog).unwrap();
    assert!(stats.rebuilt);
    assert_eq!(stats.inserted, 4);

    let loaded = db.load_catalog().unwrap();
    assert_eq!(loaded.len(), 4);
    // Ordered by (relative_path, filename, extension)
    assert_eq!(loaded[0].relative_path, ".");
    assert_eq!(loaded[1].relative_path, "A");
    assert_eq!(loaded[2].relative_path, "A/textracted");

    let artifact = &loaded[2];
    assert_eq!(artifact.file_size_mb, None);
    assert!(artifact.textracted);
    assert_eq!(artifact.sha256, "");
    assert_eq!(loaded[1], catalog[0]);
}

#[test]
fn test_rebuild_replaces_previous_contents() {
    let db = Database::open_in_memory().unwrap();
    db.rebuild_catalog(&sample_catalog()).unwrap();
    db.rebuild_catalog(&[make_entry("C", "only", "pdf", Some(1.0), "zzz")])
        .unwrap();
    assert_eq!(db.count_entries().unwrap(), 1);
}

#[test]
fn test_upsert_applies_only_the_difference() {
    let db = Database::open_in_memory().unwrap();
    let first = sample_catalog();
    let stats = db.upsert_catalog(&first).unwrap();
    assert_eq!(stats.inserted, 4);
    assert!(!stats.rebuilt);

    // Same catalog again: nothing to do.
    let stats = db.upsert_catalog(&first).unwrap();
    assert_eq!(stats.unchanged, 4);
    assert_eq!(stats.rows_written(), 0);

    // One changed, one removed, one added.
    let mut next = first.clone();
    next[0].sha256 = "changed".to_string();
    next.retain(|e| e.filename != "Notes");
    next.push(make_entry("B", "fresh", "pdf", Some(3.0), "ddd"));

    let stats = db.upsert_catalog(&next).unwrap();
    assert_eq!(stats.updated, 1);
    assert_eq!(stats.deleted, 1);
    assert_eq!(stats.inserted, 1);
    assert_eq!(stats.unchanged, 2);

    let key = EntryKey {
        relative_path: "A".to_string(),
        filename: "paper".to_string(),
        extension: "pdf".to_string(),
    };
    assert_eq!(db.get_entry(&key).unwrap().unwrap().sha256, "changed");
    assert!(db.search_filenames(&["Notes"]).unwrap().is_empty());
    assert_eq!(db.count_entries().unwrap(), 4);
}

#[test]
fn test_upsert_with_empty_catalog_clears_store() {
    let db = Database::open_in_memory().unwrap();
    db.upsert_catalog(&sample_catalog()).unwrap();
    let stats = db.upsert_catalog(&[]).unwrap();
    assert_eq!(stats.deleted, 4);
    assert_eq!(db.count_entries().unwrap(), 0);
}

#[test]
fn test_search_is_case_insensitive_and_ors_terms() {
    let db = Database::open_in_memory().unwrap();
    db.rebuild_catalog(&sample_catalog()).unwrap();

    let hits = db.search_filenames(&["PAPER"]).unwrap();
    assert_eq!(hits.len(), 2);
    assert_eq!(hits[0].relative_path, "A");
    assert_eq!(hits[1].relative_path, "A/textracted");

    let hits = db.search_filenames(&["notes", "readme"]).unwrap();
    let names: Vec<&str> = hits.iter().map(|e| e.filename.as_str()).collect();
    assert_eq!(names, vec!["readme", "Notes"]);

    assert!(db.search_filenames(&[]).unwrap().is_empty());
}

#[test]
fn test_find_by_sha256() {
    let db = Database::open_in_memory().unwrap();
    let mut catalog = sample_catalog();
    catalog.push(make_entry("C", "copy", "pdf", Some(1.25), "aaa"));
    db.rebuild_catalog(&catalog).unwrap();

    let hits = db.find_by_sha256("aaa").unwrap();
    assert_eq!(hits.len(), 2);
    assert!(db.find_by_sha256("missing").unwrap().is_empty());
}

#[test]
fn test_catalog_summary() {
    let db = Database::open_in_memory().unwrap();
    let empty = db.catalog_summary().unwrap();
    assert_eq!(empty.files, 0);
    assert_eq!(empty.total_size_mb, 0.0);

    db.rebuild_catalog(&sample_catalog()).unwrap();
    let summary = db.catalog_summary().unwrap();
    assert_eq!(summary.files, 4);
    assert_eq!(summary.textracted, 2);
    assert_eq!(summary.total_tokens, 600);
    assert!((summary.total_size_mb - 1.253).abs() < 1e-9);
}

#[test]
fn test_schema_indexes_exist() {
    let db = Database::open_in_memory().unwrap();
    let mut stmt = db
        .connection()
        .prepare("SELECT name FROM sqlite_master WHERE type = 'index' AND tbl_name = 'catalog' ORDER BY name")
        .unwrap();
    let names: Vec<String> = stmt
        .query_map([], |row| row.get(0))
        .unwrap()
        .collect::<Result<_, _>>()
        .unwrap();
    for wanted in [
        "idx_catalog_extension",
        "idx_catalog_filename",
        "idx_catalog_sha256",
        "idx_catalog_textracted",
    ] {
        assert!(names.iter().any(|n| n == wanted), "missing index {}", wanted);
    }
}

#[test]
fn test_legacy_store_without_version_is_recreated() {
    let tmp = tempdir().unwrap();
    let path = tmp.path().join("library.sqlite");
    {
        let conn = rusqlite::Connection::open(&path).unwrap();
        conn.execute_batch(
            "CREATE TABLE catalog (relative_path TEXT, filename TEXT, extension TEXT);
             INSERT INTO catalog VALUES ('A', 'x', 'pdf');
             INSERT INTO catalog VALUES ('A', 'x', 'pdf');",
        )
        .unwrap();
    }

    let db = Database::open(&path).unwrap();
    assert_eq!(db.count_entries().unwrap(), 0);
    let version: i64 = db
        .connection()
        .query_row("PRAGMA user_version", [], |row| row.get(0))
        .unwrap();
    assert_eq!(version, 1);
    db.upsert_catalog(&sample_catalog()).unwrap();
    assert_eq!(db.count_entries().unwrap(), 4);
}

#[test]
fn test_store_survives_reopen() {
    let tmp = tempdir().unwrap();
    let path = tmp.path().join("library.sqlite");
    {
        let db = Database::open(&path).unwrap();
        db.upsert_catalog(&sample_catalog()).unwrap();
    }
    let db = Database::open(&path).unwrap();
    assert_eq!(db.load_catalog().unwrap().len(), 4);
}

#[test]
fn test_backup_store_copies_contents() {
    let tmp = tempdir().unwrap();
    let path = tmp.path().join("library.sqlite");
    {
        let db = Database::open(&path).unwrap();
        db.upsert_catalog(&sample_catalog()).unwrap();
    }

    let backup = backup_store(&path).unwrap();
    let name = backup.file_name().unwrap().to_string_lossy().into_owned();
    assert!(name.starts_with("library-"));
    assert!(name.ends_with(".sqlite.bak"));

    let copy = Database::open(&backup).unwrap();
    assert_eq!(copy.count_entries().unwrap(), 4);
}

#[test]
fn test_backup_store_keeps_legacy_rows() {
    let tmp = tempdir().unwrap();
    let path = tmp.path().join("library.sqlite");
    {
        let conn = rusqlite::Connection::open(&path).unwrap();
        conn.execute_batch(
            "CREATE TABLE catalog (relative_path TEXT, filename TEXT, extension TEXT);
             INSERT INTO catalog VALUES ('A', 'x', 'pdf');
             INSERT INTO catalog VALUES ('B', 'y', 'md');",
        )
        .unwrap();
    }

    let backup = backup_store(&path).unwrap();
    let copy = rusqlite::Connection::open(&backup).unwrap();
    let rows: i64 = copy
        .query_row("SELECT COUNT(*) FROM catalog", [], |row| row.get(0))
        .unwrap();
    assert_eq!(rows, 2);
    let version: i64 = copy
        .query_row("PRAGMA user_version", [], |row| row.get(0))
        .unwrap();
    assert_eq!(version, 0);

    // The source itself is left untouched by the backup.
    let source = rusqlite::Connection::open(&path).unwrap();
    let rows: i64 = source
        .query_row("SELECT COUNT(*) FROM catalog", [], |row| row.get(0))
        .unwrap();
    assert_eq!(rows, 2);
}

#[test]
fn test_backup_store_without_store_is_none() {
    let tmp = tempdir().unwrap();
    let path = tmp.path().join("library.sqlite");
    assert!(backup_store(&path).is_none());
    assert!(!path.exists());
}

#[test]
fn test_backup_of_corrupt_store_fails_softly() {
    let tmp = tempdir().unwrap();
    let path = tmp.path().join("library.sqlite");
    std::fs::write(&path, vec![0x5a_u8; 4096]).unwrap();

    assert!(backup_store(&path).is_none());
    let leftovers: Vec<_> = std::fs::read_dir(tmp.path())
        .unwrap()
        .map(|e| e.unwrap().file_name().to_string_lossy().into_owned())
        .filter(|name| name.ends_with(".bak"))
        .collect();
    assert!(leftovers.is_empty(), "stray backups: {:?}", leftovers);
}

#[test]
fn test_backup_path_naming() {
    let path = std::path::Path::new("/lib/_catalog/library.sqlite");
    assert_eq!(
        backup_path_for(path, "20250607-142501"),
        std::path::PathBuf::from("/lib/_catalog/library-20250607-142501.sqlite.bak")
    );
}
