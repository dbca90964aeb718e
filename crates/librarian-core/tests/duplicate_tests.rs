use librarian_core::duplicates::{
    export_duplicates_csv, find_duplicates, find_duplicates_in_store, token_sort_ratio,
};
use librarian_core::storage::Database;
use librarian_core::{CatalogEntry, Confidence};
use std::fs;
use tempfile::tempdir;

fn make_entry(dir: &str, name: &str, size: Option<f64>, sha: &str) -> CatalogEntry {
    CatalogEntry {
        relative_path: dir.to_string(),
        filename: name.to_string(),
        extension: "pdf".to_string(),
        last_modified: "2024-05-01 10:00:00".to_string(),
        file_size_mb: size,
        textracted: false,
        token_count: None,
        sha256: sha.to_string(),
    }
}

#[test]
fn test_report_final_pair_is_high() {
    let entries = vec![
        make_entry("Work", "Report Final", Some(2.5), "h1"),
        make_entry("Work", "Report_Final", Some(2.5), "h2"),
    ];
    let found = find_duplicates(&entries, &[]);
    assert_eq!(found.len(), 1);
    assert_eq!(found[0].confidence, Confidence::High);
    assert_eq!(found[0].top_level_folder, "Work");
    assert_eq!(found[0].file_size_mb, Some(2.5));
}

#[test]
fn test_possible_tier_and_floor() {
    let entries = vec![
        make_entry("Science", "Physics Notes", Some(0.75), "h1"),
        make_entry("Science", "Physics Notes v2", Some(0.75), "h2"),
        make_entry("Science", "Lab Safety Rules", Some(0.75), "h3"),
    ];
    let found = find_duplicates(&entries, &[]);
    assert_eq!(found.len(), 1);
    assert_eq!(found[0].confidence, Confidence::Possible);
    assert_eq!(found[0].filename1, "Physics Notes");
    assert_eq!(found[0].filename2, "Physics Notes v2");
    assert!(token_sort_ratio("Physics Notes", "Lab Safety Rules") < 80.0);
}

#[test]
fn test_sizes_must_match_at_three_decimals() {
    let entries = vec![
        make_entry("Work", "Report Final", Some(2.501), "h1"),
        make_entry("Work", "Report_Final", Some(2.502), "h2"),
    ];
    assert!(find_duplicates(&entries, &[]).is_empty());
}

#[test]
fn test_exact_takes_precedence_over_fuzzy() {
    let entries = vec![
        make_entry("Work", "Report Final", Some(2.5), "same"),
        make_entry("Work", "Report_Final", Some(2.5), "same"),
    ];
    let found = find_duplicates(&entries, &[]);
    assert_eq!(found.len(), 1);
    assert_eq!(found[0].confidence, Confidence::Exact);
}

#[test]
fn test_exact_pairs_cross_folders_and_come_first() {
    let entries = vec![
        make_entry("Work", "Budget 2024", Some(1.0), "x1"),
        make_entry("Work", "Budget_2024", Some(1.0), "x2"),
        make_entry("Archive", "scan", Some(4.0), "dup"),
        make_entry("Work/old", "scan copy", Some(4.0), "dup"),
    ];
    let found = find_duplicates(&entries, &[]);
    assert_eq!(found.len(), 2);
    assert_eq!(found[0].confidence, Confidence::Exact);
    assert_eq!(found[0].top_level_folder, "Archive");
    assert_eq!(found[0].filename1, "scan");
    assert_eq!(found[0].filename2, "scan copy");
    assert_eq!(found[1].confidence, Confidence::High);
}

#[test]
fn test_every_pair_of_an_exact_group_is_reported() {
    let entries: Vec<CatalogEntry> = ["a", "b", "c", "d"]
        .iter()
        .map(|n| make_entry("Dup", n, Some(1.0), "same"))
        .collect();
    let found = find_duplicates(&entries, &[]);
    assert_eq!(found.len(), 6);
    assert!(found.iter().all(|c| c.confidence == Confidence::Exact));
}

#[test]
fn test_duplicates_from_store_with_exclusions() {
    let db = Database::open_in_memory().unwrap();
    db.rebuild_catalog(&[
        make_entry("Work", "Report Final", Some(2.5), "h1"),
        make_entry("Work", "Report_Final", Some(2.5), "h2"),
        make_entry("Inbox", "a", Some(1.0), "same"),
        make_entry("Inbox", "b", Some(1.0), "same"),
    ])
    .unwrap();

    let all = find_duplicates_in_store(&db, &[]).unwrap();
    assert_eq!(all.len(), 2);

    let filtered = find_duplicates_in_store(&db, &["Inbox".to_string()]).unwrap();
    assert_eq!(filtered.len(), 1);
    assert_eq!(filtered[0].top_level_folder, "Work");
}

#[test]
fn test_export_duplicates_csv() {
    let tmp = tempdir().unwrap();
    let path = tmp.path().join("latest-duplicates.csv");
    let entries = vec![
        make_entry("Work", "Report Final", Some(2.5), "same"),
        make_entry("Work", "Report_Final", Some(2.5), "same"),
    ];
    export_duplicates_csv(&find_duplicates(&entries, &[]), &path).unwrap();
    let text = fs::read_to_string(&path).unwrap();
    assert_eq!(
        text,
        "top_level_folder,filename1,filename2,file_size_MB,confidence\n\
         Work,Report Final,Report_Final,2.5,exact\n"
    );

    export_duplicates_csv(&[], &path).unwrap();
    assert_eq!(
        fs::read_to_string(&path).unwrap(),
        "top_level_folder,filename1,filename2,file_size_MB,confidence\n"
    );
}
