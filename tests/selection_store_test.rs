use anyhow::Result;
use myschedule::core::selection::{SelectionChange, SelectionStore};
use myschedule::domain::model::{SelectionRecord, SelectionSet};
use myschedule::LocalStorage;
use tempfile::TempDir;

#[test]
fn test_selection_round_trip_normalizes_ids() -> Result<()> {
    let temp_dir = TempDir::new()?;
    let store = SelectionStore::new(LocalStorage::new(temp_dir.path()));

    let selection: SelectionSet = ["fs261059", " FS261110 "].into_iter().collect();
    store.save(&selection)?;

    let loaded = store.load();
    assert_eq!(loaded.to_sorted_vec(), vec!["FS261059", "FS261110"]);

    let raw = std::fs::read(temp_dir.path().join("selected_courses.json"))?;
    let record: SelectionRecord = serde_json::from_slice(&raw)?;
    let mut ids = record.selected_course_ids;
    ids.sort();
    assert_eq!(ids, vec!["FS261059", "FS261110"]);
    Ok(())
}

#[test]
fn test_missing_selection_file_is_empty() {
    let temp_dir = TempDir::new().unwrap();
    let store = SelectionStore::with_file_name(
        LocalStorage::new(temp_dir.path().join("does/not/exist")),
        "nothing-here.json",
    );
    assert!(store.load().is_empty());
}

#[test]
fn test_corrupt_selection_file_is_empty() -> Result<()> {
    let temp_dir = TempDir::new()?;
    std::fs::write(temp_dir.path().join("selected_courses.json"), "{ not json")?;
    let store = SelectionStore::new(LocalStorage::new(temp_dir.path()));
    assert!(store.load().is_empty());

    // non-string entries are ignored, strings are normalized
    std::fs::write(
        temp_dir.path().join("selected_courses.json"),
        r#"{"selected_course_ids": ["fs261059", 42, null, "  "]}"#,
    )?;
    assert_eq!(store.load().to_sorted_vec(), vec!["FS261059"]);
    Ok(())
}

#[test]
fn test_add_twice_leaves_selection_unchanged() -> Result<()> {
    let temp_dir = TempDir::new()?;
    let store = SelectionStore::new(LocalStorage::new(temp_dir.path()));

    assert_eq!(store.add("FS261059")?, SelectionChange::Added);
    let before = store.load();
    assert_eq!(store.add("fs261059")?, SelectionChange::AlreadySelected);
    assert_eq!(store.load(), before);

    assert_eq!(store.remove("FS261059")?, SelectionChange::Removed);
    assert_eq!(store.remove("FS261059")?, SelectionChange::NotSelected);
    assert!(store.load().is_empty());
    Ok(())
}
